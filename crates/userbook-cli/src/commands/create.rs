//! Create command
//!
//! Usage: userbook create --first-name <NAME> --last-name <NAME> --age <AGE> [--email <EMAIL>] [--avatar <FILE>]

use super::open_repository;
use clap::Args;
use std::path::{Path, PathBuf};
use userbook_core::errors::ExError;
use userbook_core::rules::UserForm;

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    /// Whole years; validated, so non-numeric input is rejected
    #[arg(long)]
    pub age: String,

    #[arg(long)]
    pub email: Option<String>,

    /// Image file stored as the user's avatar
    #[arg(long)]
    pub avatar: Option<PathBuf>,
}

pub async fn execute(args: CreateArgs, db: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut form = UserForm::new(args.first_name, args.last_name, args.age);
    form.email = args.email;
    let mut fields = form
        .validate()
        .map_err(ExError::from)?
        .with_created_at(chrono::Utc::now().timestamp_millis());

    if let Some(avatar_path) = args.avatar {
        fields = fields.with_avatar(std::fs::read(&avatar_path)?);
    }

    let repo = open_repository(db)?;
    let id = repo.insert(fields).await?;
    println!("Created user {}", id);

    Ok(())
}
