//! Update command
//!
//! Usage: userbook update <ID> --first-name <NAME> --last-name <NAME> --age <AGE> [--email <EMAIL>]
//!
//! Loads the record first; names and age are overwritten, the email only
//! when given, and everything else is kept.

use super::open_repository;
use clap::Args;
use std::path::Path;
use userbook_core::errors::{ExError, UserbookError};
use userbook_core::rules::{parse_id, UserForm};

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// User ID
    pub id: String,

    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    #[arg(long)]
    pub age: String,

    #[arg(long)]
    pub email: Option<String>,
}

pub async fn execute(args: UpdateArgs, db: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let id = parse_id(&args.id).map_err(ExError::from)?;
    let mut form = UserForm::new(args.first_name, args.last_name, args.age);
    form.email = args.email;

    let repo = open_repository(db)?;
    let existing = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ExError::from(UserbookError::UserNotFound { user_id: id }).with_op("update"))?;
    let updated = form.apply_to(&existing).map_err(ExError::from)?;

    // Deleted between the load and the write
    if !repo.update(updated).await? {
        return Err(ExError::from(UserbookError::UserNotFound { user_id: id }).with_op("update").into());
    }
    println!("Updated user {}", id);

    Ok(())
}
