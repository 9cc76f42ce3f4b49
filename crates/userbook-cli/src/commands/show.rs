//! Show command
//!
//! Usage: userbook show <ID> [--json]

use super::open_repository;
use clap::Args;
use std::path::Path;
use userbook_core::errors::{ExError, UserbookError};
use userbook_core::rules::parse_id;

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// User ID
    pub id: String,

    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: ShowArgs, db: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let id = parse_id(&args.id).map_err(ExError::from)?;

    let repo = open_repository(db)?;
    let user = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ExError::from(UserbookError::UserNotFound { user_id: id }).with_op("show"))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&user)?);
        return Ok(());
    }

    println!("{}", user);
    if let Some(email) = &user.fields.email {
        println!("Email: {}", email);
    }
    if let Some(created_at) = user.fields.created_at {
        let created = chrono::DateTime::<chrono::Utc>::from_timestamp_millis(created_at)
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| created_at.to_string());
        println!("Created: {}", created);
    }
    if let Some(avatar) = &user.fields.avatar {
        println!("Avatar: {} bytes", avatar.len());
    }

    Ok(())
}
