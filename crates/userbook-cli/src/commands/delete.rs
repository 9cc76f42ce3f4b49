//! Delete command
//!
//! Usage: userbook delete <ID>

use super::open_repository;
use clap::Args;
use std::path::Path;
use userbook_core::errors::{ExError, UserbookError};
use userbook_core::rules::parse_id;

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// User ID
    pub id: String,
}

pub async fn execute(args: DeleteArgs, db: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let id = parse_id(&args.id).map_err(ExError::from)?;

    let repo = open_repository(db)?;
    if !repo.delete(id).await? {
        return Err(ExError::from(UserbookError::UserNotFound { user_id: id }).with_op("delete").into());
    }
    println!("Deleted user {}", id);

    Ok(())
}
