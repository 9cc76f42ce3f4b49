//! List commands
//!
//! Usage: userbook list [--json]
//!        userbook adults [--json]

use super::{open_repository, print_users};
use clap::Args;
use std::path::Path;
use userbook_core::model::User;

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Print JSON instead of one line per user
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: ListArgs, db: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let repo = open_repository(db)?;
    let users = repo.get_all().await?;
    output(&users, args.json)
}

pub async fn execute_adults(args: ListArgs, db: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let repo = open_repository(db)?;
    let users = repo.get_adults().await?;
    output(&users, args.json)
}

fn output(users: &[User], json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(users)?);
    } else {
        print_users(users);
    }
    Ok(())
}
