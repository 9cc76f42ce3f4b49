//! Interactive shell
//!
//! Reads one command per line from stdin while following the full user
//! list. The list is printed under `Results:` on start and again after
//! every change.
//!
//! Commands:
//!   add <first> <last> <age> [email]
//!   update <id> <first> <last> <age> [email]
//!   delete <id>
//!   show <id>
//!   adults
//!   help
//!   quit

use super::{open_repository, print_users};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use userbook_core::errors::{ExError, UserbookError};
use userbook_core::model::User;
use userbook_core::rules::{parse_id, UserForm};
use userbook_engine::{Subscription, UserRepository};

const HELP: &str = "\
Commands:
  add <first> <last> <age> [email]
  update <id> <first> <last> <age> [email]
  delete <id>
  show <id>
  adults
  help
  quit";

pub async fn execute(db: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let repo = open_repository(db)?;
    let mut results = repo.observe_all();

    if let Some(initial) = results.recv().await {
        print_results(&initial);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => continue,
            ["quit"] | ["exit"] => break,
            ["help"] => println!("{}", HELP),
            command => {
                if let Err(e) = dispatch(&repo, command).await {
                    eprintln!("Error: {}", e);
                }
            }
        }
        drain(&mut results);
    }

    Ok(())
}

async fn dispatch(repo: &UserRepository, command: &[&str]) -> Result<(), ExError> {
    match command {
        ["add", first, last, age, rest @ ..] => {
            let fields = form(first, last, age, rest)
                .validate()?
                .with_created_at(chrono::Utc::now().timestamp_millis());
            let id = repo.insert(fields).await?;
            println!("Created user {}", id);
        }
        ["update", id, first, last, age, rest @ ..] => {
            let id = parse_id(id)?;
            let existing = repo
                .get_by_id(id)
                .await?
                .ok_or_else(|| ExError::from(UserbookError::UserNotFound { user_id: id }).with_op("update"))?;
            let updated = form(first, last, age, rest).apply_to(&existing)?;
            if !repo.update(updated).await? {
                return Err(ExError::from(UserbookError::UserNotFound { user_id: id }).with_op("update"));
            }
            println!("Updated user {}", id);
        }
        ["delete", id] => {
            let id = parse_id(id)?;
            if !repo.delete(id).await? {
                return Err(ExError::from(UserbookError::UserNotFound { user_id: id }).with_op("delete"));
            }
            println!("Deleted user {}", id);
        }
        ["show", id] => {
            let id = parse_id(id)?;
            let user = repo
                .get_by_id(id)
                .await?
                .ok_or_else(|| ExError::from(UserbookError::UserNotFound { user_id: id }).with_op("show"))?;
            println!("{}", user);
        }
        ["adults"] => print_users(&repo.get_adults().await?),
        other => {
            println!("Unknown command '{}'. Type 'help' for the command list.", other.join(" "));
        }
    }
    Ok(())
}

fn form(first: &str, last: &str, age: &str, rest: &[&str]) -> UserForm {
    let mut form = UserForm::new(first, last, age);
    form.email = rest.first().map(|email| email.to_string());
    form
}

/// Snapshots are published before a mutation replies, so they are buffered
/// by the time the command returns.
fn drain(results: &mut Subscription<Vec<User>>) {
    while let Some(users) = results.try_recv() {
        print_results(&users);
    }
}

fn print_results(users: &[User]) {
    println!("Results:");
    print_users(users);
}
