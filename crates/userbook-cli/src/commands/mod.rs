pub mod create;
pub mod delete;
pub mod list;
pub mod migrate;
pub mod shell;
pub mod show;
pub mod update;

use std::path::Path;
use userbook_core::model::User;
use userbook_engine::UserRepository;
use userbook_store::StoreCell;

/// Open (and migrate) the store at `db` behind a repository
pub(crate) fn open_repository(db: &Path) -> Result<UserRepository, Box<dyn std::error::Error>> {
    let store = StoreCell::new(db).get_or_open()?;
    Ok(UserRepository::new(store)?)
}

/// One `ID: …, Name: …, Age: …` line per user
pub(crate) fn print_users(users: &[User]) {
    if users.is_empty() {
        println!("No users");
        return;
    }
    for user in users {
        println!("{}", user);
    }
}
