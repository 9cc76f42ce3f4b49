//! Row hydration
//!
//! Turns `user` rows into `User` values. Every query selects
//! [`USER_COLUMNS`] so that column positions line up with [`user_from_row`].

use rusqlite::Row;
use userbook_core::model::{User, UserFields};

/// Column list shared by every user query
pub const USER_COLUMNS: &str = "id, first_name, last_name, age, email, created_at, avatar";

/// Build a `User` from a row selected with [`USER_COLUMNS`]
pub fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        fields: UserFields {
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            age: row.get(3)?,
            email: row.get(4)?,
            created_at: row.get(5)?,
            avatar: row.get(6)?,
        },
    })
}
