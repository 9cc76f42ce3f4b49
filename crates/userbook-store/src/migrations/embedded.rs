//! Embedded SQL migrations
//!
//! Migrations are embedded at compile time using include_str!. Versions are
//! contiguous from 1; `LATEST_VERSION` is the schema this build serves.

/// Migration metadata
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: u32,
    pub id: &'static str,
    pub sql: &'static str,
}

/// Schema version the store brings every database up to at open time
pub const LATEST_VERSION: u32 = 2;

const MIGRATIONS: [Migration; LATEST_VERSION as usize] = [
    Migration {
        version: 1,
        id: "001_create_user",
        sql: include_str!("../../migrations/001_create_user.sql"),
    },
    Migration {
        version: 2,
        id: "002_add_user_email",
        sql: include_str!("../../migrations/002_add_user_email.sql"),
    },
];

/// Get all embedded migrations in version order
pub fn get_migrations() -> &'static [Migration] {
    &MIGRATIONS
}
