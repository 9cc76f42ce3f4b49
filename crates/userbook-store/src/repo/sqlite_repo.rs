//! SQLite repository implementation
//!
//! The four primitive statements against the `user` table plus the read
//! queries. Functions take a borrowed connection; `UserStore` supplies one
//! under its lock.
//!
//! Policies:
//! - explicit-id inserts are insert-or-ignore: a duplicate id is dropped
//!   silently and reported as `None`
//! - update and delete of an unknown id change nothing and return `false`

use crate::errors::{from_rusqlite, Result};
use crate::repo::hydration::{user_from_row, USER_COLUMNS};
use rusqlite::{params, Connection, OptionalExtension};
use userbook_core::model::{user::ADULT_AGE, User, UserFields};

/// SQLite repository for users
pub struct SqliteRepo;

impl SqliteRepo {
    /// Insert a new user and return the id the database assigned
    pub fn insert_user(conn: &Connection, fields: &UserFields) -> Result<i64> {
        conn.execute(
            "INSERT INTO user (first_name, last_name, age, email, created_at, avatar)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                fields.first_name,
                fields.last_name,
                fields.age,
                fields.email,
                fields.created_at,
                fields.avatar,
            ],
        )
        .map_err(from_rusqlite)?;

        let id = conn.last_insert_rowid();
        tracing::debug!(user_id = id, "inserted user");
        Ok(id)
    }

    /// Insert a user with a caller-chosen id, ignoring duplicates
    ///
    /// Returns `Some(id)` when the row was written and `None` when a row
    /// with that id already existed (the existing row is left untouched).
    pub fn insert_user_with_id(conn: &Connection, user: &User) -> Result<Option<i64>> {
        let fields = &user.fields;
        let written = conn
            .execute(
                "INSERT OR IGNORE INTO user (id, first_name, last_name, age, email, created_at, avatar)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    user.id,
                    fields.first_name,
                    fields.last_name,
                    fields.age,
                    fields.email,
                    fields.created_at,
                    fields.avatar,
                ],
            )
            .map_err(from_rusqlite)?;

        if written == 0 {
            tracing::debug!(user_id = user.id, "insert ignored: id already present");
            return Ok(None);
        }
        Ok(Some(user.id))
    }

    /// Overwrite every field of the row with `user.id`
    ///
    /// Returns whether a row was changed.
    pub fn update_user(conn: &Connection, user: &User) -> Result<bool> {
        let fields = &user.fields;
        let changed = conn
            .execute(
                "UPDATE user SET
                    first_name = ?2,
                    last_name = ?3,
                    age = ?4,
                    email = ?5,
                    created_at = ?6,
                    avatar = ?7
                 WHERE id = ?1",
                params![
                    user.id,
                    fields.first_name,
                    fields.last_name,
                    fields.age,
                    fields.email,
                    fields.created_at,
                    fields.avatar,
                ],
            )
            .map_err(from_rusqlite)?;

        tracing::debug!(user_id = user.id, changed, "update user");
        Ok(changed > 0)
    }

    /// Delete the row with `id`; returns whether one existed
    pub fn delete_user(conn: &Connection, id: i64) -> Result<bool> {
        let deleted = conn
            .execute("DELETE FROM user WHERE id = ?1", [id])
            .map_err(from_rusqlite)?;

        tracing::debug!(user_id = id, deleted, "delete user");
        Ok(deleted > 0)
    }

    /// Get a user by id
    pub fn get_user(conn: &Connection, id: i64) -> Result<Option<User>> {
        let mut stmt = conn
            .prepare_cached(&format!("SELECT {} FROM user WHERE id = ?1", USER_COLUMNS))
            .map_err(from_rusqlite)?;

        stmt.query_row([id], user_from_row)
            .optional()
            .map_err(from_rusqlite)
    }

    /// All users ordered by first name (ties by id)
    pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
        let mut stmt = conn
            .prepare_cached(&format!(
                "SELECT {} FROM user ORDER BY first_name ASC, id ASC",
                USER_COLUMNS
            ))
            .map_err(from_rusqlite)?;

        let users = stmt
            .query_map([], user_from_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        Ok(users)
    }

    /// Users aged 18 or over, in the same order as `list_users`
    pub fn list_adults(conn: &Connection) -> Result<Vec<User>> {
        let mut stmt = conn
            .prepare_cached(&format!(
                "SELECT {} FROM user WHERE age >= ?1 ORDER BY first_name ASC, id ASC",
                USER_COLUMNS
            ))
            .map_err(from_rusqlite)?;

        let users = stmt
            .query_map([ADULT_AGE], user_from_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        Ok(users)
    }

    /// Number of user rows
    pub fn count_users(conn: &Connection) -> Result<i64> {
        conn.query_row("SELECT COUNT(*) FROM user", [], |row| row.get(0))
            .map_err(from_rusqlite)
    }
}
