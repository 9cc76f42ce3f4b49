//! The shared record store handle
//!
//! `UserStore` owns the single connection to the user database. Every
//! statement runs under the connection mutex, which makes writes to the
//! same id linearizable. Construct it once and share it behind an `Arc`;
//! see [`crate::StoreCell`] for race-free lazy construction.

use crate::db;
use crate::errors::{lock_poisoned, Result};
use crate::migrations;
use crate::repo::SqliteRepo;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use userbook_core::model::{User, UserFields};

pub struct UserStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for UserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl UserStore {
    /// Open (or create) the database file and migrate it to the latest schema
    ///
    /// # Errors
    /// `Io` if the parent directory cannot be created, `Persistence` if the
    /// file cannot be opened, `Migration`/`ConstraintViolation` from the
    /// migration runner.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = db::open(&path)?;
        let mut store = Self::from_connection(conn)?;
        store.path = Some(path);
        Ok(store)
    }

    /// Open a private in-memory database at the latest schema
    ///
    /// # Errors
    /// Same as [`UserStore::from_connection`].
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(db::open_in_memory()?)
    }

    /// Take ownership of an open connection, configure it and run pending
    /// migrations before serving requests
    ///
    /// # Errors
    /// `Persistence` on pragma failures plus the migration runner's errors.
    pub fn from_connection(mut conn: Connection) -> Result<Self> {
        db::configure(&conn)?;
        let version = migrations::apply_migrations(&mut conn)?;
        tracing::debug!(schema_version = version, "user store ready");

        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Database file backing this store, `None` when in memory
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn with_conn<T>(&self, op: &str, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.conn.lock().map_err(|_| lock_poisoned(op))?;
        f(&conn).map_err(|e| {
            if matches!(e.op(), Some("sqlite") | None) {
                e.with_op(op)
            } else {
                e
            }
        })
    }

    /// Insert a new record; the store assigns and returns its id
    ///
    /// # Errors
    /// `Persistence` on storage failure.
    pub fn insert(&self, fields: &UserFields) -> Result<i64> {
        self.with_conn("insert", |conn| SqliteRepo::insert_user(conn, fields))
    }

    /// Insert with an explicit id under insert-or-ignore
    ///
    /// # Errors
    /// `Persistence` on storage failure; a duplicate id is `Ok(None)`.
    pub fn insert_with_id(&self, user: &User) -> Result<Option<i64>> {
        self.with_conn("insert", |conn| SqliteRepo::insert_user_with_id(conn, user))
    }

    /// Overwrite the record with `user.id`; `Ok(false)` if there is none
    ///
    /// # Errors
    /// `Persistence` on storage failure.
    pub fn update(&self, user: &User) -> Result<bool> {
        self.with_conn("update", |conn| SqliteRepo::update_user(conn, user))
    }

    /// Delete the record with `id`; `Ok(false)` if there is none
    ///
    /// # Errors
    /// `Persistence` on storage failure.
    pub fn delete(&self, id: i64) -> Result<bool> {
        self.with_conn("delete", |conn| SqliteRepo::delete_user(conn, id))
    }

    /// # Errors
    /// `Persistence` on storage failure.
    pub fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        self.with_conn("get_by_id", |conn| SqliteRepo::get_user(conn, id))
    }

    /// Every record, sorted by first name ascending
    ///
    /// # Errors
    /// `Persistence` on storage failure.
    pub fn get_all(&self) -> Result<Vec<User>> {
        self.with_conn("get_all", SqliteRepo::list_users)
    }

    /// # Errors
    /// `Persistence` on storage failure.
    pub fn get_adults(&self) -> Result<Vec<User>> {
        self.with_conn("get_adults", SqliteRepo::list_adults)
    }

    /// # Errors
    /// `Persistence` on storage failure.
    pub fn count(&self) -> Result<i64> {
        self.with_conn("count", SqliteRepo::count_users)
    }

    /// Schema version currently recorded in the database
    ///
    /// # Errors
    /// `Persistence` on storage failure.
    pub fn schema_version(&self) -> Result<u32> {
        self.with_conn("schema_version", migrations::current_version)
    }
}
