//! Single-construction guard for the shared store
//!
//! Many callers may ask for the store at once (worker threads, request
//! handlers). `StoreCell` opens it on first demand and hands every caller
//! the same `Arc`. The cell is an ordinary value owned by the application;
//! there is no process-global instance.

use crate::errors::{lock_poisoned, Result};
use crate::store::UserStore;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

pub struct StoreCell {
    path: Option<PathBuf>,
    store: OnceLock<Arc<UserStore>>,
    init_lock: Mutex<()>,
}

impl StoreCell {
    /// Cell for a database file; nothing is opened until first use
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            store: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    /// Cell for a private in-memory database
    pub fn in_memory() -> Self {
        Self {
            path: None,
            store: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    /// The store, opening it if no caller has yet
    ///
    /// Double-checked: the fast path is a lock-free read; only callers that
    /// race on the first open take the lock, and only one of them opens. A
    /// failed open leaves the cell empty so a later call can retry.
    ///
    /// # Errors
    /// Whatever [`UserStore::open`] reports.
    pub fn get_or_open(&self) -> Result<Arc<UserStore>> {
        if let Some(store) = self.store.get() {
            return Ok(store.clone());
        }

        let _guard = self.init_lock.lock().map_err(|_| lock_poisoned("store_open"))?;
        if let Some(store) = self.store.get() {
            return Ok(store.clone());
        }

        let store = Arc::new(match &self.path {
            Some(path) => UserStore::open(path)?,
            None => UserStore::open_in_memory()?,
        });
        tracing::debug!(path = ?self.path, "opened shared user store");

        // Only this thread can set the cell while holding `init_lock`
        let _ = self.store.set(store.clone());
        Ok(store)
    }

    /// The store if it has been opened
    pub fn get(&self) -> Option<Arc<UserStore>> {
        self.store.get().cloned()
    }
}
