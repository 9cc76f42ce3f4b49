//! Userbook Store - the record store for user records
//!
//! Provides:
//! - SQLite connection management
//! - Versioned, checksummed schema migrations applied at open time
//! - `UserStore`, the shared handle that executes the CRUD primitives
//! - `StoreCell`, which opens a store exactly once for all of its callers

pub mod cell;
pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;
pub mod store;

// Re-export key types
pub use cell::StoreCell;
pub use errors::Result;
pub use store::UserStore;
