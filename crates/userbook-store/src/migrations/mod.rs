//! Migration framework
//!
//! Provides:
//! - Integer schema versions advanced one step at a time
//! - A transaction per step, so a failure leaves the previous version intact
//! - Checksums of applied SQL to detect edited migrations
//! - Embedded SQL migrations

mod checksums;
mod embedded;
mod runner;

pub use embedded::{get_migrations, Migration, LATEST_VERSION};
pub use runner::{apply_migrations, current_version, migrate, verify_checksums};
