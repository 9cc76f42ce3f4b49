//! Userbook Engine - the repository façade over the record store
//!
//! Provides:
//! - `UserRepository`: async insert/update/delete/read with the store's
//!   contracts, executed off the caller's task in submission order
//! - Live views: `observe_all`, `observe_adults` and `observe_by_id` push a
//!   fresh snapshot after every mutation that changes what they show
//!
//! ## Logging Ownership
//!
//! The engine owns lifecycle logging for repository operations:
//! - `log_op_start!` when a job begins executing
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! The store below uses only `tracing::debug!()` for internal details.

pub mod notifier;
pub mod repository;
pub mod worker;

pub use notifier::Subscription;
pub use repository::UserRepository;
pub use worker::Pending;
