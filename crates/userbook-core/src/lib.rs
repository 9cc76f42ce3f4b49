//! Userbook Core - entity, error and logging facilities
//!
//! This crate provides the foundations shared by the store, the repository
//! and the CLI:
//! - The `User` entity and its `UserFields` value object
//! - The error facility (`ExError`, `ExErrorKind`, `UserbookError`)
//! - The structured logging facility and `log_op_*` macros
//! - Input validation rules used by the presentation layer

pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod rules;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, Result, UserbookError};
pub use model::{User, UserFields};
pub use rules::{parse_id, UserForm};
