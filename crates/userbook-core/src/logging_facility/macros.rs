//! Operation lifecycle macros
//!
//! Every repository job logs exactly one `start` event followed by either
//! one `end` or one `end_error` event, all tagged with the same `op` name.
//! Extra `tracing` fields (`request_id = %id`, `user_id = 7`, ...) may follow
//! the required arguments and are passed through unchanged.

/// Emit the `start` event for `op`
///
/// ```
/// # use userbook_core::log_op_start;
/// # use userbook_core_types::correlation::RequestId;
/// let request_id = RequestId::from("req-1");
/// log_op_start!("user_get_all");
/// log_op_start!("user_delete", request_id = %request_id, user_id = 4_i64);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)+)?) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = userbook_core_types::schema::EVENT_START,
            $($($field)+)?
        )
    };
}

/// Emit the `end` event for `op` with its elapsed milliseconds
///
/// ```
/// # use userbook_core::log_op_end;
/// log_op_end!("user_get_all", duration_ms = 2_u64);
/// log_op_end!("user_delete", duration_ms = 1_u64, user_id = 4_i64);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)+)?) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = userbook_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($($field)+)?
        )
    };
}

/// Emit the `end_error` event for `op`
///
/// `$err` is converted into an `ExError` so the event always carries
/// `err_kind` and the stable `err_code`.
///
/// ```
/// # use userbook_core::{log_op_error, ExError, ExErrorKind};
/// let err = ExError::new(ExErrorKind::Persistence).with_message("disk I/O error");
/// log_op_error!("user_insert", err, duration_ms = 5_u64);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)+)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = userbook_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            $($($field)+)?
        )
    }};
}
