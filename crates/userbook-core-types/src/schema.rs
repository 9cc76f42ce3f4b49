//! Field keys and event names shared by every log line
//!
//! The `log_op_*` macros write these keys and the test capture reads them
//! back, so both sides agree on one spelling.

pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_USER_ID: &str = "user_id";
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

/// Values of the `event` field, in lifecycle order
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_distinct() {
        assert_ne!(EVENT_START, EVENT_END);
        assert_ne!(EVENT_START, EVENT_END_ERROR);
        assert_ne!(EVENT_END, EVENT_END_ERROR);
    }

    #[test]
    fn test_field_keys_are_plain_identifiers() {
        for key in [
            FIELD_COMPONENT,
            FIELD_OP,
            FIELD_EVENT,
            FIELD_DURATION_MS,
            FIELD_REQUEST_ID,
            FIELD_USER_ID,
            FIELD_ERR_KIND,
            FIELD_ERR_CODE,
        ] {
            assert!(key.chars().all(|c| c.is_ascii_lowercase() || c == '_'), "{}", key);
        }
    }
}
