//! Shared proptest generators.
//!
//! This module provides reusable generators for argument lists, status
//! codes and transport errors.

use proptest::prelude::*;
use rust_common::{RequestSnapshot, ResponseSnapshot, TransportError};
use serde_json::{json, Value};
use std::time::Duration;

/// Generate identifier-like parameter names.
pub fn param_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,11}"
}

/// Generate distinct parameter name lists.
pub fn param_names_strategy(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(param_name_strategy(), 0..=max)
        .prop_map(|names| names.into_iter().collect())
}

/// Generate JSON argument values.
pub fn arg_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[ -~]{0,24}".prop_map(Value::String),
        prop::collection::vec(any::<u8>(), 0..4).prop_map(|bytes| json!(bytes)),
    ]
}

/// Generate argument lists.
pub fn arg_values_strategy(max: usize) -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(arg_value_strategy(), 0..=max)
}

/// Generate any HTTP status code.
pub fn http_status_strategy() -> impl Strategy<Value = u16> {
    100u16..600
}

/// Generate 5xx status codes.
pub fn server_error_status_strategy() -> impl Strategy<Value = u16> {
    500u16..600
}

/// Generate 4xx status codes.
pub fn client_error_status_strategy() -> impl Strategy<Value = u16> {
    400u16..500
}

/// Generate optional request snapshots.
pub fn request_snapshot_strategy() -> impl Strategy<Value = Option<RequestSnapshot>> {
    prop::option::of(
        (
            prop_oneof![Just("GET"), Just("POST"), Just("PUT"), Just("DELETE")],
            "/[a-z]{1,10}(/[0-9]{1,4})?",
        )
            .prop_map(|(method, path)| RequestSnapshot {
                method: Some(method.to_string()),
                url: Some(format!("https://api.example.com{path}")),
                path: Some(path),
                ..RequestSnapshot::default()
            }),
    )
}

/// Generate optional response snapshots.
pub fn response_snapshot_strategy() -> impl Strategy<Value = Option<ResponseSnapshot>> {
    prop::option::of(http_status_strategy().prop_map(ResponseSnapshot::with_status))
}

/// Generate transport errors with or without request and response.
pub fn transport_error_strategy() -> impl Strategy<Value = TransportError> {
    (
        "[A-Za-z ]{1,40}",
        prop::option::of(prop_oneof![Just("ETIMEDOUT"), Just("ECONNREFUSED")]),
        request_snapshot_strategy(),
        response_snapshot_strategy(),
    )
        .prop_map(|(message, code, request, response)| {
            let mut err = TransportError::new(message);
            err.code = code.map(ToString::to_string);
            err.request = request;
            err.response = response;
            err
        })
}

/// Generate latencies for executor scripts.
pub fn latency_strategy() -> impl Strategy<Value = Duration> {
    (0u64..500).prop_map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn test_param_names_are_distinct(names in param_names_strategy(6)) {
            let mut sorted = names.clone();
            sorted.dedup();
            prop_assert_eq!(sorted.len(), names.len());
        }

        #[test]
        fn test_server_errors_are_5xx(status in server_error_status_strategy()) {
            prop_assert!((500..600).contains(&status));
        }
    }
}
