//! Property-based tests for rust-common crate.
//!
//! These tests verify universal properties across all inputs using proptest.

use proptest::prelude::*;
use rust_common::{
    normalize, Described, NormalizedError, RequestError, RetryConfig, RetryPolicy, TransportError,
};
use std::time::Duration;
use test_utils::fixtures::timeout_error;
use test_utils::{
    client_error_status_strategy, http_status_strategy, request_snapshot_strategy,
    response_snapshot_strategy, server_error_status_strategy, transport_error_strategy,
};

// Normalizing a non-transport error hands back the same value.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_non_transport_errors_pass_through(msg in "[a-zA-Z0-9 ]{1,50}") {
        let err = std::io::Error::other(msg.clone());
        match normalize(&err) {
            NormalizedError::PassThrough(inner) => {
                prop_assert!(std::ptr::addr_eq(inner, &err as &(dyn std::error::Error + 'static)));
                prop_assert_eq!(inner.to_string(), msg);
            }
            NormalizedError::Transport(_) => {
                prop_assert!(false, "io error normalized as transport");
            }
        }
    }

    #[test]
    fn prop_transport_normalization_is_total(
        msg in "[a-zA-Z0-9 ]{0,50}",
        request in request_snapshot_strategy(),
        response in response_snapshot_strategy(),
    ) {
        let mut err = TransportError::new(msg.clone());
        err.request = request.clone();
        err.response = response.clone();

        let NormalizedError::Transport(record) = normalize(&err) else {
            return Err(TestCaseError::fail("transport error not recognized"));
        };
        prop_assert_eq!(record.error, msg);
        match request {
            Some(snapshot) => prop_assert_eq!(record.config, Described::Present(snapshot)),
            None => prop_assert_eq!(record.config, Described::Missing("Empty request")),
        }
        match response {
            Some(snapshot) => prop_assert_eq!(record.response, Described::Present(snapshot)),
            None => prop_assert_eq!(record.response, Described::Missing("Empty response")),
        }
    }
}

// Retry classification follows the response status.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_retry_classification(status in http_status_strategy()) {
        let err = RequestError::from(TransportError::from_status(status));
        prop_assert_eq!(err.is_retryable(), (500..600).contains(&status));
        prop_assert_eq!(err.is_unauthorized(), status == 401);
    }

    #[test]
    fn prop_server_errors_are_retryable(status in server_error_status_strategy()) {
        prop_assert!(RequestError::from(TransportError::from_status(status)).is_retryable());
    }

    #[test]
    fn prop_client_errors_are_final(status in client_error_status_strategy()) {
        prop_assert!(!RequestError::from(TransportError::from_status(status)).is_retryable());
    }

    #[test]
    fn prop_wrapped_transport_errors_are_found(err in transport_error_strategy()) {
        let expected_retryable = err
            .status()
            .is_none_or(|status| (500..600).contains(&status));
        let expected_code = err.code.clone();
        let err = RequestError::from(err);

        prop_assert_eq!(err.is_retryable(), expected_retryable);
        let NormalizedError::Transport(record) = normalize(&err) else {
            return Err(TestCaseError::fail("wrapped transport error not found"));
        };
        prop_assert_eq!(record.code, expected_code);
    }

    #[test]
    fn prop_unrecognized_errors_are_retryable(msg in "[a-zA-Z0-9 ]{1,50}") {
        prop_assert!(RequestError::other(msg).is_retryable());
    }
}

// Backoff doubles from the initial delay until capped.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_backoff_doubles(initial_ms in 1u64..5_000, attempt in 0u32..8) {
        let config = RetryConfig::default()
            .with_initial_delay(Duration::from_millis(initial_ms))
            .with_max_delay(Duration::from_secs(3_600));
        let policy = RetryPolicy::new(config);

        prop_assert_eq!(
            policy.delay_for_attempt(attempt),
            Duration::from_millis(initial_ms * 2u64.pow(attempt))
        );
    }

    #[test]
    fn prop_backoff_never_exceeds_cap(cap_ms in 1u64..10_000, attempt in 0u32..20) {
        let config = RetryConfig::default().with_max_delay(Duration::from_millis(cap_ms));
        let policy = RetryPolicy::new(config);
        prop_assert!(policy.delay_for_attempt(attempt) <= Duration::from_millis(cap_ms));
    }
}

#[test]
fn test_timeout_without_response_is_retryable() {
    let err = RequestError::from(timeout_error("/orders"));

    assert!(err.is_retryable());
    let record = normalize(&err).to_json();
    assert_eq!(record["response"], serde_json::json!("Empty response"));
    assert_eq!(record["code"], serde_json::json!("ETIMEDOUT"));
    assert_eq!(record["config"]["url"], serde_json::json!("/orders"));
}
