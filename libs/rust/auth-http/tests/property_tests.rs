//! Property-based tests for the authenticated client.
//!
//! Tests validate:
//! - Token grants extracted from `expires_in` land `expires_in` seconds ahead
//! - Token values never appear in debug output
//! - Builder headers always win over caller headers on the wire

use auth_http_client::{AuthenticatedClient, RequestExecutor, RequestOptions, TokenGrant};
use chrono::Utc;
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;
use test_utils::fixtures::{bearer_config, token_response_with, SampleUser, AUTH_ENDPOINT};
use test_utils::{latency_strategy, Scripted, ScriptedExecutor};

fn token_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9._-]{16,64}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_grant_expiry_is_relative_to_now(
        token in token_strategy(),
        expires_in in 0u64..1_000_000,
    ) {
        let before = Utc::now().timestamp();
        let grant = TokenGrant::from_json(&json!({
            "access_token": token,
            "expires_in": expires_in,
        }))
        .unwrap();
        let after = Utc::now().timestamp();
        let expires_in = i64::try_from(expires_in).unwrap();

        prop_assert!(grant.expires_at >= before + expires_in);
        prop_assert!(grant.expires_at <= after + expires_in);
    }

    #[test]
    fn prop_token_not_in_debug_output(token in token_strategy(), expires_at in any::<i64>()) {
        let grant = TokenGrant::new(token.clone(), expires_at);
        let debug = format!("{grant:?}");
        prop_assert!(!debug.contains(&token));
        prop_assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn prop_builder_headers_win(
        token in token_strategy(),
        caller in "[ -~]{1,32}",
        latency in latency_strategy(),
        id in 1u32..1_000,
    ) {
        let user = SampleUser::new(id, "Ann");
        let executor = Arc::new(
            ScriptedExecutor::new()
                .with_latency(latency)
                .always(AUTH_ENDPOINT, Scripted::Respond(token_response_with(&token, 3600)))
                .always("/users", Scripted::ok(user.to_json())),
        );
        let dyn_executor: Arc<dyn RequestExecutor> = executor.clone();
        let client = AuthenticatedClient::new(dyn_executor, bearer_config());
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();

        let options = RequestOptions::default()
            .with_header("Authorization", caller)
            .with_header("X-Request-Id", id.to_string());
        let response = runtime.block_on(client.get("/users", options)).unwrap();

        prop_assert_eq!(response.json::<SampleUser>().unwrap(), user);
        let requests = executor.requests_for("/users");
        prop_assert_eq!(requests.len(), 1);
        let headers = &requests[0].options.headers;
        let expected = format!("Bearer {token}");
        prop_assert_eq!(headers.get("Authorization"), Some(&expected));
        let expected_id = id.to_string();
        prop_assert_eq!(headers.get("X-Request-Id"), Some(&expected_id));
    }
}
