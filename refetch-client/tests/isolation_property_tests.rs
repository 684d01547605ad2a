//! Property-Based Tests for Principal Isolation
//!
//! **Property: Principal Isolation**
//!
//! For any path and any two distinct tokens, a read made with one token is
//! never served from an entry populated by the other, and cached keys never
//! expose either raw token.

use std::sync::Arc;

use proptest::prelude::*;
use refetch_test_utils::fixtures;
use refetch_test_utils::generators::{arb_path, arb_token_pair};
use refetch_test_utils::{Method, MockResponse, MockTransport, RequestOptions};
use serde_json::json;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_tokens_never_share_cache(path in arb_path(), (a, b) in arb_token_pair()) {
        let rt = runtime();
        rt.block_on(async {
            let mock = MockTransport::new();
            mock.respond_get(&path, MockResponse::ok(json!({ "who": "first" })))
                .respond_get(&path, MockResponse::ok(json!({ "who": "second" })));
            let client = fixtures::client(Arc::clone(&mock));

            let first = client.get(&path, RequestOptions::authed(Some(&a))).await.unwrap();
            let second = client.get(&path, RequestOptions::authed(Some(&b))).await.unwrap();

            prop_assert_eq!(&first["who"], "first");
            prop_assert_eq!(&second["who"], "second");
            prop_assert_eq!(mock.calls(Method::Get, &path), 2);

            for key in client.cache_keys() {
                let principal = key.principal().to_string();
                prop_assert_ne!(&principal, &a);
                prop_assert_ne!(&principal, &b);
            }
            Ok(())
        })?;
    }

    #[test]
    fn prop_same_token_hits_cache(path in arb_path(), (a, _) in arb_token_pair()) {
        let rt = runtime();
        rt.block_on(async {
            let mock = MockTransport::new();
            mock.respond_get(&path, MockResponse::ok(json!(1)));
            let client = fixtures::client(Arc::clone(&mock));

            client.get(&path, RequestOptions::authed(Some(&a))).await.unwrap();
            client.get(&path, RequestOptions::authed(Some(&a))).await.unwrap();
            prop_assert_eq!(mock.total_calls(), 1);
            Ok(())
        })?;
    }
}
