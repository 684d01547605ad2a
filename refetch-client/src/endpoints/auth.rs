//! `/auth`: account creation, login and the current user.
//!
//! The token returned by `login` is opaque here; callers pass it back into
//! the other endpoints.

use std::sync::Arc;

use refetch_core::ClientError;
use serde_json::{json, Value};

use crate::client::{HttpClient, RequestOptions};

pub async fn signup(
    client: &HttpClient,
    email: &str,
    password: &str,
    name: &str,
) -> Result<Arc<Value>, ClientError> {
    client
        .post(
            "/auth/signup",
            json!({ "email": email, "password": password, "name": name }),
            RequestOptions::new(),
        )
        .await
}

pub async fn login(
    client: &HttpClient,
    email: &str,
    password: &str,
) -> Result<Arc<Value>, ClientError> {
    client
        .post(
            "/auth/login",
            json!({ "email": email, "password": password }),
            RequestOptions::new(),
        )
        .await
}

/// Profile of the token's owner. Cached per principal like any read.
pub async fn me(client: &HttpClient, token: &str) -> Result<Arc<Value>, ClientError> {
    client.get("/auth/me", RequestOptions::authed(Some(token))).await
}
