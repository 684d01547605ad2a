//! `/calendar`: events over a date range and generated daily agendas.

use std::sync::Arc;

use refetch_core::{ClientError, Method};
use serde_json::Value;

use super::{segment, Query};
use crate::client::{HttpClient, RequestOptions};

pub const PREFIX: &str = "/calendar";

fn writes(token: Option<&str>) -> RequestOptions {
    RequestOptions::authed(token).invalidating(PREFIX)
}

/// Events between `start` and `end` (inclusive dates), optionally filtered.
pub async fn list_range(
    client: &HttpClient,
    token: Option<&str>,
    start: &str,
    end: &str,
    q: &str,
) -> Result<Arc<Value>, ClientError> {
    let path = Query::new()
        .param("start", start)
        .param("end", end)
        .param("q", q)
        .apply(PREFIX);
    client.get(&path, RequestOptions::authed(token)).await
}

pub async fn create(
    client: &HttpClient,
    token: Option<&str>,
    payload: Value,
) -> Result<Arc<Value>, ClientError> {
    client.post(PREFIX, payload, writes(token)).await
}

pub async fn update(
    client: &HttpClient,
    token: Option<&str>,
    id: &str,
    payload: Value,
) -> Result<Arc<Value>, ClientError> {
    client
        .put(&format!("{}/{}", PREFIX, segment(id)), payload, writes(token))
        .await
}

pub async fn remove(
    client: &HttpClient,
    token: Option<&str>,
    id: &str,
) -> Result<Arc<Value>, ClientError> {
    client
        .delete(&format!("{}/{}", PREFIX, segment(id)), writes(token))
        .await
}

pub async fn get_daily(
    client: &HttpClient,
    token: Option<&str>,
    date: &str,
) -> Result<Arc<Value>, ClientError> {
    client
        .get(&format!("/calendar/daily/{}", segment(date)), RequestOptions::authed(token))
        .await
}

pub async fn generate_daily(
    client: &HttpClient,
    token: Option<&str>,
    date: &str,
) -> Result<Arc<Value>, ClientError> {
    client
        .request(
            Method::Post,
            &format!("/calendar/daily/{}/generate", segment(date)),
            writes(token),
        )
        .await
}
