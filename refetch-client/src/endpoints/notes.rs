//! `/notes`: dated notes and generated daily summaries.

use std::sync::Arc;

use refetch_core::{ClientError, Method};
use serde_json::Value;

use super::{segment, Query};
use crate::client::{HttpClient, RequestOptions};

pub const PREFIX: &str = "/notes";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesQuery {
    /// `YYYY-MM-DD`, empty for all dates.
    pub date: String,
    pub page: u32,
    pub limit: u32,
    pub q: String,
}

impl Default for NotesQuery {
    fn default() -> Self {
        Self {
            date: String::new(),
            page: 1,
            limit: 100,
            q: String::new(),
        }
    }
}

fn writes(token: Option<&str>) -> RequestOptions {
    RequestOptions::authed(token).invalidating(PREFIX)
}

pub async fn list(
    client: &HttpClient,
    token: Option<&str>,
    query: &NotesQuery,
) -> Result<Arc<Value>, ClientError> {
    let path = Query::new()
        .param("date", &query.date)
        .param("page", query.page)
        .param("limit", query.limit)
        .param("q", &query.q)
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
        .get(&format!("/notes/daily/{}", segment(date)), RequestOptions::authed(token))
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
            &format!("/notes/daily/{}/generate", segment(date)),
            writes(token),
        )
        .await
}
