//! `/journals`: private journal entries and their published views.

use std::sync::Arc;

use refetch_core::{ClientError, Method};
use serde_json::Value;

use super::{segment, Query};
use crate::client::{HttpClient, RequestOptions};

pub const PREFIX: &str = "/journals";

/// Owner listing parameters (defaults: page 1, 30 per page).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalsQuery {
    pub page: u32,
    pub limit: u32,
    pub q: String,
}

impl Default for JournalsQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 30,
            q: String::new(),
        }
    }
}

/// Public listing parameters (defaults: page 1, 20 per page).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicJournalsQuery {
    pub page: u32,
    pub limit: u32,
    pub q: String,
    pub tag: String,
}

impl Default for PublicJournalsQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            q: String::new(),
            tag: String::new(),
        }
    }
}

fn entry_path(id: &str) -> String {
    format!("{}/{}", PREFIX, segment(id))
}

fn writes(token: Option<&str>) -> RequestOptions {
    RequestOptions::authed(token).invalidating(PREFIX)
}

pub async fn list(
    client: &HttpClient,
    token: Option<&str>,
    query: &JournalsQuery,
) -> Result<Arc<Value>, ClientError> {
    let path = Query::new()
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

pub async fn get_one(
    client: &HttpClient,
    token: Option<&str>,
    id: &str,
) -> Result<Arc<Value>, ClientError> {
    client.get(&entry_path(id), RequestOptions::authed(token)).await
}

pub async fn update(
    client: &HttpClient,
    token: Option<&str>,
    id: &str,
    payload: Value,
) -> Result<Arc<Value>, ClientError> {
    client.put(&entry_path(id), payload, writes(token)).await
}

pub async fn remove(
    client: &HttpClient,
    token: Option<&str>,
    id: &str,
) -> Result<Arc<Value>, ClientError> {
    client.delete(&entry_path(id), writes(token)).await
}

pub async fn publish(
    client: &HttpClient,
    token: Option<&str>,
    id: &str,
) -> Result<Arc<Value>, ClientError> {
    client
        .request(Method::Post, &format!("{}/publish", entry_path(id)), writes(token))
        .await
}

pub async fn unpublish(
    client: &HttpClient,
    token: Option<&str>,
    id: &str,
) -> Result<Arc<Value>, ClientError> {
    client
        .request(Method::Post, &format!("{}/unpublish", entry_path(id)), writes(token))
        .await
}

/// Published journals, readable without a token.
pub async fn list_public(
    client: &HttpClient,
    query: &PublicJournalsQuery,
) -> Result<Arc<Value>, ClientError> {
    let path = Query::new()
        .param("page", query.page)
        .param("limit", query.limit)
        .param("q", &query.q)
        .param("tag", &query.tag)
        .apply("/journals/public");
    client.get(&path, RequestOptions::new()).await
}

pub async fn get_public(client: &HttpClient, slug: &str) -> Result<Arc<Value>, ClientError> {
    client
        .get(&format!("/journals/public/{}", segment(slug)), RequestOptions::new())
        .await
}
