//! `/digests`: per-day news briefs.

use std::sync::Arc;

use refetch_core::{ClientError, Method};
use serde_json::Value;

use super::{segment, Query};
use crate::client::{HttpClient, RequestOptions};

pub const PREFIX: &str = "/digests";

/// Options for generating a digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    pub limit: u32,
    pub refresh: bool,
    pub length: String,
    /// Comma-separated topics; empty omits the parameter.
    pub topics: String,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            limit: 12,
            refresh: false,
            length: "detailed".to_string(),
            topics: String::new(),
        }
    }
}

pub fn date_path(date: &str) -> String {
    format!("{}/{}", PREFIX, segment(date))
}

pub async fn get_by_date(
    client: &HttpClient,
    token: Option<&str>,
    date: &str,
) -> Result<Arc<Value>, ClientError> {
    client.get(&date_path(date), RequestOptions::authed(token)).await
}

pub async fn generate(
    client: &HttpClient,
    token: Option<&str>,
    date: &str,
    options: &GenerateOptions,
) -> Result<Arc<Value>, ClientError> {
    let path = Query::new()
        .param("date", date)
        .param("limit", options.limit)
        .param("refresh", options.refresh)
        .param("length", &options.length)
        .param_if_set("topics", &options.topics)
        .apply("/digests/generate");
    client
        .request(
            Method::Post,
            &path,
            RequestOptions::authed(token).invalidating(PREFIX),
        )
        .await
}
