//! `/articles`: imported and aggregated news articles.

use std::sync::Arc;

use refetch_core::{ClientError, Method};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{segment, Query};
use crate::client::{HttpClient, RequestOptions};

/// Cache prefix dropped by every article write.
pub const PREFIX: &str = "/articles";

/// Topics the refresh job pulls when none are given.
pub const DEFAULT_TOPICS: &str = "world,business,tech,science,social,school,student";

/// Listing parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArticlesQuery {
    pub page: u32,
    pub limit: u32,
    pub q: String,
    pub tag: String,
}

impl Default for ArticlesQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 30,
            q: String::new(),
            tag: String::new(),
        }
    }
}

impl ArticlesQuery {
    pub fn path(&self) -> String {
        Query::new()
            .param("page", self.page)
            .param("limit", self.limit)
            .param("q", &self.q)
            .param("tag", &self.tag)
            .apply(PREFIX)
    }
}

/// Parameters of the feed refresh job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshParams {
    pub limit: u32,
    pub force: bool,
    /// Comma-separated topics; empty omits the parameter.
    pub topics: String,
}

impl Default for RefreshParams {
    fn default() -> Self {
        Self {
            limit: 60,
            force: true,
            topics: DEFAULT_TOPICS.to_string(),
        }
    }
}

pub async fn import_by_url(
    client: &HttpClient,
    token: Option<&str>,
    url: &str,
    tags: &[String],
) -> Result<Arc<Value>, ClientError> {
    client
        .post(
            "/articles/import",
            json!({ "url": url, "tags": tags }),
            RequestOptions::authed(token).invalidating(PREFIX),
        )
        .await
}

pub async fn list(
    client: &HttpClient,
    token: Option<&str>,
    query: &ArticlesQuery,
) -> Result<Arc<Value>, ClientError> {
    client.get(&query.path(), RequestOptions::authed(token)).await
}

pub async fn get_one(
    client: &HttpClient,
    token: Option<&str>,
    id: &str,
) -> Result<Arc<Value>, ClientError> {
    client
        .get(&format!("{}/{}", PREFIX, segment(id)), RequestOptions::authed(token))
        .await
}

pub async fn update(
    client: &HttpClient,
    token: Option<&str>,
    id: &str,
    body: Value,
) -> Result<Arc<Value>, ClientError> {
    client
        .put(
            &format!("{}/{}", PREFIX, segment(id)),
            body,
            RequestOptions::authed(token).invalidating(PREFIX),
        )
        .await
}

/// Ask the backend to pull fresh articles from its feeds.
pub async fn refresh(
    client: &HttpClient,
    token: Option<&str>,
    params: &RefreshParams,
) -> Result<Arc<Value>, ClientError> {
    let path = Query::new()
        .param("limit", params.limit)
        .param("force", params.force)
        .param_if_set("topics", &params.topics)
        .apply("/articles/refresh");
    client
        .request(
            Method::Post,
            &path,
            RequestOptions::authed(token).invalidating(PREFIX),
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_list_path() {
        assert_eq!(
            ArticlesQuery::default().path(),
            "/articles?page=1&limit=30&q=&tag="
        );
    }

    #[test]
    fn test_list_path_encodes_search() {
        let query = ArticlesQuery {
            page: 3,
            q: "climate change".to_string(),
            tag: "science".to_string(),
            ..Default::default()
        };
        assert_eq!(
            query.path(),
            "/articles?page=3&limit=30&q=climate%20change&tag=science"
        );
    }
}
