//! Ready-made bindings for the main screens.

use std::sync::Arc;
use std::time::Duration;

use refetch_client::endpoints::articles::{self, ArticlesQuery};
use refetch_client::endpoints::digests;
use refetch_client::HttpClient;
use serde_json::Value;

use crate::controller::{FetchController, FetchOptions};
use crate::scheduler::RefreshScheduler;

/// Stale time shared by the presets.
pub const PRESET_STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// How often the daily digest revalidates.
pub const DIGEST_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Paged article listing. No background refresh; any change to page, limit,
/// search or tag via `set_query` refetches.
pub fn articles_list(
    client: &HttpClient,
    token: Option<String>,
    query: ArticlesQuery,
) -> FetchController<ArticlesQuery, Arc<Value>> {
    let client = client.clone();
    FetchController::bind(
        query,
        move |query: ArticlesQuery| {
            let client = client.clone();
            let token = token.clone();
            async move { articles::list(&client, token.as_deref(), &query).await }
        },
        FetchOptions::new().with_stale_time(PRESET_STALE_TIME),
    )
}

/// Digest for one date (`YYYY-MM-DD`), revalidated every minute once stale.
pub fn daily_digest(
    client: &HttpClient,
    token: Option<String>,
    date: String,
    scheduler: &RefreshScheduler,
) -> FetchController<String, Arc<Value>> {
    let client = client.clone();
    FetchController::bind(
        date,
        move |date: String| {
            let client = client.clone();
            let token = token.clone();
            async move { digests::get_by_date(&client, token.as_deref(), &date).await }
        },
        FetchOptions::new()
            .with_stale_time(PRESET_STALE_TIME)
            .with_background(scheduler, DIGEST_REFRESH_INTERVAL),
    )
}
