//! Command implementations.

use std::time::Duration;

use futures_util::future::join_all;
use refetch_client::{HttpClient, RequestOptions};
use refetch_core::{FetchSettings, Method, RefetchResult};
use refetch_swr::{FetchController, FetchOptions, FetchSnapshot, RefreshScheduler};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::cli::{CacheDemoArgs, GetArgs, SendArgs, WatchArgs};

pub async fn get(client: &HttpClient, args: GetArgs) -> RefetchResult<()> {
    let options = RequestOptions::authed(args.token.as_deref()).with_cache(!args.no_cache);
    let value = client.get(&args.path, options).await?;
    print_json(&value)
}

pub async fn send(client: &HttpClient, args: SendArgs) -> RefetchResult<()> {
    let method: Method = args.method.parse()?;
    let options = build_send_options(&args)?;
    let value = client.request(method, &args.path, options).await?;
    print_json(&value)
}

fn build_send_options(args: &SendArgs) -> RefetchResult<RequestOptions> {
    let mut options = RequestOptions::authed(args.token.as_deref());
    if let Some(body) = &args.body {
        options = options.with_body(serde_json::from_str(body)?);
    }
    for prefix in &args.invalidate {
        options = options.invalidating(prefix.clone());
    }
    Ok(options)
}

pub async fn watch(client: &HttpClient, settings: &FetchSettings, args: WatchArgs) -> RefetchResult<()> {
    let interval = args
        .interval_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| settings.background_interval());
    let stale_time = args
        .stale_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| settings.stale_time());

    let scheduler = RefreshScheduler::new();
    let fetch_client = client.clone();
    let token = args.token.clone();
    // Revalidations go to the network; the response cache would otherwise
    // answer them for a full TTL.
    let controller = FetchController::bind(
        args.path.clone(),
        move |path: String| {
            let client = fetch_client.clone();
            let token = token.clone();
            async move {
                client
                    .get(&path, RequestOptions::authed(token.as_deref()).with_cache(false))
                    .await
            }
        },
        FetchOptions::new()
            .with_stale_time(stale_time)
            .keep_data_on_error(settings.keep_data_on_error)
            .with_background(&scheduler, interval),
    );

    tracing::info!(
        path = %args.path,
        interval_ms = interval.as_millis() as u64,
        stale_ms = stale_time.as_millis() as u64,
        "Watching"
    );

    let mut changes = controller.subscribe();
    let mut seen = 0;
    while seen < args.count {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                seen += 1;
                print_json(&describe(seen, &controller.snapshot()))?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    controller.detach();
    scheduler.shutdown();
    Ok(())
}

pub async fn cache_demo(client: &HttpClient, args: CacheDemoArgs) -> RefetchResult<()> {
    let options = RequestOptions::authed(args.token.as_deref());

    let burst = (0..args.repeat).map(|_| client.get(&args.path, options.clone()));
    for result in join_all(burst).await {
        result?;
    }
    client.get(&args.path, options).await?;

    print_json(&serde_json::to_value(client.metrics())?)
}

fn describe(change: usize, snapshot: &FetchSnapshot<Arc<Value>>) -> Value {
    json!({
        "change": change,
        "loading": snapshot.loading,
        "stale": snapshot.is_stale,
        "last_fetched": snapshot.last_fetched.map(|at| at.to_rfc3339()),
        "error": snapshot.error.as_ref().map(ToString::to_string),
        "data": snapshot.data.as_deref(),
    })
}

fn print_json(value: &Value) -> RefetchResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
