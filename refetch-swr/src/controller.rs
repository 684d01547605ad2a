//! Stale-while-revalidate fetch controller.
//!
//! A binding moves Idle → Loading on its first foreground fetch (or on
//! `refresh`), then to Ready or Failed when the operation settles. A
//! scheduler tick on a stale binding revalidates in the background without
//! touching `loading`. `detach` (or drop) is terminal: nothing settles into
//! a detached binding.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use refetch_core::{ClientError, FetchSettings, TransportErrorKind};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::cancel::{CancellationToken, TokenSource};
use crate::scheduler::{BackgroundRefresh, RefreshScheduler, RegistrationId};
use crate::state::{FetchSnapshot, FetchState};

/// Produces the data for a query.
pub type Fetcher<Q, T> = Arc<dyn Fn(Q) -> BoxFuture<'static, Result<T, ClientError>> + Send + Sync>;

/// Binding options.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Start the first foreground fetch on `bind`.
    pub immediate: bool,
    /// Age after which data counts as stale.
    pub stale_time: Duration,
    /// Keep the previous data when a foreground fetch fails.
    pub keep_data_on_error: bool,
    /// Scheduler and interval for background revalidation.
    pub background: Option<(RefreshScheduler, Duration)>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        let settings = FetchSettings::default();
        Self {
            immediate: true,
            stale_time: settings.stale_time(),
            keep_data_on_error: settings.keep_data_on_error,
            background: None,
        }
    }
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options from configuration. Background refresh is only enabled when
    /// the settings ask for it and a scheduler is supplied.
    pub fn from_settings(settings: &FetchSettings, scheduler: Option<&RefreshScheduler>) -> Self {
        let background = scheduler
            .filter(|_| settings.background_refresh)
            .map(|scheduler| (scheduler.clone(), settings.background_interval()));
        Self {
            immediate: true,
            stale_time: settings.stale_time(),
            keep_data_on_error: settings.keep_data_on_error,
            background,
        }
    }

    pub fn immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn keep_data_on_error(mut self, keep: bool) -> Self {
        self.keep_data_on_error = keep;
        self
    }

    pub fn with_background(mut self, scheduler: &RefreshScheduler, interval: Duration) -> Self {
        self.background = Some((scheduler.clone(), interval));
        self
    }

    pub fn without_background(mut self) -> Self {
        self.background = None;
        self
    }
}

struct BindingState<Q, T> {
    query: Q,
    fetch: FetchState<T>,
    /// Token of the outstanding foreground operation.
    current: Option<CancellationToken>,
}

struct Binding<Q, T> {
    fetcher: Fetcher<Q, T>,
    stale_time: Duration,
    keep_data_on_error: bool,
    tokens: TokenSource,
    state: Mutex<BindingState<Q, T>>,
    version: watch::Sender<u64>,
    registration: Mutex<Option<(RefreshScheduler, RegistrationId)>>,
}

/// One consumer's binding of a query to a fetcher.
///
/// Dropping the controller detaches it.
pub struct FetchController<Q, T>
where
    Q: Clone + PartialEq + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    binding: Arc<Binding<Q, T>>,
}

impl<Q, T> FetchController<Q, T>
where
    Q: Clone + PartialEq + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Bind `query` to `fetcher`. Must be called inside a tokio runtime when
    /// `immediate` is set or background refresh is enabled.
    pub fn bind<F, Fut>(query: Q, fetcher: F, options: FetchOptions) -> Self
    where
        F: Fn(Q) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        let fetcher: Fetcher<Q, T> = Arc::new(move |query| fetcher(query).boxed());
        Self::bind_boxed(query, fetcher, options)
    }

    /// Like [`FetchController::bind`] with an already boxed fetcher.
    pub fn bind_boxed(query: Q, fetcher: Fetcher<Q, T>, options: FetchOptions) -> Self {
        let (version, _) = watch::channel(0);
        let binding = Arc::new(Binding {
            fetcher,
            stale_time: options.stale_time,
            keep_data_on_error: options.keep_data_on_error,
            tokens: TokenSource::new(),
            state: Mutex::new(BindingState {
                query,
                fetch: FetchState::default(),
                current: None,
            }),
            version,
            registration: Mutex::new(None),
        });

        if let Some((scheduler, interval)) = options.background {
            let strong: Arc<dyn BackgroundRefresh> = binding.clone();
            let target: Weak<dyn BackgroundRefresh> = Arc::downgrade(&strong);
            let id = scheduler.register(target, interval);
            *binding
                .registration
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some((scheduler, id));
        }

        let controller = Self { binding };
        if options.immediate {
            controller.refresh();
        }
        controller
    }

    /// Start a foreground fetch, superseding any outstanding operation.
    ///
    /// On a detached binding this does nothing and the returned task
    /// completes immediately.
    pub fn refresh(&self) -> JoinHandle<()> {
        Binding::start_foreground(&self.binding)
    }

    /// Change the query. Refreshes and returns the task if it differs from
    /// the current one; otherwise returns `None`.
    pub fn set_query(&self, query: Q) -> Option<JoinHandle<()>> {
        {
            let mut state = self.binding.lock();
            if state.query == query || self.binding.tokens.is_detached() {
                return None;
            }
            state.query = query;
        }
        Some(self.refresh())
    }

    /// Revalidate in the background if stale, attached, idle and not
    /// already revalidating. Returns true if an operation started.
    pub fn background_tick(&self) -> bool {
        Binding::start_background(&self.binding)
    }

    /// Abandon the outstanding foreground operation, if any. Its result
    /// will be discarded and `loading` drops back to false.
    pub fn cancel(&self) {
        let changed = {
            let mut state = self.binding.lock();
            match state.current.take() {
                Some(token) => {
                    token.cancel();
                    self.binding.tokens.supersede();
                    state.fetch.loading = false;
                    true
                }
                None => false,
            }
        };
        if changed {
            self.binding.bump();
        }
    }

    /// Token of the outstanding foreground operation. Cancelling it makes
    /// the operation settle without applying its result.
    pub fn current_token(&self) -> Option<CancellationToken> {
        self.binding.lock().current.clone()
    }

    pub fn snapshot(&self) -> FetchSnapshot<T> {
        self.binding.lock().fetch.snapshot(self.binding.stale_time)
    }

    pub fn query(&self) -> Q {
        self.binding.lock().query.clone()
    }

    /// Version counter bumped on every applied state change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.binding.version.subscribe()
    }

    pub fn version(&self) -> u64 {
        *self.binding.version.borrow()
    }

    pub fn is_detached(&self) -> bool {
        self.binding.tokens.is_detached()
    }

    /// Tear the binding down. Outstanding operations never apply; the
    /// scheduler stops ticking it. Idempotent.
    pub fn detach(&self) {
        self.binding.detach();
    }
}

impl<Q, T> Drop for FetchController<Q, T>
where
    Q: Clone + PartialEq + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.binding.detach();
    }
}

impl<Q, T> std::fmt::Debug for FetchController<Q, T>
where
    Q: Clone + PartialEq + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.binding.lock();
        f.debug_struct("FetchController")
            .field("loading", &state.fetch.loading)
            .field("has_data", &state.fetch.data.is_some())
            .field("error", &state.fetch.error)
            .field("detached", &self.binding.tokens.is_detached())
            .finish()
    }
}

impl<Q, T> Binding<Q, T>
where
    Q: Clone + PartialEq + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    fn lock(&self) -> MutexGuard<'_, BindingState<Q, T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        self.version.send_modify(|version| *version += 1);
    }

    fn start_foreground(binding: &Arc<Self>) -> JoinHandle<()> {
        let (token, query) = {
            let mut state = binding.lock();
            if binding.tokens.is_detached() {
                return tokio::spawn(async {});
            }
            let token = binding.tokens.issue();
            state.current = Some(token.clone());
            state.fetch.loading = true;
            state.fetch.error = None;
            (token, state.query.clone())
        };
        binding.bump();

        let operation = spawn_fetch(&binding.fetcher, query);
        let binding = Arc::clone(binding);
        tokio::spawn(async move {
            let result = settle(operation).await;
            binding.apply_foreground(&token, result);
        })
    }

    fn apply_foreground(&self, token: &CancellationToken, result: Result<T, ClientError>) {
        {
            let mut state = self.lock();
            if token.is_superseded() {
                tracing::trace!(generation = token.generation(), "Discarding superseded result");
                return;
            }
            state.current = None;
            state.fetch.loading = false;

            match token.check().and(result) {
                Ok(data) => state.fetch.apply_success(data),
                Err(ClientError::Cancelled) => {
                    tracing::debug!(generation = token.generation(), "Foreground fetch cancelled");
                }
                Err(err) => {
                    tracing::debug!(error = %err, "Foreground fetch failed");
                    state.fetch.apply_failure(err, self.keep_data_on_error);
                }
            }
        }
        self.bump();
    }

    fn start_background(binding: &Arc<Self>) -> bool {
        let (token, query) = {
            let mut state = binding.lock();
            if binding.tokens.is_detached()
                || state.fetch.loading
                || state.fetch.revalidating
                || !state.fetch.is_stale(binding.stale_time)
            {
                return false;
            }
            state.fetch.revalidating = true;
            (binding.tokens.current(), state.query.clone())
        };

        let operation = spawn_fetch(&binding.fetcher, query);
        let binding = Arc::clone(binding);
        tokio::spawn(async move {
            let result = settle(operation).await;
            binding.apply_background(&token, result);
        });
        true
    }

    fn apply_background(&self, token: &CancellationToken, result: Result<T, ClientError>) {
        let applied = {
            let mut state = self.lock();
            state.fetch.revalidating = false;
            if token.is_cancelled() {
                tracing::trace!(generation = token.generation(), "Discarding superseded revalidation");
                return;
            }
            match result {
                Ok(data) => {
                    state.fetch.apply_success(data);
                    true
                }
                Err(ClientError::Cancelled) => false,
                Err(err) => {
                    tracing::warn!(error = %err, "Background refresh failed");
                    false
                }
            }
        };
        if applied {
            self.bump();
        }
    }

    fn detach(&self) {
        {
            let mut state = self.lock();
            if self.tokens.is_detached() {
                return;
            }
            self.tokens.detach();
            state.current = None;
            state.fetch.loading = false;
        }

        let registration = self
            .registration
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some((scheduler, id)) = registration {
            scheduler.deregister(id);
        }
        tracing::debug!("Fetch binding detached");
    }
}

/// Run the fetcher in its own task so a panic surfaces as a `JoinError`.
fn spawn_fetch<Q, T>(fetcher: &Fetcher<Q, T>, query: Q) -> JoinHandle<Result<T, ClientError>>
where
    Q: Send + 'static,
    T: Send + 'static,
{
    let fetcher = Arc::clone(fetcher);
    tokio::spawn(async move { fetcher(query).await })
}

async fn settle<T>(operation: JoinHandle<Result<T, ClientError>>) -> Result<T, ClientError> {
    match operation.await {
        Ok(result) => result,
        Err(join_err) => {
            let reason = if join_err.is_panic() { "panicked" } else { "was aborted" };
            Err(ClientError::transport(
                TransportErrorKind::Other,
                format!("fetch task {}", reason),
            ))
        }
    }
}

impl<Q, T> BackgroundRefresh for Binding<Q, T>
where
    Q: Clone + PartialEq + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    fn background_tick(self: Arc<Self>) -> bool {
        Self::start_background(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Script = Arc<Mutex<VecDeque<(u64, Result<String, ClientError>)>>>;

    /// Fetcher replaying `(delay_ms, result)` pairs in order; the last one
    /// repeats. Also returns the call counter.
    fn scripted(
        steps: Vec<(u64, Result<String, ClientError>)>,
    ) -> (
        impl Fn(u32) -> BoxFuture<'static, Result<String, ClientError>> + Send + Sync + 'static,
        Arc<AtomicUsize>,
    ) {
        let script: Script = Arc::new(Mutex::new(steps.into()));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let fetcher = move |_query: u32| {
            counter.fetch_add(1, Ordering::SeqCst);
            let (delay, result) = {
                let mut script = script.lock().unwrap();
                if script.len() > 1 {
                    script.pop_front().unwrap()
                } else {
                    script.front().cloned().unwrap()
                }
            };
            async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                result
            }
            .boxed()
        };
        (fetcher, calls)
    }

    fn ok(value: &str) -> Result<String, ClientError> {
        Ok(value.to_string())
    }

    fn manual() -> FetchOptions {
        FetchOptions::new()
            .immediate(false)
            .with_stale_time(Duration::from_millis(2_000))
    }

    #[tokio::test(start_paused = true)]
    async fn test_newest_refresh_wins() {
        let (fetcher, calls) = scripted(vec![(300, ok("first")), (100, ok("second"))]);
        let controller = FetchController::bind(1, fetcher, manual());

        let first = controller.refresh();
        let second = controller.refresh();
        assert!(controller.snapshot().loading);

        second.await.unwrap();
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.data.as_deref(), Some("second"));
        assert!(!snapshot.loading);

        first.await.unwrap();
        assert_eq!(controller.snapshot().data.as_deref(), Some("second"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_bind_fetches() {
        let (fetcher, calls) = scripted(vec![(10, ok("a"))]);
        let controller = FetchController::bind(1, fetcher, FetchOptions::new());
        assert!(controller.snapshot().loading);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(controller.snapshot().data.as_deref(), Some("a"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_staleness_follows_last_fetch() {
        let (fetcher, _) = scripted(vec![(0, ok("a"))]);
        let controller = FetchController::bind(1, fetcher, manual());
        assert!(controller.snapshot().is_stale);
        assert!(controller.snapshot().last_fetched.is_none());

        controller.refresh().await.unwrap();
        assert!(!controller.snapshot().is_stale);
        assert!(controller.snapshot().last_fetched.is_some());

        tokio::time::advance(Duration::from_millis(2_000)).await;
        assert!(!controller.snapshot().is_stale);
        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(controller.snapshot().is_stale);
    }

    #[tokio::test(start_paused = true)]
    async fn test_foreground_failure_clears_data_by_default() {
        let (fetcher, _) = scripted(vec![(0, ok("a")), (0, Err(ClientError::from_status(500, None)))]);
        let controller = FetchController::bind(1, fetcher, manual());

        controller.refresh().await.unwrap();
        controller.refresh().await.unwrap();

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.data, None);
        assert_eq!(snapshot.error.and_then(|e| e.status()), Some(500));
        assert!(!snapshot.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keep_data_on_error() {
        let (fetcher, _) = scripted(vec![(0, ok("a")), (0, Err(ClientError::from_status(503, None)))]);
        let controller = FetchController::bind(1, fetcher, manual().keep_data_on_error(true));

        controller.refresh().await.unwrap();
        controller.refresh().await.unwrap();

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.data.as_deref(), Some("a"));
        assert!(snapshot.is_error());
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_fetcher_settles_as_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let controller = FetchController::bind(
            1u32,
            move |_query: u32| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    let parsed: Option<String> = None;
                    Ok(parsed.expect("fetcher exploded"))
                }
            },
            manual(),
        );

        controller.refresh().await.unwrap();
        let snapshot = controller.snapshot();
        assert!(!snapshot.loading);
        assert!(matches!(
            snapshot.error,
            Some(ClientError::Transport {
                kind: TransportErrorKind::Other,
                ..
            })
        ));
        assert!(controller.current_token().is_none());

        // Background revalidation is not wedged by the failed operation.
        assert!(controller.background_tick());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(controller.background_tick());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(!controller.snapshot().loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_clears_error() {
        let (fetcher, _) = scripted(vec![(0, Err(ClientError::from_status(500, None))), (50, ok("b"))]);
        let controller = FetchController::bind(1, fetcher, manual());

        controller.refresh().await.unwrap();
        assert!(controller.snapshot().is_error());

        let pending = controller.refresh();
        assert!(!controller.snapshot().is_error());
        pending.await.unwrap();
        assert_eq!(controller.snapshot().data.as_deref(), Some("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_query_refetches_only_on_change() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = Arc::clone(&seen);
        let controller = FetchController::bind(
            1u32,
            move |page: u32| {
                record.lock().unwrap().push(page);
                async move { Ok::<_, ClientError>(format!("page-{page}")) }
            },
            manual(),
        );

        assert!(controller.set_query(1).is_none());
        controller.set_query(2).unwrap().await.unwrap();

        assert_eq!(controller.query(), 2);
        assert_eq!(controller.snapshot().data.as_deref(), Some("page-2"));
        assert_eq!(*seen.lock().unwrap(), vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detach_discards_outstanding_result() {
        let (fetcher, calls) = scripted(vec![(100, ok("late"))]);
        let controller = FetchController::bind(1, fetcher, manual());

        let pending = controller.refresh();
        controller.detach();
        pending.await.unwrap();

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.data, None);
        assert!(!snapshot.loading);
        assert!(controller.is_detached());

        controller.refresh().await.unwrap();
        assert!(controller.set_query(5).is_none());
        assert!(!controller.background_tick());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_abandons_foreground() {
        let (fetcher, _) = scripted(vec![(100, ok("never"))]);
        let controller = FetchController::bind(1, fetcher, manual());

        let pending = controller.refresh();
        controller.cancel();
        assert!(!controller.snapshot().loading);

        pending.await.unwrap();
        assert_eq!(controller.snapshot().data, None);
        assert_eq!(controller.snapshot().error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_token_settles_without_applying() {
        let (fetcher, _) = scripted(vec![(0, ok("a")), (100, ok("b"))]);
        let controller = FetchController::bind(1, fetcher, manual());
        controller.refresh().await.unwrap();

        let pending = controller.refresh();
        controller.current_token().unwrap().cancel();
        pending.await.unwrap();

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.data.as_deref(), Some("a"));
        assert!(!snapshot.loading);
        assert_eq!(snapshot.error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_tick_only_when_stale() {
        let (fetcher, calls) = scripted(vec![(0, ok("a")), (50, ok("b"))]);
        let controller = FetchController::bind(1, fetcher, manual());
        controller.refresh().await.unwrap();

        assert!(!controller.background_tick());

        tokio::time::advance(Duration::from_millis(2_001)).await;
        assert!(controller.background_tick());
        assert!(!controller.background_tick(), "already revalidating");
        assert!(!controller.snapshot().loading);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(controller.snapshot().data.as_deref(), Some("b"));
        assert!(!controller.snapshot().is_stale);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_failure_keeps_state() {
        let (fetcher, _) = scripted(vec![(0, ok("a")), (0, Err(ClientError::from_status(500, None)))]);
        let controller = FetchController::bind(1, fetcher, manual());
        controller.refresh().await.unwrap();
        let version = controller.version();

        tokio::time::advance(Duration::from_millis(2_001)).await;
        assert!(controller.background_tick());
        tokio::time::sleep(Duration::from_millis(1)).await;

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.data.as_deref(), Some("a"));
        assert_eq!(snapshot.error, None);
        assert!(snapshot.is_stale);
        assert_eq!(controller.version(), version);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_skipped_while_loading() {
        let (fetcher, calls) = scripted(vec![(100, ok("a"))]);
        let controller = FetchController::bind(1, fetcher, manual());

        let pending = controller.refresh();
        assert!(!controller.background_tick());
        pending.await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_supersedes_background() {
        let (fetcher, _) = scripted(vec![(0, ok("a")), (200, ok("background")), (10, ok("foreground"))]);
        let controller = FetchController::bind(1, fetcher, manual());
        controller.refresh().await.unwrap();

        tokio::time::advance(Duration::from_millis(2_001)).await;
        assert!(controller.background_tick());
        controller.refresh().await.unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(controller.snapshot().data.as_deref(), Some("foreground"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_version_bumps_on_changes() {
        let (fetcher, _) = scripted(vec![(0, ok("a"))]);
        let controller = FetchController::bind(1, fetcher, manual());
        let mut rx = controller.subscribe();
        assert_eq!(*rx.borrow_and_update(), 0);

        controller.refresh().await.unwrap();
        assert!(rx.has_changed().unwrap());
        // loading on, then result applied
        assert_eq!(*rx.borrow_and_update(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_deregisters_from_scheduler() {
        let scheduler = RefreshScheduler::new();
        let (fetcher, _) = scripted(vec![(0, ok("a"))]);
        let controller = FetchController::bind(
            1,
            fetcher,
            manual().with_background(&scheduler, Duration::from_millis(1_000)),
        );
        assert_eq!(scheduler.len(), 1);

        drop(controller);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_options_from_settings() {
        let settings = FetchSettings::default();
        let scheduler = RefreshScheduler::new();

        let with = FetchOptions::from_settings(&settings, Some(&scheduler));
        assert_eq!(with.stale_time, settings.stale_time());
        assert_eq!(
            with.background.map(|(_, interval)| interval),
            Some(settings.background_interval())
        );

        assert!(FetchOptions::from_settings(&settings, None).background.is_none());

        let off = FetchSettings {
            background_refresh: false,
            ..FetchSettings::default()
        };
        assert!(FetchOptions::from_settings(&off, Some(&scheduler)).background.is_none());
    }
}
