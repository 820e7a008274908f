//! Background catalog fetch with an observable readiness state.
//!
//! A [`CatalogFetcher`] starts fetching as soon as it is created. The fetch
//! runs on its own thread and publishes its progress through a watch
//! channel: readers either poll [`CatalogFetcher::state`] or await
//! [`CatalogFetcher::wait`]. The terminal state is published exactly once,
//! after the catalog snapshot it refers to.

use std::sync::Arc;
use std::thread;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::plugin::Catalog;

use super::traits::CatalogClient;
use super::ManagerError;

/// Readiness of a catalog fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    /// Not started.
    Unknown,
    /// Request in flight.
    InProgress,
    /// Catalog fetched and parsed.
    Success,
    /// Network, parse or cancellation failure.
    Fail,
}

impl FetchState {
    /// Returns true for `Success` and `Fail`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Fail)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::InProgress => "in progress",
            Self::Success => "success",
            Self::Fail => "fail",
        }
    }
}

impl std::fmt::Display for FetchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Value carried by the watch channel.
#[derive(Debug, Clone)]
struct FetchStatus {
    state: FetchState,
    catalog: Option<Arc<Catalog>>,
    error: Option<String>,
}

impl FetchStatus {
    fn pending(state: FetchState) -> Self {
        Self {
            state,
            catalog: None,
            error: None,
        }
    }

    fn failed(error: &ManagerError) -> Self {
        Self {
            state: FetchState::Fail,
            catalog: None,
            error: Some(error.to_string()),
        }
    }
}

/// One catalog fetch cycle.
pub struct CatalogFetcher {
    url: String,
    status: watch::Receiver<FetchStatus>,
    cancel: CancellationToken,
}

impl CatalogFetcher {
    /// Start fetching `url` in the background and return immediately.
    ///
    /// The returned fetcher is already `InProgress`.
    pub fn start(client: Arc<dyn CatalogClient>, url: impl Into<String>) -> Self {
        let url = url.into();
        let (tx, rx) = watch::channel(FetchStatus::pending(FetchState::Unknown));
        let cancel = CancellationToken::new();

        tx.send_replace(FetchStatus::pending(FetchState::InProgress));

        let task_url = url.clone();
        let task_cancel = cancel.clone();
        let spawned = thread::Builder::new()
            .name("catalog-fetch".to_string())
            .spawn(move || {
                let status = fetch(client.as_ref(), &task_url, &task_cancel);
                tx.send_replace(status);
            });

        // A closed channel without a terminal value reads as `Fail`.
        if let Err(e) = spawned {
            tracing::error!(error = %e, "Failed to spawn catalog fetch thread");
        }

        Self {
            url,
            status: rx,
            cancel,
        }
    }

    /// Catalog URL this fetcher targets.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current readiness state.
    pub fn state(&self) -> FetchState {
        let state = self.status.borrow().state;
        if state.is_terminal() || self.status.has_changed().is_ok() {
            return state;
        }
        // Sender is gone: the terminal value may have landed just before it closed.
        match self.status.borrow().state {
            FetchState::Success => FetchState::Success,
            _ => FetchState::Fail,
        }
    }

    /// Catalog snapshot, available only once the state is `Success`.
    pub fn catalog(&self) -> Option<Arc<Catalog>> {
        let status = self.status.borrow();
        match status.state {
            FetchState::Success => status.catalog.clone(),
            _ => None,
        }
    }

    /// Failure description, available only once the state is `Fail`.
    pub fn error(&self) -> Option<String> {
        self.status.borrow().error.clone()
    }

    /// Wait until the fetch reaches a terminal state.
    pub async fn wait(&self) -> FetchState {
        let mut rx = self.status.clone();
        let state = match rx.wait_for(|s| s.state.is_terminal()).await {
            Ok(status) => status.state,
            Err(_) => FetchState::Fail,
        };
        state
    }

    /// Abandon the fetch. An in-flight request still runs to completion, but
    /// its result is discarded and the state resolves to `Fail`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for CatalogFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogFetcher")
            .field("url", &self.url)
            .field("state", &self.state())
            .finish()
    }
}

fn fetch(client: &dyn CatalogClient, url: &str, cancel: &CancellationToken) -> FetchStatus {
    if cancel.is_cancelled() {
        return FetchStatus::failed(&ManagerError::Cancelled);
    }

    tracing::info!(url, "Fetching plugin catalog");
    let result = client.fetch_catalog(url);

    if cancel.is_cancelled() {
        tracing::info!(url, "Catalog fetch cancelled, discarding result");
        return FetchStatus::failed(&ManagerError::Cancelled);
    }

    match result {
        Ok(catalog) => {
            tracing::info!(url, plugins = catalog.len(), "Catalog fetched");
            FetchStatus {
                state: FetchState::Success,
                catalog: Some(Arc::new(catalog)),
                error: None,
            }
        }
        Err(e) => {
            tracing::error!(url, error = %e, kind = ?e.kind(), "Catalog fetch failed");
            FetchStatus::failed(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::ManagerResult;
    use crate::plugin::PluginDefinition;
    use std::sync::mpsc;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Catalog client that blocks until released, then returns its response.
    struct GatedClient {
        gate: Mutex<mpsc::Receiver<()>>,
        response: Mutex<Option<ManagerResult<Catalog>>>,
    }

    impl GatedClient {
        fn new(response: ManagerResult<Catalog>) -> (Arc<Self>, mpsc::Sender<()>) {
            let (tx, rx) = mpsc::channel();
            let client = Arc::new(Self {
                gate: Mutex::new(rx),
                response: Mutex::new(Some(response)),
            });
            (client, tx)
        }
    }

    impl CatalogClient for GatedClient {
        fn fetch_catalog(&self, _url: &str) -> ManagerResult<Catalog> {
            let _ = self.gate.lock().unwrap().recv();
            self.response.lock().unwrap().take().unwrap()
        }
    }

    fn sample_catalog() -> Catalog {
        Catalog::new(vec![PluginDefinition::new("Plugin X", "PluginX", "2.0")])
    }

    #[tokio::test]
    async fn test_in_progress_then_success() {
        let (client, release) = GatedClient::new(Ok(sample_catalog()));
        let fetcher = CatalogFetcher::start(client, "http://example.com/pluginmaster.json");

        assert_eq!(fetcher.state(), FetchState::InProgress);
        assert!(fetcher.catalog().is_none());

        release.send(()).unwrap();
        assert_eq!(fetcher.wait().await, FetchState::Success);
        assert_eq!(fetcher.state(), FetchState::Success);
        assert_eq!(fetcher.catalog().unwrap().len(), 1);
        assert!(fetcher.error().is_none());
    }

    #[tokio::test]
    async fn test_failure_leaves_catalog_unset() {
        let (client, release) = GatedClient::new(Err(ManagerError::CatalogParseFailed {
            url: "mock".to_string(),
            reason: "expected array".to_string(),
        }));
        let fetcher = CatalogFetcher::start(client, "mock");

        release.send(()).unwrap();
        assert_eq!(fetcher.wait().await, FetchState::Fail);
        assert!(fetcher.catalog().is_none());
        assert!(fetcher.error().unwrap().contains("expected array"));
    }

    #[tokio::test]
    async fn test_cancel_discards_result() {
        let (client, release) = GatedClient::new(Ok(sample_catalog()));
        let fetcher = CatalogFetcher::start(client, "mock");

        fetcher.cancel();
        release.send(()).unwrap();

        assert_eq!(fetcher.wait().await, FetchState::Fail);
        assert!(fetcher.catalog().is_none());
    }

    #[tokio::test]
    async fn test_wait_after_fetch_thread_finished() {
        let (client, release) = GatedClient::new(Ok(sample_catalog()));
        let fetcher = CatalogFetcher::start(client, "mock");
        release.send(()).unwrap();

        assert_eq!(fetcher.wait().await, FetchState::Success);
        // Terminal state is sticky
        assert_eq!(fetcher.wait().await, FetchState::Success);
    }

    #[test]
    fn test_polling_reaches_terminal_state() {
        let (client, release) = GatedClient::new(Ok(sample_catalog()));
        let fetcher = CatalogFetcher::start(client, "mock");
        release.send(()).unwrap();

        let mut state = fetcher.state();
        for _ in 0..500 {
            if state.is_terminal() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
            state = fetcher.state();
        }
        assert_eq!(state, FetchState::Success);
    }

    #[test]
    fn test_state_terminal_flags() {
        assert!(!FetchState::Unknown.is_terminal());
        assert!(!FetchState::InProgress.is_terminal());
        assert!(FetchState::Success.is_terminal());
        assert!(FetchState::Fail.is_terminal());
        assert_eq!(FetchState::InProgress.to_string(), "in progress");
    }
}
