use crate::core::geo::TileCoord;
use crate::Result;
use async_trait::async_trait;
use crossbeam_channel::{unbounded, Receiver, Sender};
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Shared async HTTP client optimized for tile fetching
pub(crate) static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent("tilekit/0.1.0")
        .timeout(std::time::Duration::from_secs(10))
        .pool_idle_timeout(std::time::Duration::from_secs(90))
        .pool_max_idle_per_host(16)
        .build()
        .expect("failed to build reqwest async client")
});

/// Fetches raw tile bytes for a URL. The seam exists so hosts and tests
/// can substitute deterministic sources for the network.
#[async_trait]
pub trait TileFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Default fetcher hitting the provider's HTTP endpoint.
pub struct HttpFetcher;

#[async_trait]
impl TileFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = HTTP_CLIENT.get(url).send().await?;
        if !response.status().is_success() {
            return Err(format!("HTTP {} for {}", response.status(), url).into());
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Completion of one asynchronous tile fetch. Completions are unordered:
/// a later-requested tile may resolve before an earlier one.
#[derive(Debug)]
pub struct FetchResult {
    pub coord: TileCoord,
    /// Zoom epoch the request was issued under; compared against the
    /// cache's current epoch before the result may materialize.
    pub epoch: u64,
    pub data: Result<Vec<u8>>,
}

/// Fire-and-forget tile fetch dispatcher. Every request becomes an
/// independent task; results come back on an unbounded channel the host
/// drains once per event turn, which keeps all cache mutation on the
/// caller's thread. There is no cancellation API: stale completions are
/// discarded by the epoch check on the receiving side.
pub struct TileLoader {
    fetcher: Arc<dyn TileFetcher>,
    result_tx: Sender<FetchResult>,
    result_rx: Receiver<FetchResult>,
}

impl TileLoader {
    pub fn new(fetcher: Arc<dyn TileFetcher>) -> Self {
        let (result_tx, result_rx) = unbounded();
        Self {
            fetcher,
            result_tx,
            result_rx,
        }
    }

    /// Loader backed by the shared HTTP client
    pub fn with_http() -> Self {
        Self::new(Arc::new(HttpFetcher))
    }

    /// Spawns an asynchronous fetch for `coord`. Must be called from
    /// within a tokio runtime.
    pub fn request(&self, url: String, coord: TileCoord, epoch: u64) {
        log::debug!("fetching tile {:?} (epoch {})", coord, epoch);
        let fetcher = Arc::clone(&self.fetcher);
        let result_tx = self.result_tx.clone();
        tokio::spawn(async move {
            let data = fetcher.fetch(&url).await;
            // A closed channel means the map is gone; drop the result.
            let _ = result_tx.send(FetchResult { coord, epoch, data });
        });
    }

    /// Drains every completed fetch without blocking.
    pub fn drain(&self) -> Vec<FetchResult> {
        let mut results = Vec::new();
        while let Ok(result) = self.result_rx.try_recv() {
            results.push(result);
        }
        results
    }

    /// Checks for completed fetches without consuming them
    pub fn has_pending_results(&self) -> bool {
        !self.result_rx.is_empty()
    }
}
