//! Cache-first asset worker.
//!
//! Install fetches the whole asset list and stores it in one versioned cache;
//! the install either stores everything or nothing. Once the new cache is
//! populated, every other cache in the storage is evicted.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::{header, Client, Url};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::storage::{CacheStorage, CachedResponse};

/// Version of the asset cache. Bump whenever `PRECACHE_URLS` changes.
pub const CACHE_NAME: &str = "marica-cidadao-v1";

/// Static assets needed to render the app without a network
pub const PRECACHE_URLS: [&str; 5] = [
    "/",
    "/logo/Logo-prefeitura.png",
    "/logo/Logo-Ictim.png",
    "/logo/fundo.png",
    "/logo/pwa_icon_512.png",
];

/// HTTP request timeout in seconds for asset fetches
const FETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Network error fetching {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("Unexpected status {status} for {url}")]
    BadStatus { url: String, status: u16 },

    #[error("Invalid URL {0}")]
    InvalidUrl(String),

    #[error("Cache error: {0}")]
    Cache(String),
}

impl FetchError {
    fn cache(err: anyhow::Error) -> Self {
        FetchError::Cache(format!("{:#}", err))
    }
}

/// Network access for the worker.
/// Returns any response the server sends, including error statuses.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<CachedResponse, FetchError>;
}

/// `Fetcher` backed by reqwest.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<CachedResponse, FetchError> {
        let network_error = |e: reqwest::Error| FetchError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(network_error)?;

        Ok(CachedResponse {
            url: url.to_string(),
            status,
            content_type,
            body: body.to_vec(),
        })
    }
}

/// Lifecycle of a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    /// Install failed; the worker must not serve from its cache
    Redundant,
}

/// Where a fetched response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub response: CachedResponse,
    pub source: ResponseSource,
}

/// Outcome of a successful install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub cache_name: String,
    pub cached: usize,
    pub evicted: Vec<String>,
}

pub struct CacheWorker<F: Fetcher> {
    origin: Url,
    storage: CacheStorage,
    fetcher: F,
    cache_name: String,
    assets: Vec<String>,
    state: WorkerState,
}

impl<F: Fetcher> CacheWorker<F> {
    /// Create a worker for the app served at `origin` (e.g. `http://localhost:3000`)
    pub fn new(origin: &str, storage: CacheStorage, fetcher: F) -> Result<Self, FetchError> {
        let origin = Url::parse(origin).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", origin, e)))?;
        Ok(Self {
            origin,
            storage,
            fetcher,
            cache_name: CACHE_NAME.to_string(),
            assets: PRECACHE_URLS.iter().map(|u| u.to_string()).collect(),
            state: WorkerState::Parsed,
        })
    }

    /// Replace the cache name and asset list
    pub fn with_manifest(mut self, cache_name: &str, assets: &[&str]) -> Self {
        self.cache_name = cache_name.to_string();
        self.assets = assets.iter().map(|u| u.to_string()).collect();
        self
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    /// Resolve a path or absolute URL against the app origin
    pub fn resolve(&self, url: &str) -> Result<Url, FetchError> {
        self.origin
            .join(url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))
    }

    async fn fetch_asset(&self, url: Url) -> Result<CachedResponse, FetchError> {
        let response = self.fetcher.fetch(&url).await?;
        if !response.is_success() {
            return Err(FetchError::BadStatus {
                url: url.to_string(),
                status: response.status,
            });
        }
        Ok(response)
    }

    /// Populate the cache with every listed asset, then evict older caches.
    ///
    /// Any failed fetch fails the whole install and nothing is stored.
    pub async fn install(&mut self) -> Result<InstallReport, FetchError> {
        self.state = WorkerState::Installing;
        info!(cache = %self.cache_name, assets = self.assets.len(), "Installing asset cache");

        match self.populate().await {
            Ok(report) => {
                self.state = WorkerState::Installed;
                info!(
                    cache = %report.cache_name,
                    cached = report.cached,
                    evicted = ?report.evicted,
                    "Asset cache installed"
                );
                Ok(report)
            }
            Err(e) => {
                self.state = WorkerState::Redundant;
                warn!(cache = %self.cache_name, error = %e, "Asset cache install failed");
                Err(e)
            }
        }
    }

    async fn populate(&self) -> Result<InstallReport, FetchError> {
        let urls = self
            .assets
            .iter()
            .map(|asset| self.resolve(asset))
            .collect::<Result<Vec<_>, _>>()?;

        let responses = try_join_all(urls.into_iter().map(|url| self.fetch_asset(url))).await?;

        let cache = self.storage.open(&self.cache_name).map_err(FetchError::cache)?;
        cache.put_all(&responses).map_err(FetchError::cache)?;

        let mut evicted = Vec::new();
        for name in self.storage.keys().map_err(FetchError::cache)? {
            if name != self.cache_name && self.storage.delete(&name).map_err(FetchError::cache)? {
                debug!(cache = %name, "Evicted stale cache");
                evicted.push(name);
            }
        }

        Ok(InstallReport {
            cache_name: self.cache_name.clone(),
            cached: responses.len(),
            evicted,
        })
    }

    /// Serve a request: cached copy if there is one, the network otherwise.
    ///
    /// Network responses are returned as-is and never written to the cache.
    pub async fn handle_fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let url = self.resolve(url)?;

        if self.state != WorkerState::Redundant {
            match self.lookup(url.as_str()) {
                Ok(Some(response)) => {
                    return Ok(FetchResponse {
                        response,
                        source: ResponseSource::Cache,
                    });
                }
                Ok(None) => debug!(url = %url, "Cache miss"),
                Err(e) => warn!(url = %url, error = %e, "Cache lookup failed, using network"),
            }
        }

        let response = self.fetcher.fetch(&url).await?;
        Ok(FetchResponse {
            response,
            source: ResponseSource::Network,
        })
    }

    fn lookup(&self, url: &str) -> Result<Option<CachedResponse>, FetchError> {
        let Some(cache) = self.storage.existing(&self.cache_name).map_err(FetchError::cache)? else {
            return Ok(None);
        };
        let cached = cache.match_url(url).map_err(FetchError::cache)?;
        Ok(cached.map(|c| {
            debug!(url, age = %c.age_display(), "Cache hit");
            c.data
        }))
    }
}
