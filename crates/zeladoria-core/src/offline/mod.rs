//! Offline asset cache for installable front ends.
//!
//! This module provides:
//! - `CacheStorage`: named, versioned caches of HTTP responses stored on disk
//! - `CacheWorker`: pre-populates one cache with the app's static assets
//!   (install) and serves requests cache-first with network fallback (fetch)
//!
//! Cached entries never expire. Only the fixed asset list is ever written;
//! responses served from the network are passed through untouched.

pub mod storage;
pub mod worker;

pub use storage::{Cache, CacheStorage, CachedData, CachedResponse};
pub use worker::{
    CacheWorker, FetchError, FetchResponse, Fetcher, HttpFetcher, InstallReport, ResponseSource,
    WorkerState, CACHE_NAME, PRECACHE_URLS,
};
