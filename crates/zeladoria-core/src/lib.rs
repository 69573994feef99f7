//! Core library for zeladoria, the Maricá citizen issue reporting client.
//!
//! - `form`: report draft state, location capture and submission
//! - `api`: HTTP client for the city's `/api/relatos/` endpoint
//! - `location`: the `Locator` seam for device positioning
//! - `offline`: cache-first static asset worker
//! - `models`: drafts, categories, submission status and server reports
//! - `config`: persisted configuration

pub mod api;
pub mod config;
pub mod form;
pub mod location;
pub mod models;
pub mod offline;
pub mod utils;

pub use api::{ApiClient, ApiError, ReportTransport};
pub use config::Config;
pub use form::ReportForm;
pub use location::{FixedLocator, LocationError, Locator, UnsupportedLocator};
pub use models::{Category, Coordinate, Photo, ReportDraft, SubmissionStatus};
pub use offline::{CacheStorage, CacheWorker, HttpFetcher};
