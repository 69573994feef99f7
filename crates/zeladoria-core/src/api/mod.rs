//! REST API client module for the city's zeladoria service.
//!
//! This module provides the `ApiClient` for submitting issue reports and
//! listing previously submitted ones, and the `ReportTransport` seam the
//! report form uses to send a report without knowing about HTTP.
//!
//! Reports are sent as `multipart/form-data` to `/api/relatos/`.

pub mod client;
pub mod error;
pub mod payload;

use async_trait::async_trait;

pub use client::ApiClient;
pub use error::ApiError;
pub use payload::ReportPayload;

/// Delivers a finished report to the city.
///
/// Implementations issue exactly one request per call and never retry.
#[async_trait]
pub trait ReportTransport: Send + Sync {
    async fn send_report(&self, payload: ReportPayload) -> Result<(), ApiError>;
}
