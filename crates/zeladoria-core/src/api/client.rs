//! API client for the city's zeladoria REST API.
//!
//! This module provides the `ApiClient` struct for submitting issue reports
//! and fetching the reports a citizen has already sent.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::{debug, info, warn};

use crate::models::Report;

use super::{ApiError, ReportPayload, ReportTransport};

// ============================================================================
// Constants
// ============================================================================

/// Path of the reports collection, relative to the API base URL
const REPORTS_PATH: &str = "/api/relatos/";

/// HTTP request timeout in seconds.
/// Photo uploads over mobile data can be slow, 30s still fails fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// API client for the zeladoria service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client for the given base URL (e.g. `http://localhost:8000`)
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    ///
    /// The service accepts anonymous reports today, so nothing calls this yet.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    pub fn reports_url(&self) -> String {
        format!("{}{}", self.base_url, REPORTS_PATH)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            let value = header::HeaderValue::from_str(&format!("Token {}", token))
                .map_err(|e| ApiError::InvalidRequest(format!("Invalid token: {}", e)))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Fetch reports visible to the current user
    pub async fn fetch_reports(&self) -> Result<Vec<Report>> {
        let url = self.reports_url();

        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let response = Self::check_response(response).await?;

        let text = response
            .text()
            .await
            .context("Failed to read reports response body")?;
        let reports: Vec<Report> =
            serde_json::from_str(&text).context("Failed to parse reports response")?;

        debug!(count = reports.len(), "Fetched reports");
        Ok(reports)
    }
}

#[async_trait]
impl ReportTransport for ApiClient {
    /// POST the report as multipart form data. The response body is not read.
    async fn send_report(&self, payload: ReportPayload) -> Result<(), ApiError> {
        let url = self.reports_url();
        let category = payload.category;
        let form = payload
            .into_form()
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid photo: {}", e)))?;

        // Content-Type (with boundary) is set by reqwest from the multipart form
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "Report request failed before a response");
                ApiError::from(e)
            })?;

        let status = response.status();
        Self::check_response(response).await?;

        info!(url = %url, status = status.as_u16(), category, "Report submitted");
        Ok(())
    }
}
