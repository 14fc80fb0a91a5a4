//! API client for the dashboard backend.
//!
//! This module provides the `ApiClient` struct for fetching the dashboard's
//! source collections and for the few state-changing calls the dashboard
//! makes (mark-read, calendar entry create/delete).

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, Url};
use serde_json::Value;
use tracing::{debug, warn};

use super::ApiError;
use crate::models::event::NewEvent;
use crate::models::Source;

// ============================================================================
// Constants
// ============================================================================

/// Default HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// The backend operations the sync engine depends on.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    /// Fetch one source collection as a raw JSON envelope.
    async fn fetch_source(&self, source: Source) -> Result<Value, ApiError>;

    /// Tell the backend a notification was read.
    async fn mark_notification_read(&self, id: &str) -> Result<(), ApiError>;
}

/// HTTP client for the dashboard backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client for `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid API base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("API base URL cannot hold paths: {}", base_url));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(ref token) = self.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ApiError::InvalidResponse(format!("Invalid token header: {}", e)))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>, ApiError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn get_json(&self, url: Url) -> Result<Value, ApiError> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(url.clone())
                .headers(self.auth_headers()?)
                .send()
                .await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    let text = response.text().await?;
                    return serde_json::from_str(&text).map_err(|e| {
                        ApiError::InvalidResponse(format!("Unparseable body from {}: {}", url, e))
                    });
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }

    // ===== Data Fetching Methods =====

    /// Fetch the raw envelope of one source collection
    pub async fn fetch(&self, source: Source) -> Result<Value, ApiError> {
        let url = self.endpoint(&[source.path()]);
        let envelope = self.get_json(url).await?;
        debug!(source = %source, "Source envelope received");
        Ok(envelope)
    }

    // ===== State-changing calls =====

    /// Mark a notification as read. Callers treat this as fire-and-forget.
    pub async fn mark_read(&self, id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["notifications", id, "read"]);
        let response = self
            .client
            .post(url)
            .headers(self.auth_headers()?)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Create a calendar entry, returning the server's record of it.
    pub async fn create_event(&self, event: &NewEvent) -> Result<Value, ApiError> {
        let url = self.endpoint(&[Source::Events.path()]);
        let response = self
            .client
            .post(url)
            .headers(self.auth_headers()?)
            .json(event)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::rejected(status, &body));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("Unparseable create response: {}", e)))
    }

    /// Delete a calendar entry.
    pub async fn delete_event(&self, id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&[Source::Events.path(), id]);
        let response = self
            .client
            .delete(url)
            .headers(self.auth_headers()?)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::rejected(status, &body))
        }
    }
}

#[async_trait]
impl DashboardApi for ApiClient {
    async fn fetch_source(&self, source: Source) -> Result<Value, ApiError> {
        self.fetch(source).await
    }

    async fn mark_notification_read(&self, id: &str) -> Result<(), ApiError> {
        self.mark_read(id).await
    }
}
