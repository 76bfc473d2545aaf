// src/fetch.rs

//! Resilient HTTP request execution.
//!
//! Retries a fixed allow-list of transient conditions (connect failures,
//! timeouts, HTTP 408/429/500/502/503/504) with exponential backoff and
//! random jitter. Any other failure surfaces immediately. Every attempt
//! is bounded by a connect timeout and a total timeout.

use std::time::Duration;

use rand::Rng;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::models::FetcherConfig;

/// HTTP fetcher with retry, backoff and cancellation support.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    config: FetcherConfig,
    token: CancellationToken,
}

impl HttpFetcher {
    /// Build a fetcher with browser-like default headers.
    pub fn new(config: &FetcherConfig, token: CancellationToken) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
            token,
        })
    }

    /// Fetch a URL with GET, returning the response body.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        self.execute(url, None).await
    }

    /// Fetch a URL with POST and a JSON body, returning the response body.
    pub async fn fetch_with_body(&self, url: &str, body: &serde_json::Value) -> Result<String> {
        self.execute(url, Some(body)).await
    }

    async fn execute(&self, url: &str, body: Option<&serde_json::Value>) -> Result<String> {
        let mut last_error: Option<AppError> = None;

        for attempt in 0..self.config.max_attempts {
            if self.token.is_cancelled() {
                return Err(AppError::network(url, "fetch cancelled"));
            }

            match self.attempt(url, body).await {
                Ok(text) => return Ok(text),
                Err(error) if error.is_transient() => {
                    if attempt + 1 >= self.config.max_attempts {
                        return Err(AppError::RetriesExhausted {
                            url: url.to_string(),
                            attempts: self.config.max_attempts,
                            message: error.to_string(),
                        });
                    }
                    let delay = self.backoff_delay(attempt);
                    log::warn!(
                        "Transient failure for {} (attempt {}/{}): {}. Retrying in {}ms",
                        url,
                        attempt + 1,
                        self.config.max_attempts,
                        error,
                        delay.as_millis()
                    );
                    last_error = Some(error);
                    tokio::select! {
                        _ = self.token.cancelled() => {
                            return Err(AppError::network(url, "fetch cancelled"));
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(error) => return Err(error),
            }
        }

        // Loop always returns from its last iteration; kept for completeness.
        Err(last_error.unwrap_or_else(|| AppError::network(url, "no attempts made")))
    }

    async fn attempt(&self, url: &str, body: Option<&serde_json::Value>) -> Result<String> {
        let request = match body {
            Some(json) => self.client.post(url).json(json),
            None => self.client.get(url),
        };

        let response = request
            .send()
            .await
            .map_err(|e| Self::classify_transport(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| Self::classify_transport(url, e))
    }

    /// Exponential backoff with random jitter, capped at the configured
    /// maximum so delays stay bounded.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = Duration::from_millis(self.config.backoff_base_ms);
        let cap = Duration::from_millis(self.config.backoff_max_ms);

        let multiplier = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        let exp = base.checked_mul(multiplier).unwrap_or(cap).min(cap);

        let jitter_range_ms = self.config.backoff_base_ms / 2;
        if jitter_range_ms == 0 {
            return exp;
        }
        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..jitter_range_ms));
        (exp + jitter).min(cap)
    }

    /// Connection and timeout failures are transient; everything else at
    /// the transport layer is not worth retrying.
    fn classify_transport(url: &str, error: reqwest::Error) -> AppError {
        if error.is_timeout() || error.is_connect() || error.is_request() {
            AppError::network(url, error)
        } else {
            AppError::Http(error)
        }
    }
}
