//! Shared HTTP plumbing for every source client.
//!
//! [`HttpClient`] wraps a `reqwest::Client` with per-source pacing, status
//! classification and bounded exponential backoff.

use crate::config::ScraperConfig;
use crate::error::{PaperError, Result};
use crate::pacing::RequestPacer;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Build a client with the configured user agent, timeout and proxy
pub fn build_client(config: &ScraperConfig, headers: HeaderMap) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout())
        .default_headers(headers)
        .cookie_store(true);

    if let Some(proxy_url) = config.proxy.as_deref() {
        let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
            PaperError::Config(format!("Invalid proxy URL '{}': {}", proxy_url, e))
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| PaperError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Paced, retrying GET client for one source
pub struct HttpClient {
    client: reqwest::Client,
    pacer: RequestPacer,
    max_retries: u32,
    base_delay: Duration,
}

impl HttpClient {
    pub fn new(config: &ScraperConfig, pacer: RequestPacer, headers: HeaderMap) -> Result<Self> {
        Ok(Self {
            client: build_client(config, headers)?,
            pacer,
            max_retries: config.max_retries,
            base_delay: config.request_delay(),
        })
    }

    pub fn from_parts(
        client: reqwest::Client,
        pacer: RequestPacer,
        max_retries: u32,
        base_delay: Duration,
    ) -> Self {
        Self {
            client,
            pacer,
            max_retries,
            base_delay,
        }
    }

    /// GET `url` and return the body.
    ///
    /// Rate limits, network failures and 5xx responses are retried with
    /// exponential backoff; other non-2xx statuses fail immediately.
    pub async fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        let attempts = self.max_retries.max(1);
        let mut backoff = self.base_delay.max(Duration::from_millis(10));
        let mut last_error = None;

        for attempt in 0..attempts {
            match self.send_once(url, query).await {
                Ok(body) => return Ok(body),
                Err(e) if !is_retryable(&e) => return Err(e),
                Err(e) => {
                    let wait = match &e {
                        PaperError::RateLimited(secs) => Duration::from_secs(*secs).max(backoff),
                        _ => backoff,
                    };
                    warn!(
                        url = url,
                        attempt = attempt + 1,
                        wait_ms = wait.as_millis() as u64,
                        error = %e,
                        "Request failed"
                    );
                    last_error = Some(e);
                    if attempt + 1 < attempts {
                        tokio::time::sleep(wait).await;
                        backoff *= 2;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| PaperError::Parse(format!("no response from {}", url))))
    }

    /// GET `url` and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let body = self.get_text(url, query).await?;
        serde_json::from_str(&body)
            .map_err(|e| PaperError::Parse(format!("invalid JSON from {}: {}", url, e)))
    }

    async fn send_once(&self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        self.pacer.wait().await;
        debug!(url = url, "GET");

        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(5);
            return Err(PaperError::RateLimited(retry_after));
        }

        if !status.is_success() {
            return Err(PaperError::Api {
                code: status.as_u16() as i32,
                message: format!("HTTP error: {}", status),
            });
        }

        Ok(response.text().await?)
    }
}

fn is_retryable(error: &PaperError) -> bool {
    match error {
        PaperError::RateLimited(_) | PaperError::Network(_) => true,
        PaperError::Api { code, .. } => *code >= 500,
        _ => false,
    }
}
