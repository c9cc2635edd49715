use crate::config::SourcesConfig;
use crate::error::Result;
use governor::{
    clock::DefaultClock, middleware::NoOpMiddleware, state::direct::NotKeyed,
    state::InMemoryState, Quota, RateLimiter,
};
use reqwest::{Response, StatusCode};
use serde_json::Value;
use std::num::NonZeroU32;
use std::time::Duration;
use tokio::time::sleep;

/// Rate-limited HTTP client with bounded exponential-backoff retry on
/// throttling, server errors and transport failures.
pub struct HttpClient {
    config: SourcesConfig,
    client: reqwest::Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>,
}

impl HttpClient {
    pub fn new(config: SourcesConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .no_proxy() // Disable system proxy detection to avoid system-configuration issues
            .build()
            .expect("Failed to create HTTP client");

        let rate_limit = std::cmp::max(1, config.rate_limit_per_second);
        let quota = Quota::per_second(
            NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::new(1).unwrap()),
        );
        let rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware> =
            RateLimiter::direct(quota);

        Self {
            config,
            client,
            rate_limiter,
        }
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Response> {
        let mut retries = 0;
        loop {
            self.rate_limiter.until_ready().await;

            let result = self.client.get(url).query(query).send().await;

            match result {
                Ok(response) if should_retry(response.status()) => {
                    if retries < self.config.max_retries {
                        let backoff = Duration::from_secs(2_u64.pow(retries));
                        tracing::warn!(
                            "GET {} returned {}, retrying in {:?} (attempt {}/{})",
                            url,
                            response.status(),
                            backoff,
                            retries + 1,
                            self.config.max_retries
                        );
                        sleep(backoff).await;
                        retries += 1;
                        continue;
                    }
                    return Ok(response.error_for_status()?);
                }
                Ok(response) => {
                    return Ok(response.error_for_status()?);
                }
                Err(e) if e.is_timeout() || e.is_connect() || e.is_request() => {
                    if retries < self.config.max_retries {
                        let backoff = Duration::from_secs(2_u64.pow(retries));
                        tracing::warn!(
                            "GET {} failed ({}), retrying in {:?} (attempt {}/{})",
                            url,
                            e,
                            backoff,
                            retries + 1,
                            self.config.max_retries
                        );
                        sleep(backoff).await;
                        retries += 1;
                        continue;
                    }
                    return Err(e.into());
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Fetch a CSV (or other text) body.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self.get(url, &[]).await?;
        Ok(response.text().await?)
    }

    /// Fetch and parse a JSON body.
    pub async fn fetch_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value> {
        let response = self.get(url, query).await?;
        Ok(response.json().await?)
    }

    /// Reachability probe: issue the request and discard the body.
    pub async fn probe(&self, url: &str) -> Result<()> {
        self.get(url, &[]).await?;
        Ok(())
    }
}

/// Throttling and server errors are worth retrying; other client errors are
/// not.
fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}
