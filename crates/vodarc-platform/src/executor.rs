//! Resilient HTTP request executor.
//!
//! Issues one authenticated platform call per invocation with bounded retry
//! on rate limiting. The retry discipline is delay-then-retry with a fixed
//! sleep; any non-success status other than 429 fails immediately with the
//! status and response body attached.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Client, Method, StatusCode};
use tracing::warn;

use vodarc_models::Platform;

use crate::error::{PlatformError, PlatformResult};
use crate::metrics::{record_request, record_retry};
use crate::token::TokenCache;

/// Fixed browser-like user-agent attached to every request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Request executor configuration.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Base URL requests are issued against
    pub base_url: String,
    /// Total request attempts when the platform answers 429
    pub max_attempts: u32,
    /// Fixed sleep between rate-limited attempts
    pub retry_delay: Duration,
    /// Per-request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Whether to attach the cached bearer token
    pub send_bearer: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            max_attempts: 5,
            retry_delay: Duration::from_secs(10),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            send_bearer: true,
        }
    }
}

impl ExecutorConfig {
    /// Config for a given base URL with the default retry policy.
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Copy)]
enum RequestBody<'a> {
    None,
    Json(&'a serde_json::Value),
    Form(&'a [(&'a str, String)]),
}

/// Executes authenticated HTTP calls against one platform API host.
pub struct RequestExecutor {
    http: Client,
    config: ExecutorConfig,
    platform: Platform,
    tokens: Arc<TokenCache>,
}

impl RequestExecutor {
    /// Create a new executor for a platform host.
    pub fn new(
        platform: Platform,
        config: ExecutorConfig,
        tokens: Arc<TokenCache>,
    ) -> PlatformResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(USER_AGENT)
            .build()
            .map_err(PlatformError::Network)?;

        Ok(Self {
            http,
            config,
            platform,
            tokens,
        })
    }

    /// Execute a request without a body, returning the raw response bytes.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        headers: &[(&str, String)],
    ) -> PlatformResult<Vec<u8>> {
        self.send(method, path, params, headers, RequestBody::None)
            .await
    }

    /// Execute a request with a JSON body, returning the raw response bytes.
    pub async fn execute_json<B: serde::Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        headers: &[(&str, String)],
    ) -> PlatformResult<Vec<u8>> {
        let body = serde_json::to_value(body)?;
        self.send(method, path, &[], headers, RequestBody::Json(&body))
            .await
    }

    /// Execute a request with a form-encoded body, returning the raw
    /// response bytes.
    pub async fn execute_form(
        &self,
        method: Method,
        path: &str,
        form: &[(&str, String)],
        headers: &[(&str, String)],
    ) -> PlatformResult<Vec<u8>> {
        self.send(method, path, &[], headers, RequestBody::Form(form))
            .await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        headers: &[(&str, String)],
        body: RequestBody<'_>,
    ) -> PlatformResult<Vec<u8>> {
        let url = format!("{}{}", self.config.base_url, path);

        for attempt in 1..=self.config.max_attempts {
            let mut request = self.http.request(method.clone(), &url);
            if !params.is_empty() {
                request = request.query(params);
            }
            if self.config.send_bearer {
                if let Some(token) = self.tokens.get(self.platform).await {
                    request = request.bearer_auth(token);
                }
            }
            for (name, value) in headers {
                request = request.header(*name, value.as_str());
            }
            match body {
                RequestBody::None => {}
                RequestBody::Json(json) => request = request.json(json),
                RequestBody::Form(form) => request = request.form(form),
            }

            let started = Instant::now();
            let response = request.send().await?;
            let status = response.status();
            record_request(
                self.platform.as_str(),
                path,
                status.as_u16(),
                started.elapsed().as_secs_f64() * 1000.0,
            );

            if status == StatusCode::TOO_MANY_REQUESTS {
                warn!(
                    platform = %self.platform,
                    path,
                    attempt,
                    max_attempts = self.config.max_attempts,
                    "Rate limited, backing off"
                );
                record_retry(self.platform.as_str());
                if attempt < self.config.max_attempts {
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(PlatformError::UnexpectedStatus {
                    status: status.as_u16(),
                    body,
                });
            }

            return Ok(response.bytes().await?.to_vec());
        }

        Err(PlatformError::MaxRetriesExceeded(self.config.max_attempts))
    }
}
