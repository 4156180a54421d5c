//! Asset fetcher implementation
//!
//! This module handles all HTTP requests made for page assets, including:
//! - Building the HTTP client with a fixed user agent and timeout
//! - HEAD requests to reject oversized files before downloading them
//! - GET requests with retry and exponential backoff
//! - Per-file and per-session size caps
//! - Choosing the local file name and writing the file once

use crate::config::{DownloadConfig, HttpConfig, MirrorConfig};
use crate::crawler::naming::{asset_extension, content_name, remote_file_name, sanitize_filename};
use crate::output::{AssetKind, LocalFile, OutputLayout};
use crate::FetchError;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, Method, Response, StatusCode};
use std::time::Duration;
use url::Url;

/// Status codes that trigger a retry
const RETRY_STATUSES: [StatusCode; 5] = [
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Files and bytes written by a session so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferCounters {
    /// New files created (pages, inline extracts, downloaded assets)
    pub files_written: u64,

    /// Bytes of downloaded assets; counted against the session cap
    pub bytes_written: u64,
}

/// Builds an HTTP client with proper configuration
///
/// TLS certificates are verified against the bundled web PKI roots.
///
/// # Example
///
/// ```no_run
/// use site_mirror::config::HttpConfig;
/// use site_mirror::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.timeout())
        .connect_timeout(config.timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Returns true for status codes worth retrying (429 and transient 5xx)
pub fn is_retryable_status(status: StatusCode) -> bool {
    RETRY_STATUSES.contains(&status)
}

/// Only idempotent requests are ever retried
fn is_idempotent(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::PUT | Method::DELETE | Method::TRACE
    )
}

fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}

/// Delay before retry number `retry` (1-based): `base * 2^(retry - 1)`
pub fn backoff_delay(base: Duration, retry: u32) -> Duration {
    base.saturating_mul(1u32 << retry.saturating_sub(1).min(16))
}

/// Downloads assets into a mirror layout
///
/// # Fetch Flow
///
/// 1. Skip disabled asset types and non-HTTP(S) URLs
/// 2. HEAD request → reject if the declared size breaks a cap
/// 3. GET with retry
/// 4. Re-check the actual size against both caps
/// 5. Pick a name (URL basename, else content hash + type extension)
/// 6. Write once into the asset folder
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 429, 500, 502, 503, 504 | Retry with backoff |
/// | Timeout / connection error | Retry with backoff |
/// | Other 4xx | No retry → Status error |
/// | Retries exhausted | Last response or error is returned |
pub struct AssetFetcher {
    client: Client,
    layout: OutputLayout,
    downloads: DownloadConfig,
    max_file_size: u64,
    max_total_size: u64,
    max_retries: u32,
    backoff: Duration,
}

impl AssetFetcher {
    pub fn new(config: &MirrorConfig, layout: OutputLayout) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config.http)?;

        Ok(Self {
            client,
            layout,
            downloads: config.downloads.clone(),
            max_file_size: config.limits.max_file_size,
            max_total_size: config.limits.max_total_size,
            max_retries: config.http.max_retries,
            backoff: Duration::from_millis(config.http.backoff_ms),
        })
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Whether downloads (and inline extraction) are enabled for `kind`
    pub fn is_enabled(&self, kind: AssetKind) -> bool {
        match kind {
            AssetKind::Css => self.downloads.css,
            AssetKind::Js => self.downloads.js,
            AssetKind::Image => self.downloads.images,
            AssetKind::Font => self.downloads.fonts,
        }
    }

    /// Fetches one asset and stores it under the mirror root
    ///
    /// # Returns
    ///
    /// * `Ok(LocalFile)` - The asset is available locally (new or reused)
    /// * `Err(FetchError)` - Nothing was written; the caller keeps the remote reference
    pub async fn fetch(
        &self,
        url: &Url,
        kind: AssetKind,
        counters: &mut TransferCounters,
    ) -> Result<LocalFile, FetchError> {
        if !self.is_enabled(kind) {
            return Err(FetchError::Disabled);
        }

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(FetchError::UnsupportedScheme(url.scheme().to_string()));
        }

        let head = self.send_with_retry(Method::HEAD, url).await?;
        if let Some(declared) = declared_length(&head) {
            self.check_constraints(declared, counters)?;
        }

        let response = self.send_with_retry(Method::GET, url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = response.bytes().await?;
        let size = body.len() as u64;
        self.check_constraints(size, counters)?;

        let file_name = match remote_file_name(url) {
            Some(name) => name,
            None => {
                let extension = asset_extension(&content_type)
                    .ok_or_else(|| FetchError::UnsupportedType(content_type.clone()))?;
                content_name(&body, extension)
            }
        };
        let file_name = sanitize_filename(&file_name);

        let local = self.layout.write_asset(kind, &file_name, &body).await?;
        if local.created {
            counters.files_written += 1;
            counters.bytes_written += size;
        }

        Ok(local)
    }

    /// Checks a file size against the per-file and cumulative caps
    ///
    /// The cumulative cap is best-effort: bytes of an oversized body have
    /// already been transferred when the actual length is checked.
    fn check_constraints(&self, size: u64, counters: &TransferCounters) -> Result<(), FetchError> {
        if size > self.max_file_size {
            return Err(FetchError::TooLarge {
                size,
                limit: self.max_file_size,
            });
        }

        if counters.bytes_written + size > self.max_total_size {
            return Err(FetchError::TotalLimitReached {
                total: counters.bytes_written,
                size,
                limit: self.max_total_size,
            });
        }

        Ok(())
    }

    async fn send_with_retry(&self, method: Method, url: &Url) -> Result<Response, reqwest::Error> {
        let max_retries = if is_idempotent(&method) {
            self.max_retries
        } else {
            0
        };
        let mut retries = 0;

        loop {
            match self.client.request(method.clone(), url.clone()).send().await {
                Ok(response) if is_retryable_status(response.status()) && retries < max_retries => {
                    tracing::debug!(
                        "{} {} returned {}, retrying ({}/{})",
                        method,
                        url,
                        response.status(),
                        retries + 1,
                        max_retries
                    );
                }
                Ok(response) => return Ok(response),
                Err(e) if is_retryable_error(&e) && retries < max_retries => {
                    tracing::debug!(
                        "{} {} failed: {}, retrying ({}/{})",
                        method,
                        url,
                        e,
                        retries + 1,
                        max_retries
                    );
                }
                Err(e) => return Err(e),
            }

            retries += 1;
            tokio::time::sleep(backoff_delay(self.backoff, retries)).await;
        }
    }
}

/// Reads the Content-Length header directly
///
/// `Response::content_length` reports the body size hint, which is zero for
/// HEAD responses.
fn declared_length(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}
