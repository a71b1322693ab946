//! Ships collected review batches to the ingest backend.
//!
//! Retries are reserved for transport failures (timeout, connection
//! error). A response that arrived and was judged by the server is never
//! resent: the batch may already have been processed, and replaying it
//! risks duplicate ingestion.

use crate::amazon::models::{IngestReceipt, ReviewBatch};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use wreq::Client;

/// Generous request timeout; batches with hundreds of reviews take a
/// while to process server-side.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(2);
const BACKOFF_CAP: Duration = Duration::from_secs(30);

/// How many characters of a rejection body to keep in the error.
const BODY_SNIPPET_LEN: usize = 300;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] wreq::Error),

    #[error("could not encode batch: {0}")]
    Encode(#[source] serde_json::Error),

    /// The server received the batch and rejected it. Not retriable.
    #[error("upload rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The request never completed: timeout, connection failure.
    #[error("transport failure during upload: {0}")]
    Transport(#[source] wreq::Error),

    #[error("upload failed after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: Box<UploadError>,
    },

    #[error("could not parse server response: {0}")]
    InvalidResponse(#[source] serde_json::Error),
}

/// Client for the review ingest endpoint.
pub struct UploadClient {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
    max_attempts: u32,
    backoff_base: Duration,
    backoff_cap: Duration,
}

impl UploadClient {
    /// Creates a client for the given backend base URL.
    pub fn new(base_url: impl Into<String>, auth_token: Option<String>) -> Result<Self, UploadError> {
        Self::with_timeout(base_url, auth_token, UPLOAD_TIMEOUT)
    }

    /// Creates a client with a custom request timeout (for testing).
    pub fn with_timeout(
        base_url: impl Into<String>,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(UploadError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            auth_token,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: DEFAULT_BACKOFF_BASE,
            backoff_cap: BACKOFF_CAP,
        })
    }

    /// Overrides the retry policy. Tests use a zero base so retries do
    /// not sleep.
    pub fn with_retry_policy(mut self, max_attempts: u32, base: Duration, cap: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.backoff_base = base;
        self.backoff_cap = cap;
        self
    }

    /// Posts the batch, retrying transport failures with doubling capped
    /// backoff. Server-side rejections surface immediately.
    pub async fn upload(&self, batch: &ReviewBatch) -> Result<IngestReceipt, UploadError> {
        let url = self.ingest_url();
        let body = serde_json::to_string(batch).map_err(UploadError::Encode)?;

        info!(
            "Uploading {} reviews for {} to {}",
            batch.count(),
            batch.asin,
            url
        );

        let mut attempt: u32 = 1;
        loop {
            match self.post_once(&url, &body).await {
                Ok(receipt) => {
                    info!("Upload accepted on attempt {}", attempt);
                    return Ok(receipt);
                }
                Err(err @ UploadError::Transport(_)) => {
                    if attempt >= self.max_attempts {
                        return Err(UploadError::Exhausted {
                            attempts: attempt,
                            source: Box::new(err),
                        });
                    }
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        "Upload attempt {}/{} failed: {}. Retrying in {:?}",
                        attempt, self.max_attempts, err, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn post_once(&self, url: &str, body: &str) -> Result<IngestReceipt, UploadError> {
        debug!("POST {} ({} bytes)", url, body.len());

        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json");

        if let Some(token) = &self.auth_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request
            .body(body.to_string())
            .send()
            .await
            .map_err(UploadError::Transport)?;

        let status = response.status();
        debug!("Ingest response status: {}", status);
        let text = response.text().await.map_err(UploadError::Transport)?;

        if !status.is_success() {
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                body: snippet(&text),
            });
        }

        if text.trim().is_empty() {
            return Ok(IngestReceipt::default());
        }
        serde_json::from_str(&text).map_err(UploadError::InvalidResponse)
    }

    fn ingest_url(&self) -> String {
        format!("{}/reviews/ingest", self.base_url.trim_end_matches('/'))
    }

    /// Doubling backoff: base * 2^(attempt-1), capped.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32 << (attempt.saturating_sub(1)).min(16);
        self.backoff_base.saturating_mul(factor).min(self.backoff_cap)
    }
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= BODY_SNIPPET_LEN {
        trimmed.to_string()
    } else {
        let mut end = BODY_SNIPPET_LEN;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &trimmed[..end])
    }
}
