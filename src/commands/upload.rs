//! Upload command implementation.
//!
//! Ships a previously saved batch file to the ingest backend.

use crate::amazon::ReviewBatch;
use crate::config::Config;
use crate::upload::UploadClient;
use anyhow::{anyhow, bail, Context, Result};
use std::path::Path;
use tracing::info;

/// Uploads a saved review batch.
pub struct UploadCommand {
    config: Config,
}

impl UploadCommand {
    /// Creates a new upload command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Reads the batch file and posts it to the configured endpoint.
    pub async fn execute(&self, path: &Path) -> Result<String> {
        let endpoint = self.config.endpoint.as_deref().ok_or_else(|| {
            anyhow!("No ingest endpoint configured. Set `endpoint` in config or AMZ_ENDPOINT.")
        })?;

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch file: {}", path.display()))?;
        let batch: ReviewBatch = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse batch file: {}", path.display()))?;

        if batch.reviews.is_empty() {
            bail!("Batch file {} contains no reviews", path.display());
        }

        info!("Uploading batch of {} reviews for {}", batch.count(), batch.asin);

        let client = UploadClient::new(endpoint, self.config.token.clone())
            .context("Failed to create upload client")?;
        let receipt = client.upload(&batch).await.context("Upload failed")?;

        let mut lines = vec![format!(
            "Uploaded {} reviews for {}",
            batch.count(),
            batch.asin
        )];
        if let Some(message) = receipt.message {
            lines.push(format!("Server: {}", message));
        }
        if let Some(id) = receipt.report_id {
            lines.push(format!("Report: {}", id));
        }
        Ok(lines.join("\n"))
    }
}
