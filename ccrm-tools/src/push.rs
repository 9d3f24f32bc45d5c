//! Upload of staged call centers to a running ccrm-api
//!
//! Records are sent in chunks to `POST /api/external-crm/import`. Each chunk
//! is imported atomically by the server; a failing chunk stops the upload
//! and earlier chunks stay imported.

use crate::staging::ImportBody;
use ccrm_common::models::NewCallCenter;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

const IMPORT_PATH: &str = "/api/external-crm/import";
const USER_AGENT: &str = concat!("ccrm-tools/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_CHUNK_SIZE: usize = 100;

#[derive(Debug, Error)]
pub enum PushError {
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success status with the server's error message
    #[error("Chunk {chunk} rejected ({status}): {message}")]
    Rejected {
        chunk: usize,
        status: u16,
        message: String,
    },

    #[error("Unexpected response: {0}")]
    Parse(String),

    #[error("Chunk size must be at least 1")]
    InvalidChunkSize,
}

#[derive(Debug, Deserialize)]
struct ImportResponse {
    imported: usize,
    #[serde(default)]
    skipped: usize,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Totals over all chunks
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PushSummary {
    pub chunks: usize,
    pub imported: usize,
    pub skipped: usize,
}

/// Split records into import bodies of at most `chunk_size` records
pub fn chunk_bodies(
    records: &[NewCallCenter],
    chunk_size: usize,
    skip_duplicates: bool,
) -> Result<Vec<ImportBody>, PushError> {
    if chunk_size == 0 {
        return Err(PushError::InvalidChunkSize);
    }
    Ok(records
        .chunks(chunk_size)
        .map(|chunk| ImportBody {
            call_centers: chunk.to_vec(),
            skip_duplicates,
        })
        .collect())
}

/// HTTP client for the import endpoint
pub struct ImportClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ImportClient {
    pub fn new(base_url: &str) -> Result<Self, PushError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| PushError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn import_url(&self) -> String {
        format!("{}{}", self.base_url, IMPORT_PATH)
    }

    /// Send every chunk in order
    pub async fn push(&self, bodies: &[ImportBody]) -> Result<PushSummary, PushError> {
        let mut summary = PushSummary::default();
        let url = self.import_url();

        for (index, body) in bodies.iter().enumerate() {
            let chunk = index + 1;
            debug!(chunk, records = body.call_centers.len(), url = %url, "Posting chunk");

            let response = self
                .http_client
                .post(&url)
                .json(body)
                .send()
                .await
                .map_err(|e| PushError::Network(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ErrorResponse>(&text)
                    .map(|e| e.error)
                    .unwrap_or(text);
                return Err(PushError::Rejected {
                    chunk,
                    status: status.as_u16(),
                    message,
                });
            }

            let result: ImportResponse = response
                .json()
                .await
                .map_err(|e| PushError::Parse(e.to_string()))?;

            info!(
                chunk,
                of = bodies.len(),
                imported = result.imported,
                skipped = result.skipped,
                "Chunk imported"
            );
            summary.chunks += 1;
            summary.imported += result.imported;
            summary.skipped += result.skipped;
        }

        Ok(summary)
    }
}
