//! Reading source documents and writing results.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::types::RunReport;

/// Errors raised by the file collaborators.
#[derive(Debug, Error)]
pub enum IoError {
    /// The source document is missing or unreadable.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// Location that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The destination could not be written.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        /// Location that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The run report could not be encoded.
    #[error("failed to encode run report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Read a UTF-8 document and strip surrounding whitespace.
pub async fn load_document(path: &Path) -> Result<String, IoError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| IoError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "Loaded document");
    Ok(text.trim().to_string())
}

/// Write `summary` as plain text, creating parent directories as needed.
pub async fn save_summary(path: &Path, summary: &str) -> Result<(), IoError> {
    write_file(path, summary.as_bytes()).await?;
    tracing::info!(path = %path.display(), "Saved summary");
    Ok(())
}

/// Write `report` as pretty-printed JSON.
pub async fn save_report(path: &Path, report: &RunReport) -> Result<(), IoError> {
    let encoded = serde_json::to_vec_pretty(report)?;
    write_file(path, &encoded).await?;
    tracing::debug!(path = %path.display(), "Saved run report");
    Ok(())
}

async fn write_file(path: &Path, contents: &[u8]) -> Result<(), IoError> {
    let to_error = |source| IoError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(to_error)?;
    }
    tokio::fs::write(path, contents).await.map_err(to_error)
}
