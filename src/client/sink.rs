//! Local file sink for the client.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::quoting::Quote;

/// The quote file could not be written.
#[derive(Debug, Error)]
#[error("failed to write {path}: {source}")]
pub struct SinkWriteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Line written to the sink for `quote`.
pub fn render_line(label: &str, quote: &Quote) -> String {
    format!("{}: {}\n", label, quote.bid())
}

/// Overwrite `path` with a single labelled quote line.
pub async fn write_quote(path: &Path, label: &str, quote: &Quote) -> Result<(), SinkWriteError> {
    tokio::fs::write(path, render_line(label, quote))
        .await
        .map_err(|source| SinkWriteError {
            path: path.to_path_buf(),
            source,
        })
}
