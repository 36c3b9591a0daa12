use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to construct HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    // Covers errors during download stream processing
    #[error("Data download failed")]
    DownloadIo(#[from] std::io::Error),

    #[error("Failed to write downloaded file '{0}'")]
    PersistIo(PathBuf, #[source] std::io::Error),

    #[error("Downloaded payload is not a valid zip archive")]
    CorruptArchive(#[source] zip::result::ZipError),

    #[error("Failed to extract archive into '{0}'")]
    ExtractIo(PathBuf, #[source] zip::result::ZipError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
