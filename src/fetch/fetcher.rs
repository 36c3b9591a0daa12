use crate::fetch::error::FetchError;
use futures_util::TryStreamExt;
use log::{info, warn};
use reqwest::{Client, StatusCode};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tokio_util::io::StreamReader;

/// Outcome of fetching a remote resource.
///
/// A 404 is a regular outcome in this domain: yearly archives for future or
/// unpublished periods legitimately do not exist yet, so callers log and
/// continue instead of failing the batch loop.
#[derive(Debug)]
pub enum FetchOutcome {
    /// HTTP 200; the body was persisted and is also returned for downstream parsing.
    Fetched(Vec<u8>),
    /// HTTP 404.
    NotFound,
}

pub struct RemoteFetcher {
    client: Client,
}

impl RemoteFetcher {
    /// Builds a fetcher whose requests follow redirects and time out after
    /// `timeout`, so an unresponsive host cannot block a batch run indefinitely.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::ClientBuild)?;
        Ok(Self { client })
    }

    /// Downloads `url` and persists the full body to `destination`, overwriting
    /// any previous file there.
    pub async fn fetch(&self, url: &str, destination: &Path) -> Result<FetchOutcome, FetchError> {
        info!("Downloading {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.to_string(), e))?;

        if response.status() == StatusCode::NOT_FOUND {
            warn!("Resource not found at {}", url);
            return Ok(FetchOutcome::NotFound);
        }

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    FetchError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    }
                } else {
                    FetchError::NetworkRequest(url.to_string(), e)
                });
            }
        };

        let stream = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        let mut reader = StreamReader::new(stream);
        let mut body = Vec::new();
        reader.read_to_end(&mut body).await?;

        fs::write(destination, &body)
            .await
            .map_err(|e| FetchError::PersistIo(destination.to_path_buf(), e))?;
        info!(
            "Downloaded {} bytes from {} to {}",
            body.len(),
            url,
            destination.display()
        );
        Ok(FetchOutcome::Fetched(body))
    }
}
