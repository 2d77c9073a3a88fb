use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Result, ThumbnailCacheError};

/// Capability to source thumbnail bytes from the remote drive provider.
///
/// Link resolution and byte retrieval are separate because the provider's
/// file listing often already carries a thumbnail URL hint; in that case
/// the coordinator skips resolution entirely.
#[async_trait]
pub trait DriveThumbnailSource: Send + Sync {
    /// Resolve a short-lived thumbnail URL for a drive file.
    async fn resolve_thumbnail_link(
        &self,
        drive_file_id: &str,
    ) -> Result<String>;

    /// Download thumbnail bytes from a resolved URL.
    async fn fetch_thumbnail(&self, url: &str) -> Result<Vec<u8>>;
}

/// Drive file metadata as returned by the provider's files endpoint.
/// Only the thumbnail link is of interest here.
#[derive(Debug, Deserialize)]
struct DriveFileMetadata {
    #[serde(rename = "thumbnailLink")]
    thumbnail_link: Option<String>,
}

/// `reqwest`-backed drive source hitting the provider's files endpoint.
#[derive(Clone, Debug)]
pub struct HttpDriveThumbnailSource {
    client: reqwest::Client,
    files_endpoint: String,
}

impl HttpDriveThumbnailSource {
    /// `files_endpoint` is the provider URL serving per-file metadata,
    /// e.g. `https://www.googleapis.com/drive/v3/files`.
    pub fn new(files_endpoint: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| {
                ThumbnailCacheError::Fetch(format!(
                    "failed to build HTTP client: {err}"
                ))
            })?;
        Ok(Self {
            client,
            files_endpoint: files_endpoint
                .trim_end_matches('/')
                .to_owned(),
        })
    }
}

#[async_trait]
impl DriveThumbnailSource for HttpDriveThumbnailSource {
    async fn resolve_thumbnail_link(
        &self,
        drive_file_id: &str,
    ) -> Result<String> {
        let url = format!(
            "{}/{}?fields=thumbnailLink",
            self.files_endpoint, drive_file_id
        );
        let response =
            self.client.get(&url).send().await.map_err(|err| {
                ThumbnailCacheError::Fetch(format!(
                    "failed to query drive file {drive_file_id}: {err}"
                ))
            })?;
        if !response.status().is_success() {
            return Err(ThumbnailCacheError::Fetch(format!(
                "drive metadata request failed: HTTP {} for file {drive_file_id}",
                response.status()
            )));
        }
        let metadata: DriveFileMetadata =
            response.json().await.map_err(|err| {
                ThumbnailCacheError::Fetch(format!(
                    "invalid drive metadata for file {drive_file_id}: {err}"
                ))
            })?;
        metadata.thumbnail_link.ok_or_else(|| {
            ThumbnailCacheError::Fetch(format!(
                "drive file {drive_file_id} has no thumbnail link"
            ))
        })
    }

    async fn fetch_thumbnail(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            // Avoid compressed, range-susceptible responses for binary assets
            .header(reqwest::header::ACCEPT_ENCODING, "identity")
            .send()
            .await
            .map_err(|err| {
                ThumbnailCacheError::Fetch(format!(
                    "failed to download thumbnail: {err}"
                ))
            })?;

        if !response.status().is_success() {
            return Err(ThumbnailCacheError::Fetch(format!(
                "thumbnail download failed: HTTP {}",
                response.status()
            )));
        }

        let expected_len = response.content_length();
        let bytes = response.bytes().await.map_err(|err| {
            ThumbnailCacheError::Fetch(format!(
                "failed to read thumbnail bytes: {err}"
            ))
        })?;

        if let Some(content_len) = expected_len
            && bytes.len() as u64 != content_len
        {
            return Err(ThumbnailCacheError::Fetch(format!(
                "thumbnail size mismatch: got {} bytes, expected {content_len}",
                bytes.len()
            )));
        }

        Ok(bytes.to_vec())
    }
}
