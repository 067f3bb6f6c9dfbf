//! Artifact storage
//!
//! Persists captured images. The filesystem store writes the image plus a
//! JSON sidecar holding its metadata.

use crate::error::{Error, Result};
use crate::executor::ImageFormat;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Metadata stored alongside an artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactMetadata {
    /// Page the image was taken from
    pub url: String,
    /// Image encoding
    pub format: ImageFormat,
    /// Whether the whole scrollable page was captured
    pub full_page: bool,
    /// Device preset in effect, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Capture time
    pub captured_at: DateTime<Utc>,
}

impl ArtifactMetadata {
    /// Metadata for a capture taken now
    #[must_use]
    pub fn new(url: impl Into<String>, format: ImageFormat) -> Self {
        Self {
            url: url.into(),
            format,
            full_page: false,
            device: None,
            captured_at: Utc::now(),
        }
    }

    /// Mark as a full-page capture
    #[must_use]
    pub fn with_full_page(mut self, full_page: bool) -> Self {
        self.full_page = full_page;
        self
    }

    /// Record the device preset
    #[must_use]
    pub fn with_device(mut self, device: Option<String>) -> Self {
        self.device = device;
        self
    }
}

/// Destination for captured images
#[async_trait::async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist an image and return where it was stored
    async fn save(&self, bytes: &[u8], metadata: &ArtifactMetadata) -> Result<String>;
}

/// Store that writes files into a directory
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Create a store rooted at `root` (created on first save)
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory artifacts are written to
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_stem(metadata: &ArtifactMetadata) -> String {
        format!(
            "{}-{}",
            metadata.captured_at.format("%Y%m%dT%H%M%S"),
            Uuid::new_v4().simple()
        )
    }
}

#[async_trait::async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn save(&self, bytes: &[u8], metadata: &ArtifactMetadata) -> Result<String> {
        if bytes.is_empty() {
            return Err(Error::Storage("refusing to store an empty image".to_string()));
        }

        tokio::fs::create_dir_all(&self.root).await?;

        let stem = Self::file_stem(metadata);
        let image_path = self
            .root
            .join(format!("{stem}.{}", metadata.format.extension()));
        let sidecar_path = self.root.join(format!("{stem}.json"));

        tokio::fs::write(&image_path, bytes).await?;
        tokio::fs::write(&sidecar_path, serde_json::to_vec_pretty(metadata)?).await?;

        debug!(path = %image_path.display(), bytes = bytes.len(), "Stored artifact");
        Ok(image_path.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fs_store_writes_image_and_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path().join("captures"));
        let metadata = ArtifactMetadata::new("https://example.com", ImageFormat::Png)
            .with_full_page(true)
            .with_device(Some("iPhone 14".to_string()));

        let location = store.save(b"\x89PNG fake", &metadata).await.unwrap();
        assert!(location.ends_with(".png"));
        assert_eq!(tokio::fs::read(&location).await.unwrap(), b"\x89PNG fake");

        let sidecar = location.trim_end_matches(".png").to_string() + ".json";
        let stored: ArtifactMetadata =
            serde_json::from_slice(&tokio::fs::read(sidecar).await.unwrap()).unwrap();
        assert_eq!(stored, metadata);
    }

    #[tokio::test]
    async fn test_fs_store_rejects_empty_image() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        let metadata = ArtifactMetadata::new("https://example.com", ImageFormat::Jpeg);
        let err = store.save(&[], &metadata).await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
