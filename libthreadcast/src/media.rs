//! Media resolution: blob fetch, local staging, platform upload
//!
//! Resolution never fails the job. Every failure path logs and returns
//! `None`, degrading the post to text-only. The staged file is deleted on
//! every exit path, including unwinding, because the tempfile guard owns
//! it for the whole upload.

use std::io::Write;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::blob::BlobStore;
use crate::platform::PostingPlatform;
use crate::types::MediaHandle;

pub struct MediaResolver<'a> {
    blobs: &'a dyn BlobStore,
}

impl<'a> MediaResolver<'a> {
    pub fn new(blobs: &'a dyn BlobStore) -> Self {
        Self { blobs }
    }

    /// Turn an optional image reference into a platform media handle.
    ///
    /// Absent reference: `None`, no side effects. Missing or unreadable
    /// blob, staging failure, upload failure: warn and `None`. Retrieval
    /// is attempted once; there is no retry at this layer.
    pub async fn resolve(
        &self,
        image_id: Option<&str>,
        platform: &dyn PostingPlatform,
    ) -> Option<MediaHandle> {
        let image_id = image_id?;

        match self.blobs.exists(image_id).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(image_id, "image not found in blob store; posting text-only");
                return None;
            }
            Err(e) => {
                warn!(image_id, error = %e, "image existence check failed; posting text-only");
                return None;
            }
        }

        let bytes = match self.blobs.fetch(image_id).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                warn!(image_id, "image vanished between check and read; posting text-only");
                return None;
            }
            Err(e) => {
                warn!(image_id, error = %e, "image retrieval failed; posting text-only");
                return None;
            }
        };

        let staged = match stage(image_id, &bytes) {
            Ok(file) => file,
            Err(e) => {
                warn!(image_id, error = %e, "failed to stage image; posting text-only");
                return None;
            }
        };

        match platform.upload_media(staged.path()).await {
            Ok(handle) => {
                debug!(image_id, media_id = %handle, "image uploaded");
                Some(handle)
            }
            Err(e) => {
                warn!(image_id, error = %e, "media upload failed; posting text-only");
                None
            }
        }
        // `staged` drops here; the file is gone whatever happened above.
    }
}

/// Write blob bytes to a temporary file whose name carries the image id.
fn stage(image_id: &str, bytes: &[u8]) -> std::io::Result<NamedTempFile> {
    let safe_id: String = image_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();

    let mut file = tempfile::Builder::new()
        .prefix(&format!("threadcast-{}-", safe_id))
        .suffix(".img")
        .tempfile()?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::MemoryBlobStore;
    use crate::platform::MockPlatform;

    async fn authenticated_mock() -> MockPlatform {
        let mut platform = MockPlatform::success("mock");
        platform.authenticate().await.unwrap();
        platform
    }

    #[tokio::test]
    async fn test_absent_reference_is_a_no_op() {
        let blobs = MemoryBlobStore::new();
        let platform = authenticated_mock().await;

        let handle = MediaResolver::new(&blobs).resolve(None, &platform).await;

        assert!(handle.is_none());
        assert!(platform.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_missing_blob_degrades_to_text_only() {
        let blobs = MemoryBlobStore::new();
        let platform = authenticated_mock().await;

        let handle = MediaResolver::new(&blobs)
            .resolve(Some("ghost"), &platform)
            .await;

        assert!(handle.is_none());
        assert!(platform.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_blob_degrades_to_text_only() {
        let blobs = MemoryBlobStore::new();
        blobs.insert("img-1", vec![1, 2, 3]);
        blobs.set_corrupt(true);
        let platform = authenticated_mock().await;

        let handle = MediaResolver::new(&blobs)
            .resolve(Some("img-1"), &platform)
            .await;

        assert!(handle.is_none());
        assert!(platform.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_successful_resolution_stages_then_cleans_up() {
        let blobs = MemoryBlobStore::new();
        blobs.insert("img-1", vec![0xFF, 0xD8, 0xFF, 0xE0]);
        let platform = authenticated_mock().await;

        let handle = MediaResolver::new(&blobs)
            .resolve(Some("img-1"), &platform)
            .await;

        assert_eq!(handle, Some(MediaHandle("media-1".to_string())));

        let uploads = platform.uploads();
        assert_eq!(uploads.len(), 1);
        assert!(uploads[0].file_existed, "file must exist during upload");
        assert!(
            !uploads[0].path.exists(),
            "staged file must be removed after resolve returns"
        );
    }

    #[tokio::test]
    async fn test_upload_failure_degrades_and_cleans_up() {
        let blobs = MemoryBlobStore::new();
        blobs.insert("img-1", vec![1, 2, 3]);
        let platform = authenticated_mock().await;
        platform.fail_uploads("service over capacity");

        let handle = MediaResolver::new(&blobs)
            .resolve(Some("img-1"), &platform)
            .await;

        assert!(handle.is_none());

        let uploads = platform.uploads();
        assert_eq!(uploads.len(), 1);
        assert!(uploads[0].file_existed);
        assert!(!uploads[0].path.exists());
    }

    #[test]
    fn test_stage_sanitizes_image_id() {
        let file = stage("../evil/id", b"data").unwrap();
        let name = file.path().file_name().unwrap().to_string_lossy().into_owned();
        // Every non-alphanumeric character becomes a dash
        assert!(name.starts_with("threadcast----evil-id-"));
        assert!(!name.contains('/'));
    }
}
