//! Posting platform abstraction and implementations
//!
//! The pipeline talks to the platform through [`PostingPlatform`]. The
//! production implementation is the [`x::XApiClient`]; tests use
//! [`mock::MockPlatform`].

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;
use crate::types::MediaHandle;

pub mod x;

// Mock platform is available for all builds (not just tests) to support
// integration tests
pub mod mock;

pub use mock::MockPlatform;
pub use x::XApiClient;

/// A single create-post request.
#[derive(Debug, Clone, Copy)]
pub struct CreatePost<'a> {
    pub text: &'a str,
    /// Id of the post this one replies to; `None` starts a new thread.
    pub in_reply_to: Option<&'a str>,
    /// Media to attach; only ever set while the handle is unconsumed, which
    /// in practice means the first part of a thread.
    pub media: Option<&'a MediaHandle>,
}

/// A successfully created post.
///
/// The id is a required field: a wire response without one fails the
/// attempt instead of passing as a success with a hole in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPost {
    pub id: String,
}

/// Unified interface to the posting platform.
#[async_trait]
pub trait PostingPlatform: Send + Sync {
    /// Perform the credential exchange for this session.
    ///
    /// Must be called before posting or uploading. Failure maps to
    /// `PlatformError::Authentication`.
    async fn authenticate(&mut self) -> Result<()>;

    /// Publish one post. Every call is a live external write with no
    /// dry-run mode; a retry after an ambiguous failure can double-post.
    async fn create_post(&self, request: CreatePost<'_>) -> Result<CreatedPost>;

    /// Upload a staged media file through the platform's legacy upload
    /// endpoint, returning a handle attachable to one subsequent post.
    async fn upload_media(&self, path: &Path) -> Result<MediaHandle>;

    /// Lowercase platform identifier for logs.
    fn name(&self) -> &str;
}
