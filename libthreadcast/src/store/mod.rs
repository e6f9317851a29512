//! Content store access: the pending queue and the published-parts history
//!
//! The pipeline owns no storage of its own; every read or write of pending
//! posts and published history goes through the [`ContentStore`] trait. The
//! production implementation is [`MongoContentStore`];
//! [`MemoryContentStore`] backs the tests.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::PendingPost;

pub mod memory;
pub mod mongo;

pub use memory::MemoryContentStore;
pub use mongo::MongoContentStore;

/// Typed accessor over the store's two collections.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Select the single most recently created post with `posted == false`,
    /// or `None` when the queue holds no eligible record.
    ///
    /// Connectivity failures propagate to the caller; they are not retried
    /// at this layer.
    async fn fetch_next_pending(&self) -> Result<Option<PendingPost>>;

    /// Exact-match lookup of `text` against the published-parts history.
    async fn exists_published_text(&self, text: &str) -> Result<bool>;

    /// Set `posted = true` on the record. Idempotent; the flag is never
    /// unset, and a marked record is never selected again.
    async fn mark_posted(&self, post_id: &str) -> Result<()>;
}
