//! Duplicate-content guard over the published-parts history
//!
//! A post is either wholly new or entirely skipped, never partially
//! re-posted: one matching part drops the whole post. That keeps a
//! half-published thread from growing a second head with a mismatched
//! reply chain on a later run.

use tracing::info;

use crate::error::Result;
use crate::store::ContentStore;
use crate::types::PendingPost;

pub struct DedupGuard<'a> {
    store: &'a dyn ContentStore,
}

impl<'a> DedupGuard<'a> {
    pub fn new(store: &'a dyn ContentStore) -> Self {
        Self { store }
    }

    /// Index of the first part whose exact text already exists in the
    /// published history, or `None` when the whole post is new.
    pub async fn find_duplicate(&self, post: &PendingPost) -> Result<Option<usize>> {
        for (index, part) in post.parts.iter().enumerate() {
            if self.store.exists_published_text(part).await? {
                info!(
                    post_id = %post.id,
                    part = index,
                    "part text already published; skipping whole post"
                );
                return Ok(Some(index));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryContentStore;

    fn post(parts: &[&str]) -> PendingPost {
        PendingPost {
            id: "p1".to_string(),
            parts: parts.iter().map(|p| p.to_string()).collect(),
            posted: false,
            created_at: 1_700_000_000_000,
            image_id: None,
        }
    }

    #[tokio::test]
    async fn test_new_post_passes() {
        let store = MemoryContentStore::new();
        store.push_published("something else entirely");

        let guard = DedupGuard::new(&store);
        let found = guard.find_duplicate(&post(&["A", "B"])).await.unwrap();
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn test_any_matching_part_flags_the_post() {
        let store = MemoryContentStore::new();
        store.push_published("B");

        let guard = DedupGuard::new(&store);
        let found = guard.find_duplicate(&post(&["A", "B", "C"])).await.unwrap();
        assert_eq!(found, Some(1));
    }

    #[tokio::test]
    async fn test_match_must_be_exact() {
        let store = MemoryContentStore::new();
        store.push_published("part one of the thread");

        let guard = DedupGuard::new(&store);
        let found = guard
            .find_duplicate(&post(&["Part one of the thread"]))
            .await
            .unwrap();
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = MemoryContentStore::new();
        store.set_unavailable(true);

        let guard = DedupGuard::new(&store);
        assert!(guard.find_duplicate(&post(&["A"])).await.is_err());
    }
}
