//! In-memory content store for tests
//!
//! Available in all builds (not just tests) so integration tests can drive
//! the full pipeline without a live server, the same way the mock posting
//! platform is.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::{Result, StoreError};
use crate::types::PendingPost;

use super::ContentStore;

#[derive(Default)]
struct Inner {
    pending: Vec<PendingPost>,
    published: Vec<String>,
    mark_calls: Vec<String>,
    unavailable: bool,
}

/// Content store double backed by plain vectors.
#[derive(Default)]
pub struct MemoryContentStore {
    inner: Mutex<Inner>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_pending(&self, post: PendingPost) {
        self.inner.lock().unwrap().pending.push(post);
    }

    /// Seed the published history with a known text.
    pub fn push_published(&self, text: &str) {
        self.inner.lock().unwrap().published.push(text.to_string());
    }

    /// Make every operation fail as if the store were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().unwrap().unavailable = unavailable;
    }

    /// Ids passed to `mark_posted`, in call order.
    pub fn mark_calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().mark_calls.clone()
    }

    /// Current `posted` flag of a record, `None` if the id is unknown.
    pub fn posted(&self, post_id: &str) -> Option<bool> {
        self.inner
            .lock()
            .unwrap()
            .pending
            .iter()
            .find(|p| p.id == post_id)
            .map(|p| p.posted)
    }

    fn check_available(inner: &Inner) -> Result<()> {
        if inner.unavailable {
            return Err(StoreError::Unavailable("memory store set unavailable".to_string()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn fetch_next_pending(&self) -> Result<Option<PendingPost>> {
        let inner = self.inner.lock().unwrap();
        Self::check_available(&inner)?;

        let next = inner
            .pending
            .iter()
            .filter(|p| !p.posted)
            .max_by_key(|p| p.created_at)
            .cloned();
        Ok(next)
    }

    async fn exists_published_text(&self, text: &str) -> Result<bool> {
        let inner = self.inner.lock().unwrap();
        Self::check_available(&inner)?;

        Ok(inner.published.iter().any(|t| t == text))
    }

    async fn mark_posted(&self, post_id: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_available(&inner)?;

        inner.mark_calls.push(post_id.to_string());
        match inner.pending.iter_mut().find(|p| p.id == post_id) {
            Some(post) => {
                post.posted = true;
                Ok(())
            }
            None => Err(StoreError::MissingRecord(post_id.to_string()).into()),
        }
    }
}
