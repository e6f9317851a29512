//! Mock posting platform for tests
//!
//! A configurable double that records every call and can script per-attempt
//! failures. It is available in all builds (not just tests) so integration
//! tests can drive the publishing pipeline without credentials or network
//! access.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{PlatformError, Result};
use crate::types::MediaHandle;

use super::{CreatePost, CreatedPost, PostingPlatform};

/// Scripted outcome for one create-post attempt. Attempts beyond the end
/// of the script succeed.
#[derive(Debug, Clone)]
pub enum ScriptedAttempt {
    Succeed,
    /// The call errors out (connection reset, timeout, 5xx).
    FailNetwork(String),
    /// The call "succeeds" but the response carries no usable post id.
    MissingId,
}

/// One recorded create-post call, successful or not.
#[derive(Debug, Clone)]
pub struct RecordedPost {
    pub text: String,
    pub in_reply_to: Option<String>,
    pub media: Option<String>,
    /// Instant of the call, for asserting retry and pacing delays under a
    /// paused test clock.
    pub at: tokio::time::Instant,
    /// Id returned to the caller; `None` for failed attempts.
    pub id: Option<String>,
}

/// One recorded media upload.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub path: PathBuf,
    /// Whether the staged file existed at upload time.
    pub file_existed: bool,
}

#[derive(Default)]
struct Inner {
    authenticated: bool,
    auth_calls: usize,
    auth_error: Option<String>,
    script: VecDeque<ScriptedAttempt>,
    posts: Vec<RecordedPost>,
    uploads: Vec<RecordedUpload>,
    upload_error: Option<String>,
    next_post_id: usize,
    next_media_id: usize,
}

/// Mock platform. Clones share state, so a test can hand one clone to the
/// session and keep another for assertions.
#[derive(Clone)]
pub struct MockPlatform {
    name: String,
    inner: Arc<Mutex<Inner>>,
}

impl MockPlatform {
    /// A platform where everything succeeds.
    pub fn success(name: &str) -> Self {
        Self {
            name: name.to_string(),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// A platform whose credential exchange fails.
    pub fn auth_failure(name: &str, error: &str) -> Self {
        let platform = Self::success(name);
        platform.inner.lock().unwrap().auth_error = Some(error.to_string());
        platform
    }

    /// Queue a scripted outcome for the next unscripted attempt.
    pub fn push_attempt(&self, attempt: ScriptedAttempt) {
        self.inner.lock().unwrap().script.push_back(attempt);
    }

    /// Queue `count` failing attempts, after which attempts succeed again.
    pub fn fail_next(&self, count: usize, message: &str) {
        let mut inner = self.inner.lock().unwrap();
        for _ in 0..count {
            inner
                .script
                .push_back(ScriptedAttempt::FailNetwork(message.to_string()));
        }
    }

    /// Make every media upload fail.
    pub fn fail_uploads(&self, message: &str) {
        self.inner.lock().unwrap().upload_error = Some(message.to_string());
    }

    pub fn posts(&self) -> Vec<RecordedPost> {
        self.inner.lock().unwrap().posts.clone()
    }

    /// Ids of the successfully published posts, in publish order.
    pub fn published_ids(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .posts
            .iter()
            .filter_map(|p| p.id.clone())
            .collect()
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.inner.lock().unwrap().uploads.clone()
    }

    pub fn auth_calls(&self) -> usize {
        self.inner.lock().unwrap().auth_calls
    }
}

#[async_trait]
impl PostingPlatform for MockPlatform {
    async fn authenticate(&mut self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.auth_calls += 1;
        if let Some(error) = &inner.auth_error {
            return Err(PlatformError::Authentication(error.clone()).into());
        }
        inner.authenticated = true;
        Ok(())
    }

    async fn create_post(&self, request: CreatePost<'_>) -> Result<CreatedPost> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.authenticated {
            return Err(
                PlatformError::Authentication("session not established".to_string()).into(),
            );
        }

        let attempt = inner.script.pop_front().unwrap_or(ScriptedAttempt::Succeed);
        let id = match &attempt {
            ScriptedAttempt::Succeed => {
                inner.next_post_id += 1;
                Some(format!("post-{}", inner.next_post_id))
            }
            _ => None,
        };

        inner.posts.push(RecordedPost {
            text: request.text.to_string(),
            in_reply_to: request.in_reply_to.map(str::to_string),
            media: request.media.map(|m| m.as_str().to_string()),
            at: tokio::time::Instant::now(),
            id: id.clone(),
        });

        match attempt {
            ScriptedAttempt::Succeed => Ok(CreatedPost {
                id: id.unwrap_or_default(),
            }),
            ScriptedAttempt::FailNetwork(message) => Err(PlatformError::Network(message).into()),
            ScriptedAttempt::MissingId => Err(PlatformError::MissingPostId.into()),
        }
    }

    async fn upload_media(&self, path: &Path) -> Result<MediaHandle> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.authenticated {
            return Err(
                PlatformError::Authentication("session not established".to_string()).into(),
            );
        }

        inner.uploads.push(RecordedUpload {
            path: path.to_path_buf(),
            file_existed: path.exists(),
        });

        if let Some(error) = &inner.upload_error {
            return Err(PlatformError::MediaUpload(error.clone()).into());
        }

        inner.next_media_id += 1;
        Ok(MediaHandle(format!("media-{}", inner.next_media_id)))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
