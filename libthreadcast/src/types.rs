//! Core types for Threadcast

use serde::{Deserialize, Serialize};

/// A queued unit of content: one multi-part post awaiting publication.
///
/// `parts` is ordered and the order is meaningful: parts are published in
/// sequence as a reply chain. Once `posted` flips to true the record is
/// terminal and is never mutated or selected again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingPost {
    /// Store-assigned identifier, opaque to the pipeline.
    pub id: String,
    pub parts: Vec<String>,
    pub posted: bool,
    /// Creation time in epoch milliseconds, used to pick the most recent
    /// pending post when several are eligible.
    pub created_at: i64,
    /// Optional blob-store reference for an image attached to the first
    /// published part only.
    pub image_id: Option<String>,
}

/// Platform-assigned identifier for uploaded media.
///
/// Valid for attachment to one subsequent post in the same session;
/// consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaHandle(pub String);

impl MediaHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MediaHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-run publishing state: the reply target for the next part plus the
/// media handle still awaiting its first successful attachment.
///
/// Owned exclusively by the publisher for the duration of one post and
/// discarded afterwards.
#[derive(Debug, Default)]
pub struct ThreadState {
    last_published_id: Option<String>,
    media: Option<MediaHandle>,
}

impl ThreadState {
    pub fn new(media: Option<MediaHandle>) -> Self {
        Self {
            last_published_id: None,
            media,
        }
    }

    /// Id the next part should reply to; `None` for the first part.
    pub fn reply_target(&self) -> Option<&str> {
        self.last_published_id.as_deref()
    }

    /// Media still held for attachment, if any.
    pub fn pending_media(&self) -> Option<&MediaHandle> {
        self.media.as_ref()
    }

    /// Drop the held media handle after its first successful attachment.
    /// Subsequent calls are no-ops; the handle is never reissued.
    pub fn consume_media(&mut self) -> Option<MediaHandle> {
        self.media.take()
    }

    /// Record a published part id as the new reply target.
    pub fn advance(&mut self, published_id: String) {
        self.last_published_id = Some(published_id);
    }
}

/// Outcome of one pipeline run.
///
/// Every handled case comes back as a variant here; the error channel is
/// reserved for failures that abort the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// All parts published in order and the source record marked posted.
    Published {
        post_id: String,
        part_ids: Vec<String>,
    },
    /// The post was dropped without publishing anything and marked posted.
    Skipped { post_id: String, reason: SkipReason },
    /// The queue held no eligible post; the run is a graceful no-op.
    NoCandidate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A part's exact text already exists in the published history.
    DuplicateText { part_index: usize },
    /// The record holds no parts to publish.
    EmptyParts,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::DuplicateText { part_index } => {
                write!(f, "part {} already published", part_index)
            }
            SkipReason::EmptyParts => write!(f, "no parts to publish"),
        }
    }
}
