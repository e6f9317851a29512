//! End-to-end job orchestration
//!
//! One run: fetch the next eligible post, guard against duplicates,
//! resolve optional media, publish the thread, mark the record handled.
//! Every handled case returns a [`RunOutcome`]; the error channel is
//! reserved for failures that abort the run. There is no job-level retry
//! beyond the publisher's own per-part attempts.

use tracing::{info, warn};

use crate::blob::BlobStore;
use crate::config::{PartialFailurePolicy, PublishConfig};
use crate::dedup::DedupGuard;
use crate::error::{PlatformError, Result, ThreadcastError};
use crate::media::MediaResolver;
use crate::publisher::Publisher;
use crate::session::Session;
use crate::store::ContentStore;
use crate::types::{RunOutcome, SkipReason};

pub async fn run_once(
    store: &dyn ContentStore,
    blobs: &dyn BlobStore,
    session: &Session,
    config: &PublishConfig,
) -> Result<RunOutcome> {
    let Some(post) = store.fetch_next_pending().await? else {
        info!("no pending post; nothing to do");
        return Ok(RunOutcome::NoCandidate);
    };

    info!(post_id = %post.id, parts = post.parts.len(), "picked up pending post");

    if post.parts.is_empty() {
        warn!(post_id = %post.id, "pending post has no parts; marking handled");
        store.mark_posted(&post.id).await?;
        return Ok(RunOutcome::Skipped {
            post_id: post.id,
            reason: SkipReason::EmptyParts,
        });
    }

    if let Some(part_index) = DedupGuard::new(store).find_duplicate(&post).await? {
        store.mark_posted(&post.id).await?;
        return Ok(RunOutcome::Skipped {
            post_id: post.id,
            reason: SkipReason::DuplicateText { part_index },
        });
    }

    let platform = session.platform();
    let media = MediaResolver::new(blobs)
        .resolve(post.image_id.as_deref(), platform)
        .await;

    match Publisher::new(platform, config)
        .publish_thread(&post.parts, media)
        .await
    {
        Ok(part_ids) => {
            store.mark_posted(&post.id).await?;
            info!(post_id = %post.id, parts = part_ids.len(), "post published and marked");
            Ok(RunOutcome::Published {
                post_id: post.id,
                part_ids,
            })
        }
        Err(e) => {
            handle_publish_failure(store, &post.id, &e, config).await?;
            Err(e)
        }
    }
}

/// Apply the configured partial-failure policy.
///
/// The policy only matters when some parts are already live: a post whose
/// first part never went out is always left eligible, since retrying it
/// from scratch duplicates nothing.
async fn handle_publish_failure(
    store: &dyn ContentStore,
    post_id: &str,
    error: &ThreadcastError,
    config: &PublishConfig,
) -> Result<()> {
    let published_parts = match error {
        ThreadcastError::Platform(PlatformError::Exhausted { part_index, .. }) => *part_index,
        _ => 0,
    };

    if published_parts > 0 && config.on_partial_failure == PartialFailurePolicy::MarkPosted {
        warn!(
            post_id,
            published_parts, "publishing aborted; marking post handled to avoid duplicates"
        );
        store.mark_posted(post_id).await?;
    } else {
        warn!(
            post_id,
            published_parts, "publishing aborted; post left eligible for a later run"
        );
    }
    Ok(())
}
