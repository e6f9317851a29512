//! The per-part publishing loop
//!
//! Drives one pending post through the platform: each part is posted as a
//! reply to the previous one, with bounded retries per part, a fixed wait
//! between attempts, and a jittered human-like pause after each success.

use std::time::Duration;
use rand::Rng;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::PublishConfig;
use crate::error::{PlatformError, Result};
use crate::platform::{CreatePost, PostingPlatform};
use crate::types::{MediaHandle, ThreadState};

pub struct Publisher<'a> {
    platform: &'a dyn PostingPlatform,
    config: &'a PublishConfig,
}

impl<'a> Publisher<'a> {
    pub fn new(platform: &'a dyn PostingPlatform, config: &'a PublishConfig) -> Self {
        Self { platform, config }
    }

    /// Publish `parts` in order as one reply chain.
    ///
    /// Returns the platform ids of the published parts. The media handle,
    /// when given, rides on the first successful part only. A part that
    /// fails every attempt aborts the whole post with
    /// [`PlatformError::Exhausted`]; parts already published stay live and
    /// are not rolled back.
    pub async fn publish_thread(
        &self,
        parts: &[String],
        media: Option<MediaHandle>,
    ) -> Result<Vec<String>> {
        let mut state = ThreadState::new(media);
        let mut published = Vec::with_capacity(parts.len());

        for (index, part) in parts.iter().enumerate() {
            let id = self.publish_part(index, part, &mut state).await?;
            published.push(id);
        }

        Ok(published)
    }

    async fn publish_part(
        &self,
        index: usize,
        text: &str,
        state: &mut ThreadState,
    ) -> Result<String> {
        let max_attempts = self.config.max_attempts;
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            info!(
                platform = self.platform.name(),
                part = index,
                attempt,
                max_attempts,
                "posting thread part"
            );

            let request = CreatePost {
                text,
                in_reply_to: state.reply_target(),
                media: state.pending_media(),
            };
            let outcome = self.platform.create_post(request).await;

            match outcome {
                Ok(created) => {
                    // First successful attachment consumes the handle; it
                    // is never offered to a later part, retried or not.
                    state.consume_media();
                    state.advance(created.id.clone());
                    info!(part = index, attempt, id = %created.id, "thread part posted");
                    self.pace().await;
                    return Ok(created.id);
                }
                Err(e) => {
                    warn!(part = index, attempt, error = %e, "post attempt failed");
                    last_error = e.to_string();
                    if attempt < max_attempts {
                        sleep(Duration::from_secs(self.config.retry_delay_secs)).await;
                    }
                }
            }
        }

        Err(PlatformError::Exhausted {
            part_index: index,
            attempts: max_attempts,
            last_error,
        }
        .into())
    }

    /// Human-like pause after a successfully posted part.
    async fn pace(&self) {
        let delay = {
            let mut rng = rand::thread_rng();
            rng.gen_range(self.config.pacing_min_secs..=self.config.pacing_max_secs)
        };
        info!(seconds = delay, "pacing before next part");
        sleep(Duration::from_secs_f64(delay)).await;
    }
}
