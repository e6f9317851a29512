//! Posting window gate for the job trigger
//!
//! The job is invoked unconditionally or gated on the current UTC hour
//! being in a fixed allow-set. Outside the window the run is a documented
//! no-op that still exits successfully.

use chrono::{DateTime, Timelike, Utc};

#[derive(Debug, Clone)]
pub struct PostingWindow {
    hours: Vec<u32>,
}

impl PostingWindow {
    pub fn new(hours: Vec<u32>) -> Self {
        Self { hours }
    }

    pub fn is_open_at(&self, at: DateTime<Utc>) -> bool {
        self.hours.contains(&at.hour())
    }

    pub fn is_open_now(&self) -> bool {
        self.is_open_at(Utc::now())
    }

    pub fn hours(&self) -> &[u32] {
        &self.hours
    }
}
