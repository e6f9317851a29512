//! Blob storage access for image content
//!
//! Images referenced by pending posts live in a separate collection as
//! inline binary documents: `{_id: string, data: binary, content_type?}`.
//! The [`BlobStore`] trait keeps the resolver testable;
//! [`MemoryBlobStore`] backs the tests.

use async_trait::async_trait;
use mongodb::bson::{doc, Binary};
use mongodb::{Collection, Database};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};

/// Binary-object retrieval by string id.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Whether a blob with this id exists, checked before any read.
    async fn exists(&self, id: &str) -> Result<bool>;

    /// Retrieve a blob's bytes; `None` when the id does not resolve.
    async fn fetch(&self, id: &str) -> Result<Option<Vec<u8>>>;
}

#[derive(Debug, Deserialize)]
struct ImageDoc {
    #[serde(rename = "_id")]
    #[allow(dead_code)]
    id: String,
    data: Binary,
}

pub struct MongoBlobStore {
    images: Collection<ImageDoc>,
}

impl MongoBlobStore {
    pub fn from_database(db: &Database, config: &StoreConfig) -> Self {
        Self {
            images: db.collection(&config.image_collection),
        }
    }
}

#[async_trait]
impl BlobStore for MongoBlobStore {
    async fn exists(&self, id: &str) -> Result<bool> {
        let count = self
            .images
            .count_documents(doc! { "_id": id }, None)
            .await
            .map_err(StoreError::from)?;
        Ok(count > 0)
    }

    async fn fetch(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let found = self
            .images
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(StoreError::from)?;
        Ok(found.map(|image| image.data.bytes))
    }
}

/// Blob store double backed by a map, with a switch to simulate reads that
/// fail mid-flight (a present id whose content cannot be retrieved).
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    corrupt: Mutex<bool>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: &str, bytes: Vec<u8>) {
        self.blobs.lock().unwrap().insert(id.to_string(), bytes);
    }

    /// Make every fetch fail even for ids that exist.
    pub fn set_corrupt(&self, corrupt: bool) {
        *self.corrupt.lock().unwrap() = corrupt;
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.blobs.lock().unwrap().contains_key(id))
    }

    async fn fetch(&self, id: &str) -> Result<Option<Vec<u8>>> {
        if *self.corrupt.lock().unwrap() {
            return Err(StoreError::Unavailable("corrupt blob read".to_string()).into());
        }
        Ok(self.blobs.lock().unwrap().get(id).cloned())
    }
}
