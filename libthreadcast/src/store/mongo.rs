//! MongoDB-backed content store

use async_trait::async_trait;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document};
use mongodb::options::FindOneOptions;
use mongodb::{Client, Collection, Database};
use serde::Deserialize;

use crate::blob::MongoBlobStore;
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::types::PendingPost;

use super::ContentStore;

/// Wire shape of a queued post document.
#[derive(Debug, Deserialize)]
struct PendingPostDoc {
    #[serde(rename = "_id")]
    id: ObjectId,
    #[serde(default)]
    parts: Vec<String>,
    posted: bool,
    created_at: BsonDateTime,
    #[serde(default)]
    image_id: Option<String>,
}

impl From<PendingPostDoc> for PendingPost {
    fn from(doc: PendingPostDoc) -> Self {
        PendingPost {
            id: doc.id.to_hex(),
            parts: doc.parts,
            posted: doc.posted,
            created_at: doc.created_at.timestamp_millis(),
            image_id: doc.image_id,
        }
    }
}

/// Connect one client and bind the content collections and the image
/// collection named in the config.
pub async fn connect(config: &StoreConfig) -> Result<(MongoContentStore, MongoBlobStore)> {
    let client = Client::with_uri_str(&config.uri)
        .await
        .map_err(StoreError::from)?;
    let db = client.database(&config.database);
    Ok((
        MongoContentStore::from_database(&db, config),
        MongoBlobStore::from_database(&db, config),
    ))
}

pub struct MongoContentStore {
    pending: Collection<PendingPostDoc>,
    published: Collection<Document>,
}

impl MongoContentStore {
    pub fn from_database(db: &Database, config: &StoreConfig) -> Self {
        Self {
            pending: db.collection(&config.pending_collection),
            published: db.collection(&config.published_collection),
        }
    }
}

#[async_trait]
impl ContentStore for MongoContentStore {
    async fn fetch_next_pending(&self) -> Result<Option<PendingPost>> {
        let options = FindOneOptions::builder()
            .sort(doc! { "created_at": -1 })
            .build();

        let found = self
            .pending
            .find_one(doc! { "posted": false }, options)
            .await
            .map_err(StoreError::from)?;

        Ok(found.map(PendingPost::from))
    }

    async fn exists_published_text(&self, text: &str) -> Result<bool> {
        let found = self
            .published
            .find_one(doc! { "text": text }, None)
            .await
            .map_err(StoreError::from)?;

        Ok(found.is_some())
    }

    async fn mark_posted(&self, post_id: &str) -> Result<()> {
        let id = ObjectId::parse_str(post_id).map_err(|e| StoreError::MalformedRecord {
            id: post_id.to_string(),
            reason: e.to_string(),
        })?;

        let result = self
            .pending
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "posted": true } },
                None,
            )
            .await
            .map_err(StoreError::from)?;

        if result.matched_count == 0 {
            return Err(StoreError::MissingRecord(post_id.to_string()).into());
        }

        Ok(())
    }
}
