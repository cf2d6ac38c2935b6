use mongodb::{
    Client, ClientSession, Collection, IndexModel,
    bson::doc,
    options::{IndexOptions, ReturnDocument},
};
use futures::TryStreamExt;

use crate::dbs::mongo::models::{MongoCounter, MongoHistoryItem};
use crate::error::{PersistError, Result};

const HISTORY_COUNTER: &str = "chat_history";

#[derive(Clone)]
pub struct MongoHistoryRepository {
    collection: Collection<MongoHistoryItem>,
    counters: Collection<MongoCounter>,
}

impl MongoHistoryRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let database = client.database(db_name);
        Self {
            collection: database.collection("chat_history"),
            counters: database.collection("counters"),
        }
    }

    /// Index backing the windowed fetch, plus uniqueness of logical keys
    pub async fn ensure_indexes(&self) -> Result<()> {
        self.collection
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "thread_id": 1, "timestamp": -1, "_id": -1 })
                    .build(),
            )
            .await?;
        self.collection
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "key": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;
        Ok(())
    }

    /// Reserve `count` sequence numbers; returns the first one
    pub async fn reserve_sequence(&self, count: i64, session: &mut ClientSession) -> Result<i64> {
        let counter = self.counters
            .find_one_and_update(
                doc! { "_id": HISTORY_COUNTER },
                doc! { "$inc": { "seq": count } },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .session(session)
            .await?
            .ok_or_else(|| PersistError::Internal("sequence counter missing after upsert".to_string()))?;
        Ok(counter.seq - count + 1)
    }

    pub async fn insert_many(
        &self,
        items: Vec<MongoHistoryItem>,
        session: &mut ClientSession,
    ) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        self.collection.insert_many(items).session(session).await?;
        Ok(())
    }

    /// Newest `limit` rows for a thread, newest first
    pub async fn find_recent(&self, thread_id: &str, limit: i64) -> Result<Vec<MongoHistoryItem>> {
        let items = self.collection
            .find(doc! { "thread_id": thread_id })
            .sort(doc! { "timestamp": -1, "_id": -1 })
            .limit(limit)
            .await?
            .try_collect()
            .await?;
        Ok(items)
    }

    /// Every row for a thread, oldest first
    pub async fn find_all(&self, thread_id: &str) -> Result<Vec<MongoHistoryItem>> {
        let items = self.collection
            .find(doc! { "thread_id": thread_id })
            .sort(doc! { "timestamp": 1, "_id": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(items)
    }

    pub async fn count(&self, thread_id: &str) -> Result<u64> {
        Ok(self.collection.count_documents(doc! { "thread_id": thread_id }).await?)
    }

    pub async fn delete_thread(&self, thread_id: &str) -> Result<u64> {
        let result = self.collection.delete_many(doc! { "thread_id": thread_id }).await?;
        Ok(result.deleted_count)
    }

    pub async fn delete_thread_in_session(
        &self,
        thread_id: &str,
        session: &mut ClientSession,
    ) -> Result<u64> {
        let result = self.collection
            .delete_many(doc! { "thread_id": thread_id })
            .session(session)
            .await?;
        Ok(result.deleted_count)
    }
}
