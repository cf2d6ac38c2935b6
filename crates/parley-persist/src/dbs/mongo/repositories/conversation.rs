use mongodb::{Client, ClientSession, Collection, bson::doc};
use futures::TryStreamExt;
use uuid::Uuid;

use crate::dbs::mongo::models::MongoConversation;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoConversationRepository {
    collection: Collection<MongoConversation>,
}

impl MongoConversationRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("conversations");
        Self { collection }
    }

    pub async fn insert(&self, conversation: &MongoConversation) -> Result<()> {
        self.collection.insert_one(conversation).await?;
        Ok(())
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<MongoConversation>> {
        let filter = doc! { "_id": id.to_string() };
        Ok(self.collection.find_one(filter).await?)
    }

    pub async fn find_in_session(
        &self,
        id: Uuid,
        session: &mut ClientSession,
    ) -> Result<Option<MongoConversation>> {
        let filter = doc! { "_id": id.to_string() };
        Ok(self.collection.find_one(filter).session(session).await?)
    }

    /// All conversations, oldest first
    pub async fn list(&self) -> Result<Vec<MongoConversation>> {
        let conversations = self.collection
            .find(doc! {})
            .sort(doc! { "created_at": 1, "_id": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(conversations)
    }

    /// Apply `$set` fields; returns whether a document matched
    pub async fn set_fields(&self, id: Uuid, fields: mongodb::bson::Document) -> Result<bool> {
        let filter = doc! { "_id": id.to_string() };
        let result = self.collection
            .update_one(filter, doc! { "$set": fields })
            .await?;
        Ok(result.matched_count > 0)
    }

    pub async fn delete_in_session(&self, id: Uuid, session: &mut ClientSession) -> Result<bool> {
        let filter = doc! { "_id": id.to_string() };
        let result = self.collection.delete_one(filter).session(session).await?;
        Ok(result.deleted_count > 0)
    }
}
