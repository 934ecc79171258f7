use crate::{
    error::{AlunoResult, OpenDatabaseSnafu},
    store::{DatabaseConnector, DatabaseHandle, DriverSnafu, StoreResult},
};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Client, Database,
    bson::{Document, doc, oid::ObjectId},
};
use secrecy::{ExposeSecret, SecretString};
use snafu::ResultExt;

#[derive(Clone, Debug)]
pub struct MongoConnector {
    client: Client,
}

impl MongoConnector {
    pub async fn connect(uri: &SecretString) -> AlunoResult<Self> {
        let client = Client::with_uri_str(uri.expose_secret())
            .await
            .context(OpenDatabaseSnafu)?;

        //the driver connects lazily, so make sure the uri actually works before we start serving
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .context(OpenDatabaseSnafu)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl DatabaseConnector for MongoConnector {
    async fn get_handle(&self, database_name: &str) -> StoreResult<Box<dyn DatabaseHandle>> {
        Ok(Box::new(MongoHandle {
            database: self.client.database(database_name),
        }))
    }

    async fn shutdown(&self) {
        self.client.clone().shutdown().await;
    }
}

struct MongoHandle {
    database: Database,
}

#[async_trait]
impl DatabaseHandle for MongoHandle {
    async fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.database
            .collection::<Document>(collection)
            .find(doc! {})
            .sort(doc! { "_id": 1 })
            .await
            .context(DriverSnafu)?
            .try_collect()
            .await
            .context(DriverSnafu)
    }

    async fn insert_one(
        &self,
        collection: &str,
        document: Document,
    ) -> StoreResult<Option<ObjectId>> {
        Ok(self
            .database
            .collection::<Document>(collection)
            .insert_one(document)
            .await
            .context(DriverSnafu)?
            .inserted_id
            .as_object_id())
    }

    async fn delete_one(&self, collection: &str, id: ObjectId) -> StoreResult<u64> {
        Ok(self
            .database
            .collection::<Document>(collection)
            .delete_one(doc! { "_id": id })
            .await
            .context(DriverSnafu)?
            .deleted_count)
    }

    async fn update_one(
        &self,
        collection: &str,
        id: ObjectId,
        fields: Document,
    ) -> StoreResult<u64> {
        Ok(self
            .database
            .collection::<Document>(collection)
            .update_one(doc! { "_id": id }, doc! { "$set": fields })
            .await
            .context(DriverSnafu)?
            .matched_count)
    }
}
