use crate::store::{DatabaseConnector, DatabaseHandle, StoreResult, UnavailableSnafu};
use async_trait::async_trait;
use mongodb::bson::{Document, oid::ObjectId};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use tokio::sync::Mutex;

type Collections = HashMap<String, Vec<Document>>;

///Keeps every database in process memory. Documents live for as long as the connector does.
#[derive(Clone, Debug, Default)]
pub struct MemoryConnector {
    databases: Arc<Mutex<HashMap<String, Arc<Mutex<Collections>>>>>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl DatabaseConnector for MemoryConnector {
    async fn get_handle(&self, database_name: &str) -> StoreResult<Box<dyn DatabaseHandle>> {
        snafu::ensure!(
            !self.closed.load(Ordering::SeqCst),
            UnavailableSnafu {
                database: database_name
            }
        );

        let collections = self
            .databases
            .lock()
            .await
            .entry(database_name.to_string())
            .or_default()
            .clone();

        Ok(Box::new(MemoryHandle { collections }))
    }

    async fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

struct MemoryHandle {
    collections: Arc<Mutex<Collections>>,
}

fn has_id(document: &Document, id: ObjectId) -> bool {
    document.get_object_id("_id").is_ok_and(|found| found == id)
}

#[async_trait]
impl DatabaseHandle for MemoryHandle {
    async fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let mut documents = self
            .collections
            .lock()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default();
        documents.sort_by_key(|document| document.get_object_id("_id").ok());
        Ok(documents)
    }

    async fn insert_one(
        &self,
        collection: &str,
        mut document: Document,
    ) -> StoreResult<Option<ObjectId>> {
        if !document.contains_key("_id") {
            document.insert("_id", ObjectId::new());
        }
        let id = document.get_object_id("_id").ok();

        self.collections
            .lock()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(id)
    }

    async fn delete_one(&self, collection: &str, id: ObjectId) -> StoreResult<u64> {
        let mut collections = self.collections.lock().await;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(0);
        };

        Ok(
            match documents.iter().position(|document| has_id(document, id)) {
                Some(index) => {
                    documents.remove(index);
                    1
                }
                None => 0,
            },
        )
    }

    async fn update_one(
        &self,
        collection: &str,
        id: ObjectId,
        fields: Document,
    ) -> StoreResult<u64> {
        let mut collections = self.collections.lock().await;
        let Some(document) = collections
            .get_mut(collection)
            .and_then(|documents| documents.iter_mut().find(|document| has_id(document, id)))
        else {
            return Ok(0);
        };

        for (key, value) in fields {
            document.insert(key, value);
        }
        Ok(1)
    }
}
