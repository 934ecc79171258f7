use async_trait::async_trait;
use mongodb::bson::{Document, oid::ObjectId};
use snafu::Snafu;
use std::fmt::Debug;

pub mod memory;
pub mod mongo;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StoreError {
    #[snafu(display("Error talking to MongoDB"))]
    Driver { source: mongodb::error::Error },
    #[snafu(display("Unable to parse object id {:?}", original))]
    InvalidIdentifier {
        source: mongodb::bson::oid::Error,
        original: String,
    },
    #[snafu(display("Error serialising to BSON"))]
    BsonEncode { source: mongodb::bson::ser::Error },
    #[snafu(display("Error deserialising document {:?} from BSON", id))]
    BsonDecode {
        source: mongodb::bson::de::Error,
        id: Option<ObjectId>,
    },
    #[snafu(display("Database `{}` is unavailable", database))]
    Unavailable { database: String },
}

///Supplies ready-to-query handles for a named database.
#[async_trait]
pub trait DatabaseConnector: Debug + Send + Sync {
    async fn get_handle(&self, database_name: &str) -> StoreResult<Box<dyn DatabaseHandle>>;

    ///called once the server has stopped taking requests
    async fn shutdown(&self);
}

///One open database. Every method is a single round-trip against one collection.
#[async_trait]
pub trait DatabaseHandle: Send + Sync {
    ///every document in the collection, in ascending `_id` order
    async fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>>;

    ///returns the generated `_id`, if the store reported one
    async fn insert_one(&self, collection: &str, document: Document)
    -> StoreResult<Option<ObjectId>>;

    ///returns how many documents were deleted
    async fn delete_one(&self, collection: &str, id: ObjectId) -> StoreResult<u64>;

    ///`$set`s every key of `fields` on the matching document, returns how many documents matched
    async fn update_one(&self, collection: &str, id: ObjectId, fields: Document)
    -> StoreResult<u64>;
}
