use crate::{
    config::{RuntimeConfiguration, StorageBackend},
    error::AlunoResult,
    store::{
        DatabaseConnector, DatabaseHandle, StoreResult, memory::MemoryConnector,
        mongo::MongoConnector,
    },
};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct AlunoState {
    connector: Arc<dyn DatabaseConnector>,
    config: RuntimeConfiguration,
}

impl AlunoState {
    pub async fn new(config: RuntimeConfiguration) -> AlunoResult<Self> {
        let connector: Arc<dyn DatabaseConnector> = match config.db_config().backend() {
            StorageBackend::MongoDb { uri } => Arc::new(MongoConnector::connect(uri).await?),
            StorageBackend::Memory => {
                warn!("Using in-memory storage, nothing will survive a restart");
                Arc::new(MemoryConnector::default())
            }
        };

        Ok(Self::with_connector(connector, config))
    }

    pub fn with_connector(
        connector: Arc<dyn DatabaseConnector>,
        config: RuntimeConfiguration,
    ) -> Self {
        Self { connector, config }
    }

    ///opens a handle on the configured database
    pub async fn get_handle(&self) -> StoreResult<Box<dyn DatabaseHandle>> {
        self.connector
            .get_handle(self.config.db_config().database())
            .await
    }

    pub async fn sensible_shutdown(&self) {
        self.connector.shutdown().await;
    }
}
