use crate::error::{AlunoError, AlunoResult, BadEnvVarSnafu, MissingMongoUriSnafu};
use dotenvy::var;
use secrecy::SecretString;
use snafu::{OptionExt, ResultExt};
use std::{str::FromStr, sync::Arc};

#[derive(Clone, Debug)]
pub struct RuntimeConfiguration {
    db_config: Arc<DbConfig>,
    server_ip: Arc<str>,
}

impl RuntimeConfiguration {
    pub fn new() -> AlunoResult<Self> {
        let server_ip = var("ALUNO_SERVER_IP").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

        Ok(Self {
            db_config: Arc::new(DbConfig::new()?),
            server_ip: server_ip.into(),
        })
    }

    #[cfg(test)]
    pub fn in_memory(database: &str) -> Self {
        Self {
            db_config: Arc::new(DbConfig {
                backend: StorageBackend::Memory,
                database: database.to_string(),
            }),
            server_ip: "127.0.0.1:0".into(),
        }
    }

    pub fn db_config(&self) -> Arc<DbConfig> {
        self.db_config.clone()
    }

    pub fn server_ip(&self) -> &str {
        &self.server_ip
    }
}

#[derive(Debug)]
pub enum StorageBackend {
    MongoDb { uri: SecretString },
    Memory,
}

#[derive(Debug)]
pub struct DbConfig {
    backend: StorageBackend,
    database: String,
}

impl DbConfig {
    pub fn new() -> AlunoResult<Self> {
        let get_env_var = |name| var(name).context(BadEnvVarSnafu { name });

        let backend_name = var("ALUNO_STORAGE").unwrap_or_else(|_| "mongodb".to_string());
        let backend = match backend_name.parse::<BackendKind>()? {
            BackendKind::MongoDb => StorageBackend::MongoDb {
                uri: SecretString::from(var("MONGODB_URI").ok().context(MissingMongoUriSnafu)?),
            },
            BackendKind::Memory => StorageBackend::Memory,
        };

        Ok(Self {
            backend,
            database: get_env_var("DB_NAME")?,
        })
    }

    pub const fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    pub fn database(&self) -> &str {
        &self.database
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum BackendKind {
    MongoDb,
    Memory,
}

impl FromStr for BackendKind {
    type Err = AlunoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(Self::MongoDb),
            "memory" => Ok(Self::Memory),
            _ => Err(AlunoError::UnknownStorageBackend {
                found: s.to_string(),
            }),
        }
    }
}
