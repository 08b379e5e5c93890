use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, DatabaseConfig, EnvSource};
use crate::database::connection::{DatabaseCredentials, DatabaseTarget};
use crate::database::store::Store;
use crate::validation::ValidationError;

/// Errors from the data-access layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Unsupported database URL: {0}")]
    UnsupportedUrl(String),

    #[error("Invalid database URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Insert into {0} returned no row id")]
    NoInsertId(&'static str),

    #[error("Legacy data conversion failed: {0}")]
    Legacy(String),

    #[error("Column {0} missing from result")]
    ColumnNotFound(String),

    #[error("Column {column}: expected {expected}, found {found}")]
    Decode {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Libsql(#[from] libsql::Error),
}

impl DatabaseError {
    /// The database could not be reached at all, as opposed to a failing statement.
    pub fn is_unavailable(&self) -> bool {
        match self {
            DatabaseError::Sqlx(e) => matches!(
                e,
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            ),
            DatabaseError::Libsql(e) => matches!(e, libsql::Error::ConnectionFailed(_)),
            _ => false,
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        match self {
            DatabaseError::Sqlx(sqlx::Error::Database(e)) => e.is_unique_violation(),
            // The remote protocol only carries SQLite's message text
            DatabaseError::Libsql(e) => e.to_string().contains("UNIQUE constraint failed"),
            _ => false,
        }
    }
}

/// Owns the database handle for the lifetime of the process.
///
/// Created once at startup and handed to the application state; cloning is
/// cheap and shares the same pool or remote client.
#[derive(Clone, Debug)]
pub struct DatabaseManager {
    store: Store,
}

impl DatabaseManager {
    /// Read credentials from the environment and connect
    pub async fn from_env(env: &impl EnvSource, config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let credentials = DatabaseCredentials::from_env(env)?;
        Self::connect(&credentials, config).await
    }

    pub async fn connect(credentials: &DatabaseCredentials, config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let pool_options = SqlitePoolOptions::new()
            .acquire_timeout(Duration::from_secs(config.connection_timeout));

        let store = match credentials.target()? {
            // Every connection to :memory: is a separate database; pin a single one
            DatabaseTarget::Memory(options) => Store::Sqlite(
                pool_options
                    .max_connections(1)
                    .min_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect_with(options)
                    .await?,
            ),
            DatabaseTarget::File(options) => Store::Sqlite(
                pool_options
                    .max_connections(config.max_connections.max(1))
                    .connect_with(options)
                    .await?,
            ),
            DatabaseTarget::Remote { url, auth_token } => {
                let db = libsql::Builder::new_remote(url, auth_token).build().await?;
                Store::Remote(Arc::new(db))
            }
        };

        info!("Connected to {} database: {:?}", store.backend(), credentials);
        Ok(Self { store })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Round-trips `SELECT 1` to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        self.store.fetch_all("SELECT 1", Vec::new()).await?;
        Ok(())
    }

    /// Close the pool (e.g., on shutdown)
    pub async fn close(&self) {
        self.store.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[tokio::test]
    async fn connects_to_memory_and_pings() {
        let config = AppConfig::development().database;
        let db = DatabaseManager::connect(&DatabaseCredentials::new(":memory:", None), &config)
            .await
            .unwrap();
        db.health_check().await.unwrap();
        db.close().await;
        assert!(db.health_check().await.is_err());
    }

    #[tokio::test]
    async fn remote_url_uses_libsql_client() {
        // Nothing listens here, so the first statement has to fail
        let port = portpicker::pick_unused_port().unwrap();
        let creds = DatabaseCredentials::new(format!("http://127.0.0.1:{}", port), Some("tok".into()));
        match DatabaseManager::connect(&creds, &AppConfig::development().database).await {
            Ok(db) => {
                assert_eq!(db.store().backend(), "libsql");
                assert!(db.health_check().await.is_err());
            }
            Err(e) => assert!(matches!(e, DatabaseError::Libsql(_)), "unexpected error: {}", e),
        }
    }

    #[tokio::test]
    async fn remote_url_without_token_is_a_config_error() {
        let creds = DatabaseCredentials::new("libsql://studio.turso.io", None);
        let err = DatabaseManager::connect(&creds, &AppConfig::development().database)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Config(_)));
    }

    #[tokio::test]
    async fn file_database_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studio.db");
        let creds = DatabaseCredentials::new(format!("file:{}", path.display()), None);
        let db = DatabaseManager::connect(&creds, &AppConfig::development().database)
            .await
            .unwrap();
        db.health_check().await.unwrap();
        assert!(path.exists());
        db.close().await;
    }
}
