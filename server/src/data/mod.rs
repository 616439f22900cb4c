//! Data storage layer
//!
//! - `sqlite` - Embedded transactional database (schema, migrations, repositories)
//! - `types` - Row and parameter types shared by repositories and callers
//! - `traits` - `TransactionalRepository`, the seam services are written against
//! - `error` - Unified error type for the data layer

pub mod error;
pub mod sqlite;
pub mod traits;
pub mod types;

pub use sqlite::SqliteService;

// Re-export unified error type
pub use error::DataError;

// Re-export repository trait
pub use traits::TransactionalRepository;

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::core::storage::AppStorage;

/// Transactional database service
///
/// Owns the SQLite service behind an Arc so repositories handed to request
/// handlers and background tasks share one pool.
pub struct TransactionalService {
    sqlite: Arc<SqliteService>,
}

impl TransactionalService {
    /// Open (or create) the database in the storage directory and run migrations
    pub async fn init(storage: &AppStorage) -> Result<Self, DataError> {
        let service = SqliteService::init(storage).await?;
        Ok(Self {
            sqlite: Arc::new(service),
        })
    }

    /// Wrap an existing SQLite service (primarily for testing)
    #[cfg(test)]
    pub fn from_sqlite(service: SqliteService) -> Self {
        Self {
            sqlite: Arc::new(service),
        }
    }

    /// Get the SQLite pool (for direct access when needed)
    pub fn pool(&self) -> &sqlx::SqlitePool {
        self.sqlite.pool()
    }

    /// Run a WAL checkpoint
    pub async fn checkpoint(&self) -> Result<(), DataError> {
        self.sqlite.checkpoint().await.map_err(Into::into)
    }

    /// Close the database connection gracefully
    pub async fn close(&self) {
        self.sqlite.close().await
    }

    /// Start the background checkpoint task
    pub fn start_checkpoint_task(&self, shutdown_rx: watch::Receiver<bool>) -> JoinHandle<()> {
        self.sqlite.start_checkpoint_task(shutdown_rx)
    }

    /// Get the repository trait object for data operations
    pub fn repository(&self) -> Box<dyn TransactionalRepository + Send + Sync> {
        Box::new(Arc::clone(&self.sqlite))
    }

    /// In-memory database with the schema applied (for tests)
    #[cfg(test)]
    pub async fn in_memory() -> Self {
        Self::from_sqlite(SqliteService::from_pool(
            sqlite::repositories::test_support::setup_test_pool().await,
        ))
    }
}
