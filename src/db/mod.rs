//! # Persistence
//!
//! Connection pool and schema migrations. Every service call runs inside
//! its own transaction taken from [`Database::begin`]; the transaction
//! commits explicitly on success and rolls back when dropped on any error
//! path, so no state is shared across requests.
//!
//! Services read before they write, and SQLite cannot upgrade a deferred
//! read lock while another connection writes. Transactions therefore hold
//! the process-wide writer lock from begin until commit or drop.

use std::ops::{Deref, DerefMut};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::migrate::Migrator;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
};
use sqlx::{Sqlite, Transaction};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::config::DatabaseConfig;

/// Forward-only migrations, applied in filename order and tracked in
/// sqlx's version table.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Transaction handle passed to repository functions.
///
/// Derefs to the connection; holds the writer lock until it is committed
/// or dropped.
pub struct Tx {
    inner: Transaction<'static, Sqlite>,
    _writer: OwnedMutexGuard<()>,
}

impl Tx {
    pub async fn commit(self) -> Result<(), sqlx::Error> {
        self.inner.commit().await
    }
}

impl Deref for Tx {
    type Target = SqliteConnection;

    fn deref(&self) -> &SqliteConnection {
        &*self.inner
    }
}

impl DerefMut for Tx {
    fn deref_mut(&mut self) -> &mut SqliteConnection {
        &mut *self.inner
    }
}

/// Shared handle to the database
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    writer: Arc<Mutex<()>>,
}

impl Database {
    /// Connect using the configured URL and pool size
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;
        tracing::info!(
            url = %config.url,
            max_connections = config.max_connections,
            "database pool ready"
        );
        Ok(Self::from_pool(pool))
    }

    /// Private in-memory database with the schema applied.
    ///
    /// A single connection that never expires, so the data lives as long as
    /// the returned handle.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let db = Self::from_pool(pool);
        db.migrate().await?;
        Ok(db)
    }

    fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Apply pending migrations
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        MIGRATOR.run(&self.pool).await?;
        tracing::info!("database schema is up to date");
        Ok(())
    }

    /// Open a request-scoped transaction
    pub async fn begin(&self) -> Result<Tx, sqlx::Error> {
        let writer = self.writer.clone().lock_owned().await;
        let inner = self.pool.begin().await?;
        Ok(Tx {
            inner,
            _writer: writer,
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Liveness probe
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
