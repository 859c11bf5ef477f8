use std::path::{Path, PathBuf};

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use tracing::debug;

use crate::error::Result;

const DB_FILE_NAME: &str = "folio.db";

/// Storage that only survives on this device: one SQLite file under the data dir.
///
/// Cloning is cheap and shares the pool.
#[derive(Clone)]
pub struct LocalDevice {
    db_file: PathBuf,
    pool: SqlitePool,
}

impl std::fmt::Debug for LocalDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalDevice")
            .field("db_file", &self.db_file)
            .finish()
    }
}

impl LocalDevice {
    /// Open (creating if needed) the database in `data_dir` and run migrations.
    pub async fn open<P: AsRef<Path>>(data_dir: P) -> anyhow::Result<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;
        let db_file = data_dir.join(DB_FILE_NAME);
        let pool = Self::connect(&db_file)
            .await
            .with_context(|| format!("Failed to open local database {:?}", db_file))?;
        debug!(db_file = ?db_file, "local device storage ready");
        Ok(Self { db_file, pool })
    }

    async fn connect(db_file: &Path) -> Result<SqlitePool> {
        let connect_opts = SqliteConnectOptions::new()
            .filename(db_file)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_opts)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(pool)
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn db_file(&self) -> &Path {
        &self.db_file
    }

    /// Flush the WAL and release file handles. Further use of this device fails.
    pub async fn close(&self) -> Result<()> {
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE);")
            .execute(&self.pool)
            .await?;
        self.pool.close().await;
        Ok(())
    }
}
