pub mod migrations;
pub mod models;
pub mod repos;
pub mod seed;

use r2d2::{CustomizeConnection, Pool};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;

use crate::error::AppError;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Connection customizer that sets per-connection SQLite pragmas.
#[derive(Debug)]
struct SqlitePragmaCustomizer;

impl CustomizeConnection<rusqlite::Connection, rusqlite::Error> for SqlitePragmaCustomizer {
    fn on_acquire(&self, conn: &mut rusqlite::Connection) -> Result<(), rusqlite::Error> {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }
}

/// Initialize the session store: an in-memory SQLite database that lives for
/// the lifetime of the pool. Runs migrations and loads the starter knowledge
/// base.
///
/// A `:memory:` database is per-connection, so the pool is capped at one
/// connection; every caller shares the same store. The core is
/// single-session by design, so this is not a throughput constraint.
pub fn init_db() -> Result<DbPool, AppError> {
    tracing::info!("Initializing in-memory session store");

    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder()
        .max_size(1)
        .connection_customizer(Box::new(SqlitePragmaCustomizer))
        .build(manager)?;

    {
        let conn = pool.get()?;
        migrations::run(&conn)?;
    }
    seed::run(&pool)?;

    tracing::info!("Session store initialized");
    Ok(pool)
}

/// Open a file-backed pool. Used by embedding shells that want the knowledge
/// base to survive restarts; the core itself never requires it.
pub fn open_pool(db_path: &Path) -> Result<DbPool, AppError> {
    if let Some(dir) = db_path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    tracing::info!(path = %db_path.display(), "Opening database");

    let manager = SqliteConnectionManager::file(db_path);
    let pool = Pool::builder()
        .max_size(4)
        .connection_customizer(Box::new(SqlitePragmaCustomizer))
        .build(manager)?;

    {
        let conn = pool.get()?;
        migrations::run(&conn)?;
    }
    seed::run(&pool)?;

    Ok(pool)
}

#[cfg(test)]
pub fn init_test_db() -> Result<DbPool, AppError> {
    init_db()
}
