use std::time::Duration;

use anyhow::{Context, Result};
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError, QueryResult};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::{debug, warn};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// Embedded migrations, compiled into the binary
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// How long SQLite itself waits on a locked database before giving up
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Number of times a statement is retried after SQLite reports a lock
const MAX_RETRIES: u32 = 5;

/// Base delay between retries, doubled on every attempt
const RETRY_BASE_DELAY: Duration = Duration::from_millis(20);

/// Applies per-connection pragmas whenever the pool hands out a new connection
#[derive(Debug, Clone, Copy)]
struct ConnectionOptions {
    busy_timeout_ms: u32,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA foreign_keys = ON;",
            self.busy_timeout_ms
        ))
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Builds the connection pool for the given database URL
///
/// ### Arguments
///
/// * `database_url` - A SQLite path or `file:` URI
///
/// ### Errors
///
/// Returns an error if the pool cannot open its initial connections
pub fn init_pool(database_url: &str) -> Result<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    Pool::builder()
        .connection_customizer(Box::new(ConnectionOptions { busy_timeout_ms: BUSY_TIMEOUT_MS }))
        .build(manager)
        .with_context(|| format!("Failed to create pool for {}", database_url))
}

/// Runs every pending embedded migration on the given connection
pub fn run_migrations(conn: &mut SqliteConnection) -> Result<()> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
    debug!("Applied {} migrations", applied.len());
    Ok(())
}

/// Returns true if the error is SQLite telling us another writer holds the lock
fn is_locked(err: &DieselError) -> bool {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::Unknown, info) => {
            info.message().contains("locked")
        }
        _ => false,
    }
}

/// Runs a statement, retrying with exponential backoff while the database is locked
///
/// The closure is re-run on every attempt, so it must rebuild its query each time.
/// Errors other than lock contention are returned immediately.
pub async fn retry_on_busy<T, F>(mut op: F) -> QueryResult<T>
where
    F: FnMut() -> QueryResult<T>,
{
    let mut attempt = 0;
    loop {
        match op() {
            Err(err) if is_locked(&err) && attempt < MAX_RETRIES => {
                let delay = RETRY_BASE_DELAY * 2u32.pow(attempt);
                attempt += 1;
                warn!("Database locked, retrying in {:?} (attempt {})", delay, attempt);
                tokio::time::sleep(delay).await;
            }
            result => return result,
        }
    }
}
