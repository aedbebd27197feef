use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sea_orm::{DatabaseConnection, DbErr, SqlxSqliteConnector};
use sea_orm_migration::MigratorTrait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::ConnectOptions;
use tracing::debug;

use crate::migration::Migrator;

/// Open the database at `db_path` and bring the schema up to date.
pub async fn new(db_path: &Path) -> Result<DatabaseConnection, DBError> {
    start_db(Some(db_path)).await
}

/// Start the database, `None` gives a fresh in-memory database.
pub async fn start_db(db_path: Option<&Path>) -> Result<DatabaseConnection, DBError> {
    let (db_url, max_connections) = match db_path {
        Some(path) => (format!("sqlite://{}?mode=rwc", path.display()), 8),
        // every pooled connection would get its own in-memory database
        None => ("sqlite::memory:".to_string(), 1),
    };
    debug!("Opening Database: {db_url}");

    let options = SqliteConnectOptions::from_str(&db_url)?
        .foreign_keys(true)
        .log_statements(log::LevelFilter::Trace)
        .log_slow_statements(log::LevelFilter::Warn, Duration::from_millis(500));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    let conn = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool);

    Migrator::up(&conn, None).await?;
    debug!("Database migrations complete");

    Ok(conn)
}

#[derive(Debug)]
pub enum DBError {
    SqlxError(sqlx::Error),
    SeaOrm(DbErr),
    IoError(std::io::Error),
}

impl From<sqlx::Error> for DBError {
    fn from(err: sqlx::Error) -> Self {
        DBError::SqlxError(err)
    }
}

impl From<DbErr> for DBError {
    fn from(err: DbErr) -> Self {
        DBError::SeaOrm(err)
    }
}

impl From<std::io::Error> for DBError {
    fn from(err: std::io::Error) -> Self {
        DBError::IoError(err)
    }
}
