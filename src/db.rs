// src/db.rs

use std::{cmp::Ordering, str::FromStr};

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

/// Collation comparing names case-insensitively, accented letters included.
///
/// SQLite's `lower()` and `NOCASE` only fold ASCII.
pub const UNICODE_NOCASE: &str = "unicode_nocase";

pub(crate) fn unicode_nocase(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Opens the question bank, creating the file if needed.
///
/// Every connection registers the [`UNICODE_NOCASE`] collation.
///
/// An in-memory database lives only as long as its connection, so the pool is
/// pinned to one connection that is never recycled.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .collation(UNICODE_NOCASE, unicode_nocase);

    if database_url.contains(":memory:") {
        return SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await;
    }

    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await
}

/// Applies the embedded schema migrations.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
