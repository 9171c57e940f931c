//! Database pool setup
//!
//! Domain functions use sqlx's generic Executor trait, so they accept both
//! `&SqlitePool` and `&mut SqliteConnection` (transactions):
//!
//! ```ignore
//! use sqlx::{Executor, Sqlite};
//!
//! pub async fn my_query<'e, E>(executor: E, id: i64) -> Result<MyType, sqlx::Error>
//! where
//!     E: Executor<'e, Database = Sqlite>,
//! {
//!     sqlx::query_as("SELECT * FROM my_table WHERE id = ?1")
//!         .bind(id)
//!         .fetch_one(executor)
//!         .await
//! }
//! ```
//!
//! Routes own transaction boundaries: `let mut tx = state.db.begin().await?;`,
//! pass `&mut *tx` to each domain call, then `tx.commit()`.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Open the pool and bring the schema up to date.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    // Every connection to `:memory:` is its own database, so keep exactly one
    // alive for the lifetime of the pool.
    let pool = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?
    };

    MIGRATOR.run(&pool).await?;

    Ok(pool)
}
