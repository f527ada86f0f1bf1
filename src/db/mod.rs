pub mod queries;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

pub use queries::categories::Category;
pub use queries::questions::{NewQuestion, Question};

use sqlx::Error;

/// Number of questions in one page of `GET /questions`.
pub const QUESTIONS_PER_PAGE: i64 = 10;

pub async fn establish_connection(url: &str) -> Result<SqlitePool, Error> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    SqlitePool::connect_with(options).await
}

/// Single-connection pool over a private in-memory database.
///
/// Every connection to `sqlite::memory:` opens its own database, so the pool is capped at one
/// connection to keep the schema and the data visible to all callers.
pub async fn establish_memory_connection() -> Result<SqlitePool, Error> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = establish_memory_connection().await.unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}
