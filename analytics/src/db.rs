use crate::config::Settings;
use crate::errors::{Error, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Executor, Postgres, Transaction};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

pub type ReadTx = Transaction<'static, Postgres>;

pub async fn make_pool(settings: &Settings) -> Result<PgPool> {
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
        .connect(&settings.database_url)
        .await?;
    info!("Database connection established");

    if settings.run_migrations {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Migrations completed");
    }

    Ok(pool)
}

/// Opens a read-only snapshot transaction with a statement timeout.
///
/// The transaction holds one pooled connection for the whole request. Dropping
/// it on any path rolls back and returns the connection to the pool.
pub async fn begin_read(pool: &PgPool, query_timeout: Duration) -> Result<ReadTx> {
    let mut tx = pool.begin().await?;

    (&mut *tx)
        .execute(sqlx::raw_sql(
            "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY",
        ))
        .await?;

    // SET cannot take bind parameters; the value is an integer we computed.
    let timeout_ms = query_timeout.as_millis().max(1);
    let set_timeout = format!("SET LOCAL statement_timeout = {}", timeout_ms);
    (&mut *tx).execute(sqlx::raw_sql(&set_timeout)).await?;

    debug!("Read transaction opened (statement_timeout={}ms)", timeout_ms);
    Ok(tx)
}

/// Runs `fut` under a wall-clock bound, reporting `Error::QueryTimeout` when exceeded.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::QueryTimeout),
    }
}

pub async fn ping(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_passes_result_through() {
        let value = with_timeout(Duration::from_secs(1), async { Ok(42) })
            .await
            .unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_with_timeout_reports_query_timeout() {
        let result: Result<()> = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(Error::QueryTimeout)));
    }

    #[tokio::test]
    async fn test_with_timeout_keeps_inner_error() {
        let result: Result<()> = with_timeout(Duration::from_secs(1), async {
            Err(Error::NotFound("dev-1".to_string()))
        })
        .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
