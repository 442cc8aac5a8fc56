//! Connection pool initialization and query deadlines

use crate::config::ConnectionInfo;
use crate::{Error, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::future::Future;
use std::time::Duration;
use tracing::info;

/// Pool size; batches run one at a time so a couple of connections suffice
const MAX_CONNECTIONS: u32 = 4;

/// Open a pool and verify connectivity immediately.
///
/// Used for the snapshot store: without it no batch can be analyzed.
pub async fn connect_pool(conn: &ConnectionInfo, acquire_timeout: Duration) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(acquire_timeout)
        .connect(&conn.url())
        .await?;
    info!("Connected to {}", conn);
    Ok(pool)
}

/// Create a pool without connecting; failures surface on first query.
///
/// Used for the metadata store, whose failures are absorbed per query.
pub fn connect_pool_lazy(conn: &ConnectionInfo, acquire_timeout: Duration) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(acquire_timeout)
        .connect_lazy(&conn.url())?;
    info!("Configured lazy pool for {}", conn);
    Ok(pool)
}

/// Run a query future under a deadline.
///
/// Expiry becomes `Error::Timeout` naming the operation.
pub async fn with_deadline<T, F>(operation: &str, deadline: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(format!(
            "{} exceeded {}s",
            operation,
            deadline.as_secs()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_deadline_passes_result_through() {
        let value = with_deadline("fast", Duration::from_secs(1), async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_with_deadline_passes_error_through() {
        let result: Result<()> = with_deadline("failing", Duration::from_secs(1), async {
            Err(Error::Internal("boom".to_string()))
        })
        .await;
        assert!(matches!(result, Err(Error::Internal(_))));
    }

    #[tokio::test]
    async fn test_with_deadline_times_out() {
        let result: Result<()> = with_deadline("slow query", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        match result {
            Err(Error::Timeout(msg)) => assert!(msg.contains("slow query")),
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
