use sqlx::{Sqlite, SqlitePool, Transaction};
use std::future::Future;
use std::time::Duration;

use crate::error::AppError;

/// Pause before the single retry of a transient storage failure.
pub const RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// Open a write transaction on the pool. Dropping it without `commit` rolls back.
///
/// `BEGIN IMMEDIATE` takes the write lock up front, so concurrent writers wait
/// behind `busy_timeout` instead of failing when a read snapshot goes stale.
pub async fn begin(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, AppError> {
    pool.begin_with("BEGIN IMMEDIATE")
        .await
        .map_err(AppError::from)
}

/// Run a storage operation, retrying it once after a short backoff when the
/// storage layer reports it busy or timed out. A second transient failure is
/// returned to the caller as `AppError::Transient`.
pub async fn with_retry<T, F, Fut>(operation: &str, mut attempt: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    match attempt().await {
        Err(err) if err.is_transient() => {
            log::warn!(
                "{} hit a transient storage error ({}), retrying once",
                operation,
                err
            );
            tokio::time::sleep(RETRY_BACKOFF).await;
            attempt().await.inspect_err(|err| {
                if err.is_transient() {
                    log::error!("{} failed again after retry: {}", operation, err);
                }
            })
        }
        result => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn retries_transient_failures_once() {
        let calls = Cell::new(0);
        let result = with_retry("test", || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n == 1 {
                    Err(AppError::Transient("busy".to_string()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn surfaces_second_transient_failure() {
        let calls = Cell::new(0);
        let result: Result<(), AppError> = with_retry("test", || {
            calls.set(calls.get() + 1);
            async { Err(AppError::Transient("busy".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(AppError::Transient(_))));
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let calls = Cell::new(0);
        let result: Result<(), AppError> = with_retry("test", || {
            calls.set(calls.get() + 1);
            async { Err(AppError::Validation("bad".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(calls.get(), 1);
    }
}
