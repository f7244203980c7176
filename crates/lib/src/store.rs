//! Durable report storage.
//!
//! `ReportStore` is the seam the pipeline writes through. The production
//! implementation inserts into Postgres over a connection scoped to the
//! call (acquired, used for one INSERT, released on every exit path).
//! `RetryingStore` wraps any store with the write policy: one bounded
//! attempt, one retry after a fixed backoff.

use crate::config::{self, StorageConfig};
use crate::report::FeedingReport;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Connection, PgConnection};
use std::time::Duration;
use thiserror::Error;

/// Why a report write failed. Converted to a storage-failure reply at the
/// pipeline boundary, never propagated as a process-level fault.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("insert timed out after {0:?}")]
    Timeout(Duration),
}

/// Destination for accepted reports.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Insert one report row; returns the stored record with the timestamp
    /// the store assigned.
    async fn insert(&self, people_fed: i64) -> Result<FeedingReport, StoreError>;
}

/// Postgres-backed store. One dedicated connection per insert call — no
/// pooling, no cross-request sharing; consistency relies on the database's
/// own transaction isolation.
pub struct PgReportStore {
    url: String,
    timeout: Duration,
}

impl PgReportStore {
    pub fn new(storage: &StorageConfig, password: Option<&str>) -> Self {
        Self {
            url: config::postgres_url(storage, password),
            timeout: Duration::from_millis(storage.timeout_ms),
        }
    }

    /// Connect and insert one row. The single statement is its own
    /// transaction; once `execute` returns the row is committed. Hands the
    /// connection back to the caller for teardown — dropping it releases it
    /// on error paths.
    async fn insert_once(&self, people_fed: i64) -> Result<(FeedingReport, PgConnection), StoreError> {
        log::debug!("store: connecting to database");
        let mut conn = PgConnection::connect(&self.url).await?;
        let recorded_at = Utc::now();
        sqlx::query(r#"INSERT INTO "FeedingReports" ("peopleFed", "date") VALUES ($1, $2)"#)
            .bind(people_fed)
            .bind(recorded_at.naive_utc())
            .execute(&mut conn)
            .await?;
        log::info!("store: committed report of {} people fed", people_fed);
        Ok((
            FeedingReport {
                people_fed,
                recorded_at,
            },
            conn,
        ))
    }
}

#[async_trait]
impl ReportStore for PgReportStore {
    async fn insert(&self, people_fed: i64) -> Result<FeedingReport, StoreError> {
        // The timeout bounds acquisition and the statement only. Teardown
        // happens after the row is committed and must not turn the attempt
        // into a failure.
        let (report, conn) = match tokio::time::timeout(self.timeout, self.insert_once(people_fed)).await {
            Ok(result) => result?,
            Err(_) => return Err(StoreError::Timeout(self.timeout)),
        };
        release_after_commit(report, conn.close(), self.timeout).await
    }
}

/// Close the scoped connection after a committed write. A close failure or
/// close timeout is logged, never returned: the row already exists, and an
/// error here would send the retry wrapper back for a duplicate insert.
/// A timed-out close still releases the connection when its future drops.
async fn release_after_commit(
    report: FeedingReport,
    close: impl std::future::Future<Output = Result<(), sqlx::Error>> + Send,
    timeout: Duration,
) -> Result<FeedingReport, StoreError> {
    match tokio::time::timeout(timeout, close).await {
        Ok(Ok(())) => log::debug!("store: connection closed"),
        Ok(Err(e)) => log::warn!("store: closing connection after commit failed: {}", e),
        Err(_) => log::warn!("store: closing connection after commit timed out"),
    }
    Ok(report)
}

/// Wraps a store with the single-retry policy: when the first insert fails,
/// wait `backoff` and try once more. No further retries — a persistent
/// outage surfaces to the sender as one failed report.
pub struct RetryingStore<S> {
    inner: S,
    backoff: Duration,
}

impl<S> RetryingStore<S> {
    pub fn new(inner: S, backoff: Duration) -> Self {
        Self { inner, backoff }
    }
}

#[async_trait]
impl<S: ReportStore> ReportStore for RetryingStore<S> {
    async fn insert(&self, people_fed: i64) -> Result<FeedingReport, StoreError> {
        match self.inner.insert(people_fed).await {
            Ok(report) => Ok(report),
            Err(e) => {
                log::warn!("store: insert failed, retrying once in {:?}: {}", self.backoff, e);
                tokio::time::sleep(self.backoff).await;
                self.inner.insert(people_fed).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails the first `failures` inserts, then succeeds. Counts attempts.
    struct FlakyStore {
        failures: usize,
        attempts: AtomicUsize,
    }

    impl FlakyStore {
        fn new(failures: usize) -> Self {
            Self {
                failures,
                attempts: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ReportStore for FlakyStore {
        async fn insert(&self, people_fed: i64) -> Result<FeedingReport, StoreError> {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return Err(StoreError::Timeout(Duration::from_millis(1)));
            }
            Ok(FeedingReport {
                people_fed,
                recorded_at: Utc::now(),
            })
        }
    }

    #[tokio::test]
    async fn retry_succeeds_after_one_failure() {
        let store = RetryingStore::new(FlakyStore::new(1), Duration::from_millis(1));
        let report = store.insert(9).await.expect("second attempt succeeds");
        assert_eq!(report.people_fed, 9);
        assert_eq!(store.inner.attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn no_second_retry() {
        let store = RetryingStore::new(FlakyStore::new(2), Duration::from_millis(1));
        assert!(store.insert(9).await.is_err());
        // Exactly two attempts: the original and one retry.
        assert_eq!(store.inner.attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn no_retry_on_success() {
        let store = RetryingStore::new(FlakyStore::new(0), Duration::from_millis(1));
        let report = store.insert(3).await.expect("insert");
        assert_eq!(report.people_fed, 3);
        assert_eq!(store.inner.attempts.load(Ordering::SeqCst), 1);
    }

    fn committed(people_fed: i64) -> FeedingReport {
        FeedingReport {
            people_fed,
            recorded_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn close_failure_after_commit_is_still_success() {
        let result = release_after_commit(
            committed(12),
            async { Err(sqlx::Error::PoolClosed) },
            Duration::from_millis(10),
        )
        .await;
        assert_eq!(result.expect("committed write").people_fed, 12);
    }

    #[tokio::test]
    async fn hung_close_after_commit_is_still_success() {
        let result = release_after_commit(
            committed(5),
            std::future::pending::<Result<(), sqlx::Error>>(),
            Duration::from_millis(10),
        )
        .await;
        assert_eq!(result.expect("committed write").people_fed, 5);
    }

    /// Commits every insert but fails connection teardown afterwards.
    struct FailingCloseStore {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl ReportStore for FailingCloseStore {
        async fn insert(&self, people_fed: i64) -> Result<FeedingReport, StoreError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            release_after_commit(
                committed(people_fed),
                async { Err(sqlx::Error::PoolClosed) },
                Duration::from_millis(10),
            )
            .await
        }
    }

    #[tokio::test]
    async fn failing_close_does_not_trigger_a_second_insert() {
        // One inbound message must produce exactly one store write even when
        // teardown misbehaves after the row is committed.
        let store = RetryingStore::new(
            FailingCloseStore {
                attempts: AtomicUsize::new(0),
            },
            Duration::from_millis(1),
        );
        let report = store.insert(7).await.expect("committed write");
        assert_eq!(report.people_fed, 7);
        assert_eq!(store.inner.attempts.load(Ordering::SeqCst), 1);
    }
}
