//! Lazily dialed, process-wide database connection.
//!
//! The first caller dials; concurrent first callers wait on the same
//! attempt instead of opening their own connection. Once established the
//! handle is shared read-only until [`Connector::reset`] drops it.

use async_trait::async_trait;
use metrics::counter;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

/// Opens a connection to a store.
#[async_trait]
pub trait Dialer: Send + Sync {
    /// Cheaply clonable handle to an open connection.
    type Handle: Clone + Send + Sync + 'static;

    async fn dial(&self, url: &str) -> StoreResult<Self::Handle>;
}

/// Memoizes the handle produced by a [`Dialer`].
pub struct Connector<D: Dialer> {
    dialer: D,
    handle: RwLock<Option<D::Handle>>,
}

impl<D: Dialer> Connector<D> {
    pub fn new(dialer: D) -> Self {
        Self {
            dialer,
            handle: RwLock::new(None),
        }
    }

    /// Return the live handle, dialing `url` if there is none yet.
    ///
    /// A failed dial leaves the connector empty, so the next call retries.
    pub async fn ensure_connected(&self, url: &str) -> StoreResult<D::Handle> {
        // Fast path: already connected
        {
            let handle = self.handle.read().await;
            if let Some(handle) = handle.as_ref() {
                return Ok(handle.clone());
            }
        }

        let mut slot = self.handle.write().await;

        // Another task may have connected while we waited for the write lock
        if let Some(handle) = slot.as_ref() {
            return Ok(handle.clone());
        }

        if url.trim().is_empty() {
            return Err(StoreError::InvalidConnectionString(
                "connection string is empty".to_string(),
            ));
        }

        debug!("Dialing database");
        match self.dialer.dial(url).await {
            Ok(handle) => {
                counter!("jobify_db_connect_total", "outcome" => "ok").increment(1);
                info!("Database connection established");
                *slot = Some(handle.clone());
                Ok(handle)
            }
            Err(e) => {
                counter!("jobify_db_connect_total", "outcome" => "error").increment(1);
                warn!("Database connection failed: {}", e);
                Err(e)
            }
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.handle.read().await.is_some()
    }

    /// Drop the memoized handle and return it, if any.
    pub async fn reset(&self) -> Option<D::Handle> {
        self.handle.write().await.take()
    }

    pub fn dialer(&self) -> &D {
        &self.dialer
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::task::JoinSet;

    use super::*;

    /// Dialer that counts attempts and takes a while to answer.
    #[derive(Default)]
    struct CountingDialer {
        attempts: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Dialer for CountingDialer {
        type Handle = usize;

        async fn dial(&self, _url: &str) -> StoreResult<usize> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.fail {
                Err(StoreError::connection("unreachable"))
            } else {
                Ok(attempt)
            }
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_dial() {
        let connector = Arc::new(Connector::new(CountingDialer::default()));
        let mut tasks = JoinSet::new();

        for _ in 0..32 {
            let connector = Arc::clone(&connector);
            tasks.spawn(async move { connector.ensure_connected("mongodb://db").await });
        }

        while let Some(result) = tasks.join_next().await {
            assert_eq!(result.unwrap().unwrap(), 1);
        }
        assert_eq!(connector.dialer().attempts.load(Ordering::SeqCst), 1);
        assert!(connector.is_connected().await);
    }

    #[tokio::test]
    async fn test_repeated_calls_reuse_handle() {
        let connector = Connector::new(CountingDialer::default());
        for _ in 0..5 {
            connector.ensure_connected("mongodb://db").await.unwrap();
        }
        assert_eq!(connector.dialer().attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reset_forces_redial() {
        let connector = Connector::new(CountingDialer::default());
        assert_eq!(connector.ensure_connected("mongodb://db").await.unwrap(), 1);

        assert_eq!(connector.reset().await, Some(1));
        assert!(!connector.is_connected().await);

        assert_eq!(connector.ensure_connected("mongodb://db").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_failed_dial_is_retried() {
        let connector = Connector::new(CountingDialer {
            fail: true,
            ..Default::default()
        });

        let err = connector.ensure_connected("mongodb://db").await.unwrap_err();
        assert!(err.is_connection());
        assert!(!connector.is_connected().await);

        connector.ensure_connected("mongodb://db").await.unwrap_err();
        assert_eq!(connector.dialer().attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_url_is_rejected_without_dialing() {
        let connector = Connector::new(CountingDialer::default());
        let err = connector.ensure_connected("  ").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidConnectionString(_)));
        assert_eq!(connector.dialer().attempts.load(Ordering::SeqCst), 0);
    }
}
