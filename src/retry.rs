//! Fixed-count retry for idempotent reads.
//!
//! Shared by both remote clients. Only reads go through here; writes are
//! issued exactly once — the members-count update is a read-modify-write
//! and a blind retry could double-apply it.

use std::future::Future;

use crate::error::{Error, Result};

/// Run an idempotent read, retrying up to `retries` extra times on
/// recoverable failure. Non-recoverable errors surface immediately.
pub(crate) async fn retry_read<T, F, Fut>(retries: u32, what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_err = None;
    for attempt in 0..=retries {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_recoverable() && attempt < retries => {
                tracing::warn!(
                    what,
                    attempt = attempt + 1,
                    error = %e,
                    "Read failed, retrying"
                );
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| Error::Network(what.to_string())))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_recoverable_error_tried_fixed_count_then_surfaced() {
        let attempts = AtomicU32::new(0);
        let result: Result<()> = retry_read(2, "directory read", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::Network("unreachable".into())) }
        })
        .await;

        assert!(matches!(result, Err(Error::Network(_))));
        // One initial attempt plus exactly `retries` retries.
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_recoverable_error_not_retried() {
        let attempts = AtomicU32::new(0);
        let result: Result<()> = retry_read(2, "directory read", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::Validation("bad".into())) }
        })
        .await;

        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_success_after_transient_failure() {
        let attempts = AtomicU32::new(0);
        let result = retry_read(2, "attribute fetch", || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(Error::Timeout("5s".into()))
                } else {
                    Ok(7u64)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_retries_means_single_attempt() {
        let attempts = AtomicU32::new(0);
        let result: Result<()> = retry_read(0, "directory read", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::Network("unreachable".into())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
