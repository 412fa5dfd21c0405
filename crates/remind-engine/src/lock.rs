//! Cycle lock boundary.
//!
//! Exactly one poll cycle may run at a time across all process instances.
//! The trait is the seam for a distributed implementation; ProcessLock
//! covers single-instance deployments and tests.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use uuid::Uuid;

use remind_core::{RemindError, Result};

/// Proof of acquisition, passed back on release.
pub type LockCode = Uuid;

/// Serializes poll cycles across process instances.
///
/// A held lock expires after the implementation's timeout so a crashed
/// holder cannot starve every other instance indefinitely.
#[async_trait]
pub trait CycleLock: Send + Sync {
    /// Try to acquire the lock. `Ok(None)` means it is held elsewhere.
    async fn acquire(&self) -> Result<Option<LockCode>>;

    /// Release a previously acquired lock. `Ok(false)` means the code no
    /// longer matched (the lock expired and was taken by someone else).
    async fn release(&self, code: LockCode) -> Result<bool>;
}

/// In-process lock for single-instance deployments.
pub struct ProcessLock {
    timeout: Duration,
    state: Mutex<Option<(LockCode, Instant)>>,
}

impl ProcessLock {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            state: Mutex::new(None),
        }
    }
}

#[async_trait]
impl CycleLock for ProcessLock {
    async fn acquire(&self) -> Result<Option<LockCode>> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| RemindError::Lock(e.to_string()))?;
        if let Some((_, acquired_at)) = *state {
            if acquired_at.elapsed() < self.timeout {
                return Ok(None);
            }
            tracing::warn!("Expired cycle lock reclaimed");
        }
        let code = Uuid::new_v4();
        *state = Some((code, Instant::now()));
        Ok(Some(code))
    }

    async fn release(&self, code: LockCode) -> Result<bool> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| RemindError::Lock(e.to_string()))?;
        match *state {
            Some((held, _)) if held == code => {
                *state = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_and_release() {
        let lock = ProcessLock::new(Duration::from_secs(120));
        let code = lock.acquire().await.unwrap().expect("should acquire");
        assert!(lock.release(code).await.unwrap());
    }

    #[tokio::test]
    async fn test_second_acquire_fails_while_held() {
        let lock = ProcessLock::new(Duration::from_secs(120));
        let code = lock.acquire().await.unwrap().unwrap();
        assert!(lock.acquire().await.unwrap().is_none());
        lock.release(code).await.unwrap();
        assert!(lock.acquire().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_expired_lock_is_reclaimed() {
        let lock = ProcessLock::new(Duration::from_millis(0));
        let stale = lock.acquire().await.unwrap().unwrap();
        // Zero timeout: the next acquire reclaims immediately.
        let fresh = lock.acquire().await.unwrap().unwrap();
        assert_ne!(stale, fresh);
        // The stale code no longer releases anything.
        assert!(!lock.release(stale).await.unwrap());
        assert!(lock.release(fresh).await.unwrap());
    }

    #[tokio::test]
    async fn test_release_with_wrong_code_is_noop() {
        let lock = ProcessLock::new(Duration::from_secs(120));
        let code = lock.acquire().await.unwrap().unwrap();
        assert!(!lock.release(Uuid::new_v4()).await.unwrap());
        // Still held by the original code.
        assert!(lock.acquire().await.unwrap().is_none());
        assert!(lock.release(code).await.unwrap());
    }
}
