//! Cancellation and deadline propagation
//!
//! Every storage operation takes a [`Context`]. When the context is
//! cancelled or its deadline passes, the in-flight I/O future is dropped
//! and the operation fails with [`StorageError::Cancelled`] or
//! [`StorageError::DeadlineExceeded`].

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::StorageError;

/// Cancellation token plus an optional deadline
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline
    pub fn background() -> Self {
        Self::default()
    }

    /// Wrap an existing cancellation token
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Derive a context that also expires after `timeout`.
    ///
    /// The earlier of the parent's deadline and the new one wins.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a context that also expires at `deadline`
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Derive a context that is cancelled with this one but can also be
    /// cancelled on its own
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancel this context and every context derived from it
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Check the context before starting work
    pub fn check(&self, op: &'static str) -> Result<(), StorageError> {
        if self.token.is_cancelled() {
            return Err(StorageError::Cancelled { op });
        }
        if let Some(deadline) = self.deadline
            && Instant::now() >= deadline
        {
            return Err(StorageError::DeadlineExceeded { op });
        }
        Ok(())
    }

    /// Run `fut` under this context.
    ///
    /// `fut` is dropped as soon as the context is cancelled or its deadline
    /// passes. Cancellation wins over a result that becomes ready in the same
    /// poll.
    pub async fn run<T, F>(&self, op: &'static str, fut: F) -> Result<T, StorageError>
    where
        F: Future<Output = Result<T, StorageError>>,
    {
        self.check(op)?;

        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(StorageError::Cancelled { op }),
            _ = expired => Err(StorageError::DeadlineExceeded { op }),
            result = fut => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_background_runs_to_completion() {
        let ctx = Context::background();
        let value = ctx.run("test", async { Ok::<_, StorageError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_already_cancelled_fails_fast() {
        let ctx = Context::background();
        ctx.cancel();

        let err = ctx
            .run("save", async { Ok::<_, StorageError>(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Cancelled { op: "save" }));
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_mid_flight_aborts_future() {
        let ctx = Context::background();
        let canceller = ctx.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let err = ctx
            .run("get", async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, StorageError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Cancelled { op: "get" }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_exceeded() {
        let ctx = Context::background().with_timeout(Duration::from_millis(50));

        let err = ctx
            .run("delete", async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, StorageError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::DeadlineExceeded { op: "delete" }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_deadline_fails_before_running() {
        let ctx = Context::background().with_timeout(Duration::from_millis(10));
        tokio::time::advance(Duration::from_millis(20)).await;

        let err = ctx.check("ping").unwrap_err();
        assert!(matches!(err, StorageError::DeadlineExceeded { op: "ping" }));
    }

    #[test]
    fn test_child_deadline_never_extends_parent() {
        let parent = Context::background().with_timeout(Duration::from_secs(1));
        let child = parent.with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[test]
    fn test_parent_cancel_propagates_to_child() {
        let parent = Context::background();
        let child = parent.child();
        parent.cancel();
        assert!(child.is_cancelled());

        let other = Context::background();
        let other_child = other.child();
        other_child.cancel();
        assert!(!other.is_cancelled());
    }
}
