//! Storage contract shared by every backend

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::context::Context;
use crate::error::{HealthCheckError, ProbeStep, StorageError};

/// Key written, read back and removed by [`Storage::ping`]
pub const PROBE_KEY: &str = "ping";

/// Payload written by [`Storage::ping`]
pub const PROBE_PAYLOAD: &[u8] = b"test";

/// Optional metadata hints for [`Storage::save`]
///
/// Backends that cannot store a hint ignore it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOptions {
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
}

impl SaveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_content_disposition(mut self, content_disposition: impl Into<String>) -> Self {
        self.content_disposition = Some(content_disposition.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.content_type.is_none() && self.content_disposition.is_none()
    }
}

/// Blob storage contract
///
/// Implementations store opaque payloads under caller-supplied logical
/// paths. A missing object is not an error: [`Storage::get`] returns
/// `Ok(None)` for it on every backend.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` at `path`, replacing any existing payload.
    /// Returns the backend-specific location of the stored object.
    async fn save(
        &self,
        ctx: &Context,
        path: &str,
        data: Bytes,
        options: &SaveOptions,
    ) -> Result<String, StorageError>;

    /// Read the payload at `path`, or `None` if nothing is stored there
    async fn get(&self, ctx: &Context, path: &str) -> Result<Option<Bytes>, StorageError>;

    /// Remove the payload at `path`
    async fn delete(&self, ctx: &Context, path: &str) -> Result<(), StorageError>;

    /// Human readable description of the backend, for logs
    fn describe(&self) -> String;

    /// Write, read back and delete a probe object.
    ///
    /// Cancellation is reported as-is; every other failure is wrapped in
    /// [`StorageError::HealthCheck`].
    async fn ping(&self, ctx: &Context) -> Result<(), StorageError> {
        debug!("Pinging {}", self.describe());

        let location = self
            .save(ctx, PROBE_KEY, Bytes::from_static(PROBE_PAYLOAD), &SaveOptions::default())
            .await
            .map_err(|e| probe_failure(ProbeStep::Write, e))?;

        let data = self
            .get(ctx, PROBE_KEY)
            .await
            .map_err(|e| probe_failure(ProbeStep::Read, e))?;

        if data.is_none_or(|d| d.is_empty()) {
            return Err(HealthCheckError::Inconsistent { location }.into());
        }

        self.delete(ctx, PROBE_KEY)
            .await
            .map_err(|e| probe_failure(ProbeStep::Delete, e))?;

        Ok(())
    }
}

fn probe_failure(step: ProbeStep, err: StorageError) -> StorageError {
    if err.is_cancelled() {
        return err;
    }
    HealthCheckError::Step {
        step,
        source: Box::new(err),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_options_builder() {
        let options = SaveOptions::new()
            .with_content_type("application/pdf")
            .with_content_disposition("attachment; filename=\"001.pdf\"");

        assert_eq!(options.content_type.as_deref(), Some("application/pdf"));
        assert_eq!(
            options.content_disposition.as_deref(),
            Some("attachment; filename=\"001.pdf\"")
        );
        assert!(!options.is_empty());
        assert!(SaveOptions::default().is_empty());
    }

    #[test]
    fn test_probe_failure_keeps_cancellation() {
        let err = probe_failure(ProbeStep::Read, StorageError::Cancelled { op: "get" });
        assert!(matches!(err, StorageError::Cancelled { .. }));

        let err = probe_failure(ProbeStep::Delete, StorageError::InvalidPath("x".into()));
        assert!(matches!(
            err,
            StorageError::HealthCheck(HealthCheckError::Step {
                step: ProbeStep::Delete,
                ..
            })
        ));
    }
}
