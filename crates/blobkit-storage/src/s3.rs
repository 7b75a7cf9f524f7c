//! S3-compatible storage backend
//!
//! Uses the `object_store` crate to talk to AWS S3, MinIO and other
//! S3-compatible services. Every object key is prefixed with the
//! namespace the backend was created for.

use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use std::sync::Arc;
use tracing::{debug, info};

use crate::backend::{SaveOptions, Storage};
use crate::client::{ObjectClient, ObjectStoreClient};
use crate::config::ObjectStoreConfig;
use crate::context::Context;
use crate::error::StorageError;
use crate::key::KeyResolver;

/// Scheme used in locations returned by [`S3Storage::save`](Storage::save)
pub const LOCATION_SCHEME: &str = "s3";

/// S3 storage backend
///
/// Stores payloads in a bucket at `<namespace>/<path>`.
pub struct S3Storage {
    bucket: String,
    keys: KeyResolver,
    client: Arc<dyn ObjectClient>,
}

impl S3Storage {
    /// Create a backend over an existing client
    pub fn new(
        bucket: impl Into<String>,
        namespace: &str,
        client: Arc<dyn ObjectClient>,
    ) -> Result<Self, StorageError> {
        Ok(Self {
            bucket: bucket.into(),
            keys: KeyResolver::new(namespace)?,
            client,
        })
    }

    /// Build an Amazon S3 client from configuration.
    ///
    /// Credentials not set in `config` are taken from the standard `AWS_*`
    /// environment variables or the instance metadata service. No request
    /// is made until the first operation.
    pub fn from_config(config: &ObjectStoreConfig, namespace: &str) -> Result<Self, StorageError> {
        if config.bucket_name.is_empty() {
            return Err(StorageError::Configuration(
                "object store bucket_name is not set".to_string(),
            ));
        }

        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(&config.bucket_name)
            .with_region(&config.region);

        // Set endpoint for MinIO or other S3-compatible services
        if let Some(endpoint) = &config.endpoint {
            builder = builder.with_endpoint(endpoint);
        }

        if let Some(access_key) = &config.access_key_id {
            builder = builder.with_access_key_id(access_key);
        }
        if let Some(secret_key) = &config.secret_access_key {
            builder = builder.with_secret_access_key(secret_key);
        }

        if config.allow_http {
            builder = builder.with_allow_http(true);
        }

        let store = builder.build().map_err(|e| {
            StorageError::Configuration(format!("Failed to create S3 client: {}", e))
        })?;

        let storage = Self::new(
            config.bucket_name.clone(),
            namespace,
            Arc::new(ObjectStoreClient::new(Arc::new(store))),
        )?;

        info!(
            "Initialized S3 storage: bucket={}, region={}, endpoint={:?}, prefix={:?}",
            config.bucket_name,
            config.region,
            config.endpoint,
            storage.keys.prefix()
        );

        Ok(storage)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Get the object key for a logical path
    fn object_key(&self, path: &str) -> Result<ObjectPath, StorageError> {
        let key = self.keys.resolve(path)?;
        ObjectPath::parse(&key)
            .map_err(|e| StorageError::InvalidPath(format!("Invalid object key {:?}: {}", key, e)))
    }

    fn location(&self, key: &ObjectPath) -> String {
        format!("{}://{}/{}", LOCATION_SCHEME, self.bucket, key)
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn save(
        &self,
        ctx: &Context,
        path: &str,
        data: Bytes,
        options: &SaveOptions,
    ) -> Result<String, StorageError> {
        let key = self.object_key(path)?;
        debug!("Writing {} bytes to S3: {}", data.len(), self.location(&key));

        ctx.run("save", async {
            self.client
                .put_object(&key, data, options)
                .await
                .map_err(|e| StorageError::remote("save", &key, e))
        })
        .await?;

        Ok(self.location(&key))
    }

    async fn get(&self, ctx: &Context, path: &str) -> Result<Option<Bytes>, StorageError> {
        let key = self.object_key(path)?;
        debug!("Reading from S3: {}", self.location(&key));

        ctx.run("get", async {
            match self.client.get_object(&key).await {
                Ok(data) => Ok(Some(data)),
                Err(object_store::Error::NotFound { .. }) => Ok(None),
                Err(e) => Err(StorageError::remote("get", &key, e)),
            }
        })
        .await
    }

    async fn delete(&self, ctx: &Context, path: &str) -> Result<(), StorageError> {
        let key = self.object_key(path)?;
        debug!("Deleting from S3: {}", self.location(&key));

        ctx.run("delete", async {
            self.client
                .delete_object(&key)
                .await
                .map_err(|e| StorageError::remote("delete", &key, e))
        })
        .await
    }

    fn describe(&self) -> String {
        match self.keys.prefix() {
            Some(prefix) => format!("S3 storage at {}://{}/{}", LOCATION_SCHEME, self.bucket, prefix),
            None => format!("S3 storage at {}://{}", LOCATION_SCHEME, self.bucket),
        }
    }
}
