//! Object store client seam
//!
//! [`S3Storage`](crate::s3::S3Storage) talks to its bucket only through
//! [`ObjectClient`], so tests can substitute a fake that records requests
//! and returns scripted results.

use async_trait::async_trait;
use bytes::Bytes;
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};
use std::sync::Arc;

use crate::backend::SaveOptions;

/// Minimal object API used by the object-store backend
#[async_trait]
pub trait ObjectClient: Send + Sync {
    /// Upload `data` to `key`, replacing any existing object
    async fn put_object(
        &self,
        key: &ObjectPath,
        data: Bytes,
        options: &SaveOptions,
    ) -> Result<(), object_store::Error>;

    /// Download the object at `key`
    async fn get_object(&self, key: &ObjectPath) -> Result<Bytes, object_store::Error>;

    /// Remove the object at `key`
    async fn delete_object(&self, key: &ObjectPath) -> Result<(), object_store::Error>;
}

/// [`ObjectClient`] backed by any `object_store` implementation
#[derive(Debug, Clone)]
pub struct ObjectStoreClient {
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreClient {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }
}

/// Map save hints to object attributes
fn attributes(options: &SaveOptions) -> Attributes {
    let mut attributes = Attributes::new();
    if let Some(content_type) = &options.content_type {
        attributes.insert(Attribute::ContentType, content_type.clone().into());
    }
    if let Some(content_disposition) = &options.content_disposition {
        attributes.insert(Attribute::ContentDisposition, content_disposition.clone().into());
    }
    attributes
}

#[async_trait]
impl ObjectClient for ObjectStoreClient {
    async fn put_object(
        &self,
        key: &ObjectPath,
        data: Bytes,
        options: &SaveOptions,
    ) -> Result<(), object_store::Error> {
        let opts = PutOptions {
            attributes: attributes(options),
            ..Default::default()
        };
        self.store.put_opts(key, PutPayload::from(data), opts).await?;
        Ok(())
    }

    async fn get_object(&self, key: &ObjectPath) -> Result<Bytes, object_store::Error> {
        self.store.get(key).await?.bytes().await
    }

    async fn delete_object(&self, key: &ObjectPath) -> Result<(), object_store::Error> {
        self.store.delete(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::AttributeValue;
    use object_store::memory::InMemory;

    #[test]
    fn test_attributes_from_options() {
        let attrs = attributes(&SaveOptions::default());
        assert!(attrs.is_empty());

        let attrs = attributes(
            &SaveOptions::new()
                .with_content_type("text/plain")
                .with_content_disposition("inline"),
        );
        assert_eq!(attrs.len(), 2);
        assert_eq!(
            attrs.get(&Attribute::ContentType),
            Some(&AttributeValue::from("text/plain"))
        );
        assert_eq!(
            attrs.get(&Attribute::ContentDisposition),
            Some(&AttributeValue::from("inline"))
        );
    }

    #[tokio::test]
    async fn test_put_stores_attributes() {
        let store = Arc::new(InMemory::new());
        let client = ObjectStoreClient::new(store.clone());
        let key = ObjectPath::from("svc/report.csv");

        client
            .put_object(
                &key,
                Bytes::from_static(b"a,b"),
                &SaveOptions::new().with_content_type("text/csv"),
            )
            .await
            .unwrap();

        let result = store.get(&key).await.unwrap();
        assert_eq!(
            result.attributes.get(&Attribute::ContentType),
            Some(&AttributeValue::from("text/csv"))
        );
        assert_eq!(&result.bytes().await.unwrap()[..], b"a,b");
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let client = ObjectStoreClient::new(Arc::new(InMemory::new()));
        let err = client.get_object(&ObjectPath::from("nope")).await.unwrap_err();
        assert!(matches!(err, object_store::Error::NotFound { .. }));
    }
}
