//! Backend selection

use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::backend::Storage;
use crate::config::{StorageConfig, StorageType};
use crate::disk::DiskStorage;
use crate::error::StorageError;
use crate::s3::S3Storage;

/// Build the backend selected by `config.type`.
///
/// `namespace` scopes everything the returned storage touches: it becomes
/// the key prefix for object storage and a sub-directory of the root
/// directory for disk storage.
pub fn new_storage(namespace: &str, config: &StorageConfig) -> Result<Arc<dyn Storage>, StorageError> {
    let storage: Arc<dyn Storage> = match config.storage_type()? {
        StorageType::Disk => Arc::new(DiskStorage::with_namespace(
            Path::new(&config.disk.root_dir),
            namespace,
        )?),
        StorageType::ObjectStore => Arc::new(S3Storage::from_config(&config.object_store, namespace)?),
    };

    info!("Using {}", storage.describe());
    Ok(storage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SaveOptions;
    use crate::context::Context;
    use bytes::Bytes;

    #[test]
    fn test_disk_dispatch() {
        let storage = new_storage("svc", &StorageConfig::disk("/tmp/x")).unwrap();
        assert_eq!(storage.describe(), "disk storage at /tmp/x");
    }

    #[test]
    fn test_object_store_dispatch() {
        let mut config = StorageConfig::object_store("test");
        config.object_store.access_key_id = Some("key".to_string());
        config.object_store.secret_access_key = Some("secret".to_string());

        let storage = new_storage("svc", &config).unwrap();
        assert_eq!(storage.describe(), "S3 storage at s3://test/svc");
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let config = StorageConfig {
            backend: "bogus".to_string(),
            ..Default::default()
        };

        match new_storage("svc", &config) {
            Err(StorageError::UnsupportedBackend(name)) => assert_eq!(name, "bogus"),
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[test]
    fn test_invalid_namespace_rejected() {
        let result = new_storage("../escape", &StorageConfig::disk("/tmp/x"));
        assert!(matches!(result, Err(StorageError::InvalidPath(_))));
    }

    #[tokio::test]
    async fn test_disk_storage_from_factory_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig::disk(dir.path().to_string_lossy());
        let ctx = Context::background();

        let storage = new_storage("svc", &config).unwrap();
        let location = storage
            .save(&ctx, "a/b.txt", Bytes::from_static(b"hi"), &SaveOptions::default())
            .await
            .unwrap();
        assert_eq!(location, dir.path().join("svc/a/b.txt").to_string_lossy());

        assert_eq!(
            storage.get(&ctx, "a/b.txt").await.unwrap(),
            Some(Bytes::from_static(b"hi"))
        );
        storage.ping(&ctx).await.unwrap();

        let other = new_storage("other", &config).unwrap();
        assert_eq!(other.get(&ctx, "a/b.txt").await.unwrap(), None);
    }
}
