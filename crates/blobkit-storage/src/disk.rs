//! Local disk storage backend

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::backend::{SaveOptions, Storage};
use crate::context::Context;
use crate::error::StorageError;
use crate::key::KeyResolver;

/// Local disk storage backend
///
/// Stores each payload as a file at `<root>/<namespace>/<path>`.
/// Holds no open handles between calls.
#[derive(Debug, Clone)]
pub struct DiskStorage {
    root: PathBuf,
    keys: KeyResolver,
}

impl DiskStorage {
    /// Create a disk backend rooted at `root`. Performs no I/O; directories
    /// are created on first save.
    ///
    /// Locations returned by `save` are `root` joined with the path, so they
    /// are only absolute when `root` is.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            keys: KeyResolver::default(),
        }
    }

    /// Create a disk backend that keeps its files under `<root>/<namespace>`
    pub fn with_namespace(root: impl AsRef<Path>, namespace: &str) -> Result<Self, StorageError> {
        let storage = Self {
            root: root.as_ref().to_path_buf(),
            keys: KeyResolver::new(namespace)?,
        };
        info!(
            "Initialized disk storage at {:?} (namespace: {:?})",
            storage.root,
            storage.keys.prefix()
        );
        Ok(storage)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the file path for a logical path
    fn file_path(&self, path: &str) -> Result<PathBuf, StorageError> {
        self.keys.resolve_under(&self.root, path)
    }
}

/// Temp file next to `path`, so the final rename stays on one filesystem
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4()))
}

async fn write_atomic(path: &Path, temp: &Path, data: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::io("save", parent, e))?;
    }

    let mut file = fs::File::create(temp)
        .await
        .map_err(|e| StorageError::io("save", temp, e))?;
    file.write_all(data)
        .await
        .map_err(|e| StorageError::io("save", temp, e))?;
    file.sync_all()
        .await
        .map_err(|e| StorageError::io("save", temp, e))?;
    drop(file);

    fs::rename(temp, path)
        .await
        .map_err(|e| StorageError::io("save", path, e))
}

#[async_trait]
impl Storage for DiskStorage {
    async fn save(
        &self,
        ctx: &Context,
        path: &str,
        data: Bytes,
        options: &SaveOptions,
    ) -> Result<String, StorageError> {
        let file_path = self.file_path(path)?;
        debug!("Writing {} bytes to {:?}", data.len(), file_path);
        if !options.is_empty() {
            debug!("Disk storage ignores save options {:?}", options);
        }

        let temp = temp_path(&file_path);
        let result = ctx.run("save", write_atomic(&file_path, &temp, &data)).await;

        if result.is_err() {
            match fs::remove_file(&temp).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to clean up temp file {:?}: {}", temp, e),
            }
        }
        result?;

        Ok(file_path.to_string_lossy().to_string())
    }

    async fn get(&self, ctx: &Context, path: &str) -> Result<Option<Bytes>, StorageError> {
        let file_path = self.file_path(path)?;
        debug!("Reading {:?}", file_path);

        ctx.run("get", async {
            match fs::read(&file_path).await {
                Ok(data) => Ok(Some(Bytes::from(data))),
                // A file where a parent directory should be also means nothing is stored here
                Err(e)
                    if matches!(
                        e.kind(),
                        std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory
                    ) =>
                {
                    Ok(None)
                }
                Err(e) => Err(StorageError::io("get", &file_path, e)),
            }
        })
        .await
    }

    async fn delete(&self, ctx: &Context, path: &str) -> Result<(), StorageError> {
        let file_path = self.file_path(path)?;
        debug!("Deleting {:?}", file_path);

        ctx.run("delete", async {
            fs::remove_file(&file_path)
                .await
                .map_err(|e| StorageError::io("delete", &file_path, e))
        })
        .await
    }

    fn describe(&self) -> String {
        format!("disk storage at {}", self.root.display())
    }
}
