//! Storage configuration types
//!
//! Loaded by the application from its own config file; the factory only
//! reads them.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::StorageError;

/// Backend kinds understood by [`new_storage`](crate::new_storage)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    Disk,
    ObjectStore,
}

impl FromStr for StorageType {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disk" | "local" => Ok(StorageType::Disk),
            "object-store" | "object_store" | "s3" => Ok(StorageType::ObjectStore),
            _ => Err(StorageError::UnsupportedBackend(s.to_string())),
        }
    }
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageType::Disk => f.write_str("disk"),
            StorageType::ObjectStore => f.write_str("object-store"),
        }
    }
}

/// Storage configuration
///
/// `type` selects the backend; only the matching sub-section is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(rename = "type", default = "default_backend")]
    pub backend: String,
    #[serde(default)]
    pub disk: DiskConfig,
    #[serde(default)]
    pub object_store: ObjectStoreConfig,
}

impl StorageConfig {
    /// Parse the backend discriminator
    pub fn storage_type(&self) -> Result<StorageType, StorageError> {
        self.backend.parse()
    }

    pub fn disk(root_dir: impl Into<String>) -> Self {
        Self {
            backend: StorageType::Disk.to_string(),
            disk: DiskConfig {
                root_dir: root_dir.into(),
            },
            object_store: ObjectStoreConfig::default(),
        }
    }

    pub fn object_store(bucket_name: impl Into<String>) -> Self {
        Self {
            backend: StorageType::ObjectStore.to_string(),
            disk: DiskConfig::default(),
            object_store: ObjectStoreConfig {
                bucket_name: bucket_name.into(),
                ..Default::default()
            },
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            disk: DiskConfig::default(),
            object_store: ObjectStoreConfig::default(),
        }
    }
}

/// Local disk configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskConfig {
    #[serde(default = "default_root_dir")]
    pub root_dir: String,
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
        }
    }
}

/// S3 storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    /// S3 bucket name
    #[serde(default)]
    pub bucket_name: String,
    /// S3 region (e.g., "us-east-1")
    #[serde(default = "default_region")]
    pub region: String,
    /// S3 endpoint URL (for MinIO or other S3-compatible services)
    #[serde(default)]
    pub endpoint: Option<String>,
    /// AWS access key ID
    #[serde(default)]
    pub access_key_id: Option<String>,
    /// AWS secret access key
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// Allow HTTP (not HTTPS) connections
    #[serde(default)]
    pub allow_http: bool,
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            bucket_name: String::new(),
            region: default_region(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            allow_http: false,
        }
    }
}

fn default_backend() -> String {
    "disk".to_string()
}

fn default_root_dir() -> String {
    "./data/blobs".to_string()
}

fn default_region() -> String {
    "ap-northeast-1".to_string()
}
