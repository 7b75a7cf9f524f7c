//! blobkit storage layer
//!
//! A single [`Storage`] contract for saving, reading, deleting and
//! health-checking opaque payloads, with local disk and S3-compatible
//! backends selected at runtime by [`new_storage`].

pub mod backend;
pub mod client;
pub mod config;
pub mod context;
pub mod disk;
pub mod error;
pub mod factory;
pub mod key;
pub mod s3;

pub use backend::{PROBE_KEY, SaveOptions, Storage};
pub use client::{ObjectClient, ObjectStoreClient};
pub use config::{DiskConfig, ObjectStoreConfig, StorageConfig, StorageType};
pub use context::Context;
pub use disk::DiskStorage;
pub use error::{HealthCheckError, ProbeStep, StorageError};
pub use factory::new_storage;
pub use key::KeyResolver;
pub use s3::S3Storage;
