//! Storage backends for cached thumbnails.
//!
//! A backend is a byte-addressable store keyed by the canonical relative
//! key. The existence check is what makes repeated resolutions cheap: a key
//! that is already stored is never regenerated.

pub mod fs;
pub mod mock;
pub mod s3;

pub use fs::FsStorage;
pub use mock::MockStorage;
pub use s3::S3Storage;

use crate::Result;
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool>;
    async fn read(&self, key: &str) -> Result<Vec<u8>>;
    async fn write(&self, key: &str, data: &[u8]) -> Result<()>;
}

/// A store that advertises a filesystem location and a public base URL, so
/// files it owns can serve as [`StoredSource`](crate::source::StoredSource)
/// roots.
pub trait LocatedStore {
    fn location(&self) -> &Path;
    fn base_url(&self) -> &str;
}
