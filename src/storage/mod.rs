//! Object storage for finished archives
//!
//! Uploads are public-read and addressed by name; every backend hands back a
//! URL the caller can fetch directly.

pub mod blob;
pub mod discard;
pub mod memory;
pub mod s3;

pub use blob::BlobStore;
pub use discard::DiscardStore;
pub use memory::MemoryStore;
pub use s3::S3Store;

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `data` under `name` with public read access and returns its URL.
    async fn put(&self, name: &str, data: &[u8], content_type: &str) -> Result<String>;
}
