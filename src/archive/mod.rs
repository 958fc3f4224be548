//! Archive packaging
//!
//! Bundles resized artifacts into a single compressed container.

pub mod writer;

pub use writer::ZipArchiver;

use crate::models::{PackagedArchive, ResizedArtifact};
use crate::Result;

pub trait Archiver: Send + Sync {
    /// Packs `entries` in order, each stored under its `file_name`.
    fn archive(&self, entries: &[ResizedArtifact]) -> Result<PackagedArchive>;

    /// MIME type of the produced container.
    fn content_type(&self) -> &'static str;
}
