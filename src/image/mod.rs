//! Image resizing and PNG encoding
//!
//! Decodes an uploaded raster, maps it onto the requested dimensions using a
//! [`FitMode`] and re-encodes the result as PNG.

pub mod mock;
pub mod processor;

pub use mock::MockImageResizer;
pub use processor::{cover_crop, fit_dimensions, ImageProcessor};

use crate::models::FitMode;
use crate::Result;

/// Target geometry for a single resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeSpec {
    pub width: u32,
    pub height: u32,
    pub fit: FitMode,
}

/// Resizes one encoded image into PNG bytes.
///
/// Implementations are CPU bound and synchronous; the engine runs them on the
/// blocking pool, one task per image.
pub trait ImageResizer: Send + Sync {
    fn resize(&self, image_data: &[u8], spec: ResizeSpec) -> Result<Vec<u8>>;
}
