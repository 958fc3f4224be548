//! Batch image resizer for store listings
//!
//! Accepts a multipart upload of images, resizes each one to a target size
//! with a chosen fit policy, zips the PNG outputs and publishes the archive
//! to object storage, answering with a downloadable URL.

pub mod archive;
pub mod engine;
pub mod error;
pub mod image;
pub mod intake;
pub mod models;
pub mod server;
pub mod storage;

pub use error::{Error, Result};
