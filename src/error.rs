//! Error handling and custom error types
//!
//! Provides unified error handling across the service using thiserror. Every
//! variant collapses into one of three caller-facing kinds, see [`ErrorKind`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Object storage error: {0}")]
    Storage(String),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Failed to resize '{name}': {message}")]
    Resize { name: String, message: String },

    #[error("Unsupported fit mode '{0}'")]
    UnsupportedFitMode(String),

    #[error("Target dimensions {width}x{height} exceed the maximum of {max}")]
    DimensionsTooLarge { width: u32, height: u32, max: u32 },

    #[error("Resizing to {width}x{height} exceeds the processing budget of {max_pixels} pixels")]
    OutputTooLarge {
        width: u32,
        height: u32,
        max_pixels: u64,
    },

    #[error("{0}")]
    MalformedRequest(String),

    #[error("No files provided")]
    NoFilesProvided,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invariant violated: {0}")]
    Invariant(String),
}

/// The caller-facing failure taxonomy of a resize job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The body could not be parsed as multipart form data.
    MalformedRequest,
    /// The form parsed but carried no usable files.
    NoFilesProvided,
    /// Anything that went wrong while decoding, resizing, packaging or uploading.
    ProcessingFailed,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MalformedRequest(_) => ErrorKind::MalformedRequest,
            Error::NoFilesProvided => ErrorKind::NoFilesProvided,
            _ => ErrorKind::ProcessingFailed,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            Error::MalformedRequest("bad boundary".to_string()).kind(),
            ErrorKind::MalformedRequest
        );
        assert_eq!(Error::NoFilesProvided.kind(), ErrorKind::NoFilesProvided);
        assert_eq!(
            Error::Storage("denied".to_string()).kind(),
            ErrorKind::ProcessingFailed
        );
        assert_eq!(
            Error::UnsupportedFitMode("stretch".to_string()).kind(),
            ErrorKind::ProcessingFailed
        );
        assert_eq!(
            Error::OutputTooLarge {
                width: 4000,
                height: 16_000_000,
                max_pixels: 1 << 26,
            }
            .kind(),
            ErrorKind::ProcessingFailed
        );
    }

    #[test]
    fn test_resize_error_message_names_file() {
        let err = Error::Resize {
            name: "broken.jpg".to_string(),
            message: "unexpected end of file".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to resize 'broken.jpg': unexpected end of file"
        );
    }
}
