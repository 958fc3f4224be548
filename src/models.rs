//! Data models and structures
//!
//! Defines the values that flow through a resize job (input, artifacts,
//! archive, upload descriptor), the JSON response shape and the service
//! configuration.

use crate::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_WIDTH: u32 = 1280;
pub const DEFAULT_HEIGHT: u32 = 720;

/// Largest accepted target or output side.
pub const DEFAULT_MAX_DIMENSION: u32 = 16384;

/// Pixel budget for a single resample, 8192x8192.
pub const DEFAULT_MAX_OUTPUT_PIXELS: u64 = 8192 * 8192;

/// How a source raster is mapped onto the target width/height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Fill both dimensions, cropping the overflow.
    #[default]
    Cover,
    /// Fit within both dimensions, letterboxing the remainder.
    Contain,
    /// Stretch to the exact dimensions.
    Fill,
    /// Shrink to fit within the dimensions, never enlarge.
    Inside,
    /// Enlarge to cover the dimensions, never shrink.
    Outside,
}

impl FitMode {
    pub const ALL: [FitMode; 5] = [
        FitMode::Cover,
        FitMode::Contain,
        FitMode::Fill,
        FitMode::Inside,
        FitMode::Outside,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FitMode::Cover => "cover",
            FitMode::Contain => "contain",
            FitMode::Fill => "fill",
            FitMode::Inside => "inside",
            FitMode::Outside => "outside",
        }
    }

    /// Resolves the raw `format` form field. Absent or blank means `cover`.
    pub fn from_field(raw: Option<&str>) -> Result<Self> {
        match raw.map(str::trim) {
            None | Some("") => Ok(FitMode::default()),
            Some(value) => value.parse(),
        }
    }
}

impl FromStr for FitMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        FitMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| Error::UnsupportedFitMode(s.to_string()))
    }
}

impl fmt::Display for FitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named store-listing sizes offered by the upload UI, served at `GET /api/presets`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Preset {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
}

pub const PRESETS: [Preset; 4] = [
    Preset {
        name: "store-icon",
        width: 128,
        height: 128,
    },
    Preset {
        name: "screenshot",
        width: 1280,
        height: 800,
    },
    Preset {
        name: "small-promo-tile",
        width: 440,
        height: 280,
    },
    Preset {
        name: "marquee-promo-tile",
        width: 1400,
        height: 560,
    },
];

/// One uploaded file, already read into memory.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ResizeJobInput {
    pub images: Vec<SourceImage>,
    pub width: u32,
    pub height: u32,
    pub fit: FitMode,
}

impl ResizeJobInput {
    pub fn new(images: Vec<SourceImage>, width: u32, height: u32, fit: FitMode) -> Result<Self> {
        if images.is_empty() {
            return Err(Error::NoFilesProvided);
        }
        if width == 0 || height == 0 {
            return Err(Error::Invariant(format!(
                "Target dimensions must be positive, got {}x{}",
                width, height
            )));
        }

        Ok(Self {
            images,
            width,
            height,
            fit,
        })
    }
}

/// Archive entry name for the image at `index` (0-based) in input order.
pub fn artifact_file_name(index: usize, width: u32, height: u32) -> String {
    format!("icon-{}-{}x{}.png", index + 1, width, height)
}

/// Time-based object name for an uploaded archive.
pub fn archive_file_name(epoch_millis: i64) -> String {
    format!("resized_images_{}.zip", epoch_millis)
}

#[derive(Debug, Clone)]
pub struct ResizedArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct PackagedArchive {
    pub bytes: Vec<u8>,
    pub total_entries: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadDescriptor {
    pub url: String,
    pub file_name: String,
    pub byte_size: usize,
}

#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub descriptor: UploadDescriptor,
    pub total_images: usize,
}

impl JobOutcome {
    pub fn summary(&self) -> String {
        format!(
            "Zip file with {} resized images uploaded successfully",
            self.total_images
        )
    }
}

/// Success body of `POST /api/resize`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeResponse {
    pub success: bool,
    pub message: String,
    pub zip_url: String,
    pub file_name: String,
    pub total_images: usize,
    pub zip_size: usize,
}

impl From<JobOutcome> for ResizeResponse {
    fn from(outcome: JobOutcome) -> Self {
        Self {
            success: true,
            message: outcome.summary(),
            zip_url: outcome.descriptor.url,
            file_name: outcome.descriptor.file_name,
            total_images: outcome.total_images,
            zip_size: outcome.descriptor.byte_size,
        }
    }
}

/// Failure body for no-files and processing failures.
#[derive(Debug, Clone, Serialize)]
pub struct FailureResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Failure body for requests that were not valid multipart.
#[derive(Debug, Clone, Serialize)]
pub struct ParseFailureResponse {
    pub error: String,
    pub details: String,
}

// Configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    Blob,
}

#[derive(Debug, Clone)]
pub struct S3Settings {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub public_base_url: String,
}

#[derive(Debug, Clone)]
pub struct BlobSettings {
    pub token: String,
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub dry_run: bool,
    pub storage_backend: StorageBackend,
    pub s3: Option<S3Settings>,
    pub blob: Option<BlobSettings>,
    pub max_upload_bytes: usize,
    pub max_dimension: u32,
    pub max_output_pixels: u64,
    pub zip_compression_level: i64,
    pub spool_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Credentials are only
    /// required for the storage backend that will actually be used.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| Error::Config(format!("{} not set", key)))
        };

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse()
            .map_err(|e| Error::Config(format!("Invalid BIND_ADDR: {}", e)))?;

        let dry_run = lookup("DRY_RUN")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let storage_backend = match lookup("STORAGE_BACKEND")
            .unwrap_or_else(|| "s3".to_string())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "s3" => StorageBackend::S3,
            "blob" => StorageBackend::Blob,
            other => {
                return Err(Error::Config(format!(
                    "Unknown STORAGE_BACKEND '{}', expected 's3' or 'blob'",
                    other
                )))
            }
        };

        let s3 = if !dry_run && storage_backend == StorageBackend::S3 {
            Some(S3Settings {
                access_key_id: require("STORAGE_ACCESS_KEY_ID")?,
                secret_access_key: require("STORAGE_SECRET_ACCESS_KEY")?,
                endpoint: require("STORAGE_ENDPOINT")?,
                region: lookup("STORAGE_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                bucket: require("STORAGE_BUCKET")?,
                public_base_url: require("STORAGE_PUBLIC_BASE_URL")?,
            })
        } else {
            None
        };

        let blob = if !dry_run && storage_backend == StorageBackend::Blob {
            Some(BlobSettings {
                token: require("BLOB_READ_WRITE_TOKEN")?,
                api_url: lookup("BLOB_API_URL")
                    .unwrap_or_else(|| "https://blob.vercel-storage.com".to_string()),
            })
        } else {
            None
        };

        Ok(Self {
            bind_addr,
            dry_run,
            storage_backend,
            s3,
            blob,
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", 50 * 1024 * 1024)?,
            max_dimension: parse_or(&lookup, "MAX_DIMENSION", DEFAULT_MAX_DIMENSION)?,
            max_output_pixels: parse_or(&lookup, "MAX_OUTPUT_PIXELS", DEFAULT_MAX_OUTPUT_PIXELS)?,
            zip_compression_level: parse_or(&lookup, "ZIP_COMPRESSION_LEVEL", 6)?,
            spool_dir: lookup("SPOOL_DIR").map(PathBuf::from),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid {}: {}", key, e))),
    }
}
