//! Multipart request intake.
//!
//! File parts are streamed to spool files on disk while the body is parsed
//! and read back when the job input is assembled. Each spool file is owned by
//! a [`SpooledUpload`] and removed when that guard drops, whichever way the
//! request ends.

use crate::models::{FitMode, ResizeJobInput, SourceImage, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::{Error, Result};
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use std::path::Path;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::debug;

pub const FILES_FIELD: &str = "files[]";
pub const WIDTH_FIELD: &str = "width";
pub const HEIGHT_FIELD: &str = "height";
pub const FORMAT_FIELD: &str = "format";

fn malformed(err: MultipartError) -> Error {
    Error::MalformedRequest(err.body_text())
}

/// An uploaded file part held on disk for the lifetime of the request.
#[derive(Debug)]
pub struct SpooledUpload {
    name: String,
    file: NamedTempFile,
    size: u64,
}

impl SpooledUpload {
    async fn spool(field: &mut Field<'_>, name: String, spool_dir: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("upload-");
        let file = match spool_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        let mut writer = tokio::fs::File::from_std(file.reopen()?);
        let mut size = 0u64;
        while let Some(chunk) = field.chunk().await.map_err(malformed)? {
            writer.write_all(&chunk).await?;
            size += chunk.len() as u64;
        }
        writer.flush().await?;

        Ok(Self { name, file, size })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Browsers send an empty, unnamed part when no file was picked.
    fn is_placeholder(&self) -> bool {
        self.name.is_empty() && self.size == 0
    }

    async fn read(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(self.path()).await?)
    }
}

/// The raw contents of a resize form, before defaults are applied.
#[derive(Debug, Default)]
pub struct ResizeForm {
    pub files: Vec<SpooledUpload>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub format: Option<String>,
}

impl ResizeForm {
    pub async fn parse(multipart: &mut Multipart, spool_dir: Option<&Path>) -> Result<Self> {
        let mut form = ResizeForm::default();

        while let Some(mut field) = multipart.next_field().await.map_err(malformed)? {
            let field_name = field.name().unwrap_or_default().to_string();
            match field_name.as_str() {
                FILES_FIELD => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let upload = SpooledUpload::spool(&mut field, file_name, spool_dir).await?;
                    if upload.is_placeholder() {
                        debug!("Skipping empty file part");
                        continue;
                    }
                    debug!(
                        "Spooled '{}' ({} bytes) to {}",
                        upload.name(),
                        upload.size(),
                        upload.path().display()
                    );
                    form.files.push(upload);
                }
                WIDTH_FIELD => form.width = Some(field.text().await.map_err(malformed)?),
                HEIGHT_FIELD => form.height = Some(field.text().await.map_err(malformed)?),
                FORMAT_FIELD => form.format = Some(field.text().await.map_err(malformed)?),
                other => debug!("Ignoring form field '{}'", other),
            }
        }

        Ok(form)
    }

    /// Applies defaults, validates the fit mode and reads the spooled files
    /// back. The spool files are removed when `self` drops at the end.
    pub async fn into_job(self) -> Result<ResizeJobInput> {
        if self.files.is_empty() {
            return Err(Error::NoFilesProvided);
        }

        let width = parse_dimension(self.width.as_deref(), DEFAULT_WIDTH);
        let height = parse_dimension(self.height.as_deref(), DEFAULT_HEIGHT);
        let fit = FitMode::from_field(self.format.as_deref())?;

        let mut images = Vec::with_capacity(self.files.len());
        for upload in &self.files {
            images.push(SourceImage {
                name: upload.name().to_string(),
                bytes: upload.read().await?,
            });
        }

        ResizeJobInput::new(images, width, height, fit)
    }
}

/// Lenient integer parse: leading digits are taken, anything unusable
/// (missing, blank, non-numeric, zero) yields `default`.
pub fn parse_dimension(raw: Option<&str>, default: u32) -> u32 {
    let Some(raw) = raw else {
        return default;
    };

    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = &digits[..end];
    if digits.is_empty() {
        return default;
    }

    match digits.parse::<u64>() {
        Ok(0) => default,
        Ok(value) => u32::try_from(value).unwrap_or(u32::MAX),
        Err(_) => u32::MAX,
    }
}
