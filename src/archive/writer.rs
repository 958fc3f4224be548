use super::Archiver;
use crate::models::{PackagedArchive, ResizedArtifact};
use crate::Result;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const DEFAULT_COMPRESSION_LEVEL: i64 = 6;

/// In-memory zip writer using Deflate at a fixed level.
#[derive(Debug, Clone)]
pub struct ZipArchiver {
    level: i64,
}

impl ZipArchiver {
    pub fn new(level: i64) -> Self {
        Self { level }
    }
}

impl Default for ZipArchiver {
    fn default() -> Self {
        Self::new(DEFAULT_COMPRESSION_LEVEL)
    }
}

impl Archiver for ZipArchiver {
    fn archive(&self, entries: &[ResizedArtifact]) -> Result<PackagedArchive> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(self.level));

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for entry in entries {
            zip.start_file(entry.file_name.as_str(), options)?;
            zip.write_all(&entry.bytes)?;
        }
        let bytes = zip.finish()?.into_inner();

        Ok(PackagedArchive {
            bytes,
            total_entries: entries.len(),
        })
    }

    fn content_type(&self) -> &'static str {
        "application/zip"
    }
}
