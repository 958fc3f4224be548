//! Batch resize-and-package orchestration.
//!
//! One [`ResizeEngine::run`] call is one job: fan the images out to the
//! blocking pool, join them all, zip the results in input order and upload
//! the archive. Any failure abandons the whole batch.

use crate::archive::{Archiver, ZipArchiver};
use crate::image::{ImageProcessor, ImageResizer, ResizeSpec};
use crate::models::{
    archive_file_name, artifact_file_name, Config, JobOutcome, PackagedArchive, ResizeJobInput,
    ResizedArtifact, StorageBackend, UploadDescriptor,
};
use crate::storage::{BlobStore, DiscardStore, ObjectStore, S3Store};
use crate::{Error, Result};
use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

pub struct ResizeEngine {
    resizer: Arc<dyn ImageResizer>,
    archiver: Arc<dyn Archiver>,
    store: Arc<dyn ObjectStore>,
    max_dimension: u32,
}

/// Injectable collaborators used to construct [`ResizeEngine`] in tests.
pub struct EngineServices {
    pub resizer: Arc<dyn ImageResizer>,
    pub archiver: Arc<dyn Archiver>,
    pub store: Arc<dyn ObjectStore>,
}

impl ResizeEngine {
    pub fn with_services(services: EngineServices, max_dimension: u32) -> Self {
        Self {
            resizer: services.resizer,
            archiver: services.archiver,
            store: services.store,
            max_dimension,
        }
    }

    /// Wire up the real resizer, zip writer and the configured object store.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store: Arc<dyn ObjectStore> = if config.dry_run {
            info!("DRY_RUN enabled, archives will be built but not uploaded");
            Arc::new(DiscardStore::new())
        } else {
            match config.storage_backend {
                StorageBackend::S3 => {
                    let settings = config
                        .s3
                        .as_ref()
                        .ok_or_else(|| Error::Config("S3 settings missing".to_string()))?;
                    info!("Object storage: S3 bucket {}", settings.bucket);
                    Arc::new(S3Store::new(settings).await?)
                }
                StorageBackend::Blob => {
                    let settings = config
                        .blob
                        .as_ref()
                        .ok_or_else(|| Error::Config("Blob settings missing".to_string()))?;
                    info!("Object storage: blob API at {}", settings.api_url);
                    Arc::new(BlobStore::new(settings))
                }
            }
        };

        Ok(Self::with_services(
            EngineServices {
                resizer: Arc::new(ImageProcessor::with_limits(
                    config.max_dimension,
                    config.max_output_pixels,
                )),
                archiver: Arc::new(ZipArchiver::new(config.zip_compression_level)),
                store,
            },
            config.max_dimension,
        ))
    }

    pub async fn run(&self, job: ResizeJobInput) -> Result<JobOutcome> {
        if job.width > self.max_dimension || job.height > self.max_dimension {
            return Err(Error::DimensionsTooLarge {
                width: job.width,
                height: job.height,
                max: self.max_dimension,
            });
        }

        let total_images = job.images.len();
        info!(
            "Resizing {} images to {}x{} ({})",
            total_images, job.width, job.height, job.fit
        );

        let artifacts = self.resize_all(job).await?;
        let archive = self.package(artifacts).await?;
        if archive.total_entries != total_images {
            return Err(Error::Invariant(format!(
                "Archive holds {} entries for {} images",
                archive.total_entries, total_images
            )));
        }

        let descriptor = self.upload(archive).await?;
        info!(
            "Uploaded {} ({} bytes) to {}",
            descriptor.file_name, descriptor.byte_size, descriptor.url
        );

        Ok(JobOutcome {
            descriptor,
            total_images,
        })
    }

    async fn resize_all(&self, job: ResizeJobInput) -> Result<Vec<ResizedArtifact>> {
        let spec = ResizeSpec {
            width: job.width,
            height: job.height,
            fit: job.fit,
        };
        let total = job.images.len();

        let mut tasks = JoinSet::new();
        for (index, image) in job.images.into_iter().enumerate() {
            let resizer = Arc::clone(&self.resizer);
            tasks.spawn_blocking(move || {
                let result = resizer
                    .resize(&image.bytes, spec)
                    .map_err(|e| Error::Resize {
                        name: image.name,
                        message: e.to_string(),
                    });
                (index, result)
            });
        }

        let mut outputs: Vec<Option<Vec<u8>>> = vec![None; total];
        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined
                .map_err(|e| Error::Invariant(format!("Resize task join error: {}", e)))?;
            match result {
                Ok(bytes) => {
                    debug!("Resized image {} into {} bytes", index + 1, bytes.len());
                    outputs[index] = Some(bytes);
                }
                Err(e) => {
                    warn!("Abandoning batch: {}", e);
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        outputs
            .into_iter()
            .enumerate()
            .map(|(index, bytes)| {
                bytes
                    .map(|bytes| ResizedArtifact {
                        file_name: artifact_file_name(index, spec.width, spec.height),
                        bytes,
                    })
                    .ok_or_else(|| {
                        Error::Invariant(format!("Missing output for image {}", index + 1))
                    })
            })
            .collect()
    }

    async fn package(&self, artifacts: Vec<ResizedArtifact>) -> Result<PackagedArchive> {
        let archiver = Arc::clone(&self.archiver);
        let archive = tokio::task::spawn_blocking(move || archiver.archive(&artifacts))
            .await
            .map_err(|e| Error::Invariant(format!("Archive task join error: {}", e)))??;

        info!(
            "Packaged {} entries into {} bytes",
            archive.total_entries,
            archive.bytes.len()
        );
        Ok(archive)
    }

    async fn upload(&self, archive: PackagedArchive) -> Result<UploadDescriptor> {
        let file_name = archive_file_name(Utc::now().timestamp_millis());
        let url = self
            .store
            .put(&file_name, &archive.bytes, self.archiver.content_type())
            .await?;

        Ok(UploadDescriptor {
            url,
            file_name,
            byte_size: archive.bytes.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{EngineServices, ResizeEngine};
    use crate::archive::ZipArchiver;
    use crate::image::MockImageResizer;
    use crate::models::{Config, FitMode, ResizeJobInput, SourceImage};
    use crate::storage::MemoryStore;
    use crate::Error;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use std::sync::Arc;

    const TEST_BASE_URL: &str = "https://cdn.test";

    fn build_engine(resizer: MockImageResizer, store: MemoryStore) -> ResizeEngine {
        ResizeEngine::with_services(
            EngineServices {
                resizer: Arc::new(resizer),
                archiver: Arc::new(ZipArchiver::default()),
                store: Arc::new(store),
            },
            16384,
        )
    }

    fn images(payloads: &[&[u8]]) -> Vec<SourceImage> {
        payloads
            .iter()
            .enumerate()
            .map(|(i, bytes)| SourceImage {
                name: format!("photo-{}.jpg", i + 1),
                bytes: bytes.to_vec(),
            })
            .collect()
    }

    fn entry_names(data: &[u8]) -> Vec<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(data)).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_run_packages_and_uploads_in_input_order() {
        let store = MemoryStore::new().with_base_url(TEST_BASE_URL.to_string());
        let resizer = MockImageResizer::new();
        let engine = build_engine(resizer.clone(), store.clone());

        let job = ResizeJobInput::new(
            images(&[b"one", b"two", b"three"]),
            128,
            128,
            FitMode::Cover,
        )
        .unwrap();
        let outcome = engine.run(job).await.unwrap();

        assert_eq!(outcome.total_images, 3);
        assert_eq!(resizer.get_process_count(), 3);
        assert_eq!(store.get_upload_count(), 1);

        let descriptor = &outcome.descriptor;
        assert!(descriptor.file_name.starts_with("resized_images_"));
        assert!(descriptor.file_name.ends_with(".zip"));
        assert_eq!(
            descriptor.url,
            format!("{}/{}", TEST_BASE_URL, descriptor.file_name)
        );

        let stored = store.get(&descriptor.file_name).unwrap();
        assert_eq!(stored.content_type, "application/zip");
        assert_eq!(descriptor.byte_size, stored.data.len());

        assert_eq!(
            entry_names(&stored.data),
            vec![
                "icon-1-128x128.png",
                "icon-2-128x128.png",
                "icon-3-128x128.png"
            ]
        );

        let mut archive = zip::ZipArchive::new(Cursor::new(stored.data)).unwrap();
        let mut second = Vec::new();
        std::io::Read::read_to_end(
            &mut archive.by_name("icon-2-128x128.png").unwrap(),
            &mut second,
        )
        .unwrap();
        assert!(second.ends_with(b"two"));
    }

    #[tokio::test]
    async fn test_one_corrupt_image_fails_the_whole_batch() {
        let store = MemoryStore::new();
        let resizer = MockImageResizer::new().failing_on(b"corrupt");
        let engine = build_engine(resizer, store.clone());

        let job = ResizeJobInput::new(
            images(&[b"a", b"b", b"corrupt", b"d", b"e"]),
            440,
            280,
            FitMode::Contain,
        )
        .unwrap();
        let err = engine.run(job).await.unwrap_err();

        assert!(matches!(err, Error::Resize { ref name, .. } if name == "photo-3.jpg"));
        assert_eq!(store.get_upload_count(), 0);
        assert!(store.get_objects().is_empty());
    }

    #[tokio::test]
    async fn test_upload_failure_is_reported() {
        let store = MemoryStore::new().with_failure(true);
        let engine = build_engine(MockImageResizer::new(), store);

        let job = ResizeJobInput::new(images(&[b"a"]), 128, 128, FitMode::Fill).unwrap();
        let err = engine.run(job).await.unwrap_err();

        assert!(matches!(err, Error::Storage(_)));
    }

    #[tokio::test]
    async fn test_dimensions_above_ceiling_are_rejected_before_resizing() {
        let store = MemoryStore::new();
        let resizer = MockImageResizer::new();
        let engine = ResizeEngine::with_services(
            EngineServices {
                resizer: Arc::new(resizer.clone()),
                archiver: Arc::new(ZipArchiver::default()),
                store: Arc::new(store.clone()),
            },
            1000,
        );

        let job = ResizeJobInput::new(images(&[b"a"]), 1400, 560, FitMode::Cover).unwrap();
        let err = engine.run(job).await.unwrap_err();

        assert!(matches!(err, Error::DimensionsTooLarge { max: 1000, .. }));
        assert_eq!(resizer.get_process_count(), 0);
        assert_eq!(store.get_upload_count(), 0);
    }

    #[tokio::test]
    async fn test_spec_is_forwarded_to_resizer() {
        let resizer = MockImageResizer::new();
        let engine = build_engine(resizer.clone(), MemoryStore::new());

        let job =
            ResizeJobInput::new(images(&[b"a", b"b"]), 1400, 560, FitMode::Outside).unwrap();
        engine.run(job).await.unwrap();

        let specs = resizer.get_seen_specs();
        assert_eq!(specs.len(), 2);
        assert!(specs
            .iter()
            .all(|s| (s.width, s.height, s.fit) == (1400, 560, FitMode::Outside)));
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([10, 200, 30]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn dry_run_config(max_output_pixels: &'static str) -> Config {
        Config::from_lookup(|key| match key {
            "DRY_RUN" => Some("true".to_string()),
            "MAX_OUTPUT_PIXELS" => Some(max_output_pixels.to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_dry_run_engine_discards_archive() {
        let engine = ResizeEngine::from_config(&dry_run_config("67108864"))
            .await
            .unwrap();

        let job = ResizeJobInput::new(
            vec![SourceImage {
                name: "tile.png".to_string(),
                bytes: png(40, 30),
            }],
            64,
            64,
            FitMode::Cover,
        )
        .unwrap();
        let outcome = engine.run(job).await.unwrap();

        assert!(outcome
            .descriptor
            .url
            .starts_with("https://dry-run.invalid/resized_images_"));
        assert!(outcome.descriptor.byte_size > 0);
    }

    #[tokio::test]
    async fn test_configured_pixel_budget_reaches_resizer() {
        let engine = ResizeEngine::from_config(&dry_run_config("1000")).await.unwrap();

        let job = ResizeJobInput::new(
            vec![SourceImage {
                name: "tile.png".to_string(),
                bytes: png(40, 30),
            }],
            128,
            128,
            FitMode::Fill,
        )
        .unwrap();
        let err = engine.run(job).await.unwrap_err();

        match err {
            Error::Resize { name, message } => {
                assert_eq!(name, "tile.png");
                assert!(message.contains("processing budget"));
            }
            other => panic!("expected a resize error, got {:?}", other),
        }
    }
}
