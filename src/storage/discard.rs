use super::ObjectStore;
use crate::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

pub const DRY_RUN_BASE_URL: &str = "https://dry-run.invalid";

/// Dry-run store: logs each upload and drops the bytes.
///
/// The returned URL has the shape a real backend would produce but points
/// nowhere.
pub struct DiscardStore {
    base_url: String,
    upload_count: AtomicUsize,
}

impl DiscardStore {
    pub fn new() -> Self {
        Self {
            base_url: DRY_RUN_BASE_URL.to_string(),
            upload_count: AtomicUsize::new(0),
        }
    }

    pub fn get_upload_count(&self) -> usize {
        self.upload_count.load(Ordering::SeqCst)
    }
}

impl Default for DiscardStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for DiscardStore {
    async fn put(&self, name: &str, data: &[u8], content_type: &str) -> Result<String> {
        self.upload_count.fetch_add(1, Ordering::SeqCst);
        info!(
            "Dry run, skipping upload of {} ({} bytes, {})",
            name,
            data.len(),
            content_type
        );
        Ok(format!("{}/{}", self.base_url, name))
    }
}
