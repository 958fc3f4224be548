use super::ObjectStore;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Retaining in-process store for tests. Keeps every object it is given.
#[derive(Clone)]
pub struct MemoryStore {
    objects: Arc<Mutex<HashMap<String, StoredObject>>>,
    base_url: String,
    upload_count: Arc<AtomicUsize>,
    should_fail: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(Mutex::new(HashMap::new())),
            base_url: "https://memory-store.local".to_string(),
            upload_count: Arc::new(AtomicUsize::new(0)),
            should_fail: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        self.should_fail.store(should_fail, Ordering::SeqCst);
        self
    }

    pub fn get_upload_count(&self) -> usize {
        self.upload_count.load(Ordering::SeqCst)
    }

    pub fn get(&self, name: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(name).cloned()
    }

    pub fn get_objects(&self) -> HashMap<String, StoredObject> {
        self.objects.lock().unwrap().clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, name: &str, data: &[u8], content_type: &str) -> Result<String> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(Error::Storage("Mock storage failure".to_string()));
        }

        self.upload_count.fetch_add(1, Ordering::SeqCst);
        self.objects.lock().unwrap().insert(
            name.to_string(),
            StoredObject {
                data: data.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(format!("{}/{}", self.base_url, name))
    }
}
