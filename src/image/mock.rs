use super::{ImageResizer, ResizeSpec};
use crate::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Test double that echoes a fixed payload and can fail on chosen inputs.
#[derive(Clone)]
pub struct MockImageResizer {
    process_count: Arc<AtomicUsize>,
    output: Vec<u8>,
    fail_on: Arc<Mutex<Vec<Vec<u8>>>>,
    seen_specs: Arc<Mutex<Vec<ResizeSpec>>>,
}

impl MockImageResizer {
    pub fn new() -> Self {
        Self {
            process_count: Arc::new(AtomicUsize::new(0)),
            output: b"\x89PNG mock".to_vec(),
            fail_on: Arc::new(Mutex::new(Vec::new())),
            seen_specs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_output(mut self, output: Vec<u8>) -> Self {
        self.output = output;
        self
    }

    /// Fail whenever the input bytes equal `data`.
    pub fn failing_on(self, data: &[u8]) -> Self {
        self.fail_on.lock().unwrap().push(data.to_vec());
        self
    }

    pub fn get_process_count(&self) -> usize {
        self.process_count.load(Ordering::SeqCst)
    }

    pub fn get_seen_specs(&self) -> Vec<ResizeSpec> {
        self.seen_specs.lock().unwrap().clone()
    }
}

impl Default for MockImageResizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageResizer for MockImageResizer {
    fn resize(&self, image_data: &[u8], spec: ResizeSpec) -> Result<Vec<u8>> {
        self.process_count.fetch_add(1, Ordering::SeqCst);
        self.seen_specs.lock().unwrap().push(spec);

        if self
            .fail_on
            .lock()
            .unwrap()
            .iter()
            .any(|bad| bad.as_slice() == image_data)
        {
            return Err(Error::Image(image::ImageError::IoError(
                std::io::Error::other("Mock failure"),
            )));
        }

        let mut output = self.output.clone();
        output.extend_from_slice(image_data);
        Ok(output)
    }
}
