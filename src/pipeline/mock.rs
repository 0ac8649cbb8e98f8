//! Mock generation pipeline for tests.

use super::GenerationPipeline;
use crate::models::Dimensions;
use crate::settings::EffectiveSettings;
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
pub struct MockPipeline {
    generate_count: Arc<Mutex<usize>>,
    response: Vec<u8>,
    should_fail: Arc<Mutex<bool>>,
    delay: Option<Duration>,
    last_quality: Arc<Mutex<Option<u8>>>,
}

impl MockPipeline {
    pub fn new() -> Self {
        Self {
            generate_count: Arc::new(Mutex::new(0)),
            response: b"thumbnail-bytes".to_vec(),
            should_fail: Arc::new(Mutex::new(false)),
            delay: None,
            last_quality: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_response(mut self, bytes: Vec<u8>) -> Self {
        self.response = bytes;
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn get_generate_count(&self) -> usize {
        *self.generate_count.lock().unwrap()
    }

    pub fn get_last_quality(&self) -> Option<u8> {
        *self.last_quality.lock().unwrap()
    }
}

impl Default for MockPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationPipeline for MockPipeline {
    async fn generate(
        &self,
        _source: &Path,
        _size: Dimensions,
        _options: &[String],
        settings: &EffectiveSettings,
    ) -> Result<Vec<u8>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if *self.should_fail.lock().unwrap() {
            return Err(Error::Generation("Mock failure".to_string()));
        }

        let mut count = self.generate_count.lock().unwrap();
        *count += 1;
        *self.last_quality.lock().unwrap() = Some(settings.quality);

        Ok(self.response.clone())
    }
}
