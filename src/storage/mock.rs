//! In-memory storage backend for tests.

use super::StorageBackend;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct MockStorage {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    write_count: Arc<Mutex<usize>>,
    read_count: Arc<Mutex<usize>>,
    exists_count: Arc<Mutex<usize>>,
    fail_writes: Arc<Mutex<bool>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, key: impl Into<String>, content: Vec<u8>) -> Self {
        self.files.lock().unwrap().insert(key.into(), content);
        self
    }

    pub fn with_write_failure(self, fail: bool) -> Self {
        *self.fail_writes.lock().unwrap() = fail;
        self
    }

    pub fn get_write_count(&self) -> usize {
        *self.write_count.lock().unwrap()
    }

    pub fn get_read_count(&self) -> usize {
        *self.read_count.lock().unwrap()
    }

    pub fn get_exists_count(&self) -> usize {
        *self.exists_count.lock().unwrap()
    }

    pub fn get_files(&self) -> HashMap<String, Vec<u8>> {
        self.files.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageBackend for MockStorage {
    async fn exists(&self, key: &str) -> Result<bool> {
        let mut count = self.exists_count.lock().unwrap();
        *count += 1;

        Ok(self.files.lock().unwrap().contains_key(key))
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let mut count = self.read_count.lock().unwrap();
        *count += 1;

        let files = self.files.lock().unwrap();
        match files.get(key) {
            Some(data) => Ok(data.clone()),
            None => Err(Error::SourceNotFound(key.to_string())),
        }
    }

    async fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        if *self.fail_writes.lock().unwrap() {
            return Err(Error::StorageWrite("Mock failure".to_string()));
        }

        let mut count = self.write_count.lock().unwrap();
        *count += 1;

        self.files
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
        Ok(())
    }
}
