//! Thumbnail resolution and lazy generation.
//!
//! `ThumbnailResolver` ties the pieces together: resolve the effective
//! settings, compute the canonical key and locations, and invoke the
//! generation pipeline only when the storage backend does not already hold
//! the artifact.

use crate::lock::{KeyLock, NoLock};
use crate::models::{Dimensions, Thumbnail};
use crate::naming;
use crate::pipeline::GenerationPipeline;
use crate::settings::{self, Overrides, SettingsResolver};
use crate::source::SourceRef;
use crate::storage::StorageBackend;
use crate::{Error, Result};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

pub struct ThumbnailResolver {
    settings: SettingsResolver,
    storage: Box<dyn StorageBackend>,
    pipeline: Box<dyn GenerationPipeline>,
    lock: Box<dyn KeyLock>,
    generation_timeout: Option<Duration>,
}

impl ThumbnailResolver {
    pub fn new(
        settings: SettingsResolver,
        storage: Box<dyn StorageBackend>,
        pipeline: Box<dyn GenerationPipeline>,
    ) -> Self {
        Self {
            settings,
            storage,
            pipeline,
            lock: Box::new(NoLock),
            generation_timeout: None,
        }
    }

    /// Replace the per-key lock (default: [`NoLock`]).
    pub fn with_lock(mut self, lock: Box<dyn KeyLock>) -> Self {
        self.lock = lock;
        self
    }

    /// Bound each pipeline invocation; generation may shell out to external
    /// tools and must not block callers indefinitely.
    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = Some(timeout);
        self
    }

    /// Resolve a thumbnail, generating it only when not already stored.
    pub async fn resolve(
        &self,
        source: &dyn SourceRef,
        size: Dimensions,
        options: &[String],
        overrides: &Overrides,
    ) -> Result<Thumbnail> {
        self.resolve_inner(source, size, options, overrides, false)
            .await
    }

    /// Resolve a thumbnail, regenerating even when already stored.
    pub async fn refresh(
        &self,
        source: &dyn SourceRef,
        size: Dimensions,
        options: &[String],
        overrides: &Overrides,
    ) -> Result<Thumbnail> {
        self.resolve_inner(source, size, options, overrides, true)
            .await
    }

    async fn resolve_inner(
        &self,
        source: &dyn SourceRef,
        size: Dimensions,
        options: &[String],
        overrides: &Overrides,
        force: bool,
    ) -> Result<Thumbnail> {
        let effective = self.settings.effective(overrides);
        settings::validate_quality(effective.quality)?;

        let key = naming::canonical_key(source.relative_path(), size, options, &effective)?;
        let dest = source.root_dir().join(&key);
        let url = naming::public_url(source.public_base_url(), &key);

        let _guard = self.lock.acquire(&key).await;

        if !force && self.storage.exists(&key).await? {
            debug!(%key, "thumbnail already stored, skipping generation");
            return Ok(Thumbnail {
                key,
                dest,
                url,
                bytes: None,
                generated: false,
            });
        }

        let absolute_source = source.absolute_path();
        let bytes = self
            .generate(&absolute_source, size, options, &effective)
            .await?;
        if bytes.is_empty() {
            return Err(Error::Generation(format!(
                "Pipeline produced no bytes for '{}'",
                key
            )));
        }

        self.storage.write(&key, &bytes).await?;
        info!(%key, %size, "generated thumbnail");

        Ok(Thumbnail {
            key,
            dest,
            url,
            bytes: Some(bytes),
            generated: true,
        })
    }

    async fn generate(
        &self,
        source: &Path,
        size: Dimensions,
        options: &[String],
        effective: &settings::EffectiveSettings,
    ) -> Result<Vec<u8>> {
        let generation = self.pipeline.generate(source, size, options, effective);
        match self.generation_timeout {
            Some(limit) => tokio::time::timeout(limit, generation)
                .await
                .map_err(|_| {
                    Error::Generation(format!("Generation timed out after {:?}", limit))
                })?,
            None => generation.await,
        }
    }
}
