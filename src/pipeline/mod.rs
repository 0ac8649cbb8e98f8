//! Thumbnail generation pipelines.
//!
//! The resolver treats generation as an opaque capability: given the
//! absolute source location, the requested size, the option tokens, and the
//! resolved settings (quality, external tool paths, processor list), a
//! pipeline returns the encoded thumbnail bytes.

pub mod image;
pub mod mock;

pub use self::image::ImagePipeline;
pub use mock::MockPipeline;

use crate::models::Dimensions;
use crate::settings::EffectiveSettings;
use crate::Result;
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait GenerationPipeline: Send + Sync {
    async fn generate(
        &self,
        source: &Path,
        size: Dimensions,
        options: &[String],
        settings: &EffectiveSettings,
    ) -> Result<Vec<u8>>;
}
