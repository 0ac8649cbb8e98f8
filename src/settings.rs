//! Thumbnail settings and their three-tier resolution.
//!
//! Every parameter resolves per call as: explicit override, else the
//! process-wide [`Settings`] value, else the built-in [`Defaults`] entry.
//! Overrides are plain `Option`s, so "unset" (`None`) stays distinct from
//! meaningful empty values like `Some(String::new())` or `Some(0)`.

use crate::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Terminal fallback table. Replaceable at resolver construction.
#[derive(Debug, Clone)]
pub struct Defaults {
    pub quality: u8,
    pub convert: String,
    pub wvps: String,
    pub processors: Vec<String>,
    pub basedir: String,
    pub subdir: String,
    pub prefix: String,
    pub extension: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            quality: 85,
            convert: "/usr/bin/convert".to_string(),
            wvps: "/usr/bin/wvPS".to_string(),
            processors: vec![
                "colorspace".to_string(),
                "autocrop".to_string(),
                "scale_and_crop".to_string(),
                "filters".to_string(),
            ],
            basedir: String::new(),
            subdir: String::new(),
            prefix: String::new(),
            extension: "jpg".to_string(),
        }
    }
}

/// Process-wide configuration tier. A `None` field means "not configured",
/// which falls through to [`Defaults`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    pub quality: Option<u8>,
    pub convert: Option<String>,
    pub wvps: Option<String>,
    pub processors: Option<Vec<String>>,
    pub basedir: Option<String>,
    pub subdir: Option<String>,
    pub prefix: Option<String>,
    pub extension: Option<String>,
}

impl Settings {
    /// Read settings from `THUMBNAIL_*` environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let quality = match std::env::var("THUMBNAIL_QUALITY") {
            Ok(raw) => Some(parse_quality(&raw)?),
            Err(_) => None,
        };
        let processors = std::env::var("THUMBNAIL_PROCESSORS").ok().map(|raw| {
            raw.split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect()
        });

        Ok(Self {
            quality,
            convert: std::env::var("THUMBNAIL_CONVERT").ok(),
            wvps: std::env::var("THUMBNAIL_WVPS").ok(),
            processors,
            basedir: std::env::var("THUMBNAIL_BASEDIR").ok(),
            subdir: std::env::var("THUMBNAIL_SUBDIR").ok(),
            prefix: std::env::var("THUMBNAIL_PREFIX").ok(),
            extension: std::env::var("THUMBNAIL_EXTENSION").ok(),
        })
    }

    /// Read settings from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let settings: Settings = serde_json::from_str(&fs::read_to_string(path)?)?;
        if let Some(q) = settings.quality {
            validate_quality(q)?;
        }
        Ok(settings)
    }
}

fn parse_quality(raw: &str) -> Result<u8> {
    let quality = raw
        .parse::<u8>()
        .map_err(|_| Error::Configuration(format!("Invalid quality '{}'", raw)))?;
    validate_quality(quality)?;
    Ok(quality)
}

pub(crate) fn validate_quality(quality: u8) -> Result<()> {
    if quality > 100 {
        return Err(Error::Configuration(format!(
            "Quality must be within 0-100, got {}",
            quality
        )));
    }
    Ok(())
}

/// Per-call overrides. `None` fields defer to configuration/defaults;
/// `Some` always wins, including explicitly empty values.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub quality: Option<u8>,
    pub basedir: Option<String>,
    pub subdir: Option<String>,
    pub prefix: Option<String>,
    pub extension: Option<String>,
    pub processors: Option<Vec<String>>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn with_basedir(mut self, basedir: impl Into<String>) -> Self {
        self.basedir = Some(basedir.into());
        self
    }

    pub fn with_subdir(mut self, subdir: impl Into<String>) -> Self {
        self.subdir = Some(subdir.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    pub fn with_processors(mut self, processors: Vec<String>) -> Self {
        self.processors = Some(processors);
        self
    }
}

/// Fully resolved parameter bundle. Built once per resolution, immutable after.
#[derive(Debug, Clone)]
pub struct EffectiveSettings {
    pub quality: u8,
    pub basedir: String,
    pub subdir: String,
    pub prefix: String,
    pub extension: String,
    pub convert_path: String,
    pub wvps_path: String,
    pub processors: Vec<String>,
}

/// Resolves each parameter through override, configuration, and defaults.
///
/// Resolution itself never fails; the defaults table is the terminal case.
#[derive(Debug, Clone)]
pub struct SettingsResolver {
    settings: Settings,
    defaults: Defaults,
}

fn tiered<T: Clone>(override_value: Option<T>, configured: &Option<T>, default: &T) -> T {
    override_value
        .or_else(|| configured.clone())
        .unwrap_or_else(|| default.clone())
}

impl SettingsResolver {
    pub fn new(settings: Settings) -> Self {
        Self::with_defaults(settings, Defaults::default())
    }

    pub fn with_defaults(settings: Settings, defaults: Defaults) -> Self {
        Self { settings, defaults }
    }

    pub fn quality(&self, override_value: Option<u8>) -> u8 {
        tiered(override_value, &self.settings.quality, &self.defaults.quality)
    }

    pub fn convert(&self) -> String {
        tiered(None, &self.settings.convert, &self.defaults.convert)
    }

    pub fn wvps(&self) -> String {
        tiered(None, &self.settings.wvps, &self.defaults.wvps)
    }

    pub fn processors(&self, override_value: Option<Vec<String>>) -> Vec<String> {
        tiered(
            override_value,
            &self.settings.processors,
            &self.defaults.processors,
        )
    }

    pub fn basedir(&self, override_value: Option<String>) -> String {
        tiered(override_value, &self.settings.basedir, &self.defaults.basedir)
    }

    pub fn subdir(&self, override_value: Option<String>) -> String {
        tiered(override_value, &self.settings.subdir, &self.defaults.subdir)
    }

    pub fn prefix(&self, override_value: Option<String>) -> String {
        tiered(override_value, &self.settings.prefix, &self.defaults.prefix)
    }

    pub fn extension(&self, override_value: Option<String>) -> String {
        tiered(
            override_value,
            &self.settings.extension,
            &self.defaults.extension,
        )
    }

    /// Resolve the full bundle for one thumbnail request.
    pub fn effective(&self, overrides: &Overrides) -> EffectiveSettings {
        EffectiveSettings {
            quality: self.quality(overrides.quality),
            basedir: self.basedir(overrides.basedir.clone()),
            subdir: self.subdir(overrides.subdir.clone()),
            prefix: self.prefix(overrides.prefix.clone()),
            extension: self.extension(overrides.extension.clone()),
            convert_path: self.convert(),
            wvps_path: self.wvps(),
            processors: self.processors(overrides.processors.clone()),
        }
    }
}
