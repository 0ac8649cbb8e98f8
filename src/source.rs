//! Source asset references.
//!
//! A [`SourceRef`] tells the resolver where the original asset lives: its
//! stable relative path (used for naming), the root that makes it absolute,
//! and the public base URL for constructing external locations. Two shapes
//! exist: a plain path under a configured media root, and a reference whose
//! root and base URL are supplied by the store that owns the file.

use crate::storage::LocatedStore;
use crate::{Error, Result};
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

pub trait SourceRef: Send + Sync {
    /// Relative path of the source under its root, forward-slash separated.
    fn relative_path(&self) -> &str;

    /// Root directory that makes [`relative_path`](Self::relative_path) absolute.
    fn root_dir(&self) -> &Path;

    /// Public base URL the thumbnail URL is built on.
    fn public_base_url(&self) -> &str;

    fn absolute_path(&self) -> PathBuf {
        self.root_dir().join(self.relative_path())
    }
}

/// Process-wide media root and its public URL.
#[derive(Debug, Clone)]
pub struct MediaLocation {
    pub root: PathBuf,
    pub base_url: String,
}

impl MediaLocation {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }
}

fn relative_to_string(relative: &Path) -> Result<String> {
    let relative = relative.to_str().ok_or_else(|| {
        Error::PathEncoding(format!(
            "Source path {} is not valid UTF-8",
            relative.display()
        ))
    })?;
    if relative.is_empty() {
        return Err(Error::Configuration("Source path is empty".to_string()));
    }
    if Path::new(relative).is_absolute() {
        return Err(Error::Configuration(format!(
            "Source path '{}' must be relative to its root",
            relative
        )));
    }
    // Canonical keys are forward-slash separated on every platform.
    if MAIN_SEPARATOR != '/' {
        return Ok(relative.replace(MAIN_SEPARATOR, "/"));
    }
    Ok(relative.to_string())
}

/// A plain relative path under a configured media root.
#[derive(Debug, Clone)]
pub struct MediaSource {
    relative: String,
    media: MediaLocation,
}

impl MediaSource {
    pub fn new(relative: impl AsRef<Path>, media: MediaLocation) -> Result<Self> {
        Ok(Self {
            relative: relative_to_string(relative.as_ref())?,
            media,
        })
    }
}

impl SourceRef for MediaSource {
    fn relative_path(&self) -> &str {
        &self.relative
    }

    fn root_dir(&self) -> &Path {
        &self.media.root
    }

    fn public_base_url(&self) -> &str {
        &self.media.base_url
    }
}

/// A reference to a file owned by a store that advertises its own location
/// and base URL.
#[derive(Debug, Clone)]
pub struct StoredSource {
    relative: String,
    root: PathBuf,
    base_url: String,
}

impl StoredSource {
    pub fn new(
        relative: impl AsRef<Path>,
        root: impl Into<PathBuf>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            relative: relative_to_string(relative.as_ref())?,
            root: root.into(),
            base_url: base_url.into(),
        })
    }

    /// Build a reference from the store holding the file.
    pub fn from_store(relative: impl AsRef<Path>, store: &dyn LocatedStore) -> Result<Self> {
        Self::new(relative, store.location(), store.base_url())
    }
}

impl SourceRef for StoredSource {
    fn relative_path(&self) -> &str {
        &self.relative
    }

    fn root_dir(&self) -> &Path {
        &self.root
    }

    fn public_base_url(&self) -> &str {
        &self.base_url
    }
}
