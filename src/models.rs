//! Core value types shared across the crate.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Requested thumbnail size as an ordered (width, height) pair.
///
/// Both dimensions are positive; the constructor rejects zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    width: u32,
    height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::Configuration(format!(
                "Thumbnail dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Dimensions {
    type Err = Error;

    /// Parse a `WxH` string such as `100x100`.
    fn from_str(input: &str) -> Result<Self> {
        let (w, h) = input.split_once(['x', 'X']).ok_or_else(|| {
            Error::Configuration(format!("Invalid size '{}'. Expected format: WxH", input))
        })?;
        let width = w.trim().parse::<u32>().map_err(|_| {
            Error::Configuration(format!("Invalid width '{}' in size '{}'", w, input))
        })?;
        let height = h.trim().parse::<u32>().map_err(|_| {
            Error::Configuration(format!("Invalid height '{}' in size '{}'", h, input))
        })?;
        Self::new(width, height)
    }
}

/// A resolved thumbnail: where it lives and, when freshly generated, its bytes.
///
/// Values are computed fresh on every resolution; nothing here is cached
/// in-process. Whether work was avoided is decided solely by the storage
/// backend's existence check.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    /// Canonical relative cache key, forward-slash separated.
    pub key: String,
    /// Absolute location under the source's root directory.
    pub dest: PathBuf,
    /// Externally addressable URL, percent-escaped.
    pub url: String,
    /// Generated bytes. `None` when the backend already held the artifact.
    pub bytes: Option<Vec<u8>>,
    /// Whether the pipeline ran for this resolution.
    pub generated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_display() {
        let size = Dimensions::new(100, 50).unwrap();
        assert_eq!(size.to_string(), "100x50");
    }

    #[test]
    fn test_dimensions_rejects_zero() {
        assert!(Dimensions::new(0, 100).is_err());
        assert!(Dimensions::new(100, 0).is_err());
    }

    #[test]
    fn test_dimensions_parse() {
        let size: Dimensions = "640x480".parse().unwrap();
        assert_eq!(size.width(), 640);
        assert_eq!(size.height(), 480);
    }

    #[test]
    fn test_dimensions_parse_invalid() {
        assert!("640".parse::<Dimensions>().is_err());
        assert!("x480".parse::<Dimensions>().is_err());
        assert!("640x".parse::<Dimensions>().is_err());
        assert!("640xabc".parse::<Dimensions>().is_err());
    }
}
