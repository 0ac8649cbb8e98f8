//! Canonical thumbnail naming.
//!
//! Everything here is a pure function of its inputs. The composed key is the
//! cache identity: the same (source, size, options, settings) tuple must
//! produce the same key on every call, on every platform, and any change to
//! size, option sequence, quality, or extension must produce a different one.
//!
//! The naming format is stable:
//! `{basedir}/{sourceDir}/{subdir}/{prefix}{name}_{W}x{H}_{opt1}_..._{quality}q{.ext}`
//! where `name` is the source basename with its dot-stripped extension
//! appended (`cat.jpg` becomes `catjpg`, so sources differing only in
//! extension do not collide).

use crate::models::Dimensions;
use crate::settings::EffectiveSettings;
use crate::{Error, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

// Escape set for embedding the key in a URL path. Forward slashes stay
// literal; everything outside the ASCII range is always escaped.
const URL_PATH_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'|')
    .add(b'\\')
    .add(b'^')
    .add(b'#')
    .add(b'?');

/// Split a filename into (basename, extension-without-dot).
///
/// A leading dot does not start an extension: `.hidden` has none.
fn split_extension(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(idx) if idx > 0 && !filename[..idx].chars().all(|c| c == '.') => {
            (&filename[..idx], &filename[idx + 1..])
        }
        _ => (filename, ""),
    }
}

/// Compose the thumbnail filename for one request.
pub fn thumbnail_filename(
    source_filename: &str,
    size: Dimensions,
    options: &[String],
    settings: &EffectiveSettings,
) -> String {
    let (basename, source_ext) = split_extension(source_filename);
    let name = format!("{}{}", basename, source_ext);

    // Option order is preserved verbatim; callers keep it stable.
    let opts = if options.is_empty() {
        String::new()
    } else {
        format!("{}_", options.join("_"))
    };

    let extension = if settings.extension.is_empty() {
        String::new()
    } else {
        format!(".{}", settings.extension)
    };

    format!(
        "{}{}_{}_{}{}q{}",
        settings.prefix, name, size, opts, settings.quality, extension
    )
}

/// Join key segments with forward slashes, skipping empty segments.
fn join_segments(segments: &[&str]) -> String {
    segments
        .iter()
        .filter(|segment| !segment.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/")
}

/// Compute the canonical relative cache key for a thumbnail request.
pub fn canonical_key(
    relative_source: &str,
    size: Dimensions,
    options: &[String],
    settings: &EffectiveSettings,
) -> Result<String> {
    let (directory, filename) = match relative_source.rsplit_once('/') {
        Some((directory, filename)) => (directory, filename),
        None => ("", relative_source),
    };

    let thumbnail = thumbnail_filename(filename, size, options, settings);
    let key = join_segments(&[
        settings.basedir.as_str(),
        directory,
        settings.subdir.as_str(),
        thumbnail.as_str(),
    ]);

    if key.chars().any(|c| c.is_control()) {
        return Err(Error::PathEncoding(format!(
            "Key '{}' contains characters the storage backend cannot hold",
            key.escape_debug()
        )));
    }
    Ok(key)
}

/// Build the externally addressable URL for a key.
///
/// The key's separators are already forward slashes on every platform; the
/// key is percent-escaped for safe embedding.
pub fn public_url(base_url: &str, key: &str) -> String {
    let escaped = utf8_percent_encode(key, URL_PATH_ENCODE_SET);
    if base_url.is_empty() || base_url.ends_with('/') {
        format!("{}{}", base_url, escaped)
    } else {
        format!("{}/{}", base_url, escaped)
    }
}
