//! Publish-time resolution for archived editions.
//!
//! The file's write time says when the origin (or we) last touched it, which
//! is usually minutes after broadcast. Some broadcasters embed the true
//! publication instant in the audio container's comment tag; when that tag is
//! present and parseable it wins.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, MetadataRevision, StandardTagKey};
use symphonia::core::probe::Hint;

use crate::error::IngestError;

/// Best-known publish instant of the edition at `path`.
///
/// mp3 files are probed for an embedded comment timestamp; anything else,
/// and any mp3 whose metadata is missing or unparseable, falls back to the
/// filesystem write time.
///
/// # Errors
///
/// Returns [`IngestError::MissingArchive`] when there is no file at `path`
/// and [`IngestError::Io`] when it exists but cannot be read. Metadata
/// trouble is never an error.
pub fn published_time(path: &Path) -> Result<DateTime<Utc>, IngestError> {
    let meta = fs::metadata(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::MissingArchive {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::io(format!("inspecting edition {}", path.display()), e)
        }
    })?;
    let write_time = meta
        .modified()
        .map(DateTime::from)
        .map_err(|e| IngestError::io(format!("reading write time of {}", path.display()), e))?;

    if is_mp3(path) {
        match embedded_comment(path) {
            Some(comment) => match parse_embedded_timestamp(&comment) {
                Some(embedded) => return Ok(embedded),
                None => tracing::debug!(
                    path = %path.display(),
                    comment,
                    "embedded comment is not a timestamp; using file write time"
                ),
            },
            None => tracing::debug!(
                path = %path.display(),
                "no embedded comment tag; using file write time"
            ),
        }
    }
    Ok(write_time)
}

fn is_mp3(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mp3"))
}

/// Read the comment tag out of an audio container, if there is one.
///
/// ID3 tags ride in front of the audio stream and are surfaced by the probe;
/// in-container metadata comes from the format reader. Either source may
/// carry the comment.
fn embedded_comment(path: &Path) -> Option<String> {
    let file = fs::File::open(path).ok()?;
    let stream = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let mut probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .ok()?;

    if let Some(mut metadata) = probed.metadata.get() {
        if let Some(comment) = metadata.skip_to_latest().and_then(revision_comment) {
            return Some(comment);
        }
    }
    let mut container = probed.format.metadata();
    container.skip_to_latest().and_then(revision_comment)
}

fn revision_comment(revision: &MetadataRevision) -> Option<String> {
    revision
        .tags()
        .iter()
        .find(|tag| matches!(tag.std_key, Some(StandardTagKey::Comment)))
        .map(|tag| tag.value.to_string())
}

/// Parse a broadcaster-embedded timestamp.
///
/// Comments are RFC 2822-shaped but name the zone "UTC", which RFC 2822 does
/// not define, so that token is normalized to "GMT" first. An RFC 3339 string
/// is accepted as a second shape.
fn parse_embedded_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim_matches(char::from(0)).trim();
    let normalized = trimmed.replace("UTC", "GMT");
    if let Ok(t) = DateTime::parse_from_rfc2822(&normalized) {
        return Some(t.with_timezone(&Utc));
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
