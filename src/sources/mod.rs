//! Where vocabulary CSV comes from, and the startup fallback to the
//! built-in sample.

use std::path::PathBuf;

use crate::entry::{Batch, VocabEntry};
use crate::normalize::{parse_csv, parse_json};
use crate::{Error, Result};

pub mod builtin;
pub mod remote;

pub use builtin::BuiltinSample;
pub use remote::{FileSource, UrlSource};

pub trait VocabSource {
    fn name(&self) -> String;
    fn fetch(&self) -> Result<String>;

    /// JSON array of records instead of CSV.
    fn is_json(&self) -> bool {
        false
    }
}

/// Resolves a user-supplied location: `builtin`, an http(s) URL, or a path.
pub fn source_for(location: &str) -> Box<dyn VocabSource> {
    let location = location.trim();
    if location.eq_ignore_ascii_case("builtin") {
        Box::new(BuiltinSample)
    } else if location.starts_with("http://") || location.starts_with("https://") {
        Box::new(UrlSource {
            url: location.to_string(),
        })
    } else {
        Box::new(FileSource {
            path: PathBuf::from(location),
        })
    }
}

/// Fetches and normalizes a source. No valid rows is an error so callers can
/// keep what they already have.
pub fn ingest(source: &dyn VocabSource, batch: &Batch) -> Result<Vec<VocabEntry>> {
    let text = source.fetch()?;
    let entries = if source.is_json() {
        parse_json(&text, batch)?
    } else {
        parse_csv(&text, batch)?
    };

    if entries.is_empty() {
        return Err(Error::Empty(source.name()));
    }
    tracing::debug!(source = %source.name(), count = entries.len(), "ingested");
    Ok(entries)
}

/// Result of the startup load.
#[derive(Debug)]
pub struct Loaded {
    pub entries: Vec<VocabEntry>,
    /// Set when the sample dataset stood in for the default source.
    pub notice: Option<String>,
}

/// Loads the default source, falling back to the built-in sample on any
/// failure or an empty result.
pub fn load_default(source: &dyn VocabSource, batch: &Batch) -> Result<Loaded> {
    match ingest(source, batch) {
        Ok(entries) => Ok(Loaded {
            entries,
            notice: None,
        }),
        Err(e) => {
            tracing::warn!(source = %source.name(), error = %e, "default source failed, using sample");
            let entries = ingest(&BuiltinSample, batch)?;
            Ok(Loaded {
                notice: Some(format!(
                    "Could not load {} ({e}); showing {} sample entries instead.",
                    source.name(),
                    entries.len()
                )),
                entries,
            })
        }
    }
}
