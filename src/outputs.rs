//! Retrieval helpers for produced process outputs.
//!
//! Once a process has run, its outputs come back as locations: `file://` or
//! `http(s)://` URLs, bare paths, or a metalink grouping several of them.
//! These helpers pull the referenced content back into native values, mostly
//! for downstream test harnesses and notebook use.

use std::fs;
use std::io;

use url::Url;

use crate::error::{Error, Result};
use crate::metalink::metalink_urls;

/// Fetch the text content behind a location: `http(s)` via GET (non-2xx is an
/// error), `file://` URLs and bare paths via the filesystem.
pub fn fetch_text(location: &str) -> Result<String> {
    match Url::parse(location) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {
            let response = reqwest::blocking::get(location)
                .and_then(|r| r.error_for_status())
                .map_err(|source| Error::Download {
                    url: location.to_string(),
                    source,
                })?;
            let text = response.text().map_err(|source| Error::Download {
                url: location.to_string(),
                source,
            })?;
            Ok(text)
        }
        Ok(url) if url.scheme() == "file" => {
            let path = url.to_file_path().map_err(|()| {
                Error::Io(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("invalid file URL: {location}"),
                ))
            })?;
            Ok(fs::read_to_string(path)?)
        }
        _ => Ok(fs::read_to_string(location)?),
    }
}

/// Fetch and parse a JSON document.
pub fn fetch_json(location: &str) -> Result<serde_json::Value> {
    let text = fetch_text(location)?;
    Ok(serde_json::from_str(&text)?)
}

/// Fetch a metalink document and return the locations it groups.
pub fn fetch_metalink(location: &str) -> Result<Vec<String>> {
    let text = fetch_text(location)?;
    Ok(metalink_urls(&text))
}

/// A constructed process output.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Text(String),
    Json(serde_json::Value),
    /// A location passed through as-is: netCDF files, DAP URLs, and anything
    /// else the caller opens with its own tooling.
    Location(String),
}

/// Construct native values from output locations, dispatching on extension.
///
/// `.txt` fetches to [`Output::Text`], `.json` parses to [`Output::Json`],
/// `.meta4`/`.metalink` recurses into the grouped files and splices the
/// results inline, and everything else passes through as
/// [`Output::Location`].
pub fn auto_construct_outputs(
    locations: impl IntoIterator<Item = impl Into<String>>,
) -> Result<Vec<Output>> {
    let mut outputs = Vec::new();
    for location in locations {
        let location: String = location.into();
        if location.ends_with(".txt") {
            outputs.push(Output::Text(fetch_text(&location)?));
        } else if location.ends_with(".json") {
            outputs.push(Output::Json(fetch_json(&location)?));
        } else if location.ends_with(".meta4") || location.ends_with(".metalink") {
            let grouped: Vec<String> = fetch_metalink(&location)?;
            outputs.extend(auto_construct_outputs(grouped)?);
        } else {
            outputs.push(Output::Location(location));
        }
    }
    Ok(outputs)
}
