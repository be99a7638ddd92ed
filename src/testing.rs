//! Helpers for downstream process test suites: THREDDS URLs for the shared
//! test datasets, and `file://` URLs for local fixtures.

use std::env;
use std::path::Path;

use url::Url;

use crate::error::{Error, Result};

/// Environment variable overriding the THREDDS root used by the URL helpers.
/// Test-harness-only; nothing in the runtime contract reads it.
pub const THREDDS_BASE_VAR: &str = "WPS_KIT_THREDDS_BASE";

const DEFAULT_THREDDS_BASE: &str = "https://docker-dev03.pcic.uvic.ca/twitcher/ows/proxy/thredds";

/// THREDDS root serving the shared test datasets.
pub fn thredds_base() -> String {
    env::var(THREDDS_BASE_VAR).unwrap_or_else(|_| DEFAULT_THREDDS_BASE.to_string())
}

/// OPeNDAP (dodsC) URL for a shared test dataset.
pub fn opendap_url(file_name: &str) -> String {
    format!("{}/dodsC/datasets/TestData/{file_name}", thredds_base())
}

/// Plain fileServer URL for a shared test dataset.
pub fn http_url(file_name: &str) -> String {
    format!("{}/fileServer/datasets/TestData/{file_name}", thredds_base())
}

/// `file://` URL for a local fixture. Relative paths are resolved against the
/// current directory.
pub fn file_url(path: &Path) -> Result<String> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()?.join(path)
    };
    let url = Url::from_file_path(&absolute).map_err(|()| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("cannot form a file URL from {}", absolute.display()),
        ))
    })?;
    Ok(url.to_string())
}
