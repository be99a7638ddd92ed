use std::fmt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use reqwest::blocking::Client as HttpClient;
use url::Url;

use crate::classify::{Classifier, http_client};
use crate::dataset::DatasetAccess;
use crate::error::{Error, Result};

/// A value usable as a path by the rest of the pipeline: either a URL the
/// dataset library can open directly, or a file already on local disk. By
/// construction never an unopened remote reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Url(String),
    Path(PathBuf),
}

impl Resolved {
    pub fn as_url(&self) -> Option<&str> {
        match self {
            Resolved::Url(url) => Some(url),
            Resolved::Path(_) => None,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Resolved::Url(_) => None,
            Resolved::Path(path) => Some(path),
        }
    }
}

impl fmt::Display for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Url(url) => f.write_str(url),
            Resolved::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Turns request references into openable locations.
///
/// A process cannot read an HTTPServer URL without downloading it, while an
/// OPeNDAP URL can be handed to the dataset library as if it were a filepath.
/// DAP URLs therefore pass through unchanged, genuine remote references get
/// materialized into the working directory, and bare local paths are returned
/// as-is.
pub struct Resolver {
    http: HttpClient,
    classifier: Classifier,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("classifier", &self.classifier)
            .finish_non_exhaustive()
    }
}

impl Resolver {
    pub fn new() -> Result<Self> {
        Self::build(None)
    }

    pub fn with_probe(probe: Box<dyn DatasetAccess>) -> Result<Self> {
        Self::build(Some(probe))
    }

    fn build(probe: Option<Box<dyn DatasetAccess>>) -> Result<Self> {
        let http = http_client()?;
        let classifier = Classifier::from_client(http.clone(), probe);
        Ok(Self { http, classifier })
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Resolve `url` against a writable working directory.
    ///
    /// Creates at most one file per call, named after the URL's final path
    /// segment. Two distinct URLs sharing a final segment overwrite each
    /// other's download; that behavior is kept for compatibility with
    /// existing process pipelines. No cleanup happens here: downloaded files
    /// live and die with the working directory.
    pub fn resolve(&self, workdir: &Path, url: &str) -> Result<Resolved> {
        if self.classifier.classify(url).is_dap() {
            return Ok(Resolved::Url(url.to_string()));
        }

        match Url::parse(url) {
            Ok(parsed) if parsed.has_host() => self.download(workdir, url).map(Resolved::Path),
            _ => Ok(Resolved::Path(PathBuf::from(url))),
        }
    }

    fn download(&self, workdir: &Path, url: &str) -> Result<PathBuf> {
        let name = url.rsplit('/').next().unwrap_or(url);
        let target = workdir.join(name);

        let mut response = self
            .http
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|source| Error::Download {
                url: url.to_string(),
                source,
            })?;

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&target)?;
        response.copy_to(&mut file).map_err(|source| Error::Download {
            url: url.to_string(),
            source,
        })?;

        Ok(target)
    }
}
