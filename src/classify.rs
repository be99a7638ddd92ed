use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::dataset::DatasetAccess;
use crate::error::Result;

/// Per-request timeout for the classification HEAD probe. Downloads issued by
/// the resolver are not bounded by this.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of classifying a URL: a DAP endpoint can be opened in place by a
/// dataset library, anything else has to be treated as bytes (downloaded or
/// read from disk).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind {
    Dap,
    Other,
}

impl UrlKind {
    pub fn is_dap(&self) -> bool {
        matches!(self, UrlKind::Dap)
    }
}

/// Decides whether a URL points at a DAP endpoint.
///
/// The DAP standard requires every response to carry a `Content-Description`
/// header whose value starts with one of the `dods-dds | dods-das | dods-data
/// | dods-error` tags. Some OPeNDAP servers omit the header anyway, so when it
/// is absent the classifier falls back to actually opening the resource
/// through a [`DatasetAccess`] probe, if one was supplied.
pub struct Classifier {
    http: HttpClient,
    probe: Option<Box<dyn DatasetAccess>>,
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("probe", &self.probe.is_some())
            .finish_non_exhaustive()
    }
}

impl Classifier {
    pub fn new() -> Result<Self> {
        Ok(Self::from_client(http_client()?, None))
    }

    pub fn with_probe(probe: Box<dyn DatasetAccess>) -> Result<Self> {
        Ok(Self::from_client(http_client()?, Some(probe)))
    }

    pub(crate) fn from_client(http: HttpClient, probe: Option<Box<dyn DatasetAccess>>) -> Self {
        Self { http, probe }
    }

    /// Classify a URL. Infallible: every probe failure (connection error,
    /// malformed or unsupported scheme, timeout) means [`UrlKind::Other`].
    ///
    /// False negatives are accepted: a DAP server that is slow or
    /// misconfigured gets treated as a plain byte source and downloaded in
    /// full, which is wasteful but correct.
    pub fn classify(&self, url: &str) -> UrlKind {
        let response = match self.http.head(url).timeout(PROBE_TIMEOUT).send() {
            Ok(response) => response,
            Err(_) => return UrlKind::Other,
        };

        match response.headers().get("content-description") {
            Some(value) => {
                let starts_with_dods = value
                    .to_str()
                    .map(|v| v.to_ascii_lowercase().starts_with("dods"))
                    .unwrap_or(false);
                if starts_with_dods {
                    UrlKind::Dap
                } else {
                    UrlKind::Other
                }
            }
            None => match &self.probe {
                Some(probe) => match probe.open_format(url) {
                    Ok(format) if format.is_dap() => UrlKind::Dap,
                    Ok(_) | Err(_) => UrlKind::Other,
                },
                None => UrlKind::Other,
            },
        }
    }
}

/// Convenience check with a default classifier (no dataset probe). Returns
/// `false` even if the HTTP client cannot be built; this never raises.
pub fn is_dap_url(url: &str) -> bool {
    Classifier::new()
        .map(|classifier| classifier.classify(url).is_dap())
        .unwrap_or(false)
}

/// Shared blocking client: identifying user agent, no total timeout (full
/// downloads may legitimately run long; the HEAD probe sets its own).
pub(crate) fn http_client() -> Result<HttpClient> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("wps-kit/0.1"));

    let http = HttpClient::builder()
        .default_headers(headers)
        .timeout(None)
        .build()?;
    Ok(http)
}

#[cfg(test)]
mod tests {
    use super::{Classifier, UrlKind, is_dap_url};

    #[test]
    fn unreachable_url_is_other() {
        let classifier = Classifier::new().unwrap();
        // Nothing listens on the discard port.
        assert_eq!(classifier.classify("http://127.0.0.1:9/data.nc"), UrlKind::Other);
    }

    #[test]
    fn malformed_scheme_is_other() {
        let classifier = Classifier::new().unwrap();
        assert_eq!(classifier.classify("htp:/not-a-url"), UrlKind::Other);
    }

    #[test]
    fn bare_local_path_is_other() {
        let classifier = Classifier::new().unwrap();
        assert_eq!(classifier.classify("/tmp/some_file.nc"), UrlKind::Other);
    }

    #[test]
    fn convenience_check_never_raises() {
        assert!(!is_dap_url("http://127.0.0.1:9/data.nc"));
        assert!(!is_dap_url("not a url at all"));
    }
}
