use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("download of {url} failed: {source}")]
    Download {
        url: String,
        source: reqwest::Error,
    },

    #[error(
        "unsupported input {identifier}: not a literal, inline stream, remote reference, \
         or existing local file (inputs provided: {inputs})"
    )]
    UnsupportedInput { identifier: String, inputs: String },

    #[error("input {identifier} has no occurrences")]
    EmptyInput { identifier: String },

    #[error("input {identifier} allows at most {max_occurs} occurrence(s), {supplied} supplied")]
    ExcessOccurrences {
        identifier: String,
        max_occurs: usize,
        supplied: usize,
    },

    #[error("unknown process step: {0}")]
    UnknownStep(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

// Matches from the first character of the message's last line that is neither
// a colon nor a newline, through to the end.
static MESSAGE_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^:\n].*$").expect("valid regex"));

/// Reduce an error message to a form accepted by WPS status payloads.
///
/// The WPS status schema only allows a limited character set in custom
/// messages, and multi-line tracebacks are useless to a remote caller. Keep
/// the trailing line-like segment of the message and strip parentheses and
/// single quotes, so at least the tail of the original error reaches the user.
pub fn sanitize_message(message: &str) -> String {
    let tail = MESSAGE_TAIL
        .find(message)
        .map_or(message, |m| m.as_str());
    tail.replace(['(', ')', '\''], "").trim().to_string()
}

impl Error {
    /// The error's display text, sanitized for embedding in a WPS status
    /// response.
    pub fn user_message(&self) -> String {
        sanitize_message(&self.to_string())
    }
}
