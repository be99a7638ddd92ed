use std::fmt;
use std::io::{Cursor, Read};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Maximum permissible occurrences for a multi-valued input.
pub const MAX_OCCURS: usize = 1000;

/// Scalar value of a literal request parameter.
// Variant order matters for untagged deserialization: bools and integers
// must be tried before floats and strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl LiteralValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            LiteralValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            LiteralValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            LiteralValue::Float(x) => Some(*x),
            LiteralValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            LiteralValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Bool(b) => write!(f, "{b}"),
            LiteralValue::Int(i) => write!(f, "{i}"),
            LiteralValue::Float(x) => write!(f, "{x}"),
            LiteralValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for LiteralValue {
    fn from(value: &str) -> Self {
        LiteralValue::Str(value.to_string())
    }
}

impl From<String> for LiteralValue {
    fn from(value: String) -> Self {
        LiteralValue::Str(value)
    }
}

impl From<i64> for LiteralValue {
    fn from(value: i64) -> Self {
        LiteralValue::Int(value)
    }
}

impl From<i32> for LiteralValue {
    fn from(value: i32) -> Self {
        LiteralValue::Int(value as i64)
    }
}

impl From<u32> for LiteralValue {
    fn from(value: u32) -> Self {
        LiteralValue::Int(value as i64)
    }
}

impl From<usize> for LiteralValue {
    fn from(value: usize) -> Self {
        LiteralValue::Int(value as i64)
    }
}

impl From<f64> for LiteralValue {
    fn from(value: f64) -> Self {
        LiteralValue::Float(value)
    }
}

impl From<bool> for LiteralValue {
    fn from(value: bool) -> Self {
        LiteralValue::Bool(value)
    }
}

/// Inline document streamed in place, never written to disk by the core.
/// Typically a CSV body the hosting framework already holds in memory or on
/// its own spool.
pub struct InputStream(Box<dyn Read + Send>);

impl InputStream {
    pub fn new(reader: impl Read + Send + 'static) -> Self {
        Self(Box::new(reader))
    }

    /// Drain the stream into a string. Consumes the stream; a request input
    /// is read at most once.
    pub fn read_to_string(mut self) -> Result<String> {
        let mut out = String::new();
        self.0.read_to_string(&mut out)?;
        Ok(out)
    }
}

impl Read for InputStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.0.read(buf)
    }
}

impl fmt::Debug for InputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InputStream(..)")
    }
}

impl From<&str> for InputStream {
    fn from(value: &str) -> Self {
        Self::new(Cursor::new(value.as_bytes().to_vec()))
    }
}

impl From<String> for InputStream {
    fn from(value: String) -> Self {
        Self::new(Cursor::new(value.into_bytes()))
    }
}

impl From<Vec<u8>> for InputStream {
    fn from(value: Vec<u8>) -> Self {
        Self::new(Cursor::new(value))
    }
}

/// One supplied value of a request input, tagged with its shape at ingestion
/// time. The host adapter decides the variant once when translating the
/// framework's request object; downstream code matches on it instead of
/// re-inspecting attributes.
#[derive(Debug)]
pub enum Occurrence {
    Literal(LiteralValue),
    Remote(String),
    Local(PathBuf),
    Stream(InputStream),
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Occurrence::Literal(value) => write!(f, "literal({value})"),
            Occurrence::Remote(url) => write!(f, "url({url})"),
            Occurrence::Local(path) => write!(f, "file({})", path.display()),
            Occurrence::Stream(_) => f.write_str("stream(<inline>)"),
        }
    }
}

/// Declared kind of an input, derived from its occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Literal,
    Complex,
}

/// A named, possibly multi-valued entry of an incoming request. Built by the
/// host adapter from the framework's request object; read-only to the
/// collector.
#[derive(Debug)]
pub struct RequestInput {
    pub identifier: String,
    pub max_occurs: usize,
    pub occurrences: Vec<Occurrence>,
}

impl RequestInput {
    pub fn new(identifier: impl Into<String>, max_occurs: usize) -> Self {
        Self {
            identifier: identifier.into(),
            max_occurs,
            occurrences: Vec::new(),
        }
    }

    /// An input declared with multiplicity exactly one; collects to a scalar.
    pub fn single(identifier: impl Into<String>) -> Self {
        Self::new(identifier, 1)
    }

    /// An input declared with multiplicity up to [`MAX_OCCURS`]; collects to
    /// a sequence even when one occurrence is supplied.
    pub fn multi(identifier: impl Into<String>) -> Self {
        Self::new(identifier, MAX_OCCURS)
    }

    /// A single-valued literal input carrying `value`.
    pub fn literal(identifier: impl Into<String>, value: impl Into<LiteralValue>) -> Self {
        Self::single(identifier).value(value)
    }

    pub fn value(self, value: impl Into<LiteralValue>) -> Self {
        self.push(Occurrence::Literal(value.into()))
    }

    pub fn remote(self, url: impl Into<String>) -> Self {
        self.push(Occurrence::Remote(url.into()))
    }

    pub fn local(self, path: impl Into<PathBuf>) -> Self {
        self.push(Occurrence::Local(path.into()))
    }

    pub fn stream(self, stream: impl Into<InputStream>) -> Self {
        self.push(Occurrence::Stream(stream.into()))
    }

    pub fn push(mut self, occurrence: Occurrence) -> Self {
        self.occurrences.push(occurrence);
        self
    }

    pub fn kind(&self) -> InputKind {
        match self.occurrences.first() {
            Some(Occurrence::Literal(_)) => InputKind::Literal,
            _ => InputKind::Complex,
        }
    }
}

impl fmt::Display for RequestInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=[", self.identifier)?;
        for (i, occurrence) in self.occurrences.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{occurrence}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::{InputKind, InputStream, LiteralValue, RequestInput};

    #[test]
    fn builders_set_multiplicity() {
        assert_eq!(RequestInput::single("x").max_occurs, 1);
        assert_eq!(RequestInput::multi("x").max_occurs, super::MAX_OCCURS);
        assert_eq!(RequestInput::new("x", 5).max_occurs, 5);
    }

    #[test]
    fn kind_follows_occurrences() {
        assert_eq!(RequestInput::literal("argc", 3).kind(), InputKind::Literal);
        assert_eq!(
            RequestInput::single("nc").local("/tmp/a.nc").kind(),
            InputKind::Complex
        );
        assert_eq!(
            RequestInput::single("csv").stream("a,b\n1,2\n").kind(),
            InputKind::Complex
        );
    }

    #[test]
    fn display_summarizes_occurrences() {
        let input = RequestInput::multi("netcdf")
            .local("/tmp/a.nc")
            .remote("https://example.org/b.nc");
        assert_eq!(
            input.to_string(),
            "netcdf=[file(/tmp/a.nc), url(https://example.org/b.nc)]"
        );
    }

    #[test]
    fn stream_reads_back_its_content() {
        let stream = InputStream::from("a,b\n1,2\n");
        assert_eq!(stream.read_to_string().unwrap(), "a,b\n1,2\n");
    }

    #[test]
    fn literal_values_convert_and_accessorize() {
        assert_eq!(LiteralValue::from(3).as_int(), Some(3));
        assert_eq!(LiteralValue::from(3).as_float(), Some(3.0));
        assert_eq!(LiteralValue::from("tasmax").as_str(), Some("tasmax"));
        assert_eq!(LiteralValue::from(true).as_bool(), Some(true));
        assert_eq!(LiteralValue::from(0.5).to_string(), "0.5");
    }

    #[test]
    fn literal_values_deserialize_untagged() {
        assert_eq!(
            serde_json::from_str::<LiteralValue>("3").unwrap(),
            LiteralValue::Int(3)
        );
        assert_eq!(
            serde_json::from_str::<LiteralValue>("true").unwrap(),
            LiteralValue::Bool(true)
        );
        assert_eq!(
            serde_json::from_str::<LiteralValue>("\"msl\"").unwrap(),
            LiteralValue::Str("msl".to_string())
        );
    }
}
