use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::inputs::{InputStream, LiteralValue, Occurrence, RequestInput};
use crate::resolve::{Resolved, Resolver};

/// A fully resolved occurrence: by the time a value lands here it is a plain
/// scalar, a file on local disk, a URL the dataset library opens directly, or
/// an inline stream. Never an unopened remote reference.
#[derive(Debug)]
pub enum ResolvedValue {
    Literal(LiteralValue),
    Path(PathBuf),
    Url(String),
    Stream(InputStream),
}

impl ResolvedValue {
    pub fn as_literal(&self) -> Option<&LiteralValue> {
        match self {
            ResolvedValue::Literal(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            ResolvedValue::Path(path) => Some(path),
            _ => None,
        }
    }

    pub fn as_url(&self) -> Option<&str> {
        match self {
            ResolvedValue::Url(url) => Some(url),
            _ => None,
        }
    }

    pub fn into_stream(self) -> Option<InputStream> {
        match self {
            ResolvedValue::Stream(stream) => Some(stream),
            _ => None,
        }
    }
}

/// Resolved value(s) of one input. `Multiple` iff the input was declared with
/// `max_occurs > 1`, even when a single occurrence was supplied; downstream
/// code relies on the shape matching the declaration, not the request.
#[derive(Debug)]
pub enum ResolvedInput {
    Single(ResolvedValue),
    Multiple(Vec<ResolvedValue>),
}

impl ResolvedInput {
    pub fn as_single(&self) -> Option<&ResolvedValue> {
        match self {
            ResolvedInput::Single(value) => Some(value),
            ResolvedInput::Multiple(_) => None,
        }
    }

    pub fn as_multiple(&self) -> Option<&[ResolvedValue]> {
        match self {
            ResolvedInput::Single(_) => None,
            ResolvedInput::Multiple(values) => Some(values),
        }
    }
}

/// Ordered mapping from input identifier to resolved value(s). Iteration
/// follows the declaration order of the request's input list, which matters
/// when handlers destructure positionally.
#[derive(Debug, Default)]
pub struct CollectedArguments {
    map: IndexMap<String, ResolvedInput>,
}

impl CollectedArguments {
    pub fn get(&self, identifier: &str) -> Option<&ResolvedInput> {
        self.map.get(identifier)
    }

    /// Remove and return one input, preserving the order of the rest. Needed
    /// to move stream values out of the collection.
    pub fn take(&mut self, identifier: &str) -> Option<ResolvedInput> {
        self.map.shift_remove(identifier)
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ResolvedInput)> {
        self.map.iter()
    }
}

impl IntoIterator for CollectedArguments {
    type Item = (String, ResolvedInput);
    type IntoIter = indexmap::map::IntoIter<String, ResolvedInput>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.into_iter()
    }
}

impl<'a> IntoIterator for &'a CollectedArguments {
    type Item = (&'a String, &'a ResolvedInput);
    type IntoIter = indexmap::map::Iter<'a, String, ResolvedInput>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.iter()
    }
}

impl fmt::Display for CollectedArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, identifier) in self.map.keys().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(identifier)?;
        }
        f.write_str("}")
    }
}

/// Walks the request's declared inputs and resolves each occurrence.
///
/// Collection is all-or-nothing: the first unsupported occurrence or failed
/// download aborts the whole request, and download errors propagate untouched.
#[derive(Debug)]
pub struct Collector {
    resolver: Resolver,
}

impl Collector {
    pub fn new() -> Result<Self> {
        Ok(Self {
            resolver: Resolver::new()?,
        })
    }

    pub fn with_probe(probe: Box<dyn crate::dataset::DatasetAccess>) -> Result<Self> {
        Ok(Self {
            resolver: Resolver::with_probe(probe)?,
        })
    }

    pub fn with_resolver(resolver: Resolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Collect `inputs` in declaration order into a [`CollectedArguments`].
    ///
    /// Literals pass through unchanged, streams are handed over in place,
    /// remote references go through the resolver, and local references must
    /// exist as files on disk. An input declared with `max_occurs == 1`
    /// resolves to a scalar, anything else to an ordered sequence.
    pub fn collect(
        &self,
        inputs: Vec<RequestInput>,
        workdir: &Path,
    ) -> Result<CollectedArguments> {
        // Rendered up front: diagnostics for a failing input include the full
        // input set, which is consumed as we go.
        let summary = inputs
            .iter()
            .map(RequestInput::to_string)
            .collect::<Vec<_>>()
            .join(", ");

        let mut map = IndexMap::with_capacity(inputs.len());
        for input in inputs {
            let RequestInput {
                identifier,
                max_occurs,
                occurrences,
            } = input;

            if occurrences.is_empty() {
                return Err(Error::EmptyInput { identifier });
            }
            if occurrences.len() > max_occurs {
                return Err(Error::ExcessOccurrences {
                    identifier,
                    max_occurs,
                    supplied: occurrences.len(),
                });
            }

            let mut values = Vec::with_capacity(occurrences.len());
            for occurrence in occurrences {
                values.push(self.resolve_occurrence(&identifier, occurrence, workdir, &summary)?);
            }

            let resolved = if max_occurs > 1 {
                ResolvedInput::Multiple(values)
            } else {
                match values.pop() {
                    Some(value) => ResolvedInput::Single(value),
                    None => return Err(Error::EmptyInput { identifier }),
                }
            };
            map.insert(identifier, resolved);
        }

        Ok(CollectedArguments { map })
    }

    fn resolve_occurrence(
        &self,
        identifier: &str,
        occurrence: Occurrence,
        workdir: &Path,
        summary: &str,
    ) -> Result<ResolvedValue> {
        match occurrence {
            Occurrence::Literal(value) => Ok(ResolvedValue::Literal(value)),
            Occurrence::Stream(stream) => Ok(ResolvedValue::Stream(stream)),
            Occurrence::Remote(url) => Ok(match self.resolver.resolve(workdir, &url)? {
                Resolved::Url(url) => ResolvedValue::Url(url),
                Resolved::Path(path) => ResolvedValue::Path(path),
            }),
            Occurrence::Local(path) if path.is_file() => Ok(ResolvedValue::Path(path)),
            Occurrence::Local(_) => Err(Error::UnsupportedInput {
                identifier: identifier.to_string(),
                inputs: summary.to_string(),
            }),
        }
    }
}

/// Collect with a default [`Collector`] (no dataset probe).
pub fn collect_args(inputs: Vec<RequestInput>, workdir: &Path) -> Result<CollectedArguments> {
    Collector::new()?.collect(inputs, workdir)
}
