//! Logical paths into a TOML document and the tracker used during a rewrite.

use indexmap::IndexMap;
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::str::FromStr;

/// One step of a logical path: a table key or an array index.
///
/// Segments compare by their string form, so `Key("0")` equals `Index(0)`.
#[derive(Debug, Clone, Eq)]
pub enum PathSegment {
    /// A table key
    Key(String),
    /// An array index
    Index(usize),
}

impl PathSegment {
    /// The index this segment addresses, if it is numeric.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathSegment::Index(index) => Some(*index),
            PathSegment::Key(key) => key
                .parse::<usize>()
                .ok()
                .filter(|index| index.to_string() == *key),
        }
    }

    /// Whether this segment is numeric.
    pub fn is_index(&self) -> bool {
        self.as_index().is_some()
    }
}

impl PartialEq for PathSegment {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PathSegment::Key(a), PathSegment::Key(b)) => a == b,
            (PathSegment::Index(a), PathSegment::Index(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }
}

impl Hash for PathSegment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// An owned logical path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<PathSegment>);

impl Path {
    /// Create an empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a segment.
    pub fn push(&mut self, segment: impl Into<PathSegment>) {
        self.0.push(segment.into());
    }

    /// A copy of this path with `segment` appended.
    pub fn with(&self, segment: impl Into<PathSegment>) -> Path {
        let mut path = self.clone();
        path.push(segment);
        path
    }
}

impl Deref for Path {
    type Target = [PathSegment];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Borrow<[PathSegment]> for Path {
    fn borrow(&self) -> &[PathSegment] {
        &self.0
    }
}

impl From<Vec<PathSegment>> for Path {
    fn from(segments: Vec<PathSegment>) -> Self {
        Path(segments)
    }
}

impl From<&[PathSegment]> for Path {
    fn from(segments: &[PathSegment]) -> Self {
        Path(segments.to_vec())
    }
}

impl FromIterator<PathSegment> for Path {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl Extend<PathSegment> for Path {
    fn extend<I: IntoIterator<Item = PathSegment>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for Path {
    type Item = PathSegment;
    type IntoIter = std::vec::IntoIter<PathSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = std::convert::Infallible;

    /// Parse a dotted path such as `env.staging.kv_namespaces.0.id`.
    /// All-digit segments become indices.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Path::new());
        }
        Ok(s.split('.')
            .map(|segment| match segment.parse::<usize>() {
                Ok(index) if index.to_string() == segment => PathSegment::Index(index),
                _ => PathSegment::Key(segment.to_string()),
            })
            .collect())
    }
}

/// Whether two paths have the same length and stringify identically segment
/// by segment.
pub fn paths_equal(a: &[PathSegment], b: &[PathSegment]) -> bool {
    a == b
}

/// The longest prefix of `current` that agrees with `target` position by
/// position.
pub fn matched_prefix<'a>(target: &[PathSegment], current: &'a [PathSegment]) -> &'a [PathSegment] {
    let matched = current
        .iter()
        .zip(target)
        .take_while(|(a, b)| a == b)
        .count();
    &current[..matched]
}

/// Maps each resolved path to the node that last produced it.
#[derive(Debug, Clone)]
pub struct PathTracker<N> {
    paths: IndexMap<Path, N>,
}

impl<N> Default for PathTracker<N> {
    fn default() -> Self {
        Self {
            paths: IndexMap::new(),
        }
    }
}

impl<N> PathTracker<N> {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `node` under `path`, replacing any earlier node with an equal
    /// path.
    pub fn record(&mut self, path: Path, node: N) {
        self.paths.insert(path, node);
    }

    /// The node recorded for `path`.
    pub fn lookup(&self, path: &[PathSegment]) -> Option<&N> {
        self.paths.get(path)
    }

    /// Number of distinct paths recorded.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Recorded paths and nodes, in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &N)> {
        self.paths.iter()
    }
}
