//! Field path representation for navigating form documents.
//!
//! A path is a sequence of segments describing a location in a nested value
//! document. Each segment is either a key (for mappings) or an index (for
//! sequences). Paths are written as dotted expressions with optional bracket
//! indices: `"a.b[0].c"`, `"a.b.0.c"` and `["a", "b", 0, "c"]` all address the
//! same location.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single segment in a field path.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seg {
    /// Mapping key access: `{"key": value}`
    Key(String),
    /// Sequence index access: `[index]`
    Index(usize),
}

impl Seg {
    /// Create a key segment.
    #[inline]
    pub fn key(k: impl Into<String>) -> Self {
        Seg::Key(k.into())
    }

    /// Returns true if this is an index segment.
    #[inline]
    pub fn is_index(&self) -> bool {
        matches!(self, Seg::Index(_))
    }
}

impl fmt::Display for Seg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seg::Key(k) => write!(f, "{}", k),
            Seg::Index(i) => write!(f, "[{}]", i),
        }
    }
}

impl From<String> for Seg {
    fn from(s: String) -> Self {
        Seg::Key(s)
    }
}

impl From<&str> for Seg {
    fn from(s: &str) -> Self {
        Seg::Key(s.to_owned())
    }
}

impl From<usize> for Seg {
    fn from(i: usize) -> Self {
        Seg::Index(i)
    }
}

/// A complete path into a form document.
///
/// Paths are compared segment by segment, so the expressions `"b.0"` and
/// `"b[0]"` produce equal paths and can be used interchangeably as field
/// identifiers.
///
/// # Examples
///
/// ```
/// use formix_state::{parse_path, path};
///
/// let built = path!("users", 0, "name");
/// assert_eq!(built, parse_path("users[0].name"));
/// assert_eq!(built, parse_path("users.0.name"));
/// assert_eq!(built.to_string(), "users[0].name");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "PathRepr")]
pub struct Path(Vec<Seg>);

impl Path {
    /// Create an empty path (root).
    #[inline]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Create a path from a vector of segments.
    #[inline]
    pub fn from_segments(segments: Vec<Seg>) -> Self {
        Self(segments)
    }

    /// Push a segment onto the path (mutating).
    #[inline]
    pub fn push(&mut self, seg: Seg) {
        self.0.push(seg);
    }

    /// Get the segments of this path.
    #[inline]
    pub fn segments(&self) -> &[Seg] {
        &self.0
    }

    /// Check if this path is empty (root).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the number of segments in this path.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Renders the canonical expression form: `a.b[0].c`.
///
/// A leading index renders without a dot (`[0].name`); the root path renders
/// as an empty string.
impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            match seg {
                Seg::Key(k) if i > 0 => write!(f, ".{}", k)?,
                other => write!(f, "{}", other)?,
            }
        }
        Ok(())
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        parse_path(s)
    }
}

impl From<String> for Path {
    fn from(s: String) -> Self {
        parse_path(&s)
    }
}

impl From<&String> for Path {
    fn from(s: &String) -> Self {
        parse_path(s)
    }
}

impl From<&Path> for Path {
    fn from(p: &Path) -> Self {
        p.clone()
    }
}

/// Wire forms accepted when deserializing a [`Path`]: an expression string
/// (`"a.b[0]"`) or an explicit segment list (`["a", "b", 0]`).
#[derive(Deserialize)]
#[serde(untagged)]
enum PathRepr {
    Expr(String),
    Segments(Vec<Seg>),
}

impl From<PathRepr> for Path {
    fn from(repr: PathRepr) -> Self {
        match repr {
            PathRepr::Expr(expr) => parse_path(&expr),
            PathRepr::Segments(segments) => Path(segments),
        }
    }
}

/// Parse a dotted/bracketed path expression into a [`Path`].
///
/// - segments are separated by `.`
/// - `name[n]` becomes a key segment followed by an index segment; repeated
///   groups (`name[n][m]`) add one index segment each and a bare `[n]`
///   is just an index
/// - a segment that is entirely a non-negative integer becomes an index
/// - anything else is a key
///
/// Empty segments are skipped, so `""` is the root path.
pub fn parse_path(expr: &str) -> Path {
    let mut result = Path::root();
    for segment in expr.split('.') {
        if segment.is_empty() {
            continue;
        }
        if let Some((name, indexes)) = split_brackets(segment) {
            if !name.is_empty() {
                result.push(parse_index(name).map_or_else(|| Seg::key(name), Seg::Index));
            }
            for index in indexes {
                result.push(Seg::Index(index));
            }
        } else if let Some(index) = parse_index(segment) {
            result.push(Seg::Index(index));
        } else {
            result.push(Seg::Key(segment.to_owned()));
        }
    }
    result
}

/// Split trailing `[n]` accessors off a segment: `grid[0][1]` is
/// `("grid", [0, 1])`. `None` unless every bracket group is a valid index.
fn split_brackets(segment: &str) -> Option<(&str, Vec<usize>)> {
    let mut rest = segment;
    let mut indexes = Vec::new();
    while let Some(inner) = rest.strip_suffix(']') {
        let open = inner.rfind('[')?;
        indexes.push(parse_index(&inner[open + 1..])?);
        rest = &inner[..open];
    }
    if indexes.is_empty() || rest.contains(['[', ']']) {
        return None;
    }
    indexes.reverse();
    Some((rest, indexes))
}

fn parse_index(s: &str) -> Option<usize> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Construct a `Path` from a sequence of segments.
///
/// # Examples
///
/// ```
/// use formix_state::path;
///
/// // String literals become Key segments
/// let p = path!("users", "alice", "email");
///
/// // Numbers become Index segments
/// let p = path!("items", 0, "name");
/// ```
#[macro_export]
macro_rules! path {
    () => {
        $crate::Path::root()
    };
    ($($seg:expr),+ $(,)?) => {{
        let mut p = $crate::Path::root();
        $(
            p.push($crate::path!(@seg $seg));
        )+
        p
    }};
    (@seg $seg:expr) => {
        $crate::Seg::from($seg)
    };
}
