//! Diagnostic paths into nested request/response structures.

use std::fmt;

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object key
    Key(String),
    /// Array index
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Location inside an expected/actual value tree.
///
/// Paths are immutable: [`Path::key`] and [`Path::index`] return a new child
/// path and leave the parent untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    /// A path with a single key segment, e.g. `body`.
    #[must_use]
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            segments: vec![PathSegment::Key(name.into())],
        }
    }

    /// Child path for an object key.
    #[must_use]
    pub fn key(&self, key: impl Into<String>) -> Self {
        self.child(PathSegment::Key(key.into()))
    }

    /// Child path for an array index.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        self.child(PathSegment::Index(index))
    }

    fn child(&self, segment: PathSegment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Self { segments }
    }

    /// The segments of this path, outermost first.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the path has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl<S: Into<PathSegment>> FromIterator<S> for Path {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_path(&self.segments))
    }
}

/// Render segments as `a.b[2].c`.
///
/// The first segment is never prefixed; later keys get a leading `.` and
/// indices are wrapped in brackets.
#[must_use]
pub fn format_path(segments: &[PathSegment]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        match segment {
            PathSegment::Key(key) if i == 0 => out.push_str(key),
            PathSegment::Index(index) if i == 0 => out.push_str(&index.to_string()),
            PathSegment::Key(key) => {
                out.push('.');
                out.push_str(key);
            }
            PathSegment::Index(index) => {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_nested_path() {
        let path = Path::root("a").key("b").index(2).key("c");
        assert_eq!(path.to_string(), "a.b[2].c");
    }

    #[test]
    fn test_format_single_segment() {
        assert_eq!(Path::root("x").to_string(), "x");
        assert_eq!(format_path(&[PathSegment::Index(3)]), "3");
        assert_eq!(Path::default().to_string(), "");
    }

    #[test]
    fn test_child_does_not_mutate_parent() {
        let parent = Path::root("body");
        let child = parent.key("items").index(0);

        assert_eq!(parent.len(), 1);
        assert_eq!(child.len(), 3);
        assert_eq!(child.segments()[2], PathSegment::Index(0));
    }

    #[test]
    fn test_collect_from_segments() {
        let path: Path = vec![
            PathSegment::from("a"),
            PathSegment::from("b"),
            PathSegment::from(2_usize),
            PathSegment::from("c"),
        ]
        .into_iter()
        .collect();
        assert_eq!(path, Path::root("a").key("b").index(2).key("c"));
    }
}
