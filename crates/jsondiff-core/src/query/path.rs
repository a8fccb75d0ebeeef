use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use super::QueryError;
use crate::{Node, Number};

/// Represents a single step from a value to one of its children.
///
/// ```
/// # use jsondiff_core::query::PathSegment;
/// let key = PathSegment::key("name");
/// let index = PathSegment::index(2);
/// assert!(matches!(key, PathSegment::Key(_)));
/// assert!(matches!(index, PathSegment::Index(_)));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object key lookup.
    Key(String),
    /// Array index lookup; negative values count from the end.
    Index(i64),
    /// Array range `start..end`, already clamped to the array length.
    Slice {
        /// First element of the range.
        start: usize,
        /// One past the last element of the range.
        end: usize,
    },
}

impl PathSegment {
    /// Creates a key segment.
    #[must_use]
    pub fn key<S>(value: S) -> Self
    where
        S: Into<String>,
    {
        Self::Key(value.into())
    }

    /// Creates an index segment.
    #[must_use]
    pub fn index<I>(value: I) -> Self
    where
        I: Into<i64>,
    {
        Self::Index(value.into())
    }

    /// Returns the jq representation of the segment (`"key"`, `0`, `{"start":..,"end":..}`).
    #[must_use]
    pub fn to_node(&self) -> Node {
        match self {
            Self::Key(key) => Node::String(key.clone()),
            Self::Index(index) => Node::Number(Number::from(*index)),
            Self::Slice { start, end } => {
                let mut object = BTreeMap::new();
                object.insert("start".to_string(), Node::Number(Number::from(*start as i64)));
                object.insert("end".to_string(), Node::Number(Number::from(*end as i64)));
                Node::Object(object)
            }
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Index(_) => 0,
            Self::Key(_) => 1,
            Self::Slice { .. } => 2,
        }
    }
}

// Numbers sort before strings, strings before objects, as jq orders values.
impl Ord for PathSegment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Index(a), Self::Index(b)) => a.cmp(b),
            (Self::Key(a), Self::Key(b)) => a.cmp(b),
            (Self::Slice { start: s1, end: e1 }, Self::Slice { start: s2, end: e2 }) => {
                (s1, e1).cmp(&(s2, e2))
            }
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for PathSegment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_node())
    }
}

/// Represents the location of a value within a document.
///
/// ```
/// # use jsondiff_core::query::{Path, PathSegment};
/// let path = Path::new().with_segment(PathSegment::key("foo"))
///     .with_segment(PathSegment::index(0));
/// assert_eq!(path.len(), 2);
/// assert_eq!(path.to_string(), "[\"foo\",0]");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path(Vec<PathSegment>);

impl Path {
    /// Creates an empty path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new segment, returning the extended path.
    #[must_use]
    pub fn with_segment(mut self, segment: PathSegment) -> Self {
        self.0.push(segment);
        self
    }

    /// Returns the underlying segments.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Indicates whether the path is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the path as a jq path array.
    #[must_use]
    pub fn to_node(&self) -> Node {
        Node::Array(self.0.iter().map(PathSegment::to_node).collect())
    }
}

impl From<Vec<PathSegment>> for Path {
    fn from(value: Vec<PathSegment>) -> Self {
        Self(value)
    }
}

impl From<PathSegment> for Path {
    fn from(value: PathSegment) -> Self {
        Self(vec![value])
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_node())
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a PathSegment;
    type IntoIter = std::slice::Iter<'a, PathSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Largest index an assignment may grow an array to, as in jq.
pub(crate) const MAX_ARRAY_INDEX: usize = 536_870_911;

/// Clamps jq slice bounds against an array (or string) of `len` elements.
pub(crate) fn slice_bounds(len: usize, start: Option<i64>, end: Option<i64>) -> (usize, usize) {
    let resolve = |bound: i64| -> usize {
        if bound < 0 {
            usize::try_from(len as i64 + bound).unwrap_or(0)
        } else {
            usize::try_from(bound).map_or(len, |bound| bound.min(len))
        }
    };
    let start = start.map_or(0, resolve);
    let end = end.map_or(len, resolve).max(start);
    (start, end)
}

/// Resolves a possibly negative index against `len`; `None` when it points before the start.
pub(crate) fn resolve_index(len: usize, index: i64) -> Option<usize> {
    if index < 0 {
        usize::try_from(len as i64 + index).ok()
    } else {
        usize::try_from(index).ok()
    }
}

pub(crate) fn cannot_index(node: &Node, segment: &PathSegment) -> QueryError {
    QueryError::CannotIndex { kind: node.kind(), key: segment.to_string() }
}

/// Reads the value at `segments`, yielding `null` for anything missing.
pub(crate) fn get_path(node: &Node, segments: &[PathSegment]) -> Result<Node, QueryError> {
    let Some((segment, rest)) = segments.split_first() else {
        return Ok(node.clone());
    };
    let child = match (node, segment) {
        (Node::Null, _) => Node::Null,
        (Node::Object(map), PathSegment::Key(key)) => map.get(key).cloned().unwrap_or(Node::Null),
        (Node::Array(items), PathSegment::Index(index)) => resolve_index(items.len(), *index)
            .and_then(|index| items.get(index).cloned())
            .unwrap_or(Node::Null),
        (Node::Array(items), PathSegment::Slice { start, end }) => {
            let end = (*end).min(items.len());
            let start = (*start).min(end);
            Node::Array(items[start..end].to_vec())
        }
        (other, segment) => return Err(cannot_index(other, segment)),
    };
    get_path(&child, rest)
}

/// Replaces the value at `segments` with `value`, creating containers along the way.
pub(crate) fn set_path(node: Node, segments: &[PathSegment], value: Node) -> Result<Node, QueryError> {
    let Some((segment, rest)) = segments.split_first() else {
        return Ok(value);
    };
    match (node, segment) {
        (Node::Null, PathSegment::Key(_)) => set_path(Node::Object(BTreeMap::new()), segments, value),
        (Node::Null, PathSegment::Index(_) | PathSegment::Slice { .. }) => {
            set_path(Node::Array(Vec::new()), segments, value)
        }
        (Node::Object(mut map), PathSegment::Key(key)) => {
            let child = map.remove(key).unwrap_or(Node::Null);
            map.insert(key.clone(), set_path(child, rest, value)?);
            Ok(Node::Object(map))
        }
        (Node::Array(mut items), PathSegment::Index(index)) => {
            let index = resolve_index(items.len(), *index).ok_or(QueryError::OutOfBounds)?;
            if index > MAX_ARRAY_INDEX {
                return Err(QueryError::IndexTooLarge);
            }
            if index >= items.len() {
                items.resize(index + 1, Node::Null);
            }
            let child = std::mem::replace(&mut items[index], Node::Null);
            items[index] = set_path(child, rest, value)?;
            Ok(Node::Array(items))
        }
        (Node::Array(mut items), PathSegment::Slice { start, end }) => {
            let end = (*end).min(items.len());
            let start = (*start).min(end);
            let current = Node::Array(items[start..end].to_vec());
            let Node::Array(replacement) = set_path(current, rest, value)? else {
                return Err(QueryError::SliceAssignment);
            };
            items.splice(start..end, replacement);
            Ok(Node::Array(items))
        }
        (other, segment) => Err(cannot_index(&other, segment)),
    }
}

/// Removes the value at `segments`; missing locations are left untouched.
pub(crate) fn delete_path(node: Node, segments: &[PathSegment]) -> Result<Node, QueryError> {
    delete_all(node, vec![segments.to_vec()])
}

/// Deletes every path at once.
///
/// All positions a set of paths selects in one array are resolved against
/// that array before anything is removed, so overlapping indices and slices
/// never shift each other.
pub(crate) fn delete_paths(node: Node, paths: Vec<Path>) -> Result<Node, QueryError> {
    delete_all(node, paths.into_iter().map(|path| path.0).collect())
}

fn delete_all(node: Node, paths: Vec<Vec<PathSegment>>) -> Result<Node, QueryError> {
    if paths.is_empty() {
        return Ok(node);
    }
    if paths.iter().any(Vec::is_empty) {
        return Ok(Node::Null);
    }
    match node {
        Node::Null => Ok(Node::Null),
        Node::Object(map) => delete_in_object(map, paths),
        Node::Array(items) => delete_in_array(items, paths),
        other => Err(cannot_index(&other, &paths[0][0])),
    }
}

fn delete_in_object(
    mut map: BTreeMap<String, Node>,
    paths: Vec<Vec<PathSegment>>,
) -> Result<Node, QueryError> {
    let mut removed = BTreeSet::new();
    let mut nested: BTreeMap<String, Vec<Vec<PathSegment>>> = BTreeMap::new();
    for path in paths {
        let mut segments = path.into_iter();
        let key = match segments.next() {
            Some(PathSegment::Key(key)) => key,
            Some(other) => return Err(QueryError::CannotIndex { kind: "object", key: other.to_string() }),
            None => continue,
        };
        let rest: Vec<_> = segments.collect();
        if rest.is_empty() {
            removed.insert(key);
        } else {
            nested.entry(key).or_default().push(rest);
        }
    }
    for (key, rests) in nested {
        if removed.contains(&key) {
            continue;
        }
        if let Some(child) = map.remove(&key) {
            map.insert(key, delete_all(child, rests)?);
        }
    }
    for key in &removed {
        map.remove(key);
    }
    Ok(Node::Object(map))
}

fn delete_in_array(mut items: Vec<Node>, paths: Vec<Vec<PathSegment>>) -> Result<Node, QueryError> {
    let len = items.len();
    let mut removed = BTreeSet::new();
    let mut nested: BTreeMap<usize, Vec<Vec<PathSegment>>> = BTreeMap::new();
    for path in paths {
        let Some((segment, rest)) = absolute_segment(len, path)? else {
            continue;
        };
        match segment {
            PathSegment::Index(index) => {
                let index = resolve_index(len, index).ok_or(QueryError::OutOfBounds)?;
                if index >= len {
                    continue;
                }
                if rest.is_empty() {
                    removed.insert(index);
                } else {
                    nested.entry(index).or_default().push(rest.into());
                }
            }
            PathSegment::Slice { start, end } => match rest.front() {
                None => removed.extend(start..end),
                Some(next) => return Err(QueryError::CannotIndex { kind: "array", key: next.to_string() }),
            },
            key @ PathSegment::Key(_) => {
                return Err(QueryError::CannotIndex { kind: "array", key: key.to_string() });
            }
        }
    }
    for (index, rests) in nested {
        if removed.contains(&index) {
            continue;
        }
        let child = std::mem::replace(&mut items[index], Node::Null);
        items[index] = delete_all(child, rests)?;
    }
    let mut position = 0;
    items.retain(|_| {
        let keep = !removed.contains(&position);
        position += 1;
        keep
    });
    Ok(Node::Array(items))
}

/// Folds a leading slice and the index or slice applied to it into one
/// segment addressing the array of `len` elements directly.
///
/// Returns `None` when the path points past the end of a slice.
fn absolute_segment(
    len: usize,
    path: Vec<PathSegment>,
) -> Result<Option<(PathSegment, VecDeque<PathSegment>)>, QueryError> {
    let mut rest = VecDeque::from(path);
    let Some(mut head) = rest.pop_front() else {
        return Ok(None);
    };
    while let PathSegment::Slice { start, end } = head {
        let end = end.min(len);
        let start = start.min(end);
        head = match rest.front() {
            Some(PathSegment::Index(index)) => {
                let inner = resolve_index(end - start, *index).ok_or(QueryError::OutOfBounds)?;
                if inner >= end - start {
                    return Ok(None);
                }
                PathSegment::Index((start + inner) as i64)
            }
            Some(PathSegment::Slice { start: inner_start, end: inner_end }) => {
                let inner_end = (*inner_end).min(end - start);
                let inner_start = (*inner_start).min(inner_end);
                PathSegment::Slice { start: start + inner_start, end: start + inner_end }
            }
            _ => return Ok(Some((PathSegment::Slice { start, end }, rest))),
        };
        rest.pop_front();
    }
    Ok(Some((head, rest)))
}
