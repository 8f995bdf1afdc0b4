//! Dotted field paths into nested maps and arrays.
//!
//! A path such as `items.0.product_id` addresses the `product_id` key of the
//! first element of the `items` array. Purely numeric segments index arrays and
//! fall back to a key lookup when the parent is a map, so `"0"` keys still work.

use crate::error::{Result, TermError};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Map key
    Key(String),
    /// Array index
    Index(usize),
}

impl PathSegment {
    fn as_key(&self) -> String {
        match self {
            PathSegment::Key(k) => k.clone(),
            PathSegment::Index(i) => i.to_string(),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => f.write_str(k),
            PathSegment::Index(i) => write!(f, "{i}"),
        }
    }
}

/// Ordered sequence of keys and indices from the payload root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// The empty path, addressing the root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a dotted path. Empty segments are ignored.
    pub fn parse(path: &str) -> Self {
        let segments = path
            .split('.')
            .filter(|s| !s.is_empty())
            .map(|s| match s.parse::<usize>() {
                Ok(i) => PathSegment::Index(i),
                Err(_) => PathSegment::Key(s.to_string()),
            })
            .collect();
        Self { segments }
    }

    /// Returns a new path extended with a map key.
    pub fn child_key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Key(key.into()));
        Self { segments }
    }

    /// Returns a new path extended with an array index.
    pub fn child_index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }

    /// The path segments.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Innermost map key, e.g. `product_id` for `items.0.product_id`.
    pub fn field_name(&self) -> Option<&str> {
        self.segments.iter().rev().find_map(|s| match s {
            PathSegment::Key(k) => Some(k.as_str()),
            PathSegment::Index(_) => None,
        })
    }

    /// Innermost array index on the path, if the path passes through an array.
    pub fn last_index(&self) -> Option<usize> {
        self.segments.iter().rev().find_map(|s| match s {
            PathSegment::Index(i) => Some(*i),
            PathSegment::Key(_) => None,
        })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for FieldPath {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

/// Resolves `path` below `root`.
pub fn get_path<'v>(root: &'v Value, path: &FieldPath) -> Option<&'v Value> {
    path.segments
        .iter()
        .try_fold(root, |current, segment| step(current, segment))
}

/// Resolves `path` below a data object root.
pub fn lookup<'v>(root: &'v Map<String, Value>, path: &FieldPath) -> Option<&'v Value> {
    let (first, rest) = path.segments.split_first()?;
    let start = root.get(&first.as_key())?;
    rest.iter()
        .try_fold(start, |current, segment| step(current, segment))
}

fn step<'v>(current: &'v Value, segment: &PathSegment) -> Option<&'v Value> {
    match (current, segment) {
        (Value::Object(map), segment) => map.get(&segment.as_key()),
        (Value::Array(items), PathSegment::Index(i)) => items.get(*i),
        _ => None,
    }
}

/// Writes `value` at `path`, creating intermediate maps as needed.
///
/// Array indices must address an existing element or the slot right after the
/// last one (which appends).
pub fn set_path(root: &mut Value, path: &FieldPath, value: Value) -> Result<()> {
    let Some((last, parents)) = path.segments.split_last() else {
        *root = value;
        return Ok(());
    };

    let mut current = root;
    for segment in parents {
        current = descend(current, segment, path)?;
    }

    match (current, last) {
        (Value::Array(items), PathSegment::Index(i)) => {
            if *i < items.len() {
                items[*i] = value;
            } else if *i == items.len() {
                items.push(value);
            } else {
                return Err(TermError::invalid_path(
                    path.to_string(),
                    format!("index {i} is past the end of an array of {}", items.len()),
                ));
            }
        }
        (slot @ Value::Null, segment) => {
            let mut map = Map::new();
            map.insert(segment.as_key(), value);
            *slot = Value::Object(map);
        }
        (Value::Object(map), segment) => {
            map.insert(segment.as_key(), value);
        }
        (_, segment) => {
            return Err(TermError::invalid_path(
                path.to_string(),
                format!("cannot write '{segment}' into this value"),
            ));
        }
    }
    Ok(())
}

fn descend<'v>(
    current: &'v mut Value,
    segment: &PathSegment,
    path: &FieldPath,
) -> Result<&'v mut Value> {
    if current.is_null() {
        *current = Value::Object(Map::new());
    }
    match current {
        Value::Object(map) => Ok(map.entry(segment.as_key()).or_insert(Value::Null)),
        Value::Array(items) => match segment {
            PathSegment::Index(i) => {
                let len = items.len();
                items.get_mut(*i).ok_or_else(|| {
                    TermError::invalid_path(
                        path.to_string(),
                        format!("index {i} is out of bounds for an array of {len}"),
                    )
                })
            }
            PathSegment::Key(k) => Err(TermError::invalid_path(
                path.to_string(),
                format!("cannot use key '{k}' on an array"),
            )),
        },
        _ => Err(TermError::invalid_path(
            path.to_string(),
            format!("cannot descend into a scalar at '{segment}'"),
        )),
    }
}
