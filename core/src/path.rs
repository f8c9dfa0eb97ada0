//! Structured field paths.
//!
//! A field path is an ordered list of segments. Its canonical string form joins
//! keys with `.` and writes indexes as `[n]`, e.g. `user.tags[0].label`.
//! Key characters that would read as syntax (`.`, `[`, `]`, `\`) are escaped
//! with a backslash.
//! All prefix and ancestor logic goes through [`FieldPath`]; nothing slices
//! path strings by hand.

use std::fmt::{self, Write};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PathError, PathResult};

/// Largest index accepted by [`FieldPath::parse`].
pub const MAX_INDEX: usize = 65_535;

/// One step of a field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    /// A named key (`user`, or the `1` in `list.1`).
    Key(String),
    /// A bracketed array index (`[0]`).
    Index(usize),
}

impl Segment {
    /// Create a key segment.
    pub fn key(name: impl Into<String>) -> Self {
        Segment::Key(name.into())
    }

    /// Returns true if this is a bracketed index.
    pub fn is_index(&self) -> bool {
        matches!(self, Segment::Index(_))
    }

    /// Numeric reading of the segment.
    ///
    /// Bracketed indexes always have one. Keys have one when they are made of
    /// ASCII digits only, so `list.1` and `list[1]` both report `Some(1)` here
    /// while staying distinct paths.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Index(index) => Some(*index),
            Segment::Key(key) if is_all_digits(key) => key.parse().ok(),
            Segment::Key(_) => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => write!(f, "{}", key),
            Segment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

/// A canonical, structured field path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    /// The empty path (addresses the root of a nested value).
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from segments.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Single-key path.
    pub fn key(name: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Key(name.into())],
        }
    }

    /// Parse the canonical string form.
    pub fn parse(input: &str) -> PathResult<Self> {
        if input.is_empty() {
            return Err(PathError::Empty);
        }

        let mut segments = Vec::new();
        let mut chars = input.chars().peekable();
        // A key is required at the start (unless the path opens with an index)
        // and after every `.`.
        let mut need_key = !input.starts_with('[');

        loop {
            if need_key {
                let mut key = String::new();
                while let Some(&c) = chars.peek() {
                    if c == '.' || c == '[' {
                        break;
                    }
                    if c == ']' {
                        return Err(PathError::unexpected_char(input, c));
                    }
                    chars.next();
                    if c == '\\' {
                        match chars.next() {
                            Some(escaped) => key.push(escaped),
                            None => return Err(PathError::unexpected_char(input, c)),
                        }
                        continue;
                    }
                    key.push(c);
                }
                if key.is_empty() {
                    return Err(PathError::empty_segment(input));
                }
                segments.push(Segment::Key(key));
                need_key = false;
            }

            match chars.next() {
                None => break,
                Some('.') => need_key = true,
                Some('[') => {
                    let mut digits = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(c) => digits.push(c),
                            None => return Err(PathError::unterminated_index(input)),
                        }
                    }
                    if !is_all_digits(&digits) {
                        return Err(PathError::invalid_index(input, digits));
                    }
                    let index: usize = digits
                        .parse()
                        .map_err(|_| PathError::index_too_large(input, digits.as_str()))?;
                    if index > MAX_INDEX {
                        return Err(PathError::index_too_large(input, digits));
                    }
                    segments.push(Segment::Index(index));
                }
                Some(c) => return Err(PathError::unexpected_char(input, c)),
            }
        }

        Ok(Self { segments })
    }

    /// Get the segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true for the root path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// First segment, if any.
    pub fn first(&self) -> Option<&Segment> {
        self.segments.first()
    }

    /// Last segment, if any.
    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Returns true if `prefix` equals this path or is an ancestor of it.
    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Returns true if this path is a proper structural prefix of `other`.
    ///
    /// `a` prefixes `a.b` and `a[0]`, but not `ab` and not `a` itself.
    pub fn is_prefix_of(&self, other: &FieldPath) -> bool {
        self.len() < other.len() && other.starts_with(self)
    }

    /// Returns true if either path is a proper prefix of the other.
    pub fn conflicts_with(&self, other: &FieldPath) -> bool {
        self.is_prefix_of(other) || other.is_prefix_of(self)
    }

    /// Remaining segments after `prefix`, or `None` if `prefix` does not apply.
    pub fn strip_prefix(&self, prefix: &FieldPath) -> Option<FieldPath> {
        self.segments
            .strip_prefix(prefix.segments.as_slice())
            .map(|rest| FieldPath::from_segments(rest.to_vec()))
    }

    /// Path of the enclosing value, `None` for the root.
    pub fn parent(&self) -> Option<FieldPath> {
        self.segments
            .split_last()
            .map(|(_, rest)| FieldPath::from_segments(rest.to_vec()))
    }

    /// Append one segment.
    pub fn child(&self, segment: impl Into<Segment>) -> FieldPath {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        FieldPath { segments }
    }

    /// Append all segments of `suffix`.
    pub fn join(&self, suffix: &FieldPath) -> FieldPath {
        let mut segments = self.segments.clone();
        segments.extend(suffix.segments.iter().cloned());
        FieldPath { segments }
    }
}

fn is_all_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) => {
                    if i > 0 {
                        f.write_char('.')?;
                    }
                    write_escaped(f, key)?;
                }
                Segment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, key: &str) -> fmt::Result {
    for c in key.chars() {
        if matches!(c, '.' | '[' | ']' | '\\') {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    Ok(())
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldPath::parse(s)
    }
}

impl TryFrom<&str> for FieldPath {
    type Error = PathError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        FieldPath::parse(value)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        FieldPath::parse(&value)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}
