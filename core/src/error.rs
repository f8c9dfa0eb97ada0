//! Path parsing errors.

use thiserror::Error;

/// Errors that can occur while parsing a field path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The input was empty.
    #[error("Field path is empty")]
    Empty,

    /// A `.` was not followed by a key, or a key was missing before `.`.
    #[error("Empty segment in field path '{path}'")]
    EmptySegment { path: String },

    /// A `[` was never closed.
    #[error("Unterminated index in field path '{path}'")]
    UnterminatedIndex { path: String },

    /// The bracket contents were not a non-negative integer.
    #[error("Invalid index '{index}' in field path '{path}'")]
    InvalidIndex { path: String, index: String },

    /// The bracketed index exceeds `MAX_INDEX`.
    #[error("Index '{index}' in field path '{path}' is too large")]
    IndexTooLarge { path: String, index: String },

    /// A character appeared where a separator was required.
    #[error("Unexpected character '{found}' in field path '{path}'")]
    UnexpectedChar { path: String, found: char },
}

impl PathError {
    pub fn empty_segment(path: impl Into<String>) -> Self {
        Self::EmptySegment { path: path.into() }
    }

    pub fn unterminated_index(path: impl Into<String>) -> Self {
        Self::UnterminatedIndex { path: path.into() }
    }

    pub fn invalid_index(path: impl Into<String>, index: impl Into<String>) -> Self {
        Self::InvalidIndex {
            path: path.into(),
            index: index.into(),
        }
    }

    pub fn index_too_large(path: impl Into<String>, index: impl Into<String>) -> Self {
        Self::IndexTooLarge {
            path: path.into(),
            index: index.into(),
        }
    }

    pub fn unexpected_char(path: impl Into<String>, found: char) -> Self {
        Self::UnexpectedChar {
            path: path.into(),
            found,
        }
    }
}

/// Result type for path operations.
pub type PathResult<T> = Result<T, PathError>;
