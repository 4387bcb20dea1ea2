//! Error and warning types.
//!
//! Fatal conditions are reported through [`Error`]. Conditions that a
//! sequential load can recover from (duplicate tokens, a stream that ends
//! before the declared vocabulary size) are reported as [`LoadWarning`]s
//! next to the loaded table.

use std::fmt;
use std::io;

use ndarray::ShapeError;
use thiserror::Error;

/// `Result` type alias for operations that can lead to errors.
pub type Result<T> = ::std::result::Result<T, Error>;

/// Errors in reading, writing, or manipulating embeddings.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// I/O error.
    #[error("{desc}: {error}")]
    Io { desc: String, error: io::Error },

    /// Malformed record, number, or header.
    #[error("{0}")]
    Parse(String),

    /// None of the format predicates matched the data.
    #[error("Cannot determine the embedding format")]
    UnrecognizedFormat,

    /// A format name that is not known.
    #[error("Unknown embedding format: {0}")]
    UnknownFormat(String),

    /// Not all tokens of a predefined vocabulary were found.
    #[error("{} vocabulary token(s) not found in embedding file, e.g.: {}", .missing.len(), .missing.first().map(String::as_str).unwrap_or(""))]
    IncompleteVocab { missing: Vec<String> },

    /// The token is already in the vocabulary.
    #[error("Token '{0}' already exists in the vocabulary")]
    DuplicateToken(String),

    /// The token is not in the vocabulary.
    #[error("Token '{0}' does not exist in the vocabulary")]
    UnknownToken(String),

    /// A vector does not have the dimensionality of the matrix.
    #[error("Incorrect embedding dimensionality, expected: {expected}, got: {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// An index outside of the valid range.
    #[error("Index {index} is out of bounds (length: {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// The vocabulary and matrix sizes do not agree.
    #[error("Vocabulary size ({vocab}) does not match the number of matrix rows ({rows})")]
    VocabSizeMismatch { vocab: usize, rows: usize },

    /// A token that cannot be serialized.
    #[error("Token '{0}' cannot be written: it is empty or contains whitespace")]
    InvalidToken(String),

    /// A token violates the requested text encoding.
    #[error("{0}")]
    Encoding(String),

    /// Saving with the load condition of embeddings that were not loaded.
    #[error("Embeddings were not loaded from a file, no load condition available")]
    NoLoadCondition,

    /// An argument outside of its domain.
    #[error("{0}")]
    InvalidArgument(String),

    /// More than one unknown-word marker is present.
    #[error("Ambiguous unknown token, candidates: {}", .0.join(", "))]
    AmbiguousUnk(Vec<String>),

    /// `ndarray` shape error.
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

impl Error {
    pub fn io_error(desc: impl Into<String>, error: io::Error) -> Self {
        Error::Io {
            desc: desc.into(),
            error,
        }
    }

    pub(crate) fn duplicate_token(token: &[u8]) -> Self {
        Error::DuplicateToken(display_token(token))
    }

    pub(crate) fn unknown_token(token: &[u8]) -> Self {
        Error::UnknownToken(display_token(token))
    }
}

/// Recoverable problems encountered while loading embeddings.
///
/// The load continues after a warning; the loaded table reflects the
/// degraded input.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LoadWarning {
    /// A token occurred more than once, the later record was dropped.
    DuplicateToken { token: Vec<u8>, line: usize },

    /// The stream ended before the number of records in the header.
    TruncatedInput { expected: usize, read: usize },
}

impl LoadWarning {
    /// Log the warning and append it to `warnings`.
    pub(crate) fn report(self, warnings: &mut Vec<LoadWarning>) {
        tracing::warn!("{}", self);
        warnings.push(self);
    }
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use LoadWarning::*;
        match self {
            DuplicateToken { token, line } => write!(
                f,
                "Duplicated vocabulary '{}' in line {}",
                display_token(token),
                line
            ),
            TruncatedInput { expected, read } => write!(
                f,
                "EOF before the defined size (read {}, expected {})",
                read, expected
            ),
        }
    }
}

/// Render a token for messages.
pub(crate) fn display_token(token: &[u8]) -> String {
    String::from_utf8_lossy(token).into_owned()
}
