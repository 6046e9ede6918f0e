//! Error types for toml-path-edit

use crate::ParseError;
use thiserror::Error;

/// Errors that can occur when rewriting a TOML document
#[derive(Debug, Error, PartialEq, Clone)]
pub enum EditError {
    /// The path has no segments
    #[error("Paths cannot be empty")]
    EmptyPath,

    /// A table or array was given where only scalars are accepted
    #[error("Non-scalar values are not allowed")]
    NonScalarValue,

    /// An array-of-tables element was given a value that is not a table
    #[error("Table array bodies can only consist of key-value pairs")]
    TableArrayBodyMustBeObject,

    /// Inserting into an array would leave a gap
    #[error("Cannot skip array elements when inserting (index {index}, length {len})")]
    CannotSkipArrayIndex {
        /// The requested index
        index: usize,
        /// The current array length
        len: usize,
    },

    /// Inserting into an array of tables would leave a gap
    #[error("Cannot skip table array elements (index {index})")]
    CannotSkipTableArrayIndex {
        /// The requested index
        index: usize,
    },

    /// A path expected to name an array-of-tables element named something else
    #[error("Expected a table array element at '{path}'")]
    ExpectedTableArrayElement {
        /// The dotted path
        path: String,
    },

    /// The document is not valid TOML
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Type-change rewrites recursed deeper than allowed
    #[error("Rewrite recursion limit of {limit} exceeded")]
    RecursionLimit {
        /// The configured limit
        limit: usize,
    },

    /// TOML has no representation for null
    #[error("TOML cannot represent null values")]
    NullValue,
}

/// Result type for toml-path-edit operations
pub type EditResult<T> = Result<T, EditError>;
