#![warn(missing_docs)]
#![allow(clippy::type_complexity)]
#![warn(clippy::unnecessary_to_owned)]
#![warn(clippy::redundant_clone)]
#![warn(clippy::inefficient_to_string)]
#![warn(clippy::manual_string_new)]
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

//! A format-preserving TOML editor addressed by logical path.
//!
//! Documents are parsed into a lossless syntax tree based on the [rowan]
//! library. Edits locate the node for a path such as
//! `env.staging.kv_namespaces.0.id` and splice new text over its byte range,
//! leaving comments, whitespace and key order elsewhere untouched.

mod classify;
mod error;
mod error_recovery;
mod lex;
mod parse;
mod path;
mod rewrite;
mod scalar;
mod serialize;
mod toml;
mod value;

pub use classify::{classify, NodeKind, Resolver};
pub use error::{EditError, EditResult};
pub use lex::{lex, SyntaxKind};
pub use parse::Parse;
pub use path::{matched_prefix, paths_equal, Path, PathSegment, PathTracker};
pub use rewrite::{apply_all, get, remove, rewrite, set, Edit, RewriteOptions, Rewriter};
pub use rowan::TextRange;
pub use serialize::{
    serialize_key, serialize_key_path, serialize_key_value, serialize_table, stringify_value,
    TableStyle,
};
pub use toml::{
    span, value_of, Array, Document, InlineTable, Key, KeyValue, Lang, Scalar, SyntaxNode,
    SyntaxToken, Table,
};
pub use value::{Table as TomlTable, TomlValue};

/// A positioned parse error containing location information.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PositionedParseError {
    /// The error message
    pub message: String,
    /// The text range where the error occurred
    pub range: rowan::TextRange,
    /// Optional error code for categorization
    pub code: Option<String>,
}

impl std::fmt::Display for PositionedParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PositionedParseError {}

/// List of encountered syntax errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParseError(pub Vec<String>);

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for err in &self.0 {
            writeln!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}
