//! The outcome of parsing a document: a lossless tree and any syntax errors.

use rowan::GreenNode;

use crate::toml::{Document, SyntaxNode};
use crate::{ParseError, PositionedParseError};

/// A parsed document.
///
/// The tree is always built, even for broken input, so that its text still
/// equals the input byte for byte. Rewriting refuses documents with errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parse {
    green: GreenNode,
    errors: Vec<PositionedParseError>,
}

impl Parse {
    pub(crate) fn new(green: GreenNode, errors: Vec<PositionedParseError>) -> Self {
        Self { green, errors }
    }

    /// The document tree.
    pub fn tree(&self) -> Document {
        Document::from(SyntaxNode::new_root(self.green.clone()))
    }

    /// Syntax errors in source order, each with its range.
    pub fn errors(&self) -> &[PositionedParseError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The tree, or every error message if the text is not valid TOML.
    pub fn into_result(self) -> Result<Document, ParseError> {
        if self.errors.is_empty() {
            Ok(self.tree())
        } else {
            Err(ParseError(
                self.errors.into_iter().map(|error| error.message).collect(),
            ))
        }
    }
}
