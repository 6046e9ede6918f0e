//! Error recovery mechanisms for TOML parsing
//!
//! This module provides:
//! - Line and column information for errors
//! - Recovery strategies to continue parsing after errors
//! - Context-aware error messages

use crate::{lex::SyntaxKind, PositionedParseError};
use rowan::{TextRange, TextSize};

/// Error recovery strategy for the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// Skip the current token and continue
    SkipToken,
    /// Skip until end of line
    SkipToEndOfLine,
    /// Insert a synthetic token to fix the parse
    InsertToken(SyntaxKind),
}

/// The parsing context for error recovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseContext {
    /// Top level of the document
    Document,
    /// Inside a `[table]` or `[[table]]` header
    TableHeader,
    /// Inside a table body
    TableBody,
    /// Inside an array value
    Array,
    /// Inside an inline table value
    InlineTable,
}

impl ParseContext {
    fn describe(self) -> &'static str {
        match self {
            ParseContext::Document => "at document level",
            ParseContext::TableHeader => "in table header",
            ParseContext::TableBody => "in table",
            ParseContext::Array => "in array",
            ParseContext::InlineTable => "in inline table",
        }
    }
}

/// Context for error recovery during parsing
#[derive(Clone)]
pub struct ErrorRecoveryContext {
    /// The original text being parsed
    text: String,
    /// Current position in the text
    position: usize,
    /// Line number (1-based)
    line: usize,
    /// Column number (1-based)
    column: usize,
    /// Stack of nested contexts
    contexts: Vec<ParseContext>,
}

impl ErrorRecoveryContext {
    /// Create a new error recovery context
    pub fn new(text: String) -> Self {
        Self {
            text,
            position: 0,
            line: 1,
            column: 1,
            contexts: vec![ParseContext::Document],
        }
    }

    /// Update position and line/column tracking
    pub fn advance(&mut self, bytes: usize) {
        let end = (self.position + bytes).min(self.text.len());
        for ch in self.text[self.position..end].chars() {
            match ch {
                '\n' => {
                    self.line += 1;
                    self.column = 1;
                }
                '\r' => {}
                _ => self.column += 1,
            }
        }
        self.position = end;
    }

    /// Get current line and column
    pub fn current_location(&self) -> (usize, usize) {
        (self.line, self.column)
    }

    /// Get a text range for the current position
    pub fn current_range(&self, length: usize) -> TextRange {
        let start = TextSize::from(self.position as u32);
        let end = TextSize::from((self.position + length) as u32);
        TextRange::new(start, end)
    }

    /// Push a new parsing context
    pub fn push_context(&mut self, context: ParseContext) {
        self.contexts.push(context);
    }

    /// Pop the current parsing context
    pub fn pop_context(&mut self) {
        if self.contexts.len() > 1 {
            self.contexts.pop();
        }
    }

    /// Get the current parsing context
    pub fn current_context(&self) -> ParseContext {
        self.contexts
            .last()
            .copied()
            .unwrap_or(ParseContext::Document)
    }

    /// Create a positioned error with current location
    pub fn create_error(&self, message: &str, length: usize) -> PositionedParseError {
        let (line, column) = self.current_location();

        PositionedParseError {
            message: format!(
                "{}:{}: {} {}",
                line,
                column,
                message,
                self.current_context().describe()
            ),
            range: self.current_range(length),
            code: None,
        }
    }

    /// Determine the best recovery strategy for the current error
    pub fn suggest_recovery(
        &self,
        expected: SyntaxKind,
        found: Option<SyntaxKind>,
    ) -> RecoveryStrategy {
        match (self.current_context(), expected) {
            (ParseContext::Array, SyntaxKind::R_BRACKET)
            | (ParseContext::InlineTable, SyntaxKind::R_BRACE) => {
                RecoveryStrategy::InsertToken(expected)
            }
            (ParseContext::TableHeader, _) => RecoveryStrategy::SkipToEndOfLine,
            _ => match found {
                None | Some(SyntaxKind::NEWLINE) => RecoveryStrategy::InsertToken(expected),
                Some(kind) if kind == expected => RecoveryStrategy::SkipToken,
                Some(_) => RecoveryStrategy::SkipToEndOfLine,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_column_tracking() {
        let mut context = ErrorRecoveryContext::new("a = 1\r\nb = 2".to_string());
        assert_eq!(context.current_location(), (1, 1));

        context.advance(4);
        assert_eq!(context.current_location(), (1, 5));

        context.advance(3);
        assert_eq!(context.current_location(), (2, 1));
    }

    #[test]
    fn test_error_message_mentions_context() {
        let mut context = ErrorRecoveryContext::new("a = [1, 2".to_string());
        context.advance(4);
        context.push_context(ParseContext::Array);

        let error = context.create_error("Unclosed array", 1);
        assert_eq!(error.message, "1:5: Unclosed array in array");
        assert_eq!(
            error.range,
            TextRange::new(TextSize::from(4), TextSize::from(5))
        );

        context.pop_context();
        assert_eq!(context.current_context(), ParseContext::Document);
    }

    #[test]
    fn test_recovery_strategies() {
        let mut context = ErrorRecoveryContext::new(String::new());
        assert_eq!(
            context.suggest_recovery(SyntaxKind::EQUALS, Some(SyntaxKind::INTEGER)),
            RecoveryStrategy::SkipToEndOfLine
        );
        assert_eq!(
            context.suggest_recovery(SyntaxKind::EQUALS, None),
            RecoveryStrategy::InsertToken(SyntaxKind::EQUALS)
        );

        context.push_context(ParseContext::InlineTable);
        assert_eq!(
            context.suggest_recovery(SyntaxKind::R_BRACE, Some(SyntaxKind::NEWLINE)),
            RecoveryStrategy::InsertToken(SyntaxKind::R_BRACE)
        );

        context.push_context(ParseContext::TableHeader);
        assert_eq!(
            context.suggest_recovery(SyntaxKind::R_BRACKET, Some(SyntaxKind::EQUALS)),
            RecoveryStrategy::SkipToEndOfLine
        );
    }
}
