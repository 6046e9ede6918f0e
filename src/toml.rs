//! Lossless TOML syntax tree: parser and typed AST wrappers.

use crate::{
    classify::Resolver,
    error::{EditError, EditResult},
    error_recovery::{ErrorRecoveryContext, ParseContext, RecoveryStrategy},
    lex::{lex, SyntaxKind},
    parse::Parse,
    path::{Path, PathSegment},
    scalar,
    value::{Table as ValueTable, TomlValue},
    ParseError, PositionedParseError,
};
use rowan::ast::AstNode;
use rowan::{GreenNodeBuilder, TextRange};
use std::str::FromStr;

/// TOML language type for rowan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lang {}

impl rowan::Language for Lang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 <= SyntaxKind::ERROR as u16);
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// A node in the TOML concrete syntax tree.
pub type SyntaxNode = rowan::SyntaxNode<Lang>;
/// A token in the TOML concrete syntax tree.
pub type SyntaxToken = rowan::SyntaxToken<Lang>;

/// A macro to create AST node wrappers.
macro_rules! ast_node {
    ($ast:ident, $($kind:ident)|+, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, PartialEq, Eq, Hash)]
        pub struct $ast(SyntaxNode);

        impl std::fmt::Debug for $ast {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($ast))
                    .field("syntax", &self.0)
                    .finish()
            }
        }

        impl AstNode for $ast {
            type Language = Lang;

            fn can_cast(kind: SyntaxKind) -> bool {
                matches!(kind, $(SyntaxKind::$kind)|+)
            }

            fn cast(syntax: SyntaxNode) -> Option<Self> {
                if Self::can_cast(syntax.kind()) {
                    Some(Self(syntax))
                } else {
                    None
                }
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.0
            }
        }

        impl From<SyntaxNode> for $ast {
            fn from(node: SyntaxNode) -> Self {
                $ast(node)
            }
        }

        impl std::fmt::Display for $ast {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0.text())
            }
        }
    };
}

ast_node!(Document, ROOT, "A TOML document (the implicit top-level table)");
ast_node!(
    Table,
    TABLE | ARRAY_TABLE,
    "A `[table]` or `[[array.of.tables]]` section"
);
ast_node!(KeyValue, KEY_VALUE, "A `key = value` pair");
ast_node!(Key, KEY, "A bare, quoted or dotted key");
ast_node!(Array, ARRAY, "An array value");
ast_node!(InlineTable, INLINE_TABLE, "An inline table value");
ast_node!(Scalar, SCALAR, "A string, number, boolean or date-time value");

impl Document {
    /// Parse TOML text, keeping every byte of the input in the tree.
    pub fn parse(text: &str) -> Parse {
        Parser::new(text).parse()
    }

    /// Key-value pairs that appear before the first table header.
    pub fn key_values(&self) -> impl Iterator<Item = KeyValue> {
        self.0.children().filter_map(KeyValue::cast)
    }

    /// All table sections, in document order.
    pub fn tables(&self) -> impl Iterator<Item = Table> {
        self.0.children().filter_map(Table::cast)
    }

    /// Build the logical value of the whole document.
    pub fn to_value(&self) -> EditResult<TomlValue> {
        let resolver = Resolver::new(&self.0);
        let mut root = TomlValue::Table(ValueTable::new());

        for kv in self.key_values() {
            insert_key_value(&mut root, &Path::default(), &kv)?;
        }

        for table in self.tables() {
            let key = resolver.table_key(table.syntax());
            if table.is_array() || root.get_path(&key).is_none() {
                root.set_path(&key, TomlValue::Table(ValueTable::new()))?;
            }
            for kv in table.key_values() {
                insert_key_value(&mut root, &key, &kv)?;
            }
        }

        Ok(root)
    }
}

impl FromStr for Document {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Document::parse(s).into_result()
    }
}

impl Table {
    /// Whether this is an array-of-tables element (`[[name]]`).
    pub fn is_array(&self) -> bool {
        self.0.kind() == SyntaxKind::ARRAY_TABLE
    }

    /// The key written in the header.
    pub fn header_key(&self) -> Option<Key> {
        self.0.children().find_map(Key::cast)
    }

    /// Key-value pairs in the table body.
    pub fn key_values(&self) -> impl Iterator<Item = KeyValue> {
        self.0.children().filter_map(KeyValue::cast)
    }
}

impl KeyValue {
    /// The key of this pair.
    pub fn key(&self) -> Option<Key> {
        self.0.children().find_map(Key::cast)
    }

    /// The value node of this pair.
    pub fn value(&self) -> Option<SyntaxNode> {
        self.0.children().find(|child| child.kind().is_value_node())
    }
}

impl Key {
    /// The decoded segments of this key, `a."b.c"` giving `["a", "b.c"]`.
    pub fn segments(&self) -> Vec<String> {
        self.0
            .children_with_tokens()
            .filter_map(|element| element.into_token())
            .filter(|token| token.kind().is_key_start())
            .map(|token| {
                scalar::decode_key(token.kind(), token.text())
                    .unwrap_or_else(|_| token.text().to_string())
            })
            .collect()
    }

    /// The key as a logical path.
    pub fn path(&self) -> Path {
        self.segments().into_iter().map(PathSegment::Key).collect()
    }
}

impl Array {
    /// The element nodes, in order.
    pub fn elements(&self) -> impl Iterator<Item = SyntaxNode> {
        self.0.children().filter(|child| child.kind().is_value_node())
    }
}

impl InlineTable {
    /// Key-value pairs inside the braces.
    pub fn key_values(&self) -> impl Iterator<Item = KeyValue> {
        self.0.children().filter_map(KeyValue::cast)
    }
}

impl Scalar {
    /// The literal token.
    pub fn token(&self) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|element| element.into_token())
            .find(|token| token.kind().is_literal())
    }

    /// The decoded value.
    pub fn value(&self) -> EditResult<TomlValue> {
        let token = self
            .token()
            .ok_or_else(|| parse_error(format!("expected a value, found {:?}", self.0.text())))?;
        scalar::decode(token.kind(), token.text()).map_err(parse_error)
    }
}

fn parse_error(message: String) -> EditError {
    EditError::Parse(ParseError(vec![message]))
}

fn insert_key_value(root: &mut TomlValue, prefix: &Path, kv: &KeyValue) -> EditResult<()> {
    let (Some(key), Some(value)) = (kv.key(), kv.value()) else {
        return Err(parse_error(format!("incomplete key-value pair {:?}", kv.to_string())));
    };
    let mut path = prefix.clone();
    path.extend(key.path());
    root.set_path(&path, value_of(&value)?)
}

/// The range a node occupies in the source, without surrounding whitespace,
/// newlines or comments.
pub fn span(node: &SyntaxNode) -> TextRange {
    let mut tokens = node
        .descendants_with_tokens()
        .filter_map(|element| element.into_token())
        .filter(|token| !token.kind().is_trivia());

    match tokens.next() {
        None => TextRange::empty(node.text_range().start()),
        Some(first) => {
            let end = tokens
                .last()
                .map_or(first.text_range().end(), |last| last.text_range().end());
            TextRange::new(first.text_range().start(), end)
        }
    }
}

/// Convert a value node (scalar, array or inline table) to its logical value.
pub fn value_of(node: &SyntaxNode) -> EditResult<TomlValue> {
    match node.kind() {
        SyntaxKind::SCALAR => Scalar(node.clone()).value(),
        SyntaxKind::ARRAY => Array(node.clone())
            .elements()
            .map(|element| value_of(&element))
            .collect::<EditResult<Vec<_>>>()
            .map(TomlValue::Array),
        SyntaxKind::INLINE_TABLE => {
            let mut table = TomlValue::Table(ValueTable::new());
            for kv in InlineTable(node.clone()).key_values() {
                insert_key_value(&mut table, &Path::default(), &kv)?;
            }
            Ok(table)
        }
        kind => Err(parse_error(format!("{:?} is not a value", kind))),
    }
}

struct Parser {
    /// Remaining tokens, reversed so the current one is at the end
    tokens: Vec<(SyntaxKind, String)>,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<PositionedParseError>,
    error_context: ErrorRecoveryContext,
}

impl Parser {
    fn new(text: &str) -> Self {
        let mut tokens: Vec<_> = lex(text)
            .into_iter()
            .map(|(kind, token_text)| (kind, token_text.to_string()))
            .collect();
        tokens.reverse();

        Self {
            tokens,
            builder: GreenNodeBuilder::new(),
            errors: Vec::new(),
            error_context: ErrorRecoveryContext::new(text.to_string()),
        }
    }

    fn parse(mut self) -> Parse {
        self.builder.start_node(SyntaxKind::ROOT.into());

        loop {
            self.skip_trivia();
            match self.current() {
                None | Some(SyntaxKind::L_BRACKET) => break,
                Some(kind) if kind.is_key_start() => {
                    self.parse_key_value();
                    self.finish_line("key-value pair");
                }
                Some(_) => {
                    self.add_error("Expected a key or table header");
                    self.skip_to_end_of_line();
                }
            }
        }

        while self.current().is_some() {
            self.parse_table();
        }

        self.builder.finish_node();

        Parse::new(self.builder.finish(), self.errors)
    }

    fn parse_table(&mut self) {
        let double = self.current() == Some(SyntaxKind::L_BRACKET)
            && self.nth(1) == Some(SyntaxKind::L_BRACKET);
        let kind = if double {
            SyntaxKind::ARRAY_TABLE
        } else {
            SyntaxKind::TABLE
        };

        self.builder.start_node(kind.into());
        self.error_context.push_context(ParseContext::TableHeader);

        self.bump();
        if double {
            self.bump();
        }
        self.skip_whitespace();

        if self.current().is_some_and(SyntaxKind::is_key_start) {
            self.parse_key();
        } else {
            self.add_error("Expected a table name");
        }
        self.skip_whitespace();

        let closing = if double { 2 } else { 1 };
        for _ in 0..closing {
            if self.current() == Some(SyntaxKind::R_BRACKET) {
                self.bump();
            } else {
                self.add_error_and_recover("Expected ']'", SyntaxKind::R_BRACKET);
                break;
            }
        }

        self.error_context.pop_context();
        self.finish_line("table header");
        self.error_context.push_context(ParseContext::TableBody);

        loop {
            self.skip_trivia();
            match self.current() {
                None | Some(SyntaxKind::L_BRACKET) => break,
                Some(kind) if kind.is_key_start() => {
                    self.parse_key_value();
                    self.finish_line("key-value pair");
                }
                Some(_) => {
                    self.add_error("Expected a key or table header");
                    self.skip_to_end_of_line();
                }
            }
        }

        self.error_context.pop_context();
        self.builder.finish_node();
    }

    fn parse_key(&mut self) {
        self.builder.start_node(SyntaxKind::KEY.into());

        loop {
            match self.current() {
                Some(kind) if kind.is_key_start() => {
                    if let Some(text) = self.current_text() {
                        if let Err(message) = scalar::decode_key(kind, text) {
                            self.add_error(&message);
                        }
                    }
                    self.bump();
                }
                _ => {
                    self.add_error("Expected a key");
                    break;
                }
            }

            if self.peek_past_whitespace() != Some(SyntaxKind::DOT) {
                break;
            }
            self.skip_whitespace();
            self.bump();
            self.skip_whitespace();
        }

        self.builder.finish_node();
    }

    fn parse_key_value(&mut self) {
        self.builder.start_node(SyntaxKind::KEY_VALUE.into());

        self.parse_key();
        self.skip_whitespace();

        if self.current() == Some(SyntaxKind::EQUALS) {
            self.bump();
            self.skip_whitespace();
            self.parse_value();
        } else {
            self.add_error_and_recover("Expected '='", SyntaxKind::EQUALS);
        }

        self.builder.finish_node();
    }

    fn parse_value(&mut self) {
        match self.current() {
            Some(kind) if kind.is_literal() => {
                if let Some(text) = self.current_text() {
                    if let Err(message) = scalar::decode(kind, text) {
                        self.add_error(&message);
                    }
                }
                self.builder.start_node(SyntaxKind::SCALAR.into());
                self.bump();
                self.builder.finish_node();
            }
            Some(SyntaxKind::L_BRACKET) => self.parse_array(),
            Some(SyntaxKind::L_BRACE) => self.parse_inline_table(),
            None
            | Some(SyntaxKind::NEWLINE)
            | Some(SyntaxKind::COMMA)
            | Some(SyntaxKind::R_BRACKET)
            | Some(SyntaxKind::R_BRACE) => self.add_error("Expected a value"),
            Some(_) => {
                self.add_error("Invalid value");
                self.builder.start_node(SyntaxKind::ERROR.into());
                self.bump();
                self.builder.finish_node();
            }
        }
    }

    fn parse_array(&mut self) {
        self.builder.start_node(SyntaxKind::ARRAY.into());
        self.error_context.push_context(ParseContext::Array);
        self.bump();

        loop {
            self.skip_trivia();
            match self.current() {
                None => {
                    self.add_error_and_recover("Unclosed array", SyntaxKind::R_BRACKET);
                    break;
                }
                Some(SyntaxKind::R_BRACKET) => {
                    self.bump();
                    break;
                }
                Some(SyntaxKind::COMMA) => {
                    self.add_error("Expected a value before ','");
                    self.bump();
                }
                Some(_) => {
                    self.parse_value();
                    self.skip_trivia();
                    self.expect_separator(SyntaxKind::R_BRACKET);
                }
            }
        }

        self.error_context.pop_context();
        self.builder.finish_node();
    }

    fn parse_inline_table(&mut self) {
        self.builder.start_node(SyntaxKind::INLINE_TABLE.into());
        self.error_context.push_context(ParseContext::InlineTable);
        self.bump();

        loop {
            self.skip_trivia();
            match self.current() {
                None => {
                    self.add_error_and_recover("Unclosed inline table", SyntaxKind::R_BRACE);
                    break;
                }
                Some(SyntaxKind::R_BRACE) => {
                    self.bump();
                    break;
                }
                Some(kind) if kind.is_key_start() => {
                    self.parse_key_value();
                    self.skip_trivia();
                    self.expect_separator(SyntaxKind::R_BRACE);
                }
                Some(_) => {
                    self.add_error("Expected a key");
                    self.builder.start_node(SyntaxKind::ERROR.into());
                    self.bump();
                    self.builder.finish_node();
                }
            }
        }

        self.error_context.pop_context();
        self.builder.finish_node();
    }

    /// After an element: a comma, the closing delimiter or end of input.
    fn expect_separator(&mut self, closing: SyntaxKind) {
        match self.current() {
            Some(SyntaxKind::COMMA) => self.bump(),
            None => {}
            Some(kind) if kind == closing => {}
            Some(_) => {
                self.add_error("Expected ','");
                self.builder.start_node(SyntaxKind::ERROR.into());
                self.bump();
                self.builder.finish_node();
            }
        }
    }

    /// Consume trailing whitespace and comment; the line must end here.
    fn finish_line(&mut self, what: &str) {
        self.skip_whitespace();
        if self.current() == Some(SyntaxKind::COMMENT) {
            self.bump();
        }
        match self.current() {
            None | Some(SyntaxKind::NEWLINE) => {}
            Some(_) => {
                self.add_error(&format!("Expected a newline after {}", what));
                self.skip_to_end_of_line();
            }
        }
    }

    fn skip_to_end_of_line(&mut self) {
        self.builder.start_node(SyntaxKind::ERROR.into());
        while !matches!(self.current(), None | Some(SyntaxKind::NEWLINE)) {
            self.bump();
        }
        self.builder.finish_node();
    }

    fn skip_whitespace(&mut self) {
        while self.current() == Some(SyntaxKind::WHITESPACE) {
            self.bump();
        }
    }

    fn skip_trivia(&mut self) {
        while self.current().is_some_and(SyntaxKind::is_trivia) {
            self.bump();
        }
    }

    fn bump(&mut self) {
        if let Some((kind, text)) = self.tokens.pop() {
            self.builder.token(kind.into(), &text);
            self.error_context.advance(text.len());
        }
    }

    fn current(&self) -> Option<SyntaxKind> {
        self.tokens.last().map(|(kind, _)| *kind)
    }

    fn current_text(&self) -> Option<&str> {
        self.tokens.last().map(|(_, text)| text.as_str())
    }

    /// The kind `n` tokens ahead of the current one.
    fn nth(&self, n: usize) -> Option<SyntaxKind> {
        let len = self.tokens.len();
        len.checked_sub(n + 1).map(|index| self.tokens[index].0)
    }

    /// The first kind at or after the current token that is not whitespace.
    fn peek_past_whitespace(&self) -> Option<SyntaxKind> {
        self.tokens
            .iter()
            .rev()
            .map(|(kind, _)| *kind)
            .find(|kind| *kind != SyntaxKind::WHITESPACE)
    }

    fn add_error(&mut self, message: &str) {
        let token_len = self.current_text().map_or(1, str::len);
        let error = self.error_context.create_error(message, token_len);
        self.errors.push(error);
    }

    fn add_error_and_recover(&mut self, message: &str, expected: SyntaxKind) {
        self.add_error(message);

        match self.error_context.suggest_recovery(expected, self.current()) {
            RecoveryStrategy::SkipToken => self.bump(),
            RecoveryStrategy::SkipToEndOfLine => self.skip_to_end_of_line(),
            // Nothing to consume; carry on as though the token were present.
            RecoveryStrategy::InsertToken(_) => {}
        }
    }
}
