//! Lexer for TOML files.

/// Lexical analysis: the variants are different kinds of "tokens", followed
/// by the node kinds the parser builds out of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // Structural
    /// Root node of the syntax tree (the implicit top-level table)
    ROOT = 0,
    /// A standard table: `[name]` header plus its body
    TABLE,
    /// An array-of-tables element: `[[name]]` header plus its body
    ARRAY_TABLE,
    /// A `key = value` pair
    KEY_VALUE,
    /// A (possibly dotted) key
    KEY,
    /// An array value `[ ... ]`
    ARRAY,
    /// An inline table value `{ ... }`
    INLINE_TABLE,
    /// A scalar value wrapping a single literal token
    SCALAR,

    // Punctuation
    /// Left bracket '['
    L_BRACKET,
    /// Right bracket ']'
    R_BRACKET,
    /// Left brace '{'
    L_BRACE,
    /// Right brace '}'
    R_BRACE,
    /// Equals sign '='
    EQUALS,
    /// Comma ','
    COMMA,
    /// Dot '.' separating key segments
    DOT,

    // Content tokens
    /// Bare key segment
    BARE_KEY,
    /// Basic string `"..."`
    BASIC_STRING,
    /// Literal string `'...'`
    LITERAL_STRING,
    /// Multi-line basic string `"""..."""`
    MULTILINE_BASIC_STRING,
    /// Multi-line literal string `'''...'''`
    MULTILINE_LITERAL_STRING,
    /// Integer literal
    INTEGER,
    /// Float literal
    FLOAT,
    /// Boolean literal (true/false)
    BOOLEAN,
    /// Offset date-time, local date-time, local date or local time
    DATE_TIME,

    // Whitespace and formatting
    /// Spaces and tabs
    WHITESPACE,
    /// Newline characters
    NEWLINE,
    /// Comments starting with '#'
    COMMENT,

    // Special
    /// Unrecognised input, or a node wrapping input skipped during recovery
    ERROR,
}

impl SyntaxKind {
    /// Whether this kind carries no meaning for the document structure.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            SyntaxKind::WHITESPACE | SyntaxKind::NEWLINE | SyntaxKind::COMMENT
        )
    }

    /// Whether this kind is a token holding a scalar value.
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            SyntaxKind::BASIC_STRING
                | SyntaxKind::LITERAL_STRING
                | SyntaxKind::MULTILINE_BASIC_STRING
                | SyntaxKind::MULTILINE_LITERAL_STRING
                | SyntaxKind::INTEGER
                | SyntaxKind::FLOAT
                | SyntaxKind::BOOLEAN
                | SyntaxKind::DATE_TIME
        )
    }

    /// Whether this kind can start a key.
    pub fn is_key_start(self) -> bool {
        matches!(
            self,
            SyntaxKind::BARE_KEY | SyntaxKind::BASIC_STRING | SyntaxKind::LITERAL_STRING
        )
    }

    /// Whether this kind is a node holding a value.
    pub fn is_value_node(self) -> bool {
        matches!(
            self,
            SyntaxKind::SCALAR | SyntaxKind::ARRAY | SyntaxKind::INLINE_TABLE
        )
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Bracket {
    /// `[` or `[[` opening a table header; `double` is set while inside `[[`
    Header { double: bool },
    Array,
    Inline,
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    tokens: Vec<(SyntaxKind, &'a str)>,
    brackets: Vec<Bracket>,
    expect_value: bool,
}

/// Tokenize TOML input.
///
/// The lexer tracks whether it is in key or value position, so that
/// `1234 = true` yields a bare key followed by a boolean.
pub fn lex(input: &str) -> Vec<(SyntaxKind, &str)> {
    Lexer {
        input,
        pos: 0,
        tokens: Vec::new(),
        brackets: Vec::new(),
        expect_value: false,
    }
    .run()
}

impl<'a> Lexer<'a> {
    fn run(mut self) -> Vec<(SyntaxKind, &'a str)> {
        use SyntaxKind::*;

        while self.pos < self.input.len() {
            let start = self.pos;
            let input = self.input;
            let bytes = &input.as_bytes()[start..];

            let kind = match bytes[0] {
                b' ' | b'\t' => {
                    self.eat_while(|b| b == b' ' || b == b'\t');
                    WHITESPACE
                }
                b'\n' => {
                    self.pos += 1;
                    self.on_newline();
                    NEWLINE
                }
                b'\r' if bytes.get(1) == Some(&b'\n') => {
                    self.pos += 2;
                    self.on_newline();
                    NEWLINE
                }
                b'#' => {
                    let line = bytes.iter().position(|&b| b == b'\n').unwrap_or(bytes.len());
                    let mut end = start + line;
                    if end > start + 1 && input.as_bytes()[end - 1] == b'\r' {
                        end -= 1;
                    }
                    self.pos = end;
                    COMMENT
                }
                b'"' => {
                    let kind = self.basic_string();
                    self.after_value();
                    kind
                }
                b'\'' => {
                    let kind = self.literal_string();
                    self.after_value();
                    kind
                }
                b'[' => self.open_bracket(),
                b']' => self.close_bracket(),
                b'{' => {
                    self.pos += 1;
                    self.brackets.push(Bracket::Inline);
                    self.expect_value = false;
                    L_BRACE
                }
                b'}' => {
                    self.pos += 1;
                    if self.brackets.last() == Some(&Bracket::Inline) {
                        self.brackets.pop();
                    }
                    self.expect_value = self.brackets.last() == Some(&Bracket::Array);
                    R_BRACE
                }
                b'=' => {
                    self.pos += 1;
                    self.expect_value = true;
                    EQUALS
                }
                b',' => {
                    self.pos += 1;
                    self.expect_value = self.brackets.last() == Some(&Bracket::Array);
                    COMMA
                }
                b'.' if !self.expect_value => {
                    self.pos += 1;
                    DOT
                }
                b if self.expect_value && is_value_byte(b) => {
                    let kind = self.bare_value();
                    self.after_value();
                    kind
                }
                b if !self.expect_value && is_bare_key_byte(b) => {
                    self.eat_while(is_bare_key_byte);
                    BARE_KEY
                }
                _ => {
                    let width = input[start..].chars().next().map_or(1, char::len_utf8);
                    self.pos += width;
                    ERROR
                }
            };

            self.tokens.push((kind, &input[start..self.pos]));
        }

        self.tokens
    }

    fn eat_while(&mut self, predicate: impl Fn(u8) -> bool) {
        let bytes = self.input.as_bytes();
        while self.pos < bytes.len() && predicate(bytes[self.pos]) {
            self.pos += 1;
        }
    }

    fn on_newline(&mut self) {
        // Table headers never span lines.
        while matches!(self.brackets.last(), Some(Bracket::Header { .. })) {
            self.brackets.pop();
        }
        if self.brackets.is_empty() {
            self.expect_value = false;
        }
    }

    fn after_value(&mut self) {
        if self.expect_value && self.brackets.last() != Some(&Bracket::Array) {
            self.expect_value = false;
        }
    }

    fn open_bracket(&mut self) -> SyntaxKind {
        let follows_bracket = self.pos > 0 && self.input.as_bytes()[self.pos - 1] == b'[';
        self.pos += 1;

        if self.expect_value {
            self.brackets.push(Bracket::Array);
        } else if self.brackets.is_empty() {
            self.brackets.push(Bracket::Header { double: false });
        } else if follows_bracket
            && self.brackets.last() == Some(&Bracket::Header { double: false })
            && self.tokens.last().map(|(kind, _)| *kind) == Some(SyntaxKind::L_BRACKET)
        {
            self.brackets.pop();
            self.brackets.push(Bracket::Header { double: true });
        } else {
            // Not valid TOML; lex the rest as a value so the parser can report it.
            self.brackets.push(Bracket::Array);
            self.expect_value = true;
        }

        SyntaxKind::L_BRACKET
    }

    fn close_bracket(&mut self) -> SyntaxKind {
        self.pos += 1;
        match self.brackets.last_mut() {
            Some(Bracket::Header { double }) if *double => *double = false,
            Some(Bracket::Header { .. }) | Some(Bracket::Array) => {
                self.brackets.pop();
            }
            _ => {}
        }
        self.expect_value = self.brackets.last() == Some(&Bracket::Array);
        SyntaxKind::R_BRACKET
    }

    fn basic_string(&mut self) -> SyntaxKind {
        let input = self.input;
        let bytes = input.as_bytes();
        if bytes[self.pos..].starts_with(b"\"\"\"") {
            let mut i = self.pos + 3;
            while i < bytes.len() {
                match bytes[i] {
                    b'\\' => i += 2,
                    b'"' if bytes[i..].starts_with(b"\"\"\"") => {
                        i += 3;
                        // Up to two quotes may sit directly before the delimiter.
                        let mut extra = 0;
                        while extra < 2 && bytes.get(i) == Some(&b'"') {
                            i += 1;
                            extra += 1;
                        }
                        self.pos = i;
                        return SyntaxKind::MULTILINE_BASIC_STRING;
                    }
                    _ => i += 1,
                }
            }
            self.pos = bytes.len();
            return SyntaxKind::ERROR;
        }

        let mut i = self.pos + 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' if i + 1 < bytes.len() && bytes[i + 1] != b'\n' => i += 2,
                b'"' => {
                    self.pos = i + 1;
                    return SyntaxKind::BASIC_STRING;
                }
                b'\n' => break,
                b'\r' if bytes.get(i + 1) == Some(&b'\n') => break,
                _ => i += 1,
            }
        }
        self.pos = i.min(bytes.len());
        SyntaxKind::ERROR
    }

    fn literal_string(&mut self) -> SyntaxKind {
        let input = self.input;
        let rest = &input[self.pos..];
        if let Some(body) = rest.strip_prefix("'''") {
            return match body.find("'''") {
                Some(close) => {
                    let mut end = self.pos + 3 + close + 3;
                    let bytes = input.as_bytes();
                    let mut extra = 0;
                    while extra < 2 && bytes.get(end) == Some(&b'\'') {
                        end += 1;
                        extra += 1;
                    }
                    self.pos = end;
                    SyntaxKind::MULTILINE_LITERAL_STRING
                }
                None => {
                    self.pos = input.len();
                    SyntaxKind::ERROR
                }
            };
        }

        let body = &rest[1..];
        let line_end = body.find('\n').unwrap_or(body.len());
        match body[..line_end].find('\'') {
            Some(close) => {
                self.pos += 1 + close + 1;
                SyntaxKind::LITERAL_STRING
            }
            None => {
                let line = body[..line_end].trim_end_matches('\r');
                self.pos += 1 + line.len();
                SyntaxKind::ERROR
            }
        }
    }

    /// Numbers, booleans and date-times.
    fn bare_value(&mut self) -> SyntaxKind {
        let start = self.pos;
        self.eat_while(is_value_byte);

        // `1979-05-27 07:32:00` uses a space instead of `T`.
        let input = self.input;
        let bytes = input.as_bytes();
        if is_full_date(&input[start..self.pos])
            && bytes.get(self.pos) == Some(&b' ')
            && bytes.get(self.pos + 1).is_some_and(u8::is_ascii_digit)
            && bytes.get(self.pos + 2).is_some_and(u8::is_ascii_digit)
            && bytes.get(self.pos + 3) == Some(&b':')
        {
            self.pos += 1;
            self.eat_while(is_value_byte);
        }

        classify_value(&input[start..self.pos])
    }
}

/// Classify a bare (unquoted) value based on its content
fn classify_value(text: &str) -> SyntaxKind {
    use SyntaxKind::*;

    match text {
        "true" | "false" => return BOOLEAN,
        "inf" | "+inf" | "-inf" | "nan" | "+nan" | "-nan" => return FLOAT,
        _ => {}
    }

    if text.contains(':') || (text.len() >= 10 && is_full_date(&text[..10])) {
        return DATE_TIME;
    }

    let unsigned = text.trim_start_matches(['+', '-']);
    if !unsigned.starts_with(|c: char| c.is_ascii_digit()) {
        return ERROR;
    }
    if ["0x", "0o", "0b"].iter().any(|prefix| unsigned.starts_with(prefix)) {
        return INTEGER;
    }
    if unsigned.bytes().all(|b| b.is_ascii_digit() || b == b'_') {
        return INTEGER;
    }
    if unsigned.replace('_', "").parse::<f64>().is_ok() {
        return FLOAT;
    }

    ERROR
}

fn is_full_date(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

fn is_bare_key_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

fn is_value_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'+' | b'-' | b'.' | b':')
}
