//! Decoding of TOML scalar literals and keys through `toml_parser`.

use std::borrow::Cow;

use toml_parser::decoder::ScalarKind;
use toml_parser::parser::{parse_document, Event, EventKind, RecursionGuard};
use toml_parser::{ErrorSink, Raw, Source};

use crate::lex::SyntaxKind;
use crate::value::TomlValue;

/// Keeps the first error reported while lexing, parsing or decoding.
#[derive(Default)]
struct FirstError(Option<String>);

impl ErrorSink for FirstError {
    fn report_error(&mut self, error: toml_parser::ParseError) {
        if self.0.is_none() {
            self.0 = Some(error.description().to_string());
        }
    }
}

/// Parse `document` and decode the first event of `wanted` kind.
///
/// The literal is embedded in a one-line document so the tokenizer sees it
/// in the position it was found in.
fn decode_event<T>(
    document: &str,
    wanted: EventKind,
    decode: impl FnOnce(&Raw<'_>, &mut FirstError) -> Result<T, String>,
) -> Result<T, String> {
    let source = Source::new(document);
    let tokens: Vec<_> = source.lex().collect();
    let mut events: Vec<Event> = Vec::new();
    let mut errors = FirstError::default();
    {
        let mut guarded = RecursionGuard::new(&mut events, 128);
        parse_document(&tokens, &mut guarded, &mut errors);
    }

    let event = events
        .iter()
        .find(|event| event.kind() == wanted)
        .ok_or_else(|| format!("Expected a literal, found {:?}", document))?;
    let span = event.span();
    let raw = Raw::new_unchecked(&document[span.start()..span.end()], event.encoding(), span);
    let decoded = decode(&raw, &mut errors);

    match errors.0 {
        Some(message) => Err(message),
        None => decoded,
    }
}

/// Decode a literal token into its logical value.
pub fn decode(kind: SyntaxKind, text: &str) -> Result<TomlValue, String> {
    if !kind.is_literal() {
        return Err(format!("Expected a value, found {:?}", text));
    }

    decode_event(&format!("v = {}", text), EventKind::Scalar, |raw, errors| {
        let mut output: Cow<'_, str> = Cow::Borrowed("");
        match raw.decode_scalar(&mut output, errors) {
            ScalarKind::String => Ok(TomlValue::String(output.into_owned())),
            ScalarKind::Boolean(b) => Ok(TomlValue::Boolean(b)),
            ScalarKind::Integer(radix) => {
                let clean: String = output.chars().filter(|c| *c != '_').collect();
                i64::from_str_radix(&clean, radix.value())
                    .map(TomlValue::Integer)
                    .map_err(|e| format!("Invalid integer {:?}: {}", text, e))
            }
            ScalarKind::Float => {
                let clean: String = output.chars().filter(|c| *c != '_').collect();
                let f = match clean.as_str() {
                    "inf" | "+inf" => f64::INFINITY,
                    "-inf" => f64::NEG_INFINITY,
                    "nan" | "+nan" | "-nan" => f64::NAN,
                    other => other
                        .parse()
                        .map_err(|_| format!("Invalid float {:?}", text))?,
                };
                Ok(TomlValue::Float(f))
            }
            ScalarKind::DateTime => Ok(TomlValue::Datetime(output.into_owned())),
        }
    })
}

/// Decode a single key segment.
pub fn decode_key(kind: SyntaxKind, text: &str) -> Result<String, String> {
    if !kind.is_key_start() {
        return Err(format!("Invalid key {:?}", text));
    }

    decode_event(&format!("{} = 0", text), EventKind::SimpleKey, |raw, errors| {
        let mut output: Cow<'_, str> = Cow::Borrowed("");
        raw.decode_key(&mut output, errors);
        Ok(output.into_owned())
    })
}
