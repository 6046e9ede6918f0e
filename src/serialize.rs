//! Rendering of logical values as TOML text.

use std::fmt::{self, Write};

use toml_writer::TomlWrite;

use crate::path::PathSegment;
use crate::value::{Table, TomlValue};

/// How a table is introduced when written as its own section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableStyle {
    /// `[name]`
    #[default]
    Standard,
    /// `[[name]]`
    ArrayOfTables,
}

/// Run a writer against a fresh `String`.
fn render(write: impl FnOnce(&mut String) -> fmt::Result) -> String {
    let mut output = String::new();
    // Formatting into a `String` cannot fail.
    let _ = write(&mut output);
    output
}

/// Render a value in inline form, e.g. `"text"`, `[ 1, 2 ]` or `{ k = v }`.
pub fn stringify_value(value: &TomlValue) -> String {
    render(|output| write_value(value, output))
}

fn write_value<W: Write>(value: &TomlValue, output: &mut W) -> fmt::Result {
    match value {
        TomlValue::String(s) => output.value(s.as_str()),
        TomlValue::Integer(i) => output.value(*i),
        TomlValue::Float(f) => output.value(*f),
        TomlValue::Boolean(b) => output.value(*b),
        TomlValue::Datetime(d) => output.write_str(d),
        TomlValue::Array(items) => {
            output.open_array()?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    output.val_sep()?;
                }
                output.space()?;
                write_value(item, output)?;
            }
            if !items.is_empty() {
                output.space()?;
            }
            output.close_array()
        }
        TomlValue::Table(table) => {
            output.open_inline_table()?;
            for (i, (key, item)) in table.iter().enumerate() {
                if i > 0 {
                    output.val_sep()?;
                }
                output.space()?;
                write_key_value(&[PathSegment::from(key.as_str())], item, output)?;
            }
            if !table.is_empty() {
                output.space()?;
            }
            output.close_inline_table()
        }
    }
}

fn write_key_path<W: Write>(path: &[PathSegment], output: &mut W) -> fmt::Result {
    for (i, segment) in path.iter().enumerate() {
        if i > 0 {
            output.key_sep()?;
        }
        output.key(segment.to_string().as_str())?;
    }
    Ok(())
}

fn write_key_value<W: Write>(path: &[PathSegment], value: &TomlValue, output: &mut W) -> fmt::Result {
    write_key_path(path, output)?;
    output.space()?;
    output.keyval_sep()?;
    output.space()?;
    write_value(value, output)
}

/// Render a single key, quoting it unless it is a valid bare key.
pub fn serialize_key(key: &str) -> String {
    render(|output| output.key(key))
}

/// Render a path as a dotted key.
pub fn serialize_key_path(path: &[PathSegment]) -> String {
    render(|output| write_key_path(path, output))
}

/// Render a `dotted.key = value` line.
pub fn serialize_key_value(path: &[PathSegment], value: &TomlValue) -> String {
    render(|output| write_key_value(path, value, output))
}

/// Render a table as a section at `path`.
///
/// Plain entries follow the header one per line. Non-empty sub-tables and
/// arrays of tables become their own sections after a blank line.
pub fn serialize_table(path: &[PathSegment], table: &Table, style: TableStyle) -> String {
    render(|output| write_table(path, table, style, output))
}

fn write_table<W: Write>(
    path: &[PathSegment],
    table: &Table,
    style: TableStyle,
    output: &mut W,
) -> fmt::Result {
    match style {
        TableStyle::Standard => {
            output.open_table_header()?;
            write_key_path(path, output)?;
            output.close_table_header()?;
        }
        TableStyle::ArrayOfTables => {
            output.open_array_of_tables_header()?;
            write_key_path(path, output)?;
            output.close_array_of_tables_header()?;
        }
    }

    for (name, value) in table {
        if !is_section(value) {
            output.newline()?;
            write_key_value(&[PathSegment::from(name.as_str())], value, output)?;
        }
    }

    for (name, value) in table {
        let mut child = path.to_vec();
        child.push(PathSegment::from(name.as_str()));
        match value {
            TomlValue::Table(sub) if !sub.is_empty() => {
                output.newline()?;
                output.newline()?;
                write_table(&child, sub, TableStyle::Standard, output)?;
            }
            TomlValue::Array(items) if value.is_array_of_tables() => {
                for sub in items.iter().filter_map(TomlValue::as_table) {
                    output.newline()?;
                    output.newline()?;
                    write_table(&child, sub, TableStyle::ArrayOfTables, output)?;
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn is_section(value: &TomlValue) -> bool {
    value.is_non_empty_table() || value.is_array_of_tables()
}
