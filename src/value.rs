//! Logical value tree of a TOML document.

use crate::error::{EditError, EditResult};
use crate::path::PathSegment;
use indexmap::IndexMap;
use std::fmt;

/// The key-ordered contents of a table.
pub type Table = IndexMap<String, TomlValue>;

/// Represents any TOML value
#[derive(Debug, Clone, PartialEq)]
pub enum TomlValue {
    /// A string
    String(String),
    /// A 64-bit signed integer
    Integer(i64),
    /// A 64-bit float, including `inf` and `nan`
    Float(f64),
    /// `true` or `false`
    Boolean(bool),
    /// A date-time, local date or local time, kept as written
    Datetime(String),
    /// An array of values
    Array(Vec<TomlValue>),
    /// A table of key-value pairs, in insertion order
    Table(Table),
}

impl TomlValue {
    /// Whether this is a string, number, boolean or date-time.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, TomlValue::Array(_) | TomlValue::Table(_))
    }

    /// Whether this is a table.
    pub fn is_table(&self) -> bool {
        matches!(self, TomlValue::Table(_))
    }

    /// Whether this is a table with at least one entry.
    pub fn is_non_empty_table(&self) -> bool {
        matches!(self, TomlValue::Table(table) if !table.is_empty())
    }

    /// Whether this is a non-empty array whose elements are all tables.
    pub fn is_array_of_tables(&self) -> bool {
        matches!(self, TomlValue::Array(items)
            if !items.is_empty() && items.iter().all(TomlValue::is_table))
    }

    /// Get as table if this is a table
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            TomlValue::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Get as array if this is an array
    pub fn as_array(&self) -> Option<&[TomlValue]> {
        match self {
            TomlValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Get as string if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TomlValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as integer if this is an integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            TomlValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as float if this is a float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            TomlValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as bool if this is a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TomlValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// A short name for the kind of value.
    pub fn type_name(&self) -> &'static str {
        match self {
            TomlValue::String(_) => "string",
            TomlValue::Integer(_) => "integer",
            TomlValue::Float(_) => "float",
            TomlValue::Boolean(_) => "boolean",
            TomlValue::Datetime(_) => "datetime",
            TomlValue::Array(_) => "array",
            TomlValue::Table(_) => "table",
        }
    }

    /// Look up the value at `path`.
    pub fn get_path(&self, path: &[PathSegment]) -> Option<&TomlValue> {
        path.iter().try_fold(self, |current, segment| match current {
            TomlValue::Table(table) => table.get(segment.to_string().as_str()),
            TomlValue::Array(items) => segment.as_index().and_then(|index| items.get(index)),
            _ => None,
        })
    }

    /// Set `value` at `path`, creating intermediate containers.
    ///
    /// Missing intermediates become arrays when the following segment is an
    /// index and tables otherwise; scalars in the way are replaced. Array
    /// indices may address an existing element or the position just past the
    /// end.
    pub fn set_path(&mut self, path: &[PathSegment], value: TomlValue) -> EditResult<()> {
        let Some((segment, rest)) = path.split_first() else {
            *self = value;
            return Ok(());
        };

        match self {
            TomlValue::Table(table) => {
                let child = table
                    .entry(segment.to_string())
                    .or_insert_with(|| container_for(rest.first()));
                child.set_path(rest, value)
            }
            TomlValue::Array(items) if segment.as_index().is_some() => {
                let index = segment.as_index().unwrap_or_default();
                if index > items.len() {
                    return Err(EditError::CannotSkipArrayIndex {
                        index,
                        len: items.len(),
                    });
                }
                if index == items.len() {
                    items.push(container_for(rest.first()));
                }
                items[index].set_path(rest, value)
            }
            _ => {
                *self = container_for(Some(segment));
                self.set_path(path, value)
            }
        }
    }

    /// Remove and return the value at `path`, keeping the order of siblings.
    pub fn remove_path(&mut self, path: &[PathSegment]) -> Option<TomlValue> {
        let (last, parents) = path.split_last()?;
        let mut current = self;
        for segment in parents {
            current = match current {
                TomlValue::Table(table) => table.get_mut(segment.to_string().as_str())?,
                TomlValue::Array(items) => items.get_mut(segment.as_index()?)?,
                _ => return None,
            };
        }

        match current {
            TomlValue::Table(table) => table.shift_remove(last.to_string().as_str()),
            TomlValue::Array(items) => {
                let index = last.as_index().filter(|index| *index < items.len())?;
                Some(items.remove(index))
            }
            _ => None,
        }
    }
}

fn container_for(next: Option<&PathSegment>) -> TomlValue {
    match next {
        Some(PathSegment::Index(_)) => TomlValue::Array(Vec::new()),
        _ => TomlValue::Table(Table::new()),
    }
}

impl fmt::Display for TomlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::serialize::stringify_value(self))
    }
}

impl From<String> for TomlValue {
    fn from(value: String) -> Self {
        TomlValue::String(value)
    }
}

impl From<&str> for TomlValue {
    fn from(value: &str) -> Self {
        TomlValue::String(value.to_string())
    }
}

impl From<i64> for TomlValue {
    fn from(value: i64) -> Self {
        TomlValue::Integer(value)
    }
}

impl From<i32> for TomlValue {
    fn from(value: i32) -> Self {
        TomlValue::Integer(value.into())
    }
}

impl From<f64> for TomlValue {
    fn from(value: f64) -> Self {
        TomlValue::Float(value)
    }
}

impl From<bool> for TomlValue {
    fn from(value: bool) -> Self {
        TomlValue::Boolean(value)
    }
}

impl From<Table> for TomlValue {
    fn from(value: Table) -> Self {
        TomlValue::Table(value)
    }
}

impl<T: Into<TomlValue>> From<Vec<T>> for TomlValue {
    fn from(value: Vec<T>) -> Self {
        TomlValue::Array(value.into_iter().map(Into::into).collect())
    }
}

impl TryFrom<serde_json::Value> for TomlValue {
    type Error = EditError;

    /// Nulls inside arrays and objects are dropped; a top-level null is an
    /// error.
    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value;

        match value {
            Value::Null => Err(EditError::NullValue),
            Value::Bool(b) => Ok(TomlValue::Boolean(b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(TomlValue::Integer(i)),
                None => n.as_f64().map(TomlValue::Float).ok_or(EditError::NullValue),
            },
            Value::String(s) => Ok(TomlValue::String(s)),
            Value::Array(items) => Ok(TomlValue::Array(
                items
                    .into_iter()
                    .filter(|item| !item.is_null())
                    .map(TomlValue::try_from)
                    .collect::<Result<_, _>>()?,
            )),
            Value::Object(map) => Ok(TomlValue::Table(
                map.into_iter()
                    .filter(|(_, item)| !item.is_null())
                    .map(|(key, item)| Ok((key, TomlValue::try_from(item)?)))
                    .collect::<Result<_, EditError>>()?,
            )),
        }
    }
}
