//! Structural classification of syntax nodes and resolution of their logical
//! paths.

use crate::lex::SyntaxKind;
use crate::path::{Path, PathSegment};
use crate::toml::{Array, KeyValue, SyntaxNode, Table};
use rowan::ast::AstNode;
use rowan::TextRange;
use std::collections::HashMap;

/// The structural role of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The document root
    Document,
    /// A `[table]` section
    StandardTable,
    /// A `[[table]]` section
    ArrayOfTables,
    /// A `key = value` pair
    KeyValue,
    /// The key of a pair or header
    Key,
    /// An inline table value
    InlineTable,
    /// An array value
    Array,
    /// A scalar value
    Scalar,
    /// Anything the parser could not make sense of
    Error,
}

impl NodeKind {
    /// Whether nodes of this kind get a path of their own.
    ///
    /// The root, keys and key-value pairs are skipped: a pair's path is the
    /// path of its value.
    pub fn is_addressable(self) -> bool {
        matches!(
            self,
            NodeKind::StandardTable
                | NodeKind::ArrayOfTables
                | NodeKind::InlineTable
                | NodeKind::Array
                | NodeKind::Scalar
        )
    }

    /// Whether this is either kind of table section.
    pub fn is_table(self) -> bool {
        matches!(self, NodeKind::StandardTable | NodeKind::ArrayOfTables)
    }
}

/// Classify a node.
pub fn classify(node: &SyntaxNode) -> NodeKind {
    match node.kind() {
        SyntaxKind::ROOT => NodeKind::Document,
        SyntaxKind::TABLE => NodeKind::StandardTable,
        SyntaxKind::ARRAY_TABLE => NodeKind::ArrayOfTables,
        SyntaxKind::KEY_VALUE => NodeKind::KeyValue,
        SyntaxKind::KEY => NodeKind::Key,
        SyntaxKind::INLINE_TABLE => NodeKind::InlineTable,
        SyntaxKind::ARRAY => NodeKind::Array,
        SyntaxKind::SCALAR => NodeKind::Scalar,
        _ => NodeKind::Error,
    }
}

/// Resolves logical paths for the nodes of one parsed document.
///
/// Table keys depend on every header before them (`[[a]]` twice makes
/// `a.0` and `a.1`; a later `[a.b]` lands in `a.1`), so they are computed
/// once up front.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    table_keys: HashMap<TextRange, Path>,
}

impl Resolver {
    /// Resolve the keys of every table in the document rooted at `root`.
    pub fn new(root: &SyntaxNode) -> Self {
        let mut table_keys = HashMap::new();
        let mut array_counts: HashMap<Path, usize> = HashMap::new();

        for table in root.children().filter_map(Table::cast) {
            let segments = table
                .header_key()
                .map(|key| key.segments())
                .unwrap_or_default();
            let last = segments.len().saturating_sub(1);
            let mut resolved = Path::new();

            for (i, segment) in segments.into_iter().enumerate() {
                resolved.push(segment);
                if i == last && table.is_array() {
                    let count = array_counts.entry(resolved.clone()).or_insert(0);
                    resolved.push(*count);
                    *count += 1;
                } else if i != last {
                    // A prefix naming an array of tables means its latest element.
                    if let Some(count) = array_counts.get(&resolved) {
                        resolved.push(count.saturating_sub(1));
                    }
                }
            }

            table_keys.insert(table.syntax().text_range(), resolved);
        }

        Self { table_keys }
    }

    /// The resolved key of a table node; empty for anything else.
    pub fn table_key(&self, table: &SyntaxNode) -> Path {
        self.table_keys
            .get(&table.text_range())
            .cloned()
            .unwrap_or_default()
    }

    /// The logical path of `node`, walking up to the root.
    pub fn resolve_path(&self, node: &SyntaxNode) -> Path {
        if classify(node).is_table() {
            return self.table_key(node);
        }

        let mut reversed: Vec<PathSegment> = Vec::new();
        let mut current = node.clone();

        while let Some(parent) = current.parent() {
            match classify(&parent) {
                NodeKind::StandardTable | NodeKind::ArrayOfTables => {
                    reversed.extend(self.table_key(&parent).into_iter().rev());
                    break;
                }
                NodeKind::Array => {
                    if let Some(index) = Array::cast(parent.clone())
                        .and_then(|array| array.elements().position(|element| element == current))
                    {
                        reversed.push(PathSegment::Index(index));
                    }
                }
                NodeKind::KeyValue if current.kind().is_value_node() => {
                    if let Some(key) = KeyValue::cast(parent.clone()).and_then(|kv| kv.key()) {
                        reversed.extend(key.path().into_iter().rev());
                    }
                }
                _ => {}
            }
            current = parent;
        }

        reversed.reverse();
        reversed.into()
    }
}
