//! Targeted, format-preserving rewrites of TOML documents.
//!
//! A rewrite parses the document, finds the node whose logical path equals
//! the requested one and splices new text over its byte range. When no node
//! matches, the closest existing ancestor decides where and in what shape the
//! new value is inserted. The tree is never mutated; every edit is a string
//! splice, and type changes re-run the rewrite on the spliced text.

use crate::classify::{classify, NodeKind, Resolver};
use crate::error::{EditError, EditResult};
use crate::path::{matched_prefix, paths_equal, Path, PathSegment, PathTracker};
use crate::serialize::{serialize_key_value, serialize_table, stringify_value, TableStyle};
use crate::toml::{span, value_of, Array, Document, KeyValue, SyntaxNode};
use crate::value::{Table, TomlValue};
use rowan::ast::AstNode;
use tracing::{debug, trace};

/// Options controlling a [`Rewriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Reject values that are not strings, numbers, booleans or date-times.
    pub scalars_only: bool,
    /// How many nested type-change re-runs are allowed beyond the path length.
    pub recursion_slack: usize,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            scalars_only: false,
            recursion_slack: 4,
        }
    }
}

impl RewriteOptions {
    /// Create the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether only scalar values are accepted.
    pub fn scalars_only(mut self, scalars_only: bool) -> Self {
        self.scalars_only = scalars_only;
        self
    }

    /// Set the recursion slack.
    pub fn recursion_slack(mut self, recursion_slack: usize) -> Self {
        self.recursion_slack = recursion_slack;
        self
    }
}

/// A single change: set `path` to `value`, or remove it when `value` is
/// `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    /// Where to apply the change
    pub path: Path,
    /// The new value, or `None` to remove
    pub value: Option<TomlValue>,
}

impl Edit {
    /// Set `path` to `value`.
    pub fn set(path: impl Into<Path>, value: impl Into<TomlValue>) -> Self {
        Self {
            path: path.into(),
            value: Some(value.into()),
        }
    }

    /// Remove whatever is at `path`.
    pub fn remove(path: impl Into<Path>) -> Self {
        Self {
            path: path.into(),
            value: None,
        }
    }
}

/// Applies rewrites with a fixed set of options.
#[derive(Debug, Clone, Default)]
pub struct Rewriter {
    options: RewriteOptions,
}

impl Rewriter {
    /// Create a rewriter with the given options.
    pub fn new(options: RewriteOptions) -> Self {
        Self { options }
    }

    /// The options in use.
    pub fn options(&self) -> &RewriteOptions {
        &self.options
    }

    /// Set (`Some`) or remove (`None`) the value at `path`, returning the new
    /// document text.
    pub fn rewrite(
        &self,
        text: &str,
        path: &[PathSegment],
        value: Option<&TomlValue>,
    ) -> EditResult<String> {
        if path.is_empty() {
            return Err(EditError::EmptyPath);
        }
        if self.options.scalars_only && value.is_some_and(|value| !value.is_scalar()) {
            return Err(EditError::NonScalarValue);
        }

        let depth = Depth {
            current: 0,
            limit: path.len() + self.options.recursion_slack,
        };
        replace(text, path, value, depth)
    }

    /// Set the value at `path`.
    pub fn set(&self, text: &str, path: &[PathSegment], value: &TomlValue) -> EditResult<String> {
        self.rewrite(text, path, Some(value))
    }

    /// Remove the value at `path`; removing something absent is a no-op.
    pub fn remove(&self, text: &str, path: &[PathSegment]) -> EditResult<String> {
        self.rewrite(text, path, None)
    }

    /// Apply `edits` in order, each to the output of the previous one.
    pub fn apply_all<'a>(
        &self,
        text: &str,
        edits: impl IntoIterator<Item = &'a Edit>,
    ) -> EditResult<String> {
        edits.into_iter().try_fold(text.to_string(), |text, edit| {
            self.rewrite(&text, &edit.path, edit.value.as_ref())
        })
    }
}

/// Set (`Some`) or remove (`None`) the value at `path` with default options.
pub fn rewrite(text: &str, path: &[PathSegment], value: Option<&TomlValue>) -> EditResult<String> {
    Rewriter::default().rewrite(text, path, value)
}

/// Set the value at `path` with default options.
pub fn set(text: &str, path: &[PathSegment], value: &TomlValue) -> EditResult<String> {
    Rewriter::default().set(text, path, value)
}

/// Remove the value at `path` with default options.
pub fn remove(text: &str, path: &[PathSegment]) -> EditResult<String> {
    Rewriter::default().remove(text, path)
}

/// Apply `edits` in order with default options.
pub fn apply_all<'a>(text: &str, edits: impl IntoIterator<Item = &'a Edit>) -> EditResult<String> {
    Rewriter::default().apply_all(text, edits)
}

/// Read the logical value at `path`.
pub fn get(text: &str, path: &[PathSegment]) -> EditResult<Option<TomlValue>> {
    let doc: Document = Document::parse(text).into_result()?;
    Ok(doc.to_value()?.get_path(path).cloned())
}

#[derive(Debug, Clone, Copy)]
struct Depth {
    current: usize,
    limit: usize,
}

impl Depth {
    fn deeper(self) -> EditResult<Depth> {
        if self.current >= self.limit {
            return Err(EditError::RecursionLimit { limit: self.limit });
        }
        Ok(Depth {
            current: self.current + 1,
            limit: self.limit,
        })
    }
}

/// Everything learned from one walk over the tree.
struct Traversal {
    resolver: Resolver,
    tracker: PathTracker<SyntaxNode>,
    most_matched: Path,
    target: Option<SyntaxNode>,
}

impl Traversal {
    fn new(root: &SyntaxNode, path: &[PathSegment]) -> Self {
        let resolver = Resolver::new(root);
        let mut tracker = PathTracker::new();
        let mut most_matched = Path::new();
        let mut target = None;

        for node in root.descendants() {
            let kind = classify(&node);
            if !kind.is_addressable() {
                continue;
            }

            let current = resolver.resolve_path(&node);
            let matched = matched_prefix(path, &current);
            if matched.len() > most_matched.len() {
                most_matched = matched.into();
            }
            if target.is_none() && paths_equal(&current, path) {
                target = Some(node.clone());
            }

            trace!(path = %current, ?kind, "visited node");
            tracker.record(current, node);
        }

        Self {
            resolver,
            tracker,
            most_matched,
            target,
        }
    }

    /// Array-of-tables elements recorded directly under `path`.
    fn table_array_len(&self, path: &[PathSegment]) -> usize {
        self.tracker
            .iter()
            .filter(|(recorded, node)| {
                classify(node) == NodeKind::ArrayOfTables
                    && recorded.len() == path.len() + 1
                    && recorded.starts_with(path)
            })
            .count()
    }
}

fn replace(
    text: &str,
    path: &[PathSegment],
    value: Option<&TomlValue>,
    depth: Depth,
) -> EditResult<String> {
    let doc = Document::parse(text).into_result()?;
    let traversal = Traversal::new(doc.syntax(), path);
    let eol = line_ending(text);

    match (&traversal.target, value) {
        (Some(node), Some(value)) => {
            debug!(path = %Path::from(path), kind = ?classify(node), "updating");
            update(text, path, value, node, &traversal, depth, eol)
        }
        (Some(node), None) => {
            debug!(path = %Path::from(path), kind = ?classify(node), "removing");
            remove_node(text, path, node, &traversal)
        }
        (None, _) => {
            debug!(
                path = %Path::from(path),
                most_matched = %traversal.most_matched,
                "no exact match, inserting"
            );
            insert(text, path, value, &traversal, depth, eol)
        }
    }
}

fn update(
    text: &str,
    path: &[PathSegment],
    value: &TomlValue,
    node: &SyntaxNode,
    traversal: &Traversal,
    depth: Depth,
    eol: &str,
) -> EditResult<String> {
    let kind = classify(node);
    let (start, end) = bounds(node);

    match value {
        TomlValue::Table(table) if kind.is_table() && !table.is_empty() => {
            let key = traversal.resolver.table_key(node);
            let (table_path, style) = match kind {
                NodeKind::ArrayOfTables => {
                    (&key[..key.len().saturating_sub(1)], TableStyle::ArrayOfTables)
                }
                _ => (&key[..], TableStyle::Standard),
            };
            let block = serialize_table(table_path, table, style);
            Ok(splice(text, start, end, &native(block, eol)))
        }
        _ if kind.is_table() => {
            debug!(path = %Path::from(path), "table changes type, removing and re-inserting");
            let depth = depth.deeper()?;
            let without_table = replace(text, path, None, depth)?;
            replace(&without_table, path, Some(value), depth)
        }
        _ => Ok(splice(text, start, end, &stringify_value(value))),
    }
}

fn remove_node(
    text: &str,
    path: &[PathSegment],
    node: &SyntaxNode,
    traversal: &Traversal,
) -> EditResult<String> {
    let Some(parent) = node.parent() else {
        return Ok(text.to_string());
    };

    match classify(&parent) {
        NodeKind::Array => Ok(remove_array_element(text, &parent, node)),
        NodeKind::KeyValue => {
            let Some(owner) = parent.parent() else {
                return Ok(remove_line(text, bounds(&parent)));
            };

            match classify(&owner) {
                NodeKind::Document | NodeKind::StandardTable | NodeKind::ArrayOfTables => {
                    let is_root = classify(&owner) == NodeKind::Document;
                    let entries = owner
                        .children()
                        .filter(|child| {
                            let kind = classify(child);
                            kind == NodeKind::KeyValue || (is_root && kind.is_table())
                        })
                        .count();

                    if entries > 1 {
                        Ok(remove_line(text, bounds(&parent)))
                    } else if is_root {
                        Ok(String::new())
                    } else {
                        // An empty header could capture keys added later.
                        debug!("removing last key, dropping its table");
                        Ok(remove_line(text, bounds(&owner)))
                    }
                }
                NodeKind::InlineTable => {
                    let owner_path = traversal.resolver.resolve_path(&owner);
                    let mut data = value_of(&owner)?;
                    data.remove_path(path.get(owner_path.len()..).unwrap_or_default());
                    let (start, end) = bounds(&owner);
                    Ok(splice(text, start, end, &stringify_value(&data)))
                }
                _ => Ok(remove_line(text, bounds(&parent))),
            }
        }
        _ => Ok(remove_line(text, bounds(node))),
    }
}

fn remove_array_element(text: &str, array: &SyntaxNode, node: &SyntaxNode) -> String {
    let elements: Vec<_> = Array::cast(array.clone())
        .map(|array| array.elements().collect())
        .unwrap_or_default();
    let (array_start, array_end) = bounds(array);

    if elements.len() == 1 {
        return splice(text, array_start, array_end, "[]");
    }

    let (start, end) = bounds(node);
    let index = elements.iter().position(|element| element == node);

    if let Some(next) = index.and_then(|index| elements.get(index + 1)) {
        let (next_start, _) = bounds(next);
        return format!("{}{}", &text[..start], &text[next_start..]);
    }

    let to_array_end = &text[end..array_end];
    match to_array_end.find('\n') {
        // Last element on the closing bracket's line: drop it and one comma.
        None => {
            let before = text[..start].trim_end();
            match to_array_end.find(',') {
                Some(comma) => format!("{}{}", before, &text[end + comma + 1..]),
                None => format!(
                    "{}{}",
                    before.strip_suffix(',').unwrap_or(before),
                    &text[end..]
                ),
            }
        }
        Some(newline) => format!("{}{}", text[..start].trim_end(), &text[end + newline..]),
    }
}

fn insert(
    text: &str,
    path: &[PathSegment],
    value: Option<&TomlValue>,
    traversal: &Traversal,
    depth: Depth,
    eol: &str,
) -> EditResult<String> {
    let most_matched = &traversal.most_matched;
    let mut anchor = traversal.tracker.lookup(most_matched).cloned();

    if anchor.is_none() {
        match traversal.tracker.lookup(&most_matched.with(0)) {
            Some(first) if classify(first) == NodeKind::ArrayOfTables => {
                if value.is_none() {
                    if !paths_equal(path, most_matched) {
                        return Ok(text.to_string());
                    }
                    debug!(path = %most_matched, "removing every element of array of tables");
                    let count = traversal.table_array_len(most_matched);
                    return remove_table_array(text, most_matched, count, depth.deeper()?);
                }
                anchor = Some(first.clone());
            }
            _ => {
                anchor = (1..most_matched.len())
                    .rev()
                    .find_map(|len| traversal.tracker.lookup(&most_matched[..len]).cloned());
            }
        }
    }

    let Some(value) = value else {
        debug!(path = %Path::from(path), "nothing to remove");
        return Ok(text.to_string());
    };

    let Some(anchor) = anchor else {
        if let Some((sibling, base)) = dotted_key_value(traversal, most_matched) {
            debug!(path = %Path::from(path), "adding a dotted key next to its sibling");
            let (_, end) = bounds(sibling.syntax());
            let cut = line_end(text, end);
            return Ok(format!(
                "{}{}{}{}",
                &text[..cut],
                eol,
                serialize_key_value(&path[base..], value),
                &text[cut..]
            ));
        }
        return Ok(insert_unanchored(text, path, value, eol));
    };

    let kind = classify(&anchor);
    debug!(anchor = %traversal.resolver.resolve_path(&anchor), ?kind, "inserting at anchor");

    match kind {
        NodeKind::ArrayOfTables => {
            insert_into_table_array(text, path, value, &anchor, traversal, depth, eol)
        }
        NodeKind::StandardTable => {
            let key = traversal.resolver.table_key(&anchor);
            let rest = path.get(key.len()..).unwrap_or_default();
            Ok(insert_after_header(text, &anchor, rest, value, eol))
        }
        NodeKind::Array => insert_into_array(text, path, value, &anchor, traversal, eol),
        NodeKind::InlineTable => {
            let table_path = traversal.resolver.resolve_path(&anchor);
            let mut data = value_of(&anchor)?;
            data.set_path(path.get(table_path.len()..).unwrap_or_default(), value.clone())?;
            let (start, end) = bounds(&anchor);
            Ok(splice(text, start, end, &stringify_value(&data)))
        }
        NodeKind::Scalar
        | NodeKind::KeyValue
        | NodeKind::Key
        | NodeKind::Document
        | NodeKind::Error => {
            let leaf_path = traversal.resolver.resolve_path(&anchor);
            let mut body = TomlValue::Table(Table::new());
            body.set_path(path.get(leaf_path.len()..).unwrap_or_default(), value.clone())?;
            let (start, end) = bounds(&anchor);
            Ok(splice(text, start, end, &stringify_value(&body)))
        }
    }
}

/// The last key-value whose dotted key defines the table at `prefix`, with
/// the length of the path of the table that holds it.
fn dotted_key_value(traversal: &Traversal, prefix: &[PathSegment]) -> Option<(KeyValue, usize)> {
    traversal
        .tracker
        .iter()
        .filter(|(recorded, _)| recorded.len() > prefix.len() && recorded.starts_with(prefix))
        .filter_map(|(_, node)| {
            let kv = node.ancestors().find_map(KeyValue::cast)?;
            let base = traversal.resolver.resolve_path(kv.syntax()).len();
            (base < prefix.len()).then_some((kv, base))
        })
        .last()
}

/// Nothing in the document relates to `path`.
fn insert_unanchored(text: &str, path: &[PathSegment], value: &TomlValue, eol: &str) -> String {
    match value {
        TomlValue::Table(table) if !table.is_empty() => {
            append_block(text, &serialize_table(path, table, TableStyle::Standard), eol)
        }
        TomlValue::Array(items) if value.is_array_of_tables() => {
            let blocks: Vec<_> = items
                .iter()
                .filter_map(TomlValue::as_table)
                .map(|table| serialize_table(path, table, TableStyle::ArrayOfTables))
                .collect();
            append_block(text, &blocks.join("\n\n"), eol)
        }
        _ => match path.split_last() {
            Some((last, parent)) if !parent.is_empty() => {
                let mut table = Table::new();
                table.insert(last.to_string(), value.clone());
                append_block(text, &serialize_table(parent, &table, TableStyle::Standard), eol)
            }
            // A key appended at the end would land in whichever table is last.
            _ => {
                let line = serialize_key_value(path, value);
                let rest = text.trim_start();
                if rest.is_empty() {
                    line
                } else {
                    format!("{}{}{}{}", line, eol, eol, rest)
                }
            }
        },
    }
}

fn insert_into_table_array(
    text: &str,
    path: &[PathSegment],
    value: &TomlValue,
    anchor: &SyntaxNode,
    traversal: &Traversal,
    depth: Depth,
    eol: &str,
) -> EditResult<String> {
    let key = traversal.resolver.table_key(anchor);
    let entire = Path::from(&key[..key.len().saturating_sub(1)]);
    let element_index = path
        .get(key.len().saturating_sub(1))
        .and_then(PathSegment::as_index);
    let anchor_index = key.last().and_then(PathSegment::as_index);
    let targeted_index = element_index
        .filter(|index| path.len() == key.len() || Some(*index) != anchor_index);

    if let Some(index) = targeted_index {
        let body = if path.len() == key.len() {
            let TomlValue::Table(body) = value else {
                return Err(EditError::TableArrayBodyMustBeObject);
            };
            body.clone()
        } else {
            let mut body = TomlValue::Table(Table::new());
            body.set_path(&path[key.len()..], value.clone())?;
            body.as_table().cloned().unwrap_or_default()
        };
        let block = native(serialize_table(&entire, &body, TableStyle::ArrayOfTables), eol);

        if let Some(existing) = traversal.tracker.lookup(&entire.with(index)) {
            if classify(existing) != NodeKind::ArrayOfTables {
                return Err(EditError::ExpectedTableArrayElement {
                    path: Path::from(path).to_string(),
                });
            }
            if path.len() > key.len() {
                return Ok(insert_after_header(text, existing, &path[key.len()..], value, eol));
            }
            let (start, end) = bounds(existing);
            return Ok(splice(text, start, end, &block));
        }

        let previous = index
            .checked_sub(1)
            .and_then(|previous| traversal.tracker.lookup(&entire.with(previous)))
            .ok_or(EditError::CannotSkipTableArrayIndex { index })?;
        let (_, previous_end) = bounds(previous);
        return Ok(format!(
            "{}{}{}{}{}",
            text[..previous_end].trim_end(),
            eol,
            eol,
            block,
            &text[previous_end..]
        ));
    }

    let type_change = paths_equal(path, &entire)
        || path
            .get(key.len().saturating_sub(1))
            .is_some_and(|segment| !segment.is_index());
    if type_change {
        debug!(path = %entire, "array of tables changes type, removing and re-inserting");
        let depth = depth.deeper()?;
        let count = traversal.table_array_len(&entire);
        let stripped = remove_table_array(text, &entire, count, depth)?;
        return replace(&stripped, path, Some(value), depth);
    }

    let rest = path.get(key.len()..).unwrap_or_default();
    Ok(insert_after_header(text, anchor, rest, value, eol))
}

/// Remove the first element of the array of tables at `path`, `count` times.
fn remove_table_array(
    text: &str,
    path: &[PathSegment],
    count: usize,
    depth: Depth,
) -> EditResult<String> {
    let first = Path::from(path).with(0);
    (0..count).try_fold(text.to_string(), |text, _| {
        replace(&text, &first, None, depth)
    })
}

fn insert_into_array(
    text: &str,
    path: &[PathSegment],
    value: &TomlValue,
    anchor: &SyntaxNode,
    traversal: &Traversal,
    eol: &str,
) -> EditResult<String> {
    let array_path = traversal.resolver.resolve_path(anchor);
    let rest = path.get(array_path.len()..).unwrap_or_default();
    let (array_start, array_end) = bounds(anchor);

    let Some(index) = rest.first().and_then(PathSegment::as_index) else {
        // A key into an array turns it into a table.
        let mut body = TomlValue::Table(Table::new());
        body.set_path(rest, value.clone())?;
        return Ok(splice(text, array_start, array_end, &stringify_value(&body)));
    };

    let elements: Vec<_> = Array::cast(anchor.clone())
        .map(|array| array.elements().collect())
        .unwrap_or_default();
    if index > elements.len() {
        return Err(EditError::CannotSkipArrayIndex {
            index,
            len: elements.len(),
        });
    }

    let body = if rest.len() > 1 {
        let mut body = TomlValue::Table(Table::new());
        body.set_path(&rest[1..], value.clone())?;
        body
    } else {
        value.clone()
    };

    if let Some(existing) = elements.get(index) {
        let (start, end) = bounds(existing);
        return Ok(splice(text, start, end, &stringify_value(&body)));
    }

    let Some(last) = elements.last() else {
        let array = TomlValue::Array(vec![body]);
        return Ok(splice(text, array_start, array_end, &stringify_value(&array)));
    };

    // Copy the separator and indentation used before the last element.
    let (last_start, last_end) = bounds(last);
    let separator_start = match elements.len() {
        1 => array_start + 1,
        len => bounds(&elements[len - 2]).1,
    };
    let indent = text[separator_start..last_start]
        .rsplit('\n')
        .next()
        .unwrap_or_default();
    let indent = without_separator(indent);

    let to_array_end = &text[last_end..array_end - 1];
    let multiline = to_array_end.contains('\n');
    let without_comma = without_separator(to_array_end);
    let rest_of_line = without_comma
        .split('\n')
        .next()
        .unwrap_or_default()
        .trim_end_matches('\r');
    let closing_indent = without_comma.rsplit('\n').next().unwrap_or_default();

    let mut out = String::with_capacity(text.len() + 32);
    out.push_str(&text[..last_end]);
    out.push(',');
    if multiline {
        out.push_str(rest_of_line);
        out.push_str(eol);
    }
    out.push_str(&indent);
    out.push_str(&stringify_value(&body));
    if multiline {
        out.push_str(eol);
    }
    out.push_str(closing_indent);
    out.push_str(&text[array_end - 1..]);
    Ok(out)
}

/// Drop the first comma of `trivia` that precedes any comment.
fn without_separator(trivia: &str) -> String {
    let code_end = trivia.find('#').unwrap_or(trivia.len());
    match trivia[..code_end].find(',') {
        Some(comma) => format!("{}{}", &trivia[..comma], &trivia[comma + 1..]),
        None => trivia.to_string(),
    }
}

/// Add `rest = value` on the line after the header of `table`.
fn insert_after_header(
    text: &str,
    table: &SyntaxNode,
    rest: &[PathSegment],
    value: &TomlValue,
    eol: &str,
) -> String {
    let (start, _) = bounds(table);
    let cut = line_end(text, start);
    format!(
        "{}{}{}{}",
        text[..cut].trim_end(),
        eol,
        serialize_key_value(rest, value),
        &text[cut..]
    )
}

/// Append a block after the document, separated by a blank line.
fn append_block(text: &str, block: &str, eol: &str) -> String {
    let block = native(block.to_string(), eol);
    let head = text.trim_end();
    if head.is_empty() {
        return block;
    }
    let trailing = if text.ends_with('\n') { eol } else { "" };
    format!("{}{}{}{}{}", head, eol, eol, block, trailing)
}

/// Cut out `[start, end)` and the rest of its line, along with the
/// whitespace before it.
fn remove_line(text: &str, (start, end): (usize, usize)) -> String {
    let before = text[..start].trim_end();
    let after = &text[line_end(text, end)..];
    if before.is_empty() {
        after.trim_start_matches(['\r', '\n']).to_string()
    } else {
        format!("{}{}", before, after)
    }
}

/// Offset of the line terminator at or after `from`, or the end of text.
fn line_end(text: &str, from: usize) -> usize {
    match text[from..].find('\n') {
        Some(newline) if newline > 0 && text.as_bytes()[from + newline - 1] == b'\r' => {
            from + newline - 1
        }
        Some(newline) => from + newline,
        None => text.len(),
    }
}

fn bounds(node: &SyntaxNode) -> (usize, usize) {
    let range = span(node);
    (range.start().into(), range.end().into())
}

fn splice(text: &str, start: usize, end: usize, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len() - (end - start) + replacement.len());
    out.push_str(&text[..start]);
    out.push_str(replacement);
    out.push_str(&text[end..]);
    out
}

fn line_ending(text: &str) -> &'static str {
    if text.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

/// Generated blocks use `\n`; match the document's line endings.
fn native(block: String, eol: &str) -> String {
    if eol == "\n" {
        block
    } else {
        block.replace('\n', eol)
    }
}
