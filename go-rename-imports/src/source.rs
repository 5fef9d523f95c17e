//! Go source files as tree-sitter trees, with the import edit primitives.
//!
//! Every primitive computes byte-range replacements against the current text,
//! applies them surgically and re-parses, so the tree and the text never
//! disagree. Rendering is the current text.

use std::collections::BTreeSet;
use std::ops::Range;

use tracing::debug;
use tree_sitter::{Node, Parser, Tree};

use crate::error::SourceError;
use crate::surgical::{self, apply_surgical_edits, Replacement};

/// `import "C"` enables cgo; it is never listed, matched or extended.
pub const CGO_PSEUDO_IMPORT: &str = "C";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Alias, `.` or `_`, if present
    pub name: Option<String>,
    /// Unquoted import path
    pub path: String,
    /// Byte range of the quoted path literal
    pub path_range: Range<usize>,
    /// Byte range of the whole spec (name and path)
    pub range: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    pub range: Range<usize>,
    /// `import ( ... )` rather than `import "x"`
    pub grouped: bool,
    pub has_comments: bool,
    pub specs: Vec<ImportSpec>,
}

impl ImportDecl {
    fn imports_cgo(&self) -> bool {
        self.specs.iter().any(|spec| spec.path == CGO_PSEUDO_IMPORT)
    }
}

pub struct GoSource {
    text: String,
    tree: Tree,
}

impl GoSource {
    /// Parse a complete Go file. Any syntax error is fatal.
    pub fn parse(text: &str) -> Result<Self, SourceError> {
        let source = Self::parse_unchecked(text.to_string())?;
        source.check_syntax(None)?;
        Ok(source)
    }

    /// Parse a Go file for reading its imports. Syntax errors after the
    /// import section are ignored.
    pub fn parse_imports_only(text: &str) -> Result<Self, SourceError> {
        let source = Self::parse_unchecked(text.to_string())?;
        source.check_syntax(source.body_start())?;
        Ok(source)
    }

    fn parse_unchecked(text: String) -> Result<Self, SourceError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| SourceError::Grammar(format!("{:?}", e)))?;

        let tree = parser.parse(&text, None).ok_or(SourceError::NoTree)?;
        Ok(Self { text, tree })
    }

    fn check_syntax(&self, limit: Option<usize>) -> Result<(), SourceError> {
        if let Some(node) = first_error(self.tree.root_node()) {
            if limit.map_or(true, |limit| node.start_byte() < limit) {
                let position = node.start_position();
                let start = surgical::line_start(&self.text, node.start_byte());
                let end = surgical::line_end(&self.text, node.start_byte());
                let snippet: String = self.text[start..end].trim().chars().take(60).collect();
                return Err(SourceError::Syntax {
                    line: position.row + 1,
                    column: position.column + 1,
                    snippet,
                });
            }
        }

        if self.package_clause().is_none() {
            return Err(SourceError::MissingPackageClause);
        }
        Ok(())
    }

    fn package_clause(&self) -> Option<Node<'_>> {
        let root = self.tree.root_node();
        let mut cursor = root.walk();
        let clause = root
            .named_children(&mut cursor)
            .find(|node| node.kind() == "package_clause");
        clause
    }

    /// Start of the first declaration after the package clause and imports,
    /// if the parser recognised one.
    fn body_start(&self) -> Option<usize> {
        let root = self.tree.root_node();
        let mut cursor = root.walk();
        let start = root
            .named_children(&mut cursor)
            .find(|node| {
                !matches!(
                    node.kind(),
                    "package_clause" | "import_declaration" | "comment" | "ERROR"
                )
            })
            .map(|node| node.start_byte());
        start
    }

    fn slice(&self, range: Range<usize>) -> &str {
        self.text.get(range).unwrap_or("")
    }

    pub fn import_decls(&self) -> Vec<ImportDecl> {
        let root = self.tree.root_node();
        let mut cursor = root.walk();
        let decls = root
            .named_children(&mut cursor)
            .filter(|node| node.kind() == "import_declaration")
            .map(|node| self.import_decl(node))
            .collect();
        decls
    }

    fn import_decl(&self, decl: Node<'_>) -> ImportDecl {
        let mut specs = Vec::new();
        let mut grouped = false;
        let mut has_comments = false;

        let mut cursor = decl.walk();
        for child in decl.named_children(&mut cursor) {
            match child.kind() {
                "import_spec" => specs.extend(self.import_spec(child)),
                "import_spec_list" => {
                    grouped = true;
                    let mut inner = child.walk();
                    for item in child.named_children(&mut inner) {
                        match item.kind() {
                            "import_spec" => specs.extend(self.import_spec(item)),
                            "comment" => has_comments = true,
                            _ => {}
                        }
                    }
                }
                "comment" => has_comments = true,
                _ => {}
            }
        }

        ImportDecl {
            range: decl.byte_range(),
            grouped,
            has_comments,
            specs,
        }
    }

    fn import_spec(&self, spec: Node<'_>) -> Option<ImportSpec> {
        let path_node = spec.child_by_field_name("path")?;
        let path = unquote(self.slice(path_node.byte_range()));

        Some(ImportSpec {
            name: spec
                .child_by_field_name("name")
                .map(|node| self.slice(node.byte_range()).to_string()),
            path,
            path_range: path_node.byte_range(),
            range: spec.byte_range(),
        })
    }

    /// Import paths in source order, without the cgo pseudo-import.
    pub fn imports(&self) -> Vec<String> {
        self.import_decls()
            .into_iter()
            .flat_map(|decl| decl.specs)
            .map(|spec| spec.path)
            .filter(|path| path != CGO_PSEUDO_IMPORT)
            .collect()
    }

    pub fn import_set(&self) -> BTreeSet<String> {
        self.imports().into_iter().collect()
    }

    /// Every import spec in source order, `"C"` included. A spec's position in
    /// this list is stable across renames.
    pub fn specs(&self) -> Vec<ImportSpec> {
        self.import_decls()
            .into_iter()
            .flat_map(|decl| decl.specs)
            .collect()
    }

    /// Point every import of `old_path` at `new_path`, keeping aliases.
    pub fn rewrite_import(&mut self, old_path: &str, new_path: &str) -> Result<bool, SourceError> {
        let rewrites: Vec<(usize, String)> = self
            .specs()
            .iter()
            .enumerate()
            .filter(|(_, spec)| spec.path == old_path)
            .map(|(index, _)| (index, new_path.to_string()))
            .collect();

        self.rewrite_specs(&rewrites)
    }

    /// Give the specs at the given positions of [`GoSource::specs`] new paths,
    /// all in one edit. Positions past the end are ignored.
    pub fn rewrite_specs(&mut self, rewrites: &[(usize, String)]) -> Result<bool, SourceError> {
        let specs = self.specs();
        let edits: Vec<Replacement> = rewrites
            .iter()
            .filter_map(|(index, new_path)| {
                let spec = specs.get(*index)?;
                debug!(old = %spec.path, new = %new_path, "rewriting import");
                Some(Replacement::new(spec.path_range.clone(), quote(new_path)))
            })
            .collect();

        if edits.is_empty() {
            return Ok(false);
        }

        self.apply(edits)?;
        Ok(true)
    }

    /// Remove every unaliased import of `path`. Aliased, dot and blank
    /// imports of the same path are left alone.
    pub fn delete_import(&mut self, path: &str) -> Result<bool, SourceError> {
        let matches = self
            .import_decls()
            .iter()
            .flat_map(|decl| decl.specs.iter())
            .filter(|spec| spec.path == path && spec.name.is_none())
            .count();

        for _ in 0..matches {
            let Some((decl, index)) = self.find_unnamed(path) else {
                break;
            };
            let edit = self.removal_edit(&decl, index);
            debug!(path, "deleting import");
            self.apply(vec![edit])?;
        }

        Ok(matches > 0)
    }

    fn find_unnamed(&self, path: &str) -> Option<(ImportDecl, usize)> {
        self.import_decls().into_iter().find_map(|decl| {
            let index = decl
                .specs
                .iter()
                .position(|spec| spec.path == path && spec.name.is_none())?;
            Some((decl, index))
        })
    }

    fn removal_edit(&self, decl: &ImportDecl, index: usize) -> Replacement {
        if decl.specs.len() == 1 {
            return Replacement::delete(self.line_span(decl.range.clone()));
        }

        // A comment-free group left with one spec drops its parentheses.
        if decl.grouped && decl.specs.len() == 2 && !decl.has_comments {
            let survivor = &decl.specs[1 - index];
            return Replacement::new(
                decl.range.clone(),
                format!("import {}", self.slice(survivor.range.clone())),
            );
        }

        Replacement::delete(self.line_span(decl.specs[index].range.clone()))
    }

    /// The bytes to delete to remove `range`: whole lines when it sits alone
    /// on them, otherwise the range plus any trailing `;`.
    fn line_span(&self, range: Range<usize>) -> Range<usize> {
        let text = &self.text;
        let start = surgical::line_start(text, range.start);
        let end = surgical::line_end(text, range.end);
        let rest = &text[range.end..end];
        let after = rest.trim_start_matches([' ', '\t', ';']);

        let owns_line = surgical::is_blank(&text[start..range.start])
            && (surgical::is_blank(after) || after.starts_with("//"));

        if !owns_line {
            let trailing = rest.len() - after.len();
            return range.start..range.end + trailing;
        }

        let mut span = start..surgical::line_end_inclusive(text, range.end);
        self.close_hole(&mut span);
        span
    }

    /// Extend a whole-line deletion so it does not leave a doubled blank line,
    /// a blank line after `(`, or a blank line before `)` / EOF.
    fn close_hole(&self, span: &mut Range<usize>) {
        let text = &self.text;

        let prev = (span.start > 0).then(|| {
            let prev_start = surgical::line_start(text, span.start - 1);
            &text[prev_start..span.start - 1]
        });
        let prev_blank = prev.is_some_and(surgical::is_blank);
        let prev_open = prev.is_some_and(|line| line.trim_end().ends_with('('));

        let next = (span.end < text.len()).then(|| &text[span.end..surgical::line_end(text, span.end)]);
        let next_blank = next.is_some_and(surgical::is_blank);
        let next_close = next.is_some_and(|line| line.trim_start().starts_with(')'));

        if next_blank && (prev_blank || prev_open) {
            span.end = surgical::line_end_inclusive(text, span.end);
        } else if prev_blank && (next_close || next.is_none()) {
            span.start = surgical::line_start(text, span.start - 1);
        }
    }

    /// Add an unaliased import of `path` unless one already exists.
    pub fn add_import(&mut self, path: &str) -> Result<bool, SourceError> {
        let decls = self.import_decls();
        let exists = decls
            .iter()
            .flat_map(|decl| decl.specs.iter())
            .any(|spec| spec.path == path && spec.name.is_none());
        if exists {
            return Ok(false);
        }

        let edit = self.insertion_edit(&decls, path)?;
        debug!(path, "adding import");
        self.apply(vec![edit])?;
        Ok(true)
    }

    fn insertion_edit(&self, decls: &[ImportDecl], path: &str) -> Result<Replacement, SourceError> {
        let text = &self.text;
        let literal = quote(path);

        match best_anchor(decls, path) {
            Some((decl, Some(index))) => {
                let decl = &decls[decl];
                let anchor = &decl.specs[index];

                if !decl.grouped {
                    return Ok(Replacement::new(
                        decl.range.clone(),
                        format!("import (\n\t{}\n\t{}\n)", self.slice(anchor.range.clone()), literal),
                    ));
                }

                let line_rest = &text[anchor.range.end..surgical::line_end(text, anchor.range.end)];
                let after = line_rest.trim_start_matches([' ', '\t', ';']);
                if surgical::is_blank(after) || after.starts_with("//") {
                    let indent = surgical::indentation(text, anchor.range.start);
                    Ok(Replacement::insert(
                        surgical::line_end_inclusive(text, anchor.range.end),
                        format!("{}{}\n", indent, literal),
                    ))
                } else {
                    Ok(Replacement::insert(anchor.range.end, format!("; {}", literal)))
                }
            }
            Some((decl, None)) => Ok(Replacement::new(
                decls[decl].range.clone(),
                format!("import (\n\t{}\n)", literal),
            )),
            None => {
                if let Some(last) = decls.last() {
                    return Ok(Replacement::insert(last.range.end, format!("\n\nimport {}", literal)));
                }
                let clause = self.package_clause().ok_or(SourceError::MissingPackageClause)?;
                Ok(Replacement::insert(
                    surgical::line_end(text, clause.end_byte()),
                    format!("\n\nimport {}", literal),
                ))
            }
        }
    }

    fn apply(&mut self, edits: Vec<Replacement>) -> Result<(), SourceError> {
        let text = apply_surgical_edits(&self.text, edits)?;
        let source = Self::parse_unchecked(text)?;
        source.check_syntax(None)?;
        *self = source;
        Ok(())
    }

    /// Formatted output of the current tree.
    pub fn render(&self) -> String {
        self.text.clone()
    }
}

/// Interpreted string literal for `path`, escaped the way Go's `strconv.Quote` does.
fn quote(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 2);
    out.push('"');
    for c in path.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => out.push_str(&format!("\\x{:02x}", c as u32)),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// The value of a Go string literal, raw or interpreted. A literal with a
/// malformed escape yields its text between the quotes unchanged.
fn unquote(literal: &str) -> String {
    let inner = literal.get(1..literal.len().saturating_sub(1)).unwrap_or("");
    if literal.starts_with('`') {
        return inner.replace('\r', "");
    }
    unescape(inner).unwrap_or_else(|| inner.to_string())
}

fn unescape(inner: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }

        let escape = chars.next()?;
        let simple = match escape {
            'a' => Some(0x07),
            'b' => Some(0x08),
            'f' => Some(0x0c),
            'n' => Some(b'\n'),
            'r' => Some(b'\r'),
            't' => Some(b'\t'),
            'v' => Some(0x0b),
            '\\' => Some(b'\\'),
            '"' => Some(b'"'),
            _ => None,
        };
        if let Some(byte) = simple {
            bytes.push(byte);
            continue;
        }

        match escape {
            'x' => bytes.push(u8::from_str_radix(&take(&mut chars, 2)?, 16).ok()?),
            '0'..='7' => {
                let digits = format!("{}{}", escape, take(&mut chars, 2)?);
                bytes.push(u8::from_str_radix(&digits, 8).ok()?);
            }
            'u' | 'U' => {
                let width = if escape == 'u' { 4 } else { 8 };
                let code = u32::from_str_radix(&take(&mut chars, width)?, 16).ok()?;
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(char::from_u32(code)?.encode_utf8(&mut buf).as_bytes());
            }
            _ => return None,
        }
    }

    String::from_utf8(bytes).ok()
}

fn take(chars: &mut std::str::Chars<'_>, n: usize) -> Option<String> {
    let taken: String = chars.by_ref().take(n).collect();
    (taken.chars().count() == n).then_some(taken)
}

fn first_error<'t>(node: Node<'t>) -> Option<Node<'t>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error(child) {
            return Some(found);
        }
    }
    None
}

/// Number of `/`-separated segments two import paths share.
fn match_len(a: &str, b: &str) -> i64 {
    a.bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .filter(|(x, _)| *x == b'/')
        .count() as i64
}

/// Third-party import paths have a dot in them (`github.com/...`).
fn is_third_party(path: &str) -> bool {
    path.contains('.')
}

/// Pick the declaration (and spec within it) a new import goes after.
///
/// The spec sharing the most path segments wins. With nothing shared, a
/// stdlib path goes after the first spec and a third-party path after the
/// first third-party spec. Declarations importing "C" are never chosen.
fn best_anchor(decls: &[ImportDecl], path: &str) -> Option<(usize, Option<usize>)> {
    let third_party = is_third_party(path);
    let mut best_match = -1i64;
    let mut anchor = None;

    for (d, decl) in decls.iter().enumerate() {
        if decl.imports_cgo() {
            continue;
        }
        if decl.specs.is_empty() && best_match == -1 {
            anchor = Some((d, None));
        }

        let mut seen_third_party = false;
        for (s, spec) in decl.specs.iter().enumerate() {
            let n = match_len(&spec.path, path);
            if n > best_match || (best_match == 0 && !seen_third_party && third_party) {
                best_match = n;
                anchor = Some((d, Some(s)));
            }
            seen_third_party |= is_third_party(&spec.path);
        }
    }

    anchor
}
