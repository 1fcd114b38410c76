//! Call-site metadata for one labeled logging statement.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::aliases::AliasTable;
use crate::ast::{Key, NodeId, NodeKind, Tree};
use crate::{err_msg, MetalogError};

/// Everything a synthesizer knows about where a log statement sits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub indent: usize,
    pub parent_path: Vec<String>,
    pub filename: String,
    pub filepath: String,
    pub has_start_message: bool,
    pub is_start_message: bool,
    pub line: usize,
}

impl Metadata {
    /// Flattened parent path, matched against `TRACE_CONTEXT` entries.
    pub fn context(&self) -> String {
        self.parent_path.join(":")
    }
}

/// File name as given to the pipeline plus its absolute form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub filename: String,
    pub filepath: String,
}

impl FileInfo {
    /// Resolves `filename` against the process working directory.
    pub fn resolve(filename: &str) -> Result<Self, MetalogError> {
        let cwd = std::env::current_dir().map_err(|e| {
            err_msg!(
                Resolution,
                "cannot resolve absolute path of '{}': {}",
                filename,
                e
            )
            .with_cause(e)
        })?;
        Ok(Self::resolve_in(filename, &cwd))
    }

    /// Resolves `filename` against an explicit base directory.
    pub fn resolve_in(filename: &str, base: &Path) -> Self {
        let joined = base.join(filename);
        Self {
            filename: filename.to_string(),
            filepath: normalize_path(&joined).to_string_lossy().into_owned(),
        }
    }
}

/// Lexically removes `.` and `..` components.
fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

// ============================================================================
// COLLECTION
// ============================================================================

/// Computes the metadata of the labeled statement `label`.
///
/// `handled` holds statements produced by earlier rewrites in this pass; they
/// count as log statements when detecting the start of a run.
pub fn collect(
    tree: &Tree,
    label: NodeId,
    file: &FileInfo,
    aliases: &AliasTable,
    handled: &HashSet<NodeId>,
) -> Metadata {
    let mut indent = 0;
    let mut parent_path: Vec<String> = Vec::new();
    let mut parent: Option<NodeId> = None;

    for ancestor in tree.ancestors(label) {
        match tree.kind(ancestor) {
            NodeKind::Method { key, .. } => {
                parent_path.insert(0, method_name(key));
                parent.get_or_insert(ancestor);
            }
            NodeKind::Class {
                name,
                is_declaration: true,
                ..
            } => {
                let name = name
                    .clone()
                    .unwrap_or_else(|| format!("<anonymous class:{}>", tree.line_of(ancestor)));
                parent_path.insert(0, name);
                parent.get_or_insert(ancestor);
            }
            NodeKind::Function { name, .. } => {
                let name = name
                    .clone()
                    .unwrap_or_else(|| format!("<anonymous function:{}>", tree.line_of(ancestor)));
                parent_path.insert(0, name);
                parent.get_or_insert(ancestor);
            }
            NodeKind::Program { .. } => {
                parent.get_or_insert(ancestor);
            }
            NodeKind::ClassBody { .. } | NodeKind::Block { .. } => {}
            _ => {
                if parent.is_none() {
                    indent += 1;
                }
            }
        }
    }

    let (has_start_message, is_start_message) = match parent {
        Some(scope) if !tree.is_program(scope) => start_flags(tree, scope, label, aliases, handled),
        _ => (false, false),
    };

    let metadata = Metadata {
        indent,
        parent_path,
        filename: file.filename.clone(),
        filepath: file.filepath.clone(),
        has_start_message,
        is_start_message,
        line: tree.line_of(label),
    };
    tracing::trace!(?metadata, "collected call-site metadata");
    metadata
}

fn method_name(key: &Key) -> String {
    match key {
        Key::Named(name) | Key::Str(name) => name.clone(),
        Key::Computed(_) => "<computed method>".to_string(),
    }
}

/// Scans the top of `scope` for a run of log statements.
/// Returns `(has_start_message, is_start_message)`.
fn start_flags(
    tree: &Tree,
    scope: NodeId,
    label: NodeId,
    aliases: &AliasTable,
    handled: &HashSet<NodeId>,
) -> (bool, bool) {
    for &statement in tree.statements(scope) {
        if statement == label {
            return (false, true);
        }
        if handled.contains(&statement) {
            return (true, false);
        }
        match tree.kind(statement) {
            NodeKind::Labeled { label: name, .. } if aliases.contains(name) => {
                return (true, false)
            }
            NodeKind::Labeled { .. } => continue,
            _ => break,
        }
    }
    (false, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{parse, SourceContext};

    fn find_label(tree: &Tree, name: &str, nth: usize) -> NodeId {
        let mut found = Vec::new();
        let mut pending = vec![tree.root()];
        while let Some(id) = pending.pop() {
            if let NodeKind::Labeled { label, .. } = tree.kind(id) {
                if label == name {
                    found.push(id);
                }
            }
            pending.extend(tree.kind(id).children().into_iter().rev());
        }
        found[nth]
    }

    fn collect_for(source: &str, label: &str, nth: usize) -> Metadata {
        let tree = parse(&SourceContext::from_file("a.js", source)).unwrap();
        let id = find_label(&tree, label, nth);
        let file = FileInfo::resolve_in("a.js", Path::new("/work"));
        collect(&tree, id, &file, &AliasTable::defaults(), &HashSet::new())
    }

    #[test]
    fn resolves_file_path_lexically() {
        let file = FileInfo::resolve_in("./src/../a.js", Path::new("/work/app"));
        assert_eq!(file.filename, "./src/../a.js");
        assert_eq!(file.filepath, "/work/app/a.js");
    }

    #[test]
    fn parent_path_is_outermost_first() {
        let meta = collect_for(
            "class Shop {\n  buy(item) {\n    function check() {\n      debug: item;\n    }\n  }\n}\n",
            "debug",
            0,
        );
        assert_eq!(meta.parent_path, vec!["Shop", "buy", "check"]);
        assert_eq!(meta.line, 4);
        assert_eq!(meta.context(), "Shop:buy:check");
    }

    #[test]
    fn anonymous_scopes_get_line_placeholders() {
        let meta = collect_for("const f = function () {\n  return () => {\n    info: 1;\n  };\n};\n", "info", 0);
        assert_eq!(
            meta.parent_path,
            vec!["<anonymous function:1>", "<anonymous function:2>"]
        );
    }

    #[test]
    fn indent_counts_nesting_below_nearest_scope() {
        let meta = collect_for(
            "function f() {\n  if (a) {\n    while (b) {\n      warn: a;\n    }\n  }\n}\n",
            "warn",
            0,
        );
        assert_eq!(meta.indent, 2);
        assert_eq!(meta.parent_path, vec!["f"]);
    }

    #[test]
    fn top_level_labels_have_no_start_flags() {
        let meta = collect_for("debug: a;\n", "debug", 0);
        assert!(meta.parent_path.is_empty());
        assert!(!meta.has_start_message);
        assert!(!meta.is_start_message);
    }

    #[test]
    fn first_label_of_a_run_is_the_start() {
        let source = "function f() {\n  debug: a;\n  debug: b;\n  g();\n  debug: c;\n}\n";
        let first = collect_for(source, "debug", 0);
        assert!(first.is_start_message);
        assert!(!first.has_start_message);

        let second = collect_for(source, "debug", 1);
        assert!(second.has_start_message);
        assert!(!second.is_start_message);

        // The scope still opens with a log run, so a later label reports it.
        let after_code = collect_for(source, "debug", 2);
        assert!(after_code.has_start_message);
        assert!(!after_code.is_start_message);
    }

    #[test]
    fn unknown_labels_do_not_break_a_run() {
        let meta = collect_for("function f() {\n  outer: x;\n  info: y;\n}\n", "info", 0);
        assert!(meta.is_start_message);
    }
}
