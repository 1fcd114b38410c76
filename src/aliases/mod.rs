//! Alias table: label name to message synthesizer.
//!
//! Built-in aliases cover five levels in three variants each (`debug`,
//! `debugValues`, `debugRefs`, ...). User aliases are compiled alias
//! templates or native functions registered through
//! [`crate::options::Options::with_alias_fn`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::ast::builder::{
    make_array, make_bool, make_call, make_ident, make_number, make_object, make_string,
    make_string_array,
};
use crate::ast::{NodeId, Span, Tree};
use crate::templates::{Bindings, CompiledTemplate};
use crate::transform::metadata::Metadata;
use crate::MetalogError;

// ============================================================================
// LEVELS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Level {
    pub const ALL: [Level; 5] = [
        Level::Error,
        Level::Warn,
        Level::Info,
        Level::Debug,
        Level::Trace,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Debug => "debug",
            Level::Trace => "trace",
        }
    }

    pub fn from_name(name: &str) -> Option<Level> {
        Level::ALL.into_iter().find(|level| level.as_str() == name)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SYNTHESIZERS
// ============================================================================

/// What a synthesizer receives for one logged expression.
#[derive(Debug)]
pub struct SynthInput<'a> {
    pub log_function: &'a str,
    /// The logged expressions; a comma sequence contributes one entry per item.
    pub content: Vec<NodeId>,
    pub metadata: &'a Metadata,
    /// Span of the statement being replaced.
    pub span: Span,
}

/// Native synthesizer. Returns a detached expression (or statement) node.
pub type SynthFn = fn(&mut Tree, SynthInput<'_>) -> Result<NodeId, MetalogError>;

#[derive(Clone)]
pub enum Synthesizer {
    /// One of the fifteen default aliases. `values` is false for `*Refs`.
    Builtin { level: Level, values: bool },
    Template(Arc<CompiledTemplate>),
    Custom(SynthFn),
}

impl fmt::Debug for Synthesizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Synthesizer::Builtin { level, values } => f
                .debug_struct("Builtin")
                .field("level", level)
                .field("values", values)
                .finish(),
            Synthesizer::Template(template) => {
                f.debug_tuple("Template").field(&template.source()).finish()
            }
            Synthesizer::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl Synthesizer {
    /// The built-in synthesizer for `name`, if `name` is a default alias.
    pub fn builtin(name: &str) -> Option<Synthesizer> {
        let (base, values) = if let Some(base) = name.strip_suffix("Values") {
            (base, true)
        } else if let Some(base) = name.strip_suffix("Refs") {
            (base, false)
        } else {
            (name, true)
        };
        Level::from_name(base).map(|level| Synthesizer::Builtin { level, values })
    }

    pub fn synthesize(&self, tree: &mut Tree, input: SynthInput<'_>) -> Result<NodeId, MetalogError> {
        match self {
            Synthesizer::Builtin { level, values } => Ok(builtin_call(tree, *level, *values, input)),
            Synthesizer::Template(template) => {
                let metadata = metadata_object(tree, input.metadata, input.span);
                let bindings = Bindings {
                    log_function: input.log_function.to_string(),
                    content: input.content,
                    metadata,
                };
                Ok(template.instantiate(tree, &bindings, input.span))
            }
            Synthesizer::Custom(synth) => synth(tree, input),
        }
    }

    /// Short human-readable description, used by `metalog aliases`.
    pub fn describe(&self) -> String {
        match self {
            Synthesizer::Builtin { level, values } => {
                format!("builtin level={} values={}", level, values)
            }
            Synthesizer::Template(template) => format!("template {}", template.source()),
            Synthesizer::Custom(_) => "native function".to_string(),
        }
    }
}

/// `logFunction({ values, level, filename, filepath, content, line, parentPath })`
fn builtin_call(tree: &mut Tree, level: Level, values: bool, input: SynthInput<'_>) -> NodeId {
    let span = input.span;
    let meta = input.metadata;
    let values = make_bool(tree, values, span);
    let level = make_string(tree, level.as_str(), span);
    let filename = make_string(tree, &meta.filename, span);
    let filepath = make_string(tree, &meta.filepath, span);
    let content = make_array(tree, input.content, span);
    let line = make_number(tree, meta.line, span);
    let parent_path = make_string_array(tree, &meta.parent_path, span);
    let argument = make_object(
        tree,
        vec![
            ("values", values),
            ("level", level),
            ("filename", filename),
            ("filepath", filepath),
            ("content", content),
            ("line", line),
            ("parentPath", parent_path),
        ],
        span,
    );
    let callee = make_ident(tree, input.log_function, span);
    make_call(tree, callee, vec![argument], span)
}

/// The `%%metadata%%` binding for alias templates.
pub fn metadata_object(tree: &mut Tree, meta: &Metadata, span: Span) -> NodeId {
    let indent = make_number(tree, meta.indent, span);
    let parent_path = make_string_array(tree, &meta.parent_path, span);
    let filename = make_string(tree, &meta.filename, span);
    let filepath = make_string(tree, &meta.filepath, span);
    let has_start = make_bool(tree, meta.has_start_message, span);
    let is_start = make_bool(tree, meta.is_start_message, span);
    let line = make_number(tree, meta.line, span);
    make_object(
        tree,
        vec![
            ("indent", indent),
            ("parentPath", parent_path),
            ("filename", filename),
            ("filepath", filepath),
            ("hasStartMessage", has_start),
            ("isStartMessage", is_start),
            ("line", line),
        ],
        span,
    )
}

// ============================================================================
// TABLE
// ============================================================================

/// Label name to synthesizer, ordered by name.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: BTreeMap<String, Synthesizer>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The fifteen built-in aliases.
    pub fn defaults() -> Self {
        let mut table = Self::new();
        for level in Level::ALL {
            let name = level.as_str();
            table.insert(name, Synthesizer::Builtin { level, values: true });
            table.insert(format!("{}Values", name), Synthesizer::Builtin { level, values: true });
            table.insert(format!("{}Refs", name), Synthesizer::Builtin { level, values: false });
        }
        table
    }

    pub fn insert(&mut self, name: impl Into<String>, synthesizer: Synthesizer) {
        self.entries.insert(name.into(), synthesizer);
    }

    pub fn get(&self, name: &str) -> Option<&Synthesizer> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Synthesizer)> {
        self.entries.iter().map(|(name, synth)| (name.as_str(), synth))
    }
}
