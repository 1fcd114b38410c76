//! Alias template compiler.
//!
//! A template is a one-statement JavaScript snippet with three named slots:
//! `%%logFunction%%`, `%%content%%` and `%%metadata%%`. It is parsed and
//! validated once by [`compile`]; each call site then instantiates a deep copy
//! of it into the program tree with the slots filled in.
//!
//! `%%content%%` is a list: inside a call's argument list or an array literal
//! its entries are spliced in place; anywhere else it becomes an array literal.
//!
//! ```rust
//! use metalog::templates::compile;
//!
//! let template = compile("loud", "%%logFunction%%.loud(%%content%%);").unwrap();
//! assert_eq!(template.alias(), "loud");
//! ```

use std::collections::HashSet;

use crate::ast::builder::{make_array, make_ident};
use crate::ast::{NodeId, NodeKind, Span, Tree};
use crate::syntax::{parse_with_mode, ParseMode, SourceContext};
use crate::{err_ctx, MetalogError};

pub const LOG_FUNCTION_SLOT: &str = "logFunction";
pub const CONTENT_SLOT: &str = "content";
pub const METADATA_SLOT: &str = "metadata";

/// The three template slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    LogFunction,
    Content,
    Metadata,
}

impl Slot {
    pub fn from_name(name: &str) -> Option<Slot> {
        match name {
            LOG_FUNCTION_SLOT => Some(Slot::LogFunction),
            CONTENT_SLOT => Some(Slot::Content),
            METADATA_SLOT => Some(Slot::Metadata),
            _ => None,
        }
    }
}

/// A parsed and validated alias template.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    alias: String,
    source: String,
    tree: Tree,
    statement: NodeId,
}

/// Values for the slots of one instantiation. The nodes must already live in
/// the target tree.
#[derive(Debug, Clone)]
pub struct Bindings {
    pub log_function: String,
    pub content: Vec<NodeId>,
    pub metadata: NodeId,
}

// ============================================================================
// COMPILATION
// ============================================================================

/// Parses `source` as the template for alias `alias`.
pub fn compile(alias: &str, source: &str) -> Result<CompiledTemplate, MetalogError> {
    let context = SourceContext::for_template(alias, source);
    let named = context.to_named_source();
    let tree = parse_with_mode(&context, ParseMode::Template)?;

    let statements: Vec<NodeId> = tree
        .statements(tree.root())
        .iter()
        .copied()
        .filter(|&id| !matches!(tree.kind(id), NodeKind::Empty))
        .collect();
    let whole = Span {
        start: 0,
        end: source.len(),
    };
    let statement = match statements.as_slice() {
        [single] => *single,
        [] => {
            return Err(err_ctx!(
                Config,
                format!("template for alias '{}' is empty", alias),
                &named,
                whole
            ))
        }
        _ => {
            return Err(err_ctx!(
                Config,
                format!(
                    "template for alias '{}' must be a single statement, found {}",
                    alias,
                    statements.len()
                ),
                &named,
                whole
            ))
        }
    };

    let mut pending = vec![statement];
    while let Some(id) = pending.pop() {
        if let NodeKind::Placeholder(name) = tree.kind(id) {
            if Slot::from_name(name).is_none() {
                return Err(err_ctx!(
                    Config,
                    format!("unknown template placeholder '%%{}%%'", name),
                    &named,
                    tree.span(id),
                    "available placeholders are %%logFunction%%, %%content%% and %%metadata%%"
                ));
            }
        }
        pending.extend(tree.kind(id).children());
    }

    tracing::trace!(alias, template = source, "compiled alias template");
    Ok(CompiledTemplate {
        alias: alias.to_string(),
        source: source.to_string(),
        tree,
        statement,
    })
}

impl CompiledTemplate {
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The template's single expression, when it is an expression statement.
    fn expression(&self) -> Option<NodeId> {
        match self.tree.kind(self.statement) {
            NodeKind::Expression { expr } => Some(*expr),
            _ => None,
        }
    }

    /// Copies the statement form into `target`.
    pub fn instantiate_statement(&self, target: &mut Tree, bindings: &Bindings, span: Span) -> NodeId {
        Instantiation::new(self, target, bindings, span).copy(self.statement)
    }

    /// Copies the expression form into `target`: the bare expression when the
    /// template is an expression statement, the statement otherwise.
    pub fn instantiate(&self, target: &mut Tree, bindings: &Bindings, span: Span) -> NodeId {
        let root = self.expression().unwrap_or(self.statement);
        Instantiation::new(self, target, bindings, span).copy(root)
    }
}

// ============================================================================
// INSTANTIATION
// ============================================================================

struct Instantiation<'a> {
    template: &'a Tree,
    target: &'a mut Tree,
    bindings: &'a Bindings,
    span: Span,
    /// Bound nodes already attached once; further uses get copies.
    used: HashSet<NodeId>,
}

impl<'a> Instantiation<'a> {
    fn new(
        template: &'a CompiledTemplate,
        target: &'a mut Tree,
        bindings: &'a Bindings,
        span: Span,
    ) -> Self {
        Self {
            template: &template.tree,
            target,
            bindings,
            span,
            used: HashSet::new(),
        }
    }

    fn copy(&mut self, id: NodeId) -> NodeId {
        let kind = self.template.kind(id).clone();
        let copied = match kind {
            NodeKind::Placeholder(name) => return self.bind_single(&name),
            NodeKind::Call { callee, arguments } => NodeKind::Call {
                callee: self.copy(callee),
                arguments: self.copy_list(&arguments),
            },
            NodeKind::New { callee, arguments } => NodeKind::New {
                callee: self.copy(callee),
                arguments: self.copy_list(&arguments),
            },
            NodeKind::Array { elements } => NodeKind::Array {
                elements: self.copy_list(&elements),
            },
            other => other.map_children(&mut |child| self.copy(child)),
        };
        self.target.alloc(copied, self.span)
    }

    /// Copies a list of expressions, splicing `%%content%%` entries in place.
    fn copy_list(&mut self, items: &[NodeId]) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(items.len());
        for &item in items {
            let is_content = matches!(
                self.template.kind(item),
                NodeKind::Placeholder(name) if Slot::from_name(name) == Some(Slot::Content)
            );
            if is_content {
                for node in self.bindings.content.clone() {
                    let node = self.take(node);
                    out.push(node);
                }
            } else {
                out.push(self.copy(item));
            }
        }
        out
    }

    fn bind_single(&mut self, name: &str) -> NodeId {
        match Slot::from_name(name) {
            Some(Slot::LogFunction) => {
                let name = self.bindings.log_function.clone();
                make_ident(self.target, &name, self.span)
            }
            Some(Slot::Metadata) => self.take(self.bindings.metadata),
            Some(Slot::Content) => {
                let mut elements = Vec::new();
                for node in self.bindings.content.clone() {
                    elements.push(self.take(node));
                }
                make_array(self.target, elements, self.span)
            }
            // Rejected by `compile`.
            None => make_ident(self.target, name, self.span),
        }
    }

    /// Uses a bound node the first time, a deep copy on every later use.
    fn take(&mut self, node: NodeId) -> NodeId {
        if self.used.insert(node) {
            node
        } else {
            self.target.clone_subtree(node)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builder::make_number;
    use crate::diagnostics::ErrorType;
    use crate::syntax::printer::print_node;

    fn bindings(tree: &mut Tree, content: &[usize]) -> Bindings {
        let content = content
            .iter()
            .map(|&n| make_number(tree, n, Span::default()))
            .collect();
        let metadata = make_ident(tree, "meta", Span::default());
        Bindings {
            log_function: "LOG".to_string(),
            content,
            metadata,
        }
    }

    #[test]
    fn content_splices_into_call_arguments() {
        let template = compile("loud", "%%logFunction%%.loud(%%content%%, %%metadata%%);").unwrap();
        let mut tree = Tree::new("");
        let b = bindings(&mut tree, &[1, 2]);
        let node = template.instantiate(&mut tree, &b, Span::default());
        assert_eq!(print_node(&tree, node), "LOG.loud(1, 2, meta)");
    }

    #[test]
    fn content_outside_a_list_becomes_an_array() {
        let template = compile("x", "%%logFunction%%({ items: %%content%% });").unwrap();
        let mut tree = Tree::new("");
        let b = bindings(&mut tree, &[3]);
        let node = template.instantiate(&mut tree, &b, Span::default());
        assert_eq!(print_node(&tree, node), "LOG({ items: [3] })");
    }

    #[test]
    fn repeated_slots_get_fresh_copies() {
        let template = compile("twice", "%%logFunction%%(%%metadata%%, %%metadata%%);").unwrap();
        let mut tree = Tree::new("");
        let b = bindings(&mut tree, &[]);
        let node = template.instantiate(&mut tree, &b, Span::default());
        let NodeKind::Call { arguments, .. } = tree.kind(node).clone() else {
            panic!("expected a call");
        };
        assert_eq!(arguments.len(), 2);
        assert_ne!(arguments[0], arguments[1]);
        assert_eq!(arguments[0], b.metadata);
    }

    #[test]
    fn unknown_placeholder_is_a_config_error() {
        let err = compile("bad", "%%logFunction%%(%%nope%%);").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
        assert!(err.message().contains("%%nope%%"));
    }

    #[test]
    fn empty_and_multi_statement_templates_are_rejected() {
        assert_eq!(compile("e", "  ").unwrap_err().error_type(), ErrorType::Config);
        let err = compile("m", "a(); b();").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
        assert!(err.message().contains("single statement"));
    }

    #[test]
    fn statement_form_keeps_non_expression_templates() {
        let template = compile("cond", "if (%%logFunction%%) %%logFunction%%(%%content%%);").unwrap();
        let mut tree = Tree::new("");
        let b = bindings(&mut tree, &[7]);
        let node = template.instantiate(&mut tree, &b, Span::default());
        assert!(matches!(tree.kind(node), NodeKind::If { .. }));
    }
}
