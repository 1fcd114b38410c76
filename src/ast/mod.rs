//! Program tree for the JavaScript subset the rewriter understands.
//!
//! Nodes live in an arena ([`Tree`]) and are addressed by copyable
//! [`NodeId`]s. Every node records its parent, so ancestry walks are cheap and
//! replacement can splice nodes into the enclosing statement list without
//! re-traversing from the root. Replaced nodes stay in the arena, detached;
//! only nodes reachable from [`Tree::root`] are part of the program.

use serde::{Deserialize, Serialize};

use crate::{err_msg, MetalogError};

pub mod builder;

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// Byte range of a node in its source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Stable identity of a node inside a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

impl VarKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VarKind::Var => "var",
            VarKind::Let => "let",
            VarKind::Const => "const",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionForm {
    Declaration,
    Expression,
    Arrow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodKind {
    Method,
    Constructor,
    Getter,
    Setter,
}

/// Name of a member, method or object property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Key {
    /// Identifier or numeric key, printed verbatim.
    Named(String),
    /// Quoted string key.
    Str(String),
    /// `[expr]`
    Computed(NodeId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    // --- statements ---
    Program {
        body: Vec<NodeId>,
    },
    Block {
        body: Vec<NodeId>,
    },
    Empty,
    /// Expression statement.
    Expression {
        expr: NodeId,
    },
    Labeled {
        label: String,
        body: NodeId,
    },
    VarDecl {
        kind: VarKind,
        declarators: Vec<NodeId>,
    },
    Declarator {
        name: String,
        init: Option<NodeId>,
    },
    Return {
        argument: Option<NodeId>,
    },
    Throw {
        argument: NodeId,
    },
    If {
        test: NodeId,
        consequent: NodeId,
        alternate: Option<NodeId>,
    },
    While {
        test: NodeId,
        body: NodeId,
    },
    Break {
        label: Option<String>,
    },
    Continue {
        label: Option<String>,
    },

    // --- functions and classes ---
    /// Function declaration, function expression or arrow function. An arrow
    /// with an expression body has a non-block `body`.
    Function {
        name: Option<String>,
        params: Vec<String>,
        body: NodeId,
        form: FunctionForm,
        is_async: bool,
        is_generator: bool,
    },
    Class {
        name: Option<String>,
        superclass: Option<NodeId>,
        body: NodeId,
        is_declaration: bool,
    },
    ClassBody {
        members: Vec<NodeId>,
    },
    Method {
        key: Key,
        kind: MethodKind,
        is_static: bool,
        is_async: bool,
        is_generator: bool,
        params: Vec<String>,
        body: NodeId,
    },

    // --- expressions ---
    Ident(String),
    This,
    /// Numeric literal, raw source text.
    Number(String),
    Str(String),
    /// String literal with no UTF-8 value (a lone surrogate escape), kept as written.
    RawStr(String),
    Bool(bool),
    Null,
    Array {
        elements: Vec<NodeId>,
    },
    Object {
        properties: Vec<NodeId>,
    },
    Property {
        key: Key,
        value: NodeId,
        shorthand: bool,
    },
    Call {
        callee: NodeId,
        arguments: Vec<NodeId>,
    },
    New {
        callee: NodeId,
        arguments: Vec<NodeId>,
    },
    Member {
        object: NodeId,
        property: Key,
    },
    Unary {
        operator: String,
        argument: NodeId,
    },
    Binary {
        operator: String,
        left: NodeId,
        right: NodeId,
    },
    Conditional {
        test: NodeId,
        consequent: NodeId,
        alternate: NodeId,
    },
    Assign {
        operator: String,
        target: NodeId,
        value: NodeId,
    },
    Update {
        operator: String,
        prefix: bool,
        argument: NodeId,
    },
    Sequence {
        expressions: Vec<NodeId>,
    },
    Yield {
        argument: Option<NodeId>,
        delegate: bool,
    },
    /// `%%name%%` slot, only meaningful inside compiled templates.
    Placeholder(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    parent: Option<NodeId>,
}

/// Arena holding one parsed program (or template).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
    #[serde(skip)]
    line_starts: Vec<usize>,
}

// ============================================================================
// NODE KIND HELPERS
// ============================================================================

impl NodeKind {
    /// Direct children in source order.
    pub fn children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        match self {
            NodeKind::Program { body } | NodeKind::Block { body } => out.extend(body),
            NodeKind::Expression { expr } => out.push(*expr),
            NodeKind::Labeled { body, .. } => out.push(*body),
            NodeKind::VarDecl { declarators, .. } => out.extend(declarators),
            NodeKind::Declarator { init, .. } => out.extend(init),
            NodeKind::Return { argument } => out.extend(argument),
            NodeKind::Throw { argument } => out.push(*argument),
            NodeKind::If {
                test,
                consequent,
                alternate,
            } => {
                out.push(*test);
                out.push(*consequent);
                out.extend(alternate);
            }
            NodeKind::While { test, body } => {
                out.push(*test);
                out.push(*body);
            }
            NodeKind::Function { body, .. } => out.push(*body),
            NodeKind::Class {
                superclass, body, ..
            } => {
                out.extend(superclass);
                out.push(*body);
            }
            NodeKind::ClassBody { members } => out.extend(members),
            NodeKind::Method { key, body, .. } => {
                if let Key::Computed(id) = key {
                    out.push(*id);
                }
                out.push(*body);
            }
            NodeKind::Array { elements } => out.extend(elements),
            NodeKind::Object { properties } => out.extend(properties),
            NodeKind::Property { key, value, .. } => {
                if let Key::Computed(id) = key {
                    out.push(*id);
                }
                out.push(*value);
            }
            NodeKind::Call { callee, arguments } | NodeKind::New { callee, arguments } => {
                out.push(*callee);
                out.extend(arguments);
            }
            NodeKind::Member { object, property } => {
                out.push(*object);
                if let Key::Computed(id) = property {
                    out.push(*id);
                }
            }
            NodeKind::Unary { argument, .. } | NodeKind::Update { argument, .. } => {
                out.push(*argument)
            }
            NodeKind::Binary { left, right, .. } => {
                out.push(*left);
                out.push(*right);
            }
            NodeKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                out.push(*test);
                out.push(*consequent);
                out.push(*alternate);
            }
            NodeKind::Assign { target, value, .. } => {
                out.push(*target);
                out.push(*value);
            }
            NodeKind::Sequence { expressions } => out.extend(expressions),
            NodeKind::Yield { argument, .. } => out.extend(argument),
            NodeKind::Empty
            | NodeKind::Break { .. }
            | NodeKind::Continue { .. }
            | NodeKind::Ident(_)
            | NodeKind::This
            | NodeKind::Number(_)
            | NodeKind::Str(_)
            | NodeKind::RawStr(_)
            | NodeKind::Bool(_)
            | NodeKind::Null
            | NodeKind::Placeholder(_) => {}
        }
        out
    }

    /// Mutable references to every child slot, in source order.
    fn child_slots_mut(&mut self) -> Vec<&mut NodeId> {
        let mut out: Vec<&mut NodeId> = Vec::new();
        match self {
            NodeKind::Program { body } | NodeKind::Block { body } => out.extend(body.iter_mut()),
            NodeKind::Expression { expr } => out.push(expr),
            NodeKind::Labeled { body, .. } => out.push(body),
            NodeKind::VarDecl { declarators, .. } => out.extend(declarators.iter_mut()),
            NodeKind::Declarator { init, .. } => out.extend(init.as_mut()),
            NodeKind::Return { argument } => out.extend(argument.as_mut()),
            NodeKind::Throw { argument } => out.push(argument),
            NodeKind::If {
                test,
                consequent,
                alternate,
            } => {
                out.push(test);
                out.push(consequent);
                out.extend(alternate.as_mut());
            }
            NodeKind::While { test, body } => {
                out.push(test);
                out.push(body);
            }
            NodeKind::Function { body, .. } => out.push(body),
            NodeKind::Class {
                superclass, body, ..
            } => {
                out.extend(superclass.as_mut());
                out.push(body);
            }
            NodeKind::ClassBody { members } => out.extend(members.iter_mut()),
            NodeKind::Method { key, body, .. } => {
                if let Key::Computed(id) = key {
                    out.push(id);
                }
                out.push(body);
            }
            NodeKind::Array { elements } => out.extend(elements.iter_mut()),
            NodeKind::Object { properties } => out.extend(properties.iter_mut()),
            NodeKind::Property { key, value, .. } => {
                if let Key::Computed(id) = key {
                    out.push(id);
                }
                out.push(value);
            }
            NodeKind::Call { callee, arguments } | NodeKind::New { callee, arguments } => {
                out.push(callee);
                out.extend(arguments.iter_mut());
            }
            NodeKind::Member { object, property } => {
                out.push(object);
                if let Key::Computed(id) = property {
                    out.push(id);
                }
            }
            NodeKind::Unary { argument, .. } | NodeKind::Update { argument, .. } => {
                out.push(argument)
            }
            NodeKind::Binary { left, right, .. } => {
                out.push(left);
                out.push(right);
            }
            NodeKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                out.push(test);
                out.push(consequent);
                out.push(alternate);
            }
            NodeKind::Assign { target, value, .. } => {
                out.push(target);
                out.push(value);
            }
            NodeKind::Sequence { expressions } => out.extend(expressions.iter_mut()),
            NodeKind::Yield { argument, .. } => out.extend(argument.as_mut()),
            NodeKind::Empty
            | NodeKind::Break { .. }
            | NodeKind::Continue { .. }
            | NodeKind::Ident(_)
            | NodeKind::This
            | NodeKind::Number(_)
            | NodeKind::Str(_)
            | NodeKind::RawStr(_)
            | NodeKind::Bool(_)
            | NodeKind::Null
            | NodeKind::Placeholder(_) => {}
        }
        out
    }

    /// Returns a copy of this kind with every child id passed through `f`.
    pub fn map_children(&self, f: &mut dyn FnMut(NodeId) -> NodeId) -> NodeKind {
        let mut copy = self.clone();
        for slot in copy.child_slots_mut() {
            *slot = f(*slot);
        }
        copy
    }

    /// True for node kinds that may appear in a statement position.
    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            NodeKind::Block { .. }
                | NodeKind::Empty
                | NodeKind::Expression { .. }
                | NodeKind::Labeled { .. }
                | NodeKind::VarDecl { .. }
                | NodeKind::Return { .. }
                | NodeKind::Throw { .. }
                | NodeKind::If { .. }
                | NodeKind::While { .. }
                | NodeKind::Break { .. }
                | NodeKind::Continue { .. }
                | NodeKind::Function {
                    form: FunctionForm::Declaration,
                    ..
                }
                | NodeKind::Class {
                    is_declaration: true,
                    ..
                }
        )
    }
}

// ============================================================================
// TREE: CONSTRUCTION AND NAVIGATION
// ============================================================================

impl Tree {
    /// Creates a tree whose root is an empty program. `source` is used only to
    /// index line starts for [`Tree::line_of`].
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        let root_node = Node {
            kind: NodeKind::Program { body: Vec::new() },
            span: Span {
                start: 0,
                end: source.len(),
            },
            parent: None,
        };
        Self {
            nodes: vec![root_node],
            root: NodeId(0),
            line_starts,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocates a detached node; children listed in `kind` are re-parented.
    pub fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len());
        for child in kind.children() {
            self.nodes[child.0].parent = Some(id);
        }
        self.nodes.push(Node {
            kind,
            span,
            parent: None,
        });
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.0].span
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Replaces the kind of a node in place, re-parenting its new children.
    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        for child in kind.children() {
            self.nodes[child.0].parent = Some(id);
        }
        self.nodes[id.0].kind = kind;
    }

    /// Sets the program body of the root node.
    pub fn set_program_body(&mut self, body: Vec<NodeId>) {
        let root = self.root;
        self.set_kind(root, NodeKind::Program { body });
    }

    /// Ancestors of `id` from the nearest outward, excluding `id` itself.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// 1-based source line of the given byte offset.
    pub fn line_of_offset(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(index) => index + 1,
            Err(index) => index.max(1),
        }
    }

    /// 1-based line where the node starts.
    pub fn line_of(&self, id: NodeId) -> usize {
        self.line_of_offset(self.span(id).start)
    }

    // ------------------------------------------------------------------------
    // Kind predicates
    // ------------------------------------------------------------------------

    pub fn is_program(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Program { .. })
    }

    pub fn is_block(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Block { .. })
    }

    pub fn is_function(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Function { .. })
    }

    pub fn is_class(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Class { .. })
    }

    pub fn is_class_body(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::ClassBody { .. })
    }

    pub fn is_class_method(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Method { .. })
    }

    pub fn is_labeled(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Labeled { .. })
    }

    /// Direct statement list of a scope: the program body, a block's body, or
    /// the body block of a function or method. Empty for anything else.
    pub fn statements(&self, scope: NodeId) -> &[NodeId] {
        match self.kind(scope) {
            NodeKind::Program { body } | NodeKind::Block { body } => body,
            NodeKind::Function { body, .. } | NodeKind::Method { body, .. } => {
                match self.kind(*body) {
                    NodeKind::Block { body } => body,
                    _ => &[],
                }
            }
            _ => &[],
        }
    }

    // ------------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------------

    /// Replaces `target` with `replacements`. In a program or block body the
    /// replacements are spliced in order; in a single-statement slot they are
    /// wrapped in a block (or become an empty statement when there are none).
    pub fn replace_with_many(
        &mut self,
        target: NodeId,
        replacements: Vec<NodeId>,
    ) -> Result<(), MetalogError> {
        let parent = self
            .parent(target)
            .ok_or_else(|| err_msg!(Internal, "node {} has no parent", target.0))?;

        let spliced = match &mut self.nodes[parent.0].kind {
            NodeKind::Program { body } | NodeKind::Block { body } => {
                match body.iter().position(|&child| child == target) {
                    Some(pos) => {
                        body.splice(pos..=pos, replacements.iter().copied());
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        };

        if spliced {
            for id in replacements {
                self.nodes[id.0].parent = Some(parent);
            }
        } else {
            let span = self.span(target);
            let replacement = match replacements.len() {
                0 => self.alloc(NodeKind::Empty, span),
                1 => replacements[0],
                _ => self.alloc(NodeKind::Block { body: replacements }, span),
            };
            self.replace_slot(parent, target, replacement)?;
        }
        self.nodes[target.0].parent = None;
        Ok(())
    }

    /// Replaces `target` with a single node.
    pub fn replace(&mut self, target: NodeId, replacement: NodeId) -> Result<(), MetalogError> {
        self.replace_with_many(target, vec![replacement])
    }

    /// Removes `target` from its enclosing statement list.
    pub fn remove(&mut self, target: NodeId) -> Result<(), MetalogError> {
        self.replace_with_many(target, Vec::new())
    }

    fn replace_slot(
        &mut self,
        parent: NodeId,
        target: NodeId,
        replacement: NodeId,
    ) -> Result<(), MetalogError> {
        let mut found = false;
        for slot in self.nodes[parent.0].kind.child_slots_mut() {
            if *slot == target {
                *slot = replacement;
                found = true;
            }
        }
        if !found {
            return Err(err_msg!(
                Internal,
                "node {} is not a child of node {}",
                target.0,
                parent.0
            ));
        }
        self.nodes[replacement.0].parent = Some(parent);
        Ok(())
    }

    /// Deep-copies a subtree; the copy is detached.
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let span = self.span(id);
        let kind = self.kind(id).clone();
        let copied = kind.map_children(&mut |child| self.clone_subtree(child));
        self.alloc(copied, span)
    }
}

/// Iterator returned by [`Tree::ancestors`].
pub struct Ancestors<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}
