//! Constructors for synthesized nodes.
//!
//! Used by the parser and by alias synthesizers. Every constructor allocates
//! a detached node; attach it with [`Tree::replace`] or by passing it as a
//! child of another constructor.

use super::{Key, NodeId, NodeKind, Span, Tree};

pub fn make_ident(tree: &mut Tree, name: &str, span: Span) -> NodeId {
    tree.alloc(NodeKind::Ident(name.to_string()), span)
}

pub fn make_string(tree: &mut Tree, value: &str, span: Span) -> NodeId {
    tree.alloc(NodeKind::Str(value.to_string()), span)
}

pub fn make_number(tree: &mut Tree, value: usize, span: Span) -> NodeId {
    tree.alloc(NodeKind::Number(value.to_string()), span)
}

pub fn make_bool(tree: &mut Tree, value: bool, span: Span) -> NodeId {
    tree.alloc(NodeKind::Bool(value), span)
}

pub fn make_array(tree: &mut Tree, elements: Vec<NodeId>, span: Span) -> NodeId {
    tree.alloc(NodeKind::Array { elements }, span)
}

pub fn make_string_array(tree: &mut Tree, values: &[String], span: Span) -> NodeId {
    let elements = values
        .iter()
        .map(|value| make_string(tree, value, span))
        .collect();
    make_array(tree, elements, span)
}

/// Object literal with identifier keys, in the given order.
pub fn make_object(tree: &mut Tree, entries: Vec<(&str, NodeId)>, span: Span) -> NodeId {
    let properties = entries
        .into_iter()
        .map(|(key, value)| {
            tree.alloc(
                NodeKind::Property {
                    key: Key::Named(key.to_string()),
                    value,
                    shorthand: false,
                },
                span,
            )
        })
        .collect();
    tree.alloc(NodeKind::Object { properties }, span)
}

pub fn make_call(tree: &mut Tree, callee: NodeId, arguments: Vec<NodeId>, span: Span) -> NodeId {
    tree.alloc(NodeKind::Call { callee, arguments }, span)
}

pub fn make_expression_statement(tree: &mut Tree, expr: NodeId, span: Span) -> NodeId {
    tree.alloc(NodeKind::Expression { expr }, span)
}

/// Wraps an expression in a statement; statements are returned unchanged.
pub fn ensure_statement(tree: &mut Tree, id: NodeId) -> NodeId {
    if tree.kind(id).is_statement() {
        id
    } else {
        let span = tree.span(id);
        make_expression_statement(tree, id, span)
    }
}
