//! Side-effect check for the body of a logging label.

use crate::aliases::AliasTable;
use crate::ast::{NodeId, NodeKind, Tree};
use crate::diagnostics::SourceArc;
use crate::{err_ctx, MetalogError};

pub const PURITY_MESSAGE: &str = "logging statements cannot have side effects";

/// Name of the construct when `kind` is not allowed in a logging body.
fn forbidden(kind: &NodeKind) -> Option<&'static str> {
    match kind {
        NodeKind::VarDecl { .. } => Some("variable declaration"),
        NodeKind::Function { .. } | NodeKind::Method { .. } => Some("function"),
        NodeKind::Assign { .. } => Some("assignment"),
        NodeKind::Update { .. } => Some("update expression"),
        NodeKind::Yield { .. } => Some("yield expression"),
        NodeKind::Return { .. } => Some("return statement"),
        _ => None,
    }
}

/// Rejects side-effecting constructs inside `body`. Nested labels handled by
/// the alias table are skipped; they are checked when rewritten themselves.
pub fn check(
    tree: &Tree,
    body: NodeId,
    label: &str,
    aliases: &AliasTable,
    source: &SourceArc,
    filename: &str,
) -> Result<(), MetalogError> {
    let mut pending = vec![body];
    while let Some(id) = pending.pop() {
        let kind = tree.kind(id);
        if let NodeKind::Labeled { label: nested, .. } = kind {
            if id != body && aliases.contains(nested) {
                continue;
            }
        }
        if let Some(construct) = forbidden(kind) {
            let line = tree.line_of(id);
            tracing::debug!(label, line, construct, "purity violation");
            return Err(err_ctx!(
                Purity,
                PURITY_MESSAGE,
                source,
                tree.span(id),
                format!("{} inside `{}:` at {}:{}", construct, label, filename, line)
            ));
        }
        pending.extend(kind.children());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ErrorType;
    use crate::syntax::{parse, SourceContext};

    fn check_source(source: &str) -> Result<(), MetalogError> {
        let ctx = SourceContext::from_file("a.js", source);
        let tree = parse(&ctx).unwrap();
        let label = tree.statements(tree.root())[0];
        let NodeKind::Labeled { body, label: name } = tree.kind(label) else {
            panic!("expected a labeled statement");
        };
        check(&tree, *body, name, &AliasTable::defaults(), &ctx.to_named_source(), "a.js")
    }

    #[test]
    fn plain_expressions_are_pure() {
        assert!(check_source("debug: a, b.c, f(x), x + 1;").is_ok());
        assert!(check_source("info: { a; if (b) c; }").is_ok());
    }

    #[test]
    fn side_effects_are_rejected() {
        for source in [
            "debug: (x = 1);",
            "debug: x++;",
            "debug: { let y = 2; }",
            "debug: f(function () {});",
            "debug: f(() => 1);",
            "debug: return x;",
        ] {
            let err = check_source(source).unwrap_err();
            assert_eq!(err.error_type(), ErrorType::Purity, "{}", source);
            assert_eq!(err.message(), PURITY_MESSAGE);
        }
    }

    #[test]
    fn violation_points_at_construct() {
        let err = check_source("warn: {\n  a;\n  b += 1;\n}\n").unwrap_err();
        assert_eq!(err.span().map(|s| s.start), Some(15));
        assert_eq!(err.help_text(), Some("assignment inside `warn:` at a.js:3"));
    }

    #[test]
    fn nested_alias_labels_are_left_for_their_own_pass() {
        assert!(check_source("debug: { a; info: (x = 1); }").is_ok());
        assert!(check_source("debug: { a; other: (x = 1); }").is_err());
    }
}
