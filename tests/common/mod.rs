//! Shared helpers for metalog integration tests.
#![allow(dead_code)]

use metalog::ast::{NodeId, NodeKind, Tree};
use metalog::environment::{Environment, Overrides};
use metalog::options::Options;
use metalog::syntax::{parse, SourceContext};
use metalog::transform::{transform_source, transform_tree, Stats, Transformed};
use metalog::MetalogError;

/// Rewrites `source` as file `a.js` with default options and no environment.
pub fn rewrite(source: &str) -> Transformed {
    transform_source(source, "a.js", &Options::new(), &Environment::default())
        .expect("transform should succeed")
}

pub fn rewrite_with(source: &str, options: &Options, env: &Environment) -> Result<Transformed, MetalogError> {
    transform_source(source, "a.js", options, env)
}

/// Parses and rewrites `source`, returning the tree for inspection.
pub fn rewrite_tree(source: &str, options: &Options, env: &Environment) -> (Tree, Stats) {
    let context = SourceContext::from_file("a.js", source);
    let mut tree = parse(&context).expect("source should parse");
    let stats = transform_tree(&mut tree, &context, options, env).expect("transform should succeed");
    (tree, stats)
}

pub fn env(name: Option<&str>, level: Option<&str>) -> Environment {
    Environment::new(name, Overrides::from_values(None, None, level))
}

/// `a.js` resolved against the test process working directory, JSON-quoted.
pub fn quoted_abs(name: &str) -> String {
    let path = std::env::current_dir().expect("cwd").join(name);
    serde_json::to_string(&path.to_string_lossy()).expect("quote")
}

/// Every call expression reachable from the root, in source order.
pub fn calls(tree: &Tree) -> Vec<NodeId> {
    let mut found = Vec::new();
    let mut pending = vec![tree.root()];
    while let Some(id) = pending.pop() {
        if matches!(tree.kind(id), NodeKind::Call { .. }) {
            found.push(id);
        }
        pending.extend(tree.kind(id).children().into_iter().rev());
    }
    found
}

/// Property names of an object literal.
pub fn object_keys(tree: &Tree, object: NodeId) -> Vec<String> {
    let NodeKind::Object { properties } = tree.kind(object) else {
        panic!("expected an object literal");
    };
    properties
        .iter()
        .map(|&p| match tree.kind(p) {
            NodeKind::Property {
                key: metalog::ast::Key::Named(name),
                ..
            } => name.clone(),
            other => panic!("unexpected property {:?}", other),
        })
        .collect()
}

/// Value node of property `key` in an object literal.
pub fn property(tree: &Tree, object: NodeId, key: &str) -> NodeId {
    let NodeKind::Object { properties } = tree.kind(object) else {
        panic!("expected an object literal");
    };
    properties
        .iter()
        .find_map(|&p| match tree.kind(p) {
            NodeKind::Property {
                key: metalog::ast::Key::Named(name),
                value,
                ..
            } if name == key => Some(*value),
            _ => None,
        })
        .unwrap_or_else(|| panic!("missing property {}", key))
}
