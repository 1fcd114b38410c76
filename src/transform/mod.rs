//! Label-to-call rewrite pipeline.
//!
//! ```rust
//! use metalog::environment::Environment;
//! use metalog::options::Options;
//! use metalog::transform::transform_source;
//!
//! let out = transform_source(
//!     "function go() {\n  debug: ready;\n}\n",
//!     "a.js",
//!     &Options::new(),
//!     &Environment::default(),
//! )
//! .unwrap();
//! assert!(out.code.contains("METALOG({ values: true, level: \"debug\""));
//! assert_eq!(out.stats.calls, 1);
//! ```

use std::path::Path;

use crate::ast::Tree;
use crate::environment::Environment;
use crate::options::Options;
use crate::syntax::{parse, print, SourceContext};
use crate::{err_msg, MetalogError};

pub mod metadata;
pub mod purity;
pub mod rewriter;
pub mod strip;

pub use metadata::{FileInfo, Metadata};
pub use rewriter::{Rewriter, Stats};

/// Result of rewriting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    pub code: String,
    pub stats: Stats,
}

/// Parses, rewrites and prints one source file.
pub fn transform_source(
    source: &str,
    filename: &str,
    options: &Options,
    env: &Environment,
) -> Result<Transformed, MetalogError> {
    let context = SourceContext::from_file(filename, source);
    let mut tree = parse(&context)?;
    let stats = transform_tree(&mut tree, &context, options, env)?;
    Ok(Transformed {
        code: print(&tree),
        stats,
    })
}

/// Reads `path` and rewrites it. The path as given is the file name
/// reported in metadata.
pub fn transform_file(
    path: impl AsRef<Path>,
    options: &Options,
    env: &Environment,
) -> Result<Transformed, MetalogError> {
    let path = path.as_ref();
    let filename = path.display().to_string();
    let source = std::fs::read_to_string(path).map_err(|e| {
        err_msg!(Resolution, "cannot read '{}': {}", filename, e).with_cause(e)
    })?;
    transform_source(&source, &filename, options, env)
}

/// Rewrites an already parsed tree in place.
pub fn transform_tree(
    tree: &mut Tree,
    source: &SourceContext,
    options: &Options,
    env: &Environment,
) -> Result<Stats, MetalogError> {
    let aliases = options.normalize()?;
    let file = FileInfo::resolve(&source.name)?;
    let named = source.to_named_source();
    let stats = Rewriter::new(tree, &file, &named, options, aliases, env).run()?;
    tracing::info!(
        file = %source.name,
        labels = stats.labels,
        calls = stats.calls,
        stripped = stats.stripped,
        "transformed file"
    );
    Ok(stats)
}
