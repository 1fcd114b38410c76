//! Metalog: compile-time rewriting of labeled log statements.
//!
//! Labels such as `debug:` or `warn:` in JavaScript source become calls to a
//! single logging function carrying call-site metadata, or are removed
//! entirely under a strip policy. See [`transform::transform_source`].

pub use crate::diagnostics::{ErrorContext, ErrorType, MetalogError};

pub mod aliases;
pub mod ast;
pub mod cli;
pub mod diagnostics;
pub mod environment;
pub mod logging;
pub mod options;
pub mod syntax;
pub mod templates;
pub mod transform;

/// Commonly used items.
pub mod prelude {
    pub use crate::aliases::{AliasTable, Level, SynthFn, SynthInput, Synthesizer};
    pub use crate::ast::{NodeId, NodeKind, Span, Tree};
    pub use crate::environment::{Environment, Overrides};
    pub use crate::options::{Options, Strip};
    pub use crate::transform::{
        transform_file, transform_source, transform_tree, Metadata, Stats, Transformed,
    };
    pub use crate::{ErrorType, MetalogError};
}
