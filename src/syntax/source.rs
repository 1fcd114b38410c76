use crate::diagnostics::{to_error_source, SourceArc};

/// A source file as seen by the rewriter: the name it was given to the
/// pipeline and its full text. Diagnostics render snippets from it.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    /// Create a source context from real file content.
    pub fn from_file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Create a context for an alias template, named after the alias.
    pub fn for_template(alias: &str, template: impl Into<String>) -> Self {
        Self {
            name: format!("<alias {}>", alias),
            content: template.into(),
        }
    }

    /// Convert to a named source for use with miette error reporting.
    pub fn to_named_source(&self) -> SourceArc {
        to_error_source(&self.name, &self.content)
    }
}
