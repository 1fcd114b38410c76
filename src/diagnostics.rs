//! Unified, `miette`-based diagnostics for the metalog rewriter.
//!
//! Every failure produced while loading options, compiling alias templates,
//! parsing a source file or rewriting its labeled statements is a
//! [`MetalogError`]. Errors are built with the `err_msg!` and `err_ctx!`
//! macros:
//!
//! - `err_msg!(Config, "unknown alias '{}'", name)` for message-only errors.
//! - `err_ctx!(Purity, message, src, span)` when a source and span are at hand.
//! - `err_ctx!(Purity, message, src, span, help)` to attach a help line.
//!
//! There is no recovery path: a diagnostic aborts the current file.

use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use thiserror::Error;

use crate::ast::Span;

pub type SourceArc = Arc<NamedSource<String>>;

/// Type-safe error classification that mirrors the `MetalogError` variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// Invalid syntax in a source file or template.
    Parse,
    /// Malformed options, alias templates or options files.
    Config,
    /// Side-effecting construct inside a logging label.
    Purity,
    /// Path resolution or file system failure.
    Resolution,
    /// Broken tree invariant.
    Internal,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Parse => "parse",
            ErrorType::Config => "config",
            ErrorType::Purity => "purity",
            ErrorType::Resolution => "resolution",
            ErrorType::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Minimal error context: where the error happened and how to fix it.
#[derive(Debug, Default)]
pub struct ErrorContext {
    pub source: Option<SourceArc>,
    pub span: Option<Span>,
    pub help: Option<String>,
}

impl ErrorContext {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_source_and_span(source: SourceArc, span: Span) -> Self {
        Self {
            source: Some(source),
            span: Some(span),
            help: None,
        }
    }
}

/// Unified error type for every metalog failure mode.
#[derive(Debug, Error)]
pub enum MetalogError {
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("{message}")]
    Purity {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Resolution error: {message}")]
    Resolution {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
}

impl MetalogError {
    fn parts(&self) -> (&str, &ErrorContext) {
        match self {
            MetalogError::Parse { message, ctx, .. }
            | MetalogError::Config { message, ctx, .. }
            | MetalogError::Purity { message, ctx, .. }
            | MetalogError::Resolution { message, ctx, .. }
            | MetalogError::Internal { message, ctx, .. } => (message, ctx),
        }
    }

    pub fn error_type(&self) -> ErrorType {
        match self {
            MetalogError::Parse { .. } => ErrorType::Parse,
            MetalogError::Config { .. } => ErrorType::Config,
            MetalogError::Purity { .. } => ErrorType::Purity,
            MetalogError::Resolution { .. } => ErrorType::Resolution,
            MetalogError::Internal { .. } => ErrorType::Internal,
        }
    }

    pub fn message(&self) -> &str {
        self.parts().0
    }

    pub fn help_text(&self) -> Option<&str> {
        self.parts().1.help.as_deref()
    }

    pub fn span(&self) -> Option<Span> {
        self.parts().1.span
    }

    /// Attaches the underlying cause (an IO or deserialization error).
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        match &mut self {
            MetalogError::Parse { source, .. }
            | MetalogError::Config { source, .. }
            | MetalogError::Purity { source, .. }
            | MetalogError::Resolution { source, .. }
            | MetalogError::Internal { source, .. } => *source = Some(Box::new(cause)),
        }
        self
    }
}

impl Diagnostic for MetalogError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        Some(Box::new(format!("metalog::{}", self.error_type())))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.parts()
            .1
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.parts()
            .1
            .source
            .as_ref()
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let (message, ctx) = self.parts();
        let span = ctx.span?;
        let len = if span.end > span.start {
            span.end - span.start
        } else {
            1
        };
        let label = LabeledSpan::new(Some(message.to_string()), span.start, len);
        Some(Box::new(std::iter::once(label)))
    }
}

/// Converts a file name and its content into a shareable named source.
pub fn to_error_source(name: impl AsRef<str>, content: impl AsRef<str>) -> SourceArc {
    Arc::new(NamedSource::new(
        name.as_ref().to_string(),
        content.as_ref().to_string(),
    ))
}

/// Constructs a `MetalogError` variant with a formatted message and no context.
#[macro_export]
macro_rules! err_msg {
    ($variant:ident, $fmt:literal, $($arg:expr),+ $(,)?) => {
        $crate::MetalogError::$variant {
            message: format!($fmt, $($arg),+),
            ctx: $crate::ErrorContext::none(),
            source: None,
        }
    };
    ($variant:ident, $msg:expr) => {
        $crate::MetalogError::$variant {
            message: format!("{}", $msg),
            ctx: $crate::ErrorContext::none(),
            source: None,
        }
    };
}

/// Constructs a `MetalogError` variant carrying a source, a span and an optional help line.
#[macro_export]
macro_rules! err_ctx {
    ($variant:ident, $msg:expr, $src:expr, $span:expr, $help:expr) => {
        $crate::MetalogError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext {
                source: Some($crate::diagnostics::SourceArc::clone($src)),
                span: Some($span),
                help: Some(format!("{}", $help)),
            },
            source: None,
        }
    };
    ($variant:ident, $msg:expr, $src:expr, $span:expr) => {
        $crate::MetalogError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext::with_source_and_span(
                $crate::diagnostics::SourceArc::clone($src),
                $span,
            ),
            source: None,
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn err_msg_formats_arguments() {
        let err = err_msg!(Config, "unknown alias '{}'", "loud");
        assert_eq!(err.error_type(), ErrorType::Config);
        assert_eq!(err.message(), "unknown alias 'loud'");
        assert!(err.span().is_none());
    }

    #[test]
    fn err_ctx_carries_label_and_help() {
        let src = to_error_source("a.js", "debug: x = 1;");
        let err = err_ctx!(
            Purity,
            "logging statements cannot have side effects",
            &src,
            Span { start: 7, end: 12 },
            "a.js:1"
        );
        assert_eq!(err.help_text(), Some("a.js:1"));
        let labels: Vec<_> = err.labels().unwrap().collect();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].offset(), 7);
        assert_eq!(labels[0].len(), 5);
        assert_eq!(err.to_string(), "logging statements cannot have side effects");
    }

    #[test]
    fn cause_is_exposed_as_error_source() {
        use std::error::Error as _;
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = err_msg!(Resolution, "cannot read 'a.js'").with_cause(io);
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("gone"));
        assert!(err_msg!(Internal, "no cause").source().is_none());
    }
}
