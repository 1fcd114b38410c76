//! Environment-driven strip overrides.
//!
//! Three comma-separated variables act as escape hatches when a strip policy
//! is active: `TRACE_CONTEXT` (substrings of the enclosing function/class
//! path), `TRACE_FILE` (substrings of the file name) and `TRACE_LEVEL` (label
//! names). They are read once, when an [`Environment`] is built, and passed
//! explicitly to the rewriter from then on.

use once_cell::sync::Lazy;
use regex::Regex;

pub const ENV_NAME_VAR: &str = "NODE_ENV";
pub const TRACE_CONTEXT_VAR: &str = "TRACE_CONTEXT";
pub const TRACE_FILE_VAR: &str = "TRACE_FILE";
pub const TRACE_LEVEL_VAR: &str = "TRACE_LEVEL";

static LIST_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*,\s*").expect("separator pattern is valid"));

/// Splits a comma-separated value into lower-cased, trimmed, non-empty entries.
/// Order is preserved and duplicates are kept.
pub fn normalize_list(value: Option<&str>) -> Vec<String> {
    let Some(value) = value else {
        return Vec::new();
    };
    LIST_SEPARATOR
        .split(value)
        .map(|entry| entry.trim().to_lowercase())
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// The three override lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub context: Vec<String>,
    pub file: Vec<String>,
    pub level: Vec<String>,
}

impl Overrides {
    /// Builds overrides from raw (unsplit) variable values.
    pub fn from_values(context: Option<&str>, file: Option<&str>, level: Option<&str>) -> Self {
        Self {
            context: normalize_list(context),
            file: normalize_list(file),
            level: normalize_list(level),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.context.is_empty() && self.file.is_empty() && self.level.is_empty()
    }

    /// Whether any override grants an exception for this call site.
    pub fn matches(&self, context: &str, filename: &str, level: &str) -> bool {
        let context = context.to_lowercase();
        let filename = filename.to_lowercase();
        let level = level.to_lowercase();
        self.context.iter().any(|entry| context.contains(entry.as_str()))
            || self.file.iter().any(|entry| filename.contains(entry.as_str()))
            || self.level.iter().any(|entry| *entry == level)
    }
}

/// Current environment name plus the override lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    pub name: Option<String>,
    pub overrides: Overrides,
}

impl Environment {
    pub fn new(name: Option<&str>, overrides: Overrides) -> Self {
        Self {
            name: name.map(str::to_string),
            overrides,
        }
    }

    /// Reads `NODE_ENV` and the three `TRACE_*` variables from the process.
    pub fn from_process() -> Self {
        let read = |key: &str| std::env::var(key).ok();
        let overrides = Overrides::from_values(
            read(TRACE_CONTEXT_VAR).as_deref(),
            read(TRACE_FILE_VAR).as_deref(),
            read(TRACE_LEVEL_VAR).as_deref(),
        );
        let env = Self::new(read(ENV_NAME_VAR).as_deref(), overrides);
        tracing::debug!(
            env = env.name.as_deref().unwrap_or(""),
            overrides = ?env.overrides,
            "read environment overrides"
        );
        env
    }

    pub fn with_name(mut self, name: Option<&str>) -> Self {
        self.name = name.map(str::to_string);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_splits_trims_and_lowercases() {
        assert_eq!(
            normalize_list(Some(" Foo ,bar,,  BAZ  ")),
            vec!["foo", "bar", "baz"]
        );
    }

    #[test]
    fn normalize_absent_or_empty_is_empty() {
        assert!(normalize_list(None).is_empty());
        assert!(normalize_list(Some("")).is_empty());
        assert!(normalize_list(Some(" , ,")).is_empty());
    }

    #[test]
    fn normalize_keeps_order_and_duplicates() {
        assert_eq!(normalize_list(Some("b,a,b")), vec!["b", "a", "b"]);
    }

    #[test]
    fn overrides_match_case_insensitively() {
        let overrides = Overrides::from_values(Some("Service"), Some("API.js"), Some("warn"));
        assert!(overrides.matches("MyService:start", "x.js", "debug"));
        assert!(overrides.matches("", "src/api.js", "debug"));
        assert!(overrides.matches("", "x.js", "WARN"));
        assert!(!overrides.matches("Other", "x.js", "warnValues"));
    }
}
