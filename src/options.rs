//! Per-compilation options and their one-time normalization.
//!
//! Options come from code, from a JSON or YAML file, or from the command
//! line. The alias table is derived lazily by [`Options::normalize`] and
//! memoized inside the options value, so every file rewritten with the same
//! options shares one table and templates are compiled only once.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::aliases::{AliasTable, SynthFn, Synthesizer};
use crate::templates;
use crate::{err_msg, MetalogError};

pub const DEFAULT_LOG_FUNCTION: &str = "METALOG";

fn default_log_function() -> String {
    DEFAULT_LOG_FUNCTION.to_string()
}

/// Compile-time removal policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Strip {
    /// `true` strips everywhere, `false` never.
    Flag(bool),
    /// Strip only when the current environment has this name.
    Env(String),
    /// Strip in the environments mapped to `true`.
    PerEnv(BTreeMap<String, bool>),
}

impl Strip {
    /// Whether the policy applies in environment `env`.
    pub fn applies_to(&self, env: Option<&str>) -> bool {
        match self {
            Strip::Flag(flag) => *flag,
            Strip::Env(name) => !name.is_empty() && env == Some(name.as_str()),
            Strip::PerEnv(map) => env.and_then(|env| map.get(env)).copied().unwrap_or(false),
        }
    }

    /// Parses a command-line value: `true`, `false` or an environment name.
    pub fn from_arg(value: &str) -> Strip {
        match value {
            "true" => Strip::Flag(true),
            "false" => Strip::Flag(false),
            name => Strip::Env(name.to_string()),
        }
    }
}

/// A synthesizer registered from code.
#[derive(Clone)]
struct NativeAlias {
    name: String,
    synth: SynthFn,
}

impl std::fmt::Debug for NativeAlias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeAlias").field("name", &self.name).finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Options {
    /// Label name to template source. `None` keeps the built-in handler of
    /// that name. When absent, the fifteen defaults are used.
    #[serde(default)]
    pub aliases: Option<BTreeMap<String, Option<String>>>,
    #[serde(default)]
    pub strip: Option<Strip>,
    #[serde(default = "default_log_function")]
    pub log_function: String,
    #[serde(skip)]
    native_aliases: Vec<NativeAlias>,
    #[serde(skip)]
    table: OnceCell<AliasTable>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            aliases: None,
            strip: None,
            log_function: default_log_function(),
            native_aliases: Vec::new(),
            table: OnceCell::new(),
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads options from a `.json`, `.yaml` or `.yml` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MetalogError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|e| {
            err_msg!(Config, "cannot read options file '{}': {}", display, e).with_cause(e)
        })?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        let options = match extension.as_str() {
            "json" => Self::from_json(&text),
            "yaml" | "yml" => Self::from_yaml(&text),
            _ => {
                return Err(err_msg!(
                    Config,
                    "unsupported options file '{}': expected .json, .yaml or .yml",
                    display
                ))
            }
        }?;
        tracing::debug!(path = %path.display(), "loaded options file");
        Ok(options)
    }

    pub fn from_json(text: &str) -> Result<Self, MetalogError> {
        serde_json::from_str(text)
            .map_err(|e| err_msg!(Config, "invalid options: {}", e).with_cause(e))
    }

    pub fn from_yaml(text: &str) -> Result<Self, MetalogError> {
        serde_yaml::from_str(text)
            .map_err(|e| err_msg!(Config, "invalid options: {}", e).with_cause(e))
    }

    pub fn with_strip(mut self, strip: Strip) -> Self {
        self.strip = Some(strip);
        self.table = OnceCell::new();
        self
    }

    pub fn with_log_function(mut self, name: impl Into<String>) -> Self {
        self.log_function = name.into();
        self
    }

    /// Adds (or replaces) a template alias.
    pub fn with_alias(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        self.aliases
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), Some(template.into()));
        self.table = OnceCell::new();
        self
    }

    /// Registers a native synthesizer under `name`, on top of whichever
    /// table the `aliases` option selects.
    pub fn with_alias_fn(mut self, name: impl Into<String>, synth: SynthFn) -> Self {
        self.native_aliases.push(NativeAlias {
            name: name.into(),
            synth,
        });
        self.table = OnceCell::new();
        self
    }

    pub fn is_normalized(&self) -> bool {
        self.table.get().is_some()
    }

    /// Builds the alias table on first call and returns the memoized table
    /// afterwards.
    pub fn normalize(&self) -> Result<&AliasTable, MetalogError> {
        self.table.get_or_try_init(|| self.build_table())
    }

    fn build_table(&self) -> Result<AliasTable, MetalogError> {
        let mut table = match &self.aliases {
            None => AliasTable::defaults(),
            Some(aliases) => {
                let mut table = AliasTable::new();
                for (name, template) in aliases {
                    let synthesizer = match template {
                        Some(source) => Synthesizer::Template(Arc::new(templates::compile(name, source)?)),
                        None => Synthesizer::builtin(name).ok_or_else(|| {
                            err_msg!(
                                Config,
                                "alias '{}' has no template and is not a built-in alias",
                                name
                            )
                        })?,
                    };
                    table.insert(name.clone(), synthesizer);
                }
                table
            }
        };
        for native in &self.native_aliases {
            table.insert(native.name.clone(), Synthesizer::Custom(native.synth));
        }
        tracing::debug!(aliases = table.len(), "normalized options");
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ErrorType;

    #[test]
    fn strip_deserializes_every_shape() {
        let flag = Options::from_json(r#"{"strip": true}"#).unwrap();
        assert_eq!(flag.strip, Some(Strip::Flag(true)));

        let env = Options::from_json(r#"{"strip": "production"}"#).unwrap();
        assert_eq!(env.strip, Some(Strip::Env("production".to_string())));

        let per_env = Options::from_yaml("strip:\n  production: true\n  test: false\n").unwrap();
        let Some(Strip::PerEnv(map)) = per_env.strip else {
            panic!("expected a per-environment map");
        };
        assert_eq!(map.get("production"), Some(&true));
    }

    #[test]
    fn strip_applies_by_environment() {
        assert!(Strip::Flag(true).applies_to(None));
        assert!(!Strip::Flag(false).applies_to(Some("production")));
        assert!(Strip::Env("production".into()).applies_to(Some("production")));
        assert!(!Strip::Env("production".into()).applies_to(Some("development")));
        assert!(!Strip::Env(String::new()).applies_to(Some("")));
        let map = Strip::PerEnv(BTreeMap::from([("production".to_string(), true)]));
        assert!(map.applies_to(Some("production")));
        assert!(!map.applies_to(Some("test")));
        assert!(!map.applies_to(None));
    }

    #[test]
    fn strip_from_arg() {
        assert_eq!(Strip::from_arg("true"), Strip::Flag(true));
        assert_eq!(Strip::from_arg("false"), Strip::Flag(false));
        assert_eq!(Strip::from_arg("staging"), Strip::Env("staging".into()));
    }

    #[test]
    fn log_function_defaults() {
        assert_eq!(Options::from_json("{}").unwrap().log_function, "METALOG");
        assert_eq!(Options::new().log_function, "METALOG");
    }

    #[test]
    fn unknown_option_keys_are_rejected() {
        let err = Options::from_json(r#"{"strips": true}"#).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
    }

    #[test]
    fn options_load_from_json_and_yaml_files() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("metalog.json");
        std::fs::write(&json, r#"{"logFunction": "LOG"}"#).unwrap();
        assert_eq!(Options::from_file(&json).unwrap().log_function, "LOG");

        let yaml = dir.path().join("metalog.yml");
        std::fs::write(&yaml, "strip: true\n").unwrap();
        assert_eq!(Options::from_file(&yaml).unwrap().strip, Some(Strip::Flag(true)));

        let missing = Options::from_file(dir.path().join("absent.json")).unwrap_err();
        assert_eq!(missing.error_type(), ErrorType::Config);
    }

    #[test]
    fn normalize_is_memoized() {
        let options = Options::new();
        assert!(!options.is_normalized());
        let first = options.normalize().unwrap() as *const AliasTable;
        let second = options.normalize().unwrap() as *const AliasTable;
        assert_eq!(first, second);
        assert!(options.is_normalized());
    }

    #[test]
    fn null_alias_maps_to_builtin() {
        let options = Options::from_json(r#"{"aliases": {"warn": null, "loud": "%%logFunction%%(%%content%%);"}}"#)
            .unwrap();
        let table = options.normalize().unwrap();
        assert_eq!(table.len(), 2);
        assert!(matches!(table.get("warn"), Some(Synthesizer::Builtin { .. })));
        assert!(matches!(table.get("loud"), Some(Synthesizer::Template(_))));
        assert!(!table.contains("debug"));
    }

    #[test]
    fn null_alias_without_builtin_is_a_config_error() {
        let options = Options::from_json(r#"{"aliases": {"loud": null}}"#).unwrap();
        let err = options.normalize().unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
        assert!(!options.is_normalized());
    }
}
