//! Options loading and alias-table normalization.

mod common;

use metalog::aliases::{AliasTable, Synthesizer};
use metalog::environment::Environment;
use metalog::options::{Options, Strip};
use metalog::ErrorType;
use std::sync::Arc;

#[test]
fn normalization_is_idempotent() {
    let options = Options::new().with_alias("loud", "%%logFunction%%(%%content%%);");
    let first = options.normalize().unwrap();
    let second = options.normalize().unwrap();
    assert!(std::ptr::eq(first, second));

    let (Some(Synthesizer::Template(a)), Some(Synthesizer::Template(b))) =
        (first.get("loud"), second.get("loud"))
    else {
        panic!("expected template aliases");
    };
    assert!(Arc::ptr_eq(a, b));
}

#[test]
fn one_table_serves_many_files() {
    let options = Options::new();
    let table = options.normalize().unwrap() as *const AliasTable;
    for source in ["debug: a;\n", "info: b;\n"] {
        common::rewrite_with(source, &options, &Environment::default()).unwrap();
    }
    assert_eq!(options.normalize().unwrap() as *const AliasTable, table);
}

#[test]
fn defaults_when_aliases_absent() {
    let options = Options::from_json("{}").unwrap();
    let table = options.normalize().unwrap();
    assert_eq!(table.len(), 15);
    let names: Vec<&str> = table.iter().map(|(name, _)| name).collect();
    assert!(names.contains(&"traceRefs"));
    assert!(names.contains(&"errorValues"));
}

#[test]
fn yaml_and_json_files_load() {
    let dir = tempfile::tempdir().unwrap();

    let yaml = dir.path().join("metalog.yaml");
    std::fs::write(
        &yaml,
        "logFunction: LOG\nstrip:\n  production: true\naliases:\n  warn: ~\n  loud: \"%%logFunction%%.loud(%%content%%);\"\n",
    )
    .unwrap();
    let options = Options::from_file(&yaml).unwrap();
    assert_eq!(options.log_function, "LOG");
    assert!(matches!(options.strip, Some(Strip::PerEnv(_))));
    let table = options.normalize().unwrap();
    assert_eq!(table.len(), 2);

    let json = dir.path().join("metalog.json");
    std::fs::write(&json, r#"{"strip": "production"}"#).unwrap();
    let options = Options::from_file(&json).unwrap();
    assert_eq!(options.strip, Some(Strip::Env("production".to_string())));
}

#[test]
fn bad_option_files_are_config_errors() {
    let dir = tempfile::tempdir().unwrap();

    let toml = dir.path().join("metalog.toml");
    std::fs::write(&toml, "strip = true").unwrap();
    assert_eq!(Options::from_file(&toml).unwrap_err().error_type(), ErrorType::Config);

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, r#"{"strip": [1, 2]}"#).unwrap();
    assert_eq!(Options::from_file(&broken).unwrap_err().error_type(), ErrorType::Config);

    let missing = dir.path().join("missing.json");
    assert_eq!(Options::from_file(&missing).unwrap_err().error_type(), ErrorType::Config);
}

#[test]
fn with_alias_resets_the_memoized_table() {
    let options = Options::new();
    assert_eq!(options.normalize().unwrap().len(), 15);
    let options = options.with_alias("loud", "%%logFunction%%(%%content%%);");
    assert!(!options.is_normalized());
    assert_eq!(options.normalize().unwrap().len(), 1);
}
