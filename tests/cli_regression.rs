//! Command-line behaviour of the `metalog` binary.
//! Requires: assert_cmd, predicates, tempfile in [dev-dependencies]

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn metalog() -> Command {
    let mut cmd = Command::cargo_bin("metalog").unwrap();
    for var in ["NODE_ENV", "TRACE_CONTEXT", "TRACE_FILE", "TRACE_LEVEL", "METALOG_LOG"] {
        cmd.env_remove(var);
    }
    cmd
}

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn transform_prints_rewritten_code() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "a.js", "function go() {\n  debug: ready;\n}\n");

    metalog()
        .arg("transform")
        .arg(&file)
        .assert()
        .success()
        .stdout(contains("METALOG({ values: true, level: \"debug\""))
        .stdout(contains("parentPath: [\"go\"]"))
        .stderr(contains("1 call(s)"));
}

#[test]
fn strip_flag_removes_labels() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "a.js", "warn: a;\nkeep();\n");

    metalog()
        .args(["transform", "--strip", "true"])
        .arg(&file)
        .assert()
        .success()
        .stdout(contains("keep();").and(contains("METALOG").not()));
}

#[test]
fn env_strip_honours_trace_level() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "a.js", "warn: a;\ndebug: b;\n");

    metalog()
        .args(["transform", "--strip", "production", "--env", "production"])
        .arg(&file)
        .env("TRACE_LEVEL", "warn")
        .assert()
        .success()
        .stdout(contains("level: \"warn\"").and(contains("level: \"debug\"").not()));

    metalog()
        .args(["transform", "--strip", "production", "--env", "staging"])
        .arg(&file)
        .assert()
        .success()
        .stdout(contains("level: \"debug\""));
}

#[test]
fn out_dir_mirrors_walked_directory() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write(input.path(), "lib/a.js", "info: a;\n");
    write(input.path(), "b.mjs", "trace: b;\n");
    write(input.path(), "notes.txt", "info: ignored;\n");

    metalog()
        .arg("transform")
        .arg(input.path())
        .arg("--out-dir")
        .arg(output.path())
        .assert()
        .success()
        .stderr(contains("2 file(s)"));

    let a = fs::read_to_string(output.path().join("lib/a.js")).unwrap();
    assert!(a.contains("level: \"info\""));
    assert!(output.path().join("b.mjs").exists());
    assert!(!output.path().join("notes.txt").exists());
}

#[test]
fn diff_shows_changed_lines() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "a.js", "x();\ninfo: a;\n");

    metalog()
        .args(["transform", "--diff"])
        .arg(&file)
        .assert()
        .success()
        .stdout(contains("-info: a;").and(contains("+METALOG(")).and(contains(" x();")));
}

#[test]
fn purity_violation_is_rendered_with_miette() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "bad.js", "function f() {\n  debug: (x = 1);\n}\n");

    metalog()
        .arg("check")
        .arg(&file)
        .assert()
        .failure()
        .code(1)
        .stderr(
            contains("metalog::purity")
                .and(contains("logging statements cannot have side effects"))
                .and(contains("bad.js:2")),
        );
}

#[test]
fn check_reports_good_files() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "ok.js", "info: fine;\n");

    metalog()
        .arg("check")
        .arg(&file)
        .assert()
        .success()
        .stdout(contains("ok"));
}

#[test]
fn aliases_lists_defaults_and_config() {
    metalog()
        .arg("aliases")
        .assert()
        .success()
        .stdout(contains("debugRefs").and(contains("builtin level=debug values=false")));

    let dir = tempfile::tempdir().unwrap();
    let config = write(
        dir.path(),
        "metalog.json",
        r#"{"aliases": {"loud": "%%logFunction%%.loud(%%content%%);"}}"#,
    );
    metalog()
        .arg("aliases")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(contains("loud").and(contains("debugRefs").not()));
}

#[test]
fn out_dir_keeps_relative_file_arguments_apart() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write(input.path(), "a/x.js", "info: a;\n");
    write(input.path(), "b/x.js", "warn: b;\n");

    metalog()
        .current_dir(input.path())
        .args(["transform", "a/x.js", "./b/x.js", "--out-dir"])
        .arg(output.path())
        .assert()
        .success();

    let a = fs::read_to_string(output.path().join("a/x.js")).unwrap();
    let b = fs::read_to_string(output.path().join("b/x.js")).unwrap();
    assert!(a.contains("level: \"info\""));
    assert!(b.contains("level: \"warn\""));
}

#[test]
fn out_dir_rejects_colliding_outputs() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let a = write(input.path(), "a/x.js", "info: a;\n");
    let b = write(input.path(), "b/x.js", "warn: b;\n");

    metalog()
        .arg("transform")
        .arg(&a)
        .arg(&b)
        .arg("--out-dir")
        .arg(output.path())
        .assert()
        .failure()
        .stderr(contains("metalog::resolution"));
    assert!(!output.path().join("x.js").exists());
}

#[test]
fn stdout_names_each_file_when_several() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(dir.path(), "a.js", "one();\n");
    let b = write(dir.path(), "b.js", "two();\n");

    metalog()
        .arg("transform")
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout(contains(format!("// {}\none();\n// {}\ntwo();\n", a.display(), b.display())));

    metalog()
        .arg("transform")
        .arg(&a)
        .assert()
        .success()
        .stdout(contains("// ").not());
}

#[test]
fn bad_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "metalog.json", r#"{"aliases": {"loud": null}}"#);

    metalog()
        .arg("aliases")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(contains("metalog::config"));
}

#[test]
fn missing_input_fails() {
    metalog()
        .args(["transform", "does/not/exist.js"])
        .assert()
        .failure()
        .stderr(contains("metalog::resolution"));
}

#[test]
fn ast_dumps_json() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "a.js", "debug: a;\n");

    metalog()
        .arg("ast")
        .arg(&file)
        .assert()
        .success()
        .stdout(contains("\"Labeled\"").and(contains("\"debug\"")));
}
