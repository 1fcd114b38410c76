//! The metalog command-line interface.
//!
//! Parses arguments, installs logging, and dispatches to the library's
//! pipeline. Every failure is rendered through miette and exits with status 1.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::process;

use clap::Parser;
use walkdir::WalkDir;

use crate::cli::args::{Command, ConfigArgs, MetalogArgs};
use crate::environment::Environment;
use crate::logging::init_logging;
use crate::options::{Options, Strip};
use crate::syntax::{parse, SourceContext};
use crate::transform::{transform_source, Stats};
use crate::{err_msg, MetalogError};

pub mod args;
pub mod output;

/// File extensions picked up when walking directories.
pub const SOURCE_EXTENSIONS: &[&str] = &["js", "mjs", "cjs"];

/// The main entry point for the CLI.
pub fn run() {
    let args = MetalogArgs::parse();
    init_logging(args.log_level);

    let result = match args.command {
        Command::Transform {
            paths,
            out_dir,
            diff,
            config,
        } => handle_transform(&paths, out_dir.as_deref(), diff, &config),
        Command::Check { paths, config } => handle_check(&paths, &config),
        Command::Aliases { config } => handle_aliases(&config),
        Command::Ast { file } => handle_ast(&file),
    };

    if let Err(e) = result {
        output::report_error(e);
        process::exit(1);
    }
}

// ============================================================================
// COMMAND HANDLERS
// ============================================================================

fn handle_transform(
    paths: &[PathBuf],
    out_dir: Option<&Path>,
    diff: bool,
    config: &ConfigArgs,
) -> Result<(), MetalogError> {
    let options = load_options(config)?;
    let env = load_environment(config);
    let sources = collect_sources(paths)?;
    if out_dir.is_some() {
        check_distinct_targets(&sources)?;
    }
    let headers = out_dir.is_none() && !diff && sources.len() > 1;
    let mut total = Stats::default();

    for source in &sources {
        let text = read_source(&source.path)?;
        let filename = source.path.display().to_string();
        let transformed = transform_source(&text, &filename, &options, &env)?;
        accumulate(&mut total, &transformed.stats);

        if diff {
            output::print_diff(&source.path, &text, &transformed.code);
        } else if let Some(out_dir) = out_dir {
            let target = out_dir.join(&source.relative);
            write_output(&target, &transformed.code)?;
        } else {
            if headers {
                output::print_code_header(&source.path);
            }
            output::print_code(&transformed.code);
        }
    }

    output::print_summary(sources.len(), &total);
    Ok(())
}

/// Rewrites every file, reporting every failure.
fn handle_check(paths: &[PathBuf], config: &ConfigArgs) -> Result<(), MetalogError> {
    let options = load_options(config)?;
    let env = load_environment(config);
    let sources = collect_sources(paths)?;
    let mut failures = Vec::new();

    for source in &sources {
        let filename = source.path.display().to_string();
        let checked = read_source(&source.path)
            .and_then(|text| transform_source(&text, &filename, &options, &env));
        match checked {
            Ok(transformed) => output::print_check_ok(&source.path, &transformed.stats),
            Err(e) => failures.push(e),
        }
    }

    let failed = failures.len();
    tracing::info!(failed, files = sources.len(), "check finished");
    // The last failure is rendered by `run`, after the others.
    let Some(last) = failures.pop() else {
        return Ok(());
    };
    for e in failures {
        output::report_error(e);
    }
    Err(last)
}

fn handle_aliases(config: &ConfigArgs) -> Result<(), MetalogError> {
    let options = load_options(config)?;
    output::print_aliases(options.normalize()?);
    Ok(())
}

fn handle_ast(file: &Path) -> Result<(), MetalogError> {
    let text = read_source(file)?;
    let tree = parse(&SourceContext::from_file(file.display().to_string(), text))?;
    let json = serde_json::to_string_pretty(&tree)
        .map_err(|e| err_msg!(Internal, "cannot serialize tree: {}", e).with_cause(e))?;
    println!("{}", json);
    Ok(())
}

// ============================================================================
// HELPERS
// ============================================================================

/// An input file and its path relative to the argument it was found under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub relative: PathBuf,
}

/// Expands the command-line paths: files are taken as-is, directories are
/// walked in name order for JavaScript sources.
pub fn collect_sources(paths: &[PathBuf]) -> Result<Vec<SourceFile>, MetalogError> {
    let mut sources = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = entry.map_err(|e| {
                    err_msg!(Resolution, "cannot walk '{}': {}", path.display(), e).with_cause(e)
                })?;
                if !entry.file_type().is_file() || !is_source_file(entry.path()) {
                    continue;
                }
                let relative = entry
                    .path()
                    .strip_prefix(path)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| entry.path().to_path_buf());
                sources.push(SourceFile {
                    path: entry.path().to_path_buf(),
                    relative,
                });
            }
        } else if path.is_file() {
            sources.push(SourceFile {
                path: path.clone(),
                relative: mirror_path(path),
            });
        } else {
            return Err(err_msg!(Resolution, "no such file or directory: '{}'", path.display()));
        }
    }
    tracing::debug!(files = sources.len(), "collected sources");
    Ok(sources)
}

/// Output location of a file argument under `--out-dir`: its relative path
/// as given, or only its file name when the path is absolute or climbs with `..`.
pub fn mirror_path(path: &Path) -> PathBuf {
    let mut mirrored = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => mirrored.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return path
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| path.to_path_buf());
            }
        }
    }
    mirrored
}

/// Two inputs may not be written to the same output file.
fn check_distinct_targets(sources: &[SourceFile]) -> Result<(), MetalogError> {
    let mut seen: HashMap<&Path, &Path> = HashMap::new();
    for source in sources {
        if let Some(first) = seen.insert(&source.relative, &source.path) {
            return Err(err_msg!(
                Resolution,
                "'{}' and '{}' would both be written to '{}'",
                first.display(),
                source.path.display(),
                source.relative.display()
            ));
        }
    }
    Ok(())
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Options from `--config`, then command-line overrides on top.
fn load_options(config: &ConfigArgs) -> Result<Options, MetalogError> {
    let mut options = match &config.config {
        Some(path) => Options::from_file(path)?,
        None => Options::new(),
    };
    if let Some(strip) = &config.strip {
        options = options.with_strip(Strip::from_arg(strip));
    }
    if let Some(name) = &config.log_function {
        options = options.with_log_function(name);
    }
    Ok(options)
}

fn load_environment(config: &ConfigArgs) -> Environment {
    let env = Environment::from_process();
    match &config.env_name {
        Some(name) => env.with_name(Some(name)),
        None => env,
    }
}

fn read_source(path: &Path) -> Result<String, MetalogError> {
    fs::read_to_string(path).map_err(|e| {
        err_msg!(Resolution, "cannot read '{}': {}", path.display(), e).with_cause(e)
    })
}

fn write_output(target: &Path, code: &str) -> Result<(), MetalogError> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            err_msg!(Resolution, "cannot create '{}': {}", parent.display(), e).with_cause(e)
        })?;
    }
    fs::write(target, code).map_err(|e| {
        err_msg!(Resolution, "cannot write '{}': {}", target.display(), e).with_cause(e)
    })?;
    tracing::debug!(path = %target.display(), "wrote output");
    Ok(())
}

fn accumulate(total: &mut Stats, stats: &Stats) {
    total.labels += stats.labels;
    total.calls += stats.calls;
    total.stripped += stats.stripped;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_extensions() {
        assert!(is_source_file(Path::new("a/b.js")));
        assert!(is_source_file(Path::new("b.mjs")));
        assert!(is_source_file(Path::new("b.cjs")));
        assert!(!is_source_file(Path::new("b.ts")));
        assert!(!is_source_file(Path::new("Makefile")));
    }

    #[test]
    fn file_arguments_mirror_their_relative_path() {
        assert_eq!(mirror_path(Path::new("a/x.js")), PathBuf::from("a/x.js"));
        assert_eq!(mirror_path(Path::new("./b/x.js")), PathBuf::from("b/x.js"));
        assert_eq!(mirror_path(Path::new("../x.js")), PathBuf::from("x.js"));
        assert_eq!(mirror_path(Path::new("/tmp/src/x.js")), PathBuf::from("x.js"));
    }

    #[test]
    fn colliding_targets_are_rejected() {
        let sources = vec![
            SourceFile {
                path: PathBuf::from("/one/x.js"),
                relative: PathBuf::from("x.js"),
            },
            SourceFile {
                path: PathBuf::from("/two/x.js"),
                relative: PathBuf::from("x.js"),
            },
        ];
        let err = check_distinct_targets(&sources).unwrap_err();
        assert_eq!(err.error_type(), crate::diagnostics::ErrorType::Resolution);
        assert!(check_distinct_targets(&sources[..1]).is_ok());
    }

    #[test]
    fn missing_path_is_a_resolution_error() {
        let err = collect_sources(&[PathBuf::from("definitely/not/here.js")]).unwrap_err();
        assert_eq!(err.error_type(), crate::diagnostics::ErrorType::Resolution);
    }
}
