//! Command-line arguments and subcommands for the `metalog` binary.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogLevel;

#[derive(Debug, Parser)]
#[command(
    name = "metalog",
    version,
    about = "Rewrites labeled log statements into metadata-carrying calls."
)]
pub struct MetalogArgs {
    /// Verbosity of metalog's own diagnostics (overridden by METALOG_LOG).
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command that rewrites files.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// Options file (.json, .yaml or .yml).
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Strip policy: `true`, `false` or an environment name.
    #[arg(long)]
    pub strip: Option<String>,

    /// Name of the global logging function.
    #[arg(long)]
    pub log_function: Option<String>,

    /// Current environment name, instead of NODE_ENV.
    #[arg(long = "env")]
    pub env_name: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rewrite files and print or write the result.
    Transform {
        /// Files or directories (walked for .js, .mjs and .cjs files).
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Write rewritten files here instead of printing them.
        #[arg(long, short)]
        out_dir: Option<PathBuf>,

        /// Print a line diff against the input instead of the code.
        #[arg(long, conflicts_with = "out_dir")]
        diff: bool,

        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Rewrite files without output, reporting every error.
    Check {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        config: ConfigArgs,
    },
    /// List the alias table the options produce.
    Aliases {
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Show the parsed program tree as JSON.
    Ast {
        #[arg(required = true)]
        file: PathBuf,
    },
}
