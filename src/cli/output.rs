//! User-facing output for the CLI.

use std::io::Write;
use std::path::Path;

use difference::{Changeset, Difference};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::aliases::AliasTable;
use crate::transform::Stats;
use crate::MetalogError;

// ============================================================================
// CORE OUTPUT FUNCTIONS
// ============================================================================

/// Prints a coloured line diff between the input and the rewritten code.
pub fn print_diff(path: &Path, before: &str, after: &str) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true));
    let _ = writeln!(stdout, "--- {}", path.display());
    let _ = stdout.reset();

    let changeset = Changeset::new(before.trim_end(), after.trim_end(), "\n");
    write_diff(&mut stdout, &changeset.diffs);
    let _ = stdout.reset();
}

/// Prints rewritten code to stdout.
/// Separator line naming the file whose code follows.
pub fn print_code_header(path: &Path) {
    let mut stdout = StandardStream::stdout(ColorChoice::Never);
    let _ = writeln!(stdout, "// {}", path.display());
}

pub fn print_code(code: &str) {
    let mut stdout = StandardStream::stdout(ColorChoice::Never);
    let _ = write!(stdout, "{}", code);
}

/// One-line totals on stderr.
pub fn print_summary(files: usize, stats: &Stats) {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true));
    let _ = write!(stderr, "metalog");
    let _ = stderr.reset();
    let _ = writeln!(
        stderr,
        ": {} file(s), {} label(s), {} call(s), {} stripped",
        files, stats.labels, stats.calls, stats.stripped
    );
}

pub fn print_check_ok(path: &Path, stats: &Stats) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
    let _ = write!(stdout, "ok");
    let _ = stdout.reset();
    let _ = writeln!(stdout, "   {} ({} label(s))", path.display(), stats.labels);
}

pub fn print_aliases(table: &AliasTable) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let width = table.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, synth) in table.iter() {
        let _ = stdout.set_color(ColorSpec::new().set_bold(true));
        let _ = write!(stdout, "{:width$}", name, width = width);
        let _ = stdout.reset();
        let _ = writeln!(stdout, "  {}", synth.describe());
    }
}

/// Renders an error with miette's graphical handler on stderr.
pub fn report_error(error: MetalogError) {
    eprintln!("{:?}", miette::Report::new(error));
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn write_diff(stdout: &mut StandardStream, diffs: &[Difference]) {
    for diff in diffs {
        match diff {
            Difference::Same(ref x) => {
                let _ = stdout.reset();
                for line in x.lines() {
                    let _ = writeln!(stdout, " {}", line);
                }
            }
            Difference::Add(ref x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
                for line in x.lines() {
                    let _ = writeln!(stdout, "+{}", line);
                }
            }
            Difference::Rem(ref x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
                for line in x.lines() {
                    let _ = writeln!(stdout, "-{}", line);
                }
            }
        }
    }
}
