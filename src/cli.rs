//! Command-line driver: argument validation, existence check, and the choice
//! of output layout and exit code. Nothing here prints.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

use crate::adapter;
use crate::config::Config;
use crate::report::ConversionReport;

/// Convert one document to Markdown and print a JSON report.
#[derive(Debug, Parser)]
#[command(
    name = "docmd",
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Args {
    /// File to convert.
    #[arg(allow_hyphen_values = true)]
    file: OsString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Single line, used for driver validation failures.
    Compact,
    /// Two-space indentation, used for adapter reports.
    Pretty,
}

#[derive(Debug)]
pub struct Outcome {
    pub report: ConversionReport,
    pub layout: Layout,
    pub exit_code: u8,
}

impl Outcome {
    /// Failures caught before conversion are compact and exit 1; every
    /// adapter report is pretty and exits 0.
    fn from_report(report: ConversionReport) -> Self {
        let precondition = report
            .error
            .as_ref()
            .is_some_and(|e| e.kind.is_precondition());
        if precondition {
            Outcome {
                report,
                layout: Layout::Compact,
                exit_code: 1,
            }
        } else {
            Outcome {
                report,
                layout: Layout::Pretty,
                exit_code: 0,
            }
        }
    }

    pub fn render(&self) -> serde_json::Result<String> {
        match self.layout {
            Layout::Compact => self.report.to_compact(),
            Layout::Pretty => self.report.to_pretty(),
        }
    }
}

/// Decide the report for one invocation. `args` includes the program name.
pub fn run<I, T>(args: I, config: &Config) -> Outcome
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let raw: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let [program, file] = raw.as_slice() else {
        tracing::debug!(count = raw.len().saturating_sub(1), "wrong argument count");
        return Outcome::from_report(ConversionReport::argument_error());
    };

    // Exactly one argument, taken verbatim: `--` and `-x` are file names too.
    let args = match Args::try_parse_from([program.clone(), "--".into(), file.clone()]) {
        Ok(args) => args,
        Err(e) => {
            tracing::debug!(kind = ?e.kind(), "rejected arguments");
            return Outcome::from_report(ConversionReport::argument_error());
        }
    };

    // An empty argument names the current directory.
    let path = if args.file.is_empty() {
        PathBuf::from(".")
    } else {
        PathBuf::from(args.file)
    };

    // `exists` follows symlinks, so a dangling link counts as missing.
    if !path.exists() {
        return Outcome::from_report(ConversionReport::file_not_found(&path));
    }

    Outcome::from_report(adapter::convert_path(&path, &config.conversion_options()))
}
