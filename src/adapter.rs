//! Bridges the command-line driver and the conversion library: every outcome,
//! including a panicking converter, comes back as a [`ConversionReport`].

use std::any::Any;
use std::error::Error as _;
use std::fmt::Write as _;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::converter::{ConversionOptions, ConversionResult};
use crate::error::{ConvertError, ErrorKind};
use crate::report::{ConversionReport, dotted_extension_of, file_name_of};

/// Convert an existing file and wrap the result in a report.
pub fn convert_path(path: &Path, options: &ConversionOptions) -> ConversionReport {
    let filename = file_name_of(path);
    let extension = dotted_extension_of(path);

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| crate::convert_file(path, options)));

    match outcome {
        Ok(Ok(result)) => {
            log_warnings(path, &result);
            let title = resolve_title(result.title.as_deref(), path);
            info!(path = %path.display(), bytes = result.markdown.len(), "converted");
            ConversionReport::converted(filename, extension, result.markdown, title)
        }
        Ok(Err(e)) => {
            info!(path = %path.display(), kind = %e.kind(), "conversion failed: {e}");
            ConversionReport::failed(
                Some(filename),
                Some(extension),
                e.kind(),
                e.to_string(),
                Some(traceback(&e, path)),
            )
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(path = %path.display(), "converter panicked: {message}");
            let trace = format!(
                "ConversionError: {}: {message}\n  while converting \"{}\"",
                ErrorKind::ConverterPanic,
                path.display()
            );
            ConversionReport::failed(
                Some(filename),
                Some(extension),
                ErrorKind::ConverterPanic,
                message,
                Some(trace),
            )
        }
    }
}

/// The library title when it has visible text, otherwise the file stem.
fn resolve_title(title: Option<&str>, path: &Path) -> String {
    match title.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

fn log_warnings(path: &Path, result: &ConversionResult) {
    for w in &result.warnings {
        match &w.location {
            Some(loc) => warn!(path = %path.display(), code = ?w.code, "{} ({loc})", w.message),
            None => warn!(path = %path.display(), code = ?w.code, "{}", w.message),
        }
    }
    debug!(count = result.warnings.len(), "conversion warnings");
}

/// Render an error and its source chain as a multi-line diagnostic.
fn traceback(err: &ConvertError, path: &Path) -> String {
    let mut out = format!(
        "ConversionError: {}: {err}\n  while converting \"{}\"",
        err.kind(),
        path.display()
    );

    let mut source = err.source();
    if source.is_some() {
        out.push_str("\nCaused by:");
    }
    let mut depth = 0;
    while let Some(cause) = source {
        let _ = write!(out, "\n    {depth}: {cause}");
        depth += 1;
        source = cause.source();
    }
    out
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "converter panicked".to_string()
    }
}
