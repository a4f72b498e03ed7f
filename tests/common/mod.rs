#![allow(dead_code)]

use std::io::{Cursor, Write};

use assert_cmd::Command;
use serde_json::Value;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub fn cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("docmd"));
    for var in ["DOCMD_LOG", "DOCMD_STRICT", "DOCMD_MAX_INPUT_BYTES"] {
        cmd.env_remove(var);
    }
    cmd
}

/// Parse the single JSON document printed on stdout.
pub fn parse_report(stdout: &[u8]) -> Value {
    let text = std::str::from_utf8(stdout).expect("stdout is UTF-8");
    assert!(text.ends_with('\n'), "report must end with a newline");
    serde_json::from_str(text.trim_end()).expect("stdout is one JSON document")
}

/// Exactly one of `markdown_content` and `error` is set, and it agrees with `success`.
pub fn assert_exclusive(report: &Value) {
    let has_content = report["markdown_content"].is_string();
    let has_error = report["error"].is_object();
    assert_ne!(has_content, has_error, "report: {report}");
    assert_eq!(report["success"].as_bool(), Some(has_content));
}

/// Build an in-memory ZIP from `(name, body)` pairs.
pub fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Normalize whitespace for comparison: trim line ends, collapse runs of
/// blank lines, strip the trailing newline.
pub fn normalize(s: &str) -> String {
    let mut result = String::new();
    let mut prev_blank = false;
    for line in s.lines().map(str::trim_end) {
        let is_blank = line.is_empty();
        if is_blank && prev_blank {
            continue;
        }
        result.push_str(line);
        result.push('\n');
        prev_blank = is_blank;
    }
    result.trim_end().to_string()
}
