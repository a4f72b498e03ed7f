//! Environment-driven settings.

use std::str::FromStr;

use tracing::level_filters::LevelFilter;

use crate::converter::{ConversionOptions, DEFAULT_MAX_INPUT_BYTES};

pub const LOG_VAR: &str = "DOCMD_LOG";
pub const STRICT_VAR: &str = "DOCMD_STRICT";
pub const MAX_INPUT_BYTES_VAR: &str = "DOCMD_MAX_INPUT_BYTES";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub log_level: LevelFilter,
    pub strict: bool,
    pub max_input_bytes: u64,
    /// Values that were present but unusable. Reported once logging is up.
    pub issues: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LevelFilter::WARN,
            strict: false,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            issues: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; unset or invalid values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(LOG_VAR) {
            match LevelFilter::from_str(raw.trim()) {
                Ok(level) => config.log_level = level,
                Err(_) => config
                    .issues
                    .push(format!("{LOG_VAR}={raw:?} is not a log level; using warn")),
            }
        }

        if let Some(raw) = lookup(STRICT_VAR) {
            match parse_flag(&raw) {
                Some(flag) => config.strict = flag,
                None => config
                    .issues
                    .push(format!("{STRICT_VAR}={raw:?} is not a boolean; strict mode off")),
            }
        }

        if let Some(raw) = lookup(MAX_INPUT_BYTES_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(limit) if limit > 0 => config.max_input_bytes = limit,
                _ => config.issues.push(format!(
                    "{MAX_INPUT_BYTES_VAR}={raw:?} is not a positive integer; using {DEFAULT_MAX_INPUT_BYTES}"
                )),
            }
        }

        config
    }

    pub fn conversion_options(&self) -> ConversionOptions {
        ConversionOptions {
            strict: self.strict,
            max_input_bytes: self.max_input_bytes,
        }
    }

    /// Emit a warning for every rejected value.
    pub fn report_issues(&self) {
        for issue in &self.issues {
            tracing::warn!("{issue}");
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
