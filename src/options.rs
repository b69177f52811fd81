//! Settings read from the `EXPLAIN_OPTIONS` environment variable.
//!
//! The value is a comma-separated list of `key=value` pairs, for example
//! `width=72,format=json`. Command-line flags take precedence.

use anyhow::{Context, Result, anyhow};

use crate::formatter::OutputFormat;

pub const ENV_VAR: &str = "EXPLAIN_OPTIONS";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct EnvOptions {
    pub width: Option<usize>,
    pub format: Option<OutputFormat>,
}

pub fn parse(text: &str) -> Result<EnvOptions> {
    let mut options = EnvOptions::default();
    for item in text.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (key, value) = item.split_once('=').unwrap_or((item, ""));
        match key.trim().to_lowercase().as_str() {
            "width" => {
                let width = value
                    .trim()
                    .parse()
                    .with_context(|| format!("{ENV_VAR}: invalid width \"{value}\""))?;
                options.width = Some(width);
            }
            "format" => {
                let format = value
                    .trim()
                    .parse()
                    .map_err(|e: String| anyhow!("{ENV_VAR}: {e}"))?;
                options.format = Some(format);
            }
            other => log::warn!("{ENV_VAR}: ignoring unknown option \"{other}\""),
        }
    }
    Ok(options)
}

/// Options from the environment; unset means all defaults.
pub fn from_env() -> Result<EnvOptions> {
    match std::env::var(ENV_VAR) {
        Ok(text) => parse(&text),
        Err(_) => Ok(EnvOptions::default()),
    }
}
