//! Document output
//!
//! Stdout carries only the generated Secret; logs go to stderr.

use anyhow::{Context, Result};
use extsecret_core::Secret;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Yaml,
    Json,
}

/// Serialize the Secret in the requested format
pub fn render(secret: &Secret, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => {
            serde_yaml_ng::to_string(secret).context("Failed to serialize Secret as YAML")
        }
        OutputFormat::Json => {
            let mut json =
                serde_json::to_string_pretty(secret).context("Failed to serialize Secret as JSON")?;
            json.push('\n');
            Ok(json)
        }
    }
}

/// Write the Secret to the given writer
pub fn write_secret<W: Write>(writer: &mut W, secret: &Secret, format: OutputFormat) -> Result<()> {
    let document = render(secret, format)?;
    writer
        .write_all(document.as_bytes())
        .context("Failed to write Secret")?;
    writer.flush().context("Failed to flush output")
}
