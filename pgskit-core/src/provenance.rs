//! Tool-version provenance records.
//!
//! Every stage that drives plink2 records the tool's self-reported version
//! in a small versions.yml block, which the surrounding pipeline aggregates
//! for reproducibility auditing.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::environment::Environment;
use crate::exec;

/// Name of the external tool as reported in version records.
pub const TOOL_NAME: &str = "plink2";

/// File name the version block is written to.
pub const VERSIONS_FILE: &str = "versions.yml";

/// A two-field provenance record: which process ran, which tool version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRecord {
    pub process: String,
    pub version: String,
}

impl VersionRecord {
    /// Both fields must be non-empty; an empty record is useless downstream.
    pub fn new(process: &str, version: &str) -> Result<Self> {
        if process.trim().is_empty() {
            bail!("Version record process name is empty");
        }
        if version.trim().is_empty() {
            bail!("Version record version string is empty");
        }
        Ok(Self {
            process: process.to_string(),
            version: version.to_string(),
        })
    }

    /// Render the YAML block understood by the pipeline-wide aggregator.
    pub fn render(&self) -> String {
        format!("\"{}\":\n    {}: {}\n", self.process, TOOL_NAME, self.version)
    }

    /// Write the block to `versions.yml` under `dir`.
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(VERSIONS_FILE);
        let file = std::fs::File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        writer.write_all(self.render().as_bytes())?;
        writer.flush()?;
        Ok(path)
    }
}

/// Ask the tool for its version, through the resolved environment.
pub fn tool_version(env: &Environment, workdir: &Path) -> Result<String> {
    let argv = env.wrap(
        vec![TOOL_NAME.to_string(), "--version".to_string()],
        workdir,
    );
    let raw = exec::capture_stdout(&argv, workdir)?;
    parse_plink2_version(&raw)
}

/// Reduce plink2's version banner to the bare version string.
///
/// `"PLINK v2.00a3.3LM 64-bit Intel (3 Jun 2022)"` parses to `"2.00a3.3LM"`:
/// the leading tool-name prefix and everything from the bit-width annotation
/// onward are stripped.
pub fn parse_plink2_version(raw: &str) -> Result<String> {
    let line = raw.lines().next().unwrap_or("").trim();
    let stripped = line.strip_prefix("PLINK v").unwrap_or(line);
    let end = stripped
        .find(" 64-bit")
        .or_else(|| stripped.find(" 32-bit"))
        .unwrap_or(stripped.len());
    let version = stripped[..end].trim();
    if version.is_empty() {
        bail!("Could not parse a version from: {:?}", raw);
    }
    Ok(version.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plink2_version() {
        let raw = "PLINK v2.00a3.3LM 64-bit Intel (3 Jun 2022)\n";
        assert_eq!(parse_plink2_version(raw).unwrap(), "2.00a3.3LM");
    }

    #[test]
    fn test_parse_plink2_version_32_bit() {
        let raw = "PLINK v2.00a2.3 32-bit (24 Jan 2020)";
        assert_eq!(parse_plink2_version(raw).unwrap(), "2.00a2.3");
    }

    #[test]
    fn test_parse_plink2_version_no_annotation() {
        assert_eq!(parse_plink2_version("PLINK v2.0.0").unwrap(), "2.0.0");
    }

    #[test]
    fn test_parse_plink2_version_empty() {
        assert!(parse_plink2_version("").is_err());
        assert!(parse_plink2_version("PLINK v 64-bit").is_err());
    }

    #[test]
    fn test_record_fields_must_be_non_empty() {
        assert!(VersionRecord::new("", "2.0").is_err());
        assert!(VersionRecord::new("EXTRACT", " ").is_err());
        assert!(VersionRecord::new("EXTRACT", "2.0").is_ok());
    }

    #[test]
    fn test_render() {
        let record = VersionRecord::new("PGSKIT_EXTRACT", "2.00a3.3LM").unwrap();
        assert_eq!(
            record.render(),
            "\"PGSKIT_EXTRACT\":\n    plink2: 2.00a3.3LM\n"
        );
    }

    #[test]
    fn test_write() {
        let dir = tempfile::tempdir().unwrap();
        let record = VersionRecord::new("PGSKIT_EXTRACT", "2.00a3.3LM").unwrap();
        let path = record.write(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), VERSIONS_FILE);
        let written = std::fs::read_to_string(path).unwrap();
        assert_eq!(written, record.render());
    }
}
