//! Stage configuration.
//!
//! A JSON file carries the per-run settings (`--config`); individual CLI
//! flags override single fields on top of it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::environment::ContainerEngine;
use crate::publish::PublishMode;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StageConfig {
    /// Root of the published output tree.
    pub outdir: PathBuf,
    /// How outputs are materialised under outdir.
    pub publish_mode: PublishMode,
    /// Execution engine for the external tool.
    pub engine: ContainerEngine,
    /// Under singularity, pull the registry image instead of the prebuilt one.
    pub singularity_pull_docker_container: bool,
    /// Threads handed to the external tool and the local pool.
    pub threads: usize,
    /// Optional suffix appended to the sampleset id in output prefixes.
    pub suffix: Option<String>,
    /// Extra tokens passed through to the tool verbatim.
    pub extra_args: Vec<String>,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            outdir: PathBuf::from("results"),
            publish_mode: PublishMode::Copy,
            engine: ContainerEngine::Native,
            singularity_pull_docker_container: false,
            threads: 1,
            suffix: None,
            extra_args: Vec::new(),
        }
    }
}

impl StageConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }
}
