//! Execution environment for the external genotyping tool.
//!
//! plink2 is never reimplemented; it runs natively, inside a container, or
//! from a conda environment. Which reference is used depends on the engine
//! and on whether the singularity run was asked to pull the registry image
//! instead of the prebuilt singularity one.

use std::path::Path;

use serde::Deserialize;

use anyhow::{bail, Result};

/// Pinned plink2 build, conda form.
pub const PLINK2_CONDA_SPEC: &str = "bioconda::plink2=2.00a3.3";

/// Pinned plink2 build, prebuilt singularity image.
pub const PLINK2_SINGULARITY_IMAGE: &str =
    "https://depot.galaxyproject.org/singularity/plink2:2.00a3.3--hb2a7ceb_0";

/// Pinned plink2 build, registry image.
pub const PLINK2_DOCKER_IMAGE: &str = "quay.io/biocontainers/plink2:2.00a3.3--hb2a7ceb_0";

/// Engine selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerEngine {
    #[serde(alias = "none")]
    Native,
    Docker,
    Singularity,
    Conda,
}

impl ContainerEngine {
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "native" | "none" => Ok(Self::Native),
            "docker" => Ok(Self::Docker),
            "singularity" => Ok(Self::Singularity),
            "conda" => Ok(Self::Conda),
            other => bail!("Unknown container engine: {}", other),
        }
    }
}

/// A resolved environment: the engine plus the reference it will use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Native,
    Docker { image: String },
    Singularity { image: String },
    Conda { spec: String },
}

/// Pick the environment reference for the configured engine.
///
/// Under singularity the prebuilt image is preferred; setting
/// `singularity_pull_docker_container` falls back to the registry image,
/// which singularity pulls through its docker:// scheme at run time.
pub fn resolve(engine: ContainerEngine, singularity_pull_docker_container: bool) -> Environment {
    match engine {
        ContainerEngine::Native => Environment::Native,
        ContainerEngine::Docker => Environment::Docker {
            image: PLINK2_DOCKER_IMAGE.to_string(),
        },
        ContainerEngine::Singularity => {
            let image = if singularity_pull_docker_container {
                PLINK2_DOCKER_IMAGE.to_string()
            } else {
                PLINK2_SINGULARITY_IMAGE.to_string()
            };
            Environment::Singularity { image }
        }
        ContainerEngine::Conda => Environment::Conda {
            spec: PLINK2_CONDA_SPEC.to_string(),
        },
    }
}

impl Environment {
    /// The image or package reference this environment resolves to, if any.
    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::Native => None,
            Self::Docker { image } | Self::Singularity { image } => Some(image),
            Self::Conda { spec } => Some(spec),
        }
    }

    /// Wrap a tool invocation in the launcher for this environment.
    ///
    /// Containers get the working directory bind-mounted so staged inputs
    /// and outputs resolve to the same paths inside and out.
    pub fn wrap(&self, argv: Vec<String>, workdir: &Path) -> Vec<String> {
        let dir = workdir.display().to_string();
        match self {
            Self::Native => argv,
            Self::Docker { image } => {
                let mut wrapped = vec![
                    "docker".to_string(),
                    "run".to_string(),
                    "--rm".to_string(),
                    "-v".to_string(),
                    format!("{dir}:{dir}"),
                    "-w".to_string(),
                    dir,
                    image.clone(),
                ];
                wrapped.extend(argv);
                wrapped
            }
            Self::Singularity { image } => {
                let source = if image.starts_with("https://") || image.starts_with("docker://") {
                    image.clone()
                } else {
                    format!("docker://{image}")
                };
                let mut wrapped = vec![
                    "singularity".to_string(),
                    "exec".to_string(),
                    "--bind".to_string(),
                    dir,
                    source,
                ];
                wrapped.extend(argv);
                wrapped
            }
            Self::Conda { spec } => {
                let mut wrapped = vec![
                    "conda".to_string(),
                    "run".to_string(),
                    "-n".to_string(),
                    conda_env_name(spec),
                ];
                wrapped.extend(argv);
                wrapped
            }
        }
    }
}

/// Environment name derived from a package spec:
/// `bioconda::plink2=2.00a3.3` becomes `plink2-2.00a3.3`.
pub fn conda_env_name(spec: &str) -> String {
    let without_channel = spec.rsplit("::").next().unwrap_or(spec);
    without_channel.replace(['=', ' '], "-")
}
