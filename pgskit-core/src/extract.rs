//! Variant-subset extraction.
//!
//! Drives one synchronous plink2 run: take a bed/bim/fam fileset and a
//! variant inclusion list, emit the filtered fileset under a fixed naming
//! convention, record the tool version, publish the declared outputs.
//! Retry policy on failure belongs to the caller.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tracing::info;

use pgskit_geno::{BedFileset, VariantList};

use crate::config::StageConfig;
use crate::environment::{self, Environment};
use crate::exec;
use crate::provenance::{self, VersionRecord};
use crate::publish;

/// Process name recorded in versions.yml.
pub const PROCESS_NAME: &str = "PGSKIT_EXTRACT";

/// Suffix on the plink2 output prefix; outputs become `<prefix>.extract.*`.
pub const OUTPUT_TAG: &str = "extract";

/// Resource hint for schedulers wrapping this stage. Extraction is I/O
/// bound inside the external tool.
pub const RESOURCE_LABEL: &str = "low";

/// Sample metadata: an identifier plus passthrough attributes.
///
/// The attributes are never interpreted here; they ride along so downstream
/// steps can correlate outputs with their inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleMeta {
    pub id: String,
    pub attrs: BTreeMap<String, String>,
}

impl SampleMeta {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            attrs: BTreeMap::new(),
        }
    }

    /// Output prefix: the identifier, with the configured suffix appended
    /// when one is set.
    pub fn output_prefix(&self, suffix: Option<&str>) -> String {
        match suffix {
            Some(s) => format!("{}{}", self.id, s),
            None => self.id.clone(),
        }
    }
}

/// Declared outputs of one extraction: exactly two genotype handles plus
/// one version-report handle. The regenerated .fam stays in the work
/// directory; variant extraction leaves samples unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOutputs {
    pub bed: PathBuf,
    pub bim: PathBuf,
    pub versions: PathBuf,
}

/// One extraction task.
#[derive(Debug, Clone)]
pub struct ExtractStage {
    pub meta: SampleMeta,
    pub fileset: BedFileset,
    pub variant_list: PathBuf,
}

impl ExtractStage {
    /// Tag identifying this task in logs, keyed by the sampleset.
    pub fn tag(&self) -> &str {
        &self.meta.id
    }

    /// The plink2 argv for this stage, before environment wrapping.
    ///
    /// Fixed operation (extract by inclusion list) and fixed output mode
    /// (binary fileset); only threads, passthrough args, and the output
    /// prefix vary.
    pub fn command(&self, cfg: &StageConfig) -> Vec<String> {
        let prefix = self.meta.output_prefix(cfg.suffix.as_deref());
        let mut argv = vec![
            provenance::TOOL_NAME.to_string(),
            "--threads".to_string(),
            cfg.threads.to_string(),
            "--bfile".to_string(),
            self.fileset.stem().display().to_string(),
        ];
        argv.extend(cfg.extra_args.iter().cloned());
        argv.extend([
            "--extract".to_string(),
            self.variant_list.display().to_string(),
            "--make-bed".to_string(),
            "--out".to_string(),
            format!("{prefix}.{OUTPUT_TAG}"),
        ]);
        argv
    }

    /// The fully wrapped invocation, as it would run.
    pub fn wrapped_command(&self, cfg: &StageConfig, workdir: &Path) -> (Environment, Vec<String>) {
        let env = environment::resolve(cfg.engine, cfg.singularity_pull_docker_container);
        let argv = env.wrap(self.command(cfg), workdir);
        (env, argv)
    }

    /// Output handles this stage declares under `workdir`.
    pub fn expected_outputs(&self, cfg: &StageConfig, workdir: &Path) -> ExtractOutputs {
        let prefix = self.meta.output_prefix(cfg.suffix.as_deref());
        ExtractOutputs {
            bed: workdir.join(format!("{prefix}.{OUTPUT_TAG}.bed")),
            bim: workdir.join(format!("{prefix}.{OUTPUT_TAG}.bim")),
            versions: workdir.join(provenance::VERSIONS_FILE),
        }
    }

    /// Run the extraction: preflight, invoke, record provenance, publish.
    pub fn run(&self, cfg: &StageConfig, workdir: &Path) -> Result<ExtractOutputs> {
        info!(
            "Extract [{}] (label={}, threads={})",
            self.tag(),
            RESOURCE_LABEL,
            cfg.threads
        );

        let summary = self.fileset.validate()?;
        info!(
            "Fileset {}: {} variants x {} samples",
            self.fileset.stem().display(),
            summary.n_variants,
            summary.n_samples
        );
        let keep = VariantList::read(&self.variant_list)?;
        if keep.is_empty() {
            bail!(
                "Variant inclusion list is empty: {}",
                self.variant_list.display()
            );
        }
        info!("Extracting {} listed variants", keep.len());

        let (env, argv) = self.wrapped_command(cfg, workdir);
        info!("Running: {}", exec::display(&argv));
        exec::run_checked(&argv, workdir)?;

        let version = provenance::tool_version(&env, workdir)?;
        let record = VersionRecord::new(PROCESS_NAME, &version)?;
        let versions = record.write(workdir)?;
        info!("{} {}", provenance::TOOL_NAME, version);

        let outputs = self.expected_outputs(cfg, workdir);
        for path in [&outputs.bed, &outputs.bim] {
            if !path.is_file() {
                bail!("Expected output missing after extraction: {}", path.display());
            }
        }

        let published = publish::publish(
            &[outputs.bed.clone(), outputs.bim.clone(), versions],
            &cfg.outdir,
            &self.meta.id,
            cfg.publish_mode,
        )?;
        for path in &published {
            info!("Published {}", path.display());
        }

        Ok(outputs)
    }
}
