//! Output publishing.
//!
//! Stage outputs land in a working directory; publishing copies or links
//! them into `<outdir>/<sampleset>/` for downstream consumers.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::debug;

/// How outputs are materialised in the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishMode {
    Copy,
    Symlink,
    Hardlink,
    Move,
}

impl PublishMode {
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "copy" => Ok(Self::Copy),
            "symlink" => Ok(Self::Symlink),
            "hardlink" => Ok(Self::Hardlink),
            "move" => Ok(Self::Move),
            other => bail!("Unknown publish mode: {}", other),
        }
    }
}

/// Publish `files` into `<outdir>/<sampleset>/`, replacing existing entries.
/// Returns the published paths in input order.
pub fn publish(
    files: &[PathBuf],
    outdir: &Path,
    sampleset: &str,
    mode: PublishMode,
) -> Result<Vec<PathBuf>> {
    let dest_dir = outdir.join(sampleset);
    fs::create_dir_all(&dest_dir)
        .with_context(|| format!("Failed to create {}", dest_dir.display()))?;

    let mut published = Vec::with_capacity(files.len());
    for src in files {
        let name = src
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Not a file path: {}", src.display()))?;
        let dest = dest_dir.join(name);
        if dest.symlink_metadata().is_ok() {
            fs::remove_file(&dest)
                .with_context(|| format!("Failed to replace {}", dest.display()))?;
        }
        materialise(src, &dest, mode)
            .with_context(|| format!("Failed to publish {}", src.display()))?;
        debug!("Published {} -> {}", src.display(), dest.display());
        published.push(dest);
    }
    Ok(published)
}

fn materialise(src: &Path, dest: &Path, mode: PublishMode) -> Result<()> {
    match mode {
        PublishMode::Copy => {
            fs::copy(src, dest)?;
        }
        PublishMode::Symlink => {
            // Absolute target so the link survives outdir relocation
            let target = src.canonicalize()?;
            std::os::unix::fs::symlink(target, dest)?;
        }
        PublishMode::Hardlink => {
            fs::hard_link(src, dest)?;
        }
        PublishMode::Move => {
            // rename fails across filesystems; fall back to copy + remove
            if fs::rename(src, dest).is_err() {
                fs::copy(src, dest)?;
                fs::remove_file(src)?;
            }
        }
    }
    Ok(())
}
