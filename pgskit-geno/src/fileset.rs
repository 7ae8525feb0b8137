//! Typed PLINK bed/bim/fam fileset.
//!
//! PLINK binary data is split over three co-located files sharing one base
//! name:
//! - .bed: binary genotype data (2 bits per genotype, packed)
//! - .bim: variant information (chrom, id, cm, pos, a1, a2)
//! - .fam: sample information (fid, iid, father, mother, sex, pheno)
//!
//! plink2 addresses the triplet through the shared prefix (`--bfile`), so a
//! renamed member silently breaks the tool. The fileset is therefore modelled
//! as a single value holding the stem; constructing one from explicit paths
//! fails unless they collapse to the same stem.
//!
//! Reference: https://www.cog-genomics.org/plink/1.9/formats#bed

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use memmap2::Mmap;

/// First two bytes of a valid .bed file.
pub const BED_MAGIC: [u8; 2] = [0x6C, 0x1B];

/// Mode byte for SNP-major (variant-major) .bed files.
pub const SNP_MAJOR_MODE: u8 = 0x01;

/// A PLINK bed/bim/fam triplet, addressed by its shared stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BedFileset {
    stem: PathBuf,
}

/// Counts gathered while validating a fileset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilesetSummary {
    pub n_samples: usize,
    pub n_variants: usize,
}

impl BedFileset {
    /// Open a fileset from a shared prefix (without extension).
    /// Errors if any of the three member files is missing.
    pub fn from_prefix<P: AsRef<Path>>(stem: P) -> Result<Self> {
        let fileset = Self {
            stem: stem.as_ref().to_path_buf(),
        };
        for path in [fileset.bed(), fileset.bim(), fileset.fam()] {
            if !path.is_file() {
                bail!("Fileset member missing: {}", path.display());
            }
        }
        Ok(fileset)
    }

    /// Open a fileset from three explicit paths.
    ///
    /// All three must share one directory and base name; a mismatched
    /// triplet is rejected here instead of failing inside the external tool.
    pub fn from_parts<P: AsRef<Path>>(bed: P, bim: P, fam: P) -> Result<Self> {
        let members = [
            (bed.as_ref(), "bed"),
            (bim.as_ref(), "bim"),
            (fam.as_ref(), "fam"),
        ];
        for (path, ext) in &members {
            match path.extension().and_then(|e| e.to_str()) {
                Some(found) if found == *ext => {}
                _ => bail!("Expected a .{} file, got {}", ext, path.display()),
            }
        }
        let stems: Vec<PathBuf> = members
            .iter()
            .map(|(path, _)| path.with_extension(""))
            .collect();
        if stems[1] != stems[0] || stems[2] != stems[0] {
            bail!(
                "Fileset members do not share a base name: {}, {}, {}",
                members[0].0.display(),
                members[1].0.display(),
                members[2].0.display()
            );
        }
        Self::from_prefix(&stems[0])
    }

    /// Shared prefix of the three member files.
    pub fn stem(&self) -> &Path {
        &self.stem
    }

    pub fn bed(&self) -> PathBuf {
        self.stem.with_extension("bed")
    }

    pub fn bim(&self) -> PathBuf {
        self.stem.with_extension("bim")
    }

    pub fn fam(&self) -> PathBuf {
        self.stem.with_extension("fam")
    }

    /// Number of variants, from the .bim line count.
    pub fn variant_count(&self) -> Result<usize> {
        count_lines(&self.bim())
    }

    /// Number of samples, from the .fam line count.
    pub fn sample_count(&self) -> Result<usize> {
        count_lines(&self.fam())
    }

    /// Preflight consistency check before handing the fileset to plink2.
    ///
    /// Verifies the .bed magic number, the SNP-major mode byte, and that the
    /// .bed size is consistent with the .bim and .fam counts.
    pub fn validate(&self) -> Result<FilesetSummary> {
        let n_samples = self.sample_count()?;
        let n_variants = self.variant_count()?;

        let bed_path = self.bed();
        let bed_file = std::fs::File::open(&bed_path)
            .with_context(|| format!("Failed to open bed file: {}", bed_path.display()))?;
        let mmap = unsafe { Mmap::map(&bed_file)? };

        if mmap.len() < 3 {
            bail!("Bed file too small: {}", bed_path.display());
        }
        if mmap[0] != BED_MAGIC[0] || mmap[1] != BED_MAGIC[1] {
            bail!("Invalid PLINK bed file magic number: {}", bed_path.display());
        }
        if mmap[2] != SNP_MAJOR_MODE {
            bail!(
                "Only SNP-major bed files are supported (mode byte = 0x01): {}",
                bed_path.display()
            );
        }

        let bytes_per_variant = n_samples.div_ceil(4);
        let expected_size = 3 + bytes_per_variant * n_variants;
        if mmap.len() < expected_size {
            bail!(
                "Bed file too small for {} variants x {} samples: expected at least {} bytes, got {}",
                n_variants,
                n_samples,
                expected_size,
                mmap.len()
            );
        }

        Ok(FilesetSummary {
            n_samples,
            n_variants,
        })
    }
}

fn count_lines(path: &Path) -> Result<usize> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(contents.lines().filter(|l| !l.trim().is_empty()).count())
}
