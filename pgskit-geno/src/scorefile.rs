//! Combined scoring file parser.
//!
//! One tab-separated table holding every scoring file merged upstream, one
//! row per (variant, accession). Columns: chr_name, chr_position,
//! effect_allele, other_allele, effect_weight, effect_type, accession.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// One row of the combined scoring file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoreRecord {
    pub chr_name: String,
    pub chr_position: u64,
    pub effect_allele: String,
    pub other_allele: String,
    pub effect_weight: f64,
    pub effect_type: String,
    pub accession: String,
}

/// How a variant's weight contributes to the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EffectType {
    Additive,
    Dominant,
    Recessive,
}

impl EffectType {
    /// Parse the effect_type column. Upstream encodes dominant and
    /// recessive effects as boolean flag columns, hence the `is_` forms.
    pub fn from_column(value: &str) -> Result<Self> {
        match value {
            "additive" => Ok(Self::Additive),
            "is_dominant" | "dominant" => Ok(Self::Dominant),
            "is_recessive" | "recessive" => Ok(Self::Recessive),
            other => bail!("Unknown effect type: {}", other),
        }
    }

    /// Label used in output scorefile names.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Additive => "additive",
            Self::Dominant => "dominant",
            Self::Recessive => "recessive",
        }
    }
}

/// Read a combined scoring file.
pub fn read_scorefile(path: &Path) -> Result<Vec<ScoreRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("Failed to open scoring file: {}", path.display()))?;

    let mut records = Vec::new();
    for (row, result) in reader.deserialize().enumerate() {
        let record: ScoreRecord = result
            .with_context(|| format!("Bad scoring row {} in {}", row + 2, path.display()))?;
        // Fail early on unknown effect types rather than at write-out time
        EffectType::from_column(&record.effect_type)?;
        records.push(record);
    }
    Ok(records)
}
