//! plink2 `--score` scorefile output.
//!
//! Matched variants are written as one table per (effect type, duplicate
//! set), optionally split per chromosome. Layout: `ID`, `effect_allele`,
//! then one weight column per accession, with missing weights filled with
//! zero so every accession can be scored in a single pass.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use pgskit_geno::EffectType;

use super::{split_duplicates, MatchedVariant};

/// Chromosome key used when per-chromosome splitting is off.
const ALL_CHROMS: &str = "all";

/// Write every scorefile for `matches` into `outdir`.
/// Returns the written paths.
pub fn write_scorefiles(
    matches: &[MatchedVariant],
    outdir: &Path,
    split_by_chrom: bool,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(outdir)
        .with_context(|| format!("Failed to create {}", outdir.display()))?;

    // Group by effect type first: plink2 applies one model per scorefile
    let mut by_effect: Vec<(EffectType, Vec<&MatchedVariant>)> = Vec::new();
    for m in matches {
        let effect = EffectType::from_column(&m.score.effect_type)?;
        match by_effect.iter_mut().find(|(e, _)| *e == effect) {
            Some((_, rows)) => rows.push(m),
            None => by_effect.push((effect, vec![m])),
        }
    }
    by_effect.sort_by_key(|(e, _)| *e);

    let mut written = Vec::new();
    for (effect, rows) in &by_effect {
        let split = split_duplicates(rows.iter().copied());
        for (set_name, set_rows) in [("first", &split.first), ("dup", &split.dup)] {
            if set_rows.is_empty() {
                continue;
            }
            for (chrom, chrom_rows) in group_by_chrom(set_rows, split_by_chrom) {
                let name = format!("{}_{}_{}.scorefile", chrom, effect.label(), set_name);
                let path = outdir.join(name);
                write_table(&chrom_rows, &path)?;
                debug!("Wrote {} ({} rows)", path.display(), chrom_rows.len());
                written.push(path);
            }
        }
    }

    info!("Wrote {} scorefiles to {}", written.len(), outdir.display());
    Ok(written)
}

fn group_by_chrom<'a>(
    rows: &[&'a MatchedVariant],
    split_by_chrom: bool,
) -> Vec<(String, Vec<&'a MatchedVariant>)> {
    let mut groups: Vec<(String, Vec<&'a MatchedVariant>)> = Vec::new();
    for &row in rows {
        let key = if split_by_chrom {
            row.score.chr_name.as_str()
        } else {
            ALL_CHROMS
        };
        match groups.iter_mut().find(|(k, _)| k.as_str() == key) {
            Some((_, group)) => group.push(row),
            None => groups.push((key.to_string(), vec![row])),
        }
    }
    groups
}

/// Pivot rows to the plink2 layout and write one tab-separated table.
fn write_table(rows: &[&MatchedVariant], path: &Path) -> Result<()> {
    // Accessions and (ID, effect allele) pairs keep first-seen order
    let mut accessions: Vec<&str> = Vec::new();
    let mut order: Vec<(&str, &str)> = Vec::new();
    let mut weights: HashMap<(&str, &str), HashMap<&str, f64>> = HashMap::new();

    for row in rows {
        let accession = row.score.accession.as_str();
        if !accessions.contains(&accession) {
            accessions.push(accession);
        }
        let key = (row.target_id.as_str(), row.score.effect_allele.as_str());
        let entry = weights.entry(key).or_insert_with(|| {
            order.push(key);
            HashMap::new()
        });
        // First weight wins if one accession repeats a variant
        entry.entry(accession).or_insert(row.score.effect_weight);
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let mut header = vec!["ID", "effect_allele"];
    header.extend(accessions.iter().copied());
    writer.write_record(&header)?;

    for key in &order {
        let row_weights = &weights[key];
        let mut record = vec![key.0.to_string(), key.1.to_string()];
        for accession in &accessions {
            let weight = row_weights.get(accession).copied().unwrap_or(0.0);
            record.push(format!("{weight}"));
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}
