//! Target variant tables (.bim / .pvar) and variant inclusion lists.
//!
//! A target table lists the variants present in a genotype fileset; the
//! matcher joins scoring files against it. An inclusion list is the flat
//! one-ID-per-line file plink2 consumes through `--extract`.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// On-disk format of a target variant table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    /// PLINK 1 .bim: six whitespace-separated columns, no header.
    Bim,
    /// PLINK 2 .pvar: tab-separated with a #CHROM header line.
    Pvar,
}

/// One variant from a target table.
///
/// For .bim input the fifth column is taken as REF and the sixth as ALT,
/// matching how the scoring pipeline treats target alleles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetVariant {
    pub chrom: String,
    pub pos: u64,
    pub id: String,
    pub ref_allele: String,
    pub alt_allele: String,
}

/// Read a target variant table.
pub fn read_target(path: &Path, format: TargetFormat) -> Result<Vec<TargetVariant>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read target variants: {}", path.display()))?;
    match format {
        TargetFormat::Bim => parse_bim(&contents, path),
        TargetFormat::Pvar => parse_pvar(&contents, path),
    }
}

fn parse_bim(contents: &str, path: &Path) -> Result<Vec<TargetVariant>> {
    let mut variants = Vec::new();
    for (line_num, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 6 {
            bail!(
                "Bim line {} of {} has fewer than 6 fields",
                line_num + 1,
                path.display()
            );
        }
        variants.push(TargetVariant {
            chrom: fields[0].to_string(),
            id: fields[1].to_string(),
            pos: fields[3].parse().with_context(|| {
                format!("Bad position on bim line {} of {}", line_num + 1, path.display())
            })?,
            ref_allele: fields[4].to_string(),
            alt_allele: fields[5].to_string(),
        });
    }
    Ok(variants)
}

fn parse_pvar(contents: &str, path: &Path) -> Result<Vec<TargetVariant>> {
    let mut lines = contents
        .lines()
        .filter(|l| !l.starts_with("##") && !l.trim().is_empty());

    let header = lines
        .next()
        .ok_or_else(|| anyhow::anyhow!("Empty pvar file: {}", path.display()))?;
    let columns: Vec<&str> = header.split('\t').collect();
    let col = |name: &str| {
        columns
            .iter()
            .position(|&c| c == name)
            .ok_or_else(|| anyhow::anyhow!("Column '{}' not found in {}", name, path.display()))
    };
    let chrom_idx = col("#CHROM")?;
    let pos_idx = col("POS")?;
    let id_idx = col("ID")?;
    let ref_idx = col("REF")?;
    let alt_idx = col("ALT")?;

    let mut variants = Vec::new();
    for (line_num, line) in lines.enumerate() {
        let fields: Vec<&str> = line.split('\t').collect();
        let max_idx = chrom_idx.max(pos_idx).max(id_idx).max(ref_idx).max(alt_idx);
        if fields.len() <= max_idx {
            bail!(
                "Pvar line {} of {} has too few fields",
                line_num + 2,
                path.display()
            );
        }
        variants.push(TargetVariant {
            chrom: fields[chrom_idx].to_string(),
            pos: fields[pos_idx].parse().with_context(|| {
                format!("Bad position on pvar line {} of {}", line_num + 2, path.display())
            })?,
            id: fields[id_idx].to_string(),
            ref_allele: fields[ref_idx].to_string(),
            alt_allele: fields[alt_idx].to_string(),
        });
    }
    Ok(variants)
}

/// A variant inclusion list, one ID per line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantList {
    pub ids: Vec<String>,
}

impl VariantList {
    pub fn new(ids: Vec<String>) -> Self {
        Self { ids }
    }

    /// Read an inclusion list, skipping blank lines.
    pub fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read variant list: {}", path.display()))?;
        let ids = contents
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();
        Ok(Self { ids })
    }

    /// Write the list in the form plink2 `--extract` consumes.
    pub fn write(&self, path: &Path) -> Result<PathBuf> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create variant list: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        for id in &self.ids {
            writeln!(writer, "{id}")?;
        }
        writer.flush()?;
        Ok(path.to_path_buf())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_bim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("target.bim");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "1\trs1\t0\t1000\tA\tG").unwrap();
        writeln!(f, "2 rs2 0 2000 C T").unwrap();

        let variants = read_target(&path, TargetFormat::Bim).unwrap();
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].chrom, "1");
        assert_eq!(variants[0].pos, 1000);
        assert_eq!(variants[0].ref_allele, "A");
        assert_eq!(variants[0].alt_allele, "G");
        assert_eq!(variants[1].id, "rs2");
    }

    #[test]
    fn test_parse_bim_short_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("target.bim");
        std::fs::write(&path, "1 rs1 0 1000 A\n").unwrap();
        assert!(read_target(&path, TargetFormat::Bim).is_err());
    }

    #[test]
    fn test_parse_pvar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("target.pvar");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "##fileformat=PVARv1.0").unwrap();
        writeln!(f, "#CHROM\tPOS\tID\tREF\tALT").unwrap();
        writeln!(f, "1\t1000\trs1\tA\tG").unwrap();
        writeln!(f, "X\t5000\trs9\tC\tT").unwrap();

        let variants = read_target(&path, TargetFormat::Pvar).unwrap();
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[1].chrom, "X");
        assert_eq!(variants[1].pos, 5000);
        assert_eq!(variants[1].ref_allele, "C");
    }

    #[test]
    fn test_parse_pvar_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("target.pvar");
        std::fs::write(&path, "#CHROM\tPOS\tID\tREF\n1\t1000\trs1\tA\n").unwrap();
        assert!(read_target(&path, TargetFormat::Pvar).is_err());
    }

    #[test]
    fn test_variant_list_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keep.txt");
        let list = VariantList::new(vec!["rs1".into(), "rs2".into()]);
        list.write(&path).unwrap();

        let loaded = VariantList::read(&path).unwrap();
        assert_eq!(loaded, list);
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_variant_list_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keep.txt");
        std::fs::write(&path, "rs1\n\n  \nrs2\n").unwrap();
        let loaded = VariantList::read(&path).unwrap();
        assert_eq!(loaded.ids, vec!["rs1", "rs2"]);
    }
}
