//! Scoring-file / target variant matching.
//!
//! Scoring files name variants by chromosome, position, and allele pair;
//! the target fileset carries its own IDs and allele orientation. Matching
//! joins the two under four schemes (direct, allele-swapped, and the strand
//! flip of each), labels strand-ambiguous matches, and gates on a minimum
//! overlap before anything is written out.

pub mod writer;

use std::collections::{HashMap, HashSet};

use anyhow::{bail, Result};
use rayon::prelude::*;
use tracing::{info, warn};

use pgskit_geno::{ScoreRecord, TargetVariant};

/// Complement an allele base by base. Non-ACGT characters pass through
/// unchanged, so indel and symbolic alleles simply never flip-match.
pub fn complement(allele: &str) -> String {
    allele
        .chars()
        .map(|c| match c {
            'A' => 'T',
            'T' => 'A',
            'C' => 'G',
            'G' => 'C',
            other => other,
        })
        .collect()
}

/// Which target allele pair the scoring alleles were joined against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchScheme {
    /// effect_allele == REF, other_allele == ALT
    RefAlt,
    /// effect_allele == ALT, other_allele == REF
    AltRef,
    /// effect_allele == flip(REF), other_allele == flip(ALT)
    RefAltFlip,
    /// effect_allele == flip(ALT), other_allele == flip(REF)
    AltRefFlip,
}

impl MatchScheme {
    pub const ALL: [MatchScheme; 4] = [
        MatchScheme::RefAlt,
        MatchScheme::AltRef,
        MatchScheme::RefAltFlip,
        MatchScheme::AltRefFlip,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::RefAlt => "refalt",
            Self::AltRef => "altref",
            Self::RefAltFlip => "refalt_flip",
            Self::AltRefFlip => "altref_flip",
        }
    }
}

/// One scoring-file row joined to one target variant.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedVariant {
    pub score: ScoreRecord,
    /// Row index into the scoring file, for overlap accounting.
    pub score_idx: usize,
    pub target_id: String,
    pub target_ref: String,
    pub target_alt: String,
    pub ref_flip: String,
    pub alt_flip: String,
    pub scheme: MatchScheme,
    /// Effect allele equals a flipped target allele, so the match cannot be
    /// distinguished from its strand flip (palindromic A/T and C/G sites,
    /// and every flip-scheme match).
    pub ambiguous: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct MatchOptions {
    /// Minimum fraction of scoring-file rows that must match.
    pub min_overlap: f64,
    /// Keep ambiguous matches, labelled, instead of dropping them.
    pub keep_ambiguous: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            min_overlap: 0.75,
            keep_ambiguous: false,
        }
    }
}

/// Matching outcome plus the counts the overlap gate was judged on.
#[derive(Debug, Clone)]
pub struct MatchReport {
    pub matches: Vec<MatchedVariant>,
    pub n_score_records: usize,
    /// Distinct scoring-file rows represented in `matches`.
    pub n_matched: usize,
    /// Matches labelled ambiguous (removed unless keep_ambiguous).
    pub n_ambiguous: usize,
    pub overlap: f64,
}

impl MatchReport {
    /// Matched target IDs, deduplicated in match order. Written as an
    /// inclusion list, this feeds the extract stage directly.
    pub fn target_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.matches
            .iter()
            .filter(|m| seen.insert(m.target_id.as_str()))
            .map(|m| m.target_id.clone())
            .collect()
    }
}

/// Join scoring-file rows against target variants under all four schemes.
///
/// Schemes run in parallel; results keep scheme order, then scoring-file
/// order, so output is deterministic.
pub fn match_variants(
    scorefile: &[ScoreRecord],
    target: &[TargetVariant],
    opts: &MatchOptions,
) -> Result<MatchReport> {
    if scorefile.is_empty() {
        bail!("Scoring file has no records");
    }

    let flips: Vec<(String, String)> = target
        .iter()
        .map(|t| (complement(&t.ref_allele), complement(&t.alt_allele)))
        .collect();

    let per_scheme: Vec<Vec<MatchedVariant>> = MatchScheme::ALL
        .par_iter()
        .map(|&scheme| match_one_scheme(scorefile, target, &flips, scheme))
        .collect();
    let mut matches: Vec<MatchedVariant> = per_scheme.into_iter().flatten().collect();

    let n_ambiguous = matches.iter().filter(|m| m.ambiguous).count();
    if !opts.keep_ambiguous && n_ambiguous > 0 {
        warn!("Removing {} strand-ambiguous matches", n_ambiguous);
        matches.retain(|m| !m.ambiguous);
    }

    if matches.is_empty() {
        bail!(
            "No target variants match any scoring-file variants. \
             Check the genome build of the target data, or impute the target \
             genotypes if they cover the scoring variants poorly"
        );
    }

    let matched: HashSet<usize> = matches.iter().map(|m| m.score_idx).collect();
    let overlap = matched.len() as f64 / scorefile.len() as f64;
    info!(
        "Matched {}/{} scoring-file variants ({:.1}%)",
        matched.len(),
        scorefile.len(),
        overlap * 100.0
    );
    if overlap < opts.min_overlap {
        bail!(
            "Matched {}/{} scoring-file variants ({:.1}%), below the required {:.1}%",
            matched.len(),
            scorefile.len(),
            overlap * 100.0,
            opts.min_overlap * 100.0
        );
    }

    Ok(MatchReport {
        n_matched: matched.len(),
        n_score_records: scorefile.len(),
        n_ambiguous,
        overlap,
        matches,
    })
}

fn match_one_scheme(
    scorefile: &[ScoreRecord],
    target: &[TargetVariant],
    flips: &[(String, String)],
    scheme: MatchScheme,
) -> Vec<MatchedVariant> {
    // (chrom, pos, effect-side allele, other-side allele) -> target row.
    // First insertion wins on duplicate coordinates, keeping the join
    // deterministic for multiallelic sites split over several rows.
    let mut index: HashMap<(&str, u64, &str, &str), usize> = HashMap::with_capacity(target.len());
    for (t_idx, t) in target.iter().enumerate() {
        let (ref_flip, alt_flip) = (&flips[t_idx].0, &flips[t_idx].1);
        let (ea, oa): (&str, &str) = match scheme {
            MatchScheme::RefAlt => (&t.ref_allele, &t.alt_allele),
            MatchScheme::AltRef => (&t.alt_allele, &t.ref_allele),
            MatchScheme::RefAltFlip => (ref_flip, alt_flip),
            MatchScheme::AltRefFlip => (alt_flip, ref_flip),
        };
        index.entry((t.chrom.as_str(), t.pos, ea, oa)).or_insert(t_idx);
    }

    scorefile
        .iter()
        .enumerate()
        .filter_map(|(score_idx, rec)| {
            let key = (
                rec.chr_name.as_str(),
                rec.chr_position,
                rec.effect_allele.as_str(),
                rec.other_allele.as_str(),
            );
            index.get(&key).map(|&t_idx| {
                let t = &target[t_idx];
                let (ref_flip, alt_flip) = &flips[t_idx];
                let ambiguous =
                    rec.effect_allele == *ref_flip || rec.effect_allele == *alt_flip;
                MatchedVariant {
                    score: rec.clone(),
                    score_idx,
                    target_id: t.id.clone(),
                    target_ref: t.ref_allele.clone(),
                    target_alt: t.alt_allele.clone(),
                    ref_flip: ref_flip.clone(),
                    alt_flip: alt_flip.clone(),
                    scheme,
                    ambiguous,
                }
            })
        })
        .collect()
}

/// Matches partitioned so each output scorefile has unique variant IDs.
#[derive(Debug, Clone, Default)]
pub struct DuplicateSplit<'a> {
    pub first: Vec<&'a MatchedVariant>,
    pub dup: Vec<&'a MatchedVariant>,
}

/// plink2 demands unique IDs within one scorefile, but the same target ID
/// can legitimately carry two different effect alleles (one score weights
/// the REF, another the ALT at the same site). Rows for the first effect
/// allele seen per ID stay in `first`; rows for any other allele go to
/// `dup`, scored separately and summed downstream.
pub fn split_duplicates<'a, I>(matches: I) -> DuplicateSplit<'a>
where
    I: IntoIterator<Item = &'a MatchedVariant>,
{
    let mut first_allele: HashMap<&'a str, &'a str> = HashMap::new();
    let mut split = DuplicateSplit::default();
    for m in matches {
        let seen = first_allele
            .entry(m.target_id.as_str())
            .or_insert(m.score.effect_allele.as_str());
        if *seen == m.score.effect_allele {
            split.first.push(m);
        } else {
            split.dup.push(m);
        }
    }
    split
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(
        chrom: &str,
        pos: u64,
        ea: &str,
        oa: &str,
        weight: f64,
        accession: &str,
    ) -> ScoreRecord {
        ScoreRecord {
            chr_name: chrom.to_string(),
            chr_position: pos,
            effect_allele: ea.to_string(),
            other_allele: oa.to_string(),
            effect_weight: weight,
            effect_type: "additive".to_string(),
            accession: accession.to_string(),
        }
    }

    fn target(chrom: &str, pos: u64, id: &str, r: &str, a: &str) -> TargetVariant {
        TargetVariant {
            chrom: chrom.to_string(),
            pos,
            id: id.to_string(),
            ref_allele: r.to_string(),
            alt_allele: a.to_string(),
        }
    }

    #[test]
    fn test_complement() {
        assert_eq!(complement("A"), "T");
        assert_eq!(complement("ACGT"), "TGCA");
        assert_eq!(complement("N"), "N");
    }

    #[test]
    fn test_direct_match() {
        let scores = vec![score("1", 1000, "A", "G", 0.3, "PGS1")];
        let targets = vec![target("1", 1000, "rs1", "A", "G")];
        let report =
            match_variants(&scores, &targets, &MatchOptions::default()).unwrap();
        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.matches[0].scheme, MatchScheme::RefAlt);
        assert_eq!(report.matches[0].target_id, "rs1");
        assert!(!report.matches[0].ambiguous);
        assert_eq!(report.n_matched, 1);
    }

    #[test]
    fn test_swapped_match() {
        let scores = vec![score("1", 1000, "G", "A", 0.3, "PGS1")];
        let targets = vec![target("1", 1000, "rs1", "A", "G")];
        let report =
            match_variants(&scores, &targets, &MatchOptions::default()).unwrap();
        assert_eq!(report.matches[0].scheme, MatchScheme::AltRef);
    }

    #[test]
    fn test_flip_match_is_ambiguous_by_construction() {
        // Opposite-strand scoring alleles: T/C flips to A/G
        let scores = vec![score("1", 1000, "T", "C", 0.3, "PGS1")];
        let targets = vec![target("1", 1000, "rs1", "A", "G")];

        let removed = match_variants(&scores, &targets, &MatchOptions::default());
        assert!(removed.is_err());

        let kept = match_variants(
            &scores,
            &targets,
            &MatchOptions {
                keep_ambiguous: true,
                ..MatchOptions::default()
            },
        )
        .unwrap();
        assert_eq!(kept.matches.len(), 1);
        assert_eq!(kept.matches[0].scheme, MatchScheme::RefAltFlip);
        assert!(kept.matches[0].ambiguous);
        assert_eq!(kept.n_ambiguous, 1);
    }

    #[test]
    fn test_palindromic_site_is_ambiguous() {
        // A/T site: effect allele equals the flip of ALT
        let scores = vec![score("1", 1000, "A", "T", 0.3, "PGS1")];
        let targets = vec![target("1", 1000, "rs1", "A", "T")];

        let opts = MatchOptions {
            keep_ambiguous: true,
            min_overlap: 0.0,
        };
        let report = match_variants(&scores, &targets, &opts).unwrap();
        assert!(report.matches.iter().all(|m| m.ambiguous));
    }

    #[test]
    fn test_no_match_is_an_error() {
        let scores = vec![score("1", 1000, "A", "G", 0.3, "PGS1")];
        let targets = vec![target("2", 5000, "rs9", "C", "T")];
        let err = match_variants(&scores, &targets, &MatchOptions::default()).unwrap_err();
        assert!(err.to_string().contains("genome build"));
    }

    #[test]
    fn test_overlap_gate() {
        let scores = vec![
            score("1", 1000, "A", "G", 0.3, "PGS1"),
            score("1", 2000, "C", "T", 0.1, "PGS1"),
        ];
        let targets = vec![target("1", 1000, "rs1", "A", "G")];

        let strict = MatchOptions {
            min_overlap: 0.75,
            ..MatchOptions::default()
        };
        assert!(match_variants(&scores, &targets, &strict).is_err());

        let lenient = MatchOptions {
            min_overlap: 0.5,
            ..MatchOptions::default()
        };
        let report = match_variants(&scores, &targets, &lenient).unwrap();
        assert_eq!(report.n_matched, 1);
        assert_eq!(report.n_score_records, 2);
        assert!((report.overlap - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_target_ids_deduplicated() {
        let scores = vec![
            score("1", 1000, "A", "G", 0.3, "PGS1"),
            score("1", 1000, "A", "G", 0.5, "PGS2"),
            score("1", 2000, "C", "T", 0.1, "PGS1"),
        ];
        let targets = vec![
            target("1", 1000, "1:1000:A:G", "A", "G"),
            target("1", 2000, "1:2000:C:T", "C", "T"),
        ];
        let report =
            match_variants(&scores, &targets, &MatchOptions::default()).unwrap();
        assert_eq!(report.target_ids(), vec!["1:1000:A:G", "1:2000:C:T"]);
    }

    #[test]
    fn test_split_duplicates() {
        let scores = vec![
            score("1", 1000, "A", "G", 0.3, "PGS1"),
            score("1", 1000, "G", "A", 0.7, "PGS2"),
            score("1", 2000, "C", "T", 0.1, "PGS1"),
        ];
        let targets = vec![
            target("1", 1000, "1:1000:A:G", "A", "G"),
            target("1", 2000, "1:2000:C:T", "C", "T"),
        ];
        let report =
            match_variants(&scores, &targets, &MatchOptions::default()).unwrap();
        assert_eq!(report.matches.len(), 3);

        let split = split_duplicates(&report.matches);
        // Same ID with a second effect allele moves to the dup set
        assert_eq!(split.first.len(), 2);
        assert_eq!(split.dup.len(), 1);
        assert_eq!(split.dup[0].score.effect_allele, "G");
    }
}
