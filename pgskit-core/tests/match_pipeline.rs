//! End-to-end matching: parse a scoring file and a target table from disk,
//! match, and write plink2-ready scorefiles.

use std::io::Write;
use std::path::Path;

use pgskit_core::matching::{self, writer, MatchOptions};
use pgskit_geno::{read_scorefile, read_target, TargetFormat};

fn write_inputs(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let scorefile = dir.join("combined.txt");
    let mut f = std::fs::File::create(&scorefile).unwrap();
    writeln!(
        f,
        "chr_name\tchr_position\teffect_allele\tother_allele\teffect_weight\teffect_type\taccession"
    )
    .unwrap();
    writeln!(f, "1\t1000\tA\tG\t0.3\tadditive\tPGS000001").unwrap();
    writeln!(f, "1\t2000\tG\tC\t0.5\tadditive\tPGS000001").unwrap();
    writeln!(f, "2\t3000\tT\tA\t-0.2\tadditive\tPGS000002").unwrap();
    writeln!(f, "2\t9999\tC\tT\t0.9\tadditive\tPGS000002").unwrap();

    let target = dir.join("cohort.bim");
    let mut f = std::fs::File::create(&target).unwrap();
    writeln!(f, "1\t1:1000:A:G\t0\t1000\tA\tG").unwrap();
    writeln!(f, "1\t1:2000:G:C\t0\t2000\tG\tC").unwrap();
    writeln!(f, "2\t2:3000:A:T\t0\t3000\tA\tT").unwrap();

    (scorefile, target)
}

#[test]
fn match_and_write_scorefiles() {
    let dir = tempfile::tempdir().unwrap();
    let (scorefile_path, target_path) = write_inputs(dir.path());

    let scorefile = read_scorefile(&scorefile_path).unwrap();
    let target = read_target(&target_path, TargetFormat::Bim).unwrap();
    assert_eq!(scorefile.len(), 4);
    assert_eq!(target.len(), 3);

    // Row 1 matches directly, row 2 matches directly (G/C site is
    // palindromic, so it is dropped), row 3 matches allele-swapped on a
    // palindromic A/T site (also dropped), row 4 matches nothing.
    let opts = MatchOptions {
        min_overlap: 0.25,
        keep_ambiguous: false,
    };
    let report = matching::match_variants(&scorefile, &target, &opts).unwrap();
    assert_eq!(report.n_matched, 1);
    assert_eq!(report.matches[0].target_id, "1:1000:A:G");
    assert!(report.n_ambiguous >= 2);

    let outdir = dir.path().join("scores");
    let written = writer::write_scorefiles(&report.matches, &outdir, false).unwrap();
    assert_eq!(written.len(), 1);

    let contents = std::fs::read_to_string(&written[0]).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines[0], "ID\teffect_allele\tPGS000001");
    assert_eq!(lines[1], "1:1000:A:G\tA\t0.3");
}

#[test]
fn keeping_ambiguous_matches_raises_overlap() {
    let dir = tempfile::tempdir().unwrap();
    let (scorefile_path, target_path) = write_inputs(dir.path());

    let scorefile = read_scorefile(&scorefile_path).unwrap();
    let target = read_target(&target_path, TargetFormat::Bim).unwrap();

    let opts = MatchOptions {
        min_overlap: 0.75,
        keep_ambiguous: true,
    };
    let report = matching::match_variants(&scorefile, &target, &opts).unwrap();
    assert_eq!(report.n_matched, 3);
    assert!(report.matches.iter().any(|m| m.ambiguous));
}

#[test]
fn low_overlap_fails_with_counts() {
    let dir = tempfile::tempdir().unwrap();
    let (scorefile_path, target_path) = write_inputs(dir.path());

    let scorefile = read_scorefile(&scorefile_path).unwrap();
    let target = read_target(&target_path, TargetFormat::Bim).unwrap();

    let opts = MatchOptions {
        min_overlap: 0.75,
        keep_ambiguous: false,
    };
    let err = matching::match_variants(&scorefile, &target, &opts).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("1/4"));
    assert!(message.contains("75.0%"));
}
