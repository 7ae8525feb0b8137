//! pgskit-geno: genotype-adjacent file I/O for pgskit.
//!
//! Provides the typed PLINK bed/bim/fam fileset, target variant tables
//! (.bim / .pvar), variant inclusion lists, and combined scoring files.

pub mod fileset;
pub mod scorefile;
pub mod variants;

pub use fileset::{BedFileset, FilesetSummary};
pub use scorefile::{read_scorefile, EffectType, ScoreRecord};
pub use variants::{read_target, TargetFormat, TargetVariant, VariantList};
