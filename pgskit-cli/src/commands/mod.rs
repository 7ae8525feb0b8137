pub mod extract;
pub mod match_variants;
