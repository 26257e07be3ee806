// Scorer trait — the capability every sentence heuristic implements.

use super::pos::PosTag;

/// A sentence under consideration: raw text plus its tokens and one
/// part-of-speech tag per token.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub text: &'a str,
    pub tokens: &'a [String],
    pub tags: &'a [PosTag],
}

/// Trait for heuristics that adjust a sentence's score.
pub trait Scorer {
    /// Additive delta for `candidate`: 0 is neutral, negative demotes.
    fn score(&self, candidate: &Candidate<'_>) -> f64;
}
