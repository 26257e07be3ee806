// Scorer layer — linguistic heuristics consumed by the summarizer.
//
// Scorers return additive deltas: 0 is neutral, negative demotes. Three
// bands are used throughout:
// - MINOR_PENALTY: one stylistic signal (leading conjunction, pronoun,
//   reporting verb)
// - MAJOR_PENALTY: a structural signal (sentence below the minimum length)
// - DISCARD: near-certainly unusable candidates, removed before ranking
//
// DISCARD is a large but finite number. Summing a handful of deltas and a
// position bonus can never push a score past the representable range, so
// JSON serialization of scores cannot fail.

pub mod ngram;
pub mod pos;
pub mod sentence;
pub mod token;
pub mod traits;

pub const MINOR_PENALTY: f64 = -0.5;
pub const MAJOR_PENALTY: f64 = 2.0 * MINOR_PENALTY;
pub const DISCARD: f64 = -1.0e12;

/// Every emitted score is clamped into this symmetric range.
const SCORE_LIMIT: f64 = 1.0e300;

/// Whether an accumulated delta contains at least one `DISCARD`.
pub fn is_discarded(delta: f64) -> bool {
    delta <= DISCARD / 2.0
}

/// Map any value to a finite score: NaN becomes 0, infinities are clamped.
pub fn sanitize(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(-SCORE_LIMIT, SCORE_LIMIT)
    }
}
