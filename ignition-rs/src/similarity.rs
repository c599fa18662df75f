//! # Name Similarity
//!
//! Ranks candidate identifiers against a malformed one for "did you mean"
//! suggestions.
//!
//! The score is the character-level Levenshtein distance normalized by the
//! longer of the two names:
//!
//! ```text
//! similarity(a, b) = 1 - levenshtein(a, b) / max(len(a), len(b))
//! ```
//!
//! A candidate is only suggested when its score reaches the threshold.
//! [`DEFAULT_SIMILARITY_THRESHOLD`] is `0.7`, so a suggestion is rejected
//! once more than 30% of the characters differ.

/// Minimum score a candidate needs before it is suggested
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;

/// Normalized similarity between two names, in `[0.0, 1.0]`
///
/// Two empty names are identical and score `1.0`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }

    1.0 - strsim::levenshtein(a, b) as f64 / longest as f64
}

/// Picks the closest valid name for a malformed one
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NameSimilarityRanker {
    threshold: f64,
}

impl Default for NameSimilarityRanker {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl NameSimilarityRanker {
    /// Creates a ranker with the given threshold, clamped to `[0.0, 1.0]`
    pub fn new(threshold: f64) -> Self {
        let threshold = if threshold.is_nan() { DEFAULT_SIMILARITY_THRESHOLD } else { threshold.clamp(0.0, 1.0) };
        Self { threshold }
    }

    /// The minimum score a candidate needs
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Returns the best scoring candidate if it reaches the threshold.
    ///
    /// Ties keep the candidate that came first in iteration order.
    pub fn best_match<I, S>(&self, target: &str, candidates: I) -> Option<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut best: Option<(f64, S)> = None;

        for candidate in candidates {
            let score = similarity(target, candidate.as_ref());
            let better = match &best {
                Some((best_score, _)) => score > *best_score,
                None => true,
            };
            if better {
                best = Some((score, candidate));
            }
        }

        let (score, candidate) = best?;
        tracing::trace!(target_name = %target, candidate = %candidate.as_ref(), score, "Best similarity candidate");

        (score >= self.threshold).then(|| candidate.as_ref().to_string())
    }
}
