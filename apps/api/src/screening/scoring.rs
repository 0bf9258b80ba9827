//! Match Scorer — JD-keyword coverage by the CV. Pure, no I/O.

use serde::{Deserialize, Serialize};

use crate::screening::keywords::KeywordSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// 0.0 – 100.0, two decimals
    pub score: f64,
    pub matched: KeywordSet,
}

impl MatchResult {
    pub fn empty() -> Self {
        Self {
            score: 0.0,
            matched: KeywordSet::new(),
        }
    }
}

/// score = round(100 × |jd ∩ cv| / |jd|, 2). Asymmetric: measures how much of the JD the
/// CV covers. Either side empty → `(0.0, ∅)`.
///
/// Keywords are compared as given; callers pass canonical sets (see
/// `keywords::canonical_keywords`).
pub fn score(jd_keywords: &KeywordSet, cv_keywords: &KeywordSet) -> MatchResult {
    if jd_keywords.is_empty() || cv_keywords.is_empty() {
        return MatchResult::empty();
    }

    let matched: KeywordSet = jd_keywords.intersection(cv_keywords).cloned().collect();
    let coverage = 100.0 * matched.len() as f64 / jd_keywords.len() as f64;

    MatchResult {
        score: round2(coverage),
        matched,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
