//! Complexity leveling from the count and spread of accepted matches

use olivia_core::{ComplexityLevel, HarmMatch};

use crate::config::ComplexityConfig;

/// Derive the complexity level of a set of matches.
///
/// No match is `Simple`. Many matches, one very strong match, or several
/// strong matches of similar weight make a situation `Complex`.
pub fn complexity_level(matches: &[HarmMatch], config: &ComplexityConfig) -> ComplexityLevel {
    if matches.is_empty() {
        return ComplexityLevel::Simple;
    }

    let count = matches.len();
    let (low, high) = matches.iter().fold((f64::MAX, f64::MIN), |(lo, hi), m| {
        (lo.min(m.confidence), hi.max(m.confidence))
    });
    let spread = high - low;

    let balanced_strong = count >= config.moderate_min_matches
        && spread <= config.balanced_spread
        && low >= config.simple_max_confidence;

    if count >= config.complex_min_matches
        || high >= config.complex_min_confidence
        || balanced_strong
    {
        ComplexityLevel::Complex
    } else if count >= config.moderate_min_matches || high >= config.simple_max_confidence {
        ComplexityLevel::Moderate
    } else {
        ComplexityLevel::Simple
    }
}
