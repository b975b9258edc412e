//! Core harm and estimation types for OLIVIA

use serde::{Deserialize, Serialize};
use std::fmt;

/// Harm ("préjudice") category tag.
///
/// The set of valid tags is defined by the loaded lexicon, not by this type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HarmCategory(String);

impl HarmCategory {
    /// Create a category tag
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The tag as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HarmCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HarmCategory {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One detected harm category with its confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmMatch {
    /// Detected category
    pub category: HarmCategory,

    /// Display label from the lexicon
    pub label: String,

    /// Category description from the lexicon
    pub description: String,

    /// Confidence in [0, 100]
    pub confidence: f64,

    /// Matched terms; negated hits are prefixed with `!`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<String>,
}

impl HarmMatch {
    /// Create a match with no evidence attached
    pub fn new(category: impl Into<HarmCategory>, confidence: f64) -> Self {
        let category = category.into();
        Self {
            label: category.to_string(),
            description: String::new(),
            category,
            confidence: confidence.clamp(0.0, 100.0),
            evidence: Vec::new(),
        }
    }

    /// Check if confidence exceeds threshold
    pub fn exceeds_threshold(&self, threshold: f64) -> bool {
        self.confidence > threshold
    }
}

/// Overall complexity of the described situation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityLevel {
    Simple,
    Moderate,
    Complex,
}

impl ComplexityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Moderate => "moderate",
            Self::Complex => "complex",
        }
    }
}

/// Base compensation band of a category, in euros
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompensationBand {
    pub min: f64,
    pub max: f64,
}

impl CompensationBand {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// A band is usable when both ends are finite, non-negative and ordered
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min >= 0.0 && self.min <= self.max
    }
}

/// Indicative compensation range. Always `min <= max`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimationRange {
    /// Lower bound in whole currency units
    pub min: u64,

    /// Upper bound in whole currency units
    pub max: u64,

    /// ISO 4217 currency code
    pub currency: String,
}

impl EstimationRange {
    /// Range in euros; the bounds are swapped if given out of order
    pub fn eur(min: u64, max: u64) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
            currency: "EUR".to_string(),
        }
    }

    /// The `{0, 0}` range returned when nothing was detected
    pub fn zero() -> Self {
        Self::eur(0, 0)
    }

    pub fn is_zero(&self) -> bool {
        self.min == 0 && self.max == 0
    }
}

impl Default for EstimationRange {
    fn default() -> Self {
        Self::zero()
    }
}

/// Contribution of one category to the total estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEstimate {
    pub category: HarmCategory,

    /// Base band from the lexicon
    pub band: CompensationBand,

    /// Confidence applied as `confidence / 100`
    pub confidence: f64,

    /// Diminishing-returns weight applied to this category
    pub weight: f64,

    /// Contributed lower bound
    pub min: f64,

    /// Contributed upper bound
    pub max: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimation_range_is_monotonic() {
        let range = EstimationRange::eur(500, 100);
        assert_eq!(range.min, 100);
        assert_eq!(range.max, 500);
        assert_eq!(range.currency, "EUR");
        assert!(EstimationRange::zero().is_zero());
    }

    #[test]
    fn test_harm_match_clamps_confidence() {
        let m = HarmMatch::new("physical", 140.0);
        assert_eq!(m.confidence, 100.0);
        assert!(m.exceeds_threshold(20.0));
        assert_eq!(m.category.as_str(), "physical");
    }

    #[test]
    fn test_complexity_serializes_lowercase() {
        let json = serde_json::to_string(&ComplexityLevel::Complex).unwrap();
        assert_eq!(json, "\"complex\"");
        assert!(ComplexityLevel::Simple < ComplexityLevel::Complex);
    }

    #[test]
    fn test_band_validity() {
        assert!(CompensationBand::new(1000.0, 5000.0).is_valid());
        assert!(!CompensationBand::new(5000.0, 1000.0).is_valid());
        assert!(!CompensationBand::new(-1.0, 10.0).is_valid());
    }
}
