//! Policy knobs for scoring, complexity leveling and estimation

use olivia_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the analysis pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// A category is reported only when its confidence exceeds this value
    pub detection_threshold: f64,

    /// Raw score mapped to a confidence of 100
    pub score_saturation: f64,

    /// Fraction of a pattern weight added for each repeated occurrence
    pub repeat_bonus: f64,

    /// Number of tokens before a hit searched for negation cues
    pub negation_window: usize,

    /// Minimum accepted input length in characters (after trimming)
    pub min_input_chars: usize,

    /// Maximum accepted input length in characters
    pub max_input_chars: usize,

    pub complexity: ComplexityConfig,

    pub estimation: EstimationConfig,
}

/// Thresholds for complexity leveling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexityConfig {
    /// Number of matches from which a situation is at least moderate
    pub moderate_min_matches: usize,

    /// Number of matches from which a situation is complex
    pub complex_min_matches: usize,

    /// Confidence from which a single match is no longer simple
    pub simple_max_confidence: f64,

    /// Any match at or above this confidence makes the situation complex
    pub complex_min_confidence: f64,

    /// Several strong matches within this spread are treated as complex
    pub balanced_spread: f64,
}

/// Diminishing-returns parameters for the estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationConfig {
    /// Weight multiplier applied per additional category
    pub decay: f64,

    /// Minimum weight any category keeps
    pub floor: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            detection_threshold: 20.0,
            score_saturation: 4.0,
            repeat_bonus: 0.25,
            negation_window: 3,
            min_input_chars: 3,
            max_input_chars: 10_000,
            complexity: ComplexityConfig::default(),
            estimation: EstimationConfig::default(),
        }
    }
}

impl Default for ComplexityConfig {
    fn default() -> Self {
        Self {
            moderate_min_matches: 2,
            complex_min_matches: 3,
            simple_max_confidence: 60.0,
            complex_min_confidence: 85.0,
            balanced_spread: 15.0,
        }
    }
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            decay: 0.6,
            floor: 0.3,
        }
    }
}

fn in_percent_range(value: f64) -> bool {
    value.is_finite() && (0.0..=100.0).contains(&value)
}

impl AnalysisConfig {
    /// Reject nonsensical knob values
    pub fn validate(&self) -> Result<()> {
        if !in_percent_range(self.detection_threshold) {
            return Err(Error::config(format!(
                "analysis.detection_threshold must be within [0, 100], got {}",
                self.detection_threshold
            )));
        }
        if !(self.score_saturation.is_finite() && self.score_saturation > 0.0) {
            return Err(Error::config("analysis.score_saturation must be positive"));
        }
        if !(self.repeat_bonus.is_finite() && self.repeat_bonus >= 0.0) {
            return Err(Error::config("analysis.repeat_bonus must not be negative"));
        }
        if self.min_input_chars == 0 || self.min_input_chars > self.max_input_chars {
            return Err(Error::config(
                "analysis input bounds must satisfy 0 < min_input_chars <= max_input_chars",
            ));
        }
        self.complexity.validate()?;
        self.estimation.validate()
    }
}

impl ComplexityConfig {
    pub fn validate(&self) -> Result<()> {
        if self.moderate_min_matches == 0 || self.moderate_min_matches > self.complex_min_matches {
            return Err(Error::config(
                "complexity thresholds must satisfy 0 < moderate_min_matches <= complex_min_matches",
            ));
        }
        if !in_percent_range(self.simple_max_confidence)
            || !in_percent_range(self.complex_min_confidence)
            || self.simple_max_confidence > self.complex_min_confidence
        {
            return Err(Error::config(
                "complexity confidences must satisfy 0 <= simple_max_confidence <= complex_min_confidence <= 100",
            ));
        }
        if !in_percent_range(self.balanced_spread) {
            return Err(Error::config("complexity.balanced_spread must be within [0, 100]"));
        }
        Ok(())
    }
}

impl EstimationConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.decay.is_finite() && self.decay > 0.0 && self.decay <= 1.0) {
            return Err(Error::config("estimation.decay must be within (0, 1]"));
        }
        if !(self.floor.is_finite() && (0.0..=1.0).contains(&self.floor)) {
            return Err(Error::config("estimation.floor must be within [0, 1]"));
        }
        Ok(())
    }
}
