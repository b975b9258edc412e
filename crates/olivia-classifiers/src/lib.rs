//! OLIVIA Classifiers
//!
//! Pure, lexicon-driven analysis of a free-text situation description:
//! - Harm classification with weighted patterns, negation and boosts
//! - Complexity leveling from match count and spread
//! - Interaction warnings for co-occurring categories
//! - Indicative compensation estimate with diminishing returns
//! - Applicable legal texts, deadlines, evidence and risks
//!
//! Nothing in this crate performs I/O; every component is built once from
//! the lexicon and shared read-only.

pub mod analysis;
pub mod complexity;
pub mod config;
pub mod estimation;
pub mod guidance;
pub mod harm;
pub mod interactions;

pub use analysis::{Analyzer, SituationAnalysis};
pub use complexity::complexity_level;
pub use config::{AnalysisConfig, ComplexityConfig, EstimationConfig};
pub use estimation::{Estimate, EstimationEngine, ESTIMATION_NOTES};
pub use guidance::GuidanceAdvisor;
pub use harm::{CategoryScore, HarmClassifier};
pub use interactions::{Interaction, InteractionDetector};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::analysis::{Analyzer, SituationAnalysis};
    pub use crate::config::AnalysisConfig;
    pub use crate::estimation::EstimationEngine;
    pub use crate::harm::HarmClassifier;
    pub use crate::interactions::InteractionDetector;
}
