//! OLIVIA Lexicon
//!
//! Declarative definition of harm categories: detection patterns with
//! weights, negation cues, co-occurrence boosts, compensation bands,
//! interaction warnings and conditional legal guidance. Loaded from YAML and
//! validated once at startup.

pub mod guidance;
pub mod lexicon;
pub mod rules;
pub mod text;

pub use guidance::{GuidanceRule, GuidanceTable, Trigger};
pub use lexicon::{BoostSpec, CategoryDefinition, DowngradeSpec, Lexicon, PatternSpec};
pub use rules::{canonical_key, InteractionRule};
pub use text::{contains_term, normalize, word_match_end};

pub mod prelude {
    pub use crate::lexicon::{CategoryDefinition, Lexicon};
    pub use crate::rules::InteractionRule;
    pub use crate::text::normalize;
}
