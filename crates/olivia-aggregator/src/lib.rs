//! OLIVIA Aggregator
//!
//! Turns one analysis request into an `AnalysisReport`: runs the
//! lexicon-driven analysis, fans out to the registered legal-data sources
//! per detected category, deduplicates what comes back, derives
//! recommendations and attaches per-source diagnostics.
//!
//! Source failures degrade the report instead of failing it.

pub mod aggregator;
pub mod config;
pub mod merge;
pub mod recommendations;
pub mod request;

pub use aggregator::{Aggregator, SourceStatus, DISCLAIMER};
pub use config::AggregationConfig;
pub use merge::{dedup_key, merge_records};
pub use recommendations::{recommend, LocationLookup, RecommendationContext};
pub use request::AnalysisRequest;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::aggregator::Aggregator;
    pub use crate::config::AggregationConfig;
    pub use crate::request::AnalysisRequest;
}
