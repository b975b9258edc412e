//! OLIVIA Core
//!
//! Types and error handling shared across the OLIVIA analysis engine.
//!
//! This crate provides:
//! - Harm categories, matches and compensation estimates
//! - The provider-independent `ExternalRecord` shape
//! - The `AnalysisReport` aggregate and its diagnostics
//! - Legal guidance (applicable texts, deadlines, evidence, risks)
//! - The error taxonomy (`Error`, `SourceError`)

pub mod error;
pub mod guidance;
pub mod record;
pub mod report;
pub mod types;

pub use error::{Error, Result, SourceError};
pub use guidance::{Deadline, EvidenceItem, LegalGuidance, LegalRisk, LegalText};
pub use record::{provenance, provenance_label, ExternalRecord, SourceId, SourceRole};
pub use report::{
    AggregationDegraded, AnalysisReport, HealthStatus, LocationsResponse, RetrievalOutcome,
    SourceDiagnostic, SourceFailure, SourceHealth,
};
pub use types::{
    CategoryEstimate, CompensationBand, ComplexityLevel, EstimationRange, HarmCategory, HarmMatch,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result, SourceError};
    pub use crate::record::{ExternalRecord, SourceId, SourceRole};
    pub use crate::report::AnalysisReport;
    pub use crate::types::{ComplexityLevel, EstimationRange, HarmCategory, HarmMatch};
}
