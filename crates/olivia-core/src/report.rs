//! Analysis report and per-source diagnostics

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::SourceError;
use crate::guidance::LegalGuidance;
use crate::record::{ExternalRecord, SourceId};
use crate::types::{CategoryEstimate, ComplexityLevel, EstimationRange, HarmCategory, HarmMatch};

/// Outcome of a single (category, source) retrieval
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RetrievalOutcome {
    /// The source answered with at least one usable record
    Records { count: usize, skipped_malformed: usize },

    /// The source answered successfully with nothing usable
    NoResults { skipped_malformed: usize },

    /// The source failed; the slot in the report is empty
    Failed { error: SourceError },
}

impl RetrievalOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Diagnostic entry attached to a report for one retrieval
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceDiagnostic {
    pub source: SourceId,

    /// `None` for the locations lookup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<HarmCategory>,

    pub outcome: RetrievalOutcome,

    pub latency_ms: u64,
}

/// One failed (category, source) pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceFailure {
    pub source: SourceId,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<HarmCategory>,

    pub error: SourceError,
}

/// Informational marker: the report is complete but some sources failed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationDegraded {
    pub failures: Vec<SourceFailure>,
}

impl AggregationDegraded {
    /// Distinct failing sources, in first-failure order
    pub fn sources(&self) -> Vec<&SourceId> {
        let mut seen: Vec<&SourceId> = Vec::new();
        for failure in &self.failures {
            if !seen.contains(&&failure.source) {
                seen.push(&failure.source);
            }
        }
        seen
    }
}

/// Root aggregate returned for one analysis request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub harm_matches: Vec<HarmMatch>,

    pub complexity_level: ComplexityLevel,

    pub interactions: Vec<String>,

    pub estimation: EstimationRange,

    pub estimation_breakdown: Vec<CategoryEstimate>,

    /// Indicative-only caveats that must accompany the estimate
    pub estimation_notes: Vec<String>,

    pub legal_guidance: LegalGuidance,

    /// Keys are always a subset of the categories in `harm_matches`
    pub records_by_category: BTreeMap<HarmCategory, Vec<ExternalRecord>>,

    pub recommendations: Vec<String>,

    pub nearby_locations: Vec<ExternalRecord>,

    pub diagnostics: Vec<SourceDiagnostic>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<AggregationDegraded>,

    pub disclaimer: String,
}

impl AnalysisReport {
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }

    /// Records retrieved for one category (empty when none or not detected)
    pub fn records_for(&self, category: &HarmCategory) -> &[ExternalRecord] {
        self.records_by_category
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Response of the location-only query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationsResponse {
    pub total: usize,
    pub lieux: Vec<ExternalRecord>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<SourceDiagnostic>,
}

impl LocationsResponse {
    pub fn empty() -> Self {
        Self {
            total: 0,
            lieux: Vec::new(),
            diagnostics: Vec::new(),
        }
    }
}

/// Liveness status reported by one source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Success,
    Error,
}

/// Result of a source liveness probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceHealth {
    pub status: HealthStatus,
    pub message: String,
}

impl SourceHealth {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Error,
            message: message.into(),
        }
    }
}
