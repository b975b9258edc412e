//! Normalized records returned by source adapters

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a configured source adapter instance
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub const LEGIFRANCE: &'static str = "legifrance";
    pub const JUDILIBRE: &'static str = "judilibre";
    pub const JUSTICE_BACK: &'static str = "justice_back";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// What kind of data a source provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceRole {
    /// Legislative and regulatory texts
    Legislation,
    /// Court decisions
    CaseLaw,
    /// Judicial-service locations
    Locations,
}

impl SourceRole {
    /// Whether this role answers per-category queries
    pub fn serves_categories(&self) -> bool {
        !matches!(self, Self::Locations)
    }
}

/// Build a `"sourcename:detail"` provenance string
pub fn provenance(source: &SourceId, detail: &str) -> String {
    format!("{}:{}", source, detail)
}

/// Short label of a provenance string (text before the first `:`)
pub fn provenance_label(provenance: &str) -> &str {
    provenance.split_once(':').map_or(provenance, |(label, _)| label)
}

/// Provider-independent record shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalRecord {
    pub title: String,

    /// Date as given by the provider (ISO-8601 when available)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    pub summary: String,

    /// Jurisdiction for decisions, nature for texts, type for locations
    pub jurisdiction_or_nature: String,

    pub reliability_label: String,

    /// Identifier of the record at the provider
    pub source_id: String,

    /// Contributing adapters as `"sourcename:detail"`
    pub provenance: Vec<String>,

    /// Provider-specific extras (address, phone, coordinates, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
}

impl ExternalRecord {
    /// Create a record with a single provenance entry
    pub fn new(
        title: impl Into<String>,
        jurisdiction_or_nature: impl Into<String>,
        source_id: impl Into<String>,
        provenance: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            date: None,
            summary: String::new(),
            jurisdiction_or_nature: jurisdiction_or_nature.into(),
            reliability_label: String::new(),
            source_id: source_id.into(),
            provenance: vec![provenance.into()],
            details: BTreeMap::new(),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_reliability(mut self, label: impl Into<String>) -> Self {
        self.reliability_label = label.into();
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}
