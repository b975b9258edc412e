//! Source adapter trait and retrieval types

use async_trait::async_trait;
use olivia_core::{ExternalRecord, HarmCategory, SourceError, SourceHealth, SourceId, SourceRole};
use serde::Serialize;

/// What an adapter is asked to retrieve
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SourceQuery {
    /// Texts or decisions relevant to one detected harm category
    Category {
        category: HarmCategory,
        label: String,
        /// Provider-neutral search phrase for the category
        search_query: String,
    },

    /// Judicial-service locations near a postal code; the only query a locale reaches
    Locations { postal_code: String },
}

impl SourceQuery {
    pub fn category(
        category: HarmCategory,
        label: impl Into<String>,
        search_query: impl Into<String>,
    ) -> Self {
        Self::Category {
            category,
            label: label.into(),
            search_query: search_query.into(),
        }
    }

    pub fn locations(postal_code: impl Into<String>) -> Self {
        Self::Locations {
            postal_code: postal_code.into(),
        }
    }

    /// Category of a category query
    pub fn harm_category(&self) -> Option<&HarmCategory> {
        match self {
            Self::Category { category, .. } => Some(category),
            Self::Locations { .. } => None,
        }
    }

    /// Free-text phrase sent to search providers; falls back to the label
    pub fn search_text(&self) -> &str {
        match self {
            Self::Category {
                search_query, label, ..
            } if search_query.trim().is_empty() => label,
            Self::Category { search_query, .. } => search_query,
            Self::Locations { postal_code } => postal_code,
        }
    }
}

/// Records returned by one adapter call, plus the entries it had to drop
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutcome {
    pub records: Vec<ExternalRecord>,
    pub skipped_malformed: usize,
}

impl FetchOutcome {
    pub fn new(records: Vec<ExternalRecord>, skipped_malformed: usize) -> Self {
        Self {
            records,
            skipped_malformed,
        }
    }

    /// Successful call with nothing to report
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Uniform retrieval contract over one external provider.
///
/// `NoResults` is never returned as an error: an empty [`FetchOutcome`]
/// stands for it. A single malformed entry is skipped and counted rather
/// than failing the batch.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Instance identifier, used in provenance and diagnostics
    fn id(&self) -> &SourceId;

    /// Kind of data served
    fn role(&self) -> SourceRole;

    /// Whether this adapter answers queries for `category`
    fn supports(&self, _category: &HarmCategory) -> bool {
        self.role().serves_categories()
    }

    /// Retrieve and normalize records for a query
    async fn fetch(&self, query: &SourceQuery) -> Result<FetchOutcome, SourceError>;

    /// Lightweight liveness check
    async fn probe(&self) -> SourceHealth;
}
