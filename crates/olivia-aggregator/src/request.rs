//! Inbound analysis request

use olivia_core::SourceId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Full analysis request as submitted by the text endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub description_situation: String,

    /// Postal code for the nearby-locations lookup; ignored when malformed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_postal: Option<String>,

    /// Restrict retrieval to these sources; absent means every registered source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_apis: Option<BTreeSet<SourceId>>,
}

impl AnalysisRequest {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description_situation: description.into(),
            ..Self::default()
        }
    }

    pub fn with_postal_code(mut self, code: impl Into<String>) -> Self {
        self.code_postal = Some(code.into());
        self
    }

    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SourceId>,
    {
        self.include_apis = Some(sources.into_iter().map(Into::into).collect());
        self
    }

    /// Trimmed postal code, if any non-blank one was given
    pub fn postal_code(&self) -> Option<&str> {
        self.code_postal
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}
