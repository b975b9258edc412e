//! Judilibre adapter (case law of the Cour de cassation and lower courts)

use async_trait::async_trait;
use olivia_core::{
    provenance, ExternalRecord, Result, SourceError, SourceHealth, SourceId, SourceRole,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::adapter::{FetchOutcome, SourceAdapter, SourceQuery};
use crate::http::ApiClient;
use crate::normalize::{
    first_array, first_date, first_text, text_at, texts_at, truncate, MAX_SUMMARY_CHARS,
};
use crate::settings::SourceSettings;

/// Header carrying a Judilibre API key
pub const API_KEY_HEADER: &str = "KeyId";

pub struct JudilibreAdapter {
    id: SourceId,
    api: ApiClient,
    page_size: usize,
}

impl JudilibreAdapter {
    pub fn new(settings: &SourceSettings) -> Result<Self> {
        Self::with_id(SourceId::new(SourceId::JUDILIBRE), settings)
    }

    pub fn with_id(id: SourceId, settings: &SourceSettings) -> Result<Self> {
        let api = ApiClient::from_settings(id.clone(), settings, Some(API_KEY_HEADER))?;
        Ok(Self::from_client(id, api, settings.page_size))
    }

    pub fn from_client(id: SourceId, api: ApiClient, page_size: usize) -> Self {
        Self {
            id,
            api,
            page_size: page_size.max(1),
        }
    }
}

/// Normalize a `/search` response body
pub fn parse_decisions(
    source: &SourceId,
    body: &Value,
) -> std::result::Result<FetchOutcome, SourceError> {
    let items = first_array(body, &["results"])
        .ok_or_else(|| SourceError::Malformed("Judilibre response without 'results' array".into()))?;

    let mut outcome = FetchOutcome::empty();
    for item in items {
        match normalize_decision(source, item) {
            Some(record) => outcome.records.push(record),
            None => outcome.skipped_malformed += 1,
        }
    }
    if outcome.skipped_malformed > 0 {
        warn!(source = %source, skipped = outcome.skipped_malformed, "Skipped malformed Judilibre decisions");
    }
    Ok(outcome)
}

fn normalize_decision(source: &SourceId, item: &Value) -> Option<ExternalRecord> {
    let jurisdiction = text_at(item, "jurisdiction")?;
    let number = first_text(item, &["number", "numbers[0]"]);
    let identifier = text_at(item, "id").or_else(|| number.clone())?;
    let jurisdiction = expand_jurisdiction(&jurisdiction);
    let date = first_date(item, &["decision_date", "date"]);
    let chamber = text_at(item, "chamber");

    let mut title = jurisdiction.clone();
    if let Some(chamber) = &chamber {
        title.push_str(", ");
        title.push_str(chamber);
    }
    if let Some(date) = &date {
        title.push_str(", ");
        title.push_str(date);
    }
    if let Some(number) = &number {
        title.push_str(", n° ");
        title.push_str(number);
    }

    let summary = first_text(
        item,
        &["summary", "highlights.text[0]", "highlights.visa[0]", "text"],
    )
    .map(|s| truncate(&s, MAX_SUMMARY_CHARS))
    .unwrap_or_default();

    let reliability = if jurisdiction.to_lowercase().contains("cassation") {
        "jurisprudence Cour de cassation"
    } else {
        "jurisprudence juges du fond"
    };

    let mut record = ExternalRecord::new(
        title,
        jurisdiction,
        identifier.clone(),
        provenance(source, &identifier),
    )
    .with_summary(summary)
    .with_reliability(reliability);
    if let Some(date) = date {
        record = record.with_date(date);
    }
    if let Some(chamber) = chamber {
        record = record.with_detail("chamber", chamber);
    }
    if let Some(number) = number {
        record = record.with_detail("number", number);
    }
    if let Some(solution) = text_at(item, "solution") {
        record = record.with_detail("solution", solution);
    }
    let themes = texts_at(item, "themes");
    if !themes.is_empty() {
        record = record.with_detail("themes", themes.join(" ; "));
    }
    Some(record)
}

fn expand_jurisdiction(code: &str) -> String {
    match code {
        "cc" => "Cour de cassation".to_string(),
        "ca" => "Cour d'appel".to_string(),
        "tj" => "Tribunal judiciaire".to_string(),
        other => other.to_string(),
    }
}

#[async_trait]
impl SourceAdapter for JudilibreAdapter {
    fn id(&self) -> &SourceId {
        &self.id
    }

    fn role(&self) -> SourceRole {
        SourceRole::CaseLaw
    }

    async fn fetch(&self, query: &SourceQuery) -> std::result::Result<FetchOutcome, SourceError> {
        if query.harm_category().is_none() {
            return Ok(FetchOutcome::empty());
        }
        debug!(source = %self.id, query = query.search_text(), "Searching Judilibre");

        let params = [
            ("query", query.search_text().to_string()),
            ("page_size", self.page_size.to_string()),
            ("resolve_references", "true".to_string()),
        ];
        match self.api.get_json("search", &params).await? {
            Some(body) => parse_decisions(&self.id, &body),
            None => Ok(FetchOutcome::empty()),
        }
    }

    async fn probe(&self) -> SourceHealth {
        match self.api.get_json("healthcheck", &[]).await {
            Ok(Some(body)) => {
                let status = text_at(&body, "status").unwrap_or_else(|| "disponible".to_string());
                SourceHealth::success(format!("Judilibre accessible ({})", status))
            }
            Ok(None) => SourceHealth::error("Judilibre healthcheck introuvable"),
            Err(e) => SourceHealth::error(e.to_string()),
        }
    }
}
