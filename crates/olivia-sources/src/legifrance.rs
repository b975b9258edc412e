//! Légifrance adapter (legislation, DILA through PISTE)

use async_trait::async_trait;
use olivia_core::{
    provenance, ExternalRecord, Result, SourceError, SourceHealth, SourceId, SourceRole,
};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::adapter::{FetchOutcome, SourceAdapter, SourceQuery};
use crate::http::ApiClient;
use crate::normalize::{first_array, first_date, first_text, truncate, MAX_SUMMARY_CHARS};
use crate::settings::SourceSettings;

const RELIABILITY: &str = "texte officiel";

/// Searches consolidated legislation for each harm category
pub struct LegifranceAdapter {
    id: SourceId,
    api: ApiClient,
    page_size: usize,
}

impl LegifranceAdapter {
    pub fn new(settings: &SourceSettings) -> Result<Self> {
        Self::with_id(SourceId::new(SourceId::LEGIFRANCE), settings)
    }

    pub fn with_id(id: SourceId, settings: &SourceSettings) -> Result<Self> {
        let api = ApiClient::from_settings(id.clone(), settings, None)?;
        Ok(Self::from_client(id, api, settings.page_size))
    }

    pub fn from_client(id: SourceId, api: ApiClient, page_size: usize) -> Self {
        Self {
            id,
            api,
            page_size: page_size.max(1),
        }
    }

    fn search_body(&self, text: &str, page_size: usize) -> Value {
        json!({
            "fond": "CODE_DATE",
            "recherche": {
                "champs": [{
                    "typeChamp": "ALL",
                    "criteres": [{
                        "typeRecherche": "UN_DES_MOTS",
                        "valeur": text,
                        "operateur": "ET"
                    }],
                    "operateur": "ET"
                }],
                "filtres": [],
                "pageNumber": 1,
                "pageSize": page_size,
                "operateur": "ET",
                "sort": "PERTINENCE",
                "typePagination": "DEFAUT"
            }
        })
    }

    async fn search(&self, text: &str, page_size: usize) -> std::result::Result<FetchOutcome, SourceError> {
        let Some(body) = self.api.post_json("search", &self.search_body(text, page_size)).await? else {
            return Ok(FetchOutcome::empty());
        };
        parse_results(&self.id, &body)
    }
}

/// Normalize a `/search` response body
pub fn parse_results(source: &SourceId, body: &Value) -> std::result::Result<FetchOutcome, SourceError> {
    let items = first_array(body, &["results"])
        .ok_or_else(|| SourceError::Malformed("Légifrance response without 'results' array".into()))?;

    let mut outcome = FetchOutcome::empty();
    for item in items {
        match normalize_text(source, item) {
            Some(record) => outcome.records.push(record),
            None => outcome.skipped_malformed += 1,
        }
    }
    if outcome.skipped_malformed > 0 {
        warn!(source = %source, skipped = outcome.skipped_malformed, "Skipped malformed Légifrance entries");
    }
    Ok(outcome)
}

fn normalize_text(source: &SourceId, item: &Value) -> Option<ExternalRecord> {
    let title = first_text(item, &["titles[0].title", "title", "titre"])?;
    let identifier = first_text(item, &["titles[0].id", "titles[0].cid", "id", "cid"])
        .unwrap_or_default();
    let nature = first_text(item, &["nature", "type"]).unwrap_or_else(|| "texte".to_string());
    let summary = first_text(
        item,
        &[
            "sections[0].extracts[0].values[0]",
            "sections[0].extracts[0].title",
            "text",
            "resume",
        ],
    )
    .map(|s| truncate(&s, MAX_SUMMARY_CHARS))
    .unwrap_or_default();

    let detail = if identifier.is_empty() { "search" } else { identifier.as_str() };
    let mut record = ExternalRecord::new(title, nature, identifier.clone(), provenance(source, detail))
        .with_summary(summary)
        .with_reliability(RELIABILITY);
    if let Some(date) = first_date(item, &["date", "dateVersion", "lastUpdate", "dateDebut"]) {
        record = record.with_date(date);
    }
    if let Some(etat) = first_text(item, &["etat", "titles[0].etat"]) {
        record = record.with_detail("etat", etat);
    }
    Some(record)
}

#[async_trait]
impl SourceAdapter for LegifranceAdapter {
    fn id(&self) -> &SourceId {
        &self.id
    }

    fn role(&self) -> SourceRole {
        SourceRole::Legislation
    }

    async fn fetch(&self, query: &SourceQuery) -> std::result::Result<FetchOutcome, SourceError> {
        if query.harm_category().is_none() {
            return Ok(FetchOutcome::empty());
        }
        debug!(source = %self.id, query = query.search_text(), "Searching Légifrance");
        self.search(query.search_text(), self.page_size).await
    }

    async fn probe(&self) -> SourceHealth {
        match self.search("responsabilité civile", 1).await {
            Ok(_) => SourceHealth::success("Légifrance accessible"),
            Err(e) => SourceHealth::error(e.to_string()),
        }
    }
}
