//! Justice Back adapter (judicial-service locations)

use async_trait::async_trait;
use olivia_core::{
    provenance, ExternalRecord, Result, SourceError, SourceHealth, SourceId, SourceRole,
};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::adapter::{FetchOutcome, SourceAdapter, SourceQuery};
use crate::http::ApiClient;
use crate::normalize::{extract_path, first_array, first_text};
use crate::settings::SourceSettings;

const RELIABILITY: &str = "annuaire officiel";
const PROBE_POSTAL_CODE: &str = "75001";

fn postal_code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{5}$").expect("postal code pattern is valid"))
}

/// French postal code: exactly five digits
pub fn is_valid_postal_code(code: &str) -> bool {
    postal_code_pattern().is_match(code.trim())
}

pub struct JusticeBackAdapter {
    id: SourceId,
    api: ApiClient,
}

impl JusticeBackAdapter {
    pub fn new(settings: &SourceSettings) -> Result<Self> {
        Self::with_id(SourceId::new(SourceId::JUSTICE_BACK), settings)
    }

    pub fn with_id(id: SourceId, settings: &SourceSettings) -> Result<Self> {
        let api = ApiClient::from_settings(id.clone(), settings, None)?;
        Ok(Self::from_client(id, api))
    }

    pub fn from_client(id: SourceId, api: ApiClient) -> Self {
        Self { id, api }
    }

    async fn lieux(&self, postal_code: &str) -> std::result::Result<FetchOutcome, SourceError> {
        let params = [("codePostal", postal_code.to_string())];
        match self.api.get_json("lieux", &params).await? {
            Some(body) => parse_locations(&self.id, &body),
            None => Ok(FetchOutcome::empty()),
        }
    }
}

/// Normalize a `/lieux` response: bare array or wrapped in `results`, `lieux` or `items`
pub fn parse_locations(
    source: &SourceId,
    body: &Value,
) -> std::result::Result<FetchOutcome, SourceError> {
    if body.is_null() {
        return Ok(FetchOutcome::empty());
    }
    let items = first_array(body, &["results", "lieux", "items"]).ok_or_else(|| {
        SourceError::Malformed("Justice Back response is neither a list nor a wrapped list".into())
    })?;

    let mut outcome = FetchOutcome::empty();
    for item in items {
        match normalize_location(source, item) {
            Some(record) => outcome.records.push(record),
            None => outcome.skipped_malformed += 1,
        }
    }
    if outcome.skipped_malformed > 0 {
        warn!(source = %source, skipped = outcome.skipped_malformed, "Skipped malformed locations");
    }
    Ok(outcome)
}

fn normalize_location(source: &SourceId, item: &Value) -> Option<ExternalRecord> {
    let name = first_text(item, &["nom", "name", "libelle", "title"])?;
    let identifier = first_text(item, &["id", "identifiant", "code"]).unwrap_or_default();
    let kind = first_text(item, &["type", "typeLieu", "categorie"])
        .unwrap_or_else(|| "lieu de justice".to_string());
    let address = address_of(item);

    let detail = if identifier.is_empty() { "lieux" } else { identifier.as_str() };
    let mut record = ExternalRecord::new(name, kind, identifier.clone(), provenance(source, detail))
        .with_summary(address.clone().unwrap_or_default())
        .with_reliability(RELIABILITY);

    if let Some(address) = address {
        record = record.with_detail("address", address);
    }
    let extras = [
        ("phone", &["telephone", "tel", "phone", "coordonnees.telephone"][..]),
        ("email", &["email", "courriel", "mail", "coordonnees.email"][..]),
        ("opening_hours", &["horaires", "horaire", "openingHours"][..]),
        ("latitude", &["latitude", "gps.latitude", "coordonnees.latitude", "geo.lat"][..]),
        ("longitude", &["longitude", "gps.longitude", "coordonnees.longitude", "geo.lon"][..]),
    ];
    for (key, paths) in extras {
        if let Some(value) = first_text(item, paths) {
            record = record.with_detail(key, value);
        }
    }
    Some(record)
}

/// Address given either as a string or as a structured object
fn address_of(item: &Value) -> Option<String> {
    let address = extract_path(item, "adresse").or_else(|| extract_path(item, "address"))?;
    if address.is_string() {
        return first_text(item, &["adresse", "address"]);
    }

    let street = first_text(address, &["ligne1", "voie", "rue", "street", "numeroEtVoie"]);
    let complement = first_text(address, &["ligne2", "complement"]);
    let postal = first_text(address, &["codePostal", "code_postal", "postalCode"]);
    let city = first_text(address, &["ville", "commune", "city"]);

    let locality = match (postal, city) {
        (Some(p), Some(c)) => Some(format!("{} {}", p, c)),
        (p, c) => p.or(c),
    };
    let parts: Vec<String> = [street, complement, locality].into_iter().flatten().collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

#[async_trait]
impl SourceAdapter for JusticeBackAdapter {
    fn id(&self) -> &SourceId {
        &self.id
    }

    fn role(&self) -> SourceRole {
        SourceRole::Locations
    }

    async fn fetch(&self, query: &SourceQuery) -> std::result::Result<FetchOutcome, SourceError> {
        let SourceQuery::Locations { postal_code } = query else {
            return Ok(FetchOutcome::empty());
        };
        let postal_code = postal_code.trim();
        if !is_valid_postal_code(postal_code) {
            debug!(source = %self.id, "Ignoring malformed postal code");
            return Ok(FetchOutcome::empty());
        }
        self.lieux(postal_code).await
    }

    async fn probe(&self) -> SourceHealth {
        match self.lieux(PROBE_POSTAL_CODE).await {
            Ok(_) => SourceHealth::success("Justice Back accessible"),
            Err(e) => SourceHealth::error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source() -> SourceId {
        SourceId::new(SourceId::JUSTICE_BACK)
    }

    #[test]
    fn test_postal_code_validation() {
        assert!(is_valid_postal_code("75001"));
        assert!(is_valid_postal_code(" 69003 "));
        assert!(!is_valid_postal_code("7500"));
        assert!(!is_valid_postal_code("750011"));
        assert!(!is_valid_postal_code("2A004"));
        assert!(!is_valid_postal_code(""));
        // Arabic-Indic and full-width digits
        assert!(!is_valid_postal_code("٧٥٠٠١"));
        assert!(!is_valid_postal_code("７５００１"));
    }

    #[test]
    fn test_bare_array_with_structured_address() {
        let body = json!([
            {
                "id": "tj-paris",
                "nom": "Tribunal judiciaire de Paris",
                "type": "TJ",
                "adresse": {"ligne1": "Parvis du Tribunal de Paris", "codePostal": "75017", "ville": "Paris"},
                "telephone": "01 44 32 51 51",
                "latitude": 48.8967
            }
        ]);
        let outcome = parse_locations(&source(), &body).unwrap();
        let record = &outcome.records[0];
        assert_eq!(record.title, "Tribunal judiciaire de Paris");
        assert_eq!(record.summary, "Parvis du Tribunal de Paris, 75017 Paris");
        assert_eq!(record.details.get("phone").map(String::as_str), Some("01 44 32 51 51"));
        assert_eq!(record.details.get("latitude").map(String::as_str), Some("48.8967"));
        assert_eq!(record.provenance, vec!["justice_back:tj-paris".to_string()]);
    }

    #[test]
    fn test_wrapped_list_with_string_address_and_bad_entry() {
        let body = json!({
            "lieux": [
                {"name": "Point-justice Lyon 3", "address": "12 rue Moncey, 69003 Lyon"},
                {"adresse": "sans nom"}
            ]
        });
        let outcome = parse_locations(&source(), &body).unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.skipped_malformed, 1);
        assert_eq!(outcome.records[0].jurisdiction_or_nature, "lieu de justice");
        assert_eq!(outcome.records[0].summary, "12 rue Moncey, 69003 Lyon");
    }

    #[test]
    fn test_unexpected_shape_is_malformed() {
        let err = parse_locations(&source(), &json!({"total": 0})).unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
    }
}
