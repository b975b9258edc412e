//! Adapters built from settings, exercised against mock providers

use olivia_core::{HarmCategory, HealthStatus, SourceError};
use olivia_sources::prelude::*;
use olivia_sources::{JudilibreAdapter, JusticeBackAdapter};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn oauth_settings(server: &MockServer) -> SourceSettings {
    SourceSettings {
        base_url: Some(format!("{}/minju/v1/Justiceback", server.uri())),
        token_url: Some(format!("{}/api/oauth/token", server.uri())),
        client_id: Some("client-identifier".into()),
        client_secret: Some("client-secret".into()),
        max_retries: 0,
        ..SourceSettings::default()
    }
}

async fn mount_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/api/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "token-1",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn physical() -> SourceQuery {
    SourceQuery::category(
        HarmCategory::new("physical"),
        "Préjudice corporel",
        "préjudice corporel indemnisation",
    )
}

#[tokio::test]
async fn judilibre_sends_api_key_and_page_size() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cassation/judilibre/v1.0/search"))
        .and(header("KeyId", "judilibre-key"))
        .and(query_param("query", "préjudice corporel indemnisation"))
        .and(query_param("page_size", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "id": "abc",
                "jurisdiction": "cc",
                "chamber": "civ2",
                "number": "20-10.000",
                "decision_date": "2021-06-10",
                "summary": "Réparation intégrale du préjudice corporel"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let settings = SourceSettings {
        base_url: Some(format!("{}/cassation/judilibre/v1.0", server.uri())),
        api_key: Some("judilibre-key".into()),
        page_size: 3,
        ..SourceSettings::default()
    };
    let adapter = JudilibreAdapter::new(&settings).unwrap();
    let outcome = adapter.fetch(&physical()).await.unwrap();

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].provenance, vec!["judilibre:abc".to_string()]);
    assert_eq!(outcome.records[0].jurisdiction_or_nature, "Cour de cassation");
}

#[tokio::test]
async fn judilibre_not_found_is_empty_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let settings = SourceSettings {
        base_url: Some(server.uri()),
        api_key: Some("key".into()),
        ..SourceSettings::default()
    };
    let outcome = JudilibreAdapter::new(&settings)
        .unwrap()
        .fetch(&physical())
        .await
        .unwrap();
    assert!(outcome.is_empty());
    assert_eq!(outcome.skipped_malformed, 0);
}

#[tokio::test]
async fn justice_back_reuses_cached_token() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/minju/v1/Justiceback/lieux"))
        .and(query_param("codePostal", "69003"))
        .and(header("Authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "id": "tj-lyon",
                "nom": "Tribunal judiciaire de Lyon",
                "adresse": {"voie": "67 rue Servient", "codePostal": "69003", "ville": "Lyon"},
                "horaires": "8h30-17h"
            }]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let adapter = JusticeBackAdapter::new(&oauth_settings(&server)).unwrap();
    let query = SourceQuery::locations("69003");
    let first = adapter.fetch(&query).await.unwrap();
    let second = adapter.fetch(&query).await.unwrap();

    assert_eq!(first, second);
    let record = &first.records[0];
    assert_eq!(record.summary, "67 rue Servient, 69003 Lyon");
    assert_eq!(record.details.get("opening_hours").map(String::as_str), Some("8h30-17h"));
}

#[tokio::test]
async fn justice_back_rejected_credentials_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
        .expect(2)
        .mount(&server)
        .await;

    let mut settings = oauth_settings(&server);
    settings.max_retries = 3;
    let adapter = JusticeBackAdapter::new(&settings).unwrap();

    // One token request for the fetch, one for the probe
    let err = adapter
        .fetch(&SourceQuery::locations("75001"))
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::Unauthorized(_)));
    assert_eq!(adapter.probe().await.status, HealthStatus::Error);
}

#[tokio::test]
async fn justice_back_skips_malformed_postal_code_without_calling_provider() {
    let server = MockServer::start().await;
    mount_token(&server, 0).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let adapter = JusticeBackAdapter::new(&oauth_settings(&server)).unwrap();
    let outcome = adapter
        .fetch(&SourceQuery::locations("75 001"))
        .await
        .unwrap();
    assert!(outcome.is_empty());
}

#[tokio::test]
async fn justice_back_no_locations_is_empty_success() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/minju/v1/Justiceback/lieux"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let adapter = JusticeBackAdapter::new(&oauth_settings(&server)).unwrap();
    let outcome = adapter
        .fetch(&SourceQuery::locations("97150"))
        .await
        .unwrap();
    assert!(outcome.is_empty());
}
