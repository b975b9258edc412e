//! Offline source serving canned records
//!
//! Backs every enabled source in demo mode and stands in for real providers
//! in tests: calls are counted, and latency or failures can be injected
//! globally or per category.

use async_trait::async_trait;
use olivia_core::{
    provenance, ExternalRecord, HarmCategory, SourceError, SourceHealth, SourceId, SourceRole,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

use crate::adapter::{FetchOutcome, SourceAdapter, SourceQuery};

pub struct FixtureAdapter {
    id: SourceId,
    role: SourceRole,
    records: BTreeMap<String, Vec<ExternalRecord>>,
    fallback: Vec<ExternalRecord>,
    locations: BTreeMap<String, Vec<ExternalRecord>>,
    skipped_malformed: usize,
    latency: Option<Duration>,
    failure: Option<SourceError>,
    category_failures: BTreeMap<String, SourceError>,
    call_count: AtomicUsize,
}

impl FixtureAdapter {
    /// Empty fixture: every query succeeds with no records
    pub fn new(id: impl Into<SourceId>, role: SourceRole) -> Self {
        Self {
            id: id.into(),
            role,
            records: BTreeMap::new(),
            fallback: Vec::new(),
            locations: BTreeMap::new(),
            skipped_malformed: 0,
            latency: None,
            failure: None,
            category_failures: BTreeMap::new(),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Records returned for one category
    pub fn with_records(mut self, category: &str, records: Vec<ExternalRecord>) -> Self {
        self.records.insert(category.to_string(), records);
        self
    }

    /// Records returned for categories without their own entry
    pub fn with_fallback(mut self, records: Vec<ExternalRecord>) -> Self {
        self.fallback = records;
        self
    }

    /// Locations returned for one postal code
    pub fn with_locations(mut self, postal_code: &str, records: Vec<ExternalRecord>) -> Self {
        self.locations.insert(postal_code.to_string(), records);
        self
    }

    /// Report this many skipped malformed entries on every successful call
    pub fn with_skipped_malformed(mut self, count: usize) -> Self {
        self.skipped_malformed = count;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail every call, probes included
    pub fn failing_with(mut self, error: SourceError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Fail only queries for `category`
    pub fn failing_for(mut self, category: &str, error: SourceError) -> Self {
        self.category_failures.insert(category.to_string(), error);
        self
    }

    /// Number of `fetch` calls so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn reset_call_count(&self) {
        self.call_count.store(0, Ordering::Relaxed);
    }

    /// Demo fixture matching the shape of a real provider
    pub fn demo(id: impl Into<SourceId>, role: SourceRole) -> Self {
        let id = id.into();
        let fixture = Self::new(id.clone(), role);
        match role {
            SourceRole::Legislation => demo_legislation(fixture, &id),
            SourceRole::CaseLaw => demo_case_law(fixture, &id),
            SourceRole::Locations => demo_locations(fixture, &id),
        }
    }

    fn canned(&self, query: &SourceQuery) -> Vec<ExternalRecord> {
        match query {
            SourceQuery::Category { category, .. } => self
                .records
                .get(category.as_str())
                .unwrap_or(&self.fallback)
                .clone(),
            SourceQuery::Locations { postal_code } => self
                .locations
                .get(postal_code.trim())
                .cloned()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl SourceAdapter for FixtureAdapter {
    fn id(&self) -> &SourceId {
        &self.id
    }

    fn role(&self) -> SourceRole {
        self.role
    }

    async fn fetch(&self, query: &SourceQuery) -> Result<FetchOutcome, SourceError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        if let Some(category) = query.harm_category() {
            if let Some(error) = self.category_failures.get(category.as_str()) {
                return Err(error.clone());
            }
        }

        let records = self.canned(query);
        debug!(source = %self.id, records = records.len(), "Serving fixture records");
        Ok(FetchOutcome::new(records, self.skipped_malformed))
    }

    async fn probe(&self) -> SourceHealth {
        match &self.failure {
            Some(error) => SourceHealth::error(error.to_string()),
            None => SourceHealth::success("Source hors ligne (données de démonstration)"),
        }
    }
}

fn demo_legislation(fixture: FixtureAdapter, id: &SourceId) -> FixtureAdapter {
    let article = |title: &str, article_id: &str, summary: &str| {
        ExternalRecord::new(title, "CODE", article_id, provenance(id, article_id))
            .with_summary(summary)
            .with_reliability("texte officiel")
            .with_detail("etat", "VIGUEUR")
    };
    let general = article(
        "Code civil - Article 1240",
        "LEGIARTI000032041571",
        "Tout fait quelconque de l'homme, qui cause à autrui un dommage, oblige celui par la faute duquel il est arrivé à le réparer.",
    );

    fixture
        .with_fallback(vec![general.clone()])
        .with_records(
            "physical",
            vec![
                general.clone(),
                article(
                    "Loi n° 85-677 du 5 juillet 1985 - Article 3",
                    "LEGIARTI000006497468",
                    "Les victimes, hormis les conducteurs de véhicules terrestres à moteur, sont indemnisées des dommages résultant des atteintes à leur personne.",
                ),
            ],
        )
        .with_records(
            "psychological",
            vec![
                general.clone(),
                article(
                    "Code de procédure pénale - Article 706-3",
                    "LEGIARTI000038311760",
                    "Toute personne ayant subi un préjudice résultant de faits volontaires ou non qui présentent le caractère matériel d'une infraction peut obtenir la réparation intégrale des dommages.",
                ),
            ],
        )
}

fn demo_case_law(fixture: FixtureAdapter, id: &SourceId) -> FixtureAdapter {
    let decision = |decision_id: &str, chamber: &str, date: &str, number: &str, summary: &str| {
        ExternalRecord::new(
            format!("Cour de cassation, {}, {}, n° {}", chamber, date, number),
            "Cour de cassation",
            decision_id,
            provenance(id, decision_id),
        )
        .with_summary(summary)
        .with_date(date)
        .with_reliability("jurisprudence Cour de cassation")
        .with_detail("chamber", chamber)
        .with_detail("number", number)
    };

    fixture
        .with_records(
            "physical",
            vec![decision(
                "demo-civ2-2022-05-12",
                "Deuxième chambre civile",
                "2022-05-12",
                "21-12.345",
                "Le préjudice corporel doit être réparé intégralement, sans perte ni profit pour la victime.",
            )],
        )
        .with_records(
            "economic",
            vec![decision(
                "demo-civ2-2021-03-04",
                "Deuxième chambre civile",
                "2021-03-04",
                "19-24.567",
                "La perte de gains professionnels futurs s'apprécie au regard de la situation de la victime avant l'accident.",
            )],
        )
        .with_records(
            "moral",
            vec![decision(
                "demo-crim-2020-11-17",
                "Chambre criminelle",
                "2020-11-17",
                "19-87.654",
                "Le préjudice moral des proches de la victime directe ouvre droit à réparation.",
            )],
        )
}

fn demo_locations(fixture: FixtureAdapter, id: &SourceId) -> FixtureAdapter {
    let place = |place_id: &str, name: &str, kind: &str, address: &str, phone: &str| {
        ExternalRecord::new(name, kind, place_id, provenance(id, place_id))
            .with_summary(address)
            .with_reliability("annuaire officiel")
            .with_detail("address", address)
            .with_detail("phone", phone)
    };

    fixture
        .with_locations(
            "75001",
            vec![
                place(
                    "tj-paris",
                    "Tribunal judiciaire de Paris",
                    "Tribunal judiciaire",
                    "Parvis du Tribunal de Paris, 75017 Paris",
                    "01 44 32 51 51",
                ),
                place(
                    "cdad-75",
                    "Conseil départemental de l'accès au droit de Paris",
                    "Point-justice",
                    "14 rue Saint-Jean-Baptiste de la Salle, 75006 Paris",
                    "01 53 70 48 40",
                ),
            ],
        )
        .with_locations(
            "69003",
            vec![place(
                "tj-lyon",
                "Tribunal judiciaire de Lyon",
                "Tribunal judiciaire",
                "67 rue Servient, 69003 Lyon",
                "04 72 60 70 12",
            )],
        )
}
