//! Fan-out/fan-in over the registered sources
//!
//! One request runs the analysis first, then one retrieval per
//! (detected category, capable source) pair plus the locations lookup,
//! all concurrently and each bounded by its own timeout. Failed retrievals
//! leave an empty slot and a diagnostic; they never fail the request.

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use olivia_classifiers::{Analyzer, SituationAnalysis};
use olivia_core::{
    AggregationDegraded, AnalysisReport, Error, ExternalRecord, HarmCategory, LocationsResponse,
    Result, RetrievalOutcome, SourceDiagnostic, SourceError, SourceFailure, SourceHealth, SourceId,
    SourceRole,
};
use olivia_sources::{is_valid_postal_code, FetchOutcome, SourceAdapter, SourceQuery, SourceRegistry};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::AggregationConfig;
use crate::merge::merge_records;
use crate::recommendations::{recommend, LocationLookup, RecommendationContext};
use crate::request::AnalysisRequest;

/// Attached to every report
pub const DISCLAIMER: &str = "Les informations fournies sont indicatives et ne constituent pas un avis juridique. \
Les montants estimés ne préjugent pas de la décision d'une juridiction ou d'un fonds d'indemnisation : \
faites-vous accompagner par un avocat ou une association d'aide aux victimes.";

/// Liveness of one source, flattened as `{source, status, message}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceStatus {
    pub source: SourceId,
    #[serde(flatten)]
    pub health: SourceHealth,
}

type Task = (Arc<dyn SourceAdapter>, SourceQuery);

/// Settled result of one retrieval
struct Retrieval {
    index: usize,
    source: SourceId,
    role: SourceRole,
    category: Option<HarmCategory>,
    result: std::result::Result<FetchOutcome, SourceError>,
    latency_ms: u64,
}

impl Retrieval {
    fn diagnostic(&self) -> SourceDiagnostic {
        let outcome = match &self.result {
            Ok(o) if o.records.is_empty() => RetrievalOutcome::NoResults {
                skipped_malformed: o.skipped_malformed,
            },
            Ok(o) => RetrievalOutcome::Records {
                count: o.records.len(),
                skipped_malformed: o.skipped_malformed,
            },
            Err(error) => RetrievalOutcome::Failed {
                error: error.clone(),
            },
        };
        SourceDiagnostic {
            source: self.source.clone(),
            category: self.category.clone(),
            outcome,
            latency_ms: self.latency_ms,
        }
    }
}

pub struct Aggregator {
    analyzer: Arc<Analyzer>,
    registry: SourceRegistry,
    config: AggregationConfig,
}

impl Aggregator {
    pub fn new(
        analyzer: Arc<Analyzer>,
        registry: SourceRegistry,
        config: AggregationConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            analyzer,
            registry,
            config,
        })
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Classification, interactions and estimate only; no source is queried
    pub fn analyze(&self, text: &str) -> Result<SituationAnalysis> {
        self.analyzer.analyze(text)
    }

    /// Build the full report for one request.
    ///
    /// Fails only with `InvalidInput` (blank or oversized text, unknown id in
    /// `include_apis`), always before any source is called.
    pub async fn aggregate(&self, request: &AnalysisRequest) -> Result<AnalysisReport> {
        let start = Instant::now();
        let adapters = self.select_sources(request.include_apis.as_ref())?;
        let analysis = self.analyzer.analyze(&request.description_situation)?;
        let lexicon = self.analyzer.lexicon();

        let postal_code = request.postal_code().filter(|code| {
            let valid = is_valid_postal_code(code);
            if !valid {
                debug!("Ignoring malformed postal code");
            }
            valid
        });

        let mut tasks: Vec<Task> = Vec::new();
        for m in &analysis.harm_matches {
            let Some(definition) = lexicon.category(&m.category) else {
                continue;
            };
            for adapter in adapters.iter().filter(|a| a.supports(&m.category)) {
                let query = SourceQuery::category(
                    m.category.clone(),
                    definition.label.clone(),
                    definition.search_query.clone(),
                );
                tasks.push((Arc::clone(adapter), query));
            }
        }
        if let Some(code) = postal_code {
            for adapter in adapters.iter().filter(|a| a.role() == SourceRole::Locations) {
                tasks.push((Arc::clone(adapter), SourceQuery::locations(code)));
            }
        }

        debug!(
            matches = analysis.harm_matches.len(),
            retrievals = tasks.len(),
            "Fanning out retrievals"
        );
        let retrievals = self.run(tasks).await;

        let mut collected: BTreeMap<HarmCategory, Vec<ExternalRecord>> = analysis
            .categories()
            .map(|c| (c.clone(), Vec::new()))
            .collect();
        let mut case_law_answered = BTreeSet::new();
        let mut case_law_found = BTreeSet::new();
        let mut locations = Vec::new();
        let mut diagnostics = Vec::with_capacity(retrievals.len());
        let mut failures = Vec::new();

        for retrieval in retrievals {
            diagnostics.push(retrieval.diagnostic());
            match retrieval.result {
                Ok(outcome) => match retrieval.category {
                    Some(category) => {
                        if retrieval.role == SourceRole::CaseLaw {
                            case_law_answered.insert(category.clone());
                            if !outcome.records.is_empty() {
                                case_law_found.insert(category.clone());
                            }
                        }
                        collected.entry(category).or_default().extend(outcome.records);
                    }
                    None => locations.extend(outcome.records),
                },
                Err(error) => failures.push(SourceFailure {
                    source: retrieval.source,
                    category: retrieval.category,
                    error,
                }),
            }
        }

        let records_by_category = collected
            .into_iter()
            .map(|(category, records)| {
                let mut merged = merge_records(records);
                merged.truncate(self.config.max_records_per_category);
                (category, merged)
            })
            .collect();
        let nearby_locations = merge_records(locations);

        let degraded = (!failures.is_empty()).then(|| AggregationDegraded { failures });
        let location_lookup = match (postal_code, nearby_locations.is_empty()) {
            (None, _) => LocationLookup::NotRequested,
            (Some(_), true) => LocationLookup::NoneFound,
            (Some(_), false) => LocationLookup::Found,
        };
        let case_law_empty: BTreeSet<HarmCategory> = case_law_answered
            .difference(&case_law_found)
            .cloned()
            .collect();
        let recommendations = recommend(&RecommendationContext {
            lexicon,
            matches: &analysis.harm_matches,
            complexity: analysis.complexity_level,
            case_law_empty: &case_law_empty,
            degraded: degraded.is_some(),
            locations: location_lookup,
        });

        let outcome = if degraded.is_some() { "degraded" } else { "complete" };
        let latency = start.elapsed();
        metrics::counter!("olivia_aggregations_total", "outcome" => outcome).increment(1);
        metrics::histogram!("olivia_aggregation_latency_ms").record(latency.as_secs_f64() * 1000.0);

        if let Some(degraded) = &degraded {
            warn!(
                failed = degraded.failures.len(),
                sources = ?degraded.sources(),
                "Aggregation degraded"
            );
        }
        info!(
            matches = analysis.harm_matches.len(),
            complexity = analysis.complexity_level.as_str(),
            locations = nearby_locations.len(),
            outcome,
            latency_ms = latency.as_millis() as u64,
            "Aggregation complete"
        );

        Ok(AnalysisReport {
            harm_matches: analysis.harm_matches,
            complexity_level: analysis.complexity_level,
            interactions: analysis.interactions,
            estimation: analysis.estimation,
            estimation_breakdown: analysis.estimation_breakdown,
            estimation_notes: analysis.estimation_notes,
            legal_guidance: analysis.legal_guidance,
            records_by_category,
            recommendations,
            nearby_locations,
            diagnostics,
            degraded,
            disclaimer: DISCLAIMER.to_string(),
        })
    }

    /// Location-only lookup; a malformed postal code is rejected here
    pub async fn locate(&self, postal_code: &str) -> Result<LocationsResponse> {
        let code = postal_code.trim();
        if !is_valid_postal_code(code) {
            return Err(Error::invalid_input(format!(
                "code_postal must be exactly five digits, got '{}'",
                code
            )));
        }

        let tasks = self
            .registry
            .locations()
            .map(|adapter| (Arc::clone(adapter), SourceQuery::locations(code)))
            .collect();
        let retrievals = self.run(tasks).await;

        let mut lieux = Vec::new();
        let mut diagnostics = Vec::with_capacity(retrievals.len());
        for retrieval in retrievals {
            diagnostics.push(retrieval.diagnostic());
            if let Ok(outcome) = retrieval.result {
                lieux.extend(outcome.records);
            }
        }
        let lieux = merge_records(lieux);

        Ok(LocationsResponse {
            total: lieux.len(),
            lieux,
            diagnostics,
        })
    }

    /// Probe every registered source concurrently, in registration order
    pub async fn health(&self) -> Vec<SourceStatus> {
        let timeout = self.config.health_timeout();
        let probes = self.registry.iter().map(|adapter| async move {
            let health = match tokio::time::timeout(timeout, adapter.probe()).await {
                Ok(health) => health,
                Err(_) => SourceHealth::error(format!(
                    "pas de réponse sous {} ms",
                    timeout.as_millis()
                )),
            };
            SourceStatus {
                source: adapter.id().clone(),
                health,
            }
        });
        join_all(probes).await
    }

    fn select_sources(
        &self,
        include: Option<&BTreeSet<SourceId>>,
    ) -> Result<Vec<Arc<dyn SourceAdapter>>> {
        let Some(include) = include else {
            return Ok(self.registry.iter().cloned().collect());
        };

        let unknown: Vec<&str> = include
            .iter()
            .filter(|id| !self.registry.contains(id))
            .map(SourceId::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(Error::invalid_input(format!(
                "unknown source(s) in include_apis: {}",
                unknown.join(", ")
            )));
        }

        Ok(self
            .registry
            .iter()
            .filter(|a| include.contains(a.id()))
            .cloned()
            .collect())
    }

    /// Run retrievals with bounded concurrency; results come back in task order
    async fn run(&self, tasks: Vec<Task>) -> Vec<Retrieval> {
        let timeout = self.config.retrieval_timeout();
        let futures: Vec<_> = tasks
            .into_iter()
            .enumerate()
            .map(|(index, (adapter, query))| retrieve(index, adapter, query, timeout))
            .collect();
        let mut retrievals: Vec<Retrieval> = stream::iter(futures)
            .buffer_unordered(self.config.max_concurrency)
            .collect()
            .await;
        retrievals.sort_by_key(|r| r.index);
        retrievals
    }
}

async fn retrieve(
    index: usize,
    adapter: Arc<dyn SourceAdapter>,
    query: SourceQuery,
    timeout: Duration,
) -> Retrieval {
    let start = Instant::now();
    let result = match tokio::time::timeout(timeout, adapter.fetch(&query)).await {
        Ok(Err(SourceError::NoResults)) => Ok(FetchOutcome::empty()),
        Ok(result) => result,
        Err(_) => Err(SourceError::Unavailable(format!(
            "no answer within {} ms",
            timeout.as_millis()
        ))),
    };
    let elapsed = start.elapsed();

    let source = adapter.id().clone();
    let outcome = match &result {
        Ok(o) if o.records.is_empty() => "no_results",
        Ok(_) => "records",
        Err(e) => e.kind(),
    };
    metrics::counter!("olivia_source_calls_total", "source" => source.to_string(), "outcome" => outcome)
        .increment(1);
    metrics::histogram!("olivia_source_latency_ms", "source" => source.to_string())
        .record(elapsed.as_secs_f64() * 1000.0);

    match &result {
        Ok(o) if o.skipped_malformed > 0 => {
            metrics::counter!("olivia_malformed_records_total", "source" => source.to_string())
                .increment(o.skipped_malformed as u64);
        }
        Err(error) => warn!(
            source = %source,
            category = query.harm_category().map(HarmCategory::as_str).unwrap_or("lieux"),
            error = %error,
            "Source retrieval failed"
        ),
        Ok(_) => {}
    }

    Retrieval {
        index,
        source,
        role: adapter.role(),
        category: query.harm_category().cloned(),
        result,
        latency_ms: elapsed.as_millis() as u64,
    }
}
