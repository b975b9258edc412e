//! Shared application state

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusHandle;
use olivia_aggregator::Aggregator;
use olivia_classifiers::Analyzer;
use olivia_lexicon::Lexicon;
use olivia_sources::SourceRegistry;
use std::sync::Arc;
use tracing::info;

use crate::config::AppConfig;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// Analysis and retrieval engine, built once at startup
    pub aggregator: Arc<Aggregator>,

    /// Prometheus handle for `/metrics`; absent when no recorder is installed
    pub metrics_handle: Option<PrometheusHandle>,

    pub demo_mode: bool,
}

impl AppState {
    /// Build lexicon, analyzer, source registry and aggregator from a
    /// validated configuration
    pub fn from_config(config: &AppConfig, metrics_handle: Option<PrometheusHandle>) -> Result<Self> {
        config.validate().context("invalid configuration")?;

        let lexicon = match &config.lexicon_path {
            Some(path) => {
                info!("Loading lexicon from: {}", path.display());
                Lexicon::from_file(path)
                    .with_context(|| format!("failed to load lexicon {}", path.display()))?
            }
            None => Lexicon::builtin().context("built-in lexicon is invalid")?,
        };
        info!("Lexicon ready with {} categories", lexicon.category_ids().count());

        let analyzer = Analyzer::new(Arc::new(lexicon), config.analysis.clone())
            .context("failed to build analyzer")?;

        let registry = SourceRegistry::from_settings(&config.sources, config.demo_mode)
            .context("failed to build source registry")?;
        info!(
            demo_mode = config.demo_mode,
            "Registered sources: {:?}",
            registry.ids()
        );

        let aggregator = Aggregator::new(Arc::new(analyzer), registry, config.aggregation.clone())
            .context("failed to build aggregator")?;

        Ok(Self {
            aggregator: Arc::new(aggregator),
            metrics_handle,
            demo_mode: config.demo_mode,
        })
    }
}
