//! Analysis facade: classification, complexity, interactions, estimate and
//! legal guidance

use olivia_core::{
    CategoryEstimate, ComplexityLevel, EstimationRange, HarmCategory, HarmMatch, LegalGuidance,
    Result,
};
use olivia_lexicon::Lexicon;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::complexity::complexity_level;
use crate::config::AnalysisConfig;
use crate::estimation::EstimationEngine;
use crate::guidance::GuidanceAdvisor;
use crate::harm::HarmClassifier;
use crate::interactions::InteractionDetector;

/// Classification-only outcome for one text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SituationAnalysis {
    pub harm_matches: Vec<HarmMatch>,
    pub complexity_level: ComplexityLevel,
    pub interactions: Vec<String>,
    pub estimation: EstimationRange,
    pub estimation_breakdown: Vec<CategoryEstimate>,
    pub estimation_notes: Vec<String>,
    pub legal_guidance: LegalGuidance,
}

impl SituationAnalysis {
    /// Detected categories in match order
    pub fn categories(&self) -> impl Iterator<Item = &HarmCategory> {
        self.harm_matches.iter().map(|m| &m.category)
    }
}

/// Read-only analysis components built once from the lexicon
pub struct Analyzer {
    classifier: HarmClassifier,
    interactions: InteractionDetector,
    estimation: EstimationEngine,
    guidance: GuidanceAdvisor,
}

impl Analyzer {
    pub fn new(lexicon: Arc<Lexicon>, config: AnalysisConfig) -> Result<Self> {
        let interactions = InteractionDetector::new(&lexicon);
        let estimation = EstimationEngine::new(&lexicon, config.estimation.clone());
        let guidance = GuidanceAdvisor::new(&lexicon);
        let classifier = HarmClassifier::new(lexicon, config)?;
        Ok(Self {
            classifier,
            interactions,
            estimation,
            guidance,
        })
    }

    /// Analyzer over the built-in lexicon and default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(Arc::new(Lexicon::builtin()?), AnalysisConfig::default())
    }

    pub fn classifier(&self) -> &HarmClassifier {
        &self.classifier
    }

    pub fn lexicon(&self) -> &Arc<Lexicon> {
        self.classifier.lexicon()
    }

    pub fn config(&self) -> &AnalysisConfig {
        self.classifier.config()
    }

    /// Fails only on invalid input
    pub fn analyze(&self, text: &str) -> Result<SituationAnalysis> {
        let start = Instant::now();
        let harm_matches = self.classifier.classify(text)?;
        let complexity_level = complexity_level(&harm_matches, &self.config().complexity);
        let interactions = self.interactions.detect_interactions(&harm_matches);
        let estimate = self.estimation.estimate_detailed(&harm_matches);
        let legal_guidance = self.guidance.advise(text, &harm_matches);

        debug!(
            matches = harm_matches.len(),
            complexity = complexity_level.as_str(),
            interactions = interactions.len(),
            legal_texts = legal_guidance.legal_texts.len(),
            latency_us = start.elapsed().as_micros() as u64,
            "Situation analyzed"
        );

        Ok(SituationAnalysis {
            harm_matches,
            complexity_level,
            interactions,
            estimation: estimate.range,
            estimation_breakdown: estimate.breakdown,
            estimation_notes: estimate.notes,
            legal_guidance,
        })
    }
}
