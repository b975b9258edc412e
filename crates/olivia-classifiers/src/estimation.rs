//! Estimation engine
//!
//! Each matched category contributes its base band scaled by its confidence.
//! Contributions are ranked, largest first, and weighted by
//! `max(decay^rank, floor)` before being summed.

use olivia_core::{CategoryEstimate, CompensationBand, EstimationRange, HarmCategory, HarmMatch};
use olivia_lexicon::Lexicon;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

use crate::config::EstimationConfig;

/// Caveats attached to every estimate
pub const ESTIMATION_NOTES: [&str; 4] = [
    "Les montants sont indicatifs et basés sur un barème interne non officiel.",
    "Une expertise médicale et économique est nécessaire pour préciser les montants.",
    "Les préjudices complexes nécessitent souvent une majoration.",
    "Ces estimations ne remplacent pas une expertise judiciaire.",
];

/// Range plus the per-category detail it was computed from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Estimate {
    pub range: EstimationRange,
    pub breakdown: Vec<CategoryEstimate>,
    pub notes: Vec<String>,
}

/// Diminishing-returns estimator over lexicon bands
#[derive(Debug, Clone)]
pub struct EstimationEngine {
    bands: BTreeMap<HarmCategory, CompensationBand>,
    config: EstimationConfig,
}

impl EstimationEngine {
    pub fn new(lexicon: &Lexicon, config: EstimationConfig) -> Self {
        let bands = lexicon
            .categories
            .iter()
            .map(|c| (c.id.clone(), c.band))
            .collect();
        Self { bands, config }
    }

    /// Indicative range; `{0, 0}` when there is nothing to estimate
    pub fn estimate(&self, matches: &[HarmMatch]) -> EstimationRange {
        self.estimate_detailed(matches).range
    }

    pub fn estimate_detailed(&self, matches: &[HarmMatch]) -> Estimate {
        let notes = ESTIMATION_NOTES.iter().map(|n| n.to_string()).collect();

        // Highest confidence per category, keyed for order independence
        let mut best: BTreeMap<&HarmCategory, f64> = BTreeMap::new();
        for m in matches {
            let entry = best.entry(&m.category).or_insert(m.confidence);
            *entry = entry.max(m.confidence);
        }

        let mut contributions: Vec<CategoryEstimate> = best
            .into_iter()
            .filter_map(|(category, confidence)| {
                let Some(band) = self.bands.get(category) else {
                    warn!(category = %category, "No compensation band for category, skipped");
                    return None;
                };
                let factor = confidence.clamp(0.0, 100.0) / 100.0;
                Some(CategoryEstimate {
                    category: category.clone(),
                    band: *band,
                    confidence,
                    weight: 1.0,
                    min: band.min * factor,
                    max: band.max * factor,
                })
            })
            .collect();

        contributions.sort_by(|a, b| {
            b.max
                .total_cmp(&a.max)
                .then_with(|| b.min.total_cmp(&a.min))
                .then_with(|| a.category.cmp(&b.category))
        });

        let mut total_min = 0.0;
        let mut total_max = 0.0;
        for (rank, contribution) in contributions.iter_mut().enumerate() {
            let weight = self.weight(rank);
            contribution.weight = weight;
            contribution.min = to_cents(contribution.min * weight);
            contribution.max = to_cents(contribution.max * weight);
            total_min += contribution.min;
            total_max += contribution.max;
        }

        let range = if contributions.is_empty() {
            EstimationRange::zero()
        } else {
            EstimationRange::eur(total_min.floor() as u64, total_max.ceil() as u64)
        };

        Estimate {
            range,
            breakdown: contributions,
            notes,
        }
    }

    fn weight(&self, rank: usize) -> f64 {
        let exponent = i32::try_from(rank).unwrap_or(i32::MAX);
        self.config.decay.powi(exponent).max(self.config.floor)
    }
}

fn to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
