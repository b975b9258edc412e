//! Harm classifier
//!
//! Scores every lexicon category against the normalized input text with one
//! Aho-Corasick automaton per category. Scoring is a pure function of the
//! text, the lexicon and the [`AnalysisConfig`].

use aho_corasick::{AhoCorasick, MatchKind};
use olivia_core::{Error, HarmMatch, Result};
use olivia_lexicon::{contains_term, normalize, word_match_end, CategoryDefinition, Lexicon};
use std::sync::Arc;
use tracing::debug;

use crate::config::AnalysisConfig;

/// Raw score of one category before thresholding
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryScore {
    /// Index of the category in the lexicon
    pub index: usize,

    /// Weighted score before normalization
    pub raw: f64,

    /// Confidence in [0, 100], one decimal
    pub confidence: f64,

    /// Matched terms in pattern order, negated hits as `!term`
    pub evidence: Vec<String>,
}

struct CategoryMatcher {
    automaton: AhoCorasick,
}

impl CategoryMatcher {
    /// `(start, pattern index)` of every whole-word hit, leftmost-longest and
    /// non-overlapping.
    ///
    /// Boundaries are checked before choosing, so a longer pattern that ends
    /// inside a word does not hide a shorter one starting at the same place.
    fn word_matches(&self, text: &str) -> Vec<(usize, usize)> {
        let mut candidates: Vec<(usize, usize, usize)> = self
            .automaton
            .find_overlapping_iter(text)
            .filter(|m| word_match_end(text, m.start(), m.end()).is_some())
            .map(|m| (m.start(), m.end(), m.pattern().as_usize()))
            .collect();
        candidates.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

        let mut chosen = Vec::new();
        let mut covered_until = 0;
        for (start, end, index) in candidates {
            if start >= covered_until {
                chosen.push((start, index));
                covered_until = end;
            }
        }
        chosen
    }
}

/// Lexicon-driven harm classifier
pub struct HarmClassifier {
    lexicon: Arc<Lexicon>,
    config: AnalysisConfig,
    matchers: Vec<CategoryMatcher>,
}

impl HarmClassifier {
    /// Build one matcher per category
    pub fn new(lexicon: Arc<Lexicon>, config: AnalysisConfig) -> Result<Self> {
        config.validate()?;

        let matchers = lexicon
            .categories
            .iter()
            .map(|category| {
                let terms: Vec<&str> = category.patterns.iter().map(|p| p.term.as_str()).collect();
                let automaton = AhoCorasick::builder()
                    .match_kind(MatchKind::Standard)
                    .build(&terms)
                    .map_err(|e| {
                        Error::config(format!(
                            "failed to build matcher for '{}': {}",
                            category.id, e
                        ))
                    })?;
                Ok(CategoryMatcher { automaton })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            lexicon,
            config,
            matchers,
        })
    }

    pub fn lexicon(&self) -> &Arc<Lexicon> {
        &self.lexicon
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Reject empty, whitespace-only or out-of-bounds text
    pub fn validate_input(&self, text: &str) -> Result<()> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_input("description_situation must not be empty"));
        }
        let chars = trimmed.chars().count();
        if chars < self.config.min_input_chars {
            return Err(Error::invalid_input(format!(
                "description_situation is too short ({} characters, minimum {})",
                chars, self.config.min_input_chars
            )));
        }
        if chars > self.config.max_input_chars {
            return Err(Error::invalid_input(format!(
                "description_situation is too long ({} characters, maximum {})",
                chars, self.config.max_input_chars
            )));
        }
        Ok(())
    }

    /// Classify text into harm matches above the detection threshold.
    ///
    /// Matches are sorted by confidence, highest first; equal confidences
    /// keep lexicon declaration order.
    pub fn classify(&self, text: &str) -> Result<Vec<HarmMatch>> {
        let scores = self.score(text)?;

        let mut matches: Vec<HarmMatch> = scores
            .into_iter()
            .filter(|s| s.confidence > self.config.detection_threshold)
            .map(|s| {
                let category = &self.lexicon.categories[s.index];
                HarmMatch {
                    category: category.id.clone(),
                    label: category.label.clone(),
                    description: category.description.clone(),
                    confidence: s.confidence,
                    evidence: s.evidence,
                }
            })
            .collect();

        matches.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        debug!(
            matches = matches.len(),
            categories = ?matches.iter().map(|m| m.category.as_str()).collect::<Vec<_>>(),
            "Classified situation"
        );
        Ok(matches)
    }

    /// Score every category with at least one positive hit, in declaration order
    pub fn score(&self, text: &str) -> Result<Vec<CategoryScore>> {
        self.validate_input(text)?;
        let normalized = normalize(text);

        Ok(self
            .lexicon
            .categories
            .iter()
            .zip(&self.matchers)
            .enumerate()
            .filter_map(|(index, (category, matcher))| {
                self.score_category(&normalized, category, matcher)
                    .map(|(raw, evidence)| CategoryScore {
                        index,
                        raw,
                        confidence: self.confidence(raw),
                        evidence,
                    })
            })
            .collect())
    }

    fn score_category(
        &self,
        text: &str,
        category: &CategoryDefinition,
        matcher: &CategoryMatcher,
    ) -> Option<(f64, Vec<String>)> {
        let patterns = &category.patterns;
        let mut hits = vec![0usize; patterns.len()];
        let mut negated = vec![false; patterns.len()];

        for (start, index) in matcher.word_matches(text) {
            if self.is_negated(&text[..start]) {
                negated[index] = true;
            } else {
                hits[index] += 1;
            }
        }

        let mut raw: f64 = patterns
            .iter()
            .zip(&hits)
            .filter(|&(_, &count)| count > 0)
            .map(|(p, &count)| p.weight * (1.0 + self.config.repeat_bonus * (count - 1) as f64))
            .sum();
        if raw <= 0.0 {
            return None;
        }

        for boost in &category.boosts {
            if boost.all_of.iter().all(|term| contains_term(text, term)) {
                raw += boost.bonus;
            }
        }
        for downgrade in &category.downgrades {
            if contains_term(text, &downgrade.term) {
                raw -= downgrade.penalty;
            }
        }

        let mut evidence = Vec::new();
        for (i, pattern) in patterns.iter().enumerate() {
            if hits[i] > 0 {
                evidence.push(pattern.term.clone());
            }
        }
        for (i, pattern) in patterns.iter().enumerate() {
            if negated[i] && hits[i] == 0 {
                evidence.push(format!("!{}", pattern.term));
            }
        }

        Some((raw.max(0.0), evidence))
    }

    /// Whether a negation cue appears within the window of tokens before a hit
    fn is_negated(&self, before: &str) -> bool {
        if self.config.negation_window == 0 || self.lexicon.negations.is_empty() {
            return false;
        }
        let tokens: Vec<&str> = before.split_whitespace().collect();
        let from = tokens.len().saturating_sub(self.config.negation_window);
        let window = tokens[from..].join(" ");
        self.lexicon
            .negations
            .iter()
            .any(|cue| contains_term(&window, cue))
    }

    fn confidence(&self, raw: f64) -> f64 {
        let scaled = (raw / self.config.score_saturation * 100.0).clamp(0.0, 100.0);
        (scaled * 10.0).round() / 10.0
    }
}
