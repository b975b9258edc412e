//! Lexicon definitions and loading

use olivia_core::{CompensationBand, Error, HarmCategory, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

use crate::guidance::GuidanceTable;
use crate::rules::InteractionRule;
use crate::text::normalize;

const BUILTIN_LEXICON: &str = include_str!("../lexicon/default.yaml");

/// Ordered set of harm category definitions plus interaction rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lexicon {
    /// Lexicon version
    #[serde(default)]
    pub version: String,

    /// Cues that negate a pattern hit when they precede it
    #[serde(default)]
    pub negations: Vec<String>,

    /// Category definitions, in declaration order
    pub categories: Vec<CategoryDefinition>,

    /// Warnings for co-occurring categories
    #[serde(default)]
    pub interactions: Vec<InteractionRule>,

    /// Applicable texts, deadlines, evidence and risks
    #[serde(default)]
    pub guidance: GuidanceTable,
}

/// A single harm category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDefinition {
    /// Category tag
    pub id: HarmCategory,

    /// Display label
    pub label: String,

    /// What this category covers
    #[serde(default)]
    pub description: String,

    /// Base compensation band in euros
    pub band: CompensationBand,

    /// Query handed to legal-data sources for this category
    #[serde(default)]
    pub search_query: String,

    /// Advice emitted when the category is detected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,

    /// Weighted detection patterns
    pub patterns: Vec<PatternSpec>,

    /// Co-occurrence boosts
    #[serde(default)]
    pub boosts: Vec<BoostSpec>,

    /// Terms lowering the score
    #[serde(default)]
    pub downgrades: Vec<DowngradeSpec>,
}

/// A detection term and its weight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternSpec {
    pub term: String,

    #[serde(default = "default_weight")]
    pub weight: f64,
}

/// Bonus applied when every term of the group is present
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostSpec {
    pub all_of: Vec<String>,
    pub bonus: f64,
}

/// Penalty applied when the term is present
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DowngradeSpec {
    pub term: String,
    pub penalty: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl Lexicon {
    /// The lexicon shipped with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_LEXICON)
    }

    /// Load a lexicon from YAML string, normalized and validated
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let lexicon: Lexicon = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("malformed lexicon: {}", e)))?;
        lexicon.prepared()
    }

    /// Load a lexicon from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read lexicon {}: {}", path.display(), e))
        })?;
        let lexicon = Self::from_yaml(&content)?;
        info!(
            "Loaded lexicon {} ({} categories, {} interaction rules) from {}",
            lexicon.version,
            lexicon.categories.len(),
            lexicon.interactions.len(),
            path.display()
        );
        Ok(lexicon)
    }

    /// Normalize every term, then validate
    fn prepared(mut self) -> Result<Self> {
        self.negations = self.negations.iter().map(|n| normalize(n)).collect();
        for category in &mut self.categories {
            for pattern in &mut category.patterns {
                pattern.term = normalize(&pattern.term);
            }
            for boost in &mut category.boosts {
                boost.all_of = boost.all_of.iter().map(|t| normalize(t)).collect();
            }
            for downgrade in &mut category.downgrades {
                downgrade.term = normalize(&downgrade.term);
            }
        }
        for rule in &mut self.interactions {
            rule.canonicalize();
        }
        self.guidance.normalize_terms();
        self.validate()?;
        Ok(self)
    }

    /// Check structural invariants; any violation is a configuration error
    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(Error::config("lexicon defines no categories"));
        }

        let mut ids = HashSet::new();
        for category in &self.categories {
            let id = category.id.as_str();
            if id.trim().is_empty() {
                return Err(Error::config("category with empty id"));
            }
            if !ids.insert(id) {
                return Err(Error::config(format!("duplicate category '{}'", id)));
            }
            if !category.band.is_valid() {
                return Err(Error::config(format!(
                    "category '{}' has an invalid band [{}, {}]",
                    id, category.band.min, category.band.max
                )));
            }
            if category.patterns.is_empty() {
                return Err(Error::config(format!("category '{}' has no patterns", id)));
            }

            let mut terms = HashSet::new();
            for pattern in &category.patterns {
                if pattern.term.is_empty() {
                    return Err(Error::config(format!("category '{}' has an empty pattern", id)));
                }
                if !(pattern.weight.is_finite() && pattern.weight > 0.0) {
                    return Err(Error::config(format!(
                        "pattern '{}' in '{}' must have a positive weight",
                        pattern.term, id
                    )));
                }
                if !terms.insert(pattern.term.as_str()) {
                    return Err(Error::config(format!(
                        "duplicate pattern '{}' in '{}'",
                        pattern.term, id
                    )));
                }
            }
            for boost in &category.boosts {
                if boost.all_of.is_empty() || boost.all_of.iter().any(String::is_empty) {
                    return Err(Error::config(format!("category '{}' has an empty boost group", id)));
                }
                if !(boost.bonus.is_finite() && boost.bonus >= 0.0) {
                    return Err(Error::config(format!("category '{}' has a negative boost", id)));
                }
            }
            for downgrade in &category.downgrades {
                if downgrade.term.is_empty() || !(downgrade.penalty.is_finite() && downgrade.penalty >= 0.0) {
                    return Err(Error::config(format!("category '{}' has an invalid downgrade", id)));
                }
            }
        }

        for rule in &self.interactions {
            if rule.categories.len() < 2 {
                return Err(Error::config(format!(
                    "interaction rule '{}' needs at least two categories",
                    rule.key()
                )));
            }
            if let Some(unknown) = rule.categories.iter().find(|c| !ids.contains(c.as_str())) {
                return Err(Error::config(format!(
                    "interaction rule '{}' names unknown category '{}'",
                    rule.key(),
                    unknown
                )));
            }
            if rule.warning.trim().is_empty() {
                return Err(Error::config(format!("interaction rule '{}' has no warning", rule.key())));
            }
        }

        if let Some(kind) = self.guidance.blank_entries() {
            return Err(Error::config(format!("guidance {} with missing text", kind)));
        }
        for (label, trigger) in self.guidance.triggers() {
            if trigger.terms().any(String::is_empty) {
                return Err(Error::config(format!("guidance '{}' has an empty trigger term", label)));
            }
            if let Some(unknown) = trigger.categories.iter().find(|c| !ids.contains(c.as_str())) {
                return Err(Error::config(format!(
                    "guidance '{}' names unknown category '{}'",
                    label, unknown
                )));
            }
        }

        Ok(())
    }

    /// Look up a category definition
    pub fn category(&self, id: &HarmCategory) -> Option<&CategoryDefinition> {
        self.categories.iter().find(|c| &c.id == id)
    }

    /// Declaration index of a category, used for deterministic ordering
    pub fn position(&self, id: &HarmCategory) -> Option<usize> {
        self.categories.iter().position(|c| &c.id == id)
    }

    /// Category tags in declaration order
    pub fn category_ids(&self) -> impl Iterator<Item = &HarmCategory> {
        self.categories.iter().map(|c| &c.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
version: "test"
negations: ["pas de"]
categories:
  - id: physical
    label: Préjudice corporel
    band: { min: 1000, max: 5000 }
    patterns:
      - { term: "Douleur", weight: 1.0 }
      - { term: "Fracture" }
  - id: economic
    label: Préjudice économique
    band: { min: 500, max: 2000 }
    patterns:
      - { term: "salaire", weight: 0.5 }
interactions:
  - categories: [economic, physical]
    warning: "Lien corporel / économique"
guidance:
  legal_texts:
    - title: "Loi Badinter"
      reference: "Loi 85-677 du 5 juillet 1985"
      when: { any_of: ["Accident de la Route"] }
  deadlines:
    - label: "Prescription"
      period: "10 ans à compter de la consolidation"
      when: { categories: [physical] }
"#;

    #[test]
    fn test_builtin_lexicon_is_valid() {
        let lexicon = Lexicon::builtin().unwrap();
        assert!(lexicon.categories.len() >= 5);
        let ids: Vec<_> = lexicon.category_ids().map(|c| c.as_str().to_string()).collect();
        for expected in ["physical", "psychological", "economic", "material", "moral"] {
            assert!(ids.contains(&expected.to_string()), "missing {}", expected);
        }
        assert!(!lexicon.interactions.is_empty());
        assert!(!lexicon.guidance.legal_texts.is_empty());
        assert!(!lexicon.guidance.deadlines.is_empty());
        assert!(!lexicon.guidance.evidence.is_empty());
        assert!(!lexicon.guidance.risks.is_empty());
    }

    #[test]
    fn test_terms_are_normalized_on_load() {
        let lexicon = Lexicon::from_yaml(MINIMAL).unwrap();
        let physical = lexicon.category(&HarmCategory::new("physical")).unwrap();
        assert_eq!(physical.patterns[0].term, "douleur");
        assert_eq!(physical.patterns[1].weight, 1.0);
        assert_eq!(lexicon.position(&HarmCategory::new("economic")), Some(1));
        assert_eq!(lexicon.interactions[0].categories[0].as_str(), "economic");
    }

    #[test]
    fn test_inverted_band_is_rejected() {
        let yaml = MINIMAL.replace("{ min: 1000, max: 5000 }", "{ min: 5000, max: 1000 }");
        let err = Lexicon::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_unknown_interaction_category_is_rejected() {
        let yaml = MINIMAL.replace("[economic, physical]", "[economic, aesthetic]");
        let err = Lexicon::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("aesthetic"));
    }

    #[test]
    fn test_duplicate_category_is_rejected() {
        let yaml = MINIMAL.replace("id: economic", "id: physical");
        assert!(Lexicon::from_yaml(&yaml).is_err());
    }

    #[test]
    fn test_guidance_triggers_are_normalized() {
        let lexicon = Lexicon::from_yaml(MINIMAL).unwrap();
        assert_eq!(lexicon.guidance.legal_texts[0].when.any_of, vec!["accident de la route"]);
    }

    #[test]
    fn test_guidance_with_unknown_category_is_rejected() {
        let yaml = MINIMAL.replace("when: { categories: [physical] }", "when: { categories: [aesthetic] }");
        let err = Lexicon::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("aesthetic"));
    }

    #[test]
    fn test_guidance_with_blank_reference_is_rejected() {
        let yaml = MINIMAL.replace("\"Loi 85-677 du 5 juillet 1985\"", "\"  \"");
        assert!(matches!(Lexicon::from_yaml(&yaml), Err(Error::Config(_))));

        let yaml = MINIMAL.replace("[\"Accident de la Route\"]", "[\"!!\"]");
        assert!(matches!(Lexicon::from_yaml(&yaml), Err(Error::Config(_))));
    }

    #[test]
    fn test_garbage_yaml_is_a_config_error() {
        let err = Lexicon::from_yaml("categories: 12").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexicon.yaml");
        std::fs::write(&path, MINIMAL).unwrap();

        let lexicon = Lexicon::from_file(&path).unwrap();
        assert_eq!(lexicon.version, "test");

        let missing = Lexicon::from_file(dir.path().join("absent.yaml"));
        assert!(matches!(missing, Err(Error::Config(_))));
    }
}
