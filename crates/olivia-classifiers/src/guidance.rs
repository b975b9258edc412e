//! Legal guidance selection

use olivia_core::{HarmMatch, LegalGuidance};
use olivia_lexicon::{normalize, GuidanceRule, GuidanceTable, Lexicon};

/// Selects the lexicon's guidance entries that apply to a situation
pub struct GuidanceAdvisor {
    table: GuidanceTable,
}

impl GuidanceAdvisor {
    pub fn new(lexicon: &Lexicon) -> Self {
        Self {
            table: lexicon.guidance.clone(),
        }
    }

    /// Guidance for `text` given its harm matches; empty without matches
    pub fn advise(&self, text: &str, matches: &[HarmMatch]) -> LegalGuidance {
        if matches.is_empty() {
            return LegalGuidance::default();
        }
        let text = normalize(text);
        LegalGuidance {
            legal_texts: select(&self.table.legal_texts, &text, matches),
            deadlines: select(&self.table.deadlines, &text, matches),
            evidence: select(&self.table.evidence, &text, matches),
            risks: select(&self.table.risks, &text, matches),
        }
    }
}

fn select<T: Clone + PartialEq>(rules: &[GuidanceRule<T>], text: &str, matches: &[HarmMatch]) -> Vec<T> {
    let mut out: Vec<T> = Vec::new();
    for rule in rules {
        if rule.when.fires(text, matches.iter().map(|m| &m.category)) && !out.contains(&rule.item) {
            out.push(rule.item.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harm::HarmClassifier;
    use crate::AnalysisConfig;
    use std::sync::Arc;

    fn advise(text: &str) -> LegalGuidance {
        let lexicon = Arc::new(Lexicon::builtin().unwrap());
        let advisor = GuidanceAdvisor::new(&lexicon);
        let classifier = HarmClassifier::new(lexicon, AnalysisConfig::default()).unwrap();
        let matches = classifier.classify(text).unwrap();
        advisor.advise(text, &matches)
    }

    fn titles(guidance: &LegalGuidance) -> Vec<&str> {
        guidance.legal_texts.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn test_road_accident_brings_badinter() {
        let guidance = advise(
            "J'ai subi un accident de la route, douleurs physiques persistantes et je n'arrive plus à travailler",
        );
        let titles = titles(&guidance);
        assert_eq!(titles[0], "Code civil, responsabilité civile");
        assert!(titles.contains(&"Loi Badinter"));
        assert!(titles.contains(&"Nomenclature Dintilhac"));
        assert!(guidance
            .deadlines
            .iter()
            .any(|d| d.period == "10 ans à compter de la consolidation"));
        assert!(guidance.evidence.iter().any(|e| e.kind == "Financière"));
    }

    #[test]
    fn test_assault_without_traffic_skips_badinter() {
        let guidance = advise("Je souffre d'anxiété et de cauchemars depuis l'agression");
        assert!(!titles(&guidance).contains(&"Loi Badinter"));
        assert!(!guidance.evidence.iter().any(|e| e.kind == "Financière"));
    }

    #[test]
    fn test_missing_medical_evidence_is_a_risk() {
        let guidance = advise("Fracture du bras et douleurs persistantes");
        assert_eq!(guidance.risks.len(), 1);
        assert_eq!(guidance.risks[0].risk, "Preuves médicales insuffisantes");

        let guidance = advise("Fracture du bras, douleurs persistantes, certificat du médecin en main");
        assert!(guidance.risks.is_empty());
    }

    #[test]
    fn test_no_harm_means_no_guidance() {
        assert!(advise("Je souhaite simplement un renseignement").is_empty());
    }

    #[test]
    fn test_duplicate_entries_are_emitted_once() {
        let yaml = r#"
categories:
  - id: physical
    label: Préjudice corporel
    band: { min: 1000, max: 5000 }
    patterns:
      - { term: "fracture" }
guidance:
  legal_texts:
    - { title: "Code civil", reference: "Art. 1240" }
    - { title: "Code civil", reference: "Art. 1240", when: { categories: [physical] } }
"#;
        let lexicon = Arc::new(Lexicon::from_yaml(yaml).unwrap());
        let advisor = GuidanceAdvisor::new(&lexicon);
        let matches = vec![HarmMatch::new("physical", 80.0)];
        assert_eq!(advisor.advise("une fracture", &matches).legal_texts.len(), 1);
    }
}
