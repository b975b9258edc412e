//! Legal guidance attached to an analysis: applicable texts, deadlines,
//! evidence to gather and obstacles to anticipate

use serde::{Deserialize, Serialize};

/// A legal text relevant to the situation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalText {
    /// e.g. `Loi Badinter`
    pub title: String,

    /// Article or official reference
    pub reference: String,

    /// What the text governs in this context
    #[serde(default)]
    pub scope: String,
}

/// A procedural deadline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deadline {
    pub label: String,

    /// Duration and starting point, e.g. `10 ans à compter de la consolidation`
    pub period: String,
}

/// A piece of evidence the victim should gather
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Evidence family, e.g. `Médicale`
    pub kind: String,

    pub item: String,

    pub urgency: String,
}

/// An obstacle to the claim and how to address it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalRisk {
    pub risk: String,
    pub impact: String,
    pub remedy: String,
}

/// Guidance selected from the lexicon for one situation.
///
/// Every list follows lexicon declaration order without duplicates; all
/// lists are empty when no harm was detected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalGuidance {
    pub legal_texts: Vec<LegalText>,
    pub deadlines: Vec<Deadline>,
    pub evidence: Vec<EvidenceItem>,
    pub risks: Vec<LegalRisk>,
}

impl LegalGuidance {
    pub fn is_empty(&self) -> bool {
        self.legal_texts.is_empty()
            && self.deadlines.is_empty()
            && self.evidence.is_empty()
            && self.risks.is_empty()
    }
}
