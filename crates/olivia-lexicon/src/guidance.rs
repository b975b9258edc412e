//! Conditional legal guidance entries

use olivia_core::{Deadline, EvidenceItem, HarmCategory, LegalRisk, LegalText};
use serde::{Deserialize, Serialize};

use crate::text::{contains_term, normalize};

/// When a guidance entry applies.
///
/// An empty trigger always fires. `any_of` needs one term present,
/// `categories` needs one category detected and `none_of` vetoes the entry
/// when any of its terms is present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub none_of: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<HarmCategory>,
}

impl Trigger {
    /// `text` must already be normalized
    pub fn fires<'a>(&self, text: &str, detected: impl IntoIterator<Item = &'a HarmCategory>) -> bool {
        if !self.any_of.is_empty() && !self.any_of.iter().any(|t| contains_term(text, t)) {
            return false;
        }
        if self.none_of.iter().any(|t| contains_term(text, t)) {
            return false;
        }
        if self.categories.is_empty() {
            return true;
        }
        detected.into_iter().any(|c| self.categories.contains(c))
    }

    fn normalize_terms(&mut self) {
        self.any_of = self.any_of.iter().map(|t| normalize(t)).collect();
        self.none_of = self.none_of.iter().map(|t| normalize(t)).collect();
    }

    pub(crate) fn terms(&self) -> impl Iterator<Item = &String> {
        self.any_of.iter().chain(self.none_of.iter())
    }
}

/// A guidance item with its trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidanceRule<T> {
    #[serde(flatten)]
    pub item: T,

    #[serde(default)]
    pub when: Trigger,
}

/// Guidance tables, each evaluated in declaration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuidanceTable {
    #[serde(default)]
    pub legal_texts: Vec<GuidanceRule<LegalText>>,

    #[serde(default)]
    pub deadlines: Vec<GuidanceRule<Deadline>>,

    #[serde(default)]
    pub evidence: Vec<GuidanceRule<EvidenceItem>>,

    #[serde(default)]
    pub risks: Vec<GuidanceRule<LegalRisk>>,
}

impl GuidanceTable {
    pub(crate) fn normalize_terms(&mut self) {
        for trigger in self.triggers_mut() {
            trigger.normalize_terms();
        }
    }

    /// Every trigger with a short label naming its entry
    pub(crate) fn triggers(&self) -> Vec<(String, &Trigger)> {
        let mut out = Vec::new();
        out.extend(self.legal_texts.iter().map(|r| (r.item.title.clone(), &r.when)));
        out.extend(self.deadlines.iter().map(|r| (r.item.label.clone(), &r.when)));
        out.extend(self.evidence.iter().map(|r| (r.item.item.clone(), &r.when)));
        out.extend(self.risks.iter().map(|r| (r.item.risk.clone(), &r.when)));
        out
    }

    /// Kind of the first entry missing required text
    pub(crate) fn blank_entries(&self) -> Option<&'static str> {
        if self
            .legal_texts
            .iter()
            .any(|r| r.item.title.trim().is_empty() || r.item.reference.trim().is_empty())
        {
            return Some("legal text");
        }
        if self
            .deadlines
            .iter()
            .any(|r| r.item.label.trim().is_empty() || r.item.period.trim().is_empty())
        {
            return Some("deadline");
        }
        if self.evidence.iter().any(|r| r.item.item.trim().is_empty()) {
            return Some("evidence item");
        }
        if self.risks.iter().any(|r| r.item.risk.trim().is_empty()) {
            return Some("risk");
        }
        None
    }

    fn triggers_mut(&mut self) -> impl Iterator<Item = &mut Trigger> {
        self.legal_texts
            .iter_mut()
            .map(|r| &mut r.when)
            .chain(self.deadlines.iter_mut().map(|r| &mut r.when))
            .chain(self.evidence.iter_mut().map(|r| &mut r.when))
            .chain(self.risks.iter_mut().map(|r| &mut r.when))
    }
}
