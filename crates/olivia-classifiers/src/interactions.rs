//! Interaction detector
//!
//! Looks up the lexicon's rule table for category sets that are all present
//! among the matches. Output order follows the canonical key of each rule so
//! the result does not depend on the order of the input matches.

use olivia_core::{HarmCategory, HarmMatch};
use olivia_lexicon::{InteractionRule, Lexicon};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A triggered interaction rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interaction {
    /// Canonical key of the category set, e.g. `economic+physical`
    pub key: String,
    pub categories: Vec<HarmCategory>,
    pub warning: String,
}

/// Rule table indexed by canonical key
#[derive(Debug, Clone, Default)]
pub struct InteractionDetector {
    rules: BTreeMap<String, InteractionRule>,
}

impl InteractionDetector {
    /// Index the lexicon's rules; a later rule with the same key replaces an earlier one
    pub fn new(lexicon: &Lexicon) -> Self {
        Self::from_rules(lexicon.interactions.iter().cloned())
    }

    pub fn from_rules(rules: impl IntoIterator<Item = InteractionRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|mut rule| {
                rule.canonicalize();
                (rule.key(), rule)
            })
            .collect();
        Self { rules }
    }

    /// Triggered rules, sorted by canonical key
    pub fn detect(&self, matches: &[HarmMatch]) -> Vec<Interaction> {
        let present: BTreeSet<&HarmCategory> = matches.iter().map(|m| &m.category).collect();

        self.rules
            .iter()
            .filter(|(_, rule)| rule.categories.iter().all(|c| present.contains(c)))
            .map(|(key, rule)| Interaction {
                key: key.clone(),
                categories: rule.categories.clone(),
                warning: rule.warning.clone(),
            })
            .collect()
    }

    /// Warning strings of the triggered rules, sorted by canonical key
    pub fn detect_interactions(&self, matches: &[HarmMatch]) -> Vec<String> {
        self.detect(matches).into_iter().map(|i| i.warning).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
