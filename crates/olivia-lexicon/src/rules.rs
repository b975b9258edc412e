//! Interaction rules between co-occurring harm categories

use olivia_core::HarmCategory;
use serde::{Deserialize, Serialize};

/// Warning emitted when every listed category is detected together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRule {
    /// Categories that must all be present (sorted and deduplicated on load)
    pub categories: Vec<HarmCategory>,

    /// Warning text shown to the user
    pub warning: String,
}

impl InteractionRule {
    pub fn new(categories: impl IntoIterator<Item = HarmCategory>, warning: impl Into<String>) -> Self {
        let mut rule = Self {
            categories: categories.into_iter().collect(),
            warning: warning.into(),
        };
        rule.canonicalize();
        rule
    }

    /// Sort and deduplicate the category set so order in the lexicon is irrelevant
    pub fn canonicalize(&mut self) {
        self.categories.sort();
        self.categories.dedup();
    }

    /// Canonical key of the category set, e.g. `economic+physical`
    pub fn key(&self) -> String {
        canonical_key(self.categories.iter())
    }

    /// Whether every category of this rule is in `present`
    pub fn applies_to<'a>(&self, present: impl IntoIterator<Item = &'a HarmCategory> + Clone) -> bool {
        self.categories
            .iter()
            .all(|needed| present.clone().into_iter().any(|c| c == needed))
    }
}

/// Canonical key for an unordered set of categories
pub fn canonical_key<'a>(categories: impl IntoIterator<Item = &'a HarmCategory>) -> String {
    let mut ids: Vec<&str> = categories.into_iter().map(HarmCategory::as_str).collect();
    ids.sort_unstable();
    ids.dedup();
    ids.join("+")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_order_independent() {
        let a = InteractionRule::new(
            [HarmCategory::new("physical"), HarmCategory::new("economic")],
            "w",
        );
        let b = InteractionRule::new(
            [HarmCategory::new("economic"), HarmCategory::new("physical")],
            "w",
        );
        assert_eq!(a.key(), "economic+physical");
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_applies_to_requires_every_category() {
        let rule = InteractionRule::new(
            [
                HarmCategory::new("physical"),
                HarmCategory::new("psychological"),
                HarmCategory::new("economic"),
            ],
            "w",
        );
        let present = [HarmCategory::new("physical"), HarmCategory::new("economic")];
        assert!(!rule.applies_to(present.iter()));

        let present = [
            HarmCategory::new("economic"),
            HarmCategory::new("physical"),
            HarmCategory::new("psychological"),
        ];
        assert!(rule.applies_to(present.iter()));
    }
}
