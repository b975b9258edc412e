//! Cross-source deduplication of records

use olivia_core::ExternalRecord;
use olivia_lexicon::normalize;
use std::collections::HashMap;

/// Identity of a record across providers: normalized title and jurisdiction/nature
pub fn dedup_key(record: &ExternalRecord) -> (String, String) {
    (
        normalize(&record.title),
        normalize(&record.jurisdiction_or_nature),
    )
}

/// Merge records sharing a [`dedup_key`].
///
/// First-seen order is kept. Of two duplicates the one with the longer
/// summary wins (the earlier one on a tie); provenances are unioned in
/// arrival order and details the winner lacks are filled from the other.
pub fn merge_records(records: impl IntoIterator<Item = ExternalRecord>) -> Vec<ExternalRecord> {
    let mut merged: Vec<ExternalRecord> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for record in records {
        let key = dedup_key(&record);
        match index.get(&key) {
            Some(&position) => absorb(&mut merged[position], record),
            None => {
                index.insert(key, merged.len());
                merged.push(record);
            }
        }
    }
    merged
}

fn absorb(kept: &mut ExternalRecord, incoming: ExternalRecord) {
    let mut provenance = std::mem::take(&mut kept.provenance);
    for p in &incoming.provenance {
        if !provenance.contains(p) {
            provenance.push(p.clone());
        }
    }

    if incoming.summary.chars().count() > kept.summary.chars().count() {
        let previous = std::mem::replace(kept, incoming);
        for (key, value) in previous.details {
            kept.details.entry(key).or_insert(value);
        }
        if kept.date.is_none() {
            kept.date = previous.date;
        }
    } else {
        for (key, value) in incoming.details {
            kept.details.entry(key).or_insert(value);
        }
        if kept.date.is_none() {
            kept.date = incoming.date;
        }
    }
    kept.provenance = provenance;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, jurisdiction: &str, summary: &str, provenance: &str) -> ExternalRecord {
        ExternalRecord::new(title, jurisdiction, "id", provenance).with_summary(summary)
    }

    #[test]
    fn test_identical_records_from_two_instances_merge() {
        let a = record("Arrêt n° 1", "Cour de cassation", "Résumé", "judilibre:1");
        let b = record("Arrêt n° 1", "Cour de cassation", "Résumé", "judilibre_mirror:1");

        let merged = merge_records(vec![a, b]);
        assert_eq!(merged.len(), 1);
        assert_eq!(
            merged[0].provenance,
            vec!["judilibre:1".to_string(), "judilibre_mirror:1".to_string()]
        );
    }

    #[test]
    fn test_richer_summary_wins_and_keeps_details() {
        let short = record("Code civil - Article 1240", "CODE", "Court", "legifrance:a")
            .with_detail("etat", "VIGUEUR");
        let long = record("CODE CIVIL - article 1240", "code", "Un résumé bien plus complet", "other:b")
            .with_date("2016-10-01");

        let merged = merge_records(vec![short, long]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].summary, "Un résumé bien plus complet");
        assert_eq!(merged[0].details.get("etat").map(String::as_str), Some("VIGUEUR"));
        assert_eq!(merged[0].date.as_deref(), Some("2016-10-01"));
        assert_eq!(
            merged[0].provenance,
            vec!["legifrance:a".to_string(), "other:b".to_string()]
        );
    }

    #[test]
    fn test_same_title_other_jurisdiction_is_distinct() {
        let merged = merge_records(vec![
            record("Arrêt du 12 mai 2022", "Cour de cassation", "", "a:1"),
            record("Arrêt du 12 mai 2022", "Cour d'appel de Lyon", "", "a:2"),
        ]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_merging_is_idempotent() {
        let records = vec![
            record("A", "X", "s", "p:1"),
            record("B", "X", "s", "p:2"),
            record("A", "X", "longer", "q:1"),
        ];
        let once = merge_records(records);
        let twice = merge_records(once.clone());
        assert_eq!(once, twice);
    }
}
