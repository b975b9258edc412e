//! Deterministic next-step recommendations

use olivia_core::{ComplexityLevel, HarmCategory, HarmMatch};
use olivia_lexicon::Lexicon;
use std::collections::BTreeSet;

/// What happened to the postal code of the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationLookup {
    /// No postal code given, or an unusable one
    NotRequested,
    /// Lookup ran and found nothing
    NoneFound,
    Found,
}

/// Everything recommendations depend on
pub struct RecommendationContext<'a> {
    pub lexicon: &'a Lexicon,
    pub matches: &'a [HarmMatch],
    pub complexity: ComplexityLevel,
    /// Categories where a case-law source answered and no decision came back.
    /// Failed retrievals never land here.
    pub case_law_empty: &'a BTreeSet<HarmCategory>,
    pub degraded: bool,
    pub locations: LocationLookup,
}

pub fn recommend(ctx: &RecommendationContext<'_>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();

    if ctx.matches.is_empty() {
        push(
            &mut out,
            "Aucun préjudice n'a été clairement identifié : décrivez plus précisément les faits, leurs conséquences et leur durée.",
        );
    }

    for m in ctx.matches {
        if let Some(text) = ctx
            .lexicon
            .category(&m.category)
            .and_then(|c| c.recommendation.as_deref())
        {
            push(&mut out, text);
        }
    }

    for m in ctx.matches {
        if ctx.case_law_empty.contains(&m.category) {
            push(
                &mut out,
                &format!(
                    "Aucune jurisprudence trouvée pour le {} : consultez un avocat spécialisé dans ce type de préjudice.",
                    m.label.to_lowercase()
                ),
            );
        }
    }

    match ctx.complexity {
        ComplexityLevel::Complex => push(
            &mut out,
            "Situation complexe : faites-vous accompagner par un avocat et un médecin-conseil de victimes pour une évaluation indépendante.",
        ),
        ComplexityLevel::Moderate => push(
            &mut out,
            "Plusieurs préjudices sont en jeu : constituez un justificatif distinct pour chacun d'eux.",
        ),
        ComplexityLevel::Simple => {}
    }

    if !ctx.matches.is_empty() {
        push(
            &mut out,
            "Rassemblez sous deux semaines l'ensemble des preuves médicales et des justificatifs de pertes.",
        );
    }

    if ctx.degraded {
        push(
            &mut out,
            "Certaines sources juridiques étaient indisponibles : relancez la recherche ultérieurement pour compléter les références.",
        );
    }

    match ctx.locations {
        LocationLookup::NotRequested => push(
            &mut out,
            "Indiquez votre code postal pour obtenir les lieux de justice les plus proches.",
        ),
        LocationLookup::NoneFound => push(
            &mut out,
            "Aucun lieu de justice trouvé pour ce code postal : rapprochez-vous du point-justice ou de l'association d'aide aux victimes de votre département.",
        ),
        LocationLookup::Found => {}
    }

    out
}

fn push(out: &mut Vec<String>, text: &str) {
    if !out.iter().any(|existing| existing == text) {
        out.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched(lexicon: &Lexicon, id: &str, confidence: f64) -> HarmMatch {
        let definition = lexicon.category(&HarmCategory::new(id)).unwrap();
        let mut m = HarmMatch::new(id, confidence);
        m.label = definition.label.clone();
        m
    }

    fn context<'a>(
        lexicon: &'a Lexicon,
        matches: &'a [HarmMatch],
        empty: &'a BTreeSet<HarmCategory>,
    ) -> RecommendationContext<'a> {
        RecommendationContext {
            lexicon,
            matches,
            complexity: ComplexityLevel::Moderate,
            case_law_empty: empty,
            degraded: false,
            locations: LocationLookup::Found,
        }
    }

    #[test]
    fn test_missing_case_law_recommends_specialist() {
        let lexicon = Lexicon::builtin().unwrap();
        let matches = vec![matched(&lexicon, "physical", 60.0), matched(&lexicon, "economic", 40.0)];
        let empty: BTreeSet<_> = [HarmCategory::new("economic")].into_iter().collect();

        let recs = recommend(&context(&lexicon, &matches, &empty));
        let specialist: Vec<_> = recs.iter().filter(|r| r.starts_with("Aucune jurisprudence")).collect();
        assert_eq!(specialist.len(), 1);
        assert!(specialist[0].contains(&matches[1].label.to_lowercase()));
    }

    #[test]
    fn test_output_is_deterministic_and_unique() {
        let lexicon = Lexicon::builtin().unwrap();
        let matches = vec![matched(&lexicon, "moral", 30.0)];
        let empty = BTreeSet::new();
        let mut ctx = context(&lexicon, &matches, &empty);
        ctx.degraded = true;
        ctx.locations = LocationLookup::NoneFound;

        let first = recommend(&ctx);
        assert_eq!(first, recommend(&ctx));
        let unique: BTreeSet<_> = first.iter().collect();
        assert_eq!(unique.len(), first.len());
        assert!(first.iter().any(|r| r.contains("indisponibles")));
        assert!(first.iter().any(|r| r.contains("Aucun lieu de justice")));
    }

    #[test]
    fn test_no_matches_asks_for_details() {
        let lexicon = Lexicon::builtin().unwrap();
        let empty = BTreeSet::new();
        let mut ctx = context(&lexicon, &[], &empty);
        ctx.complexity = ComplexityLevel::Simple;
        ctx.locations = LocationLookup::NotRequested;

        let recs = recommend(&ctx);
        assert!(recs[0].starts_with("Aucun préjudice"));
        assert!(recs.iter().any(|r| r.contains("code postal")));
    }

    #[test]
    fn test_unanswered_case_law_is_not_reported_missing() {
        let lexicon = Lexicon::builtin().unwrap();
        let matches = vec![matched(&lexicon, "physical", 60.0)];
        let empty = BTreeSet::new();
        let mut ctx = context(&lexicon, &matches, &empty);
        ctx.degraded = true;

        let recs = recommend(&ctx);
        assert!(!recs.iter().any(|r| r.starts_with("Aucune jurisprudence")));
        assert!(recs.iter().any(|r| r.contains("indisponibles")));
    }
}
