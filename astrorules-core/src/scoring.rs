use crate::error::ExtractionError;
use crate::types::{Effect, ExtractionMethod, RuleConditions};
use crate::vocabulary::{TermMatcher, CLASSICAL_TERMS, RELAXED_BONUS_TERMS};
use regex::Regex;

const RELAXED_BONUS_PER_TERM: f32 = 0.03;
const RELAXED_BONUS_CAP: f32 = 0.15;

/// Heuristic confidence in `[0.1, 1.0]`, always measured on the raw sentence.
///
/// Primary scoring applies to pattern and component-fallback rules; relaxed
/// scoring starts lower and is capped at 0.95.
pub struct ConfidenceScorer {
    /// Merged-word runs left over from OCR
    long_run: Regex,
    very_long_run: Regex,
    /// if..then, when, gives, causes, results in
    structure: Regex,
}

impl ConfidenceScorer {
    pub fn new() -> Result<Self, ExtractionError> {
        Ok(Self {
            long_run: Regex::new(r"[a-z]{15,}")?,
            very_long_run: Regex::new(r"[a-z]{20,}")?,
            structure: Regex::new(
                r"(?i)\bif\s+.*?\s+then\s+|\bwhen\s+\S+\s+|\s+gives?\s+|\s+causes?\s+|\s+results?\s+in\s+",
            )?,
        })
    }

    pub fn score(
        &self,
        method: ExtractionMethod,
        sentence: &str,
        conditions: &RuleConditions,
        effects: &[Effect],
    ) -> f32 {
        if method.is_relaxed() {
            self.relaxed(sentence, conditions, effects)
        } else {
            self.primary(sentence, conditions, effects)
        }
    }

    pub fn primary(&self, sentence: &str, conditions: &RuleConditions, effects: &[Effect]) -> f32 {
        let mut score = 0.3 + component_bonus(conditions);

        if first_description_longer_than(effects, 10) {
            score += 0.15;
        }

        let words = sentence.split_whitespace().count();
        if words < 8 {
            score -= 0.2;
        } else if words > 60 {
            score -= 0.1;
        }

        if self.long_run.find_iter(sentence).count() > 2 {
            score -= 0.2;
        }

        if TermMatcher::new(sentence).mentions_any(CLASSICAL_TERMS) {
            score += 0.1;
        }

        finish(score, 1.0)
    }

    pub fn relaxed(&self, sentence: &str, conditions: &RuleConditions, effects: &[Effect]) -> f32 {
        let mut score = 0.15 + component_bonus(conditions);

        if first_description_longer_than(effects, 5) {
            score += 0.1;
        }

        let words = sentence.split_whitespace().count();
        if (10..=50).contains(&words) {
            score += 0.1;
        } else if (8..=60).contains(&words) {
            score += 0.05;
        }

        let bonus_terms = TermMatcher::new(sentence).count_distinct(RELAXED_BONUS_TERMS);
        score += (bonus_terms as f32 * RELAXED_BONUS_PER_TERM).min(RELAXED_BONUS_CAP);

        if self.structure.is_match(sentence) {
            score += 0.05;
        }

        if self.very_long_run.find_iter(sentence).count() > 1 {
            score -= 0.1;
        }

        let questions = sentence.matches('?').count();
        let exclamations = sentence.matches('!').count();
        if questions > 2 || exclamations > 2 {
            score -= 0.05;
        }

        finish(score, 0.95)
    }
}

fn component_bonus(conditions: &RuleConditions) -> f32 {
    let mut bonus = 0.0;
    if conditions.planet.is_some() {
        bonus += 0.2;
    }
    if conditions.house.is_some() {
        bonus += 0.15;
    }
    if conditions.sign.is_some() {
        bonus += 0.1;
    }
    if conditions.ascendant.is_some() {
        bonus += 0.1;
    }
    bonus
}

fn first_description_longer_than(effects: &[Effect], chars: usize) -> bool {
    effects
        .first()
        .is_some_and(|e| e.description.chars().count() > chars)
}

/// Clamp, then round to three decimals so stored scores compare cleanly
fn finish(score: f32, ceiling: f32) -> f32 {
    let clamped = score.clamp(0.1, ceiling);
    (clamped * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EffectCategory, Planet, Sign, Strength};

    fn effect(description: &str) -> Effect {
        Effect {
            category: EffectCategory::Marriage,
            description: description.to_string(),
            positive: false,
            strength: Strength::Medium,
            timing: None,
        }
    }

    fn mars_in_seventh() -> RuleConditions {
        RuleConditions {
            planet: Some(Planet::Mars),
            house: Some(7),
            ..Default::default()
        }
    }

    #[test]
    fn primary_for_clean_placement() {
        let scorer = ConfidenceScorer::new().unwrap();
        let score = scorer.primary(
            "Mars in the 7th house causes conflicts in marriage",
            &mars_in_seventh(),
            &[effect("conflicts in marriage")],
        );
        assert!((score - 0.8).abs() < 1e-6, "score {score}");
    }

    #[test]
    fn primary_penalizes_short_and_merged_text() {
        let scorer = ConfidenceScorer::new().unwrap();
        let clean = scorer.primary(
            "Mars in the 7th house causes conflicts in marriage",
            &mars_in_seventh(),
            &[effect("conflicts in marriage")],
        );
        let merged = scorer.primary(
            "Mars causes marriageconflictsalways andquarrelsbetweenspouses plusseparationfromfamily",
            &mars_in_seventh(),
            &[effect("conflicts in marriage")],
        );
        assert!(merged < clean);
    }

    #[test]
    fn primary_classical_bonus() {
        let scorer = ConfidenceScorer::new().unwrap();
        let plain = RuleConditions {
            planet: Some(Planet::Venus),
            ..Default::default()
        };
        let without = scorer.primary(
            "Venus strong in the chart gives a happy and comfortable married life",
            &plain,
            &[effect("a happy and comfortable married life")],
        );
        let with = scorer.primary(
            "Venus strong in the chart forms a yoga giving a happy and comfortable married life",
            &plain,
            &[effect("a happy and comfortable married life")],
        );
        assert!((with - without - 0.1).abs() < 1e-3, "{with} vs {without}");
    }

    #[test]
    fn primary_never_below_floor() {
        let scorer = ConfidenceScorer::new().unwrap();
        let score = scorer.primary("x", &RuleConditions::default(), &[]);
        assert!((score - 0.1).abs() < 1e-6);
    }

    #[test]
    fn relaxed_is_capped() {
        let scorer = ConfidenceScorer::new().unwrap();
        let conditions = RuleConditions {
            planet: Some(Planet::Saturn),
            house: Some(10),
            sign: Some(Sign::Libra),
            ascendant: Some(Sign::Aries),
            ..Default::default()
        };
        let sentence = "When Saturn as lord of the yoga in the 10 house rasi aspects the graha \
                        in conjunction with a trine it gives dasa results through bhava and dosha";
        let score = scorer.relaxed(sentence, &conditions, &[effect("dasa results through bhava")]);
        assert!((score - 0.95).abs() < 1e-6, "score {score}");
    }

    #[test]
    fn relaxed_starts_lower_than_primary() {
        let scorer = ConfidenceScorer::new().unwrap();
        let sentence = "The 7 house in Libra shows the nature of the partner";
        let conditions = RuleConditions {
            house: Some(7),
            sign: Some(Sign::Libra),
            ..Default::default()
        };
        let effects = [effect("the nature of the partner")];
        let relaxed = scorer.relaxed(sentence, &conditions, &effects);
        // 0.15 + 0.15 + 0.1 + 0.1 (effect) + 0.1 (11 words)
        assert!((relaxed - 0.6).abs() < 1e-6, "score {relaxed}");
    }

    #[test]
    fn score_dispatches_on_method() {
        let scorer = ConfidenceScorer::new().unwrap();
        let sentence = "Mars in the 7th house causes conflicts in marriage";
        let effects = [effect("conflicts in marriage")];
        let primary = scorer.score(
            ExtractionMethod::ComponentFallback,
            sentence,
            &mars_in_seventh(),
            &effects,
        );
        let relaxed = scorer.score(
            ExtractionMethod::Relaxed(crate::types::AcceptanceTier::High),
            sentence,
            &mars_in_seventh(),
            &effects,
        );
        assert_eq!(primary, scorer.primary(sentence, &mars_in_seventh(), &effects));
        assert_eq!(relaxed, scorer.relaxed(sentence, &mars_in_seventh(), &effects));
    }
}
