use super::engine::*;
use crate::error::ExtractionError;
use crate::types::{PatternKind, RuleConditions};
use crate::vocabulary::planet_for_variant;
use regex::Regex;

/// `<planet> aspects|conjuncts|conjoins|in conjunction with <planet> ... gives <effect>`
pub struct AspectConjunctionPattern {
    regex: Regex,
}

impl AspectConjunctionPattern {
    pub fn new() -> Result<Self, ExtractionError> {
        let planets = planet_alternation();
        let pattern = format!(
            r"(?i)\b({planets})\s+(?:aspects?|conjuncts?|conjoins?|in\s+conjunction\s+with)\s+({planets})\b.*?\b{EFFECT_VERBS}\s+([^.!?]*)"
        );
        Ok(Self {
            regex: Regex::new(&pattern)?,
        })
    }
}

impl ExtractionPattern for AspectConjunctionPattern {
    fn kind(&self) -> PatternKind {
        PatternKind::AspectConjunction
    }

    fn extract(&self, normalized: &str) -> Result<Option<PatternMatch>, ExtractionError> {
        let Some(caps) = self.regex.captures(normalized) else {
            return Ok(None);
        };

        let conditions = RuleConditions {
            planet: planet_for_variant(&caps[1]),
            aspect_planet: planet_for_variant(&caps[2]),
            ..Default::default()
        };
        let effect = caps.get(3).map_or("", |m| m.as_str());

        Ok(Some(PatternMatch::new(self.kind(), conditions, effect)))
    }
}
