use super::engine::*;
use crate::error::ExtractionError;
use crate::types::{PatternKind, RuleConditions};
use crate::vocabulary::{nakshatra_for_variant, planet_for_variant, variant_alternation, NAKSHATRAS};
use regex::Regex;

/// `<planet> in|placed in <nakshatra> [nakshatra] ... gives <effect>`
pub struct NakshatraPlacementPattern {
    regex: Regex,
}

impl NakshatraPlacementPattern {
    pub fn new() -> Result<Self, ExtractionError> {
        let planets = planet_alternation();
        let nakshatras = variant_alternation(NAKSHATRAS);
        let pattern = format!(
            r"(?i)\b({planets})\s+(?:in|placed\s+in)\s+({nakshatras})\b\s*(?:nakshatra)?.*?\b{EFFECT_VERBS}\s+([^.!?]*)"
        );
        Ok(Self {
            regex: Regex::new(&pattern)?,
        })
    }
}

impl ExtractionPattern for NakshatraPlacementPattern {
    fn kind(&self) -> PatternKind {
        PatternKind::NakshatraPlacement
    }

    fn extract(&self, normalized: &str) -> Result<Option<PatternMatch>, ExtractionError> {
        let Some(caps) = self.regex.captures(normalized) else {
            return Ok(None);
        };

        let conditions = RuleConditions {
            planet: planet_for_variant(&caps[1]),
            nakshatra: nakshatra_for_variant(&caps[2]).map(str::to_string),
            ..Default::default()
        };
        let effect = caps.get(3).map_or("", |m| m.as_str());

        Ok(Some(PatternMatch::new(self.kind(), conditions, effect)))
    }
}
