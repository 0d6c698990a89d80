use super::engine::*;
use crate::error::ExtractionError;
use crate::types::{PatternKind, RuleConditions};
use crate::vocabulary::{planet_for_variant, sign_for_variant};
use regex::Regex;

/// `[for] <sign> ascendant|lagna|rising ... <planet> [in] [N house] [<sign>] ... gives <effect>`
pub struct AscendantSpecificPattern {
    regex: Regex,
}

impl AscendantSpecificPattern {
    pub fn new() -> Result<Self, ExtractionError> {
        let planets = planet_alternation();
        let signs = sign_alternation();
        let pattern = format!(
            r"(?i)(?:\bfor\s+)?\b({signs})\s*(?:ascendant|lagna|rising)\b.*?\b({planets})\s+(?:in\s+(?:the\s+)?)?(?:{HOUSE_REF}\s*)?(?:in\s+)?(?:({signs})\b)?.*?\b{EFFECT_VERBS}\s+([^.!?]*)"
        );
        Ok(Self {
            regex: Regex::new(&pattern)?,
        })
    }
}

impl ExtractionPattern for AscendantSpecificPattern {
    fn kind(&self) -> PatternKind {
        PatternKind::AscendantSpecific
    }

    fn extract(&self, normalized: &str) -> Result<Option<PatternMatch>, ExtractionError> {
        let Some(caps) = self.regex.captures(normalized) else {
            return Ok(None);
        };

        let conditions = RuleConditions {
            ascendant: sign_for_variant(&caps[1]),
            planet: planet_for_variant(&caps[2]),
            house: parse_house(self.name(), caps.get(3).map(|m| m.as_str()))?,
            sign: caps.get(4).and_then(|m| sign_for_variant(m.as_str())),
            ..Default::default()
        };
        let effect = caps.get(5).map_or("", |m| m.as_str());

        Ok(Some(PatternMatch::new(self.kind(), conditions, effect)))
    }
}
