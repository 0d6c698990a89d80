use super::engine::*;
use crate::error::ExtractionError;
use crate::types::{PatternKind, RuleConditions};
use crate::vocabulary::sign_for_variant;
use regex::Regex;

/// `lord|ruler of [the] N house in|placed in|posited in [the] (M house | <sign>) ... gives <effect>`
pub struct HouseLordshipPattern {
    regex: Regex,
}

impl HouseLordshipPattern {
    pub fn new() -> Result<Self, ExtractionError> {
        let signs = sign_alternation();
        let pattern = format!(
            r"(?i)\b(?:lord|ruler)\s+of\s+(?:the\s+)?{HOUSE_REF}\s+(?:in|placed\s+in|posited\s+in)\s+(?:the\s+)?(?:{HOUSE_REF}|({signs})\b).*?\b{EFFECT_VERBS}\s+([^.!?]*)"
        );
        Ok(Self {
            regex: Regex::new(&pattern)?,
        })
    }
}

impl ExtractionPattern for HouseLordshipPattern {
    fn kind(&self) -> PatternKind {
        PatternKind::HouseLordship
    }

    fn extract(&self, normalized: &str) -> Result<Option<PatternMatch>, ExtractionError> {
        let Some(caps) = self.regex.captures(normalized) else {
            return Ok(None);
        };

        let lord_of_house = parse_house(self.name(), caps.get(1).map(|m| m.as_str()))?;
        let house = parse_house(self.name(), caps.get(2).map(|m| m.as_str()))?;
        let sign = caps.get(3).and_then(|m| sign_for_variant(m.as_str()));

        if lord_of_house.is_none() || (house.is_none() && sign.is_none()) {
            return Ok(None);
        }

        let conditions = RuleConditions {
            lord_of_house,
            house,
            sign,
            ..Default::default()
        };
        let effect = caps.get(4).map_or("", |m| m.as_str());

        Ok(Some(PatternMatch::new(self.kind(), conditions, effect)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sign;

    fn pattern() -> HouseLordshipPattern {
        HouseLordshipPattern::new().unwrap()
    }

    #[test]
    fn lord_placed_in_house() {
        let found = pattern()
            .extract("The lord of the 9 house placed in the 10 house gives high status")
            .unwrap()
            .unwrap();
        assert_eq!(found.conditions.lord_of_house, Some(9));
        assert_eq!(found.conditions.house, Some(10));
        assert_eq!(found.conditions.sign, None);
        assert_eq!(found.effect_text, "high status");
    }

    #[test]
    fn ruler_posited_in_sign() {
        let found = pattern()
            .extract("Ruler of 2 house posited in Capricorn brings steady savings")
            .unwrap()
            .unwrap();
        assert_eq!(found.conditions.lord_of_house, Some(2));
        assert_eq!(found.conditions.sign, Some(Sign::Capricorn));
    }

    #[test]
    fn malformed_lord_house() {
        let err = pattern()
            .extract("lord of the 15 house in the 3 house gives courage")
            .unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedCapture { .. }));
    }

    #[test]
    fn placement_target_is_required() {
        assert!(pattern()
            .extract("lord of the 5 house in strength gives children")
            .unwrap()
            .is_none());
    }
}
