use super::engine::*;
use crate::error::ExtractionError;
use crate::types::{PatternKind, RuleConditions};
use crate::vocabulary::{planet_for_variant, sign_for_variant};
use regex::Regex;

/// `<planet> [in [the]] [N house] [in] [<sign>] ... gives <effect>`
pub struct BasicPlacementPattern {
    regex: Regex,
}

impl BasicPlacementPattern {
    pub fn new() -> Result<Self, ExtractionError> {
        let pattern = format!(
            r"(?i)\b({planets})\s+(?:in\s+(?:the\s+)?)?(?:{HOUSE_REF}\s*)?(?:in\s+)?(?:({signs})\b)?.*?\b{EFFECT_VERBS}\s+([^.!?]*)",
            planets = planet_alternation(),
            signs = sign_alternation(),
        );
        Ok(Self {
            regex: Regex::new(&pattern)?,
        })
    }
}

impl ExtractionPattern for BasicPlacementPattern {
    fn kind(&self) -> PatternKind {
        PatternKind::BasicPlacement
    }

    fn extract(&self, normalized: &str) -> Result<Option<PatternMatch>, ExtractionError> {
        let Some(caps) = self.regex.captures(normalized) else {
            return Ok(None);
        };

        let conditions = RuleConditions {
            planet: planet_for_variant(&caps[1]),
            house: parse_house(self.name(), caps.get(2).map(|m| m.as_str()))?,
            sign: caps.get(3).and_then(|m| sign_for_variant(m.as_str())),
            ..Default::default()
        };
        let effect = caps.get(4).map_or("", |m| m.as_str());

        Ok(Some(PatternMatch::new(self.kind(), conditions, effect)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Planet, Sign};

    fn extract(text: &str) -> Option<PatternMatch> {
        BasicPlacementPattern::new().unwrap().extract(text).unwrap()
    }

    #[test]
    fn planet_house_and_effect() {
        let found = extract("Mars in the 7 house causes conflicts in marriage").unwrap();
        assert_eq!(found.conditions.planet, Some(Planet::Mars));
        assert_eq!(found.conditions.house, Some(7));
        assert_eq!(found.conditions.sign, None);
        assert_eq!(found.effect_text, "conflicts in marriage");
    }

    #[test]
    fn sign_after_house() {
        let found = extract("Sun in the 10 house in Leo gives fame and authority.").unwrap();
        assert_eq!(found.conditions.planet, Some(Planet::Sun));
        assert_eq!(found.conditions.house, Some(10));
        assert_eq!(found.conditions.sign, Some(Sign::Leo));
        assert_eq!(found.effect_text, "fame and authority");
    }

    #[test]
    fn sanskrit_variants_resolve() {
        let found = extract("Guru in Dhanus gives wisdom").unwrap();
        assert_eq!(found.conditions.planet, Some(Planet::Jupiter));
        assert_eq!(found.conditions.sign, Some(Sign::Sagittarius));
    }

    #[test]
    fn planet_without_location_still_matches() {
        let found = extract("Jupiter in its own sign gives wisdom and prosperity").unwrap();
        assert_eq!(found.conditions.planet, Some(Planet::Jupiter));
        assert_eq!(found.conditions.house, None);
        assert_eq!(found.effect_text, "wisdom and prosperity");
    }

    #[test]
    fn out_of_range_house_is_malformed() {
        let pattern = BasicPlacementPattern::new().unwrap();
        let err = pattern
            .extract("Saturn in the 14 house gives delays")
            .unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedCapture { .. }));
    }

    #[test]
    fn no_effect_verb_no_match() {
        assert!(extract("Mars in the 7 house").is_none());
    }
}
