use super::engine::*;
use crate::error::ExtractionError;
use crate::types::{PatternKind, RuleConditions};
use regex::Regex;

/// Named yogas and planetary combinations; three phrasings tried in order.
pub struct YogaCombinationPattern {
    phrasings: Vec<Regex>,
}

impl YogaCombinationPattern {
    pub fn new() -> Result<Self, ExtractionError> {
        let phrasings = [
            // "<X> yoga is formed|forms|gives ..."
            r"(?i)(raj\s*yoga|dhana\s*yoga|yoga\s+of.*?|.*?\s+yoga)\s+(?:is\s+formed|forms|gives|causes|brings)\s+([^.!?]*)",
            // "when|if <X> forms a yoga ... gives ..."
            r"(?i)\b(?:when|if)\s+([^.!?]*?)\s+(?:forms?|creates?|makes?)\s+(?:a\s+)?yoga.*?\b(?:gives?|causes?|brings?)\s+([^.!?]*)",
            // "combination|configuration of <X> gives ..."
            r"(?i)\b(?:combination|configuration)\s+of\s+([^.!?]*?)\s+(?:gives?|causes?|brings?|produces?)\s+([^.!?]*)",
        ]
        .into_iter()
        .map(Regex::new)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { phrasings })
    }
}

impl ExtractionPattern for YogaCombinationPattern {
    fn kind(&self) -> PatternKind {
        PatternKind::YogaCombination
    }

    fn extract(&self, normalized: &str) -> Result<Option<PatternMatch>, ExtractionError> {
        let Some(caps) = self.phrasings.iter().find_map(|re| re.captures(normalized)) else {
            return Ok(None);
        };

        let yoga_type = caps[1].split_whitespace().collect::<Vec<_>>().join(" ");
        let conditions = RuleConditions {
            yoga_type: Some(yoga_type).filter(|y| !y.is_empty()),
            ..Default::default()
        };
        let effect = caps.get(2).map_or("", |m| m.as_str());

        Ok(Some(PatternMatch::new(self.kind(), conditions, effect)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern() -> YogaCombinationPattern {
        YogaCombinationPattern::new().unwrap()
    }

    #[test]
    fn named_yoga() {
        let found = pattern()
            .extract("Gaja Kesari yoga gives lasting fame and wealth")
            .unwrap()
            .unwrap();
        assert_eq!(found.conditions.yoga_type.as_deref(), Some("Gaja Kesari yoga"));
        assert_eq!(found.effect_text, "lasting fame and wealth");
    }

    #[test]
    fn when_forms_a_yoga() {
        let found = pattern()
            .extract("When Jupiter and Moon form a yoga, it brings royal favour")
            .unwrap()
            .unwrap();
        assert_eq!(found.conditions.yoga_type.as_deref(), Some("Jupiter and Moon"));
        assert_eq!(found.effect_text, "royal favour");
    }

    #[test]
    fn combination_of() {
        let found = pattern()
            .extract("The combination of Moon and Jupiter produces a generous nature")
            .unwrap()
            .unwrap();
        assert_eq!(found.conditions.yoga_type.as_deref(), Some("Moon and Jupiter"));
        assert_eq!(found.effect_text, "a generous nature");
    }

    #[test]
    fn no_yoga_wording() {
        assert!(pattern()
            .extract("Mars in the 7 house causes conflicts")
            .unwrap()
            .is_none());
    }
}
