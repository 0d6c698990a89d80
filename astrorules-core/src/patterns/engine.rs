use crate::config::PatternsConfig;
use crate::error::ExtractionError;
use crate::types::{PatternKind, RuleConditions};
use crate::vocabulary::{variant_alternation, PLANET_VARIANTS, SIGN_VARIANTS};

use super::ascendant::AscendantSpecificPattern;
use super::aspect::AspectConjunctionPattern;
use super::lordship::HouseLordshipPattern;
use super::nakshatra::NakshatraPlacementPattern;
use super::placement::BasicPlacementPattern;
use super::yoga::YogaCombinationPattern;

/// Verb group shared by every template; the clause after it is the effect text
pub const EFFECT_VERBS: &str = r"(?:gives?|causes?|brings?|produces?|results?\s+in|leads?\s+to)";

/// Optional `N[st|nd|rd|th] [house|bhava]` with the number captured
pub const HOUSE_REF: &str = r"(\d+)(?:st|nd|rd|th)?\s*(?:house|bhava)?";

pub fn planet_alternation() -> String {
    variant_alternation(PLANET_VARIANTS)
}

pub fn sign_alternation() -> String {
    variant_alternation(SIGN_VARIANTS)
}

/// What a pattern captured from one normalized sentence
#[derive(Debug, Clone, PartialEq)]
pub struct PatternMatch {
    pub kind: PatternKind,
    pub conditions: RuleConditions,
    /// Clause after the effect verb, trimmed; may be empty
    pub effect_text: String,
}

impl PatternMatch {
    pub fn new(kind: PatternKind, conditions: RuleConditions, effect_text: &str) -> Self {
        Self {
            kind,
            conditions,
            effect_text: effect_text.trim().to_string(),
        }
    }
}

pub trait ExtractionPattern: Send + Sync {
    fn kind(&self) -> PatternKind;

    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// `Ok(None)` when the template does not apply; `Err` only for malformed captures
    fn extract(&self, normalized: &str) -> Result<Option<PatternMatch>, ExtractionError>;
}

/// Parses a captured house number, rejecting anything outside 1..=12
pub fn parse_house(pattern: &'static str, raw: Option<&str>) -> Result<Option<u8>, ExtractionError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let house: u8 = raw
        .parse()
        .map_err(|_| ExtractionError::malformed(pattern, format!("house '{raw}' is not a number")))?;
    if !(1..=12).contains(&house) {
        return Err(ExtractionError::malformed(
            pattern,
            format!("house {house} is outside 1..=12"),
        ));
    }
    Ok(Some(house))
}

fn build_pattern(kind: PatternKind) -> Result<Box<dyn ExtractionPattern>, ExtractionError> {
    let pattern: Box<dyn ExtractionPattern> = match kind {
        PatternKind::BasicPlacement => Box::new(BasicPlacementPattern::new()?),
        PatternKind::AscendantSpecific => Box::new(AscendantSpecificPattern::new()?),
        PatternKind::AspectConjunction => Box::new(AspectConjunctionPattern::new()?),
        PatternKind::HouseLordship => Box::new(HouseLordshipPattern::new()?),
        PatternKind::NakshatraPlacement => Box::new(NakshatraPlacementPattern::new()?),
        PatternKind::YogaCombination => Box::new(YogaCombinationPattern::new()?),
    };
    Ok(pattern)
}

/// Applies the enabled patterns in fixed order; the first match wins.
pub struct PatternCascade {
    patterns: Vec<Box<dyn ExtractionPattern>>,
}

impl PatternCascade {
    pub fn new() -> Result<Self, ExtractionError> {
        Self::from_config(&PatternsConfig::default())
    }

    pub fn from_config(config: &PatternsConfig) -> Result<Self, ExtractionError> {
        for name in config.unknown_names() {
            tracing::warn!("Unknown pattern in config: {name}");
        }

        let mut patterns = Vec::new();
        for kind in PatternKind::ALL {
            if !config.is_enabled(kind.as_str()) {
                tracing::debug!("Skipping disabled pattern: {}", kind.as_str());
                continue;
            }
            patterns.push(build_pattern(kind)?);
        }

        Ok(Self { patterns })
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.patterns.iter().map(|p| p.name()).collect()
    }

    pub fn run(&self, normalized: &str) -> Option<PatternMatch> {
        for pattern in &self.patterns {
            match pattern.extract(normalized) {
                Ok(Some(found)) => return Some(found),
                Ok(None) => {}
                Err(e) => tracing::debug!("{} skipped: {e}", pattern.name()),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Planet;

    #[test]
    fn default_cascade_runs_all_patterns_in_order() {
        let cascade = PatternCascade::new().unwrap();
        assert_eq!(
            cascade.names(),
            vec![
                "basic_placement",
                "ascendant_specific",
                "aspect_conjunction",
                "house_lordship",
                "nakshatra_placement",
                "yoga_combination",
            ]
        );
    }

    #[test]
    fn list_order_in_config_does_not_reorder_cascade() {
        let mut config = PatternsConfig::default();
        config.rules.reverse();
        config.disable("ascendant_specific");
        let cascade = PatternCascade::from_config(&config).unwrap();
        assert_eq!(cascade.names()[0], "basic_placement");
        assert!(!cascade.names().contains(&"ascendant_specific"));
        assert_eq!(cascade.names().len(), 5);
    }

    #[test]
    fn basic_placement_wins_over_yoga() {
        let cascade = PatternCascade::new().unwrap();
        let found = cascade
            .run("When Jupiter in the 9 house forms a yoga it gives great wealth")
            .unwrap();
        assert_eq!(found.kind, PatternKind::BasicPlacement);
        assert_eq!(found.conditions.planet, Some(Planet::Jupiter));
        assert_eq!(found.conditions.house, Some(9));
    }

    #[test]
    fn malformed_house_falls_through_to_next_pattern() {
        let cascade = PatternCascade::new().unwrap();
        let found = cascade
            .run("Saturn in 13 house while Mars aspects Jupiter causes quarrels")
            .unwrap();
        assert_eq!(found.kind, PatternKind::AspectConjunction);
        assert_eq!(found.conditions.planet, Some(Planet::Mars));
        assert_eq!(found.conditions.aspect_planet, Some(Planet::Jupiter));
        assert_eq!(found.conditions.house, None);
    }

    #[test]
    fn disabled_placement_lets_aspect_match() {
        let mut config = PatternsConfig::default();
        config.disable("basic_placement");
        let cascade = PatternCascade::from_config(&config).unwrap();
        let found = cascade.run("Venus conjuncts Moon and brings artistic gifts").unwrap();
        assert_eq!(found.kind, PatternKind::AspectConjunction);
        assert_eq!(found.effect_text, "artistic gifts");
    }

    #[test]
    fn plain_sentence_matches_nothing() {
        let cascade = PatternCascade::new().unwrap();
        assert!(cascade.run("This is just a regular sentence without astrology").is_none());
    }

    #[test]
    fn parse_house_bounds() {
        assert_eq!(parse_house("t", None).unwrap(), None);
        assert_eq!(parse_house("t", Some("12")).unwrap(), Some(12));
        assert!(parse_house("t", Some("0")).is_err());
        assert!(parse_house("t", Some("13")).is_err());
        assert!(parse_house("t", Some("999")).is_err());
    }
}
