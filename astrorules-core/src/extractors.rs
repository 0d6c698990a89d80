use crate::error::ExtractionError;
use crate::types::{Effect, EffectCategory, Planet, Sign, Strength, MAX_EFFECT_DESCRIPTION};
use crate::vocabulary::{
    house_category, ordinal_value, sign_for_variant, variant_alternation, TermMatcher,
    EFFECT_CATEGORY_KEYWORDS, NAKSHATRAS, NEGATIVE_EFFECT_INDICATORS, NEGATIVE_POLARITY_WORDS,
    ORDINAL_WORDS, PLANET_VARIANTS, POSITIVE_EFFECT_INDICATORS, POSITIVE_POLARITY_WORDS,
    SENTENCE_CATEGORY_KEYWORDS, SIGN_VARIANTS, STRONG_INDICATORS, TIMING_PHRASES,
    WEAK_INDICATORS,
};
use regex::Regex;

/// Minimum length of a captured clause for it to count as an effect
const MIN_EFFECT_CHARS: usize = 5;
/// Maximum length of a synthesized description taken from a causal clause
const MAX_CAUSAL_CLAUSE: usize = 100;

/// Independent detectors for the structural components of a sentence.
///
/// Every method takes normalized text and is pure; the struct only holds
/// compiled regexes.
pub struct ComponentExtractor {
    planets: Vec<(Planet, Regex)>,
    signs: Vec<(Sign, Regex)>,
    sign_phrases: Vec<Regex>,
    nakshatras: Vec<(&'static str, Regex)>,
    house_numbers: Vec<Regex>,
    house_ordinal: Regex,
    lagna: Regex,
    ascendants: Vec<Regex>,
    effect_indicators: Vec<Regex>,
    causal_clauses: Vec<Regex>,
    dasa_period: Regex,
}

/// Builds `(?i)\b(?:a|b|c)\b` for a set of variants
fn whole_word_any(variants: &[&str]) -> Result<Regex, regex::Error> {
    let alternation = variants
        .iter()
        .map(|v| regex::escape(v).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b"))
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

impl ComponentExtractor {
    pub fn new() -> Result<Self, ExtractionError> {
        let planets = PLANET_VARIANTS
            .iter()
            .map(|(planet, variants)| Ok((*planet, whole_word_any(variants)?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;

        let signs = SIGN_VARIANTS
            .iter()
            .map(|(sign, variants)| Ok((*sign, whole_word_any(variants)?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;

        let nakshatras = NAKSHATRAS
            .iter()
            .map(|(name, variants)| Ok((*name, whole_word_any(variants)?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;

        let sign_phrases = [
            r"(?i)\bin\s+(?:the\s+)?sign\s+of\s+([A-Za-z_]+)",
            r"(?i)\bplaced\s+in\s+([A-Za-z_]+)",
            r"(?i)\bposited\s+in\s+([A-Za-z_]+)",
            r"(?i)\boccupies\s+([A-Za-z_]+)",
        ]
        .iter()
        .map(|p| Regex::new(p))
        .collect::<Result<Vec<_>, _>>()?;

        let house_numbers = [
            r"(?i)(\d+)(?:st|nd|rd|th)?\s*(?:house|bhava)",
            r"(?i)(?:house|bhava)\s*(\d+)",
            r"(?i)\bin\s*the\s*(\d+)(?:st|nd|rd|th)?",
            r"(?i)(\d+)h\b",
        ]
        .iter()
        .map(|p| Regex::new(p))
        .collect::<Result<Vec<_>, _>>()?;

        let ordinals = ORDINAL_WORDS
            .iter()
            .map(|(word, _)| *word)
            .collect::<Vec<_>>()
            .join("|");

        let signs_alt = variant_alternation(SIGN_VARIANTS);
        let ascendants = [
            format!(r"(?i)\b({signs_alt})\s*(?:ascendant|lagna|rising)\b"),
            format!(r"(?i)\b(?:ascendant|lagna|rising)\s*(?:in\s+)?({signs_alt})\b"),
            format!(r"(?i)\bfor\s*({signs_alt})\s*(?:ascendant|lagna)\b"),
        ]
        .iter()
        .map(|p| Regex::new(p))
        .collect::<Result<Vec<_>, _>>()?;

        let effect_indicators = POSITIVE_EFFECT_INDICATORS
            .iter()
            .chain(NEGATIVE_EFFECT_INDICATORS)
            .map(|indicator| {
                let indicator = regex::escape(indicator).replace(' ', r"\s+");
                Regex::new(&format!(r"(?i)\b{indicator}\b\s*([^.!?]*?)(?:[.!?]|$)"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let causal_clauses = [
            r"(?i)\b(?:gives?|causes?|brings?|produces?|results?\s+in|leads?\s+to)\s+([^.!?]*)",
            r"(?i)\bwill\s+(?:have|get|be|become)\s+([^.!?]*)",
            r"(?i)\b(?:makes?|renders?|creates?)\s+([^.!?]*)",
            r"(?i)\b(?:indicates?|signifies?|shows?)\s+([^.!?]*)",
        ]
        .iter()
        .map(|p| Regex::new(p))
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            planets,
            signs,
            sign_phrases,
            nakshatras,
            house_numbers,
            house_ordinal: Regex::new(&format!(r"(?i)\b({ordinals})\s*(?:house|bhava)"))?,
            lagna: Regex::new(r"(?i)\b(?:lagna|ascendant)\b")?,
            ascendants,
            effect_indicators,
            causal_clauses,
            dasa_period: Regex::new(
                r"(?i)\b(?:during|in)\s+(?:the\s+)?(\w+)\s+(?:maha)?(?:dasa|dasha)\b",
            )?,
        })
    }

    /// First planet, in table order, with any variant present as a whole word
    pub fn planet(&self, text: &str) -> Option<Planet> {
        self.planets
            .iter()
            .find(|(_, re)| re.is_match(text))
            .map(|(planet, _)| *planet)
    }

    pub fn house(&self, text: &str) -> Option<u8> {
        let numbered = self.house_numbers.iter().find_map(|re| {
            re.captures_iter(text)
                .filter_map(|caps| caps[1].parse::<u8>().ok())
                .find(|house| (1..=12).contains(house))
        });

        numbered
            .or_else(|| {
                self.house_ordinal
                    .captures(text)
                    .and_then(|caps| ordinal_value(&caps[1]))
            })
            .or_else(|| self.lagna.is_match(text).then_some(1))
    }

    pub fn sign(&self, text: &str) -> Option<Sign> {
        self.signs
            .iter()
            .find(|(_, re)| re.is_match(text))
            .map(|(sign, _)| *sign)
            .or_else(|| {
                self.sign_phrases.iter().find_map(|re| {
                    re.captures(text)
                        .and_then(|caps| sign_for_variant(&caps[1]))
                })
            })
    }

    pub fn nakshatra(&self, text: &str) -> Option<String> {
        self.nakshatras
            .iter()
            .find(|(_, re)| re.is_match(text))
            .map(|(name, _)| name.to_string())
    }

    pub fn ascendant(&self, text: &str) -> Option<Sign> {
        self.ascendants.iter().find_map(|re| {
            re.captures(text)
                .and_then(|caps| sign_for_variant(&caps[1]))
        })
    }

    /// Every effect phrase found in the text; may be empty
    pub fn find_effects(&self, text: &str) -> Vec<Effect> {
        let mut effects: Vec<Effect> = Vec::new();

        for re in &self.effect_indicators {
            for caps in re.captures_iter(text) {
                let clause = caps[1].trim();
                if clause.chars().count() < MIN_EFFECT_CHARS {
                    continue;
                }
                let effect = self.effect_from_clause(clause, text);
                if !effects.iter().any(|e| e.description == effect.description) {
                    effects.push(effect);
                }
            }
        }

        effects
    }

    /// Like `find_effects`, but never empty
    pub fn extract_effects(&self, text: &str) -> Vec<Effect> {
        let effects = self.find_effects(text);
        if effects.is_empty() {
            vec![Effect::general()]
        } else {
            effects
        }
    }

    /// Classifies one captured clause; `context` is the whole sentence the clause came from
    pub fn effect_from_clause(&self, clause: &str, context: &str) -> Effect {
        let clause_terms = TermMatcher::new(clause);
        let context_terms = TermMatcher::new(context);

        Effect {
            category: clause_terms
                .category(EFFECT_CATEGORY_KEYWORDS)
                .unwrap_or(EffectCategory::General),
            description: truncate_chars(clause.trim(), MAX_EFFECT_DESCRIPTION),
            positive: is_positive(&clause_terms),
            strength: strength_of(&context_terms),
            timing: self.timing(context),
        }
    }

    /// Effect synthesized for a sentence that has no explicit effect phrase
    pub fn contextual_effect(&self, text: &str, house: Option<u8>) -> Effect {
        let terms = TermMatcher::new(text);

        let category = terms
            .category(SENTENCE_CATEGORY_KEYWORDS)
            .or_else(|| house.map(house_category))
            .unwrap_or(EffectCategory::General);

        let positive_votes = terms.count_distinct(POSITIVE_POLARITY_WORDS);
        let negative_votes = terms.count_distinct(NEGATIVE_POLARITY_WORDS);

        let description = self.causal_clause(text).unwrap_or_else(|| {
            let flavor = match positive_votes.cmp(&negative_votes) {
                std::cmp::Ordering::Greater => "beneficial",
                std::cmp::Ordering::Less => "challenging",
                std::cmp::Ordering::Equal => "notable",
            };
            format!("{flavor} astrological influence")
        });

        Effect {
            category,
            description,
            positive: positive_votes >= negative_votes,
            strength: strength_of(&terms),
            timing: self.timing(text),
        }
    }

    /// The outcome clause of a sentence ("gives X", "will have X", "makes X", "indicates X")
    pub fn causal_clause(&self, text: &str) -> Option<String> {
        self.causal_clauses.iter().find_map(|re| {
            re.captures(text)
                .map(|caps| caps[1].trim().to_string())
                .filter(|clause| clause.chars().count() > 3)
                .map(|clause| truncate_chars(&clause, MAX_CAUSAL_CLAUSE))
        })
    }

    pub fn timing(&self, text: &str) -> Option<String> {
        let terms = TermMatcher::new(text);
        if let Some(phrase) = TIMING_PHRASES.iter().find(|p| terms.mentions(p)) {
            return Some(phrase.to_string());
        }
        self.dasa_period
            .captures(text)
            .map(|caps| format!("{} dasa", caps[1].to_lowercase()))
    }
}

/// Polarity vote over distinct keywords; a tie counts as positive
fn is_positive(terms: &TermMatcher) -> bool {
    terms.count_distinct(POSITIVE_POLARITY_WORDS) >= terms.count_distinct(NEGATIVE_POLARITY_WORDS)
}

fn strength_of(terms: &TermMatcher) -> Strength {
    if terms.mentions_any(STRONG_INDICATORS) {
        Strength::Strong
    } else if terms.mentions_any(WEAK_INDICATORS) {
        Strength::Weak
    } else {
        Strength::Medium
    }
}
