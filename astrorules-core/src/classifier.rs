use crate::vocabulary::{PLANET_VARIANTS, SIGN_VARIANTS};

const HOUSE_TERMS: &[&str] = &["house", "bhava"];

const EFFECT_TERMS: &[&str] = &[
    "gives",
    "causes",
    "indicates",
    "brings",
    "results in",
    "leads to",
    "produces",
];

/// Cheap pre-filter that keeps sentences worth running through the extractor.
///
/// Matching is plain substring on the lowercased sentence so that OCR-merged
/// text ("Marsinthe7thhouse") still passes; precision comes later from the
/// pattern cascade.
pub struct AstroContentClassifier;

impl Default for AstroContentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl AstroContentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// A planet together with a house, a sign, or an effect verb
    pub fn contains_astrological_content(&self, sentence: &str) -> bool {
        let lower = sentence.to_lowercase();
        let has = |terms: &[&str]| terms.iter().any(|term| lower.contains(term));

        let planet = PLANET_VARIANTS
            .iter()
            .any(|(_, variants)| has(variants));
        if !planet {
            return false;
        }

        has(HOUSE_TERMS)
            || SIGN_VARIANTS.iter().any(|(_, variants)| has(variants))
            || has(EFFECT_TERMS)
    }

    pub fn identify(&self, sentences: Vec<String>) -> Vec<String> {
        sentences
            .into_iter()
            .filter(|sentence| self.contains_astrological_content(sentence))
            .collect()
    }
}
