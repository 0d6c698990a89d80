use crate::error::ExtractionError;
use crate::vocabulary::{
    NEGATIVE_EFFECT_INDICATORS, OCR_FIXES, ORDINAL_WORDS, PLANET_VARIANTS,
    POSITIVE_EFFECT_INDICATORS, SIGN_VARIANTS, STRONG_INDICATORS, WEAK_INDICATORS,
};
use regex::Regex;

/// Upper bound on repair passes; real text settles in two or three.
const MAX_PASSES: usize = 16;

/// Repairs OCR damage in classical-text sentences using the domain vocabulary as anchors.
///
/// `normalize` is idempotent: passes are repeated until the text reaches a fixed point,
/// so feeding the output back in returns it unchanged.
pub struct OcrNormalizer {
    camel_case: Regex,
    numbered_house: Regex,
    ordinal_house: Regex,
    whitespace: Regex,
    /// Planet and sign variants, longest first
    anchor_terms: Vec<&'static str>,
    /// Effect and strength keywords, longest first
    keyword_terms: Vec<&'static str>,
}

impl OcrNormalizer {
    pub fn new() -> Result<Self, ExtractionError> {
        let ordinals = ORDINAL_WORDS
            .iter()
            .map(|(word, _)| *word)
            .collect::<Vec<_>>()
            .join("|");

        let mut anchor_terms: Vec<&'static str> = PLANET_VARIANTS
            .iter()
            .flat_map(|(_, variants)| variants.iter().copied())
            .chain(SIGN_VARIANTS.iter().flat_map(|(_, v)| v.iter().copied()))
            .collect();
        longest_first(&mut anchor_terms);

        let mut keyword_terms: Vec<&'static str> = POSITIVE_EFFECT_INDICATORS
            .iter()
            .chain(NEGATIVE_EFFECT_INDICATORS)
            .chain(STRONG_INDICATORS)
            .chain(WEAK_INDICATORS)
            .copied()
            .collect();
        longest_first(&mut keyword_terms);

        Ok(Self {
            camel_case: Regex::new(r"([a-z])([A-Z])")?,
            numbered_house: Regex::new(r"(?i)(\d+)(?:st|nd|rd|th)?\s*(?:house|bhava)")?,
            ordinal_house: Regex::new(&format!(r"(?i)({ordinals})\s*(?:house|bhava)"))?,
            whitespace: Regex::new(r"\s+")?,
            anchor_terms,
            keyword_terms,
        })
    }

    pub fn normalize(&self, text: &str) -> String {
        let mut current = self.pass(text);
        for _ in 1..MAX_PASSES {
            let next = self.pass(&current);
            if next == current {
                return current;
            }
            current = next;
        }
        tracing::debug!(
            "normalization did not settle after {MAX_PASSES} passes: {}",
            preview(&current)
        );
        current
    }

    fn pass(&self, text: &str) -> String {
        let mut text = text.to_string();

        // 1. Merged-word dictionary
        for (artifact, fix) in OCR_FIXES {
            if text.contains(artifact) {
                text = text.replace(artifact, fix);
            }
        }

        // 2. camelCase boundaries
        let text = self.camel_case.replace_all(&text, "$1 $2");

        // 3. Planet and sign anchors glued to the following word
        let text = split_after_terms(&text, &self.anchor_terms, |rest| {
            rest.first().is_some_and(u8::is_ascii_lowercase)
        });

        // 4. Effect and strength keywords, only before "Xy" or a digit
        let text = split_after_terms(&text, &self.keyword_terms, |rest| match rest {
            [first, ..] if first.is_ascii_digit() => true,
            [first, second, ..] => first.is_ascii_uppercase() && second.is_ascii_lowercase(),
            _ => false,
        });

        // 5. House references
        let text = self.numbered_house.replace_all(&text, " $1 house ");
        let text = self
            .ordinal_house
            .replace_all(&text, |caps: &regex::Captures| {
                let number = ORDINAL_WORDS
                    .iter()
                    .find(|(word, _)| word.eq_ignore_ascii_case(&caps[1]))
                    .map(|(_, n)| *n)
                    .unwrap_or_default();
                format!(" {number} house ")
            });

        // 6. Whitespace
        self.whitespace.replace_all(&text, " ").trim().to_string()
    }
}

fn longest_first(terms: &mut Vec<&'static str>) {
    terms.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    terms.dedup();
}

/// Inserts a space after each term occurrence whose following bytes satisfy `glued`.
///
/// Scans left to right; at each position the longest matching term (ASCII
/// case-insensitive) is taken and the scan resumes after it.
fn split_after_terms<F>(text: &str, terms: &[&str], glued: F) -> String
where
    F: Fn(&[u8]) -> bool,
{
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len() + 8);
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        let matched = terms.iter().find(|term| {
            let term = term.as_bytes();
            bytes.len() - i >= term.len() && bytes[i..i + term.len()].eq_ignore_ascii_case(term)
        });

        match matched {
            Some(term) => {
                let end = i + term.len();
                if glued(&bytes[end..]) {
                    // Every term is ASCII, so `end` is a char boundary
                    out.push_str(&text[copied..end]);
                    out.push(' ');
                    copied = end;
                }
                i = end;
            }
            None => i += 1,
        }
    }

    out.push_str(&text[copied..]);
    out
}

fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}
