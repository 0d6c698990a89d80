use crate::config::SegmentationConfig;
use crate::error::ExtractionError;
use regex::Regex;

/// Word pairs that OCR commonly glues together, repaired document-wide
const COMMON_COMBINATIONS: &[(&str, &str)] = &[
    (r"(?i)\bto\s*the\b", "to the"),
    (r"(?i)\bin\s*the\b", "in the"),
    (r"(?i)\bof\s*the\b", "of the"),
    (r"(?i)\bby\s*the\b", "by the"),
    (r"(?i)\bwith\s*the\b", "with the"),
    (r"(?i)\bfrom\s*the\b", "from the"),
    (r"(?i)\bgives\s*up\b", "gives up"),
    (r"(?i)\baspected\s*by\b", "aspected by"),
    (r"(?i)\bplaced\s*in\b", "placed in"),
    (r"(?i)\bresults\s*in\b", "results in"),
    (r"(?i)\bleads\s*to\b", "leads to"),
    (r"(?i)\bif\s*the\b", "if the"),
    (r"(?i)\bthen\s*the\b", "then the"),
    (r"(?i)\band\s*the\b", "and the"),
    (r"(?i)\blike\s*the\b", "like the"),
];

/// Cleans extracted document text and splits it into candidate sentences.
pub struct DocumentSegmenter {
    page_number: Regex,
    form_feed: Regex,
    whitespace: Regex,
    terminators: Regex,
    combinations: Vec<(Regex, &'static str)>,
    min_chars: usize,
    max_chars: usize,
}

impl DocumentSegmenter {
    pub fn new(config: &SegmentationConfig) -> Result<Self, ExtractionError> {
        let combinations = COMMON_COMBINATIONS
            .iter()
            .map(|(pattern, replacement)| Ok((Regex::new(pattern)?, *replacement)))
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self {
            page_number: Regex::new(r"\n\d+\n")?,
            form_feed: Regex::new(r"[\f\r]")?,
            whitespace: Regex::new(r"\s+")?,
            terminators: Regex::new(r"[.!?]+")?,
            combinations,
            min_chars: config.min_sentence_chars,
            max_chars: config.max_sentence_chars,
        })
    }

    /// Strips replacement chars and bare page numbers, repairs common merges,
    /// drops immediately repeated words and collapses whitespace.
    pub fn clean(&self, text: &str) -> String {
        let text = text.replace('\u{fffd}', "");
        let text = self.form_feed.replace_all(&text, "\n");
        let text = self.page_number.replace_all(&text, "\n");
        let text = text.replace('\t', " ");
        let mut text = self.whitespace.replace_all(&text, " ").into_owned();

        for (pattern, replacement) in &self.combinations {
            text = pattern.replace_all(&text, *replacement).into_owned();
        }

        drop_repeated_words(&text)
    }

    /// Splits on runs of sentence terminators, keeping trimmed pieces within the length bounds
    pub fn split(&self, cleaned: &str) -> Vec<String> {
        self.terminators
            .split(cleaned)
            .map(str::trim)
            .filter(|sentence| {
                let chars = sentence.chars().count();
                chars >= self.min_chars && chars <= self.max_chars
            })
            .map(str::to_string)
            .collect()
    }

    pub fn segment(&self, text: &str) -> Vec<String> {
        self.split(&self.clean(text))
    }
}

/// "the the house" -> "the house"; the comparison is exact, so "The the" is kept
fn drop_repeated_words(text: &str) -> String {
    let mut words: Vec<&str> = Vec::new();
    for word in text.split_whitespace() {
        if words.last() != Some(&word) {
            words.push(word);
        }
    }
    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segmenter() -> DocumentSegmenter {
        DocumentSegmenter::new(&SegmentationConfig::default()).unwrap()
    }

    #[test]
    fn clean_removes_page_numbers_and_artifacts() {
        let cleaned = segmenter().clean("Mars gives\u{fffd} courage\n12\nto the\tnative\r\n");
        assert_eq!(cleaned, "Mars gives courage to the native");
    }

    #[test]
    fn clean_repairs_common_merges() {
        let s = segmenter();
        assert_eq!(s.clean("Saturn placedin the 10th"), "Saturn placed in the 10th");
        assert_eq!(s.clean("lord ofthe 9th"), "lord of the 9th");
        assert_eq!(s.clean("Venus in the the 7th"), "Venus in the 7th");
    }

    #[test]
    fn split_applies_length_bounds() {
        let s = segmenter();
        let long = "x".repeat(501);
        let text = format!("Too short. Mars in the 7th house causes strife!! {long}? Ok");
        assert_eq!(s.split(&text), vec!["Mars in the 7th house causes strife"]);
    }

    #[test]
    fn custom_bounds_are_honored() {
        let config = SegmentationConfig {
            min_sentence_chars: 3,
            max_sentence_chars: 20,
        };
        let s = DocumentSegmenter::new(&config).unwrap();
        assert_eq!(s.segment("Sun rises. Mars in the 7th house causes strife."), vec!["Sun rises"]);
    }

    #[test]
    fn empty_document() {
        assert!(segmenter().segment("").is_empty());
    }
}
