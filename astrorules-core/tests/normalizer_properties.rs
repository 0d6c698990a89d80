use astrorules_core::*;
use astrorules_core::vocabulary;
use proptest::prelude::*;
use std::sync::OnceLock;

fn extractor() -> &'static RuleExtractor {
    static EXTRACTOR: OnceLock<RuleExtractor> = OnceLock::new();
    EXTRACTOR.get_or_init(|| RuleExtractor::new().expect("extractor should build"))
}

fn sentence_strategy() -> impl Strategy<Value = String> {
    let planet = prop::sample::select(vec!["Mars", "Jupiter", "Shani", "Guru", "Venus", "Moon", "the"]);
    let connector = prop::sample::select(vec!["in the", "placed in the", "in", "aspects the"]);
    let verb = prop::sample::select(vec!["gives", "causes", "destroys", "brings", "shows", ""]);
    let tail = "[a-z]{0,12}( [a-z]{1,10}){0,4}";
    (planet, connector, 0u32..20, verb, tail).prop_map(|(planet, connector, house, verb, tail)| {
        format!("{planet} {connector} {house}th house {verb} {tail}")
    })
}

/// Text shaped like damaged scans: merged words, split anchors, soft hyphens,
/// vocabulary terms and stray punctuation, glued with or without spaces.
fn ocr_text_strategy() -> impl Strategy<Value = String> {
    let mut tokens: Vec<String> = vocabulary::OCR_FIXES
        .iter()
        .map(|(broken, _)| broken.to_string())
        .collect();
    for (_, variants) in vocabulary::PLANET_VARIANTS {
        tokens.extend(variants.iter().map(|v| v.to_string()));
    }
    for (_, variants) in vocabulary::SIGN_VARIANTS {
        tokens.extend(variants.iter().map(|v| v.to_string()));
    }
    tokens.extend(
        [
            "Mars", "JUPITER", "Ascendant", "placedin", "inthe7th", "house", "10th",
            "eleventh", "gives", "wealth", "native\u{ad}", "\u{ad}", "-", ",", ".",
            ";", "(", ")", "'", "ā", "ś", "ṣ", "ñ", "\u{2014}", "7", "12",
        ]
        .iter()
        .map(|t| t.to_string()),
    );

    let token = prop::sample::select(tokens);
    let glue = prop::sample::select(vec!["", " ", "  ", "\n", "-"]);
    prop::collection::vec((token, glue), 0..12).prop_map(|parts| {
        parts
            .into_iter()
            .map(|(token, glue)| format!("{token}{glue}"))
            .collect::<String>()
    })
}

// ── Normalization settles on a fixed point ─────────────────────────────────

proptest! {
    #[test]
    fn normalization_is_idempotent(text in "[A-Za-z0-9 ]{0,60}") {
        let normalizer = extractor().normalizer();
        let once = normalizer.normalize(&text);
        let twice = normalizer.normalize(&once);
        prop_assert_eq!(&once, &twice, "input was '{}'", text);
    }

    #[test]
    fn ocr_damaged_text_normalizes_to_a_fixed_point(text in ocr_text_strategy()) {
        let normalizer = extractor().normalizer();
        let once = normalizer.normalize(&text);
        let twice = normalizer.normalize(&once);
        prop_assert_eq!(&once, &twice, "input was {:?}", text);
    }

    #[test]
    fn arbitrary_unicode_normalizes_to_a_fixed_point(text in "\\PC{0,40}") {
        let normalizer = extractor().normalizer();
        let once = normalizer.normalize(&text);
        let twice = normalizer.normalize(&once);
        prop_assert_eq!(&once, &twice, "input was {:?}", text);
    }

    #[test]
    fn normalized_text_has_no_padding(text in "[A-Za-z0-9 \t\n]{0,60}") {
        let normalized = extractor().normalizer().normalize(&text);
        prop_assert_eq!(normalized.trim(), normalized.as_str());
        prop_assert!(!normalized.contains("  "));
    }
}

// ── Extracted houses never leave 1..=12 ────────────────────────────────────

proptest! {
    #[test]
    fn house_extraction_stays_in_range(house in 0u32..400) {
        let text = format!("Mars in the {house}th house gives courage");
        if let Some(found) = extractor().components().house(&text) {
            prop_assert!((1..=12).contains(&found), "house {} from '{}'", found, text);
        }
    }
}

// ── Every assembled rule satisfies the rule invariants ─────────────────────

proptest! {
    #[test]
    fn assembled_rules_are_well_formed(sentence in sentence_strategy()) {
        let source = SourceInfo::new("Property", AuthorityLevel::Modern);
        let mut context = ExtractionContext::new(&source);

        if let Some(rule) = extractor().assemble(&sentence, &source, &mut context) {
            prop_assert!(rule.validate().is_empty(), "{:?}", rule.validate());
            prop_assert!(!rule.effects.is_empty());
            prop_assert!(rule.confidence_score >= 0.1);
            prop_assert!(rule.confidence_score <= rule.method.confidence_ceiling());
            if let Some(house) = rule.conditions.house {
                prop_assert!((1..=12).contains(&house));
            }
            prop_assert_eq!(rule.id.as_str(), "property_1");
        }
    }
}
