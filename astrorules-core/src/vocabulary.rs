// Closed-vocabulary lookup tables shared by the normalizer, extractors and scorer.
//
// Table order is significant: lookups return the first entry that matches.

use crate::types::{EffectCategory, Planet, Sign};

pub static PLANET_VARIANTS: &[(Planet, &[&str])] = &[
    (Planet::Sun, &["sun", "surya", "ravi", "arka", "aditya", "soorya"]),
    (Planet::Moon, &["moon", "chandra", "soma", "indu", "chandrama"]),
    (Planet::Mars, &["mars", "mangal", "angaraka", "bhauma", "kuja", "mangala"]),
    (Planet::Mercury, &["mercury", "budh", "budha", "soumya", "kumar"]),
    (Planet::Jupiter, &["jupiter", "guru", "brihaspati", "devaguru", "brahmanaspati"]),
    (Planet::Venus, &["venus", "shukra", "sukra", "bhargava", "ushanas"]),
    (Planet::Saturn, &["saturn", "shani", "sanaischara", "manda", "shanaischarya"]),
    (Planet::Rahu, &["rahu", "dragon_head", "north_node", "sarpasira"]),
    (Planet::Ketu, &["ketu", "dragon_tail", "south_node", "sikhi"]),
];

pub static SIGN_VARIANTS: &[(Sign, &[&str])] = &[
    (Sign::Aries, &["aries", "mesha", "ram"]),
    (Sign::Taurus, &["taurus", "vrishabha", "bull"]),
    (Sign::Gemini, &["gemini", "mithuna", "twins"]),
    (Sign::Cancer, &["cancer", "karkata", "karka", "crab"]),
    (Sign::Leo, &["leo", "simha", "lion"]),
    (Sign::Virgo, &["virgo", "kanya", "virgin"]),
    (Sign::Libra, &["libra", "tula", "balance"]),
    (Sign::Scorpio, &["scorpio", "vrishchika", "scorpion"]),
    (Sign::Sagittarius, &["sagittarius", "dhanus", "archer"]),
    (Sign::Capricorn, &["capricorn", "makara", "goat"]),
    (Sign::Aquarius, &["aquarius", "kumbha", "water_bearer"]),
    (Sign::Pisces, &["pisces", "meena", "fish"]),
];

/// Canonical nakshatra name followed by accepted spellings (lowercase)
pub static NAKSHATRAS: &[(&str, &[&str])] = &[
    ("Ashwini", &["ashwini", "aswini", "ashvini"]),
    ("Bharani", &["bharani"]),
    ("Krittika", &["krittika", "kritika"]),
    ("Rohini", &["rohini"]),
    ("Mrigashira", &["mrigashira", "mrigasira", "mrigashirsha"]),
    ("Ardra", &["ardra", "arudra"]),
    ("Punarvasu", &["punarvasu"]),
    ("Pushya", &["pushya", "pushyami"]),
    ("Ashlesha", &["ashlesha", "aslesha"]),
    ("Magha", &["magha"]),
    ("Purva Phalguni", &["purva phalguni", "purvaphalguni"]),
    ("Uttara Phalguni", &["uttara phalguni", "uttaraphalguni"]),
    ("Hasta", &["hasta"]),
    ("Chitra", &["chitra", "chitta"]),
    ("Swati", &["swati", "svati"]),
    ("Vishakha", &["vishakha", "visakha"]),
    ("Anuradha", &["anuradha"]),
    ("Jyeshtha", &["jyeshtha", "jyestha"]),
    ("Mula", &["mula", "moola"]),
    ("Purva Ashadha", &["purva ashadha", "purvashadha"]),
    ("Uttara Ashadha", &["uttara ashadha", "uttarashadha"]),
    ("Shravana", &["shravana", "sravana"]),
    ("Dhanishta", &["dhanishta", "dhanishtha"]),
    ("Shatabhisha", &["shatabhisha", "satabhisha"]),
    ("Purva Bhadrapada", &["purva bhadrapada", "purvabhadra"]),
    ("Uttara Bhadrapada", &["uttara bhadrapada", "uttarabhadra"]),
    ("Revati", &["revati"]),
];

pub static POSITIVE_EFFECT_INDICATORS: &[&str] = &[
    "gives", "causes", "brings", "produces", "leads to", "results in", "bestows", "grants",
    "blesses with", "indicates", "signifies", "creates", "generates", "manifests", "yields",
    "awards", "phala", "yoga", "labha", "prapti", "karoti",
];

pub static NEGATIVE_EFFECT_INDICATORS: &[&str] = &[
    "destroys", "damages", "harms", "afflicts", "reduces", "diminishes", "causes loss of",
    "takes away", "removes", "deprives of", "dosha", "hani", "nashta", "kshaya", "bhanga",
];

pub static STRONG_INDICATORS: &[&str] = &[
    "strong", "powerful", "exalted", "own house", "own sign", "uccha", "swakshetra", "swastha",
    "digbala", "balavat",
];

pub static WEAK_INDICATORS: &[&str] = &[
    "weak", "debilitated", "combust", "neecha", "astangata", "durbala", "mrta", "khala",
    "nipidita",
];

/// Literal merged-word repairs, applied in order, case-sensitive.
pub static OCR_FIXES: &[(&str, &str)] = &[
    ("thesun", "the sun"),
    ("themoon", "the moon"),
    ("thenative", "the native"),
    ("ascen\u{ad}dant", "ascendant"),
    ("ascen-dant", "ascendant"),
    ("native\u{ad}", "native "),
    ("willbe", "will be"),
    ("ofthe", "of the"),
    ("inthe", "in the"),
    ("forthe", "for the"),
    ("withthe", "with the"),
    ("andthe", "and the"),
    ("tothe", "to the"),
    ("fromthe", "from the"),
    ("bythe", "by the"),
    ("onthe", "on the"),
    ("asthe", "as the"),
    ("isthe", "is the"),
    ("thatthe", "that the"),
    ("atthe", "at the"),
    ("whenthe", "when the"),
    ("whilethe", "while the"),
    ("ifthe", "if the"),
    ("overthe", "over the"),
    ("underthe", "under the"),
    ("aboutthe", "about the"),
    ("throughthe", "through the"),
    ("againstthe", "against the"),
    ("duringthe", "during the"),
    ("beforethe", "before the"),
    ("afterthe", "after the"),
    ("beyondthe", "beyond the"),
    ("withinthe", "within the"),
    ("withoutthe", "without the"),
    ("betweenthe", "between the"),
    ("amongthe", "among the"),
    ("sthe", "s the"),
    ("dthe", "d the"),
    ("tthe", "t the"),
    ("lthe", "l the"),
    ("mthe", "m the"),
    ("pthe", "p the"),
    ("bthe", "b the"),
    ("cthe", "c the"),
    ("fthe", "f the"),
    ("hthe", "h the"),
    ("kthe", "k the"),
    ("vthe", "v the"),
    ("wthe", "w the"),
    ("xthe", "x the"),
    ("zthe", "z the"),
];

/// Keyword table used to categorize a captured effect clause
pub static EFFECT_CATEGORY_KEYWORDS: &[(EffectCategory, &[&str])] = &[
    (
        EffectCategory::Wealth,
        &["wealth", "money", "riches", "prosperity", "financial", "earnings", "income", "fortune"],
    ),
    (
        EffectCategory::Health,
        &["health", "disease", "illness", "medical", "body", "physical", "ailment", "cure"],
    ),
    (
        EffectCategory::Marriage,
        &["marriage", "spouse", "partner", "relationship", "wife", "husband", "matrimony"],
    ),
    (
        EffectCategory::Career,
        &["career", "job", "profession", "work", "business", "employment", "occupation", "service"],
    ),
    (
        EffectCategory::Education,
        &["education", "learning", "knowledge", "study", "wisdom", "intelligence", "scholarship"],
    ),
    (
        EffectCategory::Spiritual,
        &["spiritual", "religious", "devotion", "meditation", "divine", "sacred", "temple"],
    ),
    (
        EffectCategory::Family,
        &["family", "children", "parents", "siblings", "brother", "sister", "father", "mother"],
    ),
    (
        EffectCategory::Travel,
        &["travel", "journey", "foreign", "abroad", "distant", "pilgrimage"],
    ),
    (
        EffectCategory::Government,
        &["government", "king", "ruler", "authority", "power", "official", "administrative"],
    ),
    (
        EffectCategory::Enemies,
        &["enemy", "enemies", "opponent", "rival", "adversary", "competition"],
    ),
    (
        EffectCategory::Property,
        &["property", "land", "house", "real estate", "inheritance", "patrimony"],
    ),
];

/// Sanskrit-inclusive table used when a whole sentence has to be categorized
pub static SENTENCE_CATEGORY_KEYWORDS: &[(EffectCategory, &[&str])] = &[
    (
        EffectCategory::Wealth,
        &["wealth", "money", "riches", "prosperity", "financial", "dhana", "sampatti"],
    ),
    (
        EffectCategory::Health,
        &["health", "disease", "illness", "body", "medical", "roga", "arogya"],
    ),
    (
        EffectCategory::Marriage,
        &["marriage", "spouse", "partner", "wife", "husband", "vivah", "patni"],
    ),
    (
        EffectCategory::Career,
        &["career", "job", "profession", "work", "business", "karma", "vyavasaya"],
    ),
    (
        EffectCategory::Education,
        &["education", "learning", "knowledge", "study", "vidya", "gyan"],
    ),
    (
        EffectCategory::Family,
        &["children", "parents", "siblings", "family", "putra", "mata", "pita"],
    ),
    (
        EffectCategory::Spiritual,
        &["spiritual", "religious", "devotion", "dharma", "moksha", "tapas"],
    ),
    (
        EffectCategory::Government,
        &["king", "ruler", "authority", "government", "raja", "adhikari"],
    ),
    (
        EffectCategory::Travel,
        &["travel", "journey", "foreign", "pravasa", "yatra"],
    ),
    (EffectCategory::Enemies, &["enemy", "enemies", "opponent", "satru"]),
    (EffectCategory::Property, &["property", "land", "bhumi", "griha"]),
    (
        EffectCategory::Wealth,
        &["fortune", "luck", "destiny", "bhagya", "daiva"],
    ),
];

/// Life area conventionally signified by each house, indexed by house number - 1
pub static HOUSE_CATEGORIES: [EffectCategory; 12] = [
    EffectCategory::General,
    EffectCategory::Wealth,
    EffectCategory::Family,
    EffectCategory::Family,
    EffectCategory::Family,
    EffectCategory::Enemies,
    EffectCategory::Marriage,
    EffectCategory::Health,
    EffectCategory::Wealth,
    EffectCategory::Career,
    EffectCategory::Wealth,
    EffectCategory::Spiritual,
];

pub static POSITIVE_POLARITY_WORDS: &[&str] = &[
    "good", "beneficial", "auspicious", "favorable", "favourable", "excellent", "great",
    "prosperity", "success", "happiness", "wealth", "fortune", "blessed", "gain", "shubha",
    "uttam", "accha",
];

pub static NEGATIVE_POLARITY_WORDS: &[&str] = &[
    "bad", "harmful", "inauspicious", "unfavorable", "unfavourable", "difficult", "trouble",
    "disease", "loss", "enemy", "enemies", "conflict", "problem", "suffering", "death", "danger",
    "ashubha", "papa", "dukha", "roga", "klesh",
];

/// Terms that earn the primary model's classical bonus
pub static CLASSICAL_TERMS: &[&str] = &["yoga", "dosha", "dasa", "bhava", "graha", "rasi"];

pub static RELAXED_BONUS_TERMS: &[&str] = &[
    "yoga", "dosha", "dasa", "bhava", "graha", "rasi", "nakshatra", "uccha", "neecha",
    "swakshetra", "moolatrikona", "digbala", "lord", "ruler", "aspect", "conjunction", "trine",
    "square",
];

/// Keywords strong enough on their own to accept a sentence on the relaxed path
pub static STRONG_CLASSICAL_KEYWORDS: &[&str] = &[
    "yoga", "dosha", "dasa", "bhava", "graha", "rasi", "nakshatra", "exalted", "debilitated",
    "moolatrikona", "aspects", "conjunction", "lord of", "ruler of", "placed in", "posited in",
    "occupies",
];

pub static ORDINAL_WORDS: &[(&str, u8)] = &[
    ("first", 1),
    ("second", 2),
    ("third", 3),
    ("fourth", 4),
    ("fifth", 5),
    ("sixth", 6),
    ("seventh", 7),
    ("eighth", 8),
    ("ninth", 9),
    ("tenth", 10),
    ("eleventh", 11),
    ("twelfth", 12),
];

pub static TIMING_PHRASES: &[&str] = &[
    "childhood", "youth", "early life", "middle age", "old age", "later life", "after marriage",
];

/// Case-folded view of a text for keyword lookups.
///
/// Single-word terms match at the start of a word, so "conflict" matches
/// "conflicts" but "ari" never matches inside "marriage". Multi-word terms
/// match as plain substrings.
pub struct TermMatcher {
    lower: String,
}

impl TermMatcher {
    pub fn new(text: &str) -> Self {
        Self {
            lower: text.to_lowercase(),
        }
    }

    pub fn lower(&self) -> &str {
        &self.lower
    }

    fn words(&self) -> impl Iterator<Item = &str> {
        self.lower
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|w| !w.is_empty())
    }

    pub fn mentions(&self, term: &str) -> bool {
        if term.contains(' ') {
            self.lower.contains(term)
        } else {
            self.words().any(|w| w.starts_with(term))
        }
    }

    pub fn mentions_any(&self, terms: &[&str]) -> bool {
        terms.iter().any(|t| self.mentions(t))
    }

    /// Number of distinct terms from `terms` present in the text
    pub fn count_distinct(&self, terms: &[&str]) -> usize {
        terms.iter().filter(|t| self.mentions(t)).count()
    }

    /// First category whose keyword list has a match
    pub fn category(&self, table: &[(EffectCategory, &[&str])]) -> Option<EffectCategory> {
        table
            .iter()
            .find(|(_, keywords)| self.mentions_any(keywords))
            .map(|(category, _)| *category)
    }
}

pub fn house_category(house: u8) -> EffectCategory {
    match house {
        1..=12 => HOUSE_CATEGORIES[usize::from(house) - 1],
        _ => EffectCategory::General,
    }
}

pub fn sign_for_variant(token: &str) -> Option<Sign> {
    let token = token.trim().to_lowercase();
    SIGN_VARIANTS
        .iter()
        .find(|(_, variants)| variants.contains(&token.as_str()))
        .map(|(sign, _)| *sign)
}

pub fn planet_for_variant(token: &str) -> Option<Planet> {
    let token = token.trim().to_lowercase();
    PLANET_VARIANTS
        .iter()
        .find(|(_, variants)| variants.contains(&token.as_str()))
        .map(|(planet, _)| *planet)
}

pub fn nakshatra_for_variant(token: &str) -> Option<&'static str> {
    let token = token.trim().to_lowercase();
    let token = token.split_whitespace().collect::<Vec<_>>().join(" ");
    NAKSHATRAS
        .iter()
        .find(|(_, variants)| variants.contains(&token.as_str()))
        .map(|(name, _)| *name)
}

pub fn ordinal_value(word: &str) -> Option<u8> {
    let word = word.to_lowercase();
    ORDINAL_WORDS
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, n)| *n)
}

/// Regex alternation of every variant in a table, longest first so that
/// "mangala" is preferred over "mangal" at the same position.
pub fn variant_alternation<K>(table: &[(K, &[&str])]) -> String {
    let mut variants: Vec<&str> = table
        .iter()
        .flat_map(|(_, variants)| variants.iter().copied())
        .collect();
    variants.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    variants.dedup();
    variants
        .iter()
        .map(|v| regex::escape(v).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|")
}
