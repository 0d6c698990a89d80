use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ===== CELESTIAL VOCABULARY =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Planet {
    Sun,
    Moon,
    Mars,
    Mercury,
    Jupiter,
    Venus,
    Saturn,
    Rahu,
    Ketu,
}

impl Planet {
    pub const ALL: [Planet; 9] = [
        Planet::Sun,
        Planet::Moon,
        Planet::Mars,
        Planet::Mercury,
        Planet::Jupiter,
        Planet::Venus,
        Planet::Saturn,
        Planet::Rahu,
        Planet::Ketu,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Planet::Sun => "Sun",
            Planet::Moon => "Moon",
            Planet::Mars => "Mars",
            Planet::Mercury => "Mercury",
            Planet::Jupiter => "Jupiter",
            Planet::Venus => "Venus",
            Planet::Saturn => "Saturn",
            Planet::Rahu => "Rahu",
            Planet::Ketu => "Ketu",
        }
    }
}

impl fmt::Display for Planet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Planet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Planet::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown planet: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl Sign {
    pub const ALL: [Sign; 12] = [
        Sign::Aries,
        Sign::Taurus,
        Sign::Gemini,
        Sign::Cancer,
        Sign::Leo,
        Sign::Virgo,
        Sign::Libra,
        Sign::Scorpio,
        Sign::Sagittarius,
        Sign::Capricorn,
        Sign::Aquarius,
        Sign::Pisces,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sign::Aries => "Aries",
            Sign::Taurus => "Taurus",
            Sign::Gemini => "Gemini",
            Sign::Cancer => "Cancer",
            Sign::Leo => "Leo",
            Sign::Virgo => "Virgo",
            Sign::Libra => "Libra",
            Sign::Scorpio => "Scorpio",
            Sign::Sagittarius => "Sagittarius",
            Sign::Capricorn => "Capricorn",
            Sign::Aquarius => "Aquarius",
            Sign::Pisces => "Pisces",
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sign {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sign::ALL
            .iter()
            .copied()
            .find(|sign| sign.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown sign: {s}"))
    }
}

// ===== EFFECTS =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectCategory {
    Wealth,
    Health,
    Marriage,
    Career,
    Education,
    Spiritual,
    Family,
    Travel,
    Government,
    Enemies,
    Property,
    General,
}

impl EffectCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectCategory::Wealth => "wealth",
            EffectCategory::Health => "health",
            EffectCategory::Marriage => "marriage",
            EffectCategory::Career => "career",
            EffectCategory::Education => "education",
            EffectCategory::Spiritual => "spiritual",
            EffectCategory::Family => "family",
            EffectCategory::Travel => "travel",
            EffectCategory::Government => "government",
            EffectCategory::Enemies => "enemies",
            EffectCategory::Property => "property",
            EffectCategory::General => "general",
        }
    }
}

impl fmt::Display for EffectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Weak,
    #[default]
    Medium,
    Strong,
}

/// Maximum length of an effect description, in characters
pub const MAX_EFFECT_DESCRIPTION: usize = 150;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub category: EffectCategory,
    pub description: String,
    pub positive: bool,
    pub strength: Strength,
    pub timing: Option<String>,
}

impl Effect {
    /// Placeholder effect used when a sentence carries no recognizable effect phrase
    pub fn general() -> Self {
        Self {
            category: EffectCategory::General,
            description: "General astrological influence".to_string(),
            positive: true,
            strength: Strength::Medium,
            timing: None,
        }
    }
}

// ===== SOURCES =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorityLevel {
    Classical,
    Traditional,
    #[default]
    Modern,
    Commentary,
}

impl AuthorityLevel {
    /// Numeric rank, 1 being the most authoritative
    pub fn rank(&self) -> u8 {
        match self {
            AuthorityLevel::Classical => 1,
            AuthorityLevel::Traditional => 2,
            AuthorityLevel::Modern => 3,
            AuthorityLevel::Commentary => 4,
        }
    }
}

impl FromStr for AuthorityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classical" | "1" => Ok(AuthorityLevel::Classical),
            "traditional" | "2" => Ok(AuthorityLevel::Traditional),
            "modern" | "3" => Ok(AuthorityLevel::Modern),
            "commentary" | "4" => Ok(AuthorityLevel::Commentary),
            other => Err(format!("unknown authority level: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub page_number: Option<u32>,
    #[serde(default)]
    pub chapter: Option<String>,
    #[serde(default)]
    pub publication_year: Option<i32>,
    #[serde(default)]
    pub authority_level: AuthorityLevel,
}

impl SourceInfo {
    pub fn new(title: impl Into<String>, authority_level: AuthorityLevel) -> Self {
        Self {
            title: title.into(),
            author: None,
            page_number: None,
            chapter: None,
            publication_year: None,
            authority_level,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Lowercased title with spaces replaced by underscores, used as the rule id prefix
    pub fn slug(&self) -> String {
        self.title.to_lowercase().replace(' ', "_")
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("source title is required".to_string());
        }
        Ok(())
    }
}

// ===== RULES =====

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleConditions {
    pub planet: Option<Planet>,
    pub house: Option<u8>,
    pub sign: Option<Sign>,
    pub nakshatra: Option<String>,
    pub ascendant: Option<Sign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_planet: Option<Planet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lord_of_house: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yoga_type: Option<String>,
}

/// The structural templates recognized by the pattern cascade, in cascade order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    BasicPlacement,
    AscendantSpecific,
    AspectConjunction,
    HouseLordship,
    NakshatraPlacement,
    YogaCombination,
}

impl PatternKind {
    pub const ALL: [PatternKind; 6] = [
        PatternKind::BasicPlacement,
        PatternKind::AscendantSpecific,
        PatternKind::AspectConjunction,
        PatternKind::HouseLordship,
        PatternKind::NakshatraPlacement,
        PatternKind::YogaCombination,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::BasicPlacement => "basic_placement",
            PatternKind::AscendantSpecific => "ascendant_specific",
            PatternKind::AspectConjunction => "aspect_conjunction",
            PatternKind::HouseLordship => "house_lordship",
            PatternKind::NakshatraPlacement => "nakshatra_placement",
            PatternKind::YogaCombination => "yoga_combination",
        }
    }
}

/// How much structural evidence a relaxed-path rule was accepted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptanceTier {
    High,
    Medium,
    MediumLow,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "method", content = "detail", rename_all = "snake_case")]
pub enum ExtractionMethod {
    Pattern(PatternKind),
    ComponentFallback,
    Relaxed(AcceptanceTier),
}

impl ExtractionMethod {
    pub fn is_relaxed(&self) -> bool {
        matches!(self, ExtractionMethod::Relaxed(_))
    }

    /// Upper clamp applied by the confidence model for this path
    pub fn confidence_ceiling(&self) -> f32 {
        if self.is_relaxed() {
            0.95
        } else {
            1.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub original_text: String,
    pub conditions: RuleConditions,
    pub effects: Vec<Effect>,
    pub source: SourceInfo,
    pub tags: Vec<String>,
    pub confidence_score: f32,
    pub method: ExtractionMethod,
    pub created_at: DateTime<Utc>,
}

impl Rule {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Returns every problem found, empty when the rule is well formed
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.original_text.trim().is_empty() {
            errors.push("original text cannot be empty".to_string());
        }
        if let Err(e) = self.source.validate() {
            errors.push(e);
        }
        if self.effects.is_empty() {
            errors.push("at least one effect is required".to_string());
        }
        if let Some(house) = self.conditions.house {
            if !(1..=12).contains(&house) {
                errors.push(format!("house number {house} is outside 1..=12"));
            }
        }
        if !(0.0..=1.0).contains(&self.confidence_score) {
            errors.push(format!(
                "confidence {} is outside 0..=1",
                self.confidence_score
            ));
        }

        errors
    }
}

// ===== REPORTS =====

/// Outcome of running one document through the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub source: SourceInfo,
    pub total_sentences: usize,
    pub astrological_sentences: usize,
    pub rules: Vec<Rule>,
    pub processing_time_ms: u64,
}

impl ExtractionReport {
    /// Rule counts keyed by "pattern", "fallback" and "relaxed"
    pub fn method_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for rule in &self.rules {
            let key = match rule.method {
                ExtractionMethod::Pattern(_) => "pattern",
                ExtractionMethod::ComponentFallback => "fallback",
                ExtractionMethod::Relaxed(_) => "relaxed",
            };
            *counts.entry(key).or_insert(0) += 1;
        }
        counts
    }
}
