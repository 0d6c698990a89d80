use crate::config::ExtractionConfig;
use crate::error::ExtractionError;
use crate::extractors::ComponentExtractor;
use crate::normalizer::OcrNormalizer;
use crate::patterns::{PatternCascade, PatternMatch};
use crate::scoring::ConfidenceScorer;
use crate::types::*;
use crate::vocabulary::{TermMatcher, STRONG_CLASSICAL_KEYWORDS};
use chrono::Utc;
use rayon::prelude::*;

/// Per-batch state: the source slug and the next id suffix.
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    slug: String,
    next_sequence: usize,
}

impl ExtractionContext {
    pub fn new(source: &SourceInfo) -> Self {
        Self {
            slug: source.slug(),
            next_sequence: 1,
        }
    }

    pub fn next_id(&mut self) -> String {
        let id = format!("{}_{}", self.slug, self.next_sequence);
        self.next_sequence += 1;
        id
    }

    /// Number of ids handed out so far
    pub fn issued(&self) -> usize {
        self.next_sequence - 1
    }
}

/// A rule before it has an id
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDraft {
    pub original_text: String,
    pub conditions: RuleConditions,
    pub effects: Vec<Effect>,
    pub tags: Vec<String>,
    pub confidence_score: f32,
    pub method: ExtractionMethod,
}

impl RuleDraft {
    fn check(&self) -> Result<(), ExtractionError> {
        if self.effects.is_empty() {
            return Err(ExtractionError::Assembly("no effects".to_string()));
        }
        if let Some(house) = self.conditions.house {
            if !(1..=12).contains(&house) {
                return Err(ExtractionError::Assembly(format!(
                    "house {house} is outside 1..=12"
                )));
            }
        }
        let ceiling = self.method.confidence_ceiling();
        if !(0.1..=ceiling).contains(&self.confidence_score) {
            return Err(ExtractionError::Assembly(format!(
                "confidence {} is outside 0.1..={ceiling}",
                self.confidence_score
            )));
        }
        Ok(())
    }

    pub fn into_rule(self, id: String, source: &SourceInfo) -> Rule {
        Rule {
            id,
            original_text: self.original_text,
            conditions: self.conditions,
            effects: self.effects,
            source: source.clone(),
            tags: self.tags,
            confidence_score: self.confidence_score,
            method: self.method,
            created_at: Utc::now(),
        }
    }
}

/// Turns raw sentences into rules: normalize, run the cascade, fall back to
/// components, then (optionally) to relaxed acceptance tiers.
pub struct RuleExtractor {
    normalizer: OcrNormalizer,
    components: ComponentExtractor,
    cascade: PatternCascade,
    scorer: ConfidenceScorer,
    relaxed_fallback: bool,
}

impl RuleExtractor {
    pub fn new() -> Result<Self, ExtractionError> {
        Self::with_config(&ExtractionConfig::default())
    }

    pub fn with_config(config: &ExtractionConfig) -> Result<Self, ExtractionError> {
        Ok(Self {
            normalizer: OcrNormalizer::new()?,
            components: ComponentExtractor::new()?,
            cascade: PatternCascade::from_config(&config.patterns)?,
            scorer: ConfidenceScorer::new()?,
            relaxed_fallback: config.relaxed_fallback.enabled,
        })
    }

    pub fn normalizer(&self) -> &OcrNormalizer {
        &self.normalizer
    }

    pub fn components(&self) -> &ComponentExtractor {
        &self.components
    }

    pub fn assemble(
        &self,
        sentence: &str,
        source: &SourceInfo,
        context: &mut ExtractionContext,
    ) -> Option<Rule> {
        self.try_draft(sentence)
            .map(|draft| draft.into_rule(context.next_id(), source))
    }

    /// Builds the id-less rule for one sentence, or `Ok(None)` when nothing qualifies
    pub fn draft(&self, sentence: &str) -> Result<Option<RuleDraft>, ExtractionError> {
        let sentence = sentence.trim();
        let normalized = self.normalizer.normalize(sentence);
        if normalized.is_empty() {
            return Ok(None);
        }

        let candidate = match self.cascade.run(&normalized) {
            Some(found) => Some(self.from_pattern(found, &normalized)),
            None => self.component_fallback(&normalized).or_else(|| {
                if self.relaxed_fallback {
                    self.relaxed(&normalized)
                } else {
                    None
                }
            }),
        };
        let Some((conditions, effects, method)) = candidate else {
            return Ok(None);
        };

        let confidence_score = self.scorer.score(method, sentence, &conditions, &effects);
        let tags = build_tags(&conditions, &effects, method);

        let draft = RuleDraft {
            original_text: sentence.to_string(),
            conditions,
            effects,
            tags,
            confidence_score,
            method,
        };
        draft.check()?;
        Ok(Some(draft))
    }

    fn try_draft(&self, sentence: &str) -> Option<RuleDraft> {
        match self.draft(sentence) {
            Ok(draft) => draft,
            Err(e) => {
                let preview: String = sentence.chars().take(50).collect();
                tracing::warn!("Failed to assemble rule from '{preview}': {e}");
                None
            }
        }
    }

    fn from_pattern(
        &self,
        found: PatternMatch,
        normalized: &str,
    ) -> (RuleConditions, Vec<Effect>, ExtractionMethod) {
        let mut conditions = found.conditions;
        if conditions.ascendant.is_none() {
            conditions.ascendant = self.components.ascendant(normalized);
        }

        let effects = if found.effect_text.is_empty() {
            vec![Effect::general()]
        } else {
            vec![self.components.effect_from_clause(&found.effect_text, normalized)]
        };

        (conditions, effects, ExtractionMethod::Pattern(found.kind))
    }

    fn observed_conditions(&self, normalized: &str) -> RuleConditions {
        RuleConditions {
            planet: self.components.planet(normalized),
            house: self.components.house(normalized),
            sign: self.components.sign(normalized),
            nakshatra: self.components.nakshatra(normalized),
            ascendant: self.components.ascendant(normalized),
            ..Default::default()
        }
    }

    fn component_fallback(
        &self,
        normalized: &str,
    ) -> Option<(RuleConditions, Vec<Effect>, ExtractionMethod)> {
        let conditions = self.observed_conditions(normalized);
        if conditions.planet.is_none() || (conditions.house.is_none() && conditions.sign.is_none()) {
            return None;
        }

        let effects = self.components.extract_effects(normalized);
        Some((conditions, effects, ExtractionMethod::ComponentFallback))
    }

    fn relaxed(&self, normalized: &str) -> Option<(RuleConditions, Vec<Effect>, ExtractionMethod)> {
        let conditions = self.observed_conditions(normalized);
        let tier = acceptance_tier(&conditions, normalized)?;

        let mut effects = self.components.find_effects(normalized);
        if effects.is_empty() {
            effects.push(self.components.contextual_effect(normalized, conditions.house));
        }

        Some((conditions, effects, ExtractionMethod::Relaxed(tier)))
    }

    pub fn extract_batch<S: AsRef<str>>(
        &self,
        sentences: &[S],
        source: &SourceInfo,
    ) -> Result<Vec<Rule>, ExtractionError> {
        source.validate().map_err(ExtractionError::InvalidSource)?;

        let mut context = ExtractionContext::new(source);
        let rules: Vec<Rule> = sentences
            .iter()
            .filter_map(|sentence| self.assemble(sentence.as_ref(), source, &mut context))
            .collect();

        tracing::info!(
            "Extracted {} rules from {} sentences ({})",
            rules.len(),
            sentences.len(),
            source.title
        );
        Ok(rules)
    }

    /// Same result as `extract_batch`; partitions are drafted in parallel and
    /// ids are assigned after the merge.
    pub fn extract_batch_parallel<S: AsRef<str> + Sync>(
        &self,
        sentences: &[S],
        source: &SourceInfo,
        partition_size: usize,
    ) -> Result<Vec<Rule>, ExtractionError> {
        source.validate().map_err(ExtractionError::InvalidSource)?;

        let partitions: Vec<Vec<RuleDraft>> = sentences
            .par_chunks(partition_size.max(1))
            .map(|partition| {
                partition
                    .iter()
                    .filter_map(|sentence| self.try_draft(sentence.as_ref()))
                    .collect()
            })
            .collect();

        let mut context = ExtractionContext::new(source);
        let rules: Vec<Rule> = partitions
            .into_iter()
            .flatten()
            .map(|draft| draft.into_rule(context.next_id(), source))
            .collect();

        tracing::info!(
            "Extracted {} rules from {} sentences ({}, parallel)",
            rules.len(),
            sentences.len(),
            source.title
        );
        Ok(rules)
    }
}

/// Evidence tier for a sentence that matched no pattern and failed the component fallback
fn acceptance_tier(conditions: &RuleConditions, normalized: &str) -> Option<AcceptanceTier> {
    let planet = conditions.planet.is_some();
    let house = conditions.house.is_some();
    let sign = conditions.sign.is_some();
    let ascendant = conditions.ascendant.is_some();

    if planet && (house || sign || ascendant) {
        Some(AcceptanceTier::High)
    } else if house && (sign || ascendant) {
        Some(AcceptanceTier::Medium)
    } else if house && sign {
        Some(AcceptanceTier::MediumLow)
    } else if TermMatcher::new(normalized).mentions_any(STRONG_CLASSICAL_KEYWORDS) {
        Some(AcceptanceTier::Low)
    } else {
        None
    }
}

fn build_tags(conditions: &RuleConditions, effects: &[Effect], method: ExtractionMethod) -> Vec<String> {
    let mut tags = Vec::new();

    if let Some(planet) = conditions.planet {
        tags.push(format!("planet:{planet}"));
    }
    if let Some(house) = conditions.house {
        tags.push(format!("house:{house}"));
    }
    if let Some(sign) = conditions.sign {
        tags.push(format!("sign:{sign}"));
    }
    if let Some(nakshatra) = &conditions.nakshatra {
        tags.push(format!("nakshatra:{nakshatra}"));
    }
    if let Some(ascendant) = conditions.ascendant {
        tags.push(format!("ascendant:{ascendant}"));
    }
    match method {
        ExtractionMethod::Pattern(kind) => tags.push(format!("pattern:{}", kind.as_str())),
        ExtractionMethod::ComponentFallback => tags.push("pattern:fallback".to_string()),
        ExtractionMethod::Relaxed(_) => {}
    }
    if let Some(aspect) = conditions.aspect_planet {
        tags.push(format!("aspect:{aspect}"));
    }
    if let Some(lord) = conditions.lord_of_house {
        tags.push(format!("lord:{lord}"));
    }
    if let Some(yoga) = &conditions.yoga_type {
        tags.push(format!("yoga:{yoga}"));
    }
    for effect in effects {
        tags.push(format!("category:{}", effect.category));
    }
    if effects.iter().any(|e| !e.positive) {
        tags.push("negative".to_string());
    }
    if method.is_relaxed() {
        tags.push("method:relaxed".to_string());
    }

    let mut unique: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags.into_iter().map(|t| t.to_lowercase()) {
        if !unique.contains(&tag) {
            unique.push(tag);
        }
    }
    unique
}
