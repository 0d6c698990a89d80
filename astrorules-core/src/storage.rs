use crate::types::*;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Filter for `RuleRepository::search`; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleQuery {
    pub planet: Option<Planet>,
    pub house: Option<u8>,
    pub sign: Option<Sign>,
    /// Case-insensitive substring of the source title
    pub source: Option<String>,
    pub min_confidence: Option<f32>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryStats {
    pub total_rules: usize,
    pub unique_sources: usize,
    pub planet_distribution: BTreeMap<String, usize>,
    pub house_distribution: BTreeMap<u8, usize>,
    pub average_confidence: f64,
}

/// Storage for extracted rules
pub trait RuleRepository {
    /// Inserts or replaces by id; invalid rules are skipped. Returns how many were stored.
    fn store_batch(&mut self, rules: &[Rule]) -> Result<usize>;
    fn get_rule(&self, id: &str) -> Result<Option<Rule>>;
    fn search_by_conditions(
        &self,
        planet: Option<Planet>,
        house: Option<u8>,
        sign: Option<Sign>,
    ) -> Result<Vec<Rule>>;
    /// Ordered by confidence descending, then authority rank ascending
    fn search(&self, query: &RuleQuery) -> Result<Vec<Rule>>;
    fn rules_by_tag(&self, tag: &str) -> Result<Vec<Rule>>;
    /// Other rules matching this rule's planet, house and sign (unset fields match anything)
    /// with an effect of the same category but opposite polarity
    fn conflicting_rules(&self, rule: &Rule) -> Result<Vec<Rule>>;
    fn stats(&self) -> Result<RepositoryStats>;
    /// Removes everything, returning the number of rules removed
    fn clear(&mut self) -> Result<usize>;
    fn export_json(&self, path: &Path) -> Result<usize>;
}

fn matches_conditions(
    rule: &Rule,
    planet: Option<Planet>,
    house: Option<u8>,
    sign: Option<Sign>,
) -> bool {
    planet.map_or(true, |p| rule.conditions.planet == Some(p))
        && house.map_or(true, |h| rule.conditions.house == Some(h))
        && sign.map_or(true, |s| rule.conditions.sign == Some(s))
}

fn effects_conflict(a: &[Effect], b: &[Effect]) -> bool {
    a.iter().any(|x| {
        b.iter()
            .any(|y| x.category == y.category && x.positive != y.positive)
    })
}

/// Rules held in insertion order
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    rules: Vec<Rule>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn upsert(&mut self, rule: &Rule) {
        match self.rules.iter_mut().find(|existing| existing.id == rule.id) {
            Some(existing) => *existing = rule.clone(),
            None => self.rules.push(rule.clone()),
        }
    }
}

impl RuleRepository for InMemoryRepository {
    fn store_batch(&mut self, rules: &[Rule]) -> Result<usize> {
        let mut stored = 0;
        for rule in rules {
            let problems = rule.validate();
            if !problems.is_empty() {
                tracing::warn!("Rejected rule {}: {}", rule.id, problems.join("; "));
                continue;
            }
            self.upsert(rule);
            stored += 1;
        }
        Ok(stored)
    }

    fn get_rule(&self, id: &str) -> Result<Option<Rule>> {
        Ok(self.rules.iter().find(|rule| rule.id == id).cloned())
    }

    fn search_by_conditions(
        &self,
        planet: Option<Planet>,
        house: Option<u8>,
        sign: Option<Sign>,
    ) -> Result<Vec<Rule>> {
        Ok(self
            .rules
            .iter()
            .filter(|rule| matches_conditions(rule, planet, house, sign))
            .cloned()
            .collect())
    }

    fn search(&self, query: &RuleQuery) -> Result<Vec<Rule>> {
        let source = query.source.as_ref().map(|s| s.to_lowercase());

        let mut found: Vec<Rule> = self
            .rules
            .iter()
            .filter(|rule| matches_conditions(rule, query.planet, query.house, query.sign))
            .filter(|rule| {
                source
                    .as_ref()
                    .map_or(true, |s| rule.source.title.to_lowercase().contains(s))
            })
            .filter(|rule| {
                query
                    .min_confidence
                    .map_or(true, |min| rule.confidence_score >= min)
            })
            .cloned()
            .collect();

        found.sort_by(|a, b| {
            b.confidence_score
                .total_cmp(&a.confidence_score)
                .then(a.source.authority_level.rank().cmp(&b.source.authority_level.rank()))
        });
        if let Some(limit) = query.limit {
            found.truncate(limit);
        }
        Ok(found)
    }

    fn rules_by_tag(&self, tag: &str) -> Result<Vec<Rule>> {
        let tag = tag.to_lowercase();
        Ok(self
            .rules
            .iter()
            .filter(|rule| rule.has_tag(&tag))
            .cloned()
            .collect())
    }

    fn conflicting_rules(&self, rule: &Rule) -> Result<Vec<Rule>> {
        Ok(self
            .rules
            .iter()
            .filter(|other| other.id != rule.id)
            .filter(|other| {
                matches_conditions(
                    other,
                    rule.conditions.planet,
                    rule.conditions.house,
                    rule.conditions.sign,
                )
            })
            .filter(|other| effects_conflict(&rule.effects, &other.effects))
            .cloned()
            .collect())
    }

    fn stats(&self) -> Result<RepositoryStats> {
        let mut planet_distribution = BTreeMap::new();
        let mut house_distribution = BTreeMap::new();
        let mut sources = BTreeSet::new();

        for rule in &self.rules {
            sources.insert(rule.source.title.as_str());
            if let Some(planet) = rule.conditions.planet {
                *planet_distribution.entry(planet.to_string()).or_insert(0) += 1;
            }
            if let Some(house) = rule.conditions.house {
                *house_distribution.entry(house).or_insert(0) += 1;
            }
        }

        let average_confidence = if self.rules.is_empty() {
            0.0
        } else {
            let sum: f64 = self.rules.iter().map(|r| f64::from(r.confidence_score)).sum();
            (sum / self.rules.len() as f64 * 1000.0).round() / 1000.0
        };

        Ok(RepositoryStats {
            total_rules: self.rules.len(),
            unique_sources: sources.len(),
            planet_distribution,
            house_distribution,
            average_confidence,
        })
    }

    fn clear(&mut self) -> Result<usize> {
        let removed = self.rules.len();
        self.rules.clear();
        Ok(removed)
    }

    fn export_json(&self, path: &Path) -> Result<usize> {
        write_rules(path, &self.rules)?;
        Ok(self.rules.len())
    }
}

fn write_rules(path: &Path, rules: &[Rule]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| anyhow!("Failed to create directory {}: {}", parent.display(), e))?;
    }
    let json_str = serde_json::to_string_pretty(rules)
        .map_err(|e| anyhow!("Failed to serialize rules: {}", e))?;
    fs::write(path, json_str)
        .map_err(|e| anyhow!("Failed to write {}: {}", path.display(), e))?;
    Ok(())
}

/// Whole-file JSON store: loaded on open, rewritten after every mutation
pub struct JsonFileRepository {
    path: PathBuf,
    inner: InMemoryRepository,
}

impl JsonFileRepository {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let rules = if path.exists() {
            let json_str = fs::read_to_string(&path)
                .map_err(|e| anyhow!("Failed to read rule store {}: {}", path.display(), e))?;
            serde_json::from_str::<Vec<Rule>>(&json_str)
                .map_err(|e| anyhow!("Failed to parse rule store {}: {}", path.display(), e))?
        } else {
            Vec::new()
        };
        tracing::debug!("Opened rule store {} ({} rules)", path.display(), rules.len());

        Ok(Self {
            path,
            inner: InMemoryRepository::with_rules(rules),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        write_rules(&self.path, self.inner.rules())
    }
}

impl RuleRepository for JsonFileRepository {
    fn store_batch(&mut self, rules: &[Rule]) -> Result<usize> {
        let stored = self.inner.store_batch(rules)?;
        self.persist()?;
        Ok(stored)
    }

    fn get_rule(&self, id: &str) -> Result<Option<Rule>> {
        self.inner.get_rule(id)
    }

    fn search_by_conditions(
        &self,
        planet: Option<Planet>,
        house: Option<u8>,
        sign: Option<Sign>,
    ) -> Result<Vec<Rule>> {
        self.inner.search_by_conditions(planet, house, sign)
    }

    fn search(&self, query: &RuleQuery) -> Result<Vec<Rule>> {
        self.inner.search(query)
    }

    fn rules_by_tag(&self, tag: &str) -> Result<Vec<Rule>> {
        self.inner.rules_by_tag(tag)
    }

    fn conflicting_rules(&self, rule: &Rule) -> Result<Vec<Rule>> {
        self.inner.conflicting_rules(rule)
    }

    fn stats(&self) -> Result<RepositoryStats> {
        self.inner.stats()
    }

    fn clear(&mut self) -> Result<usize> {
        let removed = self.inner.clear()?;
        self.persist()?;
        Ok(removed)
    }

    fn export_json(&self, path: &Path) -> Result<usize> {
        self.inner.export_json(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn rule(id: &str, confidence: f32, level: AuthorityLevel, positive: bool) -> Rule {
        Rule {
            id: id.to_string(),
            original_text: "Mars in the 7th house".to_string(),
            conditions: RuleConditions {
                planet: Some(Planet::Mars),
                house: Some(7),
                ..Default::default()
            },
            effects: vec![Effect {
                category: EffectCategory::Marriage,
                description: "marriage matters".to_string(),
                positive,
                strength: Strength::Medium,
                timing: None,
            }],
            source: SourceInfo::new(format!("Book {level:?}"), level),
            tags: vec!["planet:mars".to_string(), "house:7".to_string()],
            confidence_score: confidence,
            method: ExtractionMethod::Pattern(PatternKind::BasicPlacement),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn store_replaces_by_id_and_skips_invalid() {
        let mut repo = InMemoryRepository::new();
        let mut bad = rule("bad_1", 0.5, AuthorityLevel::Modern, true);
        bad.effects.clear();

        let stored = repo
            .store_batch(&[rule("a_1", 0.5, AuthorityLevel::Modern, true), bad])
            .unwrap();
        assert_eq!(stored, 1);

        repo.store_batch(&[rule("a_1", 0.9, AuthorityLevel::Modern, true)])
            .unwrap();
        assert_eq!(repo.len(), 1);
        assert_eq!(repo.get_rule("a_1").unwrap().unwrap().confidence_score, 0.9);
        assert!(repo.get_rule("bad_1").unwrap().is_none());
    }

    #[test]
    fn search_orders_by_confidence_then_authority() {
        let mut repo = InMemoryRepository::new();
        repo.store_batch(&[
            rule("m_1", 0.6, AuthorityLevel::Modern, true),
            rule("c_1", 0.6, AuthorityLevel::Classical, true),
            rule("t_1", 0.9, AuthorityLevel::Traditional, true),
        ])
        .unwrap();

        let ids: Vec<_> = repo
            .search(&RuleQuery::default())
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["t_1", "c_1", "m_1"]);

        let query = RuleQuery {
            min_confidence: Some(0.7),
            ..Default::default()
        };
        assert_eq!(repo.search(&query).unwrap().len(), 1);

        let query = RuleQuery {
            source: Some("classical".to_string()),
            limit: Some(5),
            ..Default::default()
        };
        assert_eq!(repo.search(&query).unwrap()[0].id, "c_1");
    }

    #[test]
    fn conditions_and_tags() {
        let mut repo = InMemoryRepository::new();
        repo.store_batch(&[rule("a_1", 0.5, AuthorityLevel::Modern, true)])
            .unwrap();

        assert_eq!(
            repo.search_by_conditions(Some(Planet::Mars), Some(7), None)
                .unwrap()
                .len(),
            1
        );
        assert!(repo
            .search_by_conditions(Some(Planet::Venus), None, None)
            .unwrap()
            .is_empty());
        assert_eq!(repo.rules_by_tag("HOUSE:7").unwrap().len(), 1);
    }

    #[test]
    fn conflicts_need_opposite_polarity() {
        let mut repo = InMemoryRepository::new();
        let good = rule("a_1", 0.5, AuthorityLevel::Modern, true);
        let bad = rule("a_2", 0.5, AuthorityLevel::Modern, false);
        let also_good = rule("a_3", 0.5, AuthorityLevel::Modern, true);
        repo.store_batch(&[good.clone(), bad, also_good]).unwrap();

        let conflicts = repo.conflicting_rules(&good).unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].id, "a_2");
    }

    #[test]
    fn stats_summarize_repository() {
        let mut repo = InMemoryRepository::new();
        repo.store_batch(&[
            rule("a_1", 0.5, AuthorityLevel::Modern, true),
            rule("b_1", 0.8, AuthorityLevel::Classical, true),
        ])
        .unwrap();

        let stats = repo.stats().unwrap();
        assert_eq!(stats.total_rules, 2);
        assert_eq!(stats.unique_sources, 2);
        assert_eq!(stats.planet_distribution.get("Mars"), Some(&2));
        assert_eq!(stats.house_distribution.get(&7), Some(&2));
        assert!((stats.average_confidence - 0.65).abs() < 1e-9);
    }

    #[test]
    fn json_file_repository_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");

        {
            let mut repo = JsonFileRepository::open(&path).unwrap();
            repo.store_batch(&[rule("a_1", 0.5, AuthorityLevel::Modern, true)])
                .unwrap();
        }

        let mut reopened = JsonFileRepository::open(&path).unwrap();
        let loaded = reopened.get_rule("a_1").unwrap().unwrap();
        assert_eq!(loaded.conditions.house, Some(7));
        assert_eq!(reopened.clear().unwrap(), 1);
        assert!(JsonFileRepository::open(&path)
            .unwrap()
            .stats()
            .unwrap()
            .total_rules
            == 0);
    }

    #[test]
    fn export_writes_all_rules() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = InMemoryRepository::new();
        repo.store_batch(&[
            rule("a_1", 0.5, AuthorityLevel::Modern, true),
            rule("a_2", 0.5, AuthorityLevel::Modern, false),
        ])
        .unwrap();

        let out = dir.path().join("nested").join("export.json");
        assert_eq!(repo.export_json(&out).unwrap(), 2);
        let back: Vec<Rule> = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(back.len(), 2);
    }
}
