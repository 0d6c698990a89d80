use crate::types::{AuthorityLevel, SourceInfo};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;

/// One known book in the source hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub authority_level: AuthorityLevel,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl SourceMetadata {
    pub fn new(title: impl Into<String>, authority_level: AuthorityLevel) -> Self {
        Self {
            title: title.into(),
            author: None,
            authority_level,
            language: None,
            period: None,
            description: None,
        }
    }

    fn author_matches(&self, author: &str) -> bool {
        self.author
            .as_deref()
            .map_or(true, |known| known.trim().eq_ignore_ascii_case(author.trim()))
    }
}

/// Registered sources, read from a YAML file with a top-level `sources:` list.
///
/// Titles are matched case-insensitively with surrounding whitespace ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRegistry {
    #[serde(default)]
    sources: Vec<SourceMetadata>,
}

impl Default for SourceRegistry {
    fn default() -> Self {
        let mut parashara =
            SourceMetadata::new("Brihat Parashara Hora Shastra", AuthorityLevel::Classical);
        parashara.author = Some("Maharishi Parashara".to_string());
        parashara.language = Some("Sanskrit".to_string());
        parashara.period = Some("Ancient".to_string());
        parashara.description = Some("Foundational classical text".to_string());

        Self::new(vec![parashara])
    }
}

impl SourceRegistry {
    /// Later entries with an already registered title replace the earlier one
    pub fn new(sources: Vec<SourceMetadata>) -> Self {
        let mut registry = Self {
            sources: Vec::with_capacity(sources.len()),
        };
        for source in sources {
            registry.register(source);
        }
        registry
    }

    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read sources {}: {}", path, e))?;
        let parsed: SourceRegistry = serde_yaml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse sources {}: {}", path, e))?;
        Ok(Self::new(parsed.sources))
    }

    pub fn sources(&self) -> &[SourceMetadata] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn register(&mut self, source: SourceMetadata) {
        let key = title_key(&source.title);
        match self.sources.iter_mut().find(|s| title_key(&s.title) == key) {
            Some(existing) => *existing = source,
            None => self.sources.push(source),
        }
    }

    pub fn get(&self, title: &str) -> Option<&SourceMetadata> {
        let key = title_key(title);
        self.sources.iter().find(|s| title_key(&s.title) == key)
    }

    /// Known title, and when an author is given it must agree with the registered one
    pub fn validate(&self, title: &str, author: Option<&str>) -> bool {
        match (self.get(title), author) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(meta), Some(author)) => meta.author_matches(author),
        }
    }

    pub fn by_authority(&self, level: AuthorityLevel) -> Vec<&SourceMetadata> {
        self.sources
            .iter()
            .filter(|s| s.authority_level == level)
            .collect()
    }

    /// Picks the most authoritative of several titles.
    ///
    /// Unregistered titles are ignored unless none are registered, in which case
    /// the first title wins. Equal authority keeps the caller's order.
    pub fn resolve_conflict<'a>(&self, titles: &[&'a str]) -> Option<&'a str> {
        let known = titles
            .iter()
            .filter_map(|title| self.get(title).map(|meta| (*title, meta.authority_level.rank())))
            .min_by_key(|(_, rank)| *rank);

        match known {
            Some((title, _)) => Some(title),
            None => titles.first().copied(),
        }
    }

    /// Source description for an extraction run.
    ///
    /// A registered title supplies the canonical title, the author and the
    /// authority level; `authority` overrides the registered level and is the
    /// only level used for unregistered titles (default: modern). A given author
    /// is kept even when it disagrees with the registry; see `validate`.
    pub fn source_info(
        &self,
        title: &str,
        author: Option<&str>,
        authority: Option<AuthorityLevel>,
    ) -> SourceInfo {
        let Some(meta) = self.get(title) else {
            tracing::debug!("Source '{}' is not registered", title.trim());
            let mut info = SourceInfo::new(title.trim(), authority.unwrap_or_default());
            info.author = author.map(str::to_string);
            return info;
        };

        let mut info = SourceInfo::new(
            meta.title.clone(),
            authority.unwrap_or(meta.authority_level),
        );
        info.author = author.map(str::to_string).or_else(|| meta.author.clone());
        info
    }
}

fn title_key(title: &str) -> String {
    title.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SourceRegistry {
        let yaml = "
sources:
  - title: Saravali
    author: Kalyana Varma
    authority_level: classical
  - title: Phaladeepika
    author: Mantreswara
    authority_level: traditional
  - title: Light on Life
    authority_level: modern
";
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn lookup_ignores_case_and_spacing() {
        let registry = registry();
        let meta = registry.get("  saravali ").unwrap();
        assert_eq!(meta.author.as_deref(), Some("Kalyana Varma"));
        assert_eq!(meta.authority_level, AuthorityLevel::Classical);
        assert!(registry.get("Light  on life").is_some());
        assert!(registry.get("Jataka Parijata").is_none());
    }

    #[test]
    fn validation_checks_the_author() {
        let registry = registry();
        assert!(registry.validate("Saravali", None));
        assert!(registry.validate("Saravali", Some("kalyana varma")));
        assert!(!registry.validate("Saravali", Some("Mantreswara")));
        assert!(!registry.validate("Jataka Parijata", None));
        // No registered author to disagree with
        assert!(registry.validate("Light on Life", Some("Anyone")));
    }

    #[test]
    fn conflicts_resolve_to_highest_authority() {
        let registry = registry();
        assert_eq!(
            registry.resolve_conflict(&["Light on Life", "Phaladeepika", "Saravali"]),
            Some("Saravali")
        );
        assert_eq!(
            registry.resolve_conflict(&["Unknown Book", "Phaladeepika"]),
            Some("Phaladeepika")
        );
        assert_eq!(
            registry.resolve_conflict(&["Unknown Book", "Other Book"]),
            Some("Unknown Book")
        );
        assert_eq!(registry.resolve_conflict(&[]), None);
    }

    #[test]
    fn equal_authority_keeps_caller_order() {
        let mut registry = registry();
        registry.register(SourceMetadata::new("Brihat Jataka", AuthorityLevel::Classical));
        assert_eq!(
            registry.resolve_conflict(&["Brihat Jataka", "Saravali"]),
            Some("Brihat Jataka")
        );
        assert_eq!(
            registry.resolve_conflict(&["Saravali", "Brihat Jataka"]),
            Some("Saravali")
        );
    }

    #[test]
    fn source_info_uses_registered_metadata() {
        let registry = registry();
        let info = registry.source_info("saravali", None, None);
        assert_eq!(info.title, "Saravali");
        assert_eq!(info.author.as_deref(), Some("Kalyana Varma"));
        assert_eq!(info.authority_level, AuthorityLevel::Classical);
    }

    #[test]
    fn explicit_authority_overrides_the_registry() {
        let registry = registry();
        let info = registry.source_info("Saravali", None, Some(AuthorityLevel::Commentary));
        assert_eq!(info.authority_level, AuthorityLevel::Commentary);

        let unknown = registry.source_info("My Notes", Some("Me"), None);
        assert_eq!(unknown.authority_level, AuthorityLevel::Modern);
        assert_eq!(unknown.author.as_deref(), Some("Me"));
    }

    #[test]
    fn mismatched_author_is_kept_as_given() {
        let info = registry().source_info("Saravali", Some("Someone Else"), None);
        assert_eq!(info.author.as_deref(), Some("Someone Else"));
        assert_eq!(info.authority_level, AuthorityLevel::Classical);
    }

    #[test]
    fn grouping_by_authority() {
        let registry = registry();
        let classical = registry.by_authority(AuthorityLevel::Classical);
        assert_eq!(classical.len(), 1);
        assert_eq!(classical[0].title, "Saravali");
        assert!(registry.by_authority(AuthorityLevel::Commentary).is_empty());
        assert_eq!(registry.by_authority(AuthorityLevel::Traditional).len(), 1);
    }

    #[test]
    fn duplicate_titles_keep_the_last_entry() {
        let registry = SourceRegistry::new(vec![
            SourceMetadata::new("Saravali", AuthorityLevel::Modern),
            SourceMetadata::new("SARAVALI", AuthorityLevel::Classical),
        ]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.sources()[0].authority_level, AuthorityLevel::Classical);
    }

    #[test]
    fn load_from_file_reads_sources_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sources.yaml");
        std::fs::write(&path, "sources:\n  - title: Saravali\n    authority_level: classical\n")
            .unwrap();

        let loaded = SourceRegistry::load_from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(SourceRegistry::load_from_file("/nonexistent/sources.yaml").is_err());

        let builtin = SourceRegistry::default();
        assert!(builtin.validate("Brihat Parashara Hora Shastra", Some("Maharishi Parashara")));
    }
}
