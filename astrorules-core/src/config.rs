use crate::types::PatternKind;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_min_sentence_chars() -> usize {
    10
}

fn default_max_sentence_chars() -> usize {
    500
}

fn default_partition_size() -> usize {
    256
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default)]
    pub segmentation: SegmentationConfig,
    /// Drops sentences with no astrological vocabulary before extraction
    #[serde(default)]
    pub content_filter: ContentFilterConfig,
    /// Which cascade patterns run; order is fixed regardless of list order
    #[serde(default)]
    pub patterns: PatternsConfig,
    #[serde(default)]
    pub relaxed_fallback: RelaxedFallbackConfig,
    #[serde(default)]
    pub parallel: ParallelConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationConfig {
    #[serde(default = "default_min_sentence_chars")]
    pub min_sentence_chars: usize,
    #[serde(default = "default_max_sentence_chars")]
    pub max_sentence_chars: usize,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            min_sentence_chars: default_min_sentence_chars(),
            max_sentence_chars: default_max_sentence_chars(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentFilterConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ContentFilterConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternsConfig {
    /// Patterns by name; a pattern missing from the list stays enabled
    #[serde(default)]
    pub rules: Vec<PatternRuleConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRuleConfig {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl PatternsConfig {
    pub fn is_enabled(&self, name: &str) -> bool {
        self.rules
            .iter()
            .find(|rule| rule.name == name)
            .map_or(true, |rule| rule.enabled)
    }

    pub fn disable(&mut self, name: &str) {
        match self.rules.iter_mut().find(|rule| rule.name == name) {
            Some(rule) => rule.enabled = false,
            None => self.rules.push(PatternRuleConfig {
                name: name.to_string(),
                enabled: false,
            }),
        }
    }

    /// Names that match no known pattern
    pub fn unknown_names(&self) -> Vec<&str> {
        self.rules
            .iter()
            .map(|rule| rule.name.as_str())
            .filter(|name| !PatternKind::ALL.iter().any(|kind| kind.as_str() == *name))
            .collect()
    }
}

impl Default for PatternsConfig {
    fn default() -> Self {
        Self {
            rules: PatternKind::ALL
                .iter()
                .map(|kind| PatternRuleConfig {
                    name: kind.as_str().to_string(),
                    enabled: true,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelaxedFallbackConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for RelaxedFallbackConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_partition_size")]
    pub partition_size: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            partition_size: default_partition_size(),
        }
    }
}

impl ExtractionConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config {}: {}", path, e))?;
        let config: ExtractionConfig = serde_yaml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config {}: {}", path, e))?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| anyhow!("Failed to serialize config: {}", e))
    }
}
