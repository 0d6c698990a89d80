// Astrorules Core Library
//
// Extracts structured astrological rules from OCR'd classical texts.
// Main interface for turning document text into scored, tagged rules.

pub mod types;
pub mod error;
pub mod vocabulary;
pub mod normalizer;
pub mod extractors;
pub mod patterns;
pub mod scoring;
pub mod assembler;
pub mod segmenter;
pub mod classifier;
pub mod config;
pub mod cache;
pub mod storage;
pub mod sources;
pub mod processor;

// Re-export main types and functions for easy use
pub use types::*;
pub use error::ExtractionError;
pub use normalizer::OcrNormalizer;
pub use extractors::ComponentExtractor;
pub use patterns::{PatternCascade, PatternMatch};
pub use scoring::ConfidenceScorer;
pub use assembler::{ExtractionContext, RuleExtractor};
pub use config::ExtractionConfig;
pub use processor::RuleProcessor;
pub use storage::{InMemoryRepository, JsonFileRepository, RuleQuery, RuleRepository};
pub use sources::{SourceMetadata, SourceRegistry};
