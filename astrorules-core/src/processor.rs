use crate::assembler::RuleExtractor;
use crate::cache::{ExtractionCache, ExtractionCacheKey, ExtractionCacheValue, FileCache};
use crate::classifier::AstroContentClassifier;
use crate::config::ExtractionConfig;
use crate::error::ExtractionError;
use crate::segmenter::DocumentSegmenter;
use crate::types::*;
use anyhow::{anyhow, Result};
use std::path::Path;
use std::time::{Duration, Instant};

/// Captured intermediate outputs from each pipeline stage
/// Used for diagnostics (`--dump-stages`) and for testing stage boundaries
#[derive(Debug, Clone, serde::Serialize)]
pub struct PipelineStages {
    pub cleaned_text: String,
    pub sentences: Vec<String>,
    pub astrological_sentences: Vec<String>,
    pub rules: Vec<Rule>,
}

/// Simple profiler that collects timings for pipeline steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        self.timings.push((step_name.to_string(), elapsed));
        println!("⏱️  {}: {:.0}ms", step_name, elapsed.as_millis());

        result
    }

    pub fn steps(&self) -> Vec<&str> {
        self.timings.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn print_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        println!("\n📊 Performance Summary:");
        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();

        for (step, duration) in &self.timings {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            };
            println!(
                "   {:.<35} {:.0}ms ({:.1}%)",
                step,
                duration.as_millis(),
                percentage
            );
        }
        println!("   {:.<35} {:.0}ms", "Total", total.as_millis());
    }
}

/// Document text + config + source → extraction report, with report caching
pub struct RuleProcessor {
    cache: Box<dyn ExtractionCache + Send + Sync>,
    config: ExtractionConfig,
    segmenter: DocumentSegmenter,
    classifier: AstroContentClassifier,
    extractor: RuleExtractor,
}

impl RuleProcessor {
    /// Create RuleProcessor with full dependency injection
    pub fn new_with_dependencies(
        cache: Box<dyn ExtractionCache + Send + Sync>,
        config: ExtractionConfig,
    ) -> Result<Self> {
        Ok(Self {
            cache,
            segmenter: DocumentSegmenter::new(&config.segmentation)?,
            classifier: AstroContentClassifier::new(),
            extractor: RuleExtractor::with_config(&config)?,
            config,
        })
    }

    /// Convenience constructor for CLI usage with a file cache
    pub fn new_cli_with_cache(cache_dir: &str, config: ExtractionConfig) -> Result<Self> {
        let cache = Box::new(FileCache::new(cache_dir)?);
        Self::new_with_dependencies(cache, config)
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn extractor(&self) -> &RuleExtractor {
        &self.extractor
    }

    /// Process text with caching and without profiling
    pub fn process_text(&self, text: &str, source: &SourceInfo) -> Result<ExtractionReport> {
        self.process_text_with_profiling(text, source, false, false)
    }

    /// Main entry point: Text + Config + Source → Report, with cache lookup and storage
    pub fn process_text_with_profiling(
        &self,
        text: &str,
        source: &SourceInfo,
        enable_profiling: bool,
        skip_cache: bool,
    ) -> Result<ExtractionReport> {
        source
            .validate()
            .map_err(ExtractionError::InvalidSource)?;

        let start_time = Instant::now();
        let mut profiler = StepProfiler::new(enable_profiling);

        let cache_key = profiler.time_step("Cache Key Generation", || {
            ExtractionCacheKey::for_document(text, &self.config, source)
        })?;

        let cached_result = if skip_cache {
            println!("🚫 Skipping cache lookup (--skip-cache enabled)");
            None
        } else {
            profiler.time_step("Cache Lookup", || self.cache.get(&cache_key))?
        };

        if let Some(cached) = cached_result {
            println!("🎯 Cache hit: Found rules for text + config combination");
            profiler.print_summary();
            tracing::debug!(
                "Cache hit for {} ({} rules)",
                source.title,
                cached.report.rules.len()
            );
            return Ok(cached.report);
        }

        let report = self.run_pipeline(text, source, &mut profiler, start_time)?;

        if !skip_cache {
            profiler.time_step("Cache Storage", || {
                let cache_value = ExtractionCacheValue::new(report.clone(), report.processing_time_ms);
                self.cache.store(&cache_key, &cache_value)
            })?;
        } else {
            println!("🚫 Skipping cache storage (--skip-cache enabled)");
        }

        profiler.print_summary();
        Ok(report)
    }

    /// Reads a UTF-8 text file and processes it
    pub fn process_file(
        &self,
        input_path: &Path,
        source: &SourceInfo,
        enable_profiling: bool,
        skip_cache: bool,
    ) -> Result<ExtractionReport> {
        let text = std::fs::read_to_string(input_path)
            .map_err(|e| anyhow!("Failed to read {}: {}", input_path.display(), e))?;
        println!("📄 Processing document: {}", input_path.display());
        self.process_text_with_profiling(&text, source, enable_profiling, skip_cache)
    }

    /// Runs every stage without the cache and keeps each intermediate output
    pub fn capture_stages(&self, text: &str, source: &SourceInfo) -> Result<PipelineStages> {
        let cleaned_text = self.segmenter.clean(text);
        println!("📋 Stage 1: cleaned text captured ({} chars)", cleaned_text.len());

        let sentences = self.segmenter.split(&cleaned_text);
        println!("📋 Stage 2: {} sentences captured", sentences.len());

        let astrological_sentences = self.filter(sentences.clone());
        println!(
            "📋 Stage 3: {} astrological sentences captured",
            astrological_sentences.len()
        );

        let rules = self.extract(&astrological_sentences, source)?;
        println!("📋 Stage 4: {} rules captured", rules.len());

        Ok(PipelineStages {
            cleaned_text,
            sentences,
            astrological_sentences,
            rules,
        })
    }

    fn run_pipeline(
        &self,
        text: &str,
        source: &SourceInfo,
        profiler: &mut StepProfiler,
        start_time: Instant,
    ) -> Result<ExtractionReport> {
        let sentences = profiler.time_step("1. Segmentation", || self.segmenter.segment(text));
        let total_sentences = sentences.len();

        let candidates = profiler.time_step("2. Content Filter", || self.filter(sentences));
        let astrological_sentences = candidates.len();

        let rules = profiler.time_step("3. Rule Extraction", || self.extract(&candidates, source))?;

        let report = ExtractionReport {
            source: source.clone(),
            total_sentences,
            astrological_sentences,
            rules,
            processing_time_ms: start_time.elapsed().as_millis() as u64,
        };

        println!(
            "✅ Extracted {} rules from {} sentences ({} astrological)",
            report.rules.len(),
            total_sentences,
            astrological_sentences
        );
        Ok(report)
    }

    fn filter(&self, sentences: Vec<String>) -> Vec<String> {
        if self.config.content_filter.enabled {
            self.classifier.identify(sentences)
        } else {
            sentences
        }
    }

    fn extract(&self, sentences: &[String], source: &SourceInfo) -> Result<Vec<Rule>> {
        let rules = if self.config.parallel.enabled {
            self.extractor
                .extract_batch_parallel(sentences, source, self.config.parallel.partition_size)?
        } else {
            self.extractor.extract_batch(sentences, source)?
        };
        Ok(rules)
    }
}
