use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use astrorules_cli::paths;
use astrorules_core::processor::{PipelineStages, RuleProcessor};
use astrorules_core::{
    AuthorityLevel, ExtractionConfig, ExtractionReport, JsonFileRepository, OcrNormalizer, Planet,
    Rule, RuleQuery, RuleRepository, Sign, SourceInfo, SourceRegistry,
};

#[derive(Parser)]
#[command(name = "astrorules")]
#[command(about = "Extracts structured astrological rules from OCR'd classical texts")]
struct Args {
    /// Path to custom config file (YAML format)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Rule store file (default: <data dir>/astrorules/rules.json)
    #[arg(long, global = true)]
    store: Option<String>,

    /// Source registry file with a `sources:` list
    /// (default: <data dir>/astrorules/sources.yaml when present)
    #[arg(long, global = true)]
    sources: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract rules from a text file and add them to the store
    Extract {
        /// Path to the UTF-8 text of the book or chapter
        input: String,

        /// Source title (default: input file name); registered titles supply author and authority
        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        author: Option<String>,

        /// classical, traditional, modern or commentary; overrides the registry
        /// (default: registered level, else modern)
        #[arg(long)]
        authority: Option<AuthorityLevel>,

        #[arg(long)]
        chapter: Option<String>,

        /// Also write the extraction report to this file
        #[arg(short, long)]
        output: Option<String>,

        /// Cache directory (default: <data dir>/astrorules/cache)
        #[arg(long)]
        cache_dir: Option<String>,

        /// Enable detailed profiling of all pipeline steps
        #[arg(long)]
        profile: bool,

        /// Skip cache and force fresh processing
        #[arg(long)]
        skip_cache: bool,

        /// Print the report without touching the rule store
        #[arg(long)]
        dry_run: bool,

        /// Dump all intermediate pipeline stage outputs to a directory
        #[arg(long)]
        dump_stages: bool,

        #[arg(long, default_value = "test_outputs/stages")]
        stages_dir: String,
    },

    /// Search stored rules, best first
    Search {
        #[arg(long)]
        planet: Option<Planet>,

        #[arg(long)]
        house: Option<u8>,

        #[arg(long)]
        sign: Option<Sign>,

        /// Substring of the source title
        #[arg(long)]
        source: Option<String>,

        #[arg(long)]
        min_confidence: Option<f32>,

        /// Only rules carrying this tag, e.g. "category:wealth"
        #[arg(long)]
        tag: Option<String>,

        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Also list rules that contradict each hit
        #[arg(long)]
        conflicts: bool,
    },

    /// Summarize the rule store
    Stats,

    /// Write every stored rule to a JSON file
    Export { output: String },

    /// Remove every stored rule
    Clear,

    /// Show what the OCR normalizer makes of a piece of text
    Normalize { text: String },

    /// Print the effective configuration as YAML
    ShowConfig,

    /// List registered sources, most authoritative first
    Sources,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let (config, config_path) = load_or_default(
        args.config.as_deref(),
        "config",
        ExtractionConfig::load_from_file,
        ExtractionConfig::default,
    );

    let sources_path = args.sources.clone().or_else(|| {
        let default = paths::default_sources_path();
        default
            .exists()
            .then(|| default.to_string_lossy().into_owned())
    });
    let (registry, registry_path) = load_or_default(
        sources_path.as_deref(),
        "sources",
        SourceRegistry::load_from_file,
        SourceRegistry::default,
    );

    let store_path = paths::resolve(args.store.as_deref(), paths::default_store_path);
    tracing::debug!("Using rule store {}", store_path.display());

    let outcome = match args.command {
        Command::Extract {
            input,
            title,
            author,
            authority,
            chapter,
            output,
            cache_dir,
            profile,
            skip_cache,
            dry_run,
            dump_stages,
            stages_dir,
        } => {
            println!("🔭 Astrorules Rule Extractor");
            if let Some(path) = &config_path {
                println!("📋 Loaded config from: {}", path);
            }
            if let Some(path) = &registry_path {
                println!("📚 Loaded sources from: {}", path);
            }

            let source = build_source(&registry, &input, title, author, authority, chapter);
            let cache_dir = paths::resolve(cache_dir.as_deref(), paths::default_cache_dir);
            let processor = RuleProcessor::new_cli_with_cache(&cache_dir.to_string_lossy(), config)?;

            if dump_stages {
                println!("\n🔬 Pipeline stage dump mode");
                dump_pipeline_stages(&processor, &input, &source, &stages_dir)
            } else {
                run_extract(
                    &processor,
                    Path::new(&input),
                    &source,
                    ExtractOptions {
                        output,
                        profile,
                        skip_cache,
                        store: (!dry_run).then_some(store_path),
                    },
                )
            }
        }
        Command::Search {
            planet,
            house,
            sign,
            source,
            min_confidence,
            tag,
            limit,
            conflicts,
        } => {
            let query = RuleQuery {
                planet,
                house,
                sign,
                source,
                min_confidence,
                limit: None,
            };
            run_search(&store_path, &registry, &query, tag.as_deref(), limit, conflicts)
        }
        Command::Stats => run_stats(&store_path),
        Command::Export { output } => {
            let repo = JsonFileRepository::open(&store_path)?;
            let count = repo.export_json(Path::new(&output))?;
            println!("💾 Exported {} rules to: {}", count, output);
            Ok(())
        }
        Command::Clear => {
            let mut repo = JsonFileRepository::open(&store_path)?;
            let removed = repo.clear()?;
            println!("🧹 Removed {} rules from: {}", removed, store_path.display());
            Ok(())
        }
        Command::Normalize { text } => {
            let normalizer = OcrNormalizer::new()?;
            println!("{}", normalizer.normalize(&text));
            Ok(())
        }
        Command::ShowConfig => {
            print!("{}", config.to_yaml()?);
            Ok(())
        }
        Command::Sources => {
            print_sources(&registry);
            Ok(())
        }
    };

    if let Err(e) = outcome {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }
    Ok(())
}

struct ExtractOptions {
    output: Option<String>,
    profile: bool,
    skip_cache: bool,
    store: Option<PathBuf>,
}

/// Loads `path` with `load`, or falls back to `fallback()` with a warning.
/// The returned path is set only when the file was actually loaded.
fn load_or_default<T>(
    path: Option<&str>,
    what: &str,
    load: impl FnOnce(&str) -> Result<T>,
    fallback: impl FnOnce() -> T,
) -> (T, Option<String>) {
    let Some(path) = path else {
        return (fallback(), None);
    };
    match load(path) {
        Ok(loaded) => (loaded, Some(path.to_string())),
        Err(e) => {
            eprintln!("⚠️  Failed to load {} from {}, using defaults", what, path);
            tracing::warn!("{what} load failed: {e}");
            (fallback(), None)
        }
    }
}

fn build_source(
    registry: &SourceRegistry,
    input: &str,
    title: Option<String>,
    author: Option<String>,
    authority: Option<AuthorityLevel>,
    chapter: Option<String>,
) -> SourceInfo {
    let title = title.unwrap_or_else(|| {
        Path::new(input)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("untitled")
            .replace(['_', '-'], " ")
    });

    if registry.get(&title).is_some() {
        if !registry.validate(&title, author.as_deref()) {
            eprintln!("⚠️  Author does not match the registered author of '{}'", title);
        }
    } else if authority.is_none() {
        tracing::info!("'{}' is not a registered source, treating it as modern", title);
    }

    let mut source = registry.source_info(&title, author.as_deref(), authority);
    source.chapter = chapter;
    source
}

fn run_extract(
    processor: &RuleProcessor,
    input: &Path,
    source: &SourceInfo,
    options: ExtractOptions,
) -> Result<()> {
    if !input.exists() {
        return Err(anyhow!("Input text not found at: {}", input.display()));
    }

    let report = processor.process_file(input, source, options.profile, options.skip_cache)?;
    print_report(&report);

    if let Some(output) = &options.output {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(output, json)
            .map_err(|e| anyhow!("Failed to write report to {}: {}", output, e))?;
        println!("💾 Report saved to: {}", output);
    }

    if let Some(store_path) = &options.store {
        let mut repo = JsonFileRepository::open(store_path)?;
        let stored = repo.store_batch(&report.rules)?;
        println!("💾 Stored {} rules in: {}", stored, store_path.display());
    }

    Ok(())
}

fn print_report(report: &ExtractionReport) {
    println!("✅ Successfully processed: {}", report.source.title);
    println!("📊 Extraction metrics:");
    println!("   - Sentences: {}", report.total_sentences);
    println!("   - Astrological sentences: {}", report.astrological_sentences);
    println!("   - Rules: {}", report.rules.len());
    for (method, count) in report.method_counts() {
        println!("     · {}: {}", method, count);
    }
}

fn run_search(
    store_path: &Path,
    registry: &SourceRegistry,
    query: &RuleQuery,
    tag: Option<&str>,
    limit: usize,
    show_conflicts: bool,
) -> Result<()> {
    let repo = JsonFileRepository::open(store_path)?;

    let mut hits = repo.search(query)?;
    if let Some(tag) = tag {
        let tag = tag.to_lowercase();
        hits.retain(|rule| rule.has_tag(&tag));
    }
    hits.truncate(limit);

    if hits.is_empty() {
        println!("🔍 No matching rules");
        return Ok(());
    }

    println!("🔍 {} matching rules:", hits.len());
    for rule in &hits {
        print_rule(rule);
        if show_conflicts {
            for conflict in repo.conflicting_rules(rule)? {
                println!("      ⚔️  conflicts with {} ({})", conflict.id, conflict.source.title);
                if let Some(prevailing) = registry
                    .resolve_conflict(&[rule.source.title.as_str(), conflict.source.title.as_str()])
                {
                    println!("         prevailing source: {}", prevailing);
                }
            }
        }
    }
    Ok(())
}

fn print_rule(rule: &Rule) {
    let effects = rule
        .effects
        .iter()
        .map(|e| format!("{} [{}{}]", e.description, e.category, if e.positive { "+" } else { "-" }))
        .collect::<Vec<_>>()
        .join("; ");
    println!(
        "   [{:.2}] {} ({}): {}",
        rule.confidence_score, rule.id, rule.source.title, effects
    );
    println!("      \"{}\"", rule.original_text);
}

fn print_sources(registry: &SourceRegistry) {
    println!("📚 {} registered sources", registry.len());
    for level in [
        AuthorityLevel::Classical,
        AuthorityLevel::Traditional,
        AuthorityLevel::Modern,
        AuthorityLevel::Commentary,
    ] {
        let sources = registry.by_authority(level);
        if sources.is_empty() {
            continue;
        }
        println!("\n{:?} ({}):", level, sources.len());
        for source in sources {
            match &source.author {
                Some(author) => println!("   - {} by {}", source.title, author),
                None => println!("   - {}", source.title),
            }
        }
    }
}

fn run_stats(store_path: &Path) -> Result<()> {
    let repo = JsonFileRepository::open(store_path)?;
    let stats = repo.stats()?;

    println!("📊 Rule store: {}", store_path.display());
    println!("   {:.<35} {}", "Rules", stats.total_rules);
    println!("   {:.<35} {}", "Sources", stats.unique_sources);
    println!("   {:.<35} {:.3}", "Average confidence", stats.average_confidence);

    if !stats.planet_distribution.is_empty() {
        println!("\n🪐 By planet:");
        for (planet, count) in &stats.planet_distribution {
            println!("   {:.<35} {}", planet, count);
        }
    }
    if !stats.house_distribution.is_empty() {
        println!("\n🏠 By house:");
        for (house, count) in &stats.house_distribution {
            println!("   {:.<35} {}", format!("House {house}"), count);
        }
    }
    Ok(())
}

fn dump_pipeline_stages(
    processor: &RuleProcessor,
    input: &str,
    source: &SourceInfo,
    output_dir: &str,
) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .map_err(|e| anyhow!("Failed to read {}: {}", input, e))?;
    let stages = processor.capture_stages(&text, source)?;
    save_stages(&stages, output_dir)?;
    println!("\n✅ All stages dumped to: {}", output_dir);
    Ok(())
}

fn save_stages(stages: &PipelineStages, output_dir: &str) -> Result<()> {
    use std::fs;
    fs::create_dir_all(output_dir)?;

    // Stage 1: Cleaned text
    let cleaned_path = format!("{}/stage1_cleaned.txt", output_dir);
    fs::write(&cleaned_path, &stages.cleaned_text)?;
    println!("  💾 {}", cleaned_path);

    // Stage 2: Sentences
    let sentences_path = format!("{}/stage2_sentences.json", output_dir);
    fs::write(&sentences_path, serde_json::to_string_pretty(&stages.sentences)?)?;
    println!("  💾 {} ({} sentences)", sentences_path, stages.sentences.len());

    // Stage 3: Astrological sentences
    let astro_path = format!("{}/stage3_astrological.json", output_dir);
    fs::write(
        &astro_path,
        serde_json::to_string_pretty(&stages.astrological_sentences)?,
    )?;
    println!(
        "  💾 {} ({} sentences)",
        astro_path,
        stages.astrological_sentences.len()
    );

    // Stage 4: Rules
    let rules_path = format!("{}/stage4_rules.json", output_dir);
    fs::write(&rules_path, serde_json::to_string_pretty(&stages.rules)?)?;
    println!("  💾 {} ({} rules)", rules_path, stages.rules.len());

    // Summary file: quick reference for validation scripts
    let summary = serde_json::json!({
        "captured_at": chrono::Utc::now().to_rfc3339(),
        "stage_counts": {
            "cleaned_chars": stages.cleaned_text.chars().count(),
            "sentences": stages.sentences.len(),
            "astrological_sentences": stages.astrological_sentences.len(),
            "rules": stages.rules.len(),
        }
    });
    let summary_path = format!("{}/summary.json", output_dir);
    fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;
    println!("  💾 {}", summary_path);

    Ok(())
}
