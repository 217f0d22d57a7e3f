//! PitchLens - multi-agent startup investment analysis
//!
//! A CLI that runs specialized LLM agents over startup documents, merges
//! their findings into a weighted investment score and keeps every
//! analysis in a local store.
//!
//! Exit codes:
//!   0 - Success (score at or above --fail-below, or no threshold set)
//!   1 - Runtime error (configuration, store, every agent failed, etc.)
//!   2 - Overall score below the --fail-below threshold

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use pitchlens::analysis::{summary_text, InvestmentAnalyst, RunOptions};
use pitchlens::cli::{AnalyzeArgs, Args, Command, OutputFormat};
use pitchlens::config::{Config, DEFAULT_CONFIG_FILE};
use pitchlens::error::{AnalysisError, RunError};
use pitchlens::extract::{load_documents, TextExtractor};
use pitchlens::models::{AgentFailure, AnalysisMode, AnalysisRecord, ExtractionStatus};
use pitchlens::report;
use pitchlens::scanner::{DocumentScanner, ScanConfig};
use pitchlens::store::ListFilter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // No logging needed to write the default config
    if let Command::InitConfig = args.command {
        return handle_init_config();
    }

    init_logging(&args);

    info!("PitchLens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Write a default .pitchlens.toml in the working directory.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize the model, web search, timeouts and storage.");
    Ok(())
}

/// Install the global subscriber. `RUST_LOG` overrides the flag-derived level.
fn init_logging(args: &Args) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(args.log_level()).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Dispatch a subcommand. Returns the process exit code.
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let analyst = InvestmentAnalyst::from_config(&config)?;

    match args.command {
        Command::Analyze(ref analyze) => handle_analyze(analyze, &analyst, &config, args.quiet).await,
        Command::List {
            ref company,
            min_score,
            limit,
        } => {
            let filter = ListFilter {
                company: company.clone(),
                min_score,
                limit,
            };
            handle_list(&analyst, &filter);
            Ok(0)
        }
        Command::Show { ref id, format } => {
            let record = analyst.get_analysis(id)?;
            let content = render(&record, format)?;
            println!("{}", content);
            Ok(0)
        }
        Command::Delete { ref id } => {
            analyst.delete_analysis(id)?;
            println!("🗑️  Deleted analysis {}", id);
            Ok(0)
        }
        Command::Stats => {
            handle_stats(&analyst)?;
            Ok(0)
        }
        Command::Reindex => {
            let outcome = analyst.store().reindex()?;
            println!("🔁 Reindexed {} analysis record(s)", outcome.total);
            println!("   Adopted: {} | Dropped: {}", outcome.adopted, outcome.dropped);
            if outcome.skipped > 0 {
                println!("   Unreadable files skipped: {}", outcome.skipped);
            }
            Ok(0)
        }
        Command::InitConfig => {
            handle_init_config()?;
            Ok(0)
        }
    }
}

/// Run an analysis end to end. Returns 0 or 2.
async fn handle_analyze(
    analyze: &AnalyzeArgs,
    analyst: &InvestmentAnalyst,
    config: &Config,
    quiet: bool,
) -> Result<i32> {
    let start_time = Instant::now();
    let mode = AnalysisMode::from(analyze.mode);

    println!("🔍 Scanning documents...");
    let files = DocumentScanner::new(ScanConfig::default()).scan(&analyze.paths)?;
    if files.is_empty() {
        anyhow::bail!("No documents found in the given paths");
    }

    let documents = load_documents(Arc::new(TextExtractor), &files).await;
    for doc in &documents {
        match doc.extraction_status {
            ExtractionStatus::Extracted => println!("   📄 {} ({:?})", doc.filename, doc.role),
            ExtractionStatus::Empty => println!("   ⚪ {} (no text)", doc.filename),
            ExtractionStatus::Failed(ref reason) => println!("   ❌ {}: {}", doc.filename, reason),
        }
    }

    let agent_kinds = mode.agent_kinds();
    println!("\n🤖 Running {} analysis...", mode);
    println!("   Model: {}", config.model.name);
    println!("   Ollama: {}", config.model.ollama_url);
    println!(
        "   Web search: {}",
        if config.search.enabled { "enabled" } else { "disabled" }
    );
    println!(
        "   Agents: {}",
        agent_kinds
            .iter()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!(
        "   Timeout: {}s per agent\n",
        config.orchestrator.task_timeout_seconds
    );

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\n⛔ Interrupted, cancelling agents...");
                cancel.cancel();
            }
        })
    };

    let spinner = (!quiet).then(|| {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("Waiting for {} agent(s)...", agent_kinds.len()));
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    });

    let options = RunOptions {
        company_name: analyze.company.clone(),
        save: !analyze.no_save,
    };
    let outcome = analyst
        .run_analysis(documents, mode, &options, &cancel)
        .await;

    interrupt.abort();
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let record = match outcome {
        Ok(record) => record,
        Err(AnalysisError::Run(RunError::RunFailed { failures, .. })) => {
            eprintln!("\n❌ Every agent failed:");
            print_failures(&failures);
            anyhow::bail!("No score could be computed");
        }
        Err(e) => return Err(e.into()),
    };

    println!("\n📝 Generating report...");
    let output_path = output_path(analyze, config);
    let content = render(&record, analyze.format)?;
    report::write_report(&content, &output_path)?;

    print_summary(&record);
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    if options.save {
        println!("   Stored as: {}", record.analysis_id);
    }
    println!(
        "\n✅ Analysis complete! Report saved to: {}",
        output_path.display()
    );

    if let Some(threshold) = analyze.fail_below {
        if !is_scored(&record) {
            warn!("--fail-below ignored: {} mode produces no score", record.mode);
        } else if record.score_report.overall_score < threshold {
            eprintln!(
                "\n⛔ Score {} is below {}. Failing (exit code 2).",
                record.score_report.overall_score, threshold
            );
            return Ok(2);
        }
    }

    Ok(0)
}

fn is_scored(record: &AnalysisRecord) -> bool {
    record
        .score_report
        .category_breakdown
        .values()
        .any(|c| c.contributors > 0)
}

fn print_summary(record: &AnalysisRecord) {
    println!("\n📊 Analysis Summary: {}", record.company_name);
    if is_scored(record) {
        println!("   {}", summary_text(&record.score_report));
    } else {
        println!("   Not scored ({} mode)", record.mode);
    }
    println!("   Questions: {}", record.questions.len());

    if !record.failures.is_empty() {
        println!("   ⚠️  {} agent(s) failed:", record.failures.len());
        print_failures(&record.failures);
    }
}

fn print_failures(failures: &[AgentFailure]) {
    for failure in failures {
        eprintln!(
            "     - {} [{}] after {} attempt(s): {}",
            failure.agent_kind, failure.kind, failure.attempts, failure.message
        );
    }
}

fn render(record: &AnalysisRecord, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => report::generate_json_report(record),
        OutputFormat::Markdown => Ok(report::generate_markdown_report(record)),
    }
}

/// `--output`, else the configured path with an extension matching the format.
fn output_path(analyze: &AnalyzeArgs, config: &Config) -> PathBuf {
    match analyze.output {
        Some(ref path) => path.clone(),
        None => {
            let path = PathBuf::from(&config.general.output);
            match analyze.format {
                OutputFormat::Json => path.with_extension("json"),
                OutputFormat::Markdown => path,
            }
        }
    }
}

fn handle_list(analyst: &InvestmentAnalyst, filter: &ListFilter) {
    let entries = analyst.list_analyses(filter);

    if entries.is_empty() {
        println!("No stored analyses.");
        return;
    }

    println!(
        "{:<48} {:<24} {:>5}  {:<20} {}",
        "ID", "COMPANY", "SCORE", "GRADE", "DATE"
    );
    for entry in &entries {
        println!(
            "{:<48} {:<24} {:>5}  {} {:<17} {}",
            entry.analysis_id,
            entry.company_name,
            entry.overall_score,
            entry.grade.emoji(),
            entry.grade.label(),
            entry.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    println!("\n{} analysis(es)", entries.len());
}

fn handle_stats(analyst: &InvestmentAnalyst) -> Result<()> {
    let stats = analyst.store_stats()?;

    println!("📦 Analysis store: {}", stats.path.display());
    println!("   Analyses: {}", stats.count);
    println!("   Companies: {}", stats.companies);
    println!("   Size: {:.1} KB", stats.total_size as f64 / 1024.0);
    if let (Some(oldest), Some(newest)) = (stats.oldest, stats.newest) {
        println!("   Oldest: {}", oldest.format("%Y-%m-%d %H:%M:%S UTC"));
        println!("   Newest: {}", newest.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
