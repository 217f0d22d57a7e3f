//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::AnalysisMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// PitchLens - multi-agent startup investment analysis
///
/// Runs specialized analysis agents over pitch decks, data-room exports
/// and call transcripts, merges their findings into a weighted investment
/// score and compiles due-diligence questions for the founders.
///
/// Examples:
///   pitchlens analyze ./acme-dataroom
///   pitchlens analyze deck.md metrics.csv --mode scoring --format json
///   pitchlens list --company acme --min-score 60
///   pitchlens show acme_20240101_120000_1a2b3c4d
///   pitchlens init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    ///
    /// If not specified, looks for .pitchlens.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding stored analyses
    #[arg(long, value_name = "DIR", global = true, env = "PITCHLENS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Ollama model to use for analysis
    #[arg(short, long, global = true, env = "PITCHLENS_MODEL")]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, global = true, env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Per-agent task timeout in seconds, retries included
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Analyze startup documents and store the result
    Analyze(AnalyzeArgs),

    /// List stored analyses, newest first
    List {
        /// Case-insensitive company name filter
        #[arg(long)]
        company: Option<String>,

        /// Only analyses scoring at least this much
        #[arg(long, value_name = "SCORE")]
        min_score: Option<u8>,

        /// Maximum number of entries
        #[arg(long, value_name = "COUNT")]
        limit: Option<usize>,
    },

    /// Print a stored analysis
    Show {
        /// Analysis id
        id: String,

        /// Output format (markdown, json)
        #[arg(long, default_value = "markdown", value_name = "FORMAT")]
        format: OutputFormat,
    },

    /// Delete a stored analysis
    Delete {
        /// Analysis id
        id: String,
    },

    /// Show storage statistics
    Stats,

    /// Rebuild the index from the record files on disk
    Reindex,

    /// Generate a default .pitchlens.toml configuration file
    InitConfig,
}

/// Arguments of `pitchlens analyze`.
#[derive(clap::Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Document files or directories to analyze
    #[arg(required = true, value_name = "PATHS")]
    pub paths: Vec<PathBuf>,

    /// Analysis mode; selects which agents run
    #[arg(long, default_value = "full", value_name = "MODE")]
    pub mode: ModeArg,

    /// Company name, overriding the one found in the documents
    #[arg(long)]
    pub company: Option<String>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Do not persist the analysis
    #[arg(long)]
    pub no_save: bool,

    /// Exit with code 2 when the overall score is below this value
    ///
    /// Useful for screening pipelines.
    #[arg(long, value_name = "SCORE")]
    pub fail_below: Option<u8>,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Analysis mode as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ModeArg {
    /// All agents
    #[default]
    Full,
    /// Pitch deck only
    Summary,
    /// Pitch deck and data room
    Scoring,
    /// Founder questions only
    Questions,
}

impl From<ModeArg> for AnalysisMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Full => AnalysisMode::Full,
            ModeArg::Summary => AnalysisMode::Summary,
            ModeArg::Scoring => AnalysisMode::Scoring,
            ModeArg::Questions => AnalysisMode::Questions,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref url) = self.ollama_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        match &self.command {
            Command::Analyze(analyze) => {
                for path in &analyze.paths {
                    if !path.exists() {
                        return Err(format!("Path does not exist: {}", path.display()));
                    }
                }
                if let Some(score) = analyze.fail_below {
                    if score > 100 {
                        return Err("--fail-below must be between 0 and 100".to_string());
                    }
                }
            }
            Command::List {
                min_score: Some(score),
                ..
            } if *score > 100 => {
                return Err("--min-score must be between 0 and 100".to_string());
            }
            Command::Show { id, .. } | Command::Delete { id } if id.trim().is_empty() => {
                return Err("Analysis id must not be empty".to_string());
            }
            _ => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze() {
        let args = Args::parse_from([
            "pitchlens",
            "analyze",
            "deck.md",
            "metrics.csv",
            "--mode",
            "scoring",
            "--fail-below",
            "60",
            "-v",
        ]);

        assert!(args.verbose);
        match args.command {
            Command::Analyze(a) => {
                assert_eq!(a.paths.len(), 2);
                assert_eq!(AnalysisMode::from(a.mode), AnalysisMode::Scoring);
                assert_eq!(a.fail_below, Some(60));
                assert_eq!(a.format, OutputFormat::Markdown);
                assert!(!a.no_save);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_list_filters() {
        let args = Args::parse_from(["pitchlens", "list", "--company", "acme", "--limit", "3"]);
        match args.command {
            Command::List {
                company,
                min_score,
                limit,
            } => {
                assert_eq!(company.as_deref(), Some("acme"));
                assert_eq!(min_score, None);
                assert_eq!(limit, Some(3));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_validation_missing_path() {
        let args = Args::parse_from(["pitchlens", "analyze", "/definitely/not/here.md"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let args = Args::parse_from(["pitchlens", "stats", "--verbose", "--quiet"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_bad_ollama_url() {
        let args = Args::parse_from(["pitchlens", "--ollama-url", "localhost:11434", "stats"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = Args::parse_from(["pitchlens", "stats"]);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
