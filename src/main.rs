mod error;
mod fetcher;
mod input;
mod lexicon;
mod metrics;
mod pipeline;
mod report;
mod settings;
mod text;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use fetcher::{FileSource, HttpFetcher, PageSource};
use input::UrlRecord;
use pipeline::{AnalysisResult, Analyzer};
use report::ReportFormat;
use settings::Settings;

#[derive(Parser)]
#[command(
    name = "page_sentiment",
    about = "Keyword sentiment and readability scores for a list of web pages"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct LexiconArgs {
    /// Positive keywords, one per line
    #[arg(long)]
    positive: Option<PathBuf>,
    /// Negative keywords, one per line
    #[arg(long)]
    negative: Option<PathBuf>,
    /// Replace the built-in English stopword list
    #[arg(long)]
    stopwords: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
struct OutputArgs {
    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Report format (default: table on stdout, from the extension for files)
    #[arg(short, long, value_enum)]
    format: Option<ReportFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and score every URL in the sheet
    Run {
        /// Sheet with URL_ID and URL columns (.xlsx, .xls, .ods, .csv)
        #[arg(long)]
        urls: Option<PathBuf>,
        #[command(flatten)]
        lexicons: LexiconArgs,
        #[command(flatten)]
        output: OutputArgs,
        /// Pages fetched at once (default 1: strictly sequential)
        #[arg(short, long)]
        jobs: Option<usize>,
        /// Only the first N rows of the sheet
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Fetch and score a single URL
    Analyze {
        url: String,
        #[command(flatten)]
        lexicons: LexiconArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Score a local HTML file
    Score {
        file: PathBuf,
        #[command(flatten)]
        lexicons: LexiconArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Load the keyword lists and the sheet without fetching anything
    Check {
        #[arg(long)]
        urls: Option<PathBuf>,
        #[command(flatten)]
        lexicons: LexiconArgs,
    },
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load().context("Failed to load configuration")?;
    info!(settings = ?settings, "Starting page_sentiment");

    match cli.command {
        Commands::Run {
            urls,
            lexicons,
            output,
            jobs,
            limit,
        } => {
            apply_lexicon_args(&mut settings, lexicons);
            if let Some(urls) = urls {
                settings.urls_path = urls;
            }
            if let Some(jobs) = jobs {
                settings.jobs = jobs.max(1);
            }

            let (analyzer, mut records) = pipeline::load(&settings).inspect_err(|e| {
                error!("Aborting before any fetch: {}", e);
            })?;
            if let Some(n) = limit {
                records.truncate(n);
            }

            let fetcher = HttpFetcher::new(settings.user_agent.as_deref())?;
            let summary = pipeline::run(&analyzer, &fetcher, &records, settings.jobs);
            emit(&summary.results, &output, &settings)?;
            eprintln!(
                "{} urls: {} scored, {} skipped",
                summary.total,
                summary.results.len(),
                summary.skipped
            );
        }
        Commands::Analyze {
            url,
            lexicons,
            output,
        } => {
            apply_lexicon_args(&mut settings, lexicons);
            let analyzer = Analyzer::load(&settings)?;
            let fetcher = HttpFetcher::new(settings.user_agent.as_deref())?;
            let result = score_one(&analyzer, &fetcher, url)?;
            emit(&[result], &output, &settings)?;
        }
        Commands::Score {
            file,
            lexicons,
            output,
        } => {
            apply_lexicon_args(&mut settings, lexicons);
            let analyzer = Analyzer::load(&settings)?;
            let result = score_one(&analyzer, &FileSource, file.display().to_string())?;
            emit(&[result], &output, &settings)?;
        }
        Commands::Check { urls, lexicons } => {
            apply_lexicon_args(&mut settings, lexicons);
            if let Some(urls) = urls {
                settings.urls_path = urls;
            }
            let (_, records) = pipeline::load(&settings)?;
            println!(
                "OK: {} urls in {}",
                records.len(),
                settings.urls_path.display()
            );
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("Done in {}", format_duration(elapsed));
    }
    Ok(())
}

fn apply_lexicon_args(settings: &mut Settings, args: LexiconArgs) {
    if let Some(p) = args.positive {
        settings.positive_path = p;
    }
    if let Some(p) = args.negative {
        settings.negative_path = p;
    }
    if args.stopwords.is_some() {
        settings.stopwords_path = args.stopwords;
    }
}

/// A single target has no row to skip to, so a failed fetch is an error here.
fn score_one(analyzer: &Analyzer, source: &dyn PageSource, url: String) -> Result<AnalysisResult> {
    let record = UrlRecord {
        id: "1".to_string(),
        url,
    };
    analyzer
        .analyze(source, &record)
        .with_context(|| format!("Failed to fetch {}", record.url))
}

fn emit(results: &[AnalysisResult], args: &OutputArgs, settings: &Settings) -> Result<()> {
    match args.output.as_ref().or(settings.output_path.as_ref()) {
        Some(path) => {
            let format = args.format.unwrap_or_else(|| ReportFormat::for_path(path));
            let file = File::create(path)
                .with_context(|| format!("Failed to create report {}", path.display()))?;
            let mut out = BufWriter::new(file);
            report::write_report(results, format, &mut out)?;
            out.flush()?;
            info!("Wrote {} rows to {}", results.len(), path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            report::write_report(results, args.format.unwrap_or(ReportFormat::Table), &mut out)?;
        }
    }
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
