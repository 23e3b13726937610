use clap::{Parser, Subcommand};
use colored::Colorize;
use keyscout::{
    config::{EncodingMode, ScanConfig, StrategyChoice},
    filters::list_text_files,
    results::AggregateResult,
    search::{self, run_worker_process, WorkerCommand},
    SearchError,
};
use std::{num::NonZeroUsize, path::PathBuf, time::Instant};
use tracing::debug;
use tracing_subscriber::EnvFilter;

type Result<T> = std::result::Result<T, SearchError>;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
struct CliSearchConfig {
    /// Directory containing the text files to scan
    directory: PathBuf,

    /// Keywords to search for (case-insensitive)
    #[arg(required = true)]
    keywords: Vec<String>,

    /// Isolation boundary for workers (auto|process|thread)
    #[arg(long, default_value = "auto")]
    strategy: String,

    /// Number of cores to plan for (default: detected cores)
    #[arg(long)]
    cores: Option<NonZeroUsize>,

    /// How long to wait for all workers, e.g. 30s or 5m (0s waits forever)
    #[arg(long)]
    timeout: Option<String>,

    /// How to handle invalid UTF-8 sequences (failfast|lossy)
    #[arg(long, default_value = "failfast")]
    encoding: String,

    /// Patterns to ignore (glob format)
    #[arg(short, long)]
    ignore: Vec<String>,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the text files of a directory for keywords
    Search(Box<CliSearchConfig>),

    /// Run one worker: read a request on stdin, write its result to stdout
    #[command(hide = true)]
    Worker,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {}", "Error:".red(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Search(args) => {
            let config = build_config(*args)?;
            init_tracing(&config.log_level);
            debug!("Using config: {:?}", config);
            run_search(&config)
        }
        Commands::Worker => {
            init_tracing("warn");
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            run_worker_process(stdin.lock(), stdout.lock())
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // Logs go to stderr; stdout carries results and the worker protocol.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn build_config(args: CliSearchConfig) -> Result<ScanConfig> {
    let file_config = ScanConfig::load_from(args.config.as_deref())
        .map_err(|e| SearchError::config_error(e.to_string()))?;

    let mut cli_config = ScanConfig::new(args.directory, args.keywords);
    cli_config.strategy = args.strategy.parse::<StrategyChoice>()?;
    cli_config.encoding_mode = args.encoding.parse::<EncodingMode>()?;
    cli_config.cores = args.cores;
    cli_config.ignore_patterns = args.ignore;
    // This binary answers the `worker` subcommand itself
    cli_config.worker_command = Some(WorkerCommand::current_exe()?);
    if let Some(timeout) = args.timeout {
        cli_config.worker_timeout = timeout;
    }
    if let Some(level) = args.log_level {
        cli_config.log_level = level;
    }

    let config = file_config.merge_with_cli(cli_config);
    // Validate early so a bad timeout fails before any file is touched
    config.worker_timeout()?;
    Ok(config)
}

fn run_search(config: &ScanConfig) -> Result<()> {
    let files = list_text_files(
        &config.root_path,
        &config.file_extensions,
        &config.ignore_patterns,
    )?;
    if files.is_empty() {
        println!("{}", SearchError::no_text_files(&config.root_path));
        return Ok(());
    }

    let start = Instant::now();
    let plan = search::plan(config, files.len());
    println!(
        "Using {} approach with {} workers...",
        plan.strategy.to_string().cyan(),
        plan.worker_count.min(files.len())
    );

    let result = search::search_planned(config, &plan, files)?;
    print_results(&result);
    println!(
        "Execution time: {:.6} seconds",
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn print_results(result: &AggregateResult) {
    println!("Results:");
    for (keyword, files) in result.iter() {
        let files: Vec<String> = files.iter().map(|p| p.display().to_string()).collect();
        println!(
            "Keyword: '{}' found in files: [{}]",
            keyword,
            files.join(", ")
        );
    }

    if !result.unreadable.is_empty() {
        println!(
            "{} {} file(s) could not be read:",
            "Warning:".yellow(),
            result.unreadable.len()
        );
        for path in &result.unreadable {
            println!("  {}", path.display().to_string().red());
        }
    }

    println!(
        "Scanned {} files ({} bytes) with {} workers",
        result.stats.files_scanned, result.stats.bytes_read, result.workers
    );
}
