use crossbeam_channel::unbounded;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::aggregator::Aggregator;
use super::executor::{ProcessExecutor, ScanJob, ThreadExecutor, WorkerCommand, WorkerExecutor};
use super::matcher::KeywordMatcher;
use super::partition::partition;
use super::processor::FileProcessor;
use super::strategy::{select_with, ExecutionStrategy, StrategyPlan};
use crate::config::{ScanConfig, StrategyChoice};
use crate::errors::{SearchError, SearchResult};
use crate::filters::list_text_files;
use crate::results::AggregateResult;

/// The program that runs process-isolated workers: the configured one, else the
/// bundled worker binary
pub fn worker_command(config: &ScanConfig) -> Option<WorkerCommand> {
    config.worker_command.clone().or_else(WorkerCommand::bundled)
}

/// Chooses the strategy and worker count for scanning `file_count` files
pub fn plan(config: &ScanConfig, file_count: usize) -> StrategyPlan {
    plan_for(config, file_count, worker_command(config).is_some())
}

/// `Auto` only picks process isolation when a worker program exists
fn plan_for(config: &ScanConfig, file_count: usize, has_worker: bool) -> StrategyPlan {
    let plan = select_with(config.strategy, file_count, config.available_cores());
    if plan.strategy == ExecutionStrategy::ProcessIsolated
        && config.strategy == StrategyChoice::Auto
        && !has_worker
    {
        warn!("No worker program found, running workers as threads");
        return StrategyPlan {
            strategy: ExecutionStrategy::ThreadShared,
            ..plan
        };
    }
    plan
}

/// Builds the executor for a plan
pub fn executor_for(
    config: &ScanConfig,
    plan: &StrategyPlan,
) -> SearchResult<Box<dyn WorkerExecutor>> {
    let executor: Box<dyn WorkerExecutor> = match plan.strategy {
        ExecutionStrategy::ProcessIsolated => {
            Box::new(ProcessExecutor::new(process_command(worker_command(config))?))
        }
        ExecutionStrategy::ThreadShared => Box::new(ThreadExecutor::new(plan.worker_count)?),
    };
    Ok(executor)
}

fn process_command(command: Option<WorkerCommand>) -> SearchResult<WorkerCommand> {
    command.ok_or_else(|| {
        SearchError::config_error(
            "The process strategy needs a worker program: set worker_command or install keyscout-worker",
        )
    })
}

/// Scans `files` for the configured keywords using a precomputed plan
pub fn search_planned(
    config: &ScanConfig,
    plan: &StrategyPlan,
    files: Vec<PathBuf>,
) -> SearchResult<AggregateResult> {
    let timeout = config.worker_timeout()?;
    let mut executor = executor_for(config, plan)?;
    search_with(executor.as_mut(), plan.worker_count, config, files, timeout)
}

/// Scans `files` for the configured keywords, selecting the strategy from the
/// available cores
pub fn search(config: &ScanConfig, files: Vec<PathBuf>) -> SearchResult<AggregateResult> {
    let plan = plan(config, files.len());
    search_planned(config, &plan, files)
}

/// Discovers the text files under `config.root_path` and scans them.
///
/// A missing directory is `DirectoryNotFound` and an empty file set is
/// `NoTextFiles`; in both cases no worker is started.
pub fn scan(config: &ScanConfig) -> SearchResult<AggregateResult> {
    let files = list_text_files(
        &config.root_path,
        &config.file_extensions,
        &config.ignore_patterns,
    )?;
    if files.is_empty() {
        return Err(SearchError::no_text_files(&config.root_path));
    }
    search(config, files)
}

/// Runs the partition, worker and aggregation pipeline on a given executor
pub fn search_with(
    executor: &mut dyn WorkerExecutor,
    worker_count: usize,
    config: &ScanConfig,
    files: Vec<PathBuf>,
    timeout: Option<Duration>,
) -> SearchResult<AggregateResult> {
    info!("Starting search with keywords: {:?}", config.keywords);

    let matcher = KeywordMatcher::new(config.keywords.iter().cloned());
    if matcher.is_empty() {
        debug!("No keywords provided, returning empty result");
        return Ok(AggregateResult::new());
    }

    let chunks = partition(files.len(), worker_count);
    if chunks.is_empty() {
        debug!("No files to scan, returning empty result");
        return Ok(AggregateResult::new());
    }

    info!(
        "Using {} strategy with {} workers for {} files",
        executor.strategy(),
        chunks.len(),
        files.len()
    );

    let job = ScanJob::new(files, FileProcessor::new(matcher, config.encoding_mode));
    let (tx, rx) = unbounded();

    for chunk in &chunks {
        debug!("Worker {} gets files {:?}", chunk.index, chunk.range());
        if let Err(e) = executor.spawn(*chunk, &job, tx.clone()) {
            executor.abort();
            return Err(e);
        }
    }
    // Only workers hold senders now, so a lost worker shows up as a disconnect.
    drop(tx);

    let result = Aggregator::new(rx, timeout).collect(chunks.len());
    let result = match result {
        Ok(result) => result,
        Err(e) => {
            executor.abort();
            return Err(e);
        }
    };

    result.stats.log_stats();
    info!(
        "Search complete. {} keywords matched across {} workers",
        result.len(),
        result.workers
    );

    Ok(result)
}
