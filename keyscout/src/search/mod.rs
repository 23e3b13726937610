/// This module implements the adaptive keyword scan.
///
/// # Pipeline
///
/// ```text
/// strategy::select -> partition::partition -> N workers -> aggregator::Aggregator
/// ```
///
/// 1. **Strategy selection**: the number of available cores picks the isolation
///    boundary. More than two cores runs workers as child processes, otherwise as
///    threads. Both use `cores - 2` workers, at least one.
/// 2. **Partitioning**: the ordered file set is cut into contiguous chunks, one per
///    worker, the last chunk taking the remainder.
/// 3. **Workers**: each worker scans only its own chunk and builds a private
///    [`PartialResult`](crate::results::PartialResult). Unreadable files are logged and
///    skipped.
/// 4. **Aggregation**: partial results arrive over one multi-producer channel and are
///    appended in arrival order until exactly one result per worker has been merged.
///    A failed, lost or unresponsive worker fails the whole run.
///
/// The strategy only changes where workers run; partitioning, scanning and merging are
/// the same code under both, behind the [`WorkerExecutor`] trait.
///
/// Process-isolated workers are separate programs speaking the JSON protocol of
/// [`run_worker_process`]. The library ships one as the `keyscout-worker` binary; a
/// host program can also serve as its own worker through `ScanConfig::worker_command`.
/// Under `auto`, a run with no worker program available falls back to threads.
///
/// ```rust,ignore
/// let config = ScanConfig::new("corpus", vec!["python".into(), "data".into()]);
/// let result = keyscout::search::scan(&config)?;
/// for (keyword, files) in result.iter() {
///     println!("{}: {:?}", keyword, files);
/// }
/// ```
pub mod aggregator;
pub mod engine;
pub mod executor;
pub mod matcher;
pub mod partition;
pub mod processor;
pub mod strategy;
pub mod worker;

pub use aggregator::Aggregator;
pub use engine::{plan, scan, search, search_planned, search_with, worker_command};
pub use executor::{
    ProcessExecutor, ScanJob, ThreadExecutor, WorkerCommand, WorkerExecutor, WORKER_BIN,
};
pub use matcher::KeywordMatcher;
pub use partition::{partition, Chunk};
pub use processor::FileProcessor;
pub use strategy::{select, ExecutionStrategy, StrategyPlan};
pub use worker::{run_worker_process, WorkerMessage};
