use std::fmt;
use tracing::debug;

use crate::config::StrategyChoice;

/// Cores held back from workers for the coordinator and the rest of the system
const RESERVED_CORES: usize = 2;

/// The isolation boundary workers run behind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// One child process per worker, results sent back over a pipe
    ProcessIsolated,
    /// One thread per worker inside this process, results sent over a channel
    ThreadShared,
}

impl fmt::Display for ExecutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStrategy::ProcessIsolated => write!(f, "process-isolated"),
            ExecutionStrategy::ThreadShared => write!(f, "thread-shared"),
        }
    }
}

/// Strategy and worker count for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyPlan {
    pub strategy: ExecutionStrategy,
    pub worker_count: usize,
}

/// Workers available once the reserved cores are taken out, never fewer than one
pub fn worker_count_for(available_cores: usize) -> usize {
    available_cores.saturating_sub(RESERVED_CORES).max(1)
}

/// Picks the isolation boundary from the number of available cores.
///
/// More than two cores selects process isolation; otherwise workers share this
/// process as threads. Either way the worker count is `available_cores - 2`, at
/// least one.
pub fn select(file_count: usize, available_cores: usize) -> StrategyPlan {
    let strategy = if available_cores > RESERVED_CORES {
        ExecutionStrategy::ProcessIsolated
    } else {
        ExecutionStrategy::ThreadShared
    };
    let plan = StrategyPlan {
        strategy,
        worker_count: worker_count_for(available_cores),
    };
    debug!(
        "Selected {} with {} workers for {} files on {} cores",
        plan.strategy, plan.worker_count, file_count, available_cores
    );
    plan
}

/// Like [`select`], but honours an explicit strategy choice.
/// A forced strategy keeps the core-derived worker count.
pub fn select_with(choice: StrategyChoice, file_count: usize, available_cores: usize) -> StrategyPlan {
    let plan = select(file_count, available_cores);
    match choice {
        StrategyChoice::Auto => plan,
        StrategyChoice::Process => StrategyPlan {
            strategy: ExecutionStrategy::ProcessIsolated,
            ..plan
        },
        StrategyChoice::Thread => StrategyPlan {
            strategy: ExecutionStrategy::ThreadShared,
            ..plan
        },
    }
}
