/// Worker execution contexts.
///
/// A [`WorkerExecutor`] decides where a worker runs; it has no say in what the worker
/// does. Both variants hand each worker one [`Chunk`] of the shared file set and a
/// [`Sender`] to the aggregator's channel, and both guarantee that every spawned worker
/// sends exactly one [`WorkerMessage`]: its partial result, or a failure.
///
/// - [`ThreadExecutor`] runs workers on a dedicated rayon pool inside this process.
///   The file set and keyword matcher are shared read-only through `Arc`s.
/// - [`ProcessExecutor`] runs each worker as a child process speaking the JSON protocol
///   of [`run_worker_process`](super::worker::run_worker_process). A monitor thread per
///   child turns the child's stdout and exit status into a message.
use crossbeam_channel::Sender;
use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, warn};

use super::partition::Chunk;
use super::processor::FileProcessor;
use super::strategy::ExecutionStrategy;
use super::worker::{run_chunk, CompletionGuard, WorkerMessage, WorkerRequest};
use crate::errors::{SearchError, SearchResult};
use crate::results::PartialResult;

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Name of the worker binary built alongside this library
pub const WORKER_BIN: &str = "keyscout-worker";

/// Read-only inputs shared by every worker of a run
#[derive(Debug, Clone)]
pub struct ScanJob {
    pub files: Arc<[PathBuf]>,
    pub processor: Arc<FileProcessor>,
}

impl ScanJob {
    pub fn new(files: Vec<PathBuf>, processor: FileProcessor) -> Self {
        Self {
            files: files.into(),
            processor: Arc::new(processor),
        }
    }
}

/// Runs workers behind one isolation boundary
pub trait WorkerExecutor {
    fn strategy(&self) -> ExecutionStrategy;

    /// Starts the worker for `chunk`. The worker must eventually send exactly one
    /// message on `tx`.
    fn spawn(&mut self, chunk: Chunk, job: &ScanJob, tx: Sender<WorkerMessage>)
        -> SearchResult<()>;

    /// Stops any workers still running. Called when the run has already failed.
    fn abort(&mut self) {}
}

/// Workers as threads on a dedicated pool
pub struct ThreadExecutor {
    pool: rayon::ThreadPool,
}

impl ThreadExecutor {
    pub fn new(threads: usize) -> SearchResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("keyscout-worker-{}", i))
            .panic_handler(|_| error!("Worker thread panicked"))
            .build()
            .map_err(|e| SearchError::IoError(std::io::Error::other(e)))?;
        Ok(Self { pool })
    }
}

impl WorkerExecutor for ThreadExecutor {
    fn strategy(&self) -> ExecutionStrategy {
        ExecutionStrategy::ThreadShared
    }

    fn spawn(
        &mut self,
        chunk: Chunk,
        job: &ScanJob,
        tx: Sender<WorkerMessage>,
    ) -> SearchResult<()> {
        let files = Arc::clone(&job.files);
        let processor = Arc::clone(&job.processor);
        debug!("Spawning worker thread {} for files {:?}", chunk.index, chunk.range());

        self.pool.spawn(move || {
            let guard = CompletionGuard::new(chunk.index, tx);
            let partial = run_chunk(chunk.index, chunk.slice(&files), &processor);
            guard.complete(partial);
        });
        Ok(())
    }
}

/// The program and arguments that start a worker process
#[derive(Debug, Clone)]
pub struct WorkerCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl WorkerCommand {
    pub fn new<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Re-runs the current executable with the `worker` subcommand. Only valid
    /// for binaries that dispatch `worker` to
    /// [`run_worker_process`](super::worker::run_worker_process).
    pub fn current_exe() -> SearchResult<Self> {
        Ok(Self::new(std::env::current_exe()?, ["worker"]))
    }

    /// Finds the [`WORKER_BIN`] binary next to the current executable, or one
    /// directory up when running from cargo's `deps/` directory
    pub fn bundled() -> Option<Self> {
        let exe = std::env::current_exe().ok()?;
        let name = format!("{}{}", WORKER_BIN, std::env::consts::EXE_SUFFIX);
        let dir = exe.parent()?;
        let found = [Some(dir), dir.parent()]
            .into_iter()
            .flatten()
            .map(|d| d.join(&name))
            .find(|p| p.is_file())
            .map(|program| Self::new(program, Vec::<OsString>::new()));
        found
    }
}

/// Workers as child processes
pub struct ProcessExecutor {
    command: WorkerCommand,
    children: Vec<Arc<Mutex<Child>>>,
}

impl ProcessExecutor {
    pub fn new(command: WorkerCommand) -> Self {
        Self {
            command,
            children: Vec::new(),
        }
    }
}

impl WorkerExecutor for ProcessExecutor {
    fn strategy(&self) -> ExecutionStrategy {
        ExecutionStrategy::ProcessIsolated
    }

    fn spawn(
        &mut self,
        chunk: Chunk,
        job: &ScanJob,
        tx: Sender<WorkerMessage>,
    ) -> SearchResult<()> {
        let worker = chunk.index;
        let request = WorkerRequest {
            worker,
            files: chunk.slice(&job.files).to_vec(),
            keywords: job.processor.matcher().keywords().map(String::from).collect(),
            encoding_mode: job.processor.encoding_mode(),
        };

        let mut child = Command::new(&self.command.program)
            .args(&self.command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                SearchError::worker_failed(
                    worker,
                    format!(
                        "failed to start {}: {}",
                        self.command.program.display(),
                        e
                    ),
                )
            })?;
        debug!(
            "Spawned worker process {} (pid {}) for files {:?}",
            worker,
            child.id(),
            chunk.range()
        );

        // The child reads its whole request before writing anything, so writing
        // here cannot deadlock against a full stdout pipe.
        let sent = match child.stdin.take() {
            Some(mut stdin) => serde_json::to_writer(&mut stdin, &request)
                .map_err(SearchError::from)
                .and_then(|_| stdin.flush().map_err(SearchError::from)),
            None => Err(SearchError::worker_failed(worker, "stdin was not captured")),
        };
        let stdout = child.stdout.take();
        let child = Arc::new(Mutex::new(child));
        self.children.push(Arc::clone(&child));

        if let Err(e) = sent {
            return Err(SearchError::worker_failed(
                worker,
                format!("failed to send request: {}", e),
            ));
        }
        let Some(stdout) = stdout else {
            return Err(SearchError::worker_failed(worker, "stdout was not captured"));
        };

        std::thread::Builder::new()
            .name(format!("keyscout-monitor-{}", worker))
            .spawn(move || {
                let guard = CompletionGuard::new(worker, tx);
                match collect_child_output(worker, stdout, &child) {
                    Ok(partial) => guard.complete(partial),
                    Err(reason) => guard.fail(reason),
                }
            })?;
        Ok(())
    }

    fn abort(&mut self) {
        for child in self.children.drain(..) {
            if let Ok(mut child) = child.lock() {
                if let Ok(None) = child.try_wait() {
                    warn!("Killing worker process {}", child.id());
                    let _ = child.kill();
                }
            }
        }
    }
}

/// Reads a worker's stdout to the end, waits for it to exit and decodes its result
fn collect_child_output(
    worker: usize,
    mut stdout: impl Read,
    child: &Mutex<Child>,
) -> Result<PartialResult, String> {
    let mut output = Vec::new();
    stdout
        .read_to_end(&mut output)
        .map_err(|e| format!("failed to read worker output: {}", e))?;

    // Poll rather than block in wait() so abort() can still take the lock and kill.
    let status = loop {
        let polled = child
            .lock()
            .map_err(|_| "worker handle poisoned".to_string())?
            .try_wait()
            .map_err(|e| format!("failed to wait for worker: {}", e))?;
        match polled {
            Some(status) => break status,
            None => std::thread::sleep(EXIT_POLL_INTERVAL),
        }
    };

    if !status.success() {
        return Err(format!("worker process exited with {}", status));
    }
    let partial: PartialResult = serde_json::from_slice(&output)
        .map_err(|e| format!("malformed worker output: {}", e))?;
    if partial.worker != worker {
        return Err(format!(
            "worker process answered as worker {}",
            partial.worker
        ));
    }
    Ok(partial)
}
