use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::PathBuf;
use tracing::{debug, warn};

use super::matcher::KeywordMatcher;
use super::processor::FileProcessor;
use crate::config::EncodingMode;
use crate::errors::SearchResult;
use crate::results::PartialResult;

/// What a worker reports to the aggregator
#[derive(Debug)]
pub enum WorkerMessage {
    Completed(PartialResult),
    Failed { worker: usize, reason: String },
}

/// Scans every file of one chunk and builds the worker's private partial result.
///
/// Unreadable files are logged and recorded, then skipped; they never abort the chunk.
pub fn run_chunk(worker: usize, files: &[PathBuf], processor: &FileProcessor) -> PartialResult {
    debug!("Worker {} scanning {} files", worker, files.len());
    let mut result = PartialResult::new(worker);

    for path in files {
        match processor.process_file(path, &mut result.stats) {
            Ok(found) => {
                for keyword in found {
                    result.add_match(keyword, path);
                }
            }
            Err(e) => {
                warn!("Error reading file {}: {}", path.display(), e);
                result.add_unreadable(path);
            }
        }
    }

    result
}

/// Hands a worker's result to the aggregator exactly once.
///
/// Dropping the guard without calling [`CompletionGuard::complete`], for instance while
/// a worker thread unwinds from a panic, reports the worker as failed so the aggregator
/// does not wait for a result that will never come.
pub struct CompletionGuard {
    worker: usize,
    tx: Option<Sender<WorkerMessage>>,
}

impl CompletionGuard {
    pub fn new(worker: usize, tx: Sender<WorkerMessage>) -> Self {
        Self {
            worker,
            tx: Some(tx),
        }
    }

    pub fn complete(mut self, partial: PartialResult) {
        if let Some(tx) = self.tx.take() {
            // The aggregator may already have given up; nothing to report to then.
            let _ = tx.send(WorkerMessage::Completed(partial));
        }
    }

    pub fn fail(mut self, reason: impl Into<String>) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(WorkerMessage::Failed {
                worker: self.worker,
                reason: reason.into(),
            });
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(WorkerMessage::Failed {
                worker: self.worker,
                reason: "terminated before reporting a result".to_string(),
            });
        }
    }
}

/// The job a process-isolated worker reads from its stdin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRequest {
    pub worker: usize,
    pub files: Vec<PathBuf>,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub encoding_mode: EncodingMode,
}

impl WorkerRequest {
    pub fn run(&self) -> PartialResult {
        let processor = FileProcessor::new(
            KeywordMatcher::new(self.keywords.iter().cloned()),
            self.encoding_mode,
        );
        run_chunk(self.worker, &self.files, &processor)
    }
}

/// Entry point for a worker living in its own process.
///
/// Reads one JSON [`WorkerRequest`] from `input`, scans the chunk and writes one JSON
/// [`PartialResult`] to `output`. Host binaries call this from their worker mode.
pub fn run_worker_process<R: Read, W: Write>(input: R, mut output: W) -> SearchResult<()> {
    let request: WorkerRequest = serde_json::from_reader(input)?;
    let result = request.run();
    serde_json::to_writer(&mut output, &result)?;
    output.flush()?;
    Ok(())
}
