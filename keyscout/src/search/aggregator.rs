use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};
use tracing::{debug, error};

use super::worker::WorkerMessage;
use crate::errors::{SearchError, SearchResult};
use crate::results::AggregateResult;

/// Drains partial results from the workers' shared channel
pub struct Aggregator {
    rx: Receiver<WorkerMessage>,
    timeout: Option<Duration>,
}

impl Aggregator {
    /// `timeout` bounds the whole collection; `None` waits without limit
    pub fn new(rx: Receiver<WorkerMessage>, timeout: Option<Duration>) -> Self {
        Self { rx, timeout }
    }

    /// Blocks until exactly `expected` partial results have arrived and merges them in
    /// arrival order.
    ///
    /// Fails with `WorkerFailed` as soon as any worker reports a failure, with
    /// `WorkersLost` when every sender is gone before `expected` results arrived, and
    /// with `WorkerTimeout` when the deadline passes first. A partial aggregate is never returned.
    pub fn collect(&self, expected: usize) -> SearchResult<AggregateResult> {
        let mut result = AggregateResult::new();
        let deadline = self.timeout.map(|t| Instant::now() + t);

        while result.workers < expected {
            let message = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    match self.rx.recv_timeout(remaining) {
                        Ok(message) => message,
                        Err(RecvTimeoutError::Timeout) => {
                            error!(
                                "Timed out with {} of {} worker results",
                                result.workers, expected
                            );
                            return Err(SearchError::WorkerTimeout {
                                expected,
                                received: result.workers,
                            });
                        }
                        Err(RecvTimeoutError::Disconnected) => {
                            return Err(lost_workers(result.workers, expected))
                        }
                    }
                }
                None => self
                    .rx
                    .recv()
                    .map_err(|_| lost_workers(result.workers, expected))?,
            };

            match message {
                WorkerMessage::Completed(partial) => {
                    debug!(
                        "Received result from worker {} ({} keywords)",
                        partial.worker,
                        partial.hits.len()
                    );
                    result.merge(partial);
                }
                WorkerMessage::Failed { worker, reason } => {
                    error!("Worker {} failed: {}", worker, reason);
                    return Err(SearchError::worker_failed(worker, reason));
                }
            }
        }

        Ok(result)
    }
}

fn lost_workers(received: usize, expected: usize) -> SearchError {
    error!(
        "Result channel closed with {} of {} worker results",
        received, expected
    );
    SearchError::WorkersLost { expected, received }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::PartialResult;
    use std::path::{Path, PathBuf};

    fn partial(worker: usize, keyword: &str, file: &str) -> WorkerMessage {
        let mut result = PartialResult::new(worker);
        result.add_match(keyword, Path::new(file));
        WorkerMessage::Completed(result)
    }

    #[test]
    fn test_collects_exactly_expected() {
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send(partial(1, "data", "b.txt")).unwrap();
        tx.send(partial(0, "data", "a.txt")).unwrap();
        // A stray extra message must not be consumed
        tx.send(partial(2, "data", "c.txt")).unwrap();

        let aggregate = Aggregator::new(rx.clone(), None).collect(2).unwrap();
        assert_eq!(
            aggregate.get("data").unwrap(),
            &[PathBuf::from("b.txt"), PathBuf::from("a.txt")]
        );
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn test_zero_expected_returns_immediately() {
        let (_tx, rx) = crossbeam_channel::unbounded::<WorkerMessage>();
        let aggregate = Aggregator::new(rx, None).collect(0).unwrap();
        assert!(aggregate.is_empty());
        assert_eq!(aggregate.workers, 0);
    }

    #[test]
    fn test_failure_message_is_fatal() {
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send(partial(0, "data", "a.txt")).unwrap();
        tx.send(WorkerMessage::Failed {
            worker: 1,
            reason: "exit status 1".to_string(),
        })
        .unwrap();

        let err = Aggregator::new(rx, None).collect(2).unwrap_err();
        assert!(matches!(err, SearchError::WorkerFailed { worker: 1, .. }));
    }

    #[test]
    fn test_disconnect_before_expected_is_fatal() {
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send(partial(0, "data", "a.txt")).unwrap();
        drop(tx);

        let err = Aggregator::new(rx, None).collect(3).unwrap_err();
        assert!(matches!(
            err,
            SearchError::WorkersLost {
                expected: 3,
                received: 1
            }
        ));
    }

    #[test]
    fn test_timeout_when_worker_hangs() {
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send(partial(0, "data", "a.txt")).unwrap();

        let err = Aggregator::new(rx, Some(Duration::from_millis(50)))
            .collect(2)
            .unwrap_err();
        assert!(matches!(
            err,
            SearchError::WorkerTimeout {
                expected: 2,
                received: 1
            }
        ));
        drop(tx);
    }

    #[test]
    fn test_concurrent_producers() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let tx = tx.clone();
                std::thread::spawn(move || {
                    tx.send(partial(worker, "k", &format!("{}.txt", worker)))
                        .unwrap();
                })
            })
            .collect();
        drop(tx);

        let aggregate = Aggregator::new(rx, Some(Duration::from_secs(10)))
            .collect(8)
            .unwrap();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut files: Vec<_> = aggregate.get("k").unwrap().to_vec();
        files.sort();
        let mut expected: Vec<_> = (0..8).map(|w| PathBuf::from(format!("{}.txt", w))).collect();
        expected.sort();
        assert_eq!(files, expected);
    }
}
