/// Result types shared by workers and the aggregator.
///
/// A [`PartialResult`] is built privately by exactly one worker and handed off by value
/// once the worker's chunk is done. It is serializable because process-isolated workers
/// send it back over a pipe as JSON.
///
/// An [`AggregateResult`] is the run-wide mapping. It only grows by appending: merging a
/// partial result never replaces or deduplicates file lists, so the multiplicity of
/// `(keyword, file)` pairs is exactly what the workers reported.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::metrics::ScanStats;

/// One worker's keyword to files mapping for its chunk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialResult {
    /// Index of the worker that produced this result
    pub worker: usize,
    /// Matching files per keyword. Keywords are in the order this worker first
    /// matched them, files in chunk order.
    pub hits: Vec<(String, Vec<PathBuf>)>,
    /// Files in the chunk that could not be read
    #[serde(default)]
    pub unreadable: Vec<PathBuf>,
    #[serde(default)]
    pub stats: ScanStats,
}

impl PartialResult {
    pub fn new(worker: usize) -> Self {
        Self {
            worker,
            ..Default::default()
        }
    }

    /// Appends `path` to the list for `keyword`
    pub fn add_match(&mut self, keyword: &str, path: &Path) {
        match self.hits.iter_mut().find(|(k, _)| k == keyword) {
            Some((_, files)) => files.push(path.to_path_buf()),
            None => self
                .hits
                .push((keyword.to_string(), vec![path.to_path_buf()])),
        }
    }

    /// Files of this chunk that matched `keyword`
    pub fn get(&self, keyword: &str) -> Option<&[PathBuf]> {
        self.hits
            .iter()
            .find(|(k, _)| k == keyword)
            .map(|(_, files)| files.as_slice())
    }

    pub fn add_unreadable(&mut self, path: &Path) {
        self.unreadable.push(path.to_path_buf());
        self.stats.record_failure();
    }
}

/// The merged, run-wide keyword to files mapping
#[derive(Debug, Clone, Default)]
pub struct AggregateResult {
    hits: HashMap<String, Vec<PathBuf>>,
    /// Keywords in the order they were first seen
    order: Vec<String>,
    /// Unreadable files reported by all workers
    pub unreadable: Vec<PathBuf>,
    /// Number of partial results merged so far
    pub workers: usize,
    pub stats: ScanStats,
}

impl AggregateResult {
    /// Creates a new empty aggregate
    pub fn new() -> Self {
        Default::default()
    }

    /// Merges one partial result, appending its file lists
    pub fn merge(&mut self, partial: PartialResult) {
        for (keyword, files) in partial.hits {
            match self.hits.get_mut(&keyword) {
                Some(existing) => existing.extend(files),
                None => {
                    self.order.push(keyword.clone());
                    self.hits.insert(keyword, files);
                }
            }
        }
        self.unreadable.extend(partial.unreadable);
        self.stats.merge(&partial.stats);
        self.workers += 1;
    }

    /// Files that matched `keyword`, in arrival order
    pub fn get(&self, keyword: &str) -> Option<&[PathBuf]> {
        self.hits.get(keyword).map(Vec::as_slice)
    }

    /// Iterates keywords in first-seen order together with their files
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PathBuf])> {
        self.order
            .iter()
            .filter_map(|k| self.hits.get(k).map(|files| (k.as_str(), files.as_slice())))
    }

    /// Number of keywords with at least one match
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

}
