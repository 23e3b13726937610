use serde::{Deserialize, Serialize};
use tracing::info;

use crate::search::processor::{LARGE_FILE_THRESHOLD, SMALL_FILE_THRESHOLD};

/// Per-worker scan statistics.
///
/// A worker owns its own `ScanStats` and ships it inside its partial result, so the
/// counters need no synchronization even when workers live in separate processes.
/// The aggregator folds them together with [`ScanStats::merge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub files_scanned: u64,
    pub files_failed: u64,
    pub bytes_read: u64,
    pub small_files: u64,
    pub buffered_files: u64,
    pub mmap_files: u64,
}

impl ScanStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successfully read file and which read path it took
    pub fn record_file(&mut self, size: u64) {
        self.files_scanned += 1;
        self.bytes_read += size;
        if size < SMALL_FILE_THRESHOLD {
            self.small_files += 1;
        } else if size >= LARGE_FILE_THRESHOLD {
            self.mmap_files += 1;
        } else {
            self.buffered_files += 1;
        }
    }

    /// Records a file that could not be read
    pub fn record_failure(&mut self) {
        self.files_failed += 1;
    }

    pub fn merge(&mut self, other: &ScanStats) {
        self.files_scanned += other.files_scanned;
        self.files_failed += other.files_failed;
        self.bytes_read += other.bytes_read;
        self.small_files += other.small_files;
        self.buffered_files += other.buffered_files;
        self.mmap_files += other.mmap_files;
    }

    pub fn log_stats(&self) {
        info!(
            "Scan stats:\n\
             Files scanned: {}\n\
             Files failed: {}\n\
             Bytes read: {}\n\
             Files processed (small/buffered/mmap): {}/{}/{}",
            self.files_scanned,
            self.files_failed,
            self.bytes_read,
            self.small_files,
            self.buffered_files,
            self.mmap_files
        );
    }
}
