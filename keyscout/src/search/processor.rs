use memmap2::Mmap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{trace, warn};

use super::matcher::KeywordMatcher;
use crate::config::EncodingMode;
use crate::errors::{SearchError, SearchResult};
use crate::metrics::ScanStats;

// Constants for file processing
const BUFFER_CAPACITY: usize = 65536;
pub(crate) const SMALL_FILE_THRESHOLD: u64 = 32 * 1024; // 32KB
pub(crate) const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024; // 10MB

/// Decodes bytes into a String according to encoding mode
fn decode_bytes(bytes: &[u8], path: &Path, encoding_mode: EncodingMode) -> SearchResult<String> {
    match encoding_mode {
        EncodingMode::FailFast => std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|e| SearchError::encoding_error(path, e)),
        EncodingMode::Lossy => {
            let cow = String::from_utf8_lossy(bytes);
            // If it's Owned, at least one invalid sequence was replaced.
            if let std::borrow::Cow::Owned(_) = cow {
                warn!("Invalid UTF-8 replaced in file: {}", path.display());
            }
            Ok(cow.into_owned())
        }
    }
}

/// Reads files and runs the keyword matcher over their contents
#[derive(Debug, Clone)]
pub struct FileProcessor {
    matcher: KeywordMatcher,
    encoding_mode: EncodingMode,
}

impl FileProcessor {
    pub fn new(matcher: KeywordMatcher, encoding_mode: EncodingMode) -> Self {
        Self {
            matcher,
            encoding_mode,
        }
    }

    pub fn matcher(&self) -> &KeywordMatcher {
        &self.matcher
    }

    pub fn encoding_mode(&self) -> EncodingMode {
        self.encoding_mode
    }

    fn read_small_file(&self, path: &Path) -> SearchResult<Vec<u8>> {
        trace!("Using simple file reading for: {}", path.display());
        std::fs::read(path).map_err(|e| SearchError::from_io(path, e))
    }

    fn read_file_buffered(&self, file: File, path: &Path) -> SearchResult<Vec<u8>> {
        trace!("Using buffered file reading for: {}", path.display());
        let mut reader = BufReader::with_capacity(BUFFER_CAPACITY, file);
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| SearchError::from_io(path, e))?;
        Ok(bytes)
    }

    fn read_file_mmap(&self, file: &File, path: &Path) -> SearchResult<String> {
        trace!("Using memory mapping for: {}", path.display());
        // SAFETY: the map is read-only and dropped before this function returns.
        let mmap = unsafe { Mmap::map(file) }.map_err(|e| SearchError::from_io(path, e))?;
        decode_bytes(&mmap, path, self.encoding_mode)
    }

    /// Reads a file's text, choosing a read path by file size.
    /// Returns the decoded content and the file size.
    pub fn read_file(&self, path: &Path) -> SearchResult<(String, u64)> {
        let file = File::open(path).map_err(|e| SearchError::from_io(path, e))?;
        let size = file
            .metadata()
            .map_err(|e| SearchError::from_io(path, e))?
            .len();

        let content = if size < SMALL_FILE_THRESHOLD {
            drop(file);
            let bytes = self.read_small_file(path)?;
            decode_bytes(&bytes, path, self.encoding_mode)?
        } else if size >= LARGE_FILE_THRESHOLD {
            self.read_file_mmap(&file, path)?
        } else {
            let bytes = self.read_file_buffered(file, path)?;
            decode_bytes(&bytes, path, self.encoding_mode)?
        };
        Ok((content, size))
    }

    /// Reads `path` and returns the keywords it contains.
    ///
    /// Successful reads are recorded in `stats`. Read failures are returned to the
    /// caller, which decides how to recover.
    pub fn process_file(&self, path: &Path, stats: &mut ScanStats) -> SearchResult<Vec<&str>> {
        let (content, size) = self.read_file(path)?;
        stats.record_file(size);
        Ok(self.matcher.find_keywords(&content))
    }
}
