use std::ops::Range;

/// A contiguous slice of the file set, `[start, end)`, owned by one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Index of the worker that scans this chunk
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

impl Chunk {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The files covered by this chunk
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.range()]
    }
}

/// Splits `file_count` files into contiguous chunks, one per worker.
///
/// The worker count is clamped to `1..=file_count`, so no chunk is ever empty. Every
/// chunk but the last gets `file_count / workers` files and the last one absorbs the
/// remainder. Zero files produce zero chunks.
pub fn partition(file_count: usize, worker_count: usize) -> Vec<Chunk> {
    if file_count == 0 {
        return Vec::new();
    }

    let workers = worker_count.clamp(1, file_count);
    let base = file_count / workers;

    (0..workers)
        .map(|index| {
            let start = index * base;
            let end = if index == workers - 1 {
                file_count
            } else {
                start + base
            };
            Chunk { index, start, end }
        })
        .collect()
}
