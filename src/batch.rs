use serde::Serialize;
use std::slice::Chunks;

/// Number of rows submitted in one insert request.
pub const CHUNK_SIZE: usize = 1000;

/// Number of batches needed for `rows` rows: `ceil(rows / CHUNK_SIZE)`.
pub fn batch_count(rows: usize) -> usize {
    rows.div_ceil(CHUNK_SIZE)
}

/// Contiguous, ordered, non-overlapping batches of at most [`CHUNK_SIZE`] rows.
pub fn batches<T>(rows: &[T]) -> Chunks<'_, T> {
    rows.chunks(CHUNK_SIZE)
}

/// Batches committed so far out of the batches of the current upload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

impl Progress {
    pub fn new(current: usize, total: usize) -> Self {
        Progress { current, total }
    }

    /// `round(current / total * 100)`, or 0 before the total is known.
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.current as f64 / self.total as f64) * 100.0).round() as u32
    }

    pub fn label(&self) -> String {
        format!(
            "Enviando lote {} de {}... ({}%)",
            self.current,
            self.total,
            self.percent()
        )
    }
}
