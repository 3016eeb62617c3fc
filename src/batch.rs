//! Line accumulation and flush timing.

use std::num::{NonZeroU64, NonZeroUsize};

/// Upper bound on lines reserved up front for a new batch.
const MAX_PREALLOC_LINES: usize = 4096;

/// Why a batch left the assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    /// The batch reached its configured size.
    Capacity,
    /// The global row limit was reached; reading stops.
    Limit,
    /// The input ended with a partial batch pending.
    EndOfInput,
}

/// Ordered lines flushed together. Owned by whoever receives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    lines: Vec<String>,
    reason: FlushReason,
}

impl Batch {
    pub fn reason(&self) -> FlushReason {
        self.reason
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Split into the backlog prefix and the chronologically last line.
    ///
    /// Returns `None` for an empty batch.
    pub fn split_last(mut self) -> Option<(Vec<String>, String)> {
        let last = self.lines.pop()?;
        Some((self.lines, last))
    }
}

/// Outcome of accumulating one line.
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    /// Keep reading.
    Continue,
    /// A full batch is ready; keep reading afterwards.
    Flush(Batch),
    /// The row limit was reached; dispatch this batch and stop reading.
    Stop(Batch),
}

/// Accumulates lines into batches of at most `batch_size`, honouring a
/// global row limit.
#[derive(Debug)]
pub struct BatchAssembler {
    current: Vec<String>,
    batch_size: NonZeroUsize,
    reserve: usize,
    limit: Option<NonZeroU64>,
    rows_read: u64,
}

impl BatchAssembler {
    pub fn new(batch_size: NonZeroUsize, limit: Option<NonZeroU64>) -> Self {
        let mut reserve = batch_size.get().min(MAX_PREALLOC_LINES);
        if let Some(limit) = limit {
            reserve = reserve.min(usize::try_from(limit.get()).unwrap_or(usize::MAX));
        }
        Self {
            current: Vec::with_capacity(reserve),
            batch_size,
            reserve,
            limit,
            rows_read: 0,
        }
    }

    /// Rows accepted so far across all batches.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    pub fn pending(&self) -> usize {
        self.current.len()
    }

    /// Append one line and decide whether a batch flushes.
    ///
    /// The limit is checked before capacity, so a limit landing on a batch
    /// boundary yields a single `Stop` and no trailing empty batch.
    pub fn accumulate(&mut self, line: String) -> Step {
        self.current.push(line);
        self.rows_read += 1;

        if self.limit.is_some_and(|limit| self.rows_read >= limit.get()) {
            return Step::Stop(self.take(FlushReason::Limit));
        }
        if self.current.len() >= self.batch_size.get() {
            return Step::Flush(self.take(FlushReason::Capacity));
        }
        Step::Continue
    }

    /// Hand over the residual partial batch once the input is exhausted.
    pub fn finish(mut self) -> Option<Batch> {
        if self.current.is_empty() {
            None
        } else {
            Some(self.take(FlushReason::EndOfInput))
        }
    }

    fn take(&mut self, reason: FlushReason) -> Batch {
        let lines = std::mem::replace(&mut self.current, Vec::with_capacity(self.reserve));
        Batch { lines, reason }
    }
}
