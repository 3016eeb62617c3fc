//! Micro-batch replay of a line-oriented L3 source into a book engine.

use std::num::{NonZeroU64, NonZeroUsize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use log::{debug, info};

use crate::batch::{Batch, BatchAssembler, Step};
use crate::dispatch::{BookEngine, EngineDispatcher};
use crate::error::Result;
use crate::event::Sequenced;
use crate::live::StreamSimulator;
use crate::parse::RowParser;
use crate::resequence::RequestResequencer;
use crate::source::LineSource;

/// Fixed at construction; there is no reconfiguration during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerConfig {
    pub input_path: PathBuf,
    pub batch_size: NonZeroUsize,
    /// Maximum number of data rows to read. `None` reads the whole input.
    pub limit: Option<NonZeroU64>,
}

impl ListenerConfig {
    /// One line per batch, no row limit.
    pub fn streaming(input_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            batch_size: NonZeroUsize::MIN,
            limit: None,
        }
    }

    pub fn micro_batch(
        input_path: impl Into<PathBuf>,
        batch_size: NonZeroUsize,
        limit: Option<NonZeroU64>,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            batch_size,
            limit,
        }
    }

    pub fn with_batch_size(mut self, batch_size: NonZeroUsize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_limit(mut self, limit: NonZeroU64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Statistics for one replay run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Data rows consumed, header excluded.
    pub rows_read: u64,
    pub batches: u64,
    /// Events delivered through the bulk path.
    pub bulk_events: u64,
    /// Events delivered through the sequence-checked single path.
    pub live_events: u64,
    /// True when the row limit cut the input short.
    pub limit_reached: bool,
    pub duration: Duration,
}

/// A source of market events that feeds a book engine.
pub trait SourceListener {
    type Event: Sequenced;

    /// Replay the whole source into `engine`, then drain its out-of-order
    /// buffer once.
    fn process<G: BookEngine<Self::Event>>(&self, engine: &mut G) -> Result<RunStats>;
}

/// Reads a headed text file in micro batches.
///
/// Each flushed batch is split: all lines but the last are parsed, sorted by
/// sequence number and submitted in bulk; the last line is submitted on its own
/// through the sequence-checked path.
#[derive(Debug)]
pub struct BufferedLineListener<P> {
    config: ListenerConfig,
    parser: P,
}

impl<P: RowParser> BufferedLineListener<P> {
    pub fn new(config: ListenerConfig, parser: P) -> Self {
        Self { config, parser }
    }

    pub fn streaming(input_path: impl AsRef<Path>, parser: P) -> Self {
        Self::new(ListenerConfig::streaming(input_path.as_ref()), parser)
    }

    fn dispatch_batch<G>(
        &self,
        index: u64,
        batch: Batch,
        dispatcher: &mut EngineDispatcher<'_, G>,
    ) -> anyhow::Result<()>
    where
        G: BookEngine<P::Event>,
    {
        let reason = batch.reason();
        let size = batch.len();
        let Some((backlog, last)) = batch.split_last() else {
            return Ok(());
        };

        let events = RequestResequencer::new(&self.parser).resequence(&backlog)?;
        let backlog_len = events.len();
        dispatcher.submit_bulk(events)?;

        let live_seq = StreamSimulator::new(&self.parser).deliver(&last, dispatcher)?;
        debug!(
            "batch {} flushed on {:?}: rows={} backlog={} live_seq={}",
            index, reason, size, backlog_len, live_seq
        );
        Ok(())
    }
}

impl<P: RowParser> SourceListener for BufferedLineListener<P> {
    type Event = P::Event;

    fn process<G: BookEngine<Self::Event>>(&self, engine: &mut G) -> Result<RunStats> {
        let start = Instant::now();
        info!(
            "replaying {} batch_size={} limit={}",
            self.config.input_path.display(),
            self.config.batch_size,
            self.config
                .limit
                .map_or_else(|| "none".to_string(), |limit| limit.to_string())
        );

        let source = LineSource::open(&self.config.input_path)?;
        let mut assembler = BatchAssembler::new(self.config.batch_size, self.config.limit);
        let mut dispatcher = EngineDispatcher::new(engine);
        let mut stats = RunStats::default();

        for line in source {
            let line = line?;
            log::trace!("row {}: {}", assembler.rows_read() + 1, line);
            match assembler.accumulate(line) {
                Step::Continue => {}
                Step::Flush(batch) => {
                    self.dispatch_batch(stats.batches, batch, &mut dispatcher)
                        .with_context(|| format!("batch {}", stats.batches))?;
                    stats.batches += 1;
                }
                Step::Stop(batch) => {
                    self.dispatch_batch(stats.batches, batch, &mut dispatcher)
                        .with_context(|| format!("batch {}", stats.batches))?;
                    stats.batches += 1;
                    stats.limit_reached = true;
                    break;
                }
            }
        }

        stats.rows_read = assembler.rows_read();
        if let Some(batch) = assembler.finish() {
            self.dispatch_batch(stats.batches, batch, &mut dispatcher)
                .with_context(|| format!("batch {}", stats.batches))?;
            stats.batches += 1;
        }

        stats.bulk_events = dispatcher.bulk_events();
        stats.live_events = dispatcher.live_events();
        dispatcher.drain::<P::Event>()?;

        stats.duration = start.elapsed();
        info!(
            "replay done: rows={} batches={} bulk_events={} live_events={} limit_reached={} \
             in {:?}",
            stats.rows_read,
            stats.batches,
            stats.bulk_events,
            stats.live_events,
            stats.limit_reached,
            stats.duration
        );
        Ok(stats)
    }
}
