//! Micro-batch ingestion and resequencing stage for L3 market-data replay.
//!
//! Lines from a headed text source are grouped into batches. Each flushed
//! batch is split into a backlog, sorted by sequence number and submitted to
//! the book engine in bulk, and a last line submitted on its own as a live
//! tick. The engine's out-of-order buffer is drained once at the end.

pub mod batch;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod listener;
pub mod live;
pub mod parse;
pub mod resequence;
pub mod source;

pub use batch::{Batch, BatchAssembler, FlushReason, Step};
pub use dispatch::{BookEngine, EngineDispatcher};
pub use error::{Error, Result};
pub use event::{L3Order, L3Request, L3RequestKind, L3Side, Sequenced};
pub use listener::{BufferedLineListener, ListenerConfig, RunStats, SourceListener};
pub use live::StreamSimulator;
pub use parse::{RowError, RowParser};
#[cfg(feature = "rows")]
pub use parse::CsvL3RowParser;
pub use resequence::RequestResequencer;
pub use source::LineSource;
