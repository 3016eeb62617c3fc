//! Live-tick simulation for the last line of each flush.

use anyhow::Context;

use crate::dispatch::{BookEngine, EngineDispatcher};
use crate::event::Sequenced;
use crate::parse::RowParser;

/// Delivers the chronologically last line of a batch as a freshly arrived
/// event, through the engine's sequence-checked path.
#[derive(Debug)]
pub struct StreamSimulator<'p, P> {
    parser: &'p P,
}

impl<'p, P: RowParser> StreamSimulator<'p, P> {
    pub fn new(parser: &'p P) -> Self {
        Self { parser }
    }

    /// Parse `line` and submit it on its own. Returns the delivered sequence
    /// number.
    pub fn deliver<G>(
        &self,
        line: &str,
        dispatcher: &mut EngineDispatcher<'_, G>,
    ) -> anyhow::Result<u64>
    where
        G: BookEngine<P::Event>,
    {
        let event = self
            .parser
            .parse(line)
            .with_context(|| format!("parse live row `{line}`"))?;
        let seq = event.seq();
        log::trace!("live tick seq {seq}");
        dispatcher.submit_checked(event)?;
        Ok(seq)
    }
}
