//! Local reordering of a flushed backlog by sequence number.

use anyhow::Context;

use crate::event::Sequenced;
use crate::parse::RowParser;

/// Parses backlog lines and restores their source order.
#[derive(Debug)]
pub struct RequestResequencer<'p, P> {
    parser: &'p P,
}

impl<'p, P: RowParser> RequestResequencer<'p, P> {
    pub fn new(parser: &'p P) -> Self {
        Self { parser }
    }

    /// Parse every line and sort ascending by sequence number.
    ///
    /// The sort is stable: events sharing a sequence number keep their
    /// relative order from the input.
    pub fn resequence(&self, backlog: &[String]) -> anyhow::Result<Vec<P::Event>> {
        let mut events = backlog
            .iter()
            .map(|line| {
                self.parser
                    .parse(line)
                    .with_context(|| format!("parse backlog row `{line}`"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        events.sort_by_key(|event| event.seq());
        Ok(events)
    }
}
