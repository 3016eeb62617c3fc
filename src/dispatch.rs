//! Seam to the downstream book engine.

use anyhow::Context;

use crate::event::Sequenced;

/// Operations the replay stage consumes from a book engine.
///
/// Calls are issued one at a time from a single thread; an implementation may
/// assume serialized, non-reentrant access.
pub trait BookEngine<E: Sequenced> {
    /// Process `events` strictly in the given order.
    fn submit_bulk(&mut self, events: Vec<E>) -> anyhow::Result<()>;

    /// Check `event` against the engine's expected sequence and either apply
    /// it or hold it in the out-of-order buffer.
    fn submit_checked(&mut self, event: E) -> anyhow::Result<()>;

    /// Apply everything still held in the out-of-order buffer.
    fn drain(&mut self) -> anyhow::Result<()>;
}

/// Serializes calls into a [`BookEngine`] for one run.
///
/// `drain` consumes the dispatcher, so it can be issued at most once.
#[derive(Debug)]
pub struct EngineDispatcher<'a, G> {
    engine: &'a mut G,
    bulk_calls: u64,
    bulk_events: u64,
    live_events: u64,
}

impl<'a, G> EngineDispatcher<'a, G> {
    pub fn new(engine: &'a mut G) -> Self {
        Self {
            engine,
            bulk_calls: 0,
            bulk_events: 0,
            live_events: 0,
        }
    }

    pub fn bulk_calls(&self) -> u64 {
        self.bulk_calls
    }

    pub fn bulk_events(&self) -> u64 {
        self.bulk_events
    }

    pub fn live_events(&self) -> u64 {
        self.live_events
    }

    pub fn submit_bulk<E>(&mut self, events: Vec<E>) -> anyhow::Result<()>
    where
        E: Sequenced,
        G: BookEngine<E>,
    {
        let count = events.len() as u64;
        let first = events.first().map(Sequenced::seq);
        self.engine
            .submit_bulk(events)
            .with_context(|| match first {
                Some(seq) => format!("bulk submit of {count} events from seq {seq}"),
                None => "bulk submit of empty backlog".to_string(),
            })?;
        self.bulk_calls += 1;
        self.bulk_events += count;
        Ok(())
    }

    pub fn submit_checked<E>(&mut self, event: E) -> anyhow::Result<()>
    where
        E: Sequenced,
        G: BookEngine<E>,
    {
        let seq = event.seq();
        self.engine
            .submit_checked(event)
            .with_context(|| format!("live submit of seq {seq}"))?;
        self.live_events += 1;
        Ok(())
    }

    pub fn drain<E>(self) -> anyhow::Result<()>
    where
        E: Sequenced,
        G: BookEngine<E>,
    {
        log::debug!(
            "draining out-of-order buffer after {} bulk calls",
            self.bulk_calls
        );
        self.engine.drain().context("drain out-of-order buffer")
    }
}
