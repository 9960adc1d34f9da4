//! The multi-instrument router: one `NextMeta` shared across every
//! instrument's `Engine` so that `seq` is strictly increasing across the
//! whole venue, not just within one instrument's book.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::commands::Command;
use crate::domain::events::{reject_reason, Event, OrderRejected};
use crate::domain::types::Instrument;
use crate::engine::clock::{Clock, NextMeta};
use crate::engine::engine::{Engine, LedgerAssets};

/// Per-instrument setup handed to `Venue::new`/`Venue::replay`: which
/// instrument, and whether (and with which assets) its ledger is in use.
pub struct InstrumentConfig {
    pub instrument: Instrument,
    pub ledger: Option<LedgerAssets>,
}

pub struct Venue {
    engines: HashMap<Instrument, Engine>,
    next_meta: Arc<NextMeta>,
}

impl Venue {
    pub fn new(instruments: Vec<InstrumentConfig>, clock: Box<dyn Clock>) -> Self {
        let next_meta = Arc::new(NextMeta::new(clock));
        let engines = instruments
            .into_iter()
            .map(|cfg| {
                let engine = Engine::standalone(cfg.instrument.clone(), cfg.ledger, next_meta.clone());
                (cfg.instrument, engine)
            })
            .collect();
        Self { engines, next_meta }
    }

    pub fn engine(&self, instrument: &Instrument) -> Option<&Engine> {
        self.engines.get(instrument)
    }

    pub fn engine_mut(&mut self, instrument: &Instrument) -> Option<&mut Engine> {
        self.engines.get_mut(instrument)
    }

    pub fn instruments(&self) -> impl Iterator<Item = &Instrument> {
        self.engines.keys()
    }

    /// Routes `command` to the engine for its instrument. An instrument the
    /// venue doesn't know about produces a single `OrderRejected` — unlike
    /// an instrument mismatch inside one `Engine`, there's no per-instrument
    /// sequence to fold this into, so it's minted directly off the shared
    /// counter.
    pub fn submit(&mut self, command: Command) -> Vec<Event> {
        let instrument = command.instrument().clone();
        match self.engines.get_mut(&instrument) {
            Some(engine) => engine.submit(command),
            None => {
                let (seq, ts_ns) = self.next_meta.next();
                vec![Event::OrderRejected(OrderRejected {
                    seq,
                    ts_ns,
                    instrument,
                    order_id: command.order_id(),
                    reason: reject_reason::INSTRUMENT_NOT_FOUND,
                })]
            }
        }
    }

    /// Rebuilds a venue from a merged, multi-instrument event stream.
    /// `seq` resumes from one past the stream's maximum so newly submitted
    /// commands keep extending the same sequence. An event naming an
    /// instrument outside `instruments` is a fatal replay error — the caller
    /// handed us an incomplete picture of the venue that produced the
    /// stream.
    pub fn replay(instruments: Vec<InstrumentConfig>, events: Vec<Event>, clock: Box<dyn Clock>, rebuild_book: bool) -> Self {
        let max_seq = events.iter().map(Event::seq).max().unwrap_or(0);
        let next_meta = Arc::new(NextMeta::resuming_from(clock, max_seq));

        let mut by_instrument: HashMap<Instrument, Vec<Event>> = HashMap::new();
        for event in events {
            if let Some(instrument) = event.instrument() {
                by_instrument.entry(instrument.clone()).or_default().push(event);
            }
        }

        let known: std::collections::HashSet<&Instrument> =
            instruments.iter().map(|cfg| &cfg.instrument).collect();
        for instrument in by_instrument.keys() {
            if !known.contains(instrument) {
                panic!("replay: event stream references unconfigured instrument {instrument}");
            }
        }

        let engines = instruments
            .into_iter()
            .map(|cfg| {
                let events = by_instrument.remove(&cfg.instrument).unwrap_or_default();
                let engine = Engine::replay(cfg.instrument.clone(), cfg.ledger, events, next_meta.clone(), rebuild_book);
                (cfg.instrument, engine)
            })
            .collect();

        Self { engines, next_meta }
    }

    pub fn current_seq(&self) -> u64 {
        self.next_meta.current_seq()
    }
}
