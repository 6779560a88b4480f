//! Event routing: a match-style dispatcher over the tagged event type.

use crate::domain::{
    BalancingTx, CashPosition, CompetitionSetup, Event, EventKind, MarketTx, OrderBook, SimStart,
    TariffTx, TimeslotUpdate,
};
use crate::source::{EventSource, SourceError};
use std::collections::BTreeMap;

/// Receiver of decoded events. Every method defaults to a no-op, so a
/// handler only overrides the kinds it cares about; anything else is
/// ignored.
pub trait EventHandler {
    /// Called for every event, before the per-kind method.
    fn on_event(&mut self, _event: &Event) {}

    fn on_competition(&mut self, _setup: &CompetitionSetup) {}
    fn on_sim_start(&mut self, _start: &SimStart) {}
    fn on_sim_end(&mut self) {}
    fn on_timeslot_update(&mut self, _update: &TimeslotUpdate) {}
    fn on_balancing_tx(&mut self, _tx: &BalancingTx) {}
    fn on_tariff_tx(&mut self, _tx: &TariffTx) {}
    fn on_market_tx(&mut self, _tx: &MarketTx) {}
    fn on_order_book(&mut self, _book: &OrderBook) {}
    fn on_cash_position(&mut self, _cash: &CashPosition) {}
}

/// Route one event to the matching handler method.
pub fn dispatch(handler: &mut dyn EventHandler, event: &Event) {
    handler.on_event(event);
    match event {
        Event::Competition(setup) => handler.on_competition(setup),
        Event::SimStart(start) => handler.on_sim_start(start),
        Event::SimEnd => handler.on_sim_end(),
        Event::TimeslotUpdate(update) => handler.on_timeslot_update(update),
        Event::BalancingTx(tx) => handler.on_balancing_tx(tx),
        Event::TariffTx(tx) => handler.on_tariff_tx(tx),
        Event::MarketTx(tx) => handler.on_market_tx(tx),
        Event::OrderBook(book) => handler.on_order_book(book),
        Event::CashPosition(cash) => handler.on_cash_position(cash),
    }
}

/// Fans each event out to registered handlers in registration order. All
/// handlers see an event before the next one is dispatched; there is no
/// buffering or back-pressure.
pub struct EventDispatcher<'a> {
    handlers: Vec<&'a mut dyn EventHandler>,
}

impl<'a> EventDispatcher<'a> {
    pub fn new() -> Self {
        EventDispatcher {
            handlers: Vec::new(),
        }
    }

    pub fn register(&mut self, handler: &'a mut dyn EventHandler) -> &mut Self {
        self.handlers.push(handler);
        self
    }

    pub fn emit(&mut self, event: &Event) {
        for handler in self.handlers.iter_mut() {
            dispatch(&mut **handler, event);
        }
    }

    /// Pump a source dry, returning the number of events dispatched.
    pub fn drain(&mut self, source: &mut dyn EventSource) -> Result<u64, SourceError> {
        let mut dispatched = 0;
        while let Some(event) = source.next_event()? {
            self.emit(&event);
            dispatched += 1;
        }
        Ok(dispatched)
    }
}

impl Default for EventDispatcher<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts events per kind; registered alongside the analyzer so a run can
/// report what it saw.
#[derive(Debug, Clone, Default)]
pub struct EventStats {
    counts: BTreeMap<EventKind, u64>,
    total: u64,
}

impl EventStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, kind: EventKind) -> u64 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn log_summary(&self) {
        for (kind, count) in &self.counts {
            tracing::info!(kind = %kind, count = *count, "events processed");
        }
        tracing::info!(total = self.total, "event stream drained");
    }
}

impl EventHandler for EventStats {
    fn on_event(&mut self, event: &Event) {
        *self.counts.entry(event.kind()).or_insert(0) += 1;
        self.total += 1;
    }
}
