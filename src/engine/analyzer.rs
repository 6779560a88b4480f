//! The wired analysis engine: routes events into the accumulators and emits
//! one summary row per broker per timeslot.

use crate::config::{Config, DEFAULT_DEACTIVATE_AHEAD, DEFAULT_TIMESLOTS_OPEN};
use crate::domain::{
    BalancingTx, BrokerName, CashPosition, CompetitionSetup, Kwh, LeadTime, MarketTx, Money,
    OrderBook, SimStart, TariffTx, Timeslot, TimeslotUpdate,
};
use crate::engine::books::OrderBookStore;
use crate::engine::clock::{ClockTransition, TimeslotClock};
use crate::engine::dispatcher::EventHandler;
use crate::engine::registry::BrokerRegistry;
use crate::engine::ring::{AccumulatorRing, RingError};
use crate::engine::summary::{self, LeadActivity};
use crate::engine::Diagnostics;
use crate::sink::{SinkError, SummarySink};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

const UNKNOWN_GAME: &str = "unknown";

/// Consumes the event stream of one game and writes the per-broker summary
/// table. Anomalies never abort a run; they are counted in [`Diagnostics`]
/// and the output stays well-formed.
pub struct ImbalanceAnalyzer<S> {
    config: Config,
    sink: S,

    game: String,
    timeslots_open: u32,
    deactivate_ahead: u32,
    competitors: Vec<BrokerName>,
    sim_start: Option<DateTime<Utc>>,

    clock: Option<TimeslotClock>,
    registry: Option<BrokerRegistry>,
    ring: Option<AccumulatorRing>,
    books: OrderBookStore,
    total_imbalance: Kwh,
    cash: BTreeMap<BrokerName, Money>,

    diagnostics: Diagnostics,
    lead_activity: Vec<LeadActivity>,
    rows_emitted: u64,
    sink_failed: bool,
    finished: bool,
}

impl<S: SummarySink> ImbalanceAnalyzer<S> {
    pub fn new(config: Config, sink: S) -> Self {
        ImbalanceAnalyzer {
            config,
            sink,
            game: UNKNOWN_GAME.to_string(),
            timeslots_open: DEFAULT_TIMESLOTS_OPEN,
            deactivate_ahead: DEFAULT_DEACTIVATE_AHEAD,
            competitors: Vec::new(),
            sim_start: None,
            clock: None,
            registry: None,
            ring: None,
            books: OrderBookStore::new(),
            total_imbalance: Kwh::zero(),
            cash: BTreeMap::new(),
            diagnostics: Diagnostics::default(),
            lead_activity: Vec::new(),
            rows_emitted: 0,
            sink_failed: false,
            finished: false,
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn rows_emitted(&self) -> u64 {
        self.rows_emitted
    }

    pub fn game(&self) -> &str {
        &self.game
    }

    pub fn sim_start(&self) -> Option<DateTime<Utc>> {
        self.sim_start
    }

    /// Per-lead-time market activity accumulated for the lead report.
    pub fn lead_activity(&self) -> &[LeadActivity] {
        &self.lead_activity
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Finalize the sink and log the run summary. Called from the SimEnd
    /// handler and again (harmlessly) by the driver for streams that end
    /// without one.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if let Err(e) = self.sink.finish() {
            self.note_sink_failure(e);
        }
        self.diagnostics.log_summary();
        self.log_cash_standings();
        tracing::info!(
            game = %self.game,
            rows = self.rows_emitted,
            "analysis complete"
        );
    }

    fn ring_capacity(&self) -> usize {
        (self.timeslots_open + self.deactivate_ahead) as usize
    }

    fn broker_index(&self, broker: &BrokerName) -> Option<usize> {
        self.registry.as_ref()?.index_of(broker)
    }

    /// Build the registry from the competition's participants. Falls back to
    /// an empty registry when no Competition header was seen.
    fn build_registry(&mut self) {
        let registry = BrokerRegistry::from_competitors(self.competitors.iter().cloned());
        if registry.is_empty() {
            tracing::error!(
                game = %self.game,
                "no retail brokers known; summary rows will carry no broker groups"
            );
        } else {
            tracing::info!(
                game = %self.game,
                brokers = registry.len(),
                "broker registry built"
            );
        }
        self.registry = Some(registry);
    }

    fn note_sink_failure(&mut self, error: SinkError) {
        self.diagnostics.sink_failures += 1;
        if !self.sink_failed {
            self.sink_failed = true;
            tracing::error!(error = %error, "output unavailable; draining remaining events");
        }
    }

    fn write_header(&mut self) {
        let Some(registry) = self.registry.as_ref() else {
            return;
        };
        let names = registry.names().to_vec();
        if let Err(e) = self.sink.begin_header(&names) {
            self.note_sink_failure(e);
        }
    }

    /// End-of-timeslot sequence: materialize the row for `ended`, emit it,
    /// then recycle the ring cell, reset the aggregate imbalance, and shift
    /// the order-book queue.
    fn summarize(&mut self, ended: Timeslot) {
        let Some(clock) = self.clock else {
            return;
        };
        let (Some(registry), Some(ring)) = (self.registry.as_ref(), self.ring.as_ref()) else {
            return;
        };

        let row = summary::summarize_timeslot(
            &self.game,
            ended,
            registry,
            ring,
            &clock,
            &self.books,
            self.total_imbalance,
            &self.config,
            &mut self.diagnostics,
        );

        if self.config.collect_lead_activity {
            self.lead_activity
                .extend(summary::collect_lead_activity(ended, registry, ring, &clock));
        }

        if let Err(e) = self.sink.write_row(&row) {
            self.note_sink_failure(e);
        }
        self.rows_emitted += 1;

        if let Some(ring) = self.ring.as_mut() {
            ring.clear_at(&clock, ended);
        }
        self.total_imbalance = Kwh::zero();
        self.books.advance();
    }

    fn log_cash_standings(&self) {
        if self.cash.is_empty() {
            return;
        }
        let mut standings: Vec<(&BrokerName, &Money)> = self.cash.iter().collect();
        standings.sort_by(|a, b| b.1.cmp(a.1));
        for (rank, (broker, balance)) in standings.iter().enumerate() {
            tracing::info!(
                rank = rank + 1,
                broker = %broker,
                cash = %balance,
                "final cash position"
            );
        }
    }
}

impl<S: SummarySink> EventHandler for ImbalanceAnalyzer<S> {
    fn on_competition(&mut self, setup: &CompetitionSetup) {
        if self.clock.is_some() {
            tracing::warn!("competition header after clock start; ring geometry unchanged");
            return;
        }
        self.game = setup.name.clone();
        self.timeslots_open = setup.timeslots_open;
        self.deactivate_ahead = setup.deactivate_timeslots_ahead;
        self.competitors = setup.brokers.clone();
    }

    fn on_sim_start(&mut self, start: &SimStart) {
        self.sim_start = start.start;
        self.build_registry();
    }

    fn on_timeslot_update(&mut self, update: &TimeslotUpdate) {
        if self.registry.is_none() {
            tracing::warn!("timeslot update before sim start; building registry now");
            self.build_registry();
        }
        if self.clock.is_none() {
            if self.game == UNKNOWN_GAME {
                tracing::error!(
                    "no competition header seen; assuming {} open timeslots",
                    self.timeslots_open
                );
            }
            self.clock = Some(TimeslotClock::new(self.deactivate_ahead));
        }

        let transition = self
            .clock
            .as_mut()
            .map(|clock| clock.on_timeslot_update(update.first_enabled))
            .unwrap_or(ClockTransition::Unchanged);

        match transition {
            ClockTransition::Initialized { first } => {
                let brokers = self.registry.as_ref().map(|r| r.len()).unwrap_or(0);
                self.ring = Some(AccumulatorRing::new(brokers, self.ring_capacity()));
                self.write_header();
                tracing::info!(first = first.as_i64(), "first timeslot");
            }
            ClockTransition::Advanced { ended, began } => {
                self.summarize(ended);
                tracing::trace!(began = began.as_i64(), "begin timeslot");
            }
            ClockTransition::Unchanged => {}
        }
    }

    fn on_balancing_tx(&mut self, tx: &BalancingTx) {
        let Some(index) = self.broker_index(&tx.broker) else {
            tracing::debug!(broker = %tx.broker, "balancing tx for unregistered broker");
            return;
        };
        let Some(clock) = self.clock else {
            return;
        };
        if let Some(slot) = self
            .ring
            .as_mut()
            .and_then(|ring| ring.current_slot_mut(&clock, index))
        {
            slot.imbalance = tx.kwh;
            slot.balancing_cost = tx.charge;
            self.total_imbalance += tx.kwh;
        }
    }

    fn on_tariff_tx(&mut self, tx: &TariffTx) {
        if !tx.tx_type.affects_net_demand() {
            return;
        }
        let Some(index) = self.broker_index(&tx.broker) else {
            tracing::debug!(broker = %tx.broker, "tariff tx for unregistered broker");
            return;
        };
        let Some(clock) = self.clock else {
            return;
        };
        if let Some(slot) = self
            .ring
            .as_mut()
            .and_then(|ring| ring.current_slot_mut(&clock, index))
        {
            slot.add_demand(tx.kwh);
        }
    }

    fn on_market_tx(&mut self, tx: &MarketTx) {
        let Some(index) = self.broker_index(&tx.broker) else {
            // Wholesale participants trade here too; not an anomaly worth a
            // warning, but it is counted.
            self.diagnostics.unknown_broker += 1;
            tracing::trace!(broker = %tx.broker, "market tx for non-retail broker");
            return;
        };
        let Some(clock) = self.clock else {
            return;
        };
        let Some(current) = clock.current() else {
            return;
        };
        let Some(ring) = self.ring.as_mut() else {
            return;
        };
        match ring.future_slot_mut(&clock, index, tx.target_timeslot) {
            Ok(slot) => {
                let lead =
                    LeadTime::between(tx.target_timeslot, current).unwrap_or(LeadTime(0));
                slot.add_market_tx(tx.mwh, tx.price, lead);
            }
            Err(RingError::TargetOutOfRange { .. }) => {
                self.diagnostics.target_out_of_range += 1;
                tracing::warn!(
                    broker = %tx.broker,
                    target = tx.target_timeslot.as_i64(),
                    current = current.as_i64(),
                    "dropping market tx with target outside the ring window"
                );
            }
            Err(RingError::ClockNotStarted) => {}
        }
    }

    fn on_order_book(&mut self, book: &OrderBook) {
        let Some(current) = self.clock.and_then(|c| c.current()) else {
            return;
        };
        self.books.observe(book.clone(), current);
    }

    fn on_cash_position(&mut self, cash: &CashPosition) {
        self.cash.insert(cash.broker.clone(), cash.balance);
    }

    fn on_sim_end(&mut self) {
        self.finish();
    }
}
