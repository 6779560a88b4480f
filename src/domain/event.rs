//! The tagged event type delivered by the simulator log stream.

use crate::domain::{BrokerName, Kwh, Money, Mwh, MwhPrice, OrderBook, TariffTxType, Timeslot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Competition header, delivered before the first timeslot update. Supplies
/// the game identifier, ring geometry, and the participating broker names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitionSetup {
    pub name: String,
    pub timeslots_open: u32,
    pub deactivate_timeslots_ahead: u32,
    #[serde(default)]
    pub brokers: Vec<BrokerName>,
}

/// Marks engine activation. The start instant, when present, anchors
/// day-of-week / hour-of-day derivation for the lead-time report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimStart {
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
}

/// Clock tick: the first timeslot currently enabled for trading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeslotUpdate {
    pub first_enabled: Timeslot,
}

/// Settlement of a broker's residual imbalance for the current timeslot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancingTx {
    pub broker: BrokerName,
    /// Signed imbalance; negative means the broker was short.
    pub kwh: Kwh,
    pub charge: Money,
}

/// Retail tariff flow for the current timeslot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffTx {
    pub broker: BrokerName,
    pub tx_type: TariffTxType,
    pub kwh: Kwh,
}

/// Wholesale trade cleared for a (possibly future) delivery timeslot.
/// Purchases carry positive MWh and a negative price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketTx {
    pub broker: BrokerName,
    pub target_timeslot: Timeslot,
    pub mwh: Mwh,
    pub price: MwhPrice,
}

/// A broker's cash account balance as reported by the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashPosition {
    pub broker: BrokerName,
    pub balance: Money,
}

/// One decoded record of the simulation log, in stream order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Event {
    Competition(CompetitionSetup),
    SimStart(SimStart),
    SimEnd,
    TimeslotUpdate(TimeslotUpdate),
    BalancingTx(BalancingTx),
    TariffTx(TariffTx),
    MarketTx(MarketTx),
    OrderBook(OrderBook),
    CashPosition(CashPosition),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Competition(_) => EventKind::Competition,
            Event::SimStart(_) => EventKind::SimStart,
            Event::SimEnd => EventKind::SimEnd,
            Event::TimeslotUpdate(_) => EventKind::TimeslotUpdate,
            Event::BalancingTx(_) => EventKind::BalancingTx,
            Event::TariffTx(_) => EventKind::TariffTx,
            Event::MarketTx(_) => EventKind::MarketTx,
            Event::OrderBook(_) => EventKind::OrderBook,
            Event::CashPosition(_) => EventKind::CashPosition,
        }
    }
}

/// Discriminant of an [`Event`], used for routing and per-kind statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    Competition,
    SimStart,
    SimEnd,
    TimeslotUpdate,
    BalancingTx,
    TariffTx,
    MarketTx,
    OrderBook,
    CashPosition,
}

impl EventKind {
    pub const ALL: [EventKind; 9] = [
        EventKind::Competition,
        EventKind::SimStart,
        EventKind::SimEnd,
        EventKind::TimeslotUpdate,
        EventKind::BalancingTx,
        EventKind::TariffTx,
        EventKind::MarketTx,
        EventKind::OrderBook,
        EventKind::CashPosition,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Competition => "Competition",
            EventKind::SimStart => "SimStart",
            EventKind::SimEnd => "SimEnd",
            EventKind::TimeslotUpdate => "TimeslotUpdate",
            EventKind::BalancingTx => "BalancingTx",
            EventKind::TariffTx => "TariffTx",
            EventKind::MarketTx => "MarketTx",
            EventKind::OrderBook => "OrderBook",
            EventKind::CashPosition => "CashPosition",
        }
    }

    /// Look a kind up by its stream tag.
    pub fn from_name(name: &str) -> Option<EventKind> {
        EventKind::ALL.iter().copied().find(|k| k.name() == name)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
