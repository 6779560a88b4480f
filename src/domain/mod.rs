//! Domain types: primitives, unit newtypes, events, and order books.

pub mod event;
pub mod orderbook;
pub mod primitives;
pub mod units;

pub use event::{
    BalancingTx, CashPosition, CompetitionSetup, Event, EventKind, MarketTx, SimStart, TariffTx,
    TimeslotUpdate,
};
pub use orderbook::{OrderBook, OrderBookEntry};
pub use primitives::{BrokerName, LeadTime, TariffTxType, Timeslot, DEFAULT_BROKER};
pub use units::{Kwh, Money, Mwh, MwhPrice, UnitPrice};
