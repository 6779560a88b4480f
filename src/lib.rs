//! gridtally: per-broker economic summaries from electricity trading
//! competition logs.
//!
//! The engine replays a causally ordered event stream (timeslot ticks,
//! tariff/market/balancing transactions, order books) through a
//! single-threaded state machine and writes one CSV row per broker per
//! timeslot: net demand, wholesale volume and cost, imbalance, balancing
//! cost, and two imbalance clearing cost estimates derived from the
//! prevailing order book.

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod report;
pub mod sink;
pub mod source;

pub use config::{BookSource, Config, EstimateMode};
pub use domain::{
    BrokerName, Event, EventKind, Kwh, LeadTime, Money, Mwh, MwhPrice, OrderBook, OrderBookEntry,
    TariffTxType, Timeslot, UnitPrice,
};
pub use engine::{run_analysis, Diagnostics, EventStats, ImbalanceAnalyzer};
pub use error::AnalyzerError;
pub use sink::{CsvSink, DiscardSink, MemorySink, SummarySink};
pub use source::{EventSource, JsonlSource, MockSource};
