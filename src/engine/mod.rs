//! The event-driven analysis engine.

use crate::error::AnalyzerError;
use crate::sink::SummarySink;
use crate::source::EventSource;

pub mod analyzer;
pub mod books;
pub mod clock;
pub mod dispatcher;
pub mod estimator;
pub mod registry;
pub mod ring;
pub mod summary;

pub use analyzer::ImbalanceAnalyzer;
pub use books::OrderBookStore;
pub use clock::{ClockTransition, TimeslotClock};
pub use dispatcher::{dispatch, EventDispatcher, EventHandler, EventStats};
pub use registry::BrokerRegistry;
pub use ring::{AccumulatorRing, BrokerSlot, LeadTxn, RingError};
pub use summary::{BrokerSummary, LeadActivity, SummaryRow};

use estimator::WalkIssue;

/// Counters for the anomalies a run tolerates. None of these abort the
/// analysis; the output keeps its column count and the counts are logged at
/// the end of the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// End-of-timeslot reached with no order book captured.
    pub missing_order_book: u64,
    /// The book held no orders on the side the imbalance sign required.
    pub empty_book_side: u64,
    /// A walk ran out of quantity before covering its imbalance.
    pub exhausted_levels: u64,
    /// Market transaction targeting a timeslot outside the ring window.
    pub target_out_of_range: u64,
    /// Market transaction from a participant not in the retail registry.
    pub unknown_broker: u64,
    /// Output writes that failed after the sink became unavailable.
    pub sink_failures: u64,
}

impl Diagnostics {
    pub fn record_walk_issue(&mut self, issue: WalkIssue) {
        match issue {
            WalkIssue::MissingBook => self.missing_order_book += 1,
            WalkIssue::EmptySide => self.empty_book_side += 1,
            WalkIssue::Exhausted => self.exhausted_levels += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.missing_order_book
            + self.empty_book_side
            + self.exhausted_levels
            + self.target_out_of_range
            + self.unknown_broker
            + self.sink_failures
    }

    pub fn log_summary(&self) {
        if self.total() == 0 {
            return;
        }
        tracing::info!(
            missing_order_book = self.missing_order_book,
            empty_book_side = self.empty_book_side,
            exhausted_levels = self.exhausted_levels,
            target_out_of_range = self.target_out_of_range,
            unknown_broker = self.unknown_broker,
            sink_failures = self.sink_failures,
            "run diagnostics"
        );
    }
}

/// Drive a full analysis: register the analyzer and the per-kind statistics
/// handler, drain the source, then finalize. Returns the number of events
/// dispatched.
pub fn run_analysis<S: SummarySink>(
    source: &mut dyn EventSource,
    analyzer: &mut ImbalanceAnalyzer<S>,
    stats: &mut EventStats,
) -> Result<u64, AnalyzerError> {
    let drained = {
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(analyzer).register(stats);
        dispatcher.drain(source)
    };
    // The sink is finalized even when the stream dies mid-run, so whatever
    // rows were already summarized survive on disk.
    analyzer.finish();
    stats.log_summary();
    Ok(drained?)
}
