//! Run configuration for the analysis engine.

/// Ring geometry fallback when the stream never delivers a Competition
/// header: the simulator defaults.
pub const DEFAULT_TIMESLOTS_OPEN: u32 = 24;
pub const DEFAULT_DEACTIVATE_AHEAD: u32 = 1;

/// How the per-broker imbalance clearing cost is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EstimateMode {
    /// Walk asks for a short broker and bids for a long one, integrating the
    /// marginal price over the consumed quantity.
    #[default]
    Marginal,
    /// Reproduce the legacy analyzer: walk asks only, track a single
    /// marginal price seeded at zero, report `price x imbalance` (zero for a
    /// long broker).
    Legacy,
}

/// Which order book the per-broker estimate reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookSource {
    /// The book captured for the timeslot being summarized.
    #[default]
    Current,
    /// The previous timeslot's book, for compatibility with the legacy
    /// analyzer's documented (rather than actual) behavior.
    Previous,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub estimate_mode: EstimateMode,
    pub book_source: BookSource,
    /// Retain per-lead-time market activity for the optional lead report.
    pub collect_lead_activity: bool,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_estimate_mode(mut self, mode: EstimateMode) -> Self {
        self.estimate_mode = mode;
        self
    }

    pub fn with_book_source(mut self, source: BookSource) -> Self {
        self.book_source = source;
        self
    }

    pub fn with_lead_activity(mut self, collect: bool) -> Self {
        self.collect_lead_activity = collect;
        self
    }
}
