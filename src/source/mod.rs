//! Event-stream sources: decoding the simulator log into typed events.

use crate::domain::Event;
use thiserror::Error;

pub mod jsonl;
pub mod mock;

pub use jsonl::JsonlSource;
pub use mock::MockSource;

/// Error type for event-stream decoding.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed event at line {line}: {reason}")]
    Malformed { line: u64, reason: String },
}

/// A pull source of decoded simulation events.
///
/// Implementations yield events in the causal order the simulator produced
/// them; the engine performs no re-ordering or gap-filling.
pub trait EventSource {
    /// The next event, None at end of stream.
    fn next_event(&mut self) -> Result<Option<Event>, SourceError>;
}
