//! Crate-level error type.

use crate::report::ReportError;
use crate::sink::SinkError;
use crate::source::SourceError;
use thiserror::Error;

/// Failures that can end an analysis run. Anomalies inside the engine
/// (missing books, out-of-range targets, unknown brokers) are never errors;
/// they are counted and logged so the output stays well-formed.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("event stream error: {0}")]
    Source(#[from] SourceError),
    #[error("output error: {0}")]
    Sink(#[from] SinkError),
    #[error("lead report error: {0}")]
    Report(#[from] ReportError),
}
