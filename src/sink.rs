//! Line-oriented summary output.
//!
//! The summary table is fixed-layout CSV: a header naming one eight-column
//! group per broker, then one row per summarized timeslot with every numeric
//! field in fixed three-decimal precision.

use crate::domain::BrokerName;
use crate::engine::summary::SummaryRow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Destination for summary rows: a header, any number of rows, a finalize.
pub trait SummarySink {
    /// Write the column header. Idempotent: repeated calls (as happen when a
    /// stream restarts before the first summarization) emit one header.
    fn begin_header(&mut self, brokers: &[BrokerName]) -> Result<(), SinkError>;

    fn write_row(&mut self, row: &SummaryRow) -> Result<(), SinkError>;

    fn finish(&mut self) -> Result<(), SinkError>;
}

const BROKER_COLUMNS: [&str; 8] = [
    "broker",
    "netDemand",
    "mktQty",
    "mktCost",
    "imbalance",
    "imbalanceCost",
    "mktImbCost",
    "estCost",
];

/// CSV writer over any byte sink.
#[derive(Debug)]
pub struct CsvSink<W: Write> {
    out: W,
    header_written: bool,
}

impl CsvSink<BufWriter<File>> {
    /// Open `path` for writing, truncating any previous contents.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let file = File::create(path)?;
        Ok(CsvSink::new(BufWriter::new(file)))
    }
}

impl<W: Write> CsvSink<W> {
    pub fn new(out: W) -> Self {
        CsvSink {
            out,
            header_written: false,
        }
    }

    /// Recover the underlying writer, for in-memory inspection.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SummarySink for CsvSink<W> {
    fn begin_header(&mut self, brokers: &[BrokerName]) -> Result<(), SinkError> {
        if self.header_written {
            return Ok(());
        }
        let mut fields: Vec<&str> = vec!["game", "timeslot"];
        for _ in brokers {
            fields.extend(BROKER_COLUMNS);
        }
        writeln!(self.out, "{}", fields.join(", "))?;
        self.header_written = true;
        Ok(())
    }

    fn write_row(&mut self, row: &SummaryRow) -> Result<(), SinkError> {
        let mut fields = Vec::with_capacity(2 + 8 * row.brokers.len());
        fields.push(row.game.clone());
        fields.push(row.timeslot.to_string());
        for broker in &row.brokers {
            fields.push(broker.broker.as_str().to_string());
            fields.push(broker.net_demand.to_3dp());
            fields.push(broker.market_qty.to_3dp());
            fields.push(broker.market_cost.to_3dp());
            fields.push(broker.imbalance.to_3dp());
            fields.push(broker.balancing_cost.to_3dp());
            fields.push(broker.market_imbalance_cost.to_3dp());
            fields.push(broker.est_clearing_cost.to_3dp());
        }
        writeln!(self.out, "{}", fields.join(","))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.out.flush()?;
        Ok(())
    }
}

/// Keeps structured rows in memory; the test double for the CSV sink.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    header: Option<Vec<BrokerName>>,
    rows: Vec<SummaryRow>,
    finished: bool,
    header_calls: u32,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&self) -> Option<&[BrokerName]> {
        self.header.as_deref()
    }

    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// How many times `begin_header` was invoked (the header itself is
    /// recorded once).
    pub fn header_calls(&self) -> u32 {
        self.header_calls
    }
}

impl SummarySink for MemorySink {
    fn begin_header(&mut self, brokers: &[BrokerName]) -> Result<(), SinkError> {
        self.header_calls += 1;
        if self.header.is_none() {
            self.header = Some(brokers.to_vec());
        }
        Ok(())
    }

    fn write_row(&mut self, row: &SummaryRow) -> Result<(), SinkError> {
        self.rows.push(row.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.finished = true;
        Ok(())
    }
}

/// Swallows everything; used when output is unavailable but the stream must
/// still be drained.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl SummarySink for DiscardSink {
    fn begin_header(&mut self, _brokers: &[BrokerName]) -> Result<(), SinkError> {
        Ok(())
    }

    fn write_row(&mut self, _row: &SummaryRow) -> Result<(), SinkError> {
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}
