//! Optional lead-time trading report.
//!
//! One CSV row per (timeslot, broker, lead time) with market activity,
//! written at end of run. The day-of-week and hour-of-day columns anchor on
//! the simulation start instant, one hour per timeslot; they stay empty when
//! the stream supplied no instant.

use crate::engine::summary::LeadActivity;
use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Simulated wall-clock instant of a timeslot: start plus one hour per index.
fn slot_instant(start: DateTime<Utc>, timeslot: i64) -> DateTime<Utc> {
    start + Duration::hours(timeslot)
}

/// Write the lead report to any byte sink.
pub fn write_lead_report<W: Write>(
    out: W,
    activity: &[LeadActivity],
    sim_start: Option<DateTime<Utc>>,
) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["timeslot", "dow", "hod", "broker", "leadtime", "mwh", "cost"])?;

    for entry in activity {
        let (dow, hod) = match sim_start {
            Some(start) => {
                let instant = slot_instant(start, entry.timeslot.as_i64());
                (
                    instant.weekday().number_from_monday().to_string(),
                    instant.hour().to_string(),
                )
            }
            None => (String::new(), String::new()),
        };
        writer.write_record([
            entry.timeslot.to_string(),
            dow,
            hod,
            entry.broker.as_str().to_string(),
            entry.lead.to_string(),
            entry.mwh.to_3dp(),
            entry.cost.to_3dp(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the lead report to a file.
pub fn write_lead_report_file(
    path: impl AsRef<Path>,
    activity: &[LeadActivity],
    sim_start: Option<DateTime<Utc>>,
) -> Result<(), ReportError> {
    let file = File::create(path)?;
    write_lead_report(file, activity, sim_start)
}
