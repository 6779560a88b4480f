//! JSON-lines decoder for the simulator event stream.

use super::{EventSource, SourceError};
use crate::domain::{Event, EventKind};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Reads one `"kind"`-tagged JSON event per line. Blank lines and lines
/// tagged with an unknown kind are skipped; the latter are counted so a run
/// can report how much of the stream it did not understand.
#[derive(Debug)]
pub struct JsonlSource<R> {
    reader: R,
    line_no: u64,
    unknown_kinds: u64,
}

impl JsonlSource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        Ok(JsonlSource::new(BufReader::new(file)))
    }
}

impl<R: BufRead> JsonlSource<R> {
    pub fn new(reader: R) -> Self {
        JsonlSource {
            reader,
            line_no: 0,
            unknown_kinds: 0,
        }
    }

    /// Number of lines skipped because their kind tag was not recognized.
    pub fn unknown_kinds(&self) -> u64 {
        self.unknown_kinds
    }

    fn decode(&mut self, line: &str) -> Result<Option<Event>, SourceError> {
        let value: serde_json::Value =
            serde_json::from_str(line).map_err(|e| SourceError::Malformed {
                line: self.line_no,
                reason: e.to_string(),
            })?;

        let kind = value.get("kind").and_then(|k| k.as_str());
        match kind {
            Some(name) if EventKind::from_name(name).is_some() => {
                let event = serde_json::from_value(value).map_err(|e| SourceError::Malformed {
                    line: self.line_no,
                    reason: e.to_string(),
                })?;
                Ok(Some(event))
            }
            Some(name) => {
                self.unknown_kinds += 1;
                tracing::debug!(kind = name, line = self.line_no, "skipping unknown event kind");
                Ok(None)
            }
            None => Err(SourceError::Malformed {
                line: self.line_no,
                reason: "missing `kind` tag".to_string(),
            }),
        }
    }
}

impl<R: BufRead> EventSource for JsonlSource<R> {
    fn next_event(&mut self) -> Result<Option<Event>, SourceError> {
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            match self.decode(line.trim())? {
                Some(mut event) => {
                    // Books are priced by walking sides in order, so enforce
                    // walk order at the decode boundary.
                    if let Event::OrderBook(ref mut book) = event {
                        book.normalize();
                    }
                    return Ok(Some(event));
                }
                None => continue,
            }
        }
    }
}
