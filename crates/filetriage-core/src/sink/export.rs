/// Finding export formats: JSON lines (streaming sink) and CSV (one-shot).
use crate::model::Finding;
use crate::sink::{FindingSink, SinkError};
use parking_lot::Mutex;
use std::io::Write;

/// Writes one JSON object per finding, one per line.
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> FindingSink for JsonLinesSink<W> {
    fn store(&self, _object_id: &str, findings: &[Finding]) -> Result<(), SinkError> {
        // Hold the lock for the whole batch so passes never interleave lines.
        let mut writer = self.writer.lock();
        for finding in findings {
            serde_json::to_writer(&mut *writer, finding)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Flat CSV row for a finding.
#[derive(serde::Serialize)]
struct CsvRow<'a> {
    object_id: &'a str,
    origin_name: &'a str,
    finding_name: &'a str,
    category: &'static str,
    severity: u8,
    raw_data: String,
}

/// Write `findings` as CSV with a header row.
pub fn write_csv<W: Write>(findings: &[Finding], writer: W) -> Result<(), SinkError> {
    let mut out = csv::Writer::from_writer(writer);
    for f in findings {
        out.serialize(CsvRow {
            object_id: f.object_id(),
            origin_name: f.origin_name(),
            finding_name: f.finding_name(),
            category: f.category().label(),
            severity: f.severity().value(),
            raw_data: f.raw_data().to_string(),
        })?;
    }
    out.flush()?;
    Ok(())
}
