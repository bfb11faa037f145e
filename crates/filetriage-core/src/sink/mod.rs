/// Finding sinks: the persistence boundary a pass hands its aggregate to.
///
/// The core only needs "store these findings for this file"; where they end
/// up (memory, a JSON-lines stream, a CSV export) is the sink's business.
pub mod export;

pub use export::{write_csv, JsonLinesSink};

use crate::model::Finding;
use parking_lot::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("I/O error writing findings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialise finding: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Receives the aggregated findings of a completed pass.
pub trait FindingSink: Send + Sync {
    fn store(&self, object_id: &str, findings: &[Finding]) -> Result<(), SinkError>;
}

/// Collects findings in memory, grouped by the pass that produced them.
#[derive(Debug, Default)]
pub struct MemorySink {
    batches: Mutex<Vec<(String, Vec<Finding>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored findings, flattened in arrival order.
    pub fn findings(&self) -> Vec<Finding> {
        self.batches
            .lock()
            .iter()
            .flat_map(|(_, findings)| findings.iter().cloned())
            .collect()
    }

    /// Findings stored for one file, across every pass that reported it.
    pub fn findings_for(&self, object_id: &str) -> Vec<Finding> {
        self.batches
            .lock()
            .iter()
            .filter(|(id, _)| id == object_id)
            .flat_map(|(_, findings)| findings.iter().cloned())
            .collect()
    }

    /// Number of `store` calls received.
    pub fn pass_count(&self) -> usize {
        self.batches.lock().len()
    }
}

impl FindingSink for MemorySink {
    fn store(&self, object_id: &str, findings: &[Finding]) -> Result<(), SinkError> {
        self.batches
            .lock()
            .push((object_id.to_owned(), findings.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FindingCategory, Severity};

    fn finding(object_id: &str) -> Finding {
        Finding::from_module(
            "m",
            object_id,
            FindingCategory::Misc,
            "n",
            Severity::new(2).unwrap(),
        )
    }

    #[test]
    fn memory_sink_groups_by_object() {
        let sink = MemorySink::new();
        sink.store("a", &[finding("a"), finding("a")]).unwrap();
        sink.store("b", &[]).unwrap();
        sink.store("a", &[finding("a")]).unwrap();

        assert_eq!(sink.pass_count(), 3);
        assert_eq!(sink.findings().len(), 3);
        assert_eq!(sink.findings_for("a").len(), 3);
        assert!(sink.findings_for("b").is_empty());
    }
}
