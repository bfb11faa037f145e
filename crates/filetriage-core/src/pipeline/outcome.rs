/// Per-module outcomes and the per-pass report.
///
/// The outcome type keeps "ran and found nothing" apart from "failed", even
/// though both are excluded from the aggregate in the same way.
use crate::model::{EnrichmentResult, Finding};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Why a module invocation produced no contribution because of an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ModuleFailure {
    /// The module returned an error.
    Error(String),
    /// The module panicked; the payload message when it was a string.
    Panic(String),
    /// The module did not finish within the configured timeout.
    Timeout(Duration),
}

impl fmt::Display for ModuleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(msg) => write!(f, "error: {msg}"),
            Self::Panic(msg) => write!(f, "panicked: {msg}"),
            Self::Timeout(limit) => write!(f, "timed out after {} ms", limit.as_millis()),
        }
    }
}

/// What happened to one module during one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum ModuleOutcome {
    /// `should_process` returned false.
    Skipped,
    /// `should_process` itself failed; treated as a skip.
    PredicateFailed(ModuleFailure),
    /// `process` ran and returned the absence marker.
    NoFinding,
    /// `process` returned a result.
    Enriched(EnrichmentResult),
    /// `process` failed; excluded from the aggregate.
    Failed(ModuleFailure),
}

impl ModuleOutcome {
    pub fn failure(&self) -> Option<&ModuleFailure> {
        match self {
            Self::PredicateFailed(f) | Self::Failed(f) => Some(f),
            _ => None,
        }
    }

    pub fn enrichment(&self) -> Option<&EnrichmentResult> {
        match self {
            Self::Enriched(r) => Some(r),
            _ => None,
        }
    }

    /// Short status label for summaries and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::PredicateFailed(_) => "predicate_failed",
            Self::NoFinding => "no_finding",
            Self::Enriched(_) => "enriched",
            Self::Failed(_) => "failed",
        }
    }
}

/// One module's run within a pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleRun {
    pub module_name: String,
    pub outcome: ModuleOutcome,
    pub elapsed: Duration,
}

/// Everything one (file, workflow) pass produced.
///
/// `runs` is in registration order regardless of the order modules actually
/// executed in, so [`PassReport::findings`] is order-stable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassReport {
    pub object_id: String,
    pub file_name: String,
    pub workflow: String,
    pub runs: Vec<ModuleRun>,
    pub elapsed: Duration,
}

impl PassReport {
    /// The aggregate: every finding from every enriched module, in module order.
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.enrichments().flat_map(|r| r.findings.iter())
    }

    /// Owned copy of the aggregate, for handing to a sink.
    pub fn aggregate(&self) -> Vec<Finding> {
        self.findings().cloned().collect()
    }

    pub fn enrichments(&self) -> impl Iterator<Item = &EnrichmentResult> {
        self.runs.iter().filter_map(|run| run.outcome.enrichment())
    }

    /// Failed modules with their failure, in module order.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &ModuleFailure)> {
        self.runs
            .iter()
            .filter_map(|run| run.outcome.failure().map(|f| (run.module_name.as_str(), f)))
    }

    pub fn finding_count(&self) -> usize {
        self.findings().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn skipped_count(&self) -> usize {
        self.runs
            .iter()
            .filter(|run| matches!(run.outcome, ModuleOutcome::Skipped))
            .count()
    }

    /// Outcome recorded for `module_name`, if it was selected for this pass.
    pub fn outcome_of(&self, module_name: &str) -> Option<&ModuleOutcome> {
        self.runs
            .iter()
            .find(|run| run.module_name == module_name)
            .map(|run| &run.outcome)
    }
}
