/// Data model shared by analyzer modules, the pipeline and the sinks.
///
/// Re-exports the file record, the finding taxonomy and the per-module
/// enrichment envelope.
pub mod finding;
pub mod record;
pub mod result;
pub mod size;

pub use finding::{
    DisplayArtifact, Finding, FindingCategory, FindingOrigin, Severity, SeverityError,
};
pub use record::FileRecord;
pub use result::EnrichmentResult;
