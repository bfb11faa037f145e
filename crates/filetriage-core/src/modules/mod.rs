/// Analyzer modules: the pluggable contract every enrichment unit implements.
///
/// A module answers two questions about a file: "do I apply?"
/// ([`AnalyzerModule::should_process`]) and "what did I observe?"
/// ([`AnalyzerModule::process`]). Modules are constructed once, at registry
/// load time, and must hold no mutable state between calls so that one
/// instance can serve many concurrent passes.
///
/// # Discovery
///
/// Each module file exposes a zero-argument `create_module()` factory.
/// [`BUILTIN_MODULES`] is the compile-time table of those factories; the
/// registry walks it in order when building the default module set.
pub mod filename;

use crate::model::EnrichmentResult;
use crate::provider::{FileMetadataProvider, ProviderError};

/// Workflow every general-purpose module participates in.
pub const DEFAULT_WORKFLOW: &str = "default";

/// Errors a module may return from either contract method.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    /// The metadata provider refused the lookup.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// Any other analysis failure.
    #[error("{0}")]
    Failed(String),
}

impl ModuleError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Outcome of [`AnalyzerModule::process`].
///
/// `Ok(None)` is the absence marker: the module ran and found nothing of
/// interest. `Err` is a module failure. The two are excluded from the pass
/// aggregate alike but are reported separately.
pub type ProcessResult = Result<Option<EnrichmentResult>, ModuleError>;

/// Contract implemented by every analyzer module.
pub trait AnalyzerModule: Send + Sync {
    /// Unique name within a registry.
    fn name(&self) -> &str;

    /// Workflow tags this module participates in. Never empty.
    fn workflows(&self) -> &[String];

    /// One-line description for listings.
    fn description(&self) -> &str {
        "Analyzer module"
    }

    /// Cheap applicability predicate, evaluated once per file per pass.
    ///
    /// Must not depend on sibling modules having been evaluated first.
    fn should_process(
        &self,
        object_id: &str,
        files: &dyn FileMetadataProvider,
    ) -> Result<bool, ModuleError>;

    /// Analyse the file. Must be idempotent for unchanged input.
    fn process(&self, object_id: &str, files: &dyn FileMetadataProvider) -> ProcessResult;
}

/// Zero-argument factory producing a ready-to-register module.
pub type ModuleFactory = fn() -> Box<dyn AnalyzerModule>;

/// Factories for every module compiled into this crate, in registration order.
pub const BUILTIN_MODULES: &[ModuleFactory] = &[filename::create_module];
