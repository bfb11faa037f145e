/// Orchestration pipeline: runs the modules of one workflow against one file.
///
/// A pass walks each module selected by the registry through
/// `Selected → Evaluating → {Skipped | Invoked} → Aggregated`:
///
/// 1. The file is resolved through the metadata provider. A provider failure
///    is an infrastructure failure and aborts the pass with an error.
/// 2. Each module's `should_process` is evaluated; `false` or a failure skips
///    the module.
/// 3. Applicable modules are invoked inside an isolation boundary: returned
///    errors, panics and timeouts become [`ModuleOutcome::Failed`], are
///    logged with module and file context, and never abort the pass. The one
///    exception is [`ProviderError::Unavailable`] raised from inside a module:
///    the store is down, so the pass fails as a whole and can be retried.
/// 4. The report keeps outcomes in registration order so the aggregate is
///    stable no matter how modules were scheduled.
///
/// Modules within one pass run on the rayon pool when
/// `PipelineConfig::parallel_modules` is set. Batches of passes run on a
/// dedicated pool sized by `PipelineConfig::workers`.
pub mod outcome;

pub use outcome::{ModuleFailure, ModuleOutcome, ModuleRun, PassReport};

use crate::config::PipelineConfig;
use crate::model::EnrichmentResult;
use crate::modules::ModuleError;
use crate::provider::{ProviderError, SharedProvider};
use crate::registry::{ModuleRegistry, SharedModule};
use crate::sink::{FindingSink, SinkError};
use rayon::prelude::*;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn, Span};

/// Failures that abort a whole pass.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The file could not be resolved; the pass is eligible for retry.
    #[error("metadata provider failed: {0}")]
    Provider(#[from] ProviderError),
    /// The aggregate could not be persisted.
    #[error("finding sink failed: {0}")]
    Sink(#[from] SinkError),
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

pub struct Pipeline {
    registry: Arc<ModuleRegistry>,
    provider: SharedProvider,
    config: PipelineConfig,
    span: Span,
}

impl Pipeline {
    pub fn new(registry: Arc<ModuleRegistry>, provider: SharedProvider, config: PipelineConfig) -> Self {
        Self {
            registry,
            provider,
            config,
            span: Span::current(),
        }
    }

    /// Record every pass under `span` instead of the span current at construction.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one (file, workflow) pass.
    pub fn run(&self, object_id: &str, workflow: &str) -> Result<PassReport, PipelineError> {
        let span = info_span!(parent: &self.span, "pass", object_id, workflow);
        let _enter = span.enter();
        let started = Instant::now();

        let record = self.provider.get_file_metadata(object_id).map_err(|e| {
            warn!(error = %e, "Cannot resolve file; pass aborted");
            e
        })?;

        let modules = self.registry.lookup(workflow);
        if modules.is_empty() {
            debug!("No modules registered for workflow");
        }

        let runs: Result<Vec<ModuleRun>, ProviderError> =
            if self.config.parallel_modules && modules.len() > 1 {
                // `collect` on an indexed parallel iterator keeps input order.
                modules
                    .par_iter()
                    .map(|module| span.in_scope(|| self.run_module(module, object_id)))
                    .collect()
            } else {
                modules
                    .iter()
                    .map(|module| self.run_module(module, object_id))
                    .collect()
            };
        let runs = runs.map_err(|e| {
            warn!(error = %e, "Metadata store became unavailable; pass aborted");
            e
        })?;

        let report = PassReport {
            object_id: object_id.to_owned(),
            file_name: record.file_name,
            workflow: workflow.to_owned(),
            runs,
            elapsed: started.elapsed(),
        };
        info!(
            modules = report.runs.len(),
            findings = report.finding_count(),
            failed = report.failure_count(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Pass complete"
        );
        Ok(report)
    }

    /// Run a pass with the configured default workflow.
    pub fn run_default(&self, object_id: &str) -> Result<PassReport, PipelineError> {
        self.run(object_id, &self.config.default_workflow)
    }

    /// Run a pass and hand its aggregate to `sink`.
    pub fn run_and_store(
        &self,
        object_id: &str,
        workflow: &str,
        sink: &dyn FindingSink,
    ) -> Result<PassReport, PipelineError> {
        let report = self.run(object_id, workflow)?;
        sink.store(object_id, &report.aggregate())?;
        Ok(report)
    }

    /// Run independent passes for many files concurrently.
    ///
    /// Results are returned in the order of `object_ids`. A failed pass is
    /// reported in its slot and does not affect the others.
    pub fn run_batch(
        &self,
        object_ids: &[String],
        workflow: &str,
    ) -> Result<Vec<Result<PassReport, PipelineError>>, PipelineError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers.max(1))
            .thread_name(|i| format!("filetriage-pass-{i}"))
            .build()?;
        info!(files = object_ids.len(), workers = self.config.workers, workflow, "Starting batch");

        Ok(pool.install(|| {
            object_ids
                .par_iter()
                .map(|id| self.run(id, workflow))
                .collect()
        }))
    }

    // ── Per-module evaluation ───────────────────────────────────────────────

    /// Evaluate one module. Only an unavailable metadata store escapes as an
    /// error; every other problem is recorded in the returned run.
    fn run_module(&self, module: &SharedModule, object_id: &str) -> Result<ModuleRun, ProviderError> {
        let started = Instant::now();
        let module_name = module.name();

        let applicable = isolate(|| module.should_process(object_id, self.provider.as_ref()));
        let outcome = match applicable {
            Ok(false) => {
                debug!(module_name, object_id, "Module not applicable");
                ModuleOutcome::Skipped
            }
            Err(Interrupted::StoreUnavailable(e)) => return Err(e),
            Err(Interrupted::Failed(failure)) => {
                warn!(module_name, object_id, error = %failure, "should_process failed; skipping module");
                ModuleOutcome::PredicateFailed(failure)
            }
            Ok(true) => match self.invoke(module, object_id) {
                Ok(Some(result)) => {
                    debug!(module_name, object_id, findings = result.findings.len(), "Module produced a result");
                    ModuleOutcome::Enriched(result)
                }
                Ok(None) => ModuleOutcome::NoFinding,
                Err(Interrupted::StoreUnavailable(e)) => return Err(e),
                Err(Interrupted::Failed(failure)) => {
                    error!(module_name, object_id, error = %failure, "Module failed; excluded from aggregate");
                    ModuleOutcome::Failed(failure)
                }
            },
        };

        Ok(ModuleRun {
            module_name: module_name.to_owned(),
            outcome,
            elapsed: started.elapsed(),
        })
    }

    /// Call `process`, honouring the configured timeout.
    fn invoke(
        &self,
        module: &SharedModule,
        object_id: &str,
    ) -> Result<Option<EnrichmentResult>, Interrupted> {
        let Some(limit) = self.config.module_timeout() else {
            return isolate(|| module.process(object_id, self.provider.as_ref()));
        };

        // The call runs on a helper thread so the pass can stop waiting for
        // it. A timed-out call keeps running until it returns on its own; its
        // result is dropped.
        let (tx, rx) = crossbeam_channel::bounded(1);
        let module = Arc::clone(module);
        let provider = Arc::clone(&self.provider);
        let id = object_id.to_owned();
        let span = Span::current();
        let spawned = thread::Builder::new()
            .name(format!("filetriage-module-{}", module.name()))
            .spawn(move || {
                let result = span.in_scope(|| isolate(|| module.process(&id, provider.as_ref())));
                let _ = tx.send(result);
            });
        if let Err(e) = spawned {
            return Err(ModuleFailure::Error(format!("failed to spawn module thread: {e}")).into());
        }

        match rx.recv_timeout(limit) {
            Ok(result) => result,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                Err(ModuleFailure::Timeout(limit).into())
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => Err(ModuleFailure::Error(
                "module thread exited without a result".into(),
            )
            .into()),
        }
    }
}

/// Why an isolated module call produced no value.
#[derive(Debug)]
enum Interrupted {
    /// The metadata store could not be reached. Fails the whole pass.
    StoreUnavailable(ProviderError),
    /// Anything else. Charged to the module alone.
    Failed(ModuleFailure),
}

impl From<ModuleFailure> for Interrupted {
    fn from(failure: ModuleFailure) -> Self {
        Self::Failed(failure)
    }
}

/// Run `f`, converting returned errors and panics into an [`Interrupted`].
fn isolate<T>(f: impl FnOnce() -> Result<T, ModuleError>) -> Result<T, Interrupted> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(ModuleError::Provider(e @ ProviderError::Unavailable(_)))) => {
            Err(Interrupted::StoreUnavailable(e))
        }
        Ok(Err(e)) => Err(ModuleFailure::Error(e.to_string()).into()),
        Err(payload) => Err(ModuleFailure::Panic(panic_message(payload.as_ref())).into()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
