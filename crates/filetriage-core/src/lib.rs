/// FileTriage Core: module contract, registry, pipeline and ingestion.
///
/// This crate contains all analysis logic with zero CLI dependencies.
/// Frontends (the `filetriage` binary, tests, embedding services) build a
/// [`ModuleRegistry`], a metadata provider and a [`Pipeline`], then feed it
/// `object_id`s.
///
/// # Modules
///
/// - [`model`]: File records, findings and enrichment results.
/// - [`provider`]: The file metadata provider contract and an in-memory store.
/// - [`modules`]: The analyzer module trait and the built-in modules.
/// - [`registry`]: Module registry indexed by name and workflow.
/// - [`pipeline`]: Per-file orchestration with failure isolation.
/// - [`sink`]: Persistence boundary for aggregated findings.
/// - [`ingest`]: File submission and directory monitoring.
/// - [`config`]: Pipeline configuration.
pub mod config;
pub mod ingest;
pub mod model;
pub mod modules;
pub mod pipeline;
pub mod provider;
pub mod registry;
pub mod sink;

pub use config::PipelineConfig;
pub use pipeline::{Pipeline, PipelineError};
pub use registry::ModuleRegistry;
