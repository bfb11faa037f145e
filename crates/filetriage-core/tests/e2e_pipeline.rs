/// End-to-end pipeline tests.
///
/// Files are written to a real temporary directory, ingested with
/// `submit_paths`, and run through the built-in registry plus extra test
/// modules. This covers ingestion, metadata lookup, module selection,
/// failure isolation and aggregation together, with no mocking of the
/// filesystem.
use filetriage_core::ingest::{submit_paths, SubmitOptions};
use filetriage_core::model::{EnrichmentResult, FindingCategory};
use filetriage_core::modules::{
    AnalyzerModule, ModuleError, ProcessResult, BUILTIN_MODULES, DEFAULT_WORKFLOW,
};
use filetriage_core::pipeline::{ModuleFailure, ModuleOutcome};
use filetriage_core::provider::{FileMetadataProvider, InMemoryStore};
use filetriage_core::sink::{JsonLinesSink, MemorySink};
use filetriage_core::{ModuleRegistry, Pipeline, PipelineConfig};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tracing::Span;

// ── Helpers ──────────────────────────────────────────────────────────────────

/// A module that always fails, registered in the default workflow.
struct AlwaysFails {
    workflows: Vec<String>,
}

impl AnalyzerModule for AlwaysFails {
    fn name(&self) -> &str {
        "always_fails"
    }

    fn workflows(&self) -> &[String] {
        &self.workflows
    }

    fn should_process(&self, _: &str, _: &dyn FileMetadataProvider) -> Result<bool, ModuleError> {
        Ok(true)
    }

    fn process(&self, _: &str, _: &dyn FileMetadataProvider) -> ProcessResult {
        Err(ModuleError::failed("simulated parser crash"))
    }
}

/// Reports every file's size, but only for files with a `.zip` extension.
struct ZipSizer {
    workflows: Vec<String>,
}

impl AnalyzerModule for ZipSizer {
    fn name(&self) -> &str {
        "zip_sizer"
    }

    fn workflows(&self) -> &[String] {
        &self.workflows
    }

    fn should_process(
        &self,
        object_id: &str,
        files: &dyn FileMetadataProvider,
    ) -> Result<bool, ModuleError> {
        Ok(files.get_file_metadata(object_id)?.extension() == "zip")
    }

    fn process(&self, object_id: &str, files: &dyn FileMetadataProvider) -> ProcessResult {
        let record = files.get_file_metadata(object_id)?;
        Ok(Some(
            EnrichmentResult::new("zip_sizer").with_result("size", json!(record.size)),
        ))
    }
}

fn write(dir: &Path, name: &str, body: &[u8]) {
    std::fs::write(dir.join(name), body).unwrap();
}

struct Harness {
    _tmp: TempDir,
    store: Arc<InMemoryStore>,
    ids_by_name: Vec<(String, String)>,
}

impl Harness {
    fn new(files: &[&str]) -> Self {
        let tmp = TempDir::new().unwrap();
        for name in files {
            write(tmp.path(), name, name.as_bytes());
        }
        let store = Arc::new(InMemoryStore::new());
        let summary = submit_paths(
            &[tmp.path().to_path_buf()],
            &SubmitOptions {
                workers: 2,
                ..SubmitOptions::default()
            },
            &store,
        )
        .unwrap();
        assert!(summary.errors.is_empty(), "ingest errors: {:?}", summary.errors);

        let ids_by_name = summary
            .files
            .iter()
            .map(|f| {
                let name = f.path.file_name().unwrap().to_string_lossy().into_owned();
                (name, f.object_id.clone())
            })
            .collect();
        Self {
            _tmp: tmp,
            store,
            ids_by_name,
        }
    }

    fn id(&self, name: &str) -> &str {
        &self
            .ids_by_name
            .iter()
            .find(|(n, _)| n == name)
            .unwrap_or_else(|| panic!("{name} was not ingested"))
            .1
    }

    fn pipeline(&self, registry: ModuleRegistry) -> Pipeline {
        Pipeline::new(
            Arc::new(registry),
            self.store.clone(),
            PipelineConfig::default(),
        )
        .with_span(Span::none())
    }
}

fn builtin() -> ModuleRegistry {
    ModuleRegistry::builtin(Span::none()).unwrap()
}

// ── Reference module scenarios ───────────────────────────────────────────────

#[test]
fn password_backup_yields_misc_finding() {
    let h = Harness::new(&["my_password_backup.zip"]);
    let report = h
        .pipeline(builtin())
        .run(h.id("my_password_backup.zip"), DEFAULT_WORKFLOW)
        .unwrap();

    let findings: Vec<_> = report.findings().collect();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].category(), FindingCategory::Misc);
    assert_eq!(findings[0].severity().value(), 4);
    assert_eq!(findings[0].raw_data()["matches"], json!(["password"]));
    assert_eq!(findings[0].object_id(), h.id("my_password_backup.zip"));
}

#[test]
fn readme_yields_nothing() {
    let h = Harness::new(&["readme.txt"]);
    let report = h
        .pipeline(builtin())
        .run(h.id("readme.txt"), DEFAULT_WORKFLOW)
        .unwrap();
    assert_eq!(report.finding_count(), 0);
    assert_eq!(
        report.outcome_of("filename_scanner"),
        Some(&ModuleOutcome::NoFinding)
    );
}

#[test]
fn wp_config_backup_matches_wp_config() {
    let h = Harness::new(&["wp-config.php.bak"]);
    let report = h
        .pipeline(builtin())
        .run(h.id("wp-config.php.bak"), DEFAULT_WORKFLOW)
        .unwrap();
    let f = report.findings().next().unwrap();
    assert_eq!(f.raw_data()["matches"], json!(["wp-config"]));
}

/// A failing sibling in the default workflow does not cost the reference
/// module its finding, and the failure is not a pipeline error.
#[test]
fn failing_sibling_does_not_hide_reference_finding() {
    let h = Harness::new(&["secret_password_backup.txt"]);
    let mut registry = ModuleRegistry::with_span(Span::none());
    registry
        .register(Box::new(AlwaysFails {
            workflows: vec![DEFAULT_WORKFLOW.to_owned()],
        }))
        .unwrap();
    registry.register_factories(BUILTIN_MODULES).unwrap();

    let report = h
        .pipeline(registry)
        .run(h.id("secret_password_backup.txt"), DEFAULT_WORKFLOW)
        .unwrap();

    assert_eq!(report.finding_count(), 1);
    assert_eq!(
        report.findings().next().unwrap().raw_data()["matches"],
        json!(["password", "secret"])
    );
    assert_eq!(
        report.outcome_of("always_fails"),
        Some(&ModuleOutcome::Failed(ModuleFailure::Error(
            "simulated parser crash".into()
        )))
    );
}

// ── Workflow selection ───────────────────────────────────────────────────────

#[test]
fn workflow_selects_its_modules_only() {
    let h = Harness::new(&["archive.zip", "notes.txt"]);
    let mut registry = builtin();
    registry
        .register(Box::new(ZipSizer {
            workflows: vec!["archives".into()],
        }))
        .unwrap();
    let p = h.pipeline(registry);

    let default = p.run(h.id("archive.zip"), DEFAULT_WORKFLOW).unwrap();
    assert!(default.outcome_of("zip_sizer").is_none());

    let archives = p.run(h.id("archive.zip"), "archives").unwrap();
    assert!(archives.outcome_of("filename_scanner").is_none());
    let result = archives.enrichments().next().unwrap();
    assert_eq!(result.results["size"], json!("archive.zip".len()));
    // An enrichment with no findings contributes nothing to the aggregate.
    assert_eq!(archives.finding_count(), 0);

    let skipped = p.run(h.id("notes.txt"), "archives").unwrap();
    assert_eq!(skipped.outcome_of("zip_sizer"), Some(&ModuleOutcome::Skipped));
}

// ── Batches and sinks ────────────────────────────────────────────────────────

#[test]
fn batch_over_directory_stores_each_pass() {
    let names = ["a_token.txt", "plain.txt", "classified-login.doc", "photo.jpg"];
    let h = Harness::new(&names);
    let p = h.pipeline(builtin());
    let ids: Vec<String> = names.iter().map(|n| h.id(n).to_owned()).collect();

    let results = p.run_batch(&ids, DEFAULT_WORKFLOW).unwrap();
    let counts: Vec<usize> = results
        .iter()
        .map(|r| r.as_ref().unwrap().finding_count())
        .collect();
    assert_eq!(counts, vec![1, 0, 1, 0]);

    let sink = MemorySink::new();
    for id in &ids {
        p.run_and_store(id, DEFAULT_WORKFLOW, &sink).unwrap();
    }
    assert_eq!(sink.pass_count(), 4);
    let classified = sink.findings_for(h.id("classified-login.doc"));
    assert_eq!(classified[0].raw_data()["matches"], json!(["login", "classified"]));
}

#[test]
fn json_lines_sink_receives_findings() {
    let h = Harness::new(&["private_key_backup"]);
    let p = h.pipeline(builtin());
    let sink = JsonLinesSink::new(Vec::new());
    p.run_and_store(h.id("private_key_backup"), DEFAULT_WORKFLOW, &sink)
        .unwrap();

    let text = String::from_utf8(sink.into_inner()).unwrap();
    let line: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
    assert_eq!(line["finding_name"], "sensitive_filename");
    assert_eq!(line["raw_data"]["matches"], json!(["private"]));
    assert_eq!(line["severity"], 4);
}

#[test]
fn re_running_a_pass_is_idempotent() {
    let h = Harness::new(&["oauth_bearer.json"]);
    let p = h.pipeline(builtin());
    let a = p.run(h.id("oauth_bearer.json"), DEFAULT_WORKFLOW).unwrap();
    let b = p.run(h.id("oauth_bearer.json"), DEFAULT_WORKFLOW).unwrap();
    assert_eq!(a.aggregate(), b.aggregate());
}
