/// Subcommand implementations.
///
/// Each command builds its own store, registry and pipeline from the
/// resolved configuration. Findings go to the caller-supplied writer (or the
/// `--output` file); the run summary is returned so the caller decides where
/// it is printed.
use crate::cli::{Cli, Command, MonitorArgs, OutputFormat, PipelineArgs, SubmitArgs};
use crate::output::{self, RunSummary};
use anyhow::{Context, Result};
use crossbeam_channel::RecvTimeoutError;
use filetriage_core::ingest::{
    start_monitor, submit_paths, MonitorMessage, MonitorOptions, SubmitOptions,
};
use filetriage_core::model::Finding;
use filetriage_core::pipeline::PassReport;
use filetriage_core::provider::{FileMetadataProvider, InMemoryStore};
use filetriage_core::sink::{write_csv, FindingSink, JsonLinesSink};
use filetriage_core::{ModuleRegistry, Pipeline, PipelineConfig};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, info_span, warn};

/// Longest single wait on the monitor channel, so time limits are noticed
/// even when no files arrive.
const MONITOR_WAIT_SLICE: Duration = Duration::from_millis(250);

/// Run the parsed command, writing its output to stdout and its summary to
/// stderr.
pub fn dispatch(cli: Cli) -> Result<()> {
    let stdout = io::stdout();
    match cli.command {
        Command::Submit(args) => {
            let config = resolve_config(cli.config.as_deref(), &args.pipeline)?;
            let summary = submit(&args, config, &mut io::stdout())?;
            output::write_summary(&mut io::stderr(), &summary)?;
        }
        Command::Monitor(args) => {
            let config = resolve_config(cli.config.as_deref(), &args.pipeline)?;
            let summary = monitor(&args, config, &mut stdout.lock())?;
            output::write_summary(&mut io::stderr(), &summary)?;
        }
        Command::Modules => {
            let registry = load_registry()?;
            output::write_modules(&mut stdout.lock(), &registry.modules())?;
        }
    }
    Ok(())
}

/// Read the configuration file (when given) and apply command-line overrides.
pub fn resolve_config(path: Option<&Path>, args: &PipelineArgs) -> Result<PipelineConfig> {
    let mut config = match path {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(workflow) = &args.workflow {
        config.default_workflow = workflow.clone();
    }
    if let Some(ms) = args.module_timeout_ms {
        config.module_timeout_ms = Some(ms);
    }
    if args.sequential {
        config.parallel_modules = false;
    }
    config.validate().context("invalid command-line options")?;
    Ok(config)
}

/// Ingest `args.paths`, run a pass per file and write the findings.
pub fn submit(
    args: &SubmitArgs,
    config: PipelineConfig,
    out: &mut (dyn Write + Send),
) -> Result<RunSummary> {
    let started = Instant::now();
    let store = Arc::new(InMemoryStore::new());
    let options = submit_options(&config, &args.pipeline, args.recursive);

    let submitted =
        submit_paths(&args.paths, &options, &store).context("failed to submit files")?;
    for (path, error) in &submitted.errors {
        warn!(path = %path.display(), error = %error, "Could not ingest");
    }

    let pipeline = build_pipeline(config, store)?;
    let workflow = pipeline.config().default_workflow.clone();
    let passes = pipeline
        .run_batch(&submitted.object_ids(), &workflow)
        .context("failed to start the analysis batch")?;

    let mut summary = RunSummary {
        files: submitted.files.len(),
        bytes: submitted.total_bytes(),
        ingest_errors: submitted.errors.len(),
        ..RunSummary::default()
    };
    let mut reports = Vec::with_capacity(passes.len());
    for (pass, file) in passes.into_iter().zip(&submitted.files) {
        match pass {
            Ok(report) => {
                summary.add_report(&report);
                reports.push(report);
            }
            Err(e) => {
                warn!(path = %file.path.display(), error = %e, "Pass failed");
                summary.pass_errors += 1;
            }
        }
    }

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_findings(&reports, args.format, BufWriter::new(file))?;
            info!(path = %path.display(), findings = summary.findings, "Findings written");
        }
        None => write_findings(&reports, args.format, &mut *out)?,
    }

    summary.elapsed = started.elapsed();
    Ok(summary)
}

/// Watch `args.path` and run a pass for every file the monitor submits.
///
/// Returns after `--max-files` passes, after `--duration-secs`, or when the
/// monitor stops on its own. Without either limit it runs until killed.
pub fn monitor(
    args: &MonitorArgs,
    config: PipelineConfig,
    out: &mut dyn Write,
) -> Result<RunSummary> {
    let started = Instant::now();
    let deadline = args
        .duration_secs
        .map(|secs| started + Duration::from_secs(secs));
    let store = Arc::new(InMemoryStore::new());
    let options = MonitorOptions {
        poll_interval: Duration::from_millis(args.poll_ms.max(1)),
        only_monitor: args.only_monitor,
        submit: submit_options(&config, &args.pipeline, true),
    };

    let pipeline = build_pipeline(config, store.clone())?;
    let workflow = pipeline.config().default_workflow.clone();
    let handle = start_monitor(args.path.clone(), store.clone(), options)
        .with_context(|| format!("failed to monitor {}", args.path.display()))?;
    info!(path = %args.path.display(), workflow = %workflow, "Monitoring for new files");

    let mut summary = RunSummary::default();
    loop {
        if args.max_files.is_some_and(|max| summary.files >= max) {
            break;
        }
        let wait = match deadline {
            Some(deadline) => {
                let left = deadline.saturating_duration_since(Instant::now());
                if left.is_zero() {
                    break;
                }
                left.min(MONITOR_WAIT_SLICE)
            }
            None => MONITOR_WAIT_SLICE,
        };

        match handle.receiver.recv_timeout(wait) {
            Ok(MonitorMessage::Submitted { object_id, path }) => {
                summary.files += 1;
                if let Ok(record) = store.get_file_metadata(&object_id) {
                    summary.bytes += record.size;
                }
                match pipeline.run(&object_id, &workflow) {
                    Ok(report) => {
                        log_findings(&report);
                        summary.add_report(&report);
                        output::write_report(out, &report)?;
                        out.flush()?;
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Pass failed");
                        summary.pass_errors += 1;
                    }
                }
            }
            Ok(MonitorMessage::Error { path, message }) => {
                warn!(path = %path.display(), error = %message, "Could not ingest");
                summary.ingest_errors += 1;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    handle.join();
    summary.elapsed = started.elapsed();
    Ok(summary)
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn load_registry() -> Result<ModuleRegistry> {
    ModuleRegistry::builtin(info_span!("registry")).context("failed to load built-in modules")
}

fn build_pipeline(config: PipelineConfig, store: Arc<InMemoryStore>) -> Result<Pipeline> {
    let registry = load_registry()?;
    info!(
        modules = registry.len(),
        workers = config.workers,
        parallel_modules = config.parallel_modules,
        "Pipeline ready"
    );
    Ok(Pipeline::new(Arc::new(registry), store, config).with_span(info_span!("pipeline")))
}

fn submit_options(config: &PipelineConfig, args: &PipelineArgs, recursive: bool) -> SubmitOptions {
    SubmitOptions {
        recursive,
        workers: config.workers,
        project: args.project.clone(),
        agent_id: args.agent_id.clone(),
    }
}

fn write_findings<W: Write + Send>(
    reports: &[PassReport],
    format: OutputFormat,
    mut writer: W,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for report in reports {
                output::write_report(&mut writer, report)?;
            }
            writer.flush()?;
        }
        OutputFormat::Json => {
            let sink = JsonLinesSink::new(writer);
            for report in reports {
                sink.store(&report.object_id, &report.aggregate())?;
            }
        }
        OutputFormat::Csv => {
            let findings: Vec<Finding> = reports.iter().flat_map(|r| r.aggregate()).collect();
            write_csv(&findings, writer)?;
        }
    }
    Ok(())
}

fn log_findings(report: &PassReport) {
    for finding in report.findings() {
        info!(
            file = %report.file_name,
            module = finding.origin_name(),
            finding = finding.finding_name(),
            severity = finding.severity().value(),
            "Finding"
        );
    }
}
