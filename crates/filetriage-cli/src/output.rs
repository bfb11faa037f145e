/// Plain-text rendering of pass reports, run summaries and the module list.
use filetriage_core::model::size::{format_elapsed, format_size};
use filetriage_core::pipeline::PassReport;
use filetriage_core::registry::ModuleInfo;
use std::io::{self, Write};
use std::time::Duration;

/// Totals for one `submit` or `monitor` run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub files: usize,
    pub bytes: u64,
    pub findings: usize,
    /// Module invocations that failed, summed over all passes.
    pub module_failures: usize,
    /// Passes that could not run at all.
    pub pass_errors: usize,
    /// Paths that could not be ingested.
    pub ingest_errors: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn add_report(&mut self, report: &PassReport) {
        self.findings += report.finding_count();
        self.module_failures += report.failure_count();
    }
}

/// One block per file: a header line, then its findings and module failures.
/// Files with neither are rendered as a single header line.
pub fn write_report(out: &mut dyn Write, report: &PassReport) -> io::Result<()> {
    writeln!(
        out,
        "{}  [{}]  {} finding(s), {} failure(s)  ({})",
        report.file_name,
        report.object_id,
        report.finding_count(),
        report.failure_count(),
        format_elapsed(report.elapsed)
    )?;
    for finding in report.findings() {
        writeln!(
            out,
            "  sev {:>2}  {:<13} {:<20} {}  {}",
            finding.severity().value(),
            finding.category().label(),
            finding.finding_name(),
            finding.origin_name(),
            finding.raw_data()
        )?;
    }
    for (module, failure) in report.failures() {
        writeln!(out, "  ! {module}: {failure}")?;
    }
    Ok(())
}

pub fn write_summary(out: &mut dyn Write, summary: &RunSummary) -> io::Result<()> {
    writeln!(
        out,
        "{} file(s), {} analysed in {}: {} finding(s), {} module failure(s)",
        summary.files,
        format_size(summary.bytes),
        format_elapsed(summary.elapsed),
        summary.findings,
        summary.module_failures
    )?;
    if summary.pass_errors > 0 || summary.ingest_errors > 0 {
        writeln!(
            out,
            "{} file(s) could not be ingested, {} pass(es) could not run",
            summary.ingest_errors, summary.pass_errors
        )?;
    }
    Ok(())
}

pub fn write_modules(out: &mut dyn Write, modules: &[ModuleInfo]) -> io::Result<()> {
    if modules.is_empty() {
        return writeln!(out, "No modules registered");
    }
    let width = modules.iter().map(|m| m.name.len()).max().unwrap_or(0);
    for module in modules {
        writeln!(
            out,
            "{:<width$}  [{}]  {}",
            module.name,
            module.workflows.join(", "),
            module.description
        )?;
    }
    Ok(())
}
