/// Command-line arguments.
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "filetriage",
    version,
    about = "Run analyzer modules over files and report their findings"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Enable debug logging")]
    pub debug: bool,
    #[arg(long, global = true, value_name = "FILE", help = "JSON pipeline configuration file")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ingest files or directories and run the pipeline over each file.
    Submit(SubmitArgs),
    /// Watch a directory and run the pipeline over each new file.
    Monitor(MonitorArgs),
    /// List the registered analyzer modules.
    Modules,
}

/// Pipeline settings shared by `submit` and `monitor`. Each one overrides
/// the configuration file when given.
#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    #[arg(short, long, value_name = "N", help = "Worker threads")]
    pub workers: Option<usize>,
    #[arg(long, value_name = "NAME", help = "Workflow to run")]
    pub workflow: Option<String>,
    #[arg(long, value_name = "MS", help = "Per-module processing time limit")]
    pub module_timeout_ms: Option<u64>,
    #[arg(long, help = "Run the modules of a pass one after another")]
    pub sequential: bool,
    #[arg(long, help = "Project name recorded on each submitted file")]
    pub project: Option<String>,
    #[arg(long, help = "Agent identifier recorded on each submitted file")]
    pub agent_id: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SubmitArgs {
    #[arg(required = true, value_name = "PATHS")]
    pub paths: Vec<PathBuf>,
    #[arg(short, long, help = "Descend into subdirectories")]
    pub recursive: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    #[arg(short, long, value_name = "FILE", help = "Write findings to FILE instead of stdout")]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

#[derive(Args, Debug, Clone)]
pub struct MonitorArgs {
    pub path: PathBuf,
    #[arg(long, help = "Ignore files already present when monitoring starts")]
    pub only_monitor: bool,
    #[arg(long, value_name = "MS", default_value_t = 1_000)]
    pub poll_ms: u64,
    #[arg(long, value_name = "N", help = "Stop after processing N files")]
    pub max_files: Option<usize>,
    #[arg(long, value_name = "SECS", help = "Stop after SECS seconds")]
    pub duration_secs: Option<u64>,
    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable report.
    Text,
    /// One JSON object per finding.
    Json,
    /// CSV with a header row.
    Csv,
}
