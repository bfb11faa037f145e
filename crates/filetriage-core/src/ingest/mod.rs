/// Ingestion: turns files on disk into `FileRecord`s in the metadata store.
///
/// Two producers feed the pipeline:
/// - [`submit_paths`]: one-shot submission of files and directories
///   (optionally recursive) using a bounded worker pool.
/// - [`monitor::start_monitor`]: a background watcher that submits files
///   as they appear in a directory.
///
/// Both hand back `object_id`s; running the pipeline over them is the
/// caller's job.
pub mod monitor;
pub mod walk;

pub use monitor::{start_monitor, MonitorHandle, MonitorMessage, MonitorOptions};
pub use walk::{collect_files, WalkOutcome};

use crate::model::FileRecord;
use crate::provider::InMemoryStore;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to build ingestion worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),
}

/// Options shared by submission and monitoring.
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    /// Descend into subdirectories of directory arguments.
    pub recursive: bool,
    /// Threads used for walking and hashing.
    pub workers: usize,
    /// Recorded in each record's `extra.project`.
    pub project: Option<String>,
    /// Recorded in each record's `extra.agent_id`.
    pub agent_id: Option<String>,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            workers: num_cpus::get().max(1),
            project: None,
            agent_id: None,
        }
    }
}

/// One successfully ingested file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedFile {
    pub object_id: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Result of a submission run.
#[derive(Debug, Default)]
pub struct SubmitSummary {
    /// Ingested files, in walk order.
    pub files: Vec<SubmittedFile>,
    /// Paths that could not be ingested, with the reason.
    pub errors: Vec<(PathBuf, String)>,
}

impl SubmitSummary {
    pub fn object_ids(&self) -> Vec<String> {
        self.files.iter().map(|f| f.object_id.clone()).collect()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

/// Walk `paths`, build a record for every file and insert it into `store`.
pub fn submit_paths(
    paths: &[PathBuf],
    options: &SubmitOptions,
    store: &InMemoryStore,
) -> Result<SubmitSummary, IngestError> {
    let workers = options.workers.max(1);
    let walked = collect_files(paths, options.recursive, workers);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("filetriage-ingest-{i}"))
        .build()?;
    let records: Vec<(PathBuf, Result<FileRecord, IngestError>)> = pool.install(|| {
        walked
            .files
            .par_iter()
            .map(|path| (path.clone(), record_from_path(path, "submit", options)))
            .collect()
    });

    let mut summary = SubmitSummary {
        files: Vec::with_capacity(records.len()),
        errors: walked.errors,
    };
    for (path, record) in records {
        match record {
            Ok(record) => {
                let size = record.size;
                let object_id = store.insert(record);
                summary.files.push(SubmittedFile {
                    object_id,
                    path,
                    size,
                });
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable file");
                summary.errors.push((path, e.to_string()));
            }
        }
    }

    info!(
        submitted = summary.files.len(),
        errors = summary.errors.len(),
        bytes = summary.total_bytes(),
        "Submission complete"
    );
    Ok(summary)
}

/// Build a record for one file: name, size, mtime and SHA-256, under a fresh id.
pub fn record_from_path(
    path: &Path,
    source: &str,
    options: &SubmitOptions,
) -> Result<FileRecord, IngestError> {
    let io_err = |source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    };

    let metadata = std::fs::metadata(path).map_err(io_err)?;
    let mut file = File::open(path).map_err(io_err)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).map_err(io_err)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());

    let mut record = FileRecord::new(uuid::Uuid::new_v4().to_string(), file_name);
    record.path = Some(path.to_path_buf());
    record.size = metadata.len();
    record.sha256 = Some(hex::encode(hasher.finalize()));
    record.modified = metadata.modified().ok().map(DateTime::<Utc>::from);
    record
        .extra
        .insert("source".into(), Value::String(source.to_owned()));
    if let Some(project) = &options.project {
        record
            .extra
            .insert("project".into(), Value::String(project.clone()));
    }
    if let Some(agent) = &options.agent_id {
        record
            .extra
            .insert("agent_id".into(), Value::String(agent.clone()));
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::FileMetadataProvider;
    use tempfile::TempDir;

    #[test]
    fn record_carries_size_hash_and_tags() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("abc.txt");
        std::fs::write(&path, b"abc").unwrap();

        let options = SubmitOptions {
            project: Some("assess-test".into()),
            agent_id: Some("agent-1".into()),
            ..SubmitOptions::default()
        };
        let rec = record_from_path(&path, "submit", &options).unwrap();

        assert_eq!(rec.file_name, "abc.txt");
        assert_eq!(rec.size, 3);
        assert_eq!(
            rec.sha256.as_deref(),
            Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
        assert!(rec.modified.is_some());
        assert_eq!(rec.extra["source"], "submit");
        assert_eq!(rec.extra["project"], "assess-test");
        assert_eq!(rec.extra["agent_id"], "agent-1");
    }

    #[test]
    fn fresh_id_per_record() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("f");
        std::fs::write(&path, b"").unwrap();
        let a = record_from_path(&path, "submit", &SubmitOptions::default()).unwrap();
        let b = record_from_path(&path, "submit", &SubmitOptions::default()).unwrap();
        assert_ne!(a.object_id, b.object_id);
    }

    #[test]
    fn submit_inserts_every_file() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("one.txt"), b"1").unwrap();
        std::fs::write(tmp.path().join("two.txt"), b"22").unwrap();
        let store = InMemoryStore::new();

        let options = SubmitOptions {
            workers: 2,
            ..SubmitOptions::default()
        };
        let summary = submit_paths(&[tmp.path().to_path_buf()], &options, &store).unwrap();

        assert_eq!(summary.files.len(), 2);
        assert_eq!(summary.total_bytes(), 3);
        assert_eq!(store.len(), 2);
        for id in summary.object_ids() {
            assert!(store.get_file_metadata(&id).is_ok());
        }
    }
}
