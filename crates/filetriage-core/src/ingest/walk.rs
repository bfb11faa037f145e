/// File discovery for ingestion, built on `jwalk`'s rayon-backed walker.
///
/// Directory arguments are expanded to the regular files beneath them
/// (direct children only unless `recursive`). File arguments pass through
/// unchanged. Unreadable entries are collected as errors rather than
/// aborting the walk.
use std::path::{Path, PathBuf};
use tracing::debug;

/// Files found by a walk, plus per-path errors.
#[derive(Debug, Default)]
pub struct WalkOutcome {
    /// Regular files, in argument order; sorted by path within each directory.
    pub files: Vec<PathBuf>,
    pub errors: Vec<(PathBuf, String)>,
}

/// Expand `roots` into the list of files to ingest.
///
/// `workers <= 1` walks on the calling thread; anything larger builds a
/// rayon pool of that size for the duration of the call.
pub fn collect_files(roots: &[PathBuf], recursive: bool, workers: usize) -> WalkOutcome {
    let mut outcome = WalkOutcome::default();
    for root in roots {
        if root.is_file() {
            outcome.files.push(root.clone());
        } else if root.is_dir() {
            walk_dir(root, recursive, workers, &mut outcome);
        } else {
            outcome
                .errors
                .push((root.clone(), "path does not exist or is not a regular file".into()));
        }
    }
    debug!(
        files = outcome.files.len(),
        errors = outcome.errors.len(),
        "Walk finished"
    );
    outcome
}

fn walk_dir(root: &Path, recursive: bool, workers: usize, outcome: &mut WalkOutcome) {
    let walker = jwalk::WalkDir::new(root)
        .skip_hidden(false)
        .follow_links(false)
        .sort(true)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .parallelism(parallelism(workers));

    for entry_result in walker {
        match entry_result {
            Ok(entry) => {
                if entry.file_type().is_file() {
                    outcome.files.push(entry.path());
                }
            }
            Err(err) => {
                let err_path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                outcome.errors.push((err_path, err.to_string()));
            }
        }
    }
}

pub(crate) fn parallelism(workers: usize) -> jwalk::Parallelism {
    if workers <= 1 {
        jwalk::Parallelism::Serial
    } else {
        jwalk::Parallelism::RayonNewPool(workers)
    }
}
