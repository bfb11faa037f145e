/// Directory monitor: watches a folder and submits new files as they appear.
///
/// Portable polling design: a background thread re-walks the directory every
/// `poll_interval` and compares it with what it has already submitted. A new
/// file is submitted only once its size is unchanged across two consecutive
/// polls, so files still being written are not picked up half-finished.
///
/// # Usage
///
/// ```ignore
/// let handle = start_monitor(PathBuf::from("/srv/drop"), store, MonitorOptions::default())?;
/// for msg in handle.receiver.iter() { /* run the pipeline */ }
/// handle.stop();
/// ```
///
/// # Cancellation
///
/// [`MonitorHandle::stop`] sets a flag the thread checks every 50 ms while
/// sleeping between polls. The thread also exits when the receiver is dropped.
use crate::ingest::{collect_files, record_from_path, IngestError, SubmitOptions};
use crate::provider::InMemoryStore;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Capacity of the monitor → consumer channel.
pub const MONITOR_CHANNEL_CAPACITY: usize = 2_048;

const CANCEL_CHECK: Duration = Duration::from_millis(50);

/// Poll walks run serially on the monitor thread.
const POLL_WALK_WORKERS: usize = 1;

#[derive(Debug, Clone)]
pub struct MonitorOptions {
    pub poll_interval: Duration,
    /// Ignore files already present when monitoring starts.
    pub only_monitor: bool,
    /// `recursive` and the metadata tags are honoured; `workers` is unused.
    pub submit: SubmitOptions,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            only_monitor: false,
            submit: SubmitOptions {
                recursive: true,
                ..SubmitOptions::default()
            },
        }
    }
}

/// Message sent from the monitor thread to its consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorMessage {
    /// A file was ingested into the store.
    Submitted { object_id: String, path: PathBuf },
    /// A file was seen but could not be ingested.
    Error { path: PathBuf, message: String },
}

/// Handle to a running monitor.
pub struct MonitorHandle {
    cancel: Arc<AtomicBool>,
    /// Receive [`MonitorMessage`]s from the background thread.
    pub receiver: Receiver<MonitorMessage>,
    thread: Option<thread::JoinHandle<()>>,
}

impl MonitorHandle {
    /// Signal the background thread to stop. Non-blocking.
    pub fn stop(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Stop and wait for the background thread to exit.
    pub fn join(mut self) {
        self.stop();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Start watching `root`, inserting new files into `store`.
pub fn start_monitor(
    root: PathBuf,
    store: Arc<InMemoryStore>,
    options: MonitorOptions,
) -> Result<MonitorHandle, IngestError> {
    if !root.is_dir() {
        return Err(IngestError::NotADirectory(root));
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_clone = Arc::clone(&cancel);
    let (tx, rx) = bounded::<MonitorMessage>(MONITOR_CHANNEL_CAPACITY);

    let thread_root = root.clone();
    let thread = thread::Builder::new()
        .name("filetriage-monitor".to_owned())
        .spawn(move || run_monitor(thread_root, store, options, cancel_clone, tx))
        .map_err(|source| IngestError::Io { path: root, source })?;

    Ok(MonitorHandle {
        cancel,
        receiver: rx,
        thread: Some(thread),
    })
}

// ─── Background thread ──────────────────────────────────────────────────────

fn run_monitor(
    root: PathBuf,
    store: Arc<InMemoryStore>,
    options: MonitorOptions,
    cancel: Arc<AtomicBool>,
    tx: Sender<MonitorMessage>,
) {
    info!(path = %root.display(), only_monitor = options.only_monitor, "Monitor started");
    let roots = [root.clone()];
    let recursive = options.submit.recursive;

    let mut submitted: HashSet<PathBuf> = HashSet::new();
    // Files seen once, keyed to the size observed at that poll.
    let mut pending: HashMap<PathBuf, u64> = HashMap::new();

    if options.only_monitor {
        submitted.extend(collect_files(&roots, recursive, POLL_WALK_WORKERS).files);
        debug!(existing = submitted.len(), "Ignoring pre-existing files");
    }

    loop {
        if cancel.load(Ordering::Relaxed) {
            break;
        }

        let walked = collect_files(&roots, recursive, POLL_WALK_WORKERS);
        let mut still_pending = HashMap::with_capacity(pending.len());

        for path in walked.files {
            if submitted.contains(&path) {
                continue;
            }
            let Ok(size) = std::fs::metadata(&path).map(|m| m.len()) else {
                continue;
            };
            let stable = pending.get(&path) == Some(&size);
            if !stable {
                still_pending.insert(path, size);
                continue;
            }

            let message = match record_from_path(&path, "monitor", &options.submit) {
                Ok(record) => {
                    let object_id = store.insert(record);
                    debug!(path = %path.display(), object_id = %object_id, "Submitted new file");
                    MonitorMessage::Submitted {
                        object_id,
                        path: path.clone(),
                    }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to ingest file");
                    MonitorMessage::Error {
                        path: path.clone(),
                        message: e.to_string(),
                    }
                }
            };
            submitted.insert(path);
            if tx.send(message).is_err() {
                debug!("Monitor receiver dropped; stopping");
                return;
            }
        }
        pending = still_pending;

        if !sleep_unless_cancelled(options.poll_interval, &cancel) {
            break;
        }
    }

    info!(path = %root.display(), submitted = submitted.len(), "Monitor stopped");
}

/// Sleep for `duration` in short slices. Returns `false` if cancelled.
fn sleep_unless_cancelled(duration: Duration, cancel: &AtomicBool) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if cancel.load(Ordering::Relaxed) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep(CANCEL_CHECK.min(deadline - now));
    }
}
