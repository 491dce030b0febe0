//! Merging scan results into the store, and the worker that serializes it.
//!
//! `LibrarySynchronizer::sync` is a plain per-record upsert, last write wins.
//! `SyncWorker` owns one background thread so a change notification and the
//! startup scan never run a sync concurrently.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::model::AudioRecord;
use super::scan::LibraryScanner;
use super::store::LibraryStore;

/// How a re-scanned record is merged with an existing row.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// Replace the whole row. A re-scan resets favorite and last-played.
    #[default]
    Replace,
    /// Refresh scanned metadata only; keep favorite and last-played.
    KeepUserState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub upserted: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct LibrarySynchronizer {
    store: LibraryStore,
    policy: MergePolicy,
}

impl LibrarySynchronizer {
    pub fn new(store: LibraryStore, policy: MergePolicy) -> Self {
        Self { store, policy }
    }

    /// Upsert every scanned record in order.
    ///
    /// Records are written one at a time: a failing record is logged and
    /// counted, earlier writes stay committed and later ones are still tried.
    /// Rows the scan no longer reports are left in place.
    pub fn sync<I>(&self, scanned: I) -> SyncReport
    where
        I: IntoIterator<Item = AudioRecord>,
    {
        let mut report = SyncReport::default();
        for record in scanned {
            let result = match self.policy {
                MergePolicy::Replace => self.store.upsert(&record),
                MergePolicy::KeepUserState => self.store.upsert_keeping_user_state(&record),
            };
            match result {
                Ok(()) => report.upserted += 1,
                Err(e) => {
                    warn!(path = %record.path, error = %e, "failed to store scanned record");
                    report.failed += 1;
                }
            }
        }

        if report.upserted > 0 || report.failed > 0 {
            info!(
                upserted = report.upserted,
                failed = report.failed,
                "library synced"
            );
        }
        report
    }

    /// Startup path: scan and sync only when the store has no records yet.
    pub fn sync_if_empty(&self, scanner: &LibraryScanner) -> Option<SyncReport> {
        match self.store.is_empty() {
            Ok(true) => Some(self.sync(scanner.scan())),
            Ok(false) => {
                debug!("store already populated, skipping startup scan");
                None
            }
            Err(e) => {
                warn!(error = %e, "could not read store, skipping startup scan");
                None
            }
        }
    }
}

/// Snapshot of the worker, shared with the UI.
#[derive(Debug, Clone, Default)]
pub struct SyncStatus {
    /// Number of completed sync passes.
    pub generation: u64,
    pub last_report: Option<SyncReport>,
    pub running: bool,
}

pub type SyncStatusHandle = Arc<Mutex<SyncStatus>>;

enum SyncCmd {
    Rescan { reply: Option<Sender<SyncReport>> },
    Quit,
}

/// Cheap, clonable sender side of a `SyncWorker`.
#[derive(Clone)]
pub struct SyncHandle {
    tx: Sender<SyncCmd>,
    status: SyncStatusHandle,
}

impl SyncHandle {
    /// Queue a full re-scan. Returns `false` once the worker has stopped.
    pub fn request_rescan(&self) -> bool {
        self.tx.send(SyncCmd::Rescan { reply: None }).is_ok()
    }

    /// Queue a re-scan and wait for the pass that serves it.
    pub fn rescan_blocking(&self) -> Option<SyncReport> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(SyncCmd::Rescan {
                reply: Some(reply_tx),
            })
            .ok()?;
        reply_rx.recv().ok()
    }

    pub fn status(&self) -> SyncStatus {
        self.status
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    pub fn generation(&self) -> u64 {
        self.status.lock().map(|s| s.generation).unwrap_or(0)
    }
}

pub struct SyncWorker {
    handle: SyncHandle,
    join: Option<JoinHandle<()>>,
}

impl SyncWorker {
    /// Start the worker thread.
    ///
    /// Requests that arrive within `debounce` of each other, or while a pass
    /// is running, are served by a single scan.
    pub fn spawn(
        scanner: LibraryScanner,
        synchronizer: LibrarySynchronizer,
        debounce: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<SyncCmd>();
        let status: SyncStatusHandle = Arc::new(Mutex::new(SyncStatus::default()));

        let status_for_thread = status.clone();
        let join = thread::Builder::new()
            .name("library-sync".into())
            .spawn(move || run_worker(rx, scanner, synchronizer, debounce, status_for_thread))
            .map_err(|e| warn!(error = %e, "failed to spawn library sync thread"))
            .ok();

        Self {
            handle: SyncHandle { tx, status },
            join,
        }
    }

    pub fn handle(&self) -> SyncHandle {
        self.handle.clone()
    }

    /// Stop the worker and wait for it. A pass already running completes.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.handle.tx.send(SyncCmd::Quit);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for SyncWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker(
    rx: Receiver<SyncCmd>,
    scanner: LibraryScanner,
    synchronizer: LibrarySynchronizer,
    debounce: Duration,
    status: SyncStatusHandle,
) {
    loop {
        let mut replies: Vec<Sender<SyncReport>> = Vec::new();
        match rx.recv() {
            Ok(SyncCmd::Rescan { reply }) => replies.extend(reply),
            Ok(SyncCmd::Quit) | Err(_) => break,
        }

        // Coalesce a burst of notifications into one pass.
        let mut quit = false;
        loop {
            match rx.recv_timeout(debounce) {
                Ok(SyncCmd::Rescan { reply }) => replies.extend(reply),
                Ok(SyncCmd::Quit) | Err(RecvTimeoutError::Disconnected) => {
                    quit = true;
                    break;
                }
                Err(RecvTimeoutError::Timeout) => break,
            }
        }
        if quit {
            break;
        }

        if let Ok(mut s) = status.lock() {
            s.running = true;
        }

        let report = synchronizer.sync(scanner.scan());

        if let Ok(mut s) = status.lock() {
            s.generation += 1;
            s.last_report = Some(report.clone());
            s.running = false;
        }
        for reply in replies {
            let _ = reply.send(report.clone());
        }
    }
    debug!("library sync worker stopped");
}
