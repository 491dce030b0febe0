use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config;
use crate::library::{
    ChangeWatcher, FsMediaIndex, LibraryScanner, LibraryStore, LibrarySynchronizer, StoreError,
    SyncHandle, SyncWorker,
};

/// Everything on the library side that lives for the whole session.
pub struct Library {
    pub store: LibraryStore,
    pub root: PathBuf,
    pub sync: SyncHandle,
    worker: SyncWorker,
    watcher: Option<ChangeWatcher>,
}

impl Library {
    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    /// Unregister the watcher first so no rescan is queued during shutdown.
    pub fn shutdown(self) {
        drop(self.watcher);
        self.worker.shutdown();
    }
}

/// Open the store, fill it on first run, then start the sync worker and
/// the change watcher.
///
/// Only a store that cannot be opened is fatal.
pub fn open_library(settings: &config::Settings, root: &Path) -> Result<Library, StoreError> {
    let store_path = settings.store_path();
    let store = LibraryStore::open(&store_path)?;
    info!(store = %store_path.display(), root = %root.display(), "library opened");

    let index = Arc::new(FsMediaIndex::new(root, settings.library.clone()));
    let scanner = LibraryScanner::new(index, settings.library.artwork_base.clone());
    let synchronizer = LibrarySynchronizer::new(store.clone(), settings.merge_policy());

    if let Some(report) = synchronizer.sync_if_empty(&scanner) {
        info!(
            upserted = report.upserted,
            failed = report.failed,
            "initial library sync"
        );
    }

    let worker = SyncWorker::spawn(
        scanner,
        synchronizer,
        Duration::from_millis(settings.sync.debounce_ms),
    );
    let sync = worker.handle();

    let watcher = if settings.sync.watch {
        match ChangeWatcher::start(root, &settings.library.extensions, sync.clone()) {
            Ok(w) => Some(w),
            Err(e) => {
                warn!(error = %e, "library changes will not be picked up until a manual rescan");
                None
            }
        }
    } else {
        None
    };

    Ok(Library {
        store,
        root: root.to_path_buf(),
        sync,
        worker,
        watcher,
    })
}
