use std::path::{Path, PathBuf};

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::index::{is_audio_file, normalized_extensions};
use super::sync::SyncHandle;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to create file watcher: {0}")]
    Create(#[source] notify::Error),
    #[error("failed to watch {path:?}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Requests a full re-scan whenever the media root changes.
///
/// Notifications carry no payload to the worker; every relevant event just
/// queues a rescan. Dropping the watcher unregisters it.
pub struct ChangeWatcher {
    _watcher: RecommendedWatcher,
    sync: SyncHandle,
}

impl ChangeWatcher {
    pub fn start(root: &Path, extensions: &[String], sync: SyncHandle) -> Result<Self, WatchError> {
        let extensions = normalized_extensions(extensions);
        let on_event = sync.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if is_library_change(&event, &extensions) {
                    debug!(kind = ?event.kind, "media root changed, requesting rescan");
                    on_event.request_rescan();
                }
            }
            Err(e) => warn!(error = %e, "file watcher error"),
        })
        .map_err(WatchError::Create)?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|source| WatchError::Watch {
                path: root.to_path_buf(),
                source,
            })?;

        info!(root = %root.display(), "watching media root for changes");
        Ok(Self {
            _watcher: watcher,
            sync,
        })
    }

    /// Same effect as a storage-change notification.
    pub fn on_change(&self) -> bool {
        self.sync.request_rescan()
    }
}

/// Creates, removals, renames and content writes of audio files (or of
/// extension-less paths, which covers directories) count as changes.
/// Metadata-only events such as access-time updates do not.
pub(crate) fn is_library_change(event: &Event, extensions: &[String]) -> bool {
    let relevant_kind = match event.kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    };

    relevant_kind
        && event
            .paths
            .iter()
            .any(|p| p.extension().is_none() || is_audio_file(p, extensions))
}
