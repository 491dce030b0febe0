use std::path::Path;

use tracing::{debug, warn};

use crate::library::{AudioRecord, LibraryStore};

use super::backend::{AudioBackend, DecodeSession};
use super::types::{PlaybackError, PlaybackState};

/// Owns at most one decode session and the state of the playback slot.
///
/// Not thread-safe by itself: one context drives it (see `PlayerService`).
/// The session is released whenever the slot goes idle, before a new one is
/// opened, and when the controller is dropped.
pub struct PlaybackController<B: AudioBackend> {
    backend: B,
    store: LibraryStore,
    session: Option<B::Session>,
    state: PlaybackState,
}

impl<B: AudioBackend> PlaybackController<B> {
    pub fn new(backend: B, store: LibraryStore) -> Self {
        Self {
            backend,
            store,
            session: None,
            state: PlaybackState::Idle,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn current_record(&self) -> Option<&AudioRecord> {
        self.state.record()
    }

    /// Whether `path` is bound to the slot (playing or paused).
    pub fn is_current(&self, path: &str) -> bool {
        self.current_record().is_some_and(|r| r.path == path)
    }

    /// Replace whatever is active with `record` and start it.
    ///
    /// On failure the slot is left idle; the error is logged and returned.
    pub fn play(&mut self, record: AudioRecord) -> Result<(), PlaybackError> {
        self.release();

        let mut session = match self.backend.open(Path::new(&record.path)) {
            Ok(session) => session,
            Err(e) => {
                warn!(path = %record.path, error = %e, "could not start playback");
                return Err(e);
            }
        };
        session.start();
        self.session = Some(session);

        match self.store.touch_last_played(&record.path) {
            Ok(true) => {}
            Ok(false) => debug!(path = %record.path, "playing a record the store does not know"),
            Err(e) => warn!(path = %record.path, error = %e, "failed to record last played time"),
        }

        self.state = PlaybackState::Playing(record);
        Ok(())
    }

    pub fn pause(&mut self) {
        self.state = match std::mem::take(&mut self.state) {
            PlaybackState::Playing(record) => {
                if let Some(session) = self.session.as_mut() {
                    session.pause();
                }
                PlaybackState::Paused(record)
            }
            other => other,
        };
    }

    pub fn resume(&mut self) {
        self.state = match std::mem::take(&mut self.state) {
            PlaybackState::Paused(record) => {
                if let Some(session) = self.session.as_mut() {
                    session.resume();
                }
                PlaybackState::Playing(record)
            }
            other => other,
        };
    }

    pub fn stop(&mut self) {
        self.release();
    }

    /// Pause when `target` is playing, resume when it is paused, otherwise
    /// play it in place of the current record.
    pub fn toggle(&mut self, target: AudioRecord) -> Result<(), PlaybackError> {
        if self.is_current(&target.path) {
            if self.is_playing() {
                self.pause();
            } else {
                self.resume();
            }
            return Ok(());
        }
        self.play(target)
    }

    /// Go idle once the playing stream has drained. Returns true on that transition.
    pub fn poll(&mut self) -> bool {
        let finished = self.state.is_playing()
            && self.session.as_ref().is_none_or(|s| s.is_finished());
        if finished {
            debug!("playback reached the end of the stream");
            self.release();
        }
        finished
    }

    fn release(&mut self) {
        // Dropping the session stops it.
        self.session = None;
        self.state = PlaybackState::Idle;
    }
}
