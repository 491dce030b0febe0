use std::path::Path;

use super::types::PlaybackError;

/// One prepared audio stream. Dropping the session releases it.
pub trait DecodeSession {
    fn start(&mut self);
    fn pause(&mut self);
    fn resume(&mut self);
    fn is_playing(&self) -> bool;
    /// True once the stream has been played to the end.
    fn is_finished(&self) -> bool;
}

/// The decode/output capability: turns a file path into a paused session.
pub trait AudioBackend {
    type Session: DecodeSession;

    fn open(&self, path: &Path) -> Result<Self::Session, PlaybackError>;
}

/// Stand-in used when no output device could be opened. Every `open` fails,
/// so the controller stays idle.
pub struct UnavailableBackend;

pub enum NoSession {}

impl DecodeSession for NoSession {
    fn start(&mut self) {
        match *self {}
    }

    fn pause(&mut self) {
        match *self {}
    }

    fn resume(&mut self) {
        match *self {}
    }

    fn is_playing(&self) -> bool {
        match *self {}
    }

    fn is_finished(&self) -> bool {
        match *self {}
    }
}

impl AudioBackend for UnavailableBackend {
    type Session = NoSession;

    fn open(&self, _path: &Path) -> Result<NoSession, PlaybackError> {
        Err(PlaybackError::Unavailable)
    }
}
