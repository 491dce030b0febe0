//! `rodio` implementation of the decode/output capability.
//!
//! Opening a path decodes the file into a fresh `Sink` that starts paused;
//! dropping the session stops the sink.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};

use super::backend::{AudioBackend, DecodeSession};
use super::types::PlaybackError;

pub struct RodioBackend {
    stream: OutputStream,
}

impl RodioBackend {
    /// Open the default output device.
    pub fn open_default() -> Result<Self, PlaybackError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| PlaybackError::Output(e.to_string()))?;
        // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
        // but noisy for a TUI app.
        stream.log_on_drop(false);
        Ok(Self { stream })
    }
}

pub struct RodioSession {
    sink: Sink,
}

impl AudioBackend for RodioBackend {
    type Session = RodioSession;

    fn open(&self, path: &Path) -> Result<RodioSession, PlaybackError> {
        let file = File::open(path).map_err(|source| PlaybackError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let source = Decoder::new(BufReader::new(file)).map_err(|e| PlaybackError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let sink = Sink::connect_new(self.stream.mixer());
        sink.append(source);
        sink.pause();
        Ok(RodioSession { sink })
    }
}

impl DecodeSession for RodioSession {
    fn start(&mut self) {
        self.sink.play();
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn resume(&mut self) {
        self.sink.play();
    }

    fn is_playing(&self) -> bool {
        !self.sink.is_paused() && !self.sink.empty()
    }

    fn is_finished(&self) -> bool {
        self.sink.empty()
    }
}

impl Drop for RodioSession {
    fn drop(&mut self) {
        self.sink.stop();
    }
}
