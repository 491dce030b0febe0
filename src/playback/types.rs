//! Playback-related small types and handles.
//!
//! This module defines the playback state machine's states, the error type
//! shared by backends and the controller, and the snapshot published to the UI.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;

use crate::library::AudioRecord;

/// The single playback slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing(AudioRecord),
    Paused(AudioRecord),
}

impl PlaybackState {
    /// The record bound to the slot, `None` when idle.
    pub fn record(&self) -> Option<&AudioRecord> {
        match self {
            Self::Idle => None,
            Self::Playing(r) | Self::Paused(r) => Some(r),
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Stopped",
            Self::Playing(_) => "Playing",
            Self::Paused(_) => "Paused",
        }
    }
}

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("no audio output device: {0}")]
    Output(String),
    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path:?}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("audio output is unavailable")]
    Unavailable,
    #[error("player thread has stopped")]
    PlayerGone,
}

/// Runtime playback information shared with the UI.
#[derive(Debug, Clone, Default)]
pub struct NowPlaying {
    pub state: PlaybackState,
    /// Elapsed playback time for the current record.
    pub elapsed: Duration,
    /// Message of the last failed command, cleared by the next successful one.
    pub last_error: Option<String>,
}

pub type NowPlayingHandle = Arc<Mutex<NowPlaying>>;
