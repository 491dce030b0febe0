//! Playback: one decode session at a time, shared by every UI surface.
//!
//! `PlaybackController` is the state machine (idle / playing / paused) over an
//! `AudioBackend`. `PlayerService` runs it on its own thread and hands out
//! `PlayerHandle`s. `RodioBackend` is the real audio output.

mod backend;
mod controller;
mod rodio_backend;
mod service;
mod types;

pub use backend::{AudioBackend, DecodeSession, UnavailableBackend};
pub use controller::PlaybackController;
pub use rodio_backend::RodioBackend;
pub use service::{PlayerHandle, PlayerService};
pub use types::{NowPlaying, NowPlayingHandle, PlaybackError, PlaybackState};
