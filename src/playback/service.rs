//! The player thread and the handle shared by every UI surface.
//!
//! The thread owns the backend and the `PlaybackController`; handles send it
//! commands and wait for the controller to apply them, so a call returns
//! only once the new state is in place. Reads go through a `NowPlaying`
//! snapshot the thread republishes after every command and on each tick.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::library::{AudioRecord, LibraryStore};

use super::backend::{AudioBackend, UnavailableBackend};
use super::controller::PlaybackController;
use super::types::{NowPlaying, NowPlayingHandle, PlaybackError};

const TICK: Duration = Duration::from_millis(200);

#[derive(Debug)]
enum PlayerCmd {
    Play(AudioRecord),
    Toggle(AudioRecord),
    Pause,
    Resume,
    Stop,
}

enum PlayerMsg {
    Cmd(PlayerCmd, Sender<Result<(), PlaybackError>>),
    Quit,
}

/// Shared-ownership handle to the single playback controller.
#[derive(Clone)]
pub struct PlayerHandle {
    tx: Sender<PlayerMsg>,
    now_playing: NowPlayingHandle,
}

impl PlayerHandle {
    fn call(&self, cmd: PlayerCmd) -> Result<(), PlaybackError> {
        let (done_tx, done_rx) = mpsc::channel();
        self.tx
            .send(PlayerMsg::Cmd(cmd, done_tx))
            .map_err(|_| PlaybackError::PlayerGone)?;
        done_rx.recv().map_err(|_| PlaybackError::PlayerGone)?
    }

    pub fn play(&self, record: AudioRecord) -> Result<(), PlaybackError> {
        self.call(PlayerCmd::Play(record))
    }

    pub fn toggle(&self, record: AudioRecord) -> Result<(), PlaybackError> {
        self.call(PlayerCmd::Toggle(record))
    }

    pub fn pause(&self) -> Result<(), PlaybackError> {
        self.call(PlayerCmd::Pause)
    }

    pub fn resume(&self) -> Result<(), PlaybackError> {
        self.call(PlayerCmd::Resume)
    }

    pub fn stop(&self) -> Result<(), PlaybackError> {
        self.call(PlayerCmd::Stop)
    }

    pub fn now_playing(&self) -> NowPlaying {
        self.now_playing
            .lock()
            .map(|info| info.clone())
            .unwrap_or_default()
    }

    pub fn is_playing(&self) -> bool {
        self.now_playing
            .lock()
            .map(|info| info.state.is_playing())
            .unwrap_or(false)
    }

    pub fn current_record(&self) -> Option<AudioRecord> {
        self.now_playing
            .lock()
            .ok()
            .and_then(|info| info.state.record().cloned())
    }
}

pub struct PlayerService {
    handle: PlayerHandle,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl PlayerService {
    /// Start the player thread.
    ///
    /// `make_backend` runs on that thread, so backends that must stay on the
    /// thread that created them are fine. When it fails the player still
    /// runs and every `play` leaves the slot idle.
    pub fn spawn<B, F>(store: LibraryStore, make_backend: F) -> Self
    where
        B: AudioBackend + 'static,
        F: FnOnce() -> Result<B, PlaybackError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<PlayerMsg>();
        let now_playing: NowPlayingHandle = Arc::new(Mutex::new(NowPlaying::default()));

        let info_for_thread = now_playing.clone();
        let join = thread::Builder::new()
            .name("player".into())
            .spawn(move || match make_backend() {
                Ok(backend) => {
                    serve(PlaybackController::new(backend, store), rx, info_for_thread);
                }
                Err(e) => {
                    warn!(error = %e, "audio output unavailable, playback disabled");
                    serve(
                        PlaybackController::new(UnavailableBackend, store),
                        rx,
                        info_for_thread,
                    );
                }
            })
            .map_err(|e| warn!(error = %e, "failed to spawn player thread"))
            .ok();

        Self {
            handle: PlayerHandle { tx, now_playing },
            join: Mutex::new(join),
        }
    }

    pub fn handle(&self) -> PlayerHandle {
        self.handle.clone()
    }

    /// Stop playback, release the session and join the player thread.
    pub fn shutdown(&self) {
        let _ = self.handle.tx.send(PlayerMsg::Quit);

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

impl Drop for PlayerService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Elapsed-time bookkeeping for the current record.
#[derive(Default)]
struct PlayClock {
    started_at: Option<Instant>,
    accumulated: Duration,
}

impl PlayClock {
    fn restart(&mut self) {
        self.started_at = Some(Instant::now());
        self.accumulated = Duration::ZERO;
    }

    fn pause(&mut self) {
        if let Some(st) = self.started_at.take() {
            self.accumulated += st.elapsed();
        }
    }

    fn resume(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn elapsed(&self) -> Duration {
        self.accumulated + self.started_at.map_or(Duration::ZERO, |st| st.elapsed())
    }
}

fn apply<B: AudioBackend>(
    controller: &mut PlaybackController<B>,
    clock: &mut PlayClock,
    cmd: PlayerCmd,
) -> Result<(), PlaybackError> {
    debug!(?cmd, "player command");
    match cmd {
        PlayerCmd::Play(record) => {
            let result = controller.play(record);
            if result.is_ok() {
                clock.restart();
            } else {
                clock.reset();
            }
            result
        }
        PlayerCmd::Toggle(record) => {
            if controller.is_current(&record.path) {
                controller.toggle(record)?;
                if controller.is_playing() {
                    clock.resume();
                } else {
                    clock.pause();
                }
                Ok(())
            } else {
                let result = controller.toggle(record);
                if result.is_ok() {
                    clock.restart();
                } else {
                    clock.reset();
                }
                result
            }
        }
        PlayerCmd::Pause => {
            controller.pause();
            clock.pause();
            Ok(())
        }
        PlayerCmd::Resume => {
            controller.resume();
            if controller.is_playing() {
                clock.resume();
            }
            Ok(())
        }
        PlayerCmd::Stop => {
            controller.stop();
            clock.reset();
            Ok(())
        }
    }
}

fn publish<B: AudioBackend>(
    controller: &PlaybackController<B>,
    clock: &PlayClock,
    now_playing: &NowPlayingHandle,
    outcome: Option<&Result<(), PlaybackError>>,
) {
    if let Ok(mut info) = now_playing.lock() {
        info.state = controller.state().clone();
        info.elapsed = clock.elapsed();
        match outcome {
            Some(Ok(())) => info.last_error = None,
            Some(Err(e)) => info.last_error = Some(e.to_string()),
            None => {}
        }
    }
}

fn serve<B: AudioBackend>(
    mut controller: PlaybackController<B>,
    rx: Receiver<PlayerMsg>,
    now_playing: NowPlayingHandle,
) {
    let mut clock = PlayClock::default();
    info!("player started");

    loop {
        match rx.recv_timeout(TICK) {
            Ok(PlayerMsg::Cmd(cmd, done)) => {
                let result = apply(&mut controller, &mut clock, cmd);
                publish(&controller, &clock, &now_playing, Some(&result));
                let _ = done.send(result);
            }
            Ok(PlayerMsg::Quit) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                if controller.poll() {
                    clock.reset();
                }
                publish(&controller, &clock, &now_playing, None);
            }
        }
    }

    controller.stop();
    clock.reset();
    publish(&controller, &clock, &now_playing, None);
    info!("player stopped");
}
