use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, warn};

use crate::app::App;
use crate::config;
use crate::library::{AudioRecord, LibraryStore, SyncHandle};
use crate::playback::{PlaybackError, PlayerHandle};
use crate::ui;

/// Handles the event loop talks to.
pub struct Services<'a> {
    pub settings: &'a config::Settings,
    pub store: &'a LibraryStore,
    pub sync: &'a SyncHandle,
    pub player: &'a PlayerHandle,
}

/// State tracked by the runtime event loop across iterations.
#[derive(Default)]
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
}

/// Main terminal event loop: handles input, reloads the list after each sync
/// pass and draws. Returns `Ok(())` when shutdown is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    services: &Services<'_>,
    app: &mut App,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        let sync = services.sync.status();
        if sync.generation != app.sync_generation {
            app.sync_generation = sync.generation;
            reload(app, services.store);
        }

        let now = services.player.now_playing();
        terminal.draw(|f| ui::draw(f, app, &now, &sync, &services.settings.ui))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, services, app, state) {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn reload(app: &mut App, store: &LibraryStore) {
    if let Err(e) = app.reload(store) {
        warn!(error = %e, "failed to reload library view");
        app.set_status(format!("Could not read library: {e}"));
    }
}

/// The stored row for the selected record, which may be newer than the list.
fn selected_for_playback(app: &App, store: &LibraryStore) -> Option<AudioRecord> {
    let listed = app.selected_record()?;
    match store.get(&listed.path) {
        Ok(Some(stored)) => Some(stored),
        Ok(None) => Some(listed.clone()),
        Err(e) => {
            warn!(path = %listed.path, error = %e, "failed to re-read record, playing listed copy");
            Some(listed.clone())
        }
    }
}

fn report_playback(app: &mut App, result: Result<(), PlaybackError>) {
    match result {
        Ok(()) => app.clear_status(),
        // The player publishes its own failures in the now-playing snapshot.
        Err(PlaybackError::PlayerGone) => app.set_status("Player stopped"),
        Err(e) => debug!(error = %e, "playback command failed"),
    }
}

/// Apply one key press. Returns true when the app should quit.
pub(crate) fn handle_key_event(
    key: KeyEvent,
    services: &Services<'_>,
    app: &mut App,
    state: &mut EventLoopState,
) -> bool {
    if key.code != KeyCode::Char('g') {
        state.pending_gg = false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.select_first();
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => app.select_last(),
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.prev(),
        KeyCode::Tab => {
            if let Err(e) = app.switch_view(services.store) {
                warn!(error = %e, "failed to switch view");
                app.set_status(format!("Could not read library: {e}"));
            }
        }
        KeyCode::Enter => {
            if let Some(record) = selected_for_playback(app, services.store) {
                let result = services.player.toggle(record);
                report_playback(app, result);
            }
        }
        KeyCode::Char(' ') | KeyCode::Char('p') => {
            let player = services.player;
            let result = if player.is_playing() {
                player.pause()
            } else if player.current_record().is_some() {
                player.resume()
            } else {
                match selected_for_playback(app, services.store) {
                    Some(record) => player.play(record),
                    None => Ok(()),
                }
            };
            report_playback(app, result);
        }
        KeyCode::Char('s') => {
            let result = services.player.stop();
            report_playback(app, result);
        }
        KeyCode::Char('f') => match app.toggle_favorite_selected(services.store) {
            Ok(Some(true)) => app.set_status("Added to favorites"),
            Ok(Some(false)) => app.set_status("Removed from favorites"),
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "failed to toggle favorite");
                app.set_status(format!("Could not update favorite: {e}"));
            }
        },
        KeyCode::Char('r') => {
            if services.sync.request_rescan() {
                app.set_status("Rescanning library");
            } else {
                app.set_status("Library sync is not running");
            }
        }
        _ => {}
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::LibraryView;
    use crate::config::Settings;
    use crate::library::{
        FsMediaIndex, LibraryScanner, LibrarySynchronizer, MergePolicy, SyncWorker,
    };
    use crate::playback::{PlaybackState, PlayerService, UnavailableBackend};
    use crossterm::event::KeyModifiers;
    use std::sync::Arc;
    use tempfile::{TempDir, tempdir};

    struct Fixture {
        settings: Settings,
        store: LibraryStore,
        worker: SyncWorker,
        player: PlayerService,
        _dir: TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let store = LibraryStore::open(&dir.path().join("library.db")).unwrap();
        for (path, title) in [("/a.mp3", "A"), ("/b.mp3", "B"), ("/c.mp3", "C")] {
            store
                .upsert(&AudioRecord::new(path, title, "Artist", "Album", 1_000))
                .unwrap();
        }

        let settings = Settings::default();
        let index = Arc::new(FsMediaIndex::new(dir.path(), settings.library.clone()));
        let scanner = LibraryScanner::new(index, settings.library.artwork_base.clone());
        let synchronizer = LibrarySynchronizer::new(store.clone(), MergePolicy::default());
        let worker = SyncWorker::spawn(scanner, synchronizer, Duration::from_millis(10));
        let player = PlayerService::spawn(store.clone(), || Ok(UnavailableBackend));

        Fixture {
            settings,
            store,
            worker,
            player,
            _dir: dir,
        }
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn run_keys(fx: &Fixture, app: &mut App, keys: &[KeyCode]) -> bool {
        let sync = fx.worker.handle();
        let player = fx.player.handle();
        let services = Services {
            settings: &fx.settings,
            store: &fx.store,
            sync: &sync,
            player: &player,
        };
        let mut state = EventLoopState::default();
        keys.iter()
            .any(|&code| handle_key_event(press(code), &services, app, &mut state))
    }

    fn loaded_app(fx: &Fixture) -> App {
        let mut app = App::new(fx.settings.ui.clone());
        app.reload(&fx.store).unwrap();
        app
    }

    #[test]
    fn gg_and_g_jump_to_the_ends() {
        let fx = fixture();
        let mut app = loaded_app(&fx);

        run_keys(&fx, &mut app, &[KeyCode::Char('G')]);
        assert_eq!(app.selected, 2);

        run_keys(&fx, &mut app, &[KeyCode::Char('g'), KeyCode::Char('k'), KeyCode::Char('g')]);
        assert_eq!(app.selected, 1);

        run_keys(&fx, &mut app, &[KeyCode::Char('g'), KeyCode::Char('g')]);
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn favorite_then_tab_shows_it_in_favorites() {
        let fx = fixture();
        let mut app = loaded_app(&fx);

        run_keys(&fx, &mut app, &[KeyCode::Char('j'), KeyCode::Char('f'), KeyCode::Tab]);

        assert_eq!(app.view, LibraryView::Favorites);
        assert_eq!(app.records.len(), 1);
        assert_eq!(app.records[0].path, "/b.mp3");
    }

    #[test]
    fn enter_without_audio_output_stays_stopped() {
        let fx = fixture();
        let mut app = loaded_app(&fx);

        assert!(!run_keys(&fx, &mut app, &[KeyCode::Enter, KeyCode::Char(' ')]));
        let now = fx.player.handle().now_playing();
        assert_eq!(now.state, PlaybackState::Idle);
        assert!(now.last_error.is_some());
    }

    #[test]
    fn playback_uses_the_stored_row_over_the_listed_copy() {
        let fx = fixture();
        let app = loaded_app(&fx);
        fx.store
            .upsert(&AudioRecord::new("/a.mp3", "A (remaster)", "Artist", "Album", 2_000))
            .unwrap();

        let record = selected_for_playback(&app, &fx.store).unwrap();
        assert_eq!(record.title, "A (remaster)");
        assert_eq!(record.duration_ms, 2_000);
        assert_eq!(app.selected_record().unwrap().title, "A");
    }

    #[test]
    fn space_on_an_idle_player_tries_the_selected_record() {
        let fx = fixture();
        let mut app = loaded_app(&fx);

        run_keys(&fx, &mut app, &[KeyCode::Char('p')]);
        let player = fx.player.handle();
        assert!(!player.is_playing());
        assert!(player.current_record().is_none());
        assert!(player.now_playing().last_error.is_some());
    }

    #[test]
    fn rescan_key_queues_a_sync_pass() {
        let fx = fixture();
        let mut app = loaded_app(&fx);

        run_keys(&fx, &mut app, &[KeyCode::Char('r')]);
        assert_eq!(app.status_message.as_deref(), Some("Rescanning library"));

        let sync = fx.worker.handle();
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while sync.generation() == 0 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(sync.generation() >= 1);
        assert_eq!(fx.store.count().unwrap(), 3);
    }

    #[test]
    fn q_quits() {
        let fx = fixture();
        let mut app = loaded_app(&fx);
        assert!(run_keys(&fx, &mut app, &[KeyCode::Char('q')]));
    }
}
