use std::env;
use std::path::PathBuf;

use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;

use crate::app::App;
use crate::playback::{PlayerService, RodioBackend};

mod event_loop;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings();
    settings::init_logging(&settings);

    let root = settings.library_root(env::args_os().nth(1).map(PathBuf::from));
    let library = startup::open_library(&settings, &root)?;
    info!(watching = library.is_watching(), "library ready");

    let player = PlayerService::spawn(library.store.clone(), RodioBackend::open_default);
    let player_handle = player.handle();

    let mut app = App::new(settings.ui.clone());
    app.set_current_dir(library.root.display().to_string());
    app.sync_generation = library.sync.generation();
    app.reload(&library.store)?;

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result: Result<(), Box<dyn std::error::Error>> = (|| {
        let services = event_loop::Services {
            settings: &settings,
            store: &library.store,
            sync: &library.sync,
            player: &player_handle,
        };
        let mut state = event_loop::EventLoopState::default();

        event_loop::run(&mut terminal, &services, &mut app, &mut state)
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    library.shutdown();
    player.shutdown();
    info!("bye");

    run_result
}
