use crate::config;
use crate::logging;

pub fn load_settings() -> config::Settings {
    match config::Settings::load() {
        Ok(s) => {
            if let Err(msg) = s.validate() {
                eprintln!("molanco: invalid config, using defaults: {msg}");
                config::Settings::default()
            } else {
                s
            }
        }
        Err(e) => {
            // Config is optional; failures should not prevent the app from starting.
            eprintln!("molanco: failed to load config, using defaults: {e}");
            config::Settings::default()
        }
    }
}

pub fn init_logging(settings: &config::Settings) {
    if let Err(e) = logging::init(&settings.logging) {
        eprintln!("molanco: logging disabled: {e}");
    }
}
