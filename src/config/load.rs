use std::{env, path::PathBuf};

use crate::library::MergePolicy;

use super::schema::{MergePolicySetting, Settings};

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `MOLANCO__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("MOLANCO")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self
            .library
            .extensions
            .iter()
            .all(|e| e.trim().trim_start_matches('.').is_empty())
        {
            return Err("library.extensions must name at least one extension".to_string());
        }
        if self.library.artwork_base.trim().is_empty() {
            return Err("library.artwork_base must not be blank".to_string());
        }
        Ok(())
    }

    /// Library root: CLI override, then config, then `~/Music`, then `./Music`.
    pub fn library_root(&self, cli_override: Option<PathBuf>) -> PathBuf {
        cli_override
            .or_else(|| self.library.root.clone())
            .or_else(|| env::var_os("HOME").map(|h| PathBuf::from(h).join("Music")))
            .unwrap_or_else(|| PathBuf::from("Music"))
    }

    /// Database file: configured path or the XDG data default.
    pub fn store_path(&self) -> PathBuf {
        self.store
            .path
            .clone()
            .or_else(default_store_path)
            .unwrap_or_else(|| PathBuf::from("molanco.db"))
    }

    pub fn merge_policy(&self) -> MergePolicy {
        match self.sync.merge_policy {
            MergePolicySetting::Replace => MergePolicy::Replace,
            MergePolicySetting::KeepUserState => MergePolicy::KeepUserState,
        }
    }
}

/// Resolve the config path from `MOLANCO_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("MOLANCO_CONFIG_PATH") {
        let p = PathBuf::from(p);
        return Some(p);
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/molanco/config.toml`
/// or `~/.config/molanco/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else if let Some(home) = env::var_os("HOME") {
        Some(PathBuf::from(home).join(".config"))
    } else {
        None
    };

    config_home.map(|d| d.join("molanco").join("config.toml"))
}

/// Compute the default database path under `$XDG_DATA_HOME/molanco/library.db`
/// or `~/.local/share/molanco/library.db`.
pub fn default_store_path() -> Option<PathBuf> {
    let data_home = if let Some(xdg) = env::var_os("XDG_DATA_HOME") {
        Some(PathBuf::from(xdg))
    } else if let Some(home) = env::var_os("HOME") {
        Some(PathBuf::from(home).join(".local").join("share"))
    } else {
        None
    };

    data_home.map(|d| d.join("molanco").join("library.db"))
}
