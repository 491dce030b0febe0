use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/molanco/config.toml`
/// or `~/.config/molanco/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `MOLANCO__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub store: StoreSettings,
    pub sync: SyncSettings,
    pub ui: UiSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Root directory of the media index. Overridden by the first CLI argument.
    pub root: Option<PathBuf>,
    /// File extensions to treat as music (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
    /// Prefix of artwork references; the album id is appended as a path segment.
    pub artwork_base: String,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            root: None,
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()],
            follow_links: true,
            include_hidden: true,
            recursive: true,
            max_depth: None,
            artwork_base: crate::library::DEFAULT_ARTWORK_BASE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Database file. Defaults to `$XDG_DATA_HOME/molanco/library.db`.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// What a re-scan does to favorites and last-played times.
    pub merge_policy: MergePolicySetting,
    /// Whether to re-scan when files under the library root change.
    pub watch: bool,
    /// Quiet period used to coalesce bursts of change notifications (milliseconds).
    pub debounce_ms: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            merge_policy: MergePolicySetting::Replace,
            watch: true,
            debounce_ms: 500,
        }
    }
}

#[derive(Debug, Copy, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicySetting {
    #[serde(alias = "overwrite")]
    Replace,
    #[serde(alias = "keep_user_state", alias = "keep", alias = "preserve")]
    KeepUserState,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,

    /// Which record fields make up a list row, and in what order.
    ///
    /// Example: ["artist", "title", "album"]
    pub track_fields: Vec<TrackDisplayField>,

    /// Separator used to join `track_fields`.
    pub track_separator: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ molanco ~ ".to_string(),
            track_fields: vec![TrackDisplayField::Title, TrackDisplayField::Artist],
            track_separator: " - ".to_string(),
        }
    }
}

#[derive(Debug, Copy, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackDisplayField {
    Title,
    Artist,
    Album,
    Filename,
    Path,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log file. Logging is off when unset, since the terminal belongs to the UI.
    pub file: Option<PathBuf>,
    /// Default filter directive when `MOLANCO_LOG` / `RUST_LOG` are unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: None,
            level: "info".to_string(),
        }
    }
}
