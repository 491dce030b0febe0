use super::load::{default_config_path, default_store_path, resolve_config_path};
use super::schema::*;
use crate::library::MergePolicy;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_molanco_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("MOLANCO_CONFIG_PATH", "/tmp/molanco-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        PathBuf::from("/tmp/molanco-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    assert_eq!(
        default_config_path().unwrap(),
        PathBuf::from("/tmp/xdg-config-home")
            .join("molanco")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    assert_eq!(
        default_config_path().unwrap(),
        PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("molanco")
            .join("config.toml")
    );
}

#[test]
fn default_store_path_follows_xdg_data_home_then_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_DATA_HOME", "/tmp/xdg-data");
    assert_eq!(
        default_store_path().unwrap(),
        PathBuf::from("/tmp/xdg-data").join("molanco").join("library.db")
    );

    let _g2 = EnvGuard::remove("XDG_DATA_HOME");
    let _g3 = EnvGuard::set("HOME", "/tmp/home-dir");
    assert_eq!(
        default_store_path().unwrap(),
        PathBuf::from("/tmp/home-dir/.local/share/molanco/library.db")
    );
}

#[test]
fn library_root_prefers_cli_then_config() {
    let mut s = Settings::default();
    s.library.root = Some(PathBuf::from("/srv/music"));
    assert_eq!(
        s.library_root(Some(PathBuf::from("/cli"))),
        PathBuf::from("/cli")
    );
    assert_eq!(s.library_root(None), PathBuf::from("/srv/music"));
}

#[test]
fn validate_rejects_empty_extensions_and_blank_artwork_base() {
    let mut s = Settings::default();
    assert!(s.validate().is_ok());

    s.library.extensions = vec![" . ".into(), "".into()];
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.library.artwork_base = "  ".into();
    assert!(s.validate().is_err());
}

#[test]
fn merge_policy_aliases_parse_from_toml() {
    let s: Settings = toml::from_str(
        r#"
[sync]
merge_policy = "keep"
"#,
    )
    .unwrap();
    assert_eq!(s.merge_policy(), MergePolicy::KeepUserState);

    let s: Settings = toml::from_str("").unwrap();
    assert_eq!(s.merge_policy(), MergePolicy::Replace);
    assert!(s.sync.watch);
}

#[test]
fn settings_load_from_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[library]
root = "/srv/music"
extensions = ["mp3"]
recursive = false
include_hidden = false
follow_links = false
artwork_base = "file:///covers"

[store]
path = "/tmp/molanco-test.db"

[sync]
merge_policy = "keep-user-state"
watch = false
debounce_ms = 50

[ui]
header_text = "hello"
track_fields = ["artist", "title"]
track_separator = " • "

[logging]
file = "/tmp/molanco.log"
level = "debug"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("MOLANCO_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("MOLANCO__SYNC__DEBOUNCE_MS");

    let s = Settings::load().unwrap();
    assert_eq!(s.library.root, Some(PathBuf::from("/srv/music")));
    assert_eq!(s.library.extensions, vec!["mp3".to_string()]);
    assert!(!s.library.recursive);
    assert!(!s.library.include_hidden);
    assert!(!s.library.follow_links);
    assert_eq!(s.library.artwork_base, "file:///covers");
    assert_eq!(s.store_path(), PathBuf::from("/tmp/molanco-test.db"));
    assert_eq!(s.merge_policy(), MergePolicy::KeepUserState);
    assert!(!s.sync.watch);
    assert_eq!(s.sync.debounce_ms, 50);
    assert_eq!(s.ui.header_text, "hello");
    assert_eq!(s.ui.track_fields.len(), 2);
    assert!(matches!(s.ui.track_fields[0], TrackDisplayField::Artist));
    assert!(matches!(s.ui.track_fields[1], TrackDisplayField::Title));
    assert_eq!(s.ui.track_separator, " • ");
    assert_eq!(s.logging.file, Some(PathBuf::from("/tmp/molanco.log")));
    assert_eq!(s.logging.level, "debug");
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[sync]
debounce_ms = 250
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("MOLANCO_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("MOLANCO__SYNC__DEBOUNCE_MS", "0");

    let s = Settings::load().unwrap();
    assert_eq!(s.sync.debounce_ms, 0);
}
