//! The media index: the catalog of audio files the library is synced from.
//!
//! `MediaIndex` is the seam the scanner queries. Rows come back loosely
//! typed (every column may be missing) and are decoded into `AudioRecord`s by
//! `library::scan`. `FsMediaIndex` is the concrete index over a directory
//! tree.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use lofty::prelude::{Accessor, AudioFile, TaggedFileExt};
use thiserror::Error;
use walkdir::WalkDir;

use crate::config::LibrarySettings;

/// One raw entry of the media index, restricted to music.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexRow {
    pub id: i64,
    pub path: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration_ms: Option<i64>,
    pub album_id: Option<i64>,
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("media index root {0:?} is not reachable")]
    Unreachable(PathBuf),
    #[error("failed to walk media index: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("unreadable index row: {0}")]
    Unreadable(String),
}

pub type IndexRows<'a> = Box<dyn Iterator<Item = Result<IndexRow, IndexError>> + 'a>;

pub trait MediaIndex: Send + Sync {
    /// Query every entry flagged as music.
    ///
    /// An `Err` from the query itself means the index could not be reached;
    /// an `Err` item means a single row could not be read.
    fn query_music(&self) -> Result<IndexRows<'_>, IndexError>;
}

/// A media index backed by a directory of audio files.
pub struct FsMediaIndex {
    root: PathBuf,
    settings: LibrarySettings,
}

impl FsMediaIndex {
    pub fn new(root: impl Into<PathBuf>, settings: LibrarySettings) -> Self {
        Self {
            root: root.into(),
            settings,
        }
    }
}

impl MediaIndex for FsMediaIndex {
    fn query_music(&self) -> Result<IndexRows<'_>, IndexError> {
        if !self.root.is_dir() {
            return Err(IndexError::Unreachable(self.root.clone()));
        }

        let mut walker = WalkDir::new(&self.root).follow_links(self.settings.follow_links);

        // Non-recursive = only the root directory.
        let depth_cap = if self.settings.recursive {
            self.settings.max_depth
        } else {
            Some(1)
        };
        if let Some(d) = depth_cap {
            walker = walker.max_depth(d);
        }

        let include_hidden = self.settings.include_hidden;
        let extensions = normalized_extensions(&self.settings.extensions);

        let rows = walker
            .into_iter()
            .filter_entry(move |e| include_hidden || e.depth() == 0 || !is_hidden(e.path()))
            .filter_map(move |entry| match entry {
                Ok(entry) => {
                    let path = entry.path();
                    (path.is_file() && is_audio_file(path, &extensions))
                        .then(|| Ok(path.to_path_buf()))
                }
                Err(e) => Some(Err(IndexError::Walk(e))),
            })
            .enumerate()
            .map(|(ordinal, item)| item.map(|path| read_row(ordinal as i64 + 1, &path)));

        Ok(Box::new(rows))
    }
}

pub(crate) fn normalized_extensions(extensions: &[String]) -> Vec<String> {
    extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

pub(crate) fn is_audio_file(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            extensions.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn non_blank(value: Option<Cow<'_, str>>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read tags and properties for one file. Files lofty cannot parse still
/// produce a row, just without metadata columns.
fn read_row(id: i64, path: &Path) -> IndexRow {
    let mut row = IndexRow {
        id,
        path: path.to_str().map(str::to_string),
        ..IndexRow::default()
    };

    if let Ok(tagged) = lofty::read_from_path(path) {
        row.duration_ms = i64::try_from(tagged.properties().duration().as_millis()).ok();

        if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
            row.title = non_blank(tag.title());
            row.artist = non_blank(tag.artist());
            row.album = non_blank(tag.album());
        }
    }

    row.album_id = row
        .album
        .as_deref()
        .map(|album| album_id(row.artist.as_deref().unwrap_or_default(), album));
    row
}

/// Stable album identifier: FNV-1a over `artist\0album`, kept non-negative.
pub(crate) fn album_id(artist: &str, album: &str) -> i64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET;
    for byte in artist
        .to_lowercase()
        .bytes()
        .chain(std::iter::once(0))
        .chain(album.to_lowercase().bytes())
    {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    (hash >> 1) as i64
}
