use std::time::Duration;

/// A single audio file known to the library.
///
/// `path` is the identity of a record: the store keeps at most one row per
/// path and every other field may be rewritten in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioRecord {
    pub path: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration_ms: u64,
    pub is_favorite: bool,
    /// Milliseconds since the Unix epoch, 0 when never played.
    pub last_played_at: i64,
    pub artwork_ref: Option<String>,
}

impl AudioRecord {
    /// Build a freshly scanned record: not a favorite, never played, no artwork.
    pub fn new(
        path: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
            duration_ms,
            is_favorite: false,
            last_played_at: 0,
            artwork_ref: None,
        }
    }

    pub fn with_artwork(mut self, artwork_ref: impl Into<String>) -> Self {
        self.artwork_ref = Some(artwork_ref.into());
        self
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}
