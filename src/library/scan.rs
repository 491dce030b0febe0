use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::index::{IndexRow, MediaIndex};
use super::model::AudioRecord;

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

pub const DEFAULT_ARTWORK_BASE: &str = "content://media/external/audio/albumart";

/// Why a single index row could not become an `AudioRecord`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowError {
    #[error("row {id} has no path")]
    MissingPath { id: i64 },
    #[error("row {id} has a negative duration ({duration_ms} ms)")]
    NegativeDuration { id: i64, duration_ms: i64 },
}

/// Outcome of one scan, including how many rows were dropped.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub records: Vec<AudioRecord>,
    pub skipped: usize,
}

fn or_placeholder(value: Option<String>, placeholder: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| placeholder.to_string())
}

/// Map one raw index row onto an `AudioRecord`.
///
/// Missing tags become the "Unknown ..." placeholders; a missing duration is 0.
/// The artwork reference is `{artwork_base}/{album_id}` when the row has an album.
pub fn decode_row(row: IndexRow, artwork_base: &str) -> Result<AudioRecord, RowError> {
    let id = row.id;

    let path = row
        .path
        .filter(|p| !p.trim().is_empty())
        .ok_or(RowError::MissingPath { id })?;

    let duration_ms = match row.duration_ms {
        None => 0,
        Some(d) => u64::try_from(d).map_err(|_| RowError::NegativeDuration {
            id,
            duration_ms: d,
        })?,
    };

    let mut record = AudioRecord::new(
        path,
        or_placeholder(row.title, UNKNOWN_TITLE),
        or_placeholder(row.artist, UNKNOWN_ARTIST),
        or_placeholder(row.album, UNKNOWN_ALBUM),
        duration_ms,
    );

    if let Some(album_id) = row.album_id {
        record = record.with_artwork(format!(
            "{}/{}",
            artwork_base.trim_end_matches('/'),
            album_id
        ));
    }

    Ok(record)
}

/// Produces candidate records from a media index.
#[derive(Clone)]
pub struct LibraryScanner {
    index: Arc<dyn MediaIndex>,
    artwork_base: String,
}

impl LibraryScanner {
    pub fn new(index: Arc<dyn MediaIndex>, artwork_base: impl Into<String>) -> Self {
        Self {
            index,
            artwork_base: artwork_base.into(),
        }
    }

    /// Scan the index. Never fails: an unreachable index yields nothing and
    /// bad rows are skipped.
    pub fn scan(&self) -> Vec<AudioRecord> {
        self.scan_with_report().records
    }

    pub fn scan_with_report(&self) -> ScanReport {
        let rows = match self.index.query_music() {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "media index unavailable, scan is empty");
                return ScanReport::default();
            }
        };

        let mut report = ScanReport::default();
        for row in rows {
            let decoded = row
                .map_err(|e| e.to_string())
                .and_then(|row| decode_row(row, &self.artwork_base).map_err(|e| e.to_string()));
            match decoded {
                Ok(record) => report.records.push(record),
                Err(reason) => {
                    debug!(%reason, "skipping media index row");
                    report.skipped += 1;
                }
            }
        }

        info!(
            found = report.records.len(),
            skipped = report.skipped,
            "media index scanned"
        );
        report
    }
}
