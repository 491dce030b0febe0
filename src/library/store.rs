//! SQLite cache of `AudioRecord`s keyed by path.
//!
//! Connections come from a small r2d2 pool; the database runs in WAL mode so
//! list reads never wait on a sync in progress.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use thiserror::Error;
use tracing::warn;

use super::model::AudioRecord;

const SCHEMA_VERSION: i32 = 1;

const SELECT_RECORD: &str = "SELECT path, title, artist, album, duration, is_favorite, \
     last_played, artwork_ref FROM audio_files";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create store directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("store connection pool: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("duration of {path} does not fit the store ({duration_ms} ms)")]
    DurationOutOfRange { path: String, duration_ms: u64 },
}

#[derive(Clone)]
pub struct LibraryStore {
    pool: Pool<SqliteConnectionManager>,
}

fn map_record_row(row: &Row<'_>) -> rusqlite::Result<AudioRecord> {
    let duration: Option<i64> = row.get(4)?;
    let is_favorite: Option<i64> = row.get(5)?;
    let last_played: Option<i64> = row.get(6)?;
    Ok(AudioRecord {
        path: row.get(0)?,
        title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        artist: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        album: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        duration_ms: u64::try_from(duration.unwrap_or(0)).unwrap_or(0),
        is_favorite: is_favorite.unwrap_or(0) != 0,
        last_played_at: last_played.unwrap_or(0),
        artwork_ref: row.get(7)?,
    })
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

impl LibraryStore {
    /// Open (or create) the store at `path` and bootstrap its schema.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.busy_timeout(Duration::from_secs(5))?;
            conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
            Ok(())
        });
        let pool = Pool::builder().max_size(4).build(manager)?;

        {
            let conn = pool.get()?;
            init_schema(&conn)?;
        }

        Ok(Self { pool })
    }

    fn stored_duration(record: &AudioRecord) -> Result<i64, StoreError> {
        i64::try_from(record.duration_ms).map_err(|_| StoreError::DurationOutOfRange {
            path: record.path.clone(),
            duration_ms: record.duration_ms,
        })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, StoreError> {
        Ok(self.pool.get()?)
    }

    /// Insert `record`, or replace the row with the same path.
    ///
    /// Every column is taken from `record`, including the favorite flag and
    /// last-played time; nothing is carried over from the replaced row.
    pub fn upsert(&self, record: &AudioRecord) -> Result<(), StoreError> {
        let duration = Self::stored_duration(record)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO audio_files \
             (path, title, artist, album, duration, is_favorite, last_played, artwork_ref) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.path,
                record.title,
                record.artist,
                record.album,
                duration,
                record.is_favorite as i64,
                record.last_played_at,
                record.artwork_ref,
            ],
        )?;
        Ok(())
    }

    /// Insert `record`, or refresh only the scanned columns of an existing
    /// row. `is_favorite` and `last_played` of an existing row are kept.
    pub fn upsert_keeping_user_state(&self, record: &AudioRecord) -> Result<(), StoreError> {
        let duration = Self::stored_duration(record)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO audio_files \
             (path, title, artist, album, duration, is_favorite, last_played, artwork_ref) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
             ON CONFLICT(path) DO UPDATE SET \
             title = excluded.title, artist = excluded.artist, album = excluded.album, \
             duration = excluded.duration, artwork_ref = excluded.artwork_ref",
            params![
                record.path,
                record.title,
                record.artist,
                record.album,
                duration,
                record.is_favorite as i64,
                record.last_played_at,
                record.artwork_ref,
            ],
        )?;
        Ok(())
    }

    /// Every record, ordered by title (binary collation) then path.
    pub fn all(&self) -> Result<Vec<AudioRecord>, StoreError> {
        self.query_records(&format!("{SELECT_RECORD} ORDER BY title ASC, path ASC"))
    }

    /// Records flagged as favorite, same ordering as `all`.
    pub fn favorites(&self) -> Result<Vec<AudioRecord>, StoreError> {
        self.query_records(&format!(
            "{SELECT_RECORD} WHERE is_favorite = 1 ORDER BY title ASC, path ASC"
        ))
    }

    pub fn get(&self, path: &str) -> Result<Option<AudioRecord>, StoreError> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                &format!("{SELECT_RECORD} WHERE path = ?1"),
                params![path],
                map_record_row,
            )
            .optional()?;
        Ok(record)
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM audio_files", [], |row| row.get(0))?;
        Ok(n.max(0) as usize)
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.count()? == 0)
    }

    /// Flip the favorite flag of `path`.
    ///
    /// Returns the new value, or `None` when no record has that path.
    /// Takes the write lock up front, so a running sync is waited on.
    pub fn toggle_favorite(&self, path: &str) -> Result<Option<bool>, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current: Option<i64> = tx
            .query_row(
                "SELECT is_favorite FROM audio_files WHERE path = ?1",
                params![path],
                |row| row.get::<_, Option<i64>>(0),
            )
            .optional()?
            .map(|v| v.unwrap_or(0));

        let Some(current) = current else {
            return Ok(None);
        };

        let next = current == 0;
        tx.execute(
            "UPDATE audio_files SET is_favorite = ?1 WHERE path = ?2",
            params![next as i64, path],
        )?;
        tx.commit()?;
        Ok(Some(next))
    }

    /// Stamp `path` as played now. Returns `false` for an unknown path.
    pub fn touch_last_played(&self, path: &str) -> Result<bool, StoreError> {
        self.touch_last_played_at(path, now_millis())
    }

    pub fn touch_last_played_at(&self, path: &str, millis: i64) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE audio_files SET last_played = ?1 WHERE path = ?2",
            params![millis, path],
        )?;
        Ok(changed > 0)
    }

    fn query_records(&self, sql: &str) -> Result<Vec<AudioRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], map_record_row)?;

        let mut records = Vec::new();
        for row in rows {
            match row {
                Ok(record) => records.push(record),
                Err(e) => warn!(error = %e, "skipping unreadable store row"),
            }
        }
        Ok(records)
    }
}

fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS audio_files (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            path TEXT UNIQUE NOT NULL,
            title TEXT,
            artist TEXT,
            album TEXT,
            duration INTEGER,
            is_favorite INTEGER DEFAULT 0,
            last_played INTEGER DEFAULT 0,
            artwork_ref TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_audio_files_title ON audio_files(title);
        CREATE INDEX IF NOT EXISTS idx_audio_files_favorite ON audio_files(is_favorite);
        "#,
    )?;

    let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version < SCHEMA_VERSION {
        conn.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
    }
    Ok(())
}
