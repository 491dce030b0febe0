//! The music library: scanning the media index, the SQLite cache, and the
//! machinery that keeps the two in step.
//!
//! Data flows leaf-first: `index` yields raw rows, `scan` decodes them into
//! `AudioRecord`s, `sync` upserts them into the `store`, and `watch` asks the
//! sync worker for a new pass whenever the media root changes.

mod display;
mod index;
mod model;
mod scan;
mod store;
mod sync;
mod watch;

pub use display::display_from_fields;
pub use index::{FsMediaIndex, IndexError, IndexRow, IndexRows, MediaIndex};
pub use model::AudioRecord;
pub use scan::{
    DEFAULT_ARTWORK_BASE, LibraryScanner, RowError, ScanReport, UNKNOWN_ALBUM, UNKNOWN_ARTIST,
    UNKNOWN_TITLE, decode_row,
};
pub use store::{LibraryStore, StoreError, now_millis};
pub use sync::{LibrarySynchronizer, MergePolicy, SyncHandle, SyncReport, SyncStatus, SyncWorker};
pub use watch::{ChangeWatcher, WatchError};
