//! Application model types: `App` and `LibraryView`.
//!
//! The `App` struct holds the records of the active view, the selection and
//! the status line used by the UI and runtime. Playback state is not kept
//! here: it is read from the player on every frame.

use crate::config::UiSettings;
use crate::library::{AudioRecord, LibraryStore, StoreError, display_from_fields};

/// Which slice of the library the list shows.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LibraryView {
    #[default]
    Library,
    Favorites,
}

impl LibraryView {
    pub fn title(self) -> &'static str {
        match self {
            Self::Library => " library ",
            Self::Favorites => " favorites ",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::Library => Self::Favorites,
            Self::Favorites => Self::Library,
        }
    }
}

/// The main application model.
pub struct App {
    pub view: LibraryView,
    pub records: Vec<AudioRecord>,
    pub selected: usize,
    pub status_message: Option<String>,
    /// Sync generation the current `records` were loaded at.
    pub sync_generation: u64,
    pub current_dir: Option<String>,

    labels: Vec<String>,
    ui: UiSettings,
}

impl App {
    pub fn new(ui: UiSettings) -> Self {
        Self {
            view: LibraryView::Library,
            records: Vec::new(),
            selected: 0,
            status_message: None,
            sync_generation: 0,
            current_dir: None,
            labels: Vec::new(),
            ui,
        }
    }

    /// Record the current directory in the app state.
    pub fn set_current_dir(&mut self, dir: String) {
        self.current_dir = Some(dir);
    }

    /// Replace the listed records, keeping the selection on the same path
    /// when it is still present.
    pub fn set_records(&mut self, records: Vec<AudioRecord>) {
        let keep = self.selected_record().map(|r| r.path.clone());

        self.labels = records
            .iter()
            .map(|r| display_from_fields(r, &self.ui.track_fields, &self.ui.track_separator))
            .collect();
        self.records = records;

        self.selected = keep
            .and_then(|path| self.records.iter().position(|r| r.path == path))
            .unwrap_or(0);
        self.clamp_selected();
    }

    /// Re-read the active view from the store.
    pub fn reload(&mut self, store: &LibraryStore) -> Result<(), StoreError> {
        let records = match self.view {
            LibraryView::Library => store.all()?,
            LibraryView::Favorites => store.favorites()?,
        };
        self.set_records(records);
        Ok(())
    }

    /// Switch between the library and favorites views and reload.
    pub fn switch_view(&mut self, store: &LibraryStore) -> Result<(), StoreError> {
        self.view = self.view.other();
        self.selected = 0;
        self.records.clear();
        self.reload(store)
    }

    /// Flip the favorite flag of the selected record and reload the view.
    ///
    /// Returns the new flag, or `None` when nothing is selected or the
    /// record is no longer in the store.
    pub fn toggle_favorite_selected(
        &mut self,
        store: &LibraryStore,
    ) -> Result<Option<bool>, StoreError> {
        let Some(path) = self.selected_record().map(|r| r.path.clone()) else {
            return Ok(None);
        };
        let flag = store.toggle_favorite(&path)?;
        self.reload(store)?;
        Ok(flag)
    }

    pub fn label(&self, index: usize) -> &str {
        self.labels.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn selected_record(&self) -> Option<&AudioRecord> {
        self.records.get(self.selected)
    }

    /// Return true if the active view contains any records.
    pub fn has_records(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    /// Move selection to the next record, wrapping to the first.
    pub fn next(&mut self) {
        if self.has_records() {
            self.selected = (self.selected + 1) % self.records.len();
        }
    }

    /// Move selection to the previous record, wrapping to the last.
    pub fn prev(&mut self) {
        if self.has_records() {
            self.selected = match self.selected {
                0 => self.records.len() - 1,
                n => n - 1,
            };
        }
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.records.len().saturating_sub(1);
    }

    fn clamp_selected(&mut self) {
        if self.selected >= self.records.len() {
            self.selected = self.records.len().saturating_sub(1);
        }
    }
}
