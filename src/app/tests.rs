use super::*;
use crate::config::{TrackDisplayField, UiSettings};
use crate::library::{AudioRecord, LibraryStore};
use tempfile::{TempDir, tempdir};

fn r(path: &str, title: &str) -> AudioRecord {
    AudioRecord::new(path, title, "Artist", "Album", 60_000)
}

fn app_with(titles: &[&str]) -> App {
    let mut app = App::new(UiSettings::default());
    app.set_records(
        titles
            .iter()
            .map(|t| r(&format!("/music/{t}.mp3"), t))
            .collect(),
    );
    app
}

fn store_with(records: &[AudioRecord]) -> (TempDir, LibraryStore) {
    let dir = tempdir().unwrap();
    let store = LibraryStore::open(&dir.path().join("library.db")).unwrap();
    for rec in records {
        store.upsert(rec).unwrap();
    }
    (dir, store)
}

#[test]
fn labels_follow_ui_fields() {
    let ui = UiSettings {
        track_fields: vec![TrackDisplayField::Artist, TrackDisplayField::Title],
        track_separator: " / ".into(),
        ..UiSettings::default()
    };
    let mut app = App::new(ui);
    app.set_records(vec![r("/a.mp3", "Song")]);
    assert_eq!(app.label(0), "Artist / Song");
    assert_eq!(app.label(5), "");
}

#[test]
fn next_prev_wrap_around() {
    let mut app = app_with(&["A", "B", "C"]);

    app.prev();
    assert_eq!(app.selected, 2);
    app.next();
    assert_eq!(app.selected, 0);
    app.next();
    assert_eq!(app.selected, 1);
}

#[test]
fn navigation_on_empty_view_is_a_noop() {
    let mut app = App::new(UiSettings::default());
    app.next();
    app.prev();
    app.select_last();
    assert_eq!(app.selected, 0);
    assert!(app.selected_record().is_none());
}

#[test]
fn top_and_bottom() {
    let mut app = app_with(&["A", "B", "C"]);
    app.select_last();
    assert_eq!(app.selected_record().unwrap().title, "C");
    app.select_first();
    assert_eq!(app.selected_record().unwrap().title, "A");
}

#[test]
fn selection_follows_path_across_reloads() {
    let mut app = app_with(&["A", "B", "C"]);
    app.selected = 1;

    app.set_records(vec![
        r("/music/0.mp3", "0"),
        r("/music/A.mp3", "A"),
        r("/music/B.mp3", "B"),
    ]);
    assert_eq!(app.selected_record().unwrap().title, "B");

    app.set_records(vec![r("/music/A.mp3", "A")]);
    assert_eq!(app.selected, 0);
}

#[test]
fn switching_views_lists_favorites_only() {
    let (_dir, store) = store_with(&[r("/a.mp3", "A"), r("/b.mp3", "B")]);
    store.toggle_favorite("/b.mp3").unwrap();

    let mut app = App::new(UiSettings::default());
    app.reload(&store).unwrap();
    assert_eq!(app.records.len(), 2);

    app.switch_view(&store).unwrap();
    assert_eq!(app.view, LibraryView::Favorites);
    assert_eq!(app.records.len(), 1);
    assert_eq!(app.records[0].path, "/b.mp3");

    app.switch_view(&store).unwrap();
    assert_eq!(app.view, LibraryView::Library);
    assert_eq!(app.records.len(), 2);
}

#[test]
fn toggling_a_favorite_in_the_favorites_view_removes_it() {
    let (_dir, store) = store_with(&[r("/a.mp3", "A"), r("/b.mp3", "B")]);
    store.toggle_favorite("/a.mp3").unwrap();
    store.toggle_favorite("/b.mp3").unwrap();

    let mut app = App::new(UiSettings::default());
    app.view = LibraryView::Favorites;
    app.reload(&store).unwrap();
    app.select_last();

    assert_eq!(app.toggle_favorite_selected(&store).unwrap(), Some(false));
    assert_eq!(app.records.len(), 1);
    assert_eq!(app.selected, 0);
    assert!(!store.get("/b.mp3").unwrap().unwrap().is_favorite);
}

#[test]
fn toggling_without_selection_does_nothing() {
    let (_dir, store) = store_with(&[]);
    let mut app = App::new(UiSettings::default());
    app.reload(&store).unwrap();
    assert_eq!(app.toggle_favorite_selected(&store).unwrap(), None);
}

#[test]
fn status_message_set_and_cleared() {
    let mut app = app_with(&["A"]);
    app.set_status("rescanning");
    assert_eq!(app.status_message.as_deref(), Some("rescanning"));
    app.clear_status();
    assert!(app.status_message.is_none());
}
