use std::path::Path;

use crate::config::TrackDisplayField;

use super::model::AudioRecord;

/// Build the list label for `record` from the configured `fields`.
///
/// Blank fields are skipped; when nothing is left the title is used.
pub fn display_from_fields(
    record: &AudioRecord,
    fields: &[TrackDisplayField],
    sep: &str,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    for f in fields {
        let part = match f {
            TrackDisplayField::Title => Some(record.title.trim().to_string()),
            TrackDisplayField::Artist => Some(record.artist.trim().to_string()),
            TrackDisplayField::Album => Some(record.album.trim().to_string()),
            TrackDisplayField::Filename => Path::new(&record.path)
                .file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.trim().to_string()),
            TrackDisplayField::Path => Some(record.path.clone()),
        };
        if let Some(part) = part.filter(|p| !p.is_empty()) {
            parts.push(part);
        }
    }

    if parts.is_empty() {
        record.title.clone()
    } else {
        parts.join(sep)
    }
}
