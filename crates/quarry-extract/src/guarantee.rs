//! Helpers that guarantee a property gets a value, falling back to what the
//! filesystem knows when the file itself carries nothing usable

use crate::file::SubjectFile;
use chrono::{DateTime, SecondsFormat, Utc};
use quarry_domain::Resource;
use tracing::debug;

/// Derive a human title from a file name
///
/// Drops the last extension and turns underscores into spaces. A leading dot
/// is not treated as an extension separator.
///
/// ```
/// use quarry_extract::title_from_file_name;
///
/// assert_eq!(title_from_file_name("summer_holiday.jpg"), "summer holiday");
/// assert_eq!(title_from_file_name(".bashrc"), ".bashrc");
/// ```
pub fn title_from_file_name(name: &str) -> String {
    let stem = match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    };
    stem.replace('_', " ")
}

/// Set `property` to `current` if it is non-blank, otherwise to a title
/// derived from the file name
///
/// Returns whether a value was set.
pub fn guarantee_title_from_file(
    resource: &mut Resource,
    property: &str,
    current: Option<&str>,
    file: &SubjectFile,
) -> bool {
    if let Some(title) = current.map(str::trim).filter(|t| !t.is_empty()) {
        resource.set_string(property, title);
        return true;
    }

    match file.file_name() {
        Some(name) => {
            resource.set_string(property, title_from_file_name(name));
            true
        }
        None => false,
    }
}

/// Set `property` to `current` if it is non-blank, otherwise to the file's
/// modification time in RFC 3339 form
///
/// Returns whether a value was set. A file whose metadata cannot be read
/// leaves the property unset.
pub fn guarantee_date_from_file_mtime(
    resource: &mut Resource,
    property: &str,
    current: Option<&str>,
    file: &SubjectFile,
) -> bool {
    if let Some(date) = current.map(str::trim).filter(|d| !d.is_empty()) {
        resource.set_datetime(property, date);
        return true;
    }

    let modified = std::fs::metadata(file.path()).and_then(|m| m.modified());
    match modified {
        Ok(time) => {
            let time: DateTime<Utc> = time.into();
            resource.set_datetime(property, time.to_rfc3339_opts(SecondsFormat::Secs, true));
            true
        }
        Err(e) => {
            debug!("No modification time for '{}': {}", file.path().display(), e);
            false
        }
    }
}
