//! Flat-file backing store for setting values.
//!
//! One setting per line, `<name> <value>`, split on the first space so values
//! may contain spaces. No header and no versioning: unknown names are skipped
//! on load.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Default settings file name.
pub const DEFAULT_SETTINGS_FILE: &str = "settings.cfg";

/// Errors from reading or writing the settings file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error for '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    /// Check if this error is a "file not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Split a stored line into name and value.
///
/// Lines without a space yield an empty value.
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }
    Some(line.split_once(' ').unwrap_or((line, "")))
}

/// Split file contents into numbered lines, starting at 1.
///
/// A line that is not valid UTF-8 comes back as `None`; the others are unaffected.
pub fn split_lines(contents: &[u8]) -> impl Iterator<Item = (usize, Option<&str>)> {
    contents
        .split(|&b| b == b'\n')
        .enumerate()
        .map(|(i, line)| (i + 1, std::str::from_utf8(line).ok()))
}

/// Render `(name, value)` pairs in file format.
pub fn format_lines<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut out = String::new();
    for (name, value) in entries {
        out.push_str(name);
        out.push(' ');
        out.push_str(value);
        out.push('\n');
    }
    out
}

/// Location and load state of the settings file.
///
/// Writes are refused until the first load has completed, and while a load
/// is in progress, so a not-yet-read file is never overwritten with defaults.
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    loaded: bool,
    suppressed: bool,
}

impl SettingsStore {
    /// A store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            loaded: false,
            suppressed: false,
        }
    }

    /// A store that keeps nothing on disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    #[inline]
    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    /// Whether a write would currently reach the file.
    #[inline]
    pub fn can_write(&self) -> bool {
        self.loaded && !self.suppressed
    }

    pub(crate) fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    pub(crate) fn set_suppressed(&mut self, suppressed: bool) {
        self.suppressed = suppressed;
    }

    /// Read the whole file as raw bytes. Decode with [`split_lines`].
    ///
    /// Returns `Ok(None)` for in-memory stores.
    pub fn read(&self) -> Result<Option<Vec<u8>>, StoreError> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        fs::read(path).map(Some).map_err(|e| StoreError::io(path, e))
    }

    /// Replace the file with `contents`, creating parent directories if needed.
    pub fn write(&self, contents: &str) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            }
        }

        fs::write(path, contents).map_err(|e| StoreError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("fov 90"), Some(("fov", "90")));
        assert_eq!(parse_line("offset 1.5 2 3\r\n"), Some(("offset", "1.5 2 3")));
        assert_eq!(parse_line("flag"), Some(("flag", "")));
        assert_eq!(parse_line("   "), None);
    }

    #[test]
    fn test_split_lines_isolates_bad_utf8() {
        let lines: Vec<_> = split_lines(b"volume 80\nmotd caf\xe9\nname x\r\n").collect();
        assert_eq!(
            lines,
            vec![(1, Some("volume 80")), (2, None), (3, Some("name x\r")), (4, Some(""))]
        );
        assert_eq!(parse_line("name x\r"), Some(("name", "x")));
    }

    #[test]
    fn test_format_lines() {
        let text = format_lines([("a", "1"), ("b", "x y")]);
        assert_eq!(text, "a 1\nb x y\n");
    }

    #[test]
    fn test_write_read_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("nested").join("settings.cfg"));
        store.write("fov 90\n").unwrap();
        assert_eq!(store.read().unwrap().as_deref(), Some(&b"fov 90\n"[..]));
    }

    #[test]
    fn test_read_missing() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("missing.cfg"));
        assert!(store.read().unwrap_err().is_not_found());
    }

    #[test]
    fn test_write_guards() {
        let mut store = SettingsStore::in_memory();
        assert!(!store.can_write());
        store.mark_loaded();
        assert!(store.can_write());
        store.set_suppressed(true);
        assert!(!store.can_write());
        assert_eq!(store.read().unwrap(), None);
    }
}
