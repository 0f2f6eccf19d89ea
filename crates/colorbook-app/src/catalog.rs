//! The picker: coloring pages available in a directory.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

/// Extensions the `image` build in this workspace can decode.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// One page in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Storage key, the page's path.
    pub key: String,
    /// Display name, the file stem.
    pub name: String,
    /// Whether saved progress exists for this page.
    pub in_progress: bool,
}

/// Sorted list of coloring pages.
#[derive(Debug, Clone, Default)]
pub struct ImageCatalog {
    entries: Vec<CatalogEntry>,
}

impl ImageCatalog {
    /// Scan `dir` (not recursively) for image files.
    pub fn scan(dir: &Path) -> io::Result<Self> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_image(path))
            .collect();
        paths.sort();

        let entries = paths
            .into_iter()
            .map(|path| CatalogEntry {
                key: page_key(&path),
                name: path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                in_progress: false,
            })
            .collect();
        Ok(Self { entries })
    }

    /// Flag the entries that have saved progress.
    pub fn mark_saved(&mut self, saved_keys: &[String]) {
        let saved: HashSet<&str> = saved_keys.iter().map(String::as_str).collect();
        for entry in &mut self.entries {
            entry.in_progress = saved.contains(entry.key.as_str());
        }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Storage key for a page on disk: its canonical path when resolvable.
pub fn page_key(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_scan_sorted_images_only() {
        let dir = tempdir().unwrap();
        for name in ["b.png", "a.JPG", "notes.txt", "c.webp"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.png")).unwrap();

        let catalog = ImageCatalog::scan(dir.path()).unwrap();
        let names: Vec<&str> = catalog.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_mark_saved() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"").unwrap();
        std::fs::write(dir.path().join("b.png"), b"").unwrap();

        let mut catalog = ImageCatalog::scan(dir.path()).unwrap();
        let saved = vec![page_key(&dir.path().join("b.png"))];
        catalog.mark_saved(&saved);

        let flags: Vec<bool> = catalog.entries().iter().map(|e| e.in_progress).collect();
        assert_eq!(flags, vec![false, true]);
    }

    #[test]
    fn test_scan_missing_dir() {
        let dir = tempdir().unwrap();
        assert!(ImageCatalog::scan(&dir.path().join("nope")).is_err());
    }
}
