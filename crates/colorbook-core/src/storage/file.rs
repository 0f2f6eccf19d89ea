//! File-based storage implementation.

use super::{BoxFuture, DeleteError, PersistenceGateway, SaveError};
use crate::codec::SaveRecord;
use std::fs;
use std::path::{Path, PathBuf};

/// File-based storage.
///
/// Stores one JSON record per image key in a directory. File names are a
/// sanitised form of the key plus a hash of the exact key, so keys that
/// sanitise alike do not collide.
pub struct FileStorage {
    /// Base directory for record storage.
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new file storage with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> Result<Self, SaveError> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                SaveError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the default location.
    ///
    /// On Unix: `~/.local/share/colorbook/progress/`
    /// On Windows: `%LOCALAPPDATA%\colorbook\progress\`
    pub fn default_location() -> Result<Self, SaveError> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| SaveError::Io("Could not determine home directory".to_string()))?;

        Self::new(base.join("colorbook").join("progress"))
    }

    /// Get the file path for a key.
    fn record_path(&self, key: &str) -> PathBuf {
        let safe_key: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path
            .join(format!("{}-{:016x}.json", safe_key, fnv1a(key)))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn record_files(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.base_path)?.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                files.push(path);
            }
        }
        Ok(files)
    }
}

/// 64-bit FNV-1a; stable across runs and platforms.
fn fnv1a(key: &str) -> u64 {
    key.bytes().fold(0xcbf29ce484222325, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x100000001b3)
    })
}

impl PersistenceGateway for FileStorage {
    fn save(&self, key: &str, record: &SaveRecord) -> BoxFuture<'_, Result<(), SaveError>> {
        let path = self.record_path(key);
        let json = match record.to_json() {
            Ok(j) => j,
            Err(e) => {
                return Box::pin(async move { Err(SaveError::Serialization(e.to_string())) });
            }
        };

        Box::pin(async move {
            // Write to a sibling file and rename, so a crash mid-write never
            // leaves a truncated record behind.
            let tmp = path.with_extension("json.tmp");
            fs::write(&tmp, json).map_err(|e| {
                SaveError::Io(format!("Failed to write {}: {}", tmp.display(), e))
            })?;
            fs::rename(&tmp, &path).map_err(|e| {
                SaveError::Io(format!("Failed to replace {}: {}", path.display(), e))
            })
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, Option<SaveRecord>> {
        let path = self.record_path(key);

        Box::pin(async move {
            if !path.exists() {
                return None;
            }

            let json = match fs::read_to_string(&path) {
                Ok(json) => json,
                Err(e) => {
                    log::warn!("Failed to read {}: {}", path.display(), e);
                    return None;
                }
            };

            match SaveRecord::from_json(&json) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("Failed to parse {}: {}", path.display(), e);
                    None
                }
            }
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, Result<(), DeleteError>> {
        let path = self.record_path(key);

        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    DeleteError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, Vec<String>> {
        Box::pin(async move {
            let files = match self.record_files() {
                Ok(files) => files,
                Err(e) => {
                    log::warn!("Failed to read storage directory: {}", e);
                    return Vec::new();
                }
            };

            files
                .iter()
                .filter_map(|path| {
                    let json = fs::read_to_string(path).ok()?;
                    SaveRecord::from_json(&json).ok().map(|record| record.key)
                })
                .collect()
        })
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), DeleteError>> {
        Box::pin(async move {
            let files = self
                .record_files()
                .map_err(|e| DeleteError::Io(format!("Failed to read directory: {}", e)))?;
            for path in files {
                fs::remove_file(&path).map_err(|e| {
                    DeleteError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::PixelBuffer;
    use crate::codec::SerializedImage;
    use crate::color::Rgba;
    use crate::storage::test_util::block_on;
    use tempfile::tempdir;

    fn record(key: &str) -> SaveRecord {
        let mut buffer = PixelBuffer::filled(3, 2, Rgba::WHITE).unwrap();
        buffer.set(1, 1, Rgba::new(10, 20, 30, 40)).unwrap();
        SaveRecord::new(key, SerializedImage::encode(&buffer).unwrap())
    }

    #[test]
    fn test_file_storage_save_load() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        let rec = record("images/cat.png");
        block_on(storage.save("images/cat.png", &rec)).unwrap();
        let loaded = block_on(storage.load("images/cat.png")).unwrap();

        assert_eq!(loaded, rec);
    }

    #[test]
    fn test_file_storage_not_found() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        assert!(block_on(storage.load("nonexistent")).is_none());
    }

    #[test]
    fn test_file_storage_corrupt_record_is_ignored() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        fs::write(storage.record_path("cat"), "{ not json").unwrap();

        assert!(block_on(storage.load("cat")).is_none());
    }

    #[test]
    fn test_file_storage_list_returns_exact_keys() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.save("images/a.png", &record("images/a.png"))).unwrap();
        block_on(storage.save("images_a_png", &record("images_a_png"))).unwrap();

        let mut list = block_on(storage.list());
        list.sort();
        assert_eq!(list, vec!["images/a.png".to_string(), "images_a_png".to_string()]);
    }

    #[test]
    fn test_file_storage_delete_and_clear() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.save("one", &record("one"))).unwrap();
        block_on(storage.save("two", &record("two"))).unwrap();

        block_on(storage.delete("one")).unwrap();
        assert!(block_on(storage.load("one")).is_none());
        assert!(block_on(storage.load("two")).is_some());

        block_on(storage.clear()).unwrap();
        assert!(block_on(storage.list()).is_empty());
    }

    #[test]
    fn test_file_storage_creates_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let storage = FileStorage::new(nested.clone()).unwrap();
        assert_eq!(storage.base_path(), nested.as_path());
        assert!(nested.is_dir());
    }
}
