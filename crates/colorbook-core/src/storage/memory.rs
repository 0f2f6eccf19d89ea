//! In-memory storage implementation.

use super::{BoxFuture, DeleteError, PersistenceGateway, SaveError};
use crate::codec::SaveRecord;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral sessions.
///
/// A record must be filed under its own key; `list` is sorted.
#[derive(Default)]
pub struct MemoryStorage {
    records: RwLock<HashMap<String, SaveRecord>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// When the record for `key` was written, in ms since the Unix epoch.
    pub fn saved_at(&self, key: &str) -> Option<u64> {
        let records = self.records.read().ok()?;
        records.get(key).map(|record| record.timestamp_ms)
    }
}

impl PersistenceGateway for MemoryStorage {
    fn save(&self, key: &str, record: &SaveRecord) -> BoxFuture<'_, Result<(), SaveError>> {
        let key = key.to_string();
        let record = record.clone();
        Box::pin(async move {
            if record.key != key {
                return Err(SaveError::Other(format!(
                    "Record for {} cannot be filed under {}",
                    record.key, key
                )));
            }
            let mut records = self
                .records
                .write()
                .map_err(|e| SaveError::Other(format!("Lock error: {}", e)))?;
            let (width, height) = (record.image.width, record.image.height);
            if let Some(previous) = records.insert(key.clone(), record) {
                log::debug!(
                    "Replaced {}x{} progress for {} saved at {}",
                    previous.image.width,
                    previous.image.height,
                    key,
                    previous.timestamp_ms
                );
            } else {
                log::debug!("Stored {}x{} progress for {}", width, height, key);
            }
            Ok(())
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, Option<SaveRecord>> {
        let key = key.to_string();
        Box::pin(async move {
            match self.records.read() {
                Ok(records) => records.get(&key).cloned(),
                Err(e) => {
                    log::warn!("Failed to read saved progress for {}: {}", key, e);
                    None
                }
            }
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, Result<(), DeleteError>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut records = self
                .records
                .write()
                .map_err(|e| DeleteError::Other(format!("Lock error: {}", e)))?;
            records.remove(&key);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, Vec<String>> {
        Box::pin(async move {
            match self.records.read() {
                Ok(records) => {
                    let mut keys: Vec<String> = records.keys().cloned().collect();
                    keys.sort();
                    keys
                }
                Err(e) => {
                    log::warn!("Failed to list saved progress: {}", e);
                    Vec::new()
                }
            }
        })
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), DeleteError>> {
        Box::pin(async move {
            let mut records = self
                .records
                .write()
                .map_err(|e| DeleteError::Other(format!("Lock error: {}", e)))?;
            records.clear();
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

    fn record(key: &str, color: Rgba) -> SaveRecord {
        let buffer = PixelBuffer::filled(2, 2, color).unwrap();
        SaveRecord::new(key, SerializedImage::encode(&buffer).unwrap())
    }

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::new();
        let rec = record("cat", Rgba::WHITE);

        block_on(storage.save("cat", &rec)).unwrap();
        let loaded = block_on(storage.load("cat")).unwrap();

        assert_eq!(loaded, rec);
    }

    #[test]
    fn test_load_missing() {
        let storage = MemoryStorage::new();
        assert!(block_on(storage.load("nonexistent")).is_none());
    }

    #[test]
    fn test_save_overwrites() {
        let storage = MemoryStorage::new();
        block_on(storage.save("cat", &record("cat", Rgba::WHITE))).unwrap();
        block_on(storage.save("cat", &record("cat", Rgba::BLACK))).unwrap();

        assert_eq!(storage.len(), 1);
        let loaded = block_on(storage.load("cat")).unwrap();
        assert_eq!(loaded.image.decode().unwrap().get(0, 0).unwrap(), Rgba::BLACK);
    }

    #[test]
    fn test_save_under_foreign_key_rejected() {
        let storage = MemoryStorage::new();
        let result = block_on(storage.save("dog", &record("cat", Rgba::WHITE)));

        assert!(matches!(result, Err(SaveError::Other(_))));
        assert!(storage.is_empty());
        assert!(block_on(storage.load("dog")).is_none());
    }

    #[test]
    fn test_saved_at_tracks_latest_record() {
        let storage = MemoryStorage::new();
        assert!(storage.saved_at("cat").is_none());

        let mut older = record("cat", Rgba::WHITE);
        older.timestamp_ms = 1_000;
        block_on(storage.save("cat", &older)).unwrap();
        assert_eq!(storage.saved_at("cat"), Some(1_000));

        let mut newer = record("cat", Rgba::BLACK);
        newer.timestamp_ms = 2_000;
        block_on(storage.save("cat", &newer)).unwrap();
        assert_eq!(storage.saved_at("cat"), Some(2_000));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_delete() {
        let storage = MemoryStorage::new();
        block_on(storage.save("cat", &record("cat", Rgba::WHITE))).unwrap();
        block_on(storage.delete("cat")).unwrap();
        assert!(block_on(storage.load("cat")).is_none());
        // Deleting again is fine.
        block_on(storage.delete("cat")).unwrap();
    }

    #[test]
    fn test_list_and_clear() {
        let storage = MemoryStorage::new();
        block_on(storage.save("doc1", &record("doc1", Rgba::WHITE))).unwrap();
        block_on(storage.save("doc2", &record("doc2", Rgba::WHITE))).unwrap();

        assert_eq!(block_on(storage.list()), vec!["doc1".to_string(), "doc2".to_string()]);

        block_on(storage.clear()).unwrap();
        assert!(storage.is_empty());
    }
}
