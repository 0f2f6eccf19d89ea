//! Fire-and-forget persistence of coloring progress.
//!
//! Edits mark the saver dirty. The host then asks for a [`SaveJob`], which
//! snapshots the buffer immediately and writes it in the background. Any
//! number of requests between two `take_job` calls collapse into one write.

use super::{PersistenceGateway, SaveError};
use crate::buffer::PixelBuffer;
use crate::codec::{SaveRecord, SerializedImage};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A pending write. Owns everything it needs, so it may outlive the session
/// that produced it.
pub type SaveJob = Pin<Box<dyn Future<Output = Result<(), SaveError>>>>;

/// Coalesces save requests and turns them into owned write jobs.
pub struct ProgressSaver<G: PersistenceGateway + 'static> {
    /// Storage backend.
    storage: Arc<G>,
    /// Whether an edit has happened since the last job was taken.
    dirty: bool,
}

impl<G: PersistenceGateway + 'static> ProgressSaver<G> {
    pub fn new(storage: Arc<G>) -> Self {
        Self {
            storage,
            dirty: false,
        }
    }

    /// Note that the buffer changed and should be written.
    pub fn request_save(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Drop a pending request without writing.
    pub fn discard_pending(&mut self) {
        self.dirty = false;
    }

    /// Build a write job for `buffer` if a save was requested.
    ///
    /// The buffer is encoded now; later edits do not leak into this job.
    pub fn take_job(&mut self, key: &str, buffer: &PixelBuffer) -> Option<SaveJob> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;

        let key = key.to_string();
        let encoded = SerializedImage::encode(buffer);
        let storage = Arc::clone(&self.storage);

        Some(Box::pin(async move {
            let result = match encoded {
                Ok(image) => {
                    let record = SaveRecord::new(key.clone(), image);
                    storage.save(&key, &record).await
                }
                Err(e) => Err(SaveError::Encode(e.to_string())),
            };
            match &result {
                Ok(()) => log::info!("Saved progress for {}", key),
                Err(e) => log::warn!("Failed to save progress for {}: {}", key, e),
            }
            result
        }))
    }

    /// Get a reference to the storage backend.
    pub fn storage(&self) -> &Arc<G> {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;
    use crate::storage::MemoryStorage;
    use crate::storage::test_util::block_on;

    #[test]
    fn test_no_job_when_clean() {
        let mut saver = ProgressSaver::new(Arc::new(MemoryStorage::new()));
        let buffer = PixelBuffer::filled(2, 2, Rgba::WHITE).unwrap();

        assert!(!saver.is_dirty());
        assert!(saver.take_job("cat", &buffer).is_none());
        assert!(saver.storage().is_empty());
    }

    #[test]
    fn test_requests_coalesce_into_one_job() {
        let storage = Arc::new(MemoryStorage::new());
        let mut saver = ProgressSaver::new(storage.clone());
        let buffer = PixelBuffer::filled(2, 2, Rgba::WHITE).unwrap();

        saver.request_save();
        saver.request_save();
        let job = saver.take_job("cat", &buffer).unwrap();
        assert!(saver.take_job("cat", &buffer).is_none());

        assert!(!saver.is_dirty());

        block_on(job).unwrap();
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_job_snapshots_buffer_at_take_time() {
        let storage = Arc::new(MemoryStorage::new());
        let mut saver = ProgressSaver::new(storage.clone());
        let mut buffer = PixelBuffer::filled(2, 2, Rgba::WHITE).unwrap();

        saver.request_save();
        let job = saver.take_job("cat", &buffer).unwrap();
        buffer.clear(Rgba::BLACK);
        block_on(job).unwrap();

        let record = block_on(storage.load("cat")).unwrap();
        assert_eq!(record.key, "cat");
        assert_eq!(record.image.decode().unwrap().get(1, 1).unwrap(), Rgba::WHITE);
    }

    #[test]
    fn test_discard_pending() {
        let storage = Arc::new(MemoryStorage::new());
        let mut saver = ProgressSaver::new(storage.clone());
        let buffer = PixelBuffer::filled(2, 2, Rgba::WHITE).unwrap();

        saver.request_save();
        saver.discard_pending();
        assert!(saver.take_job("cat", &buffer).is_none());
        assert!(saver.storage().is_empty());
    }
}
