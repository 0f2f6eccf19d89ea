//! Persistence of coloring progress, keyed by image identity.

mod file;
mod memory;
mod saver;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use saver::{ProgressSaver, SaveJob};

use crate::codec::SaveRecord;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors writing a record.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Encoding error: {0}")]
    Encode(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Errors removing records.
#[derive(Debug, Error)]
pub enum DeleteError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Boxed future for storage operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Key-value store holding at most one `SaveRecord` per image key.
///
/// `save` overwrites. `load` and `list` swallow backend failures (they are
/// logged) because a missing record and an unreadable one are handled the
/// same way: start from the source image.
pub trait PersistenceGateway: Send + Sync {
    /// Store `record` under `key`, replacing any previous record.
    fn save(&self, key: &str, record: &SaveRecord) -> BoxFuture<'_, Result<(), SaveError>>;

    /// Fetch the record for `key`, if one exists and is readable.
    fn load(&self, key: &str) -> BoxFuture<'_, Option<SaveRecord>>;

    /// Remove the record for `key`. Removing a missing key succeeds.
    fn delete(&self, key: &str) -> BoxFuture<'_, Result<(), DeleteError>>;

    /// Keys that currently have saved progress.
    fn list(&self) -> BoxFuture<'_, Vec<String>>;

    /// Remove every record.
    fn clear(&self) -> BoxFuture<'_, Result<(), DeleteError>>;
}

#[cfg(test)]
pub(crate) mod test_util {
    /// Simple blocking executor for tests.
    pub fn block_on<F: std::future::Future>(f: F) -> F::Output {
        use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

        fn dummy_raw_waker() -> RawWaker {
            fn no_op(_: *const ()) {}
            fn clone(_: *const ()) -> RawWaker {
                dummy_raw_waker()
            }
            static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
            RawWaker::new(std::ptr::null(), &VTABLE)
        }

        let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
        let mut cx = Context::from_waker(&waker);
        let mut f = std::pin::pin!(f);

        loop {
            match f.as_mut().poll(&mut cx) {
                Poll::Ready(result) => return result,
                Poll::Pending => {}
            }
        }
    }
}
