//! Configuration of a Tessera database.

use crate::common::{DEFAULT_BATCH_SIZE, DEFAULT_KEY_PREFIX, DEFAULT_MAX_RETRIES};
use crate::errors::{ErrorKind, TesseraError, TesseraResult};
use crate::key::validate_name;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

/// Database-wide settings.
///
/// # Characteristics
/// - **Thread-Safe**: Can be safely cloned and shared across threads
/// - **Lightweight Cloning**: Uses Arc internally, clones share the same settings
/// - **Validated**: every setter rejects values the database cannot work with
///
/// | Setting | Default | Meaning |
/// |---|---|---|
/// | `key_prefix` | `"tessera"` | first element of every key the database writes |
/// | `batch_size` | `500` | store entries fetched per scan call |
/// | `max_retries` | `10` | transparent retries of conflicts that are safe to retry |
#[derive(Clone)]
pub struct TesseraConfig {
    inner: Arc<TesseraConfigInner>,
}

impl Default for TesseraConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TesseraConfig {
    pub fn new() -> Self {
        TesseraConfig {
            inner: Arc::new(TesseraConfigInner::new()),
        }
    }

    pub fn key_prefix(&self) -> String {
        self.inner.key_prefix.read().clone()
    }

    pub fn set_key_prefix(&self, prefix: &str) -> TesseraResult<()> {
        validate_name(prefix, "Prefix")?;
        *self.inner.key_prefix.write() = prefix.to_string();
        Ok(())
    }

    pub fn batch_size(&self) -> usize {
        self.inner.batch_size.load(Ordering::Relaxed)
    }

    pub fn set_batch_size(&self, batch_size: usize) -> TesseraResult<()> {
        if batch_size == 0 {
            log::error!("Batch size must be at least 1");
            return Err(TesseraError::new(
                "Batch size must be at least 1",
                ErrorKind::InvalidOperation,
            ));
        }
        self.inner.batch_size.store(batch_size, Ordering::Relaxed);
        Ok(())
    }

    pub fn max_retries(&self) -> u32 {
        self.inner.max_retries.load(Ordering::Relaxed)
    }

    pub fn set_max_retries(&self, max_retries: u32) -> TesseraResult<()> {
        self.inner.max_retries.store(max_retries, Ordering::Relaxed);
        Ok(())
    }
}

struct TesseraConfigInner {
    key_prefix: RwLock<String>,
    batch_size: AtomicUsize,
    max_retries: AtomicU32,
}

impl TesseraConfigInner {
    fn new() -> Self {
        TesseraConfigInner {
            key_prefix: RwLock::new(DEFAULT_KEY_PREFIX.to_string()),
            batch_size: AtomicUsize::new(DEFAULT_BATCH_SIZE),
            max_retries: AtomicU32::new(DEFAULT_MAX_RETRIES),
        }
    }
}
