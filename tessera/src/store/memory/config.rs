use crate::common::{DEFAULT_MAX_ATOMIC_OPERATIONS, DEFAULT_MAX_VALUE_SIZE};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Configuration for an in-memory store.
///
/// # Characteristics
/// - **Thread-Safe**: Can be safely cloned and shared across threads
/// - **Lightweight Cloning**: Uses Arc internally for efficient sharing
///
/// # Usage
/// ```text
/// let config = InMemoryStoreConfig::new();
/// config.set_max_value_size(1024);
/// let store = InMemoryStore::new(config);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStoreConfig {
    inner: Arc<InMemoryStoreConfigInner>,
}

impl InMemoryStoreConfig {
    pub fn new() -> InMemoryStoreConfig {
        InMemoryStoreConfig {
            inner: Arc::new(InMemoryStoreConfigInner::new()),
        }
    }

    /// Largest value, in bytes, a single entry may hold.
    pub fn max_value_size(&self) -> usize {
        self.inner.max_value_size.load(Ordering::Relaxed)
    }

    pub fn set_max_value_size(&self, size: usize) {
        self.inner.max_value_size.store(size, Ordering::Relaxed)
    }

    /// Largest number of checks plus mutations one atomic operation may carry.
    pub fn max_atomic_operations(&self) -> usize {
        self.inner.max_atomic_operations.load(Ordering::Relaxed)
    }

    pub fn set_max_atomic_operations(&self, count: usize) {
        self.inner.max_atomic_operations.store(count, Ordering::Relaxed)
    }
}

struct InMemoryStoreConfigInner {
    max_value_size: AtomicUsize,
    max_atomic_operations: AtomicUsize,
}

impl InMemoryStoreConfigInner {
    fn new() -> Self {
        InMemoryStoreConfigInner {
            max_value_size: AtomicUsize::new(DEFAULT_MAX_VALUE_SIZE),
            max_atomic_operations: AtomicUsize::new(DEFAULT_MAX_ATOMIC_OPERATIONS),
        }
    }
}

impl Default for InMemoryStoreConfigInner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = InMemoryStoreConfig::new();
        assert_eq!(config.max_value_size(), DEFAULT_MAX_VALUE_SIZE);
        assert_eq!(config.max_atomic_operations(), DEFAULT_MAX_ATOMIC_OPERATIONS);
    }

    #[test]
    fn clones_share_settings() {
        let config = InMemoryStoreConfig::default();
        let clone = config.clone();
        clone.set_max_value_size(512);
        clone.set_max_atomic_operations(8);
        assert_eq!(config.max_value_size(), 512);
        assert_eq!(config.max_atomic_operations(), 8);
    }
}
