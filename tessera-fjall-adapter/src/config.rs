use fjall::{CompressionType, Config, PartitionCreateOptions};
use std::sync::atomic::{AtomicBool, AtomicI8, AtomicU16, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tessera::common::{atomic, Atomic, DEFAULT_MAX_ATOMIC_OPERATIONS, DEFAULT_MAX_VALUE_SIZE};

/// Settings of a [`FjallStore`](crate::FjallStore).
///
/// Keyspace settings (path, journal, workers, caches) apply when the keyspace opens; partition
/// settings (bloom filter, compression, memtable and block size) when its partitions open. The
/// entry limits are enforced on every commit.
///
/// Build one through [`FjallModule::with_config`](crate::FjallModule::with_config).
#[derive(Clone)]
pub struct FjallConfig {
    inner: Arc<FjallConfigInner>,
}

impl Default for FjallConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl FjallConfig {
    #[inline]
    pub fn new() -> FjallConfig {
        FjallConfig {
            inner: Arc::new(FjallConfigInner::new()),
        }
    }

    pub(crate) fn keyspace_config(&self) -> Config {
        let mut config = Config::new(self.db_path())
            .manual_journal_persist(self.manual_journal_persist())
            .flush_workers(self.flush_workers())
            .compaction_workers(self.compaction_workers())
            .cache_size(self.block_cache_capacity())
            .max_journaling_size(self.max_journaling_size())
            .max_write_buffer_size(self.max_write_buffer_size());

        if self.fsync_frequency() > 0 {
            config = config.fsync_ms(Some(self.fsync_frequency()));
        }
        config
    }

    pub(crate) fn partition_config(&self) -> PartitionCreateOptions {
        PartitionCreateOptions::default()
            .bloom_filter_bits(if self.bloom_filter_bits() < 0 {
                None
            } else {
                Some(self.bloom_filter_bits() as u8)
            })
            .compression(self.compression_type())
            .max_memtable_size(self.max_memtable_size())
            .block_size(self.block_size())
    }

    #[inline]
    pub fn db_path(&self) -> &str {
        self.inner.db_path.get().map(String::as_str).unwrap_or("")
    }

    /// The path is set once; later calls are ignored.
    #[inline]
    pub(crate) fn set_db_path(&self, db_path: &str) {
        let _ = self.inner.db_path.set(db_path.to_string());
    }

    #[inline]
    pub fn manual_journal_persist(&self) -> bool {
        self.inner.manual_journal_persist.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_manual_journal_persist(&self, v: bool) {
        self.inner.manual_journal_persist.store(v, Ordering::Relaxed)
    }

    #[inline]
    pub fn flush_workers(&self) -> usize {
        self.inner.flush_workers.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_flush_workers(&self, c: usize) {
        self.inner.flush_workers.store(c, Ordering::Relaxed)
    }

    #[inline]
    pub fn compaction_workers(&self) -> usize {
        self.inner.compaction_workers.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_compaction_workers(&self, c: usize) {
        self.inner.compaction_workers.store(c, Ordering::Relaxed)
    }

    #[inline]
    pub fn block_cache_capacity(&self) -> u64 {
        self.inner.block_cache_capacity.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_block_cache_capacity(&self, c: u64) {
        self.inner.block_cache_capacity.store(c, Ordering::Relaxed)
    }

    #[inline]
    pub fn max_journaling_size(&self) -> u64 {
        self.inner.max_journaling_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_max_journaling_size(&self, s: u64) {
        self.inner.max_journaling_size.store(s, Ordering::Relaxed)
    }

    #[inline]
    pub fn max_write_buffer_size(&self) -> u64 {
        self.inner.max_write_buffer_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_max_write_buffer_size(&self, s: u64) {
        self.inner.max_write_buffer_size.store(s, Ordering::Relaxed)
    }

    /// Milliseconds between background fsyncs; 0 leaves syncing to fjall.
    #[inline]
    pub fn fsync_frequency(&self) -> u16 {
        self.inner.fsync_frequency.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_fsync_frequency(&self, f: u16) {
        self.inner.fsync_frequency.store(f, Ordering::Relaxed)
    }

    /// Bits per key of partition bloom filters; negative disables them.
    #[inline]
    pub fn bloom_filter_bits(&self) -> i8 {
        self.inner.bloom_filter_bits.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_bloom_filter_bits(&self, b: i8) {
        self.inner.bloom_filter_bits.store(b, Ordering::Relaxed)
    }

    #[inline]
    pub fn compression_type(&self) -> CompressionType {
        *self.inner.compression_type.read()
    }

    #[inline]
    pub(crate) fn set_compression_type(&self, ct: CompressionType) {
        *self.inner.compression_type.write() = ct
    }

    #[inline]
    pub fn max_memtable_size(&self) -> u32 {
        self.inner.max_memtable_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_max_memtable_size(&self, s: u32) {
        self.inner.max_memtable_size.store(s, Ordering::Relaxed)
    }

    #[inline]
    pub fn block_size(&self) -> u32 {
        self.inner.block_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_block_size(&self, s: u32) {
        self.inner.block_size.store(s, Ordering::Relaxed)
    }

    /// Largest payload, in bytes, one entry may hold.
    #[inline]
    pub fn max_value_size(&self) -> usize {
        self.inner.max_value_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_max_value_size(&self, s: usize) {
        self.inner.max_value_size.store(s, Ordering::Relaxed)
    }

    #[inline]
    pub fn max_atomic_operations(&self) -> usize {
        self.inner.max_atomic_operations.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_max_atomic_operations(&self, c: usize) {
        self.inner.max_atomic_operations.store(c, Ordering::Relaxed)
    }
}

struct FjallConfigInner {
    db_path: OnceLock<String>,
    manual_journal_persist: AtomicBool,
    flush_workers: AtomicUsize,
    compaction_workers: AtomicUsize,
    block_cache_capacity: AtomicU64,
    max_journaling_size: AtomicU64,
    max_write_buffer_size: AtomicU64,
    fsync_frequency: AtomicU16,
    bloom_filter_bits: AtomicI8,
    compression_type: Atomic<CompressionType>,
    max_memtable_size: AtomicU32,
    block_size: AtomicU32,
    max_value_size: AtomicUsize,
    max_atomic_operations: AtomicUsize,
}

impl FjallConfigInner {
    const DEFAULT_BLOCK_CACHE_MB: u64 = 64;
    const DEFAULT_WRITE_BUFFER_MB: u64 = 128;
    const DEFAULT_MAX_JOURNALING_MB: u64 = 512;
    const DEFAULT_MEMTABLE_MB: u32 = 32;

    fn new() -> FjallConfigInner {
        let cpus = std::thread::available_parallelism()
            .map(usize::from)
            .unwrap_or(4);

        FjallConfigInner {
            db_path: OnceLock::new(),
            manual_journal_persist: AtomicBool::new(false),
            flush_workers: AtomicUsize::new(cpus.max(1)),
            compaction_workers: AtomicUsize::new((cpus / 2).max(1)),
            block_cache_capacity: AtomicU64::new(Self::DEFAULT_BLOCK_CACHE_MB * 1_024 * 1_024),
            max_journaling_size: AtomicU64::new(Self::DEFAULT_MAX_JOURNALING_MB * 1_024 * 1_024),
            max_write_buffer_size: AtomicU64::new(Self::DEFAULT_WRITE_BUFFER_MB * 1_024 * 1_024),
            fsync_frequency: AtomicU16::new(0),
            bloom_filter_bits: AtomicI8::new(10),
            compression_type: atomic(CompressionType::Lz4),
            max_memtable_size: AtomicU32::new(Self::DEFAULT_MEMTABLE_MB * 1_024 * 1_024),
            block_size: AtomicU32::new(4 * 1_024),
            max_value_size: AtomicUsize::new(DEFAULT_MAX_VALUE_SIZE),
            max_atomic_operations: AtomicUsize::new(DEFAULT_MAX_ATOMIC_OPERATIONS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[ctor::ctor]
    fn init() {
        colog::init();
    }

    #[test]
    fn defaults() {
        let config = FjallConfig::new();
        assert_eq!(config.db_path(), "");
        assert!(!config.manual_journal_persist());
        assert!(config.flush_workers() >= 1);
        assert!(config.compaction_workers() >= 1);
        assert_eq!(config.block_cache_capacity(), 64 * 1024 * 1024);
        assert_eq!(config.bloom_filter_bits(), 10);
        assert_eq!(config.compression_type(), CompressionType::Lz4);
        assert_eq!(config.max_value_size(), 65_536);
        assert_eq!(config.max_atomic_operations(), 1_000);
    }

    #[test]
    fn db_path_is_set_once() {
        let config = FjallConfig::new();
        config.set_db_path("/tmp/first");
        config.set_db_path("/tmp/second");
        assert_eq!(config.db_path(), "/tmp/first");
    }

    #[test]
    fn clones_share_settings() {
        let config = FjallConfig::new();
        let clone = config.clone();
        clone.set_max_value_size(4096);
        clone.set_compression_type(CompressionType::None);
        clone.set_fsync_frequency(50);
        assert_eq!(config.max_value_size(), 4096);
        assert_eq!(config.compression_type(), CompressionType::None);
        assert_eq!(config.fsync_frequency(), 50);
    }
}
