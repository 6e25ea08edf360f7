use crate::config::FjallConfig;
use crate::store::FjallStore;
use fjall::CompressionType;
use tessera::errors::TesseraResult;

/// Entry point of the adapter: configures and opens a [`FjallStore`].
///
/// # Examples
///
/// ```rust,ignore
/// use tessera::Tessera;
/// use tessera_fjall_adapter::FjallModule;
///
/// let store = FjallModule::with_config()
///     .db_path("/var/lib/app/db")
///     .fsync_frequency(100)
///     .build()
///     .open_store()?;
/// let db = Tessera::builder().store(store).open()?;
/// ```
pub struct FjallModule {
    store_config: FjallConfig,
}

impl FjallModule {
    #[inline]
    pub fn with_config() -> FjallModuleBuilder {
        FjallModuleBuilder::new()
    }

    pub fn config(&self) -> &FjallConfig {
        &self.store_config
    }

    /// Opens or creates the keyspace at the configured path.
    pub fn open_store(&self) -> TesseraResult<FjallStore> {
        FjallStore::open(self.store_config.clone())
    }
}

#[derive(Default)]
pub struct FjallModuleBuilder {
    store_config: FjallConfig,
}

impl FjallModuleBuilder {
    #[inline]
    pub fn new() -> FjallModuleBuilder {
        FjallModuleBuilder {
            store_config: FjallConfig::new(),
        }
    }

    pub fn production_preset(self) -> Self {
        let cpus = std::thread::available_parallelism()
            .map(usize::from)
            .unwrap_or(4);

        self.block_cache_capacity(256 * 1024 * 1024)
            .max_write_buffer_size(128 * 1024 * 1024)
            .max_memtable_size(32 * 1024 * 1024)
            .flush_workers(cpus)
            .compaction_workers((cpus / 2).max(1))
            .bloom_filter_bits(10)
            .fsync_frequency(100)
            .compression_type(CompressionType::Lz4)
    }

    /// Small caches and a single worker of each kind; suited to tests.
    pub fn low_memory_preset(self) -> Self {
        self.block_cache_capacity(16 * 1024 * 1024)
            .max_write_buffer_size(32 * 1024 * 1024)
            .max_memtable_size(8 * 1024 * 1024)
            .flush_workers(1)
            .compaction_workers(1)
            .bloom_filter_bits(10)
    }

    #[inline]
    pub fn db_path(self, db_path: &str) -> Self {
        self.store_config.set_db_path(db_path);
        self
    }

    #[inline]
    pub fn manual_journal_persist(self, manual_journal_persist: bool) -> Self {
        self.store_config
            .set_manual_journal_persist(manual_journal_persist);
        self
    }

    #[inline]
    pub fn flush_workers(self, flush_workers: usize) -> Self {
        self.store_config.set_flush_workers(flush_workers);
        self
    }

    #[inline]
    pub fn compaction_workers(self, compaction_workers: usize) -> Self {
        self.store_config.set_compaction_workers(compaction_workers);
        self
    }

    #[inline]
    pub fn block_cache_capacity(self, block_cache_capacity: u64) -> Self {
        self.store_config.set_block_cache_capacity(block_cache_capacity);
        self
    }

    #[inline]
    pub fn max_journaling_size(self, max_journaling_size: u64) -> Self {
        self.store_config.set_max_journaling_size(max_journaling_size);
        self
    }

    #[inline]
    pub fn max_write_buffer_size(self, max_write_buffer_size: u64) -> Self {
        self.store_config
            .set_max_write_buffer_size(max_write_buffer_size);
        self
    }

    #[inline]
    pub fn fsync_frequency(self, fsync_frequency: u16) -> Self {
        self.store_config.set_fsync_frequency(fsync_frequency);
        self
    }

    #[inline]
    pub fn bloom_filter_bits(self, bloom_filter_bits: u8) -> Self {
        self.store_config
            .set_bloom_filter_bits(bloom_filter_bits.min(i8::MAX as u8) as i8);
        self
    }

    #[inline]
    pub fn disable_bloom_filter(self) -> Self {
        self.store_config.set_bloom_filter_bits(-1);
        self
    }

    #[inline]
    pub fn compression_type(self, compression_type: CompressionType) -> Self {
        self.store_config.set_compression_type(compression_type);
        self
    }

    #[inline]
    pub fn max_memtable_size(self, max_memtable_size: u32) -> Self {
        self.store_config.set_max_memtable_size(max_memtable_size);
        self
    }

    #[inline]
    pub fn block_size(self, block_size: u32) -> Self {
        self.store_config.set_block_size(block_size);
        self
    }

    #[inline]
    pub fn max_value_size(self, max_value_size: usize) -> Self {
        self.store_config.set_max_value_size(max_value_size);
        self
    }

    #[inline]
    pub fn max_atomic_operations(self, max_atomic_operations: usize) -> Self {
        self.store_config
            .set_max_atomic_operations(max_atomic_operations);
        self
    }

    pub fn build(self) -> FjallModule {
        FjallModule {
            store_config: self.store_config,
        }
    }
}
