use crate::config::FjallConfig;
use crate::version::fjall_version;
use crate::wrapper::{decode_counter, encode_counter, to_tessera_error, FjallValue};
use fjall::{Keyspace, PartitionHandle, PersistMode};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tessera::errors::{ErrorKind, TesseraError, TesseraResult};
use tessera::store::{
    AtomicOperation, CommitResult, KeyRange, KvEntry, KvStoreProvider, Mutation, ScanOptions,
    ScanPage, Versionstamp,
};

const DATA_PARTITION: &str = "tessera";
const META_PARTITION: &str = "tessera_meta";
const COMMIT_COUNTER_KEY: &[u8] = b"commit_counter";

/// A [`KvStoreProvider`] persisting to a fjall keyspace.
///
/// Entries live in one partition, each value prefixed with the versionstamp of the commit that
/// wrote it. The last issued versionstamp is persisted in a meta partition within the same
/// batch as the commit it belongs to, so stamps keep increasing across restarts.
///
/// Commits are serialized by a store-wide lock; point reads and scans share it, which makes a
/// `get_many` a consistent snapshot.
#[derive(Clone)]
pub struct FjallStore {
    inner: Arc<FjallStoreInner>,
}

impl FjallStore {
    pub fn open(config: FjallConfig) -> TesseraResult<FjallStore> {
        Ok(FjallStore {
            inner: Arc::new(FjallStoreInner::open(config)?),
        })
    }

    pub fn config(&self) -> &FjallConfig {
        &self.inner.config
    }

    /// Flushes the journal to disk.
    pub fn persist(&self) -> TesseraResult<()> {
        self.inner.check_opened()?;
        self.inner.persist()
    }

    /// The versionstamp of the latest commit.
    pub fn last_versionstamp(&self) -> Versionstamp {
        Versionstamp::new(self.inner.version.load(Ordering::SeqCst))
    }
}

impl KvStoreProvider for FjallStore {
    fn get(&self, key: &[u8]) -> TesseraResult<Option<KvEntry>> {
        self.inner.get(key)
    }

    fn get_many(&self, keys: &[Vec<u8>]) -> TesseraResult<Vec<Option<KvEntry>>> {
        self.inner.get_many(keys)
    }

    fn scan(&self, range: &KeyRange, options: &ScanOptions) -> TesseraResult<ScanPage> {
        self.inner.scan(range, options)
    }

    fn commit(&self, operation: AtomicOperation) -> TesseraResult<CommitResult> {
        self.inner.commit(operation)
    }

    fn max_value_size(&self) -> usize {
        self.inner.config.max_value_size()
    }

    fn max_atomic_operations(&self) -> usize {
        self.inner.config.max_atomic_operations()
    }

    fn close(&self) -> TesseraResult<()> {
        self.inner.close()
    }

    fn is_closed(&self) -> TesseraResult<bool> {
        Ok(self.inner.closed.load(Ordering::Relaxed))
    }
}

struct FjallStoreInner {
    keyspace: Keyspace,
    data: PartitionHandle,
    meta: PartitionHandle,
    commit_lock: RwLock<()>,
    version: AtomicU64,
    closed: AtomicBool,
    config: FjallConfig,
}

impl FjallStoreInner {
    fn open(config: FjallConfig) -> TesseraResult<Self> {
        if config.db_path().is_empty() {
            log::error!("Fjall store needs a db path");
            return Err(TesseraError::new(
                "Fjall store needs a db path",
                ErrorKind::InvalidOperation,
            ));
        }

        let keyspace = Keyspace::open(config.keyspace_config()).map_err(|err| {
            log::error!("Failed to open fjall keyspace at {}: {}", config.db_path(), err);
            to_tessera_error(err)
        })?;
        let data = keyspace
            .open_partition(DATA_PARTITION, config.partition_config())
            .map_err(to_tessera_error)?;
        let meta = keyspace
            .open_partition(META_PARTITION, config.partition_config())
            .map_err(to_tessera_error)?;

        let version = match meta.get(COMMIT_COUNTER_KEY).map_err(to_tessera_error)? {
            Some(bytes) => decode_counter(&bytes)?,
            None => 0,
        };

        log::info!(
            "Opened fjall {} store at {} (last versionstamp {})",
            fjall_version().unwrap_or_else(|_| "unknown".to_string()),
            config.db_path(),
            Versionstamp::new(version)
        );

        Ok(FjallStoreInner {
            keyspace,
            data,
            meta,
            commit_lock: RwLock::new(()),
            version: AtomicU64::new(version),
            closed: AtomicBool::new(false),
            config,
        })
    }

    fn check_opened(&self) -> TesseraResult<()> {
        if self.closed.load(Ordering::Relaxed) {
            log::error!("Fjall store at {} is closed", self.config.db_path());
            return Err(TesseraError::new(
                &format!("Fjall store at {} is closed", self.config.db_path()),
                ErrorKind::StoreAlreadyClosed,
            ));
        }
        Ok(())
    }

    fn read_entry(&self, key: &[u8]) -> TesseraResult<Option<KvEntry>> {
        match self.data.get(key).map_err(to_tessera_error)? {
            Some(bytes) => {
                let value = FjallValue::decode(&bytes)?;
                Ok(Some(KvEntry::new(key.to_vec(), value.payload, value.versionstamp)))
            }
            None => Ok(None),
        }
    }

    fn get(&self, key: &[u8]) -> TesseraResult<Option<KvEntry>> {
        self.check_opened()?;
        let _guard = self.commit_lock.read();
        self.read_entry(key)
    }

    fn get_many(&self, keys: &[Vec<u8>]) -> TesseraResult<Vec<Option<KvEntry>>> {
        self.check_opened()?;
        let _guard = self.commit_lock.read();
        keys.iter().map(|key| self.read_entry(key)).collect()
    }

    fn scan(&self, range: &KeyRange, options: &ScanOptions) -> TesseraResult<ScanPage> {
        self.check_opened()?;
        if options.limit == 0 {
            log::error!("Scan limit must be positive");
            return Err(TesseraError::new(
                "Scan limit must be positive",
                ErrorKind::InvalidQuery,
            ));
        }
        if range.is_empty() {
            return Ok(ScanPage::default());
        }

        let _guard = self.commit_lock.read();
        let mut iter = self.data.range((range.start.clone(), range.end.clone()));

        let mut entries = Vec::with_capacity(options.limit.min(1_024) + 1);
        while entries.len() <= options.limit {
            let next = if options.reverse {
                iter.next_back()
            } else {
                iter.next()
            };
            match next {
                Some(item) => {
                    let (key, bytes) = item.map_err(to_tessera_error)?;
                    let value = FjallValue::decode(&bytes)?;
                    entries.push(KvEntry::new(key.to_vec(), value.payload, value.versionstamp));
                }
                None => break,
            }
        }

        let cursor = if entries.len() > options.limit {
            entries.truncate(options.limit);
            entries.last().map(|entry| entry.key.clone())
        } else {
            None
        };
        Ok(ScanPage { entries, cursor })
    }

    fn commit(&self, operation: AtomicOperation) -> TesseraResult<CommitResult> {
        self.check_opened()?;
        operation.validate(
            self.config.max_value_size(),
            self.config.max_atomic_operations(),
        )?;

        let _guard = self.commit_lock.write();
        for check in operation.checks() {
            let current = match self.data.get(&check.key).map_err(to_tessera_error)? {
                Some(bytes) => Some(FjallValue::read_stamp(&bytes)?),
                None => None,
            };
            if current != check.versionstamp {
                log::trace!(
                    "Atomic check failed: expected {:?}, found {:?}",
                    check.versionstamp,
                    current
                );
                return Ok(CommitResult::Conflict);
            }
        }

        let next = self.version.load(Ordering::SeqCst) + 1;
        let versionstamp = Versionstamp::new(next);
        let (_, mutations) = operation.into_parts();

        let mut batch = self.keyspace.batch();
        for mutation in mutations {
            match mutation {
                Mutation::Set { key, value } => {
                    batch.insert(&self.data, key, FjallValue::encode(versionstamp, &value));
                }
                Mutation::Delete { key } => batch.remove(&self.data, key),
            }
        }
        batch.insert(&self.meta, COMMIT_COUNTER_KEY, encode_counter(next).to_vec());
        batch.commit().map_err(|err| {
            log::error!("Failed to commit batch at {}: {}", versionstamp, err);
            to_tessera_error(err)
        })?;

        self.version.store(next, Ordering::SeqCst);
        Ok(CommitResult::Committed(versionstamp))
    }

    fn persist(&self) -> TesseraResult<()> {
        self.keyspace
            .persist(PersistMode::SyncAll)
            .map_err(|err| {
                log::error!("Failed to persist fjall keyspace: {}", err);
                to_tessera_error(err)
            })
    }

    fn close(&self) -> TesseraResult<()> {
        self.check_opened()?;
        let _guard = self.commit_lock.write();
        self.persist()?;
        self.closed.store(true, Ordering::Relaxed);
        log::info!("Fjall store at {} closed", self.config.db_path());
        Ok(())
    }
}
