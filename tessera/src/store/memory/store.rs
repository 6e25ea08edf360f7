use crate::errors::{ErrorKind, TesseraError, TesseraResult};
use crate::store::memory::InMemoryStoreConfig;
use crate::store::{
    AtomicOperation, CommitResult, KeyRange, KvEntry, KvStoreProvider, Mutation, ScanOptions,
    ScanPage, Versionstamp,
};
use crossbeam_skiplist::SkipMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// In-memory store backed by a concurrent skip list.
///
/// # Purpose
/// `InMemoryStore` keeps every entry in memory and implements the full store contract, atomic
/// operations included. It is the default backend of a database opened without an explicit
/// store and the backend unit tests run against.
///
/// # Characteristics
/// - **Thread-Safe**: Can be safely cloned and shared across threads
/// - **Concurrent Skip List**: O(log n) point reads and ordered range scans in both directions
/// - **Serialized Commits**: commits take an exclusive lock while reads share it, so every read
///   sees either all or none of a commit's mutations
///
/// # Usage
/// ```text
/// let store = InMemoryStore::new(InMemoryStoreConfig::new());
/// let db = Tessera::builder().store(store).open()?;
/// ```
#[derive(Clone)]
pub struct InMemoryStore {
    inner: Arc<InMemoryStoreInner>,
}

impl InMemoryStore {
    pub fn new(config: InMemoryStoreConfig) -> Self {
        InMemoryStore {
            inner: Arc::new(InMemoryStoreInner::new(config)),
        }
    }

    /// Number of entries currently stored, across every key space.
    pub fn len(&self) -> usize {
        self.inner.backing_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.backing_map.is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        InMemoryStore::new(InMemoryStoreConfig::new())
    }
}

impl KvStoreProvider for InMemoryStore {
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

struct StoredValue {
    value: Vec<u8>,
    versionstamp: Versionstamp,
}

struct InMemoryStoreInner {
    backing_map: SkipMap<Vec<u8>, StoredValue>,
    commit_lock: RwLock<()>,
    version: AtomicU64,
    closed: AtomicBool,
    config: InMemoryStoreConfig,
}

impl InMemoryStoreInner {
    fn new(config: InMemoryStoreConfig) -> Self {
        InMemoryStoreInner {
            backing_map: SkipMap::new(),
            commit_lock: RwLock::new(()),
            version: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            config,
        }
    }

    fn check_opened(&self) -> TesseraResult<()> {
        if self.closed.load(Ordering::Relaxed) {
            log::error!("In-memory store is closed");
            return Err(TesseraError::new(
                "In-memory store is closed",
                ErrorKind::StoreAlreadyClosed,
            ));
        }
        Ok(())
    }

    fn read_entry(&self, key: &[u8]) -> Option<KvEntry> {
        self.backing_map.get(key).map(|entry| {
            let stored = entry.value();
            KvEntry::new(key.to_vec(), stored.value.clone(), stored.versionstamp)
        })
    }

    fn get(&self, key: &[u8]) -> TesseraResult<Option<KvEntry>> {
        self.check_opened()?;
        let _guard = self.commit_lock.read();
        Ok(self.read_entry(key))
    }

    fn get_many(&self, keys: &[Vec<u8>]) -> TesseraResult<Vec<Option<KvEntry>>> {
        self.check_opened()?;
        let _guard = self.commit_lock.read();
        Ok(keys.iter().map(|key| self.read_entry(key)).collect())
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
        let bounds = (range.start.clone(), range.end.clone());
        let mut iter = self.backing_map.range(bounds);

        // read one past the limit to learn whether the range continues
        let mut entries = Vec::with_capacity(options.limit.min(1_024) + 1);
        while entries.len() <= options.limit {
            let next = if options.reverse {
                iter.next_back()
            } else {
                iter.next()
            };
            match next {
                Some(entry) => {
                    let stored = entry.value();
                    entries.push(KvEntry::new(
                        entry.key().clone(),
                        stored.value.clone(),
                        stored.versionstamp,
                    ));
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
            let current = self
                .backing_map
                .get(check.key.as_slice())
                .map(|entry| entry.value().versionstamp);
            if current != check.versionstamp {
                log::trace!("Atomic check failed: expected {:?}, found {:?}", check.versionstamp, current);
                return Ok(CommitResult::Conflict);
            }
        }

        let versionstamp = Versionstamp::new(self.version.fetch_add(1, Ordering::SeqCst) + 1);
        let (_, mutations) = operation.into_parts();
        for mutation in mutations {
            match mutation {
                Mutation::Set { key, value } => {
                    self.backing_map.insert(
                        key,
                        StoredValue {
                            value,
                            versionstamp,
                        },
                    );
                }
                Mutation::Delete { key } => {
                    self.backing_map.remove(key.as_slice());
                }
            }
        }
        Ok(CommitResult::Committed(versionstamp))
    }

    fn close(&self) -> TesseraResult<()> {
        self.closed.store(true, Ordering::Relaxed);
        self.backing_map.clear();
        log::info!("In-memory store closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ops::Bound;
    use std::thread;

    fn store() -> InMemoryStore {
        InMemoryStore::default()
    }

    fn put(store: &InMemoryStore, key: &[u8], value: &[u8]) -> Versionstamp {
        store.set(key.to_vec(), value.to_vec()).unwrap()
    }

    fn keys_of(page: &ScanPage) -> Vec<Vec<u8>> {
        page.entries.iter().map(|e| e.key.clone()).collect()
    }

    #[test]
    fn get_returns_value_and_versionstamp() {
        let store = store();
        let stamp = put(&store, b"a", b"1");
        let entry = store.get(b"a").unwrap().unwrap();
        assert_eq!(entry.value, b"1");
        assert_eq!(entry.versionstamp, stamp);
        assert!(store.get(b"b").unwrap().is_none());
    }

    #[test]
    fn versionstamps_increase_per_commit() {
        let store = store();
        let first = put(&store, b"a", b"1");
        let second = put(&store, b"a", b"2");
        assert!(second > first);
    }

    #[test]
    fn check_on_absent_key_guards_creation() {
        let store = store();
        let mut op = AtomicOperation::new();
        op.check(b"a".to_vec(), None).set(b"a".to_vec(), b"1".to_vec());
        assert!(store.commit(op.clone()).unwrap().is_committed());
        assert_eq!(store.commit(op).unwrap(), CommitResult::Conflict);
        assert_eq!(store.get(b"a").unwrap().unwrap().value, b"1");
    }

    #[test]
    fn failed_check_writes_nothing() {
        let store = store();
        let stamp = put(&store, b"a", b"1");
        put(&store, b"a", b"2");

        let mut op = AtomicOperation::new();
        op.check(b"a".to_vec(), Some(stamp))
            .set(b"a".to_vec(), b"3".to_vec())
            .set(b"b".to_vec(), b"3".to_vec());
        assert_eq!(store.commit(op).unwrap(), CommitResult::Conflict);
        assert_eq!(store.get(b"a").unwrap().unwrap().value, b"2");
        assert!(store.get(b"b").unwrap().is_none());
    }

    #[test]
    fn later_mutation_of_same_key_wins() {
        let store = store();
        let mut op = AtomicOperation::new();
        op.delete(b"a".to_vec()).set(b"a".to_vec(), b"x".to_vec());
        store.commit(op).unwrap();
        assert_eq!(store.get(b"a").unwrap().unwrap().value, b"x");
    }

    #[test]
    fn scan_pages_in_both_directions() {
        let store = store();
        for key in [b"a", b"b", b"c", b"d", b"e"] {
            put(&store, key, b"v");
        }
        let range = KeyRange::new(Bound::Included(b"b".to_vec()), Bound::Excluded(b"e".to_vec()));

        let page = store.scan(&range, &ScanOptions::new(2, false)).unwrap();
        assert_eq!(keys_of(&page), vec![b"b".to_vec(), b"c".to_vec()]);
        assert_eq!(page.cursor, Some(b"c".to_vec()));

        let rest = store
            .scan(&range.resume_after(b"c", false), &ScanOptions::new(2, false))
            .unwrap();
        assert_eq!(keys_of(&rest), vec![b"d".to_vec()]);
        assert_eq!(rest.cursor, None);

        let reverse = store.scan(&range, &ScanOptions::new(10, true)).unwrap();
        assert_eq!(
            keys_of(&reverse),
            vec![b"d".to_vec(), b"c".to_vec(), b"b".to_vec()]
        );
        assert_eq!(reverse.cursor, None);
    }

    #[test]
    fn exact_fit_page_has_no_cursor() {
        let store = store();
        put(&store, b"a", b"v");
        put(&store, b"b", b"v");
        let range = KeyRange::new(Bound::Unbounded, Bound::Unbounded);
        let page = store.scan(&range, &ScanOptions::new(2, false)).unwrap();
        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.cursor, None);
    }

    #[test]
    fn empty_range_scans_nothing() {
        let store = store();
        put(&store, b"a", b"v");
        let range = KeyRange::new(Bound::Included(b"z".to_vec()), Bound::Excluded(b"a".to_vec()));
        let page = store.scan(&range, &ScanOptions::new(5, false)).unwrap();
        assert!(page.entries.is_empty());
    }

    #[test]
    fn rejects_oversized_values() {
        let config = InMemoryStoreConfig::new();
        config.set_max_value_size(4);
        let store = InMemoryStore::new(config);
        let err = store.set(b"a".to_vec(), vec![0; 5]).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValueTooLarge);
    }

    #[test]
    fn closed_store_rejects_calls() {
        let store = store();
        store.close().unwrap();
        assert!(store.is_closed().unwrap());
        assert_eq!(
            store.get(b"a").unwrap_err().kind(),
            &ErrorKind::StoreAlreadyClosed
        );
    }

    #[test]
    fn concurrent_creates_of_same_key_commit_once() {
        let store = store();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                thread::spawn(move || {
                    let mut op = AtomicOperation::new();
                    op.check(b"k".to_vec(), None)
                        .set(b"k".to_vec(), vec![i as u8]);
                    store.commit(op).unwrap().is_committed()
                })
            })
            .collect();

        let committed = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(committed, 1);
    }
}
