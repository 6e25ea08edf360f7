use crate::errors::{ErrorKind, TesseraError, TesseraResult};
use crate::store::{AtomicOperation, CommitResult, KeyRange, KvEntry, ScanOptions, ScanPage};
use crate::store::Versionstamp;
use std::ops::Deref;
use std::sync::Arc;

/// Low-level interface every store backend implements.
///
/// # Purpose
/// Defines the contract Tessera needs from an ordered, transactional key-value store. The
/// collection layer never writes outside of [`commit`](KvStoreProvider::commit), so a backend
/// only has to make that one call atomic.
///
/// # Contract
/// - `get_many` reads all keys from one consistent snapshot.
/// - `scan` returns entries of `range` in key order (descending when `reverse`), at most
///   `limit` of them, and a cursor only when more entries remain.
/// - `commit` evaluates every check and applies every mutation as one unit, stamping the
///   written keys with a single new versionstamp. A failed check yields
///   [`CommitResult::Conflict`] and writes nothing.
/// - Transport or backend failures surface as [`ErrorKind::StoreUnavailable`].
///
/// # Implementations
/// - `InMemoryStore`: concurrent skip list, for tests and ephemeral data
/// - `FjallStore`: persistent storage via Fjall
pub trait KvStoreProvider: Send + Sync {
    fn get(&self, key: &[u8]) -> TesseraResult<Option<KvEntry>>;

    fn get_many(&self, keys: &[Vec<u8>]) -> TesseraResult<Vec<Option<KvEntry>>>;

    fn scan(&self, range: &KeyRange, options: &ScanOptions) -> TesseraResult<ScanPage>;

    fn commit(&self, operation: AtomicOperation) -> TesseraResult<CommitResult>;

    /// Largest value a single entry may hold, in bytes.
    fn max_value_size(&self) -> usize;

    /// Largest number of checks and mutations one atomic operation may carry.
    fn max_atomic_operations(&self) -> usize;

    fn close(&self) -> TesseraResult<()>;

    fn is_closed(&self) -> TesseraResult<bool>;

    /// Unconditioned put.
    fn set(&self, key: Vec<u8>, value: Vec<u8>) -> TesseraResult<Versionstamp> {
        let mut op = AtomicOperation::new();
        op.set(key, value);
        match self.commit(op)? {
            CommitResult::Committed(stamp) => Ok(stamp),
            CommitResult::Conflict => Err(TesseraError::new(
                "Unconditioned put reported a conflict",
                ErrorKind::InternalError,
            )),
        }
    }

    /// Unconditioned delete.
    fn delete(&self, key: Vec<u8>) -> TesseraResult<()> {
        let mut op = AtomicOperation::new();
        op.delete(key);
        self.commit(op).map(|_| ())
    }
}

/// Shared handle to a store backend. Cloning only bumps a reference count.
#[derive(Clone)]
pub struct KvStore {
    inner: Arc<dyn KvStoreProvider>,
}

impl KvStore {
    pub fn new<T: KvStoreProvider + 'static>(inner: T) -> Self {
        KvStore {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for KvStore {
    type Target = Arc<dyn KvStoreProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
