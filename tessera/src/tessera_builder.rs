use crate::errors::{TesseraError, TesseraResult};
use crate::store::memory::InMemoryStore;
use crate::store::{KvStore, KvStoreProvider};
use crate::tessera::Tessera;
use crate::tessera_config::TesseraConfig;

/// Fluent setup of a [`Tessera`] database.
///
/// Setters record the first invalid value and [`open`](TesseraBuilder::open) returns it, so a
/// chain can be written without checking every step. Without an explicit store the database
/// runs on an [`InMemoryStore`].
///
/// # Examples
///
/// ```rust,ignore
/// let db = Tessera::builder()
///     .key_prefix("app")
///     .batch_size(200)
///     .store(FjallModule::with_config().db_path("/tmp/app").build().open_store()?)
///     .open()?;
/// ```
#[derive(Default)]
pub struct TesseraBuilder {
    error: Option<TesseraError>,
    config: TesseraConfig,
    store: Option<KvStore>,
}

impl TesseraBuilder {
    pub fn new() -> Self {
        TesseraBuilder {
            error: None,
            config: TesseraConfig::new(),
            store: None,
        }
    }

    /// First element of every key the database writes; separates databases sharing a store.
    pub fn key_prefix(mut self, prefix: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_key_prefix(prefix) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_batch_size(batch_size) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_max_retries(max_retries) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn store<T: KvStoreProvider + 'static>(mut self, store: T) -> Self {
        self.store = Some(KvStore::new(store));
        self
    }

    pub fn open(self) -> TesseraResult<Tessera> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let store = match self.store {
            Some(store) => store,
            None => KvStore::new(InMemoryStore::default()),
        };
        Tessera::open(store, self.config)
    }
}
