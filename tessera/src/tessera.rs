use crate::collection::{Collection, CollectionDescriptor, DocumentValue, ManagedCollection};
use crate::errors::{ErrorKind, TesseraError, TesseraResult};
use crate::key::{Key, KeyPart};
use crate::store::{AtomicOperation, KeyRange, KvStore, ScanOptions};
use crate::tessera_builder::TesseraBuilder;
use crate::tessera_config::TesseraConfig;
use dashmap::DashMap;
use std::sync::Arc;

/// A database: one store, one key prefix and the collections opened on them.
///
/// `Tessera` is a cheap handle; clones share the store, the configuration and the registry of
/// opened collections. The database owns no background threads and holds no locks between
/// calls, so handles can be passed freely between threads.
///
/// # Examples
///
/// ```rust,ignore
/// let db = Tessera::builder().open()?;
/// let users = db.collection(&users_descriptor)?;
/// users.add(user)?;
///
/// assert_eq!(db.count_all()?, 1);
/// db.close()?;
/// ```
#[derive(Clone)]
pub struct Tessera {
    inner: Arc<TesseraInner>,
}

impl Tessera {
    pub fn builder() -> TesseraBuilder {
        TesseraBuilder::new()
    }

    pub(crate) fn open(store: KvStore, config: TesseraConfig) -> TesseraResult<Self> {
        let db = Tessera {
            inner: Arc::new(TesseraInner {
                store,
                config,
                collections: DashMap::new(),
            }),
        };
        db.inner.ensure_opened()?;
        log::info!("Opened tessera database {}", db.inner.config.key_prefix());
        Ok(db)
    }

    /// Opens the collection `descriptor` declares. Opening a name again replaces the earlier
    /// registration; handles obtained before stay usable.
    pub fn collection<I: 'static, O: DocumentValue>(
        &self,
        descriptor: &CollectionDescriptor<I, O>,
    ) -> TesseraResult<Collection<I, O>> {
        self.inner.ensure_opened()?;
        let collection = Collection::new(
            descriptor,
            self.inner.store.clone(),
            self.inner.config.clone(),
        )?;
        self.inner
            .collections
            .insert(descriptor.name().to_string(), collection.managed());
        Ok(collection)
    }

    /// Names of the collections opened on this database, sorted.
    pub fn list_collection_names(&self) -> TesseraResult<Vec<String>> {
        self.inner.ensure_opened()?;
        let mut names: Vec<String> = self
            .inner
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        Ok(names)
    }

    pub fn has_collection(&self, name: &str) -> TesseraResult<bool> {
        self.inner.ensure_opened()?;
        Ok(self.inner.collections.contains_key(name))
    }

    /// Sum of the document counts of every opened collection.
    pub fn count_all(&self) -> TesseraResult<usize> {
        let mut total = 0;
        for collection in self.inner.registered()? {
            total += collection.count()?;
        }
        Ok(total)
    }

    /// Deletes the documents of every opened collection; returns how many were deleted.
    pub fn delete_all(&self) -> TesseraResult<usize> {
        let mut total = 0;
        for collection in self.inner.registered()? {
            let deleted = collection.delete_all()?;
            log::debug!("Deleted {} documents from {}", deleted, collection.name());
            total += deleted;
        }
        Ok(total)
    }

    /// Removes every key under the database prefix, including data of collections never opened
    /// on this handle. Returns the number of removed store entries.
    pub fn wipe(&self) -> TesseraResult<usize> {
        self.inner.ensure_opened()?;
        let prefix = Key::new(vec![KeyPart::from(self.inner.config.key_prefix())]).encode();
        let range = KeyRange::prefix(&prefix);
        // one commit per page, so a page may not outgrow the store's operation limit
        let limit = self
            .inner
            .config
            .batch_size()
            .min(self.inner.store.max_atomic_operations())
            .max(1);
        let options = ScanOptions::new(limit, false);

        let mut removed = 0;
        loop {
            let page = self.inner.store.scan(&range, &options)?;
            if page.entries.is_empty() {
                break;
            }

            let mut op = AtomicOperation::new();
            for entry in &page.entries {
                op.delete(entry.key.clone());
            }
            self.inner.store.commit(op)?;
            removed += page.entries.len();

            if page.cursor.is_none() {
                break;
            }
        }
        log::info!("Wiped {} entries under {}", removed, self.inner.config.key_prefix());
        Ok(removed)
    }

    pub fn close(&self) -> TesseraResult<()> {
        self.inner.ensure_opened()?;
        self.inner.collections.clear();
        self.inner.store.close()?;
        log::info!("Closed tessera database {}", self.inner.config.key_prefix());
        Ok(())
    }

    pub fn is_closed(&self) -> TesseraResult<bool> {
        self.inner.store.is_closed()
    }

    pub fn config(&self) -> TesseraConfig {
        self.inner.config.clone()
    }

    pub fn store(&self) -> KvStore {
        self.inner.store.clone()
    }
}

struct TesseraInner {
    store: KvStore,
    config: TesseraConfig,
    collections: DashMap<String, Arc<dyn ManagedCollection>>,
}

impl TesseraInner {
    fn ensure_opened(&self) -> TesseraResult<()> {
        if self.store.is_closed()? {
            log::error!("Tessera store is closed");
            return Err(TesseraError::new(
                "Tessera store is closed",
                ErrorKind::StoreAlreadyClosed,
            ));
        }
        Ok(())
    }

    /// Snapshot of the registry, so no map guard is held across store calls.
    fn registered(&self) -> TesseraResult<Vec<Arc<dyn ManagedCollection>>> {
        self.ensure_opened()?;
        Ok(self
            .collections
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }
}
