use crate::codec::DocumentCodec;
use crate::collection::DocumentValue;
use crate::errors::{ErrorKind, TesseraError, TesseraResult};
use crate::index::{IndexDescriptor, IndexKind};
use crate::key::CollectionKeys;
use crate::store::KvStore;
use crate::tessera_config::TesseraConfig;

/// State shared by the read, write and index operations of one collection.
pub(crate) struct CollectionContext<O> {
    pub keys: CollectionKeys,
    pub codec: DocumentCodec<O>,
    pub indices: Vec<IndexDescriptor<O>>,
    pub store: KvStore,
    pub config: TesseraConfig,
}

impl<O: DocumentValue> CollectionContext<O> {
    pub fn new(
        keys: CollectionKeys,
        codec: DocumentCodec<O>,
        indices: Vec<IndexDescriptor<O>>,
        store: KvStore,
        config: TesseraConfig,
    ) -> Self {
        CollectionContext {
            keys,
            codec,
            indices,
            store,
            config,
        }
    }

    pub fn name(&self) -> &str {
        self.keys.collection()
    }

    pub fn max_retries(&self) -> u32 {
        self.config.max_retries()
    }

    pub fn batch_size(&self) -> usize {
        self.config.batch_size()
    }

    pub fn index_descriptor(&self, name: &str) -> TesseraResult<&IndexDescriptor<O>> {
        match self.indices.iter().find(|index| index.name() == name) {
            Some(index) => Ok(index),
            None => {
                log::error!("Index {} is not declared on collection {}", name, self.name());
                Err(TesseraError::new(
                    &format!("Index {} is not declared on collection {}", name, self.name()),
                    ErrorKind::IndexNotFound,
                ))
            }
        }
    }

    /// Looks up a declared index and checks its kind.
    pub fn index(&self, name: &str, kind: IndexKind) -> TesseraResult<&IndexDescriptor<O>> {
        let index = self.index_descriptor(name)?;

        if index.kind() != kind {
            log::error!("Index {} is a {} index, not {}", name, index.kind(), kind);
            return Err(TesseraError::new(
                &format!("Index {} is a {} index, not {}", name, index.kind(), kind),
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(index)
    }
}
