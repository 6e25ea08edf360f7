use super::{CollectionContext, ReadOperations};
use crate::collection::{Document, DocumentValue};
use crate::errors::{ErrorKind, TesseraError, TesseraResult};
use crate::index::{IndexDescriptor, IndexKind};
use crate::key::{decode_single, KeyPart};
use crate::query::{Page, Paginator, QueryOptions};
use crate::store::{KeyRange, KvEntry};
use std::ops::ControlFlow;
use std::sync::Arc;

/// Lookups through declared indices.
///
/// Index entries and documents are written together, but a lookup reads the entry and the
/// document in two steps. A document whose index value no longer matches when it is read has
/// moved on, and is treated as absent.
#[derive(Clone)]
pub(crate) struct IndexOperations<O> {
    ctx: Arc<CollectionContext<O>>,
    read_operations: ReadOperations<O>,
}

impl<O: DocumentValue> IndexOperations<O> {
    pub fn new(ctx: Arc<CollectionContext<O>>, read_operations: ReadOperations<O>) -> Self {
        IndexOperations {
            ctx,
            read_operations,
        }
    }

    pub fn find_by_primary_index(
        &self,
        name: &str,
        value: &KeyPart,
    ) -> TesseraResult<Option<Document<O>>> {
        let index = self.ctx.index(name, IndexKind::Primary)?;
        let key = self.ctx.keys.index_key(name, value, None).encode();

        for _ in 0..=self.ctx.max_retries() {
            let entry = match self.ctx.store.get(&key)? {
                Some(entry) => entry,
                None => return Ok(None),
            };
            let id = self.id_of(&entry)?;
            match self.read_operations.find(&id)? {
                Some(document) if &index.value_of(document.value()) == value => {
                    return Ok(Some(document))
                }
                _ => log::debug!("Index {} moved while {} was read, retrying", name, id),
            }
        }
        Ok(None)
    }

    /// Runs `query` over the entries of a secondary index value.
    pub fn scan_secondary_index(
        &self,
        name: &str,
        value: &KeyPart,
        query: &QueryOptions<O>,
        visit: impl FnMut(Document<O>) -> TesseraResult<ControlFlow<()>>,
    ) -> TesseraResult<Option<String>> {
        let index = self.ctx.index(name, IndexKind::Secondary)?;
        if query.has_id_bounds() {
            log::error!("Index queries cannot be bounded by id");
            return Err(TesseraError::new(
                "Index queries cannot be bounded by id",
                ErrorKind::InvalidQuery,
            ));
        }

        let prefix = self.ctx.keys.index_value_prefix(name, value).encode();
        let paginator = Paginator::new(
            &self.ctx.store,
            KeyRange::prefix(&prefix),
            &prefix,
            self.ctx.batch_size(),
        );
        paginator.run(
            query,
            |entries| self.resolve_entries(index, value, entries),
            visit,
        )
    }

    pub fn find_by_secondary_index(
        &self,
        name: &str,
        value: &KeyPart,
        query: &QueryOptions<O>,
    ) -> TesseraResult<Page<O>> {
        let mut result = Vec::new();
        let cursor = self.scan_secondary_index(name, value, query, |document| {
            result.push(document);
            Ok(ControlFlow::Continue(()))
        })?;
        Ok(Page { result, cursor })
    }

    pub fn count_by_secondary_index(&self, name: &str, value: &KeyPart) -> TesseraResult<usize> {
        self.ctx.index(name, IndexKind::Secondary)?;
        let prefix = self.ctx.keys.index_value_prefix(name, value).encode();
        self.read_operations.count_keys(KeyRange::prefix(&prefix))
    }

    /// Number of entries an index holds across all values.
    pub fn count_index_entries(&self, name: &str) -> TesseraResult<usize> {
        let prefix = self.ctx.keys.index_prefix(name).encode();
        self.read_operations.count_keys(KeyRange::prefix(&prefix))
    }

    fn resolve_entries(
        &self,
        index: &IndexDescriptor<O>,
        value: &KeyPart,
        entries: Vec<KvEntry>,
    ) -> TesseraResult<Vec<Option<Document<O>>>> {
        let ids = entries
            .iter()
            .map(|entry| self.id_of(entry))
            .collect::<TesseraResult<Vec<_>>>()?;

        let documents = self.read_operations.fetch(&ids)?;
        Ok(documents
            .into_iter()
            .map(|document| {
                document.filter(|document| &index.value_of(document.value()) == value)
            })
            .collect())
    }

    fn id_of(&self, entry: &KvEntry) -> TesseraResult<KeyPart> {
        decode_single(&entry.value).map_err(|e| {
            log::error!("Index entry of {} holds no document id", self.ctx.name());
            TesseraError::new_with_cause(
                &format!("Index entry of {} holds no document id", self.ctx.name()),
                ErrorKind::Corruption,
                e,
            )
        })
    }
}
