use super::CollectionContext;
use crate::codec::{reassemble, StoredRecord};
use crate::collection::{Document, DocumentValue};
use crate::errors::{ErrorKind, TesseraError, TesseraResult};
use crate::key::{prefix_end, KeyPart};
use crate::query::{Page, Paginator, QueryOptions};
use crate::store::{KeyRange, KvEntry, ScanOptions};
use std::ops::{Bound, ControlFlow};
use std::sync::Arc;

/// A document as read for a write: the document plus the number of segments its record owns.
pub(crate) struct StoredDocument<O> {
    pub document: Document<O>,
    pub segment_count: u32,
}

#[derive(Clone)]
pub(crate) struct ReadOperations<O> {
    ctx: Arc<CollectionContext<O>>,
}

impl<O: DocumentValue> ReadOperations<O> {
    pub fn new(ctx: Arc<CollectionContext<O>>) -> Self {
        ReadOperations { ctx }
    }

    pub fn find(&self, id: &KeyPart) -> TesseraResult<Option<Document<O>>> {
        Ok(self.read_stored(id)?.map(|stored| stored.document))
    }

    pub fn read_stored(&self, id: &KeyPart) -> TesseraResult<Option<StoredDocument<O>>> {
        let key = self.ctx.keys.encoded_document_key(id);
        match self.ctx.store.get(&key)? {
            Some(head) => self.resolve_head(id.clone(), head),
            None => Ok(None),
        }
    }

    /// Documents of `ids` in request order, absent ids skipped.
    pub fn find_many(&self, ids: &[KeyPart]) -> TesseraResult<Vec<Document<O>>> {
        Ok(self.fetch(ids)?.into_iter().flatten().collect())
    }

    /// One slot per id, `None` where the document is absent.
    pub fn fetch(&self, ids: &[KeyPart]) -> TesseraResult<Vec<Option<Document<O>>>> {
        let keys: Vec<Vec<u8>> = ids
            .iter()
            .map(|id| self.ctx.keys.encoded_document_key(id))
            .collect();
        let heads = self.ctx.store.get_many(&keys)?;

        let mut documents = Vec::with_capacity(ids.len());
        for (id, head) in ids.iter().zip(heads) {
            let document = match head {
                Some(head) => self
                    .resolve_head(id.clone(), head)?
                    .map(|stored| stored.document),
                None => None,
            };
            documents.push(document);
        }
        Ok(documents)
    }

    /// Decodes a primary record, reading the segments of a segmented value from one snapshot
    /// together with the head. Returns `None` when the document was deleted meanwhile.
    fn resolve_head(&self, id: KeyPart, mut head: KvEntry) -> TesseraResult<Option<StoredDocument<O>>> {
        for _ in 0..=self.ctx.max_retries() {
            let record = StoredRecord::decode(&head.value)?;
            let segment_count = record.segment_count();
            if segment_count == 0 {
                let value = self.ctx.codec.decode_inline(&record)?;
                return Ok(Some(StoredDocument {
                    document: Document::new(id, head.versionstamp, value),
                    segment_count,
                }));
            }

            let mut keys = Vec::with_capacity(segment_count as usize + 1);
            keys.push(head.key.clone());
            for n in 0..segment_count {
                keys.push(self.ctx.keys.segment_key(&id, n).encode());
            }

            let mut entries = self.ctx.store.get_many(&keys)?;
            let current = if entries.is_empty() {
                None
            } else {
                entries.remove(0)
            };

            match current {
                None => return Ok(None),
                Some(current) if current.versionstamp == head.versionstamp => {
                    let bytes = reassemble(&record, head.versionstamp, &entries)?;
                    let value = self.ctx.codec.deserialize(record.format(), &bytes)?;
                    return Ok(Some(StoredDocument {
                        document: Document::new(id, head.versionstamp, value),
                        segment_count,
                    }));
                }
                Some(current) => {
                    log::debug!("Document {} changed while its segments were read, retrying", id);
                    head = current;
                }
            }
        }

        log::error!("Document {} kept changing while its segments were read", id);
        Err(TesseraError::new(
            &format!("Document {} kept changing while its segments were read", id),
            ErrorKind::InternalError,
        ))
    }

    fn resolve_entries(&self, entries: Vec<KvEntry>) -> TesseraResult<Vec<Option<Document<O>>>> {
        let mut documents = Vec::with_capacity(entries.len());
        for entry in entries {
            let id = self.ctx.keys.id_from_document_key(&entry.key)?;
            let document = self.resolve_head(id, entry)?.map(|stored| stored.document);
            if document.is_none() {
                log::warn!("Document vanished during scan of {}", self.ctx.name());
            }
            documents.push(document);
        }
        Ok(documents)
    }

    fn id_range(&self, query: &QueryOptions<O>) -> KeyRange {
        let keys = &self.ctx.keys;
        let prefix = keys.id_prefix();
        let start = match &query.start_id {
            Some(id) => Bound::Included(keys.encoded_document_key(id)),
            None => Bound::Excluded(prefix.to_vec()),
        };
        let end = match &query.end_id {
            Some(id) => Bound::Excluded(keys.encoded_document_key(id)),
            None => Bound::Excluded(prefix_end(prefix)),
        };
        KeyRange::new(start, end)
    }

    /// Runs `query` over the id space, handing every selected document to `visit`.
    pub fn scan(
        &self,
        query: &QueryOptions<O>,
        visit: impl FnMut(Document<O>) -> TesseraResult<ControlFlow<()>>,
    ) -> TesseraResult<Option<String>> {
        let paginator = Paginator::new(
            &self.ctx.store,
            self.id_range(query),
            self.ctx.keys.id_prefix(),
            self.ctx.batch_size(),
        );
        paginator.run(query, |entries| self.resolve_entries(entries), visit)
    }

    pub fn get_many(&self, query: &QueryOptions<O>) -> TesseraResult<Page<O>> {
        let mut result = Vec::new();
        let cursor = self.scan(query, |document| {
            result.push(document);
            Ok(ControlFlow::Continue(()))
        })?;
        Ok(Page { result, cursor })
    }

    pub fn get_one(&self, query: &QueryOptions<O>) -> TesseraResult<Option<Document<O>>> {
        let mut first = None;
        self.scan(query, |document| {
            first = Some(document);
            Ok(ControlFlow::Break(()))
        })?;
        Ok(first)
    }

    pub fn count_with(&self, query: &QueryOptions<O>) -> TesseraResult<usize> {
        let mut count = 0;
        self.scan(query, |_| {
            count += 1;
            Ok(ControlFlow::Continue(()))
        })?;
        Ok(count)
    }

    /// Number of primary records.
    pub fn count(&self) -> TesseraResult<usize> {
        self.count_keys(KeyRange::prefix(self.ctx.keys.id_prefix()))
    }

    /// Number of keys in `range`, counted without decoding values.
    pub fn count_keys(&self, mut range: KeyRange) -> TesseraResult<usize> {
        let options = ScanOptions::new(self.ctx.batch_size(), false);
        let mut count = 0;
        loop {
            let page = self.ctx.store.scan(&range, &options)?;
            count += page.entries.len();
            match page.cursor {
                Some(last) => range = range.resume_after(&last, false),
                None => return Ok(count),
            }
        }
    }
}
