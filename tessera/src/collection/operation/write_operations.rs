use super::{CollectionContext, IndexOperations, ReadOperations, StoredDocument};
use crate::codec::{EncodedDocument, Model};
use crate::collection::{
    DocumentValue, IdStrategy, WriteFailure, WriteOptions, WriteResult,
};
use crate::errors::{ErrorKind, TesseraError, TesseraResult};
use crate::index::{IndexClaim, IndexDelta, IndexWriter};
use crate::key::{decode_single, KeyPart};
use crate::query::QueryOptions;
use crate::store::{AtomicOperation, CommitResult, Versionstamp};
use std::ops::ControlFlow;
use std::sync::Arc;

/// The write protocol of a collection.
///
/// Every write reads what it replaces, builds one atomic operation holding the primary record,
/// its segments and the index delta, and guards it with checks on the primary record and on
/// every primary index value it claims. A conflicting commit is re-examined: collisions and
/// version mismatches are reported to the caller, anything else is retried up to
/// `max_retries` times.
pub(crate) struct WriteOperations<I, O> {
    ctx: Arc<CollectionContext<O>>,
    model: Model<I, O>,
    id_strategy: IdStrategy<O>,
    read_operations: ReadOperations<O>,
    index_operations: IndexOperations<O>,
}

impl<I, O: DocumentValue> WriteOperations<I, O> {
    pub fn new(
        ctx: Arc<CollectionContext<O>>,
        model: Model<I, O>,
        id_strategy: IdStrategy<O>,
        read_operations: ReadOperations<O>,
        index_operations: IndexOperations<O>,
    ) -> Self {
        WriteOperations {
            ctx,
            model,
            id_strategy,
            read_operations,
            index_operations,
        }
    }

    pub fn add(&self, input: I) -> TesseraResult<WriteResult> {
        let value = self.model.apply(input)?;
        let id = self.id_strategy.generate(&value);
        self.insert(id, &value)
    }

    pub fn add_many(&self, inputs: Vec<I>) -> TesseraResult<Vec<WriteResult>> {
        inputs.into_iter().map(|input| self.add(input)).collect()
    }

    /// Creates document `id`; fails with an id collision when it already exists.
    pub fn insert(&self, id: KeyPart, value: &O) -> TesseraResult<WriteResult> {
        let encoded = self.encode(value)?;
        let delta = self.index_writer().diff(&id, None, Some(value));
        let op = self.replace_operation(&id, None, &encoded, &delta);

        for attempt in 0..=self.ctx.max_retries() {
            match self.ctx.store.commit(op.clone())? {
                CommitResult::Committed(versionstamp) => {
                    log::debug!("Added {} to {} at {}", id, self.ctx.name(), versionstamp);
                    return Ok(WriteResult::committed(id, versionstamp));
                }
                CommitResult::Conflict => {
                    if self.current_versionstamp(&id)?.is_some() {
                        return Ok(WriteResult::Failed(WriteFailure::IdCollision));
                    }
                    if let Some(index) = self.claimed_index(&id, delta.claims())? {
                        return Ok(WriteResult::Failed(WriteFailure::IndexCollision { index }));
                    }
                    log::warn!("Insert of {} conflicted, retry {}", id, attempt + 1);
                }
            }
        }
        Err(self.retries_exhausted(&id))
    }

    pub fn set(&self, id: KeyPart, input: I, options: WriteOptions) -> TesseraResult<WriteResult> {
        let value = self.model.apply(input)?;
        let encoded = self.encode(&value)?;

        for attempt in 0..=self.ctx.max_retries() {
            let current = self.read_operations.read_stored(&id)?;
            let current_version = current.as_ref().map(|c| c.document.versionstamp());
            if let Some(expected) = options.expected_version {
                if current_version != Some(expected) {
                    return Ok(WriteResult::Failed(WriteFailure::VersionMismatch));
                }
            }

            let old = current.as_ref().map(|c| c.document.value());
            let delta = self.index_writer().diff(&id, old, Some(&value));
            let op = self.replace_operation(&id, current.as_ref(), &encoded, &delta);

            match self.ctx.store.commit(op)? {
                CommitResult::Committed(versionstamp) => {
                    log::debug!("Set {} in {} at {}", id, self.ctx.name(), versionstamp);
                    return Ok(WriteResult::committed(id, versionstamp));
                }
                CommitResult::Conflict => {
                    if let Some(index) = self.claimed_index(&id, delta.claims())? {
                        return Ok(WriteResult::Failed(WriteFailure::IndexCollision { index }));
                    }
                    log::warn!("Set of {} conflicted, retry {}", id, attempt + 1);
                }
            }
        }
        Err(self.retries_exhausted(&id))
    }

    /// Read-modify-write of document `id`. A concurrent change of the document is reported
    /// as a version mismatch, never retried with the updater applied to the newer value.
    pub fn update(
        &self,
        id: &KeyPart,
        updater: impl FnOnce(O) -> O,
        options: WriteOptions,
    ) -> TesseraResult<WriteResult> {
        let current = match self.read_operations.read_stored(id)? {
            Some(current) => current,
            None => return Ok(WriteResult::Failed(WriteFailure::NotFound)),
        };
        let read_version = current.document.versionstamp();
        if let Some(expected) = options.expected_version {
            if read_version != expected {
                return Ok(WriteResult::Failed(WriteFailure::VersionMismatch));
            }
        }

        let old = current.document.value().clone();
        let value = updater(old.clone());
        let encoded = self.encode(&value)?;
        let delta = self.index_writer().diff(id, Some(&old), Some(&value));
        let op = self.replace_operation(id, Some(&current), &encoded, &delta);

        for attempt in 0..=self.ctx.max_retries() {
            match self.ctx.store.commit(op.clone())? {
                CommitResult::Committed(versionstamp) => {
                    log::debug!("Updated {} in {} at {}", id, self.ctx.name(), versionstamp);
                    return Ok(WriteResult::committed(id.clone(), versionstamp));
                }
                CommitResult::Conflict => {
                    if self.current_versionstamp(id)? != Some(read_version) {
                        return Ok(WriteResult::Failed(WriteFailure::VersionMismatch));
                    }
                    if let Some(index) = self.claimed_index(id, delta.claims())? {
                        return Ok(WriteResult::Failed(WriteFailure::IndexCollision { index }));
                    }
                    log::warn!("Update of {} conflicted, retry {}", id, attempt + 1);
                }
            }
        }
        Err(self.retries_exhausted(id))
    }

    /// Updates document `id` when it exists, creates it from `input` otherwise.
    pub fn upsert(
        &self,
        id: KeyPart,
        input: I,
        updater: impl Fn(O) -> O,
    ) -> TesseraResult<WriteResult> {
        let value = self.model.apply(input)?;

        for attempt in 0..=self.ctx.max_retries() {
            let result = match self.update(&id, &updater, WriteOptions::new())? {
                WriteResult::Failed(WriteFailure::NotFound) => self.insert(id.clone(), &value)?,
                other => other,
            };

            match result {
                // created or changed by someone else in between, go again with what is stored now
                WriteResult::Failed(WriteFailure::IdCollision)
                | WriteResult::Failed(WriteFailure::VersionMismatch) => {
                    log::warn!("Upsert of {} raced, retry {}", id, attempt + 1);
                }
                other => return Ok(other),
            }
        }
        Err(self.retries_exhausted(&id))
    }

    /// Deletes document `id` with its segments and index entries. An absent document is a
    /// no-op reported as [`WriteFailure::NotFound`].
    pub fn delete(&self, id: &KeyPart, options: WriteOptions) -> TesseraResult<WriteResult> {
        for attempt in 0..=self.ctx.max_retries() {
            let current = match self.read_operations.read_stored(id)? {
                Some(current) => current,
                None => return Ok(WriteResult::Failed(WriteFailure::NotFound)),
            };
            if let Some(expected) = options.expected_version {
                if current.document.versionstamp() != expected {
                    return Ok(WriteResult::Failed(WriteFailure::VersionMismatch));
                }
            }

            let delta = self
                .index_writer()
                .diff(id, Some(current.document.value()), None);
            let mut op = AtomicOperation::new();
            let key = self.ctx.keys.encoded_document_key(id);
            op.check(key.clone(), Some(current.document.versionstamp()))
                .delete(key);
            for n in 0..current.segment_count {
                op.delete(self.ctx.keys.segment_key(id, n).encode());
            }
            delta.apply_to(&mut op);

            match self.ctx.store.commit(op)? {
                CommitResult::Committed(versionstamp) => {
                    log::debug!("Deleted {} from {} at {}", id, self.ctx.name(), versionstamp);
                    return Ok(WriteResult::committed(id.clone(), versionstamp));
                }
                CommitResult::Conflict => {
                    log::warn!("Delete of {} conflicted, retry {}", id, attempt + 1);
                }
            }
        }
        Err(self.retries_exhausted(id))
    }

    /// Deletes every document `query` selects and returns how many were deleted. The query
    /// limit caps the number of deletions.
    ///
    /// Each document is deleted in its own atomic operation, conditioned on the version the
    /// scan observed. Documents changed after the scan saw them are skipped.
    pub fn delete_many(&self, query: &QueryOptions<O>) -> TesseraResult<usize> {
        query.validate()?;
        let cap = query.limit;
        let mut deleted = 0;
        self.read_operations.scan(&query.unlimited(), |document| {
            self.delete_observed(document.id(), document.versionstamp(), &mut deleted)?;
            Ok(Self::flow(deleted, cap))
        })?;
        log::debug!("Deleted {} documents from {}", deleted, self.ctx.name());
        Ok(deleted)
    }

    /// Deletes the document holding `value` in a primary index.
    pub fn delete_by_primary_index(&self, name: &str, value: &KeyPart) -> TesseraResult<WriteResult> {
        for attempt in 0..=self.ctx.max_retries() {
            let document = match self.index_operations.find_by_primary_index(name, value)? {
                Some(document) => document,
                None => return Ok(WriteResult::Failed(WriteFailure::NotFound)),
            };
            let options = WriteOptions::new().expected_version(document.versionstamp());
            match self.delete(document.id(), options)? {
                WriteResult::Failed(WriteFailure::VersionMismatch) => {
                    log::warn!("Document under {} changed, retry {}", name, attempt + 1);
                }
                other => return Ok(other),
            }
        }
        Err(self.retries_exhausted(value))
    }

    /// Deletes every document holding `value` in a secondary index.
    pub fn delete_by_secondary_index(&self, name: &str, value: &KeyPart) -> TesseraResult<usize> {
        let mut deleted = 0;
        self.index_operations
            .scan_secondary_index(name, value, &QueryOptions::new(), |document| {
                self.delete_observed(document.id(), document.versionstamp(), &mut deleted)?;
                Ok(ControlFlow::Continue(()))
            })?;
        Ok(deleted)
    }

    fn delete_observed(
        &self,
        id: &KeyPart,
        versionstamp: Versionstamp,
        deleted: &mut usize,
    ) -> TesseraResult<()> {
        match self.delete(id, WriteOptions::new().expected_version(versionstamp))? {
            WriteResult::Committed { .. } => *deleted += 1,
            WriteResult::Failed(failure) => {
                log::warn!("Skipped {} in {}: {}", id, self.ctx.name(), failure)
            }
        }
        Ok(())
    }

    fn flow(deleted: usize, cap: Option<usize>) -> ControlFlow<()> {
        match cap {
            Some(cap) if deleted >= cap => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    }

    fn index_writer(&self) -> IndexWriter<'_, O> {
        IndexWriter::new(&self.ctx.keys, &self.ctx.indices)
    }

    fn encode(&self, value: &O) -> TesseraResult<EncodedDocument> {
        self.ctx.codec.encode(
            value,
            self.ctx.store.max_value_size(),
            self.segment_budget(),
        )
    }

    /// Segments one replace can carry next to the head check and set and, per index, a claim
    /// check, a removal and an insertion. Stale segment deletes reuse the slots of the segments
    /// they replace.
    fn segment_budget(&self) -> usize {
        self.ctx
            .store
            .max_atomic_operations()
            .saturating_sub(2 + 3 * self.ctx.indices.len())
    }

    /// The atomic operation that replaces `current` (or nothing) with `encoded`.
    fn replace_operation(
        &self,
        id: &KeyPart,
        current: Option<&StoredDocument<O>>,
        encoded: &EncodedDocument,
        delta: &IndexDelta,
    ) -> AtomicOperation {
        let keys = &self.ctx.keys;
        let key = keys.encoded_document_key(id);
        let mut op = AtomicOperation::new();
        op.check(key.clone(), current.map(|c| c.document.versionstamp()))
            .set(key, encoded.head.clone());

        for (n, segment) in encoded.segments.iter().enumerate() {
            op.set(keys.segment_key(id, n as u32).encode(), segment.clone());
        }
        let old_segments = current.map(|c| c.segment_count).unwrap_or(0);
        for n in encoded.segments.len() as u32..old_segments {
            op.delete(keys.segment_key(id, n).encode());
        }

        delta.apply_to(&mut op);
        op
    }

    fn current_versionstamp(&self, id: &KeyPart) -> TesseraResult<Option<Versionstamp>> {
        let key = self.ctx.keys.encoded_document_key(id);
        Ok(self.ctx.store.get(&key)?.map(|entry| entry.versionstamp))
    }

    /// The first claimed primary index value held by a document other than `id`.
    fn claimed_index(&self, id: &KeyPart, claims: &[IndexClaim]) -> TesseraResult<Option<String>> {
        for claim in claims {
            if let Some(entry) = self.ctx.store.get(&claim.key)? {
                if &decode_single(&entry.value)? != id {
                    return Ok(Some(claim.index.clone()));
                }
            }
        }
        Ok(None)
    }

    fn retries_exhausted(&self, id: &KeyPart) -> TesseraError {
        log::error!(
            "Write of {} to {} still conflicted after {} retries",
            id,
            self.ctx.name(),
            self.ctx.max_retries()
        );
        TesseraError::new(
            &format!(
                "Write of {} to {} still conflicted after {} retries",
                id,
                self.ctx.name(),
                self.ctx.max_retries()
            ),
            ErrorKind::InternalError,
        )
    }
}
