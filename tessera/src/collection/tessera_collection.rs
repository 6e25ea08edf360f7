use super::operation::{CollectionContext, IndexOperations, ReadOperations, WriteOperations};
use super::{CollectionDescriptor, Document, DocumentValue, WriteOptions, WriteResult};
use crate::codec::DocumentCodec;
use crate::errors::{ErrorKind, TesseraError, TesseraResult};
use crate::key::{CollectionKeys, KeyPart};
use crate::query::{Page, QueryOptions};
use crate::store::KvStore;
use crate::tessera_config::TesseraConfig;
use std::ops::ControlFlow;
use std::sync::Arc;

/// A typed collection of documents.
///
/// `I` is the shape callers insert, `O` the shape that is stored and read back; they are the same
/// type unless the collection was declared with a [`Model`](crate::codec::Model). Handles are
/// cheap to clone and safe to share across threads; all clones operate on the same store.
///
/// Write operations report business conditions (id or index collision, version mismatch, absent
/// document) as a [`WriteResult`]. An `Err` always means the store, the codec or the request
/// itself failed.
///
/// # Examples
///
/// ```rust,ignore
/// let users = db.collection(&users_descriptor)?;
/// let id = users.add(user)?.into_result()?.0;
/// let stored = users.find(id.clone())?.expect("just added");
/// users.set_with(id, updated, if_version(stored.versionstamp()))?;
/// ```
pub struct Collection<I, O = I> {
    inner: Arc<CollectionInner<I, O>>,
}

impl<I, O> Clone for Collection<I, O> {
    fn clone(&self) -> Self {
        Collection {
            inner: self.inner.clone(),
        }
    }
}

impl<I: 'static, O: DocumentValue> Collection<I, O> {
    pub(crate) fn new(
        descriptor: &CollectionDescriptor<I, O>,
        store: KvStore,
        config: TesseraConfig,
    ) -> TesseraResult<Self> {
        let keys = CollectionKeys::new(&config.key_prefix(), descriptor.name())?;
        let ctx = Arc::new(CollectionContext::new(
            keys,
            DocumentCodec::new(descriptor.serialization().clone()),
            descriptor.indices().to_vec(),
            store,
            config,
        ));
        let read_operations = ReadOperations::new(ctx.clone());
        let index_operations = IndexOperations::new(ctx.clone(), read_operations.clone());
        let write_operations = WriteOperations::new(
            ctx.clone(),
            descriptor.model().clone(),
            descriptor.id_strategy().clone(),
            read_operations.clone(),
            index_operations.clone(),
        );

        Ok(Collection {
            inner: Arc::new(CollectionInner {
                ctx,
                read_operations,
                index_operations,
                write_operations,
            }),
        })
    }

    pub(crate) fn managed(&self) -> Arc<dyn ManagedCollection> {
        self.inner.clone()
    }

    pub fn name(&self) -> &str {
        self.inner.ctx.name()
    }

    /// Creates a document with an id from the collection's id strategy.
    pub fn add(&self, input: I) -> TesseraResult<WriteResult> {
        self.inner.ensure_opened()?;
        self.inner.write_operations.add(input)
    }

    /// Adds every input in its own atomic operation; one result per input, in order.
    pub fn add_many(&self, inputs: Vec<I>) -> TesseraResult<Vec<WriteResult>> {
        self.inner.ensure_opened()?;
        self.inner.write_operations.add_many(inputs)
    }

    /// Creates or overwrites document `id`.
    pub fn set(&self, id: impl Into<KeyPart>, input: I) -> TesseraResult<WriteResult> {
        self.set_with(id, input, WriteOptions::new())
    }

    pub fn set_with(
        &self,
        id: impl Into<KeyPart>,
        input: I,
        options: WriteOptions,
    ) -> TesseraResult<WriteResult> {
        self.inner.ensure_opened()?;
        self.inner.write_operations.set(id.into(), input, options)
    }

    /// Replaces document `id` with `updater` applied to its current value.
    pub fn update(
        &self,
        id: impl Into<KeyPart>,
        updater: impl FnOnce(O) -> O,
    ) -> TesseraResult<WriteResult> {
        self.update_with(id, updater, WriteOptions::new())
    }

    pub fn update_with(
        &self,
        id: impl Into<KeyPart>,
        updater: impl FnOnce(O) -> O,
        options: WriteOptions,
    ) -> TesseraResult<WriteResult> {
        self.inner.ensure_opened()?;
        self.inner
            .write_operations
            .update(&id.into(), updater, options)
    }

    /// Applies `updater` to document `id` when it exists, stores `input` under `id` otherwise.
    pub fn upsert(
        &self,
        id: impl Into<KeyPart>,
        input: I,
        updater: impl Fn(O) -> O,
    ) -> TesseraResult<WriteResult> {
        self.inner.ensure_opened()?;
        self.inner.write_operations.upsert(id.into(), input, updater)
    }

    pub fn delete(&self, id: impl Into<KeyPart>) -> TesseraResult<WriteResult> {
        self.delete_with(id, WriteOptions::new())
    }

    pub fn delete_with(
        &self,
        id: impl Into<KeyPart>,
        options: WriteOptions,
    ) -> TesseraResult<WriteResult> {
        self.inner.ensure_opened()?;
        self.inner.write_operations.delete(&id.into(), options)
    }

    /// Deletes the documents `query` selects, each in its own atomic operation.
    pub fn delete_many(&self, query: &QueryOptions<O>) -> TesseraResult<usize> {
        self.inner.ensure_opened()?;
        self.inner.write_operations.delete_many(query)
    }

    pub fn delete_all(&self) -> TesseraResult<usize> {
        self.delete_many(&QueryOptions::new())
    }

    pub fn find(&self, id: impl Into<KeyPart>) -> TesseraResult<Option<Document<O>>> {
        self.inner.ensure_opened()?;
        self.inner.read_operations.find(&id.into())
    }

    pub fn find_many(&self, ids: &[KeyPart]) -> TesseraResult<Vec<Document<O>>> {
        self.inner.ensure_opened()?;
        self.inner.read_operations.find_many(ids)
    }

    pub fn get_many(&self, query: &QueryOptions<O>) -> TesseraResult<Page<O>> {
        self.inner.ensure_opened()?;
        self.inner.read_operations.get_many(query)
    }

    pub fn get_one(&self, query: &QueryOptions<O>) -> TesseraResult<Option<Document<O>>> {
        self.inner.ensure_opened()?;
        self.inner.read_operations.get_one(query)
    }

    /// Applies `f` to every document `query` selects.
    pub fn map<T>(
        &self,
        query: &QueryOptions<O>,
        mut f: impl FnMut(Document<O>) -> T,
    ) -> TesseraResult<Vec<T>> {
        self.inner.ensure_opened()?;
        let mut mapped = Vec::new();
        self.inner.read_operations.scan(query, |document| {
            mapped.push(f(document));
            Ok(ControlFlow::Continue(()))
        })?;
        Ok(mapped)
    }

    /// Streams every document in id order.
    pub fn for_each(
        &self,
        callback: impl FnMut(Document<O>) -> TesseraResult<ControlFlow<()>>,
    ) -> TesseraResult<()> {
        self.for_each_with(&QueryOptions::new(), callback)
    }

    /// Streams the documents `query` selects. The callback stops the stream with
    /// [`ControlFlow::Break`]; an error from it aborts the stream and is returned.
    pub fn for_each_with(
        &self,
        query: &QueryOptions<O>,
        callback: impl FnMut(Document<O>) -> TesseraResult<ControlFlow<()>>,
    ) -> TesseraResult<()> {
        self.inner.ensure_opened()?;
        self.inner.read_operations.scan(query, callback)?;
        Ok(())
    }

    /// Number of documents, counted from primary record keys.
    pub fn count(&self) -> TesseraResult<usize> {
        self.inner.ensure_opened()?;
        self.inner.read_operations.count()
    }

    pub fn count_with(&self, query: &QueryOptions<O>) -> TesseraResult<usize> {
        self.inner.ensure_opened()?;
        self.inner.read_operations.count_with(query)
    }

    pub fn find_by_primary_index(
        &self,
        index: &str,
        value: impl Into<KeyPart>,
    ) -> TesseraResult<Option<Document<O>>> {
        self.inner.ensure_opened()?;
        self.inner
            .index_operations
            .find_by_primary_index(index, &value.into())
    }

    /// A page of the documents holding `value` in a secondary index, in id order.
    pub fn find_by_secondary_index(
        &self,
        index: &str,
        value: impl Into<KeyPart>,
        query: &QueryOptions<O>,
    ) -> TesseraResult<Page<O>> {
        self.inner.ensure_opened()?;
        self.inner
            .index_operations
            .find_by_secondary_index(index, &value.into(), query)
    }

    pub fn count_by_secondary_index(
        &self,
        index: &str,
        value: impl Into<KeyPart>,
    ) -> TesseraResult<usize> {
        self.inner.ensure_opened()?;
        self.inner
            .index_operations
            .count_by_secondary_index(index, &value.into())
    }

    pub fn delete_by_primary_index(
        &self,
        index: &str,
        value: impl Into<KeyPart>,
    ) -> TesseraResult<WriteResult> {
        self.inner.ensure_opened()?;
        self.inner
            .write_operations
            .delete_by_primary_index(index, &value.into())
    }

    pub fn delete_by_secondary_index(
        &self,
        index: &str,
        value: impl Into<KeyPart>,
    ) -> TesseraResult<usize> {
        self.inner.ensure_opened()?;
        self.inner
            .write_operations
            .delete_by_secondary_index(index, &value.into())
    }

    /// Number of entries stored for `index`, over all its values.
    pub fn count_index_entries(&self, index: &str) -> TesseraResult<usize> {
        self.inner.ensure_opened()?;
        self.inner.ctx.index_descriptor(index)?;
        self.inner.index_operations.count_index_entries(index)
    }
}

/// The type-erased view of a collection the database keeps in its registry.
pub(crate) trait ManagedCollection: Send + Sync {
    fn name(&self) -> &str;

    fn count(&self) -> TesseraResult<usize>;

    fn delete_all(&self) -> TesseraResult<usize>;
}

struct CollectionInner<I, O> {
    ctx: Arc<CollectionContext<O>>,
    read_operations: ReadOperations<O>,
    index_operations: IndexOperations<O>,
    write_operations: WriteOperations<I, O>,
}

impl<I, O: DocumentValue> CollectionInner<I, O> {
    fn ensure_opened(&self) -> TesseraResult<()> {
        if self.ctx.store.is_closed()? {
            log::error!("Store is closed; cannot access collection {}", self.ctx.name());
            return Err(TesseraError::new(
                &format!("Store is closed; cannot access collection {}", self.ctx.name()),
                ErrorKind::StoreAlreadyClosed,
            ));
        }
        Ok(())
    }
}

impl<I: 'static, O: DocumentValue> ManagedCollection for CollectionInner<I, O> {
    fn name(&self) -> &str {
        self.ctx.name()
    }

    fn count(&self) -> TesseraResult<usize> {
        self.ensure_opened()?;
        self.read_operations.count()
    }

    fn delete_all(&self) -> TesseraResult<usize> {
        self.ensure_opened()?;
        self.write_operations.delete_many(&QueryOptions::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Model, SerializationMode};
    use crate::collection::{if_version, CollectionBuilder, IdStrategy, WriteFailure};
    use crate::query::{filter_by, limit_to, QueryOptions};
    use crate::store::memory::{InMemoryStore, InMemoryStoreConfig};
    use crate::store::Versionstamp;
    use crate::tessera::Tessera;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct User {
        name: String,
        email: String,
        city: String,
        bio: String,
    }

    fn user(name: &str, city: &str) -> User {
        User {
            name: name.to_string(),
            email: format!("{}@example.com", name),
            city: city.to_string(),
            bio: String::new(),
        }
    }

    fn users_descriptor() -> CollectionDescriptor<User> {
        CollectionBuilder::<User>::new("users")
            .id_strategy(IdStrategy::derived(|u: &User| u.name.clone()))
            .primary_index("email", |u: &User| u.email.clone())
            .secondary_index("city", |u: &User| u.city.clone())
            .build()
            .unwrap()
    }

    fn users() -> Collection<User> {
        let db = Tessera::builder().open().unwrap();
        db.collection(&users_descriptor()).unwrap()
    }

    #[test]
    fn add_then_find_returns_the_value() {
        let users = users();
        let result = users.add(user("ada", "london")).unwrap();
        assert!(result.is_committed());

        let found = users.find("ada").unwrap().unwrap();
        assert_eq!(found.value(), &user("ada", "london"));
        assert_eq!(Some(found.versionstamp()), result.versionstamp());
        assert!(users.find("bob").unwrap().is_none());
    }

    #[test]
    fn derived_id_collision_is_reported() {
        let users = users();
        users.add(user("ada", "london")).unwrap();
        let mut clash = user("ada", "paris");
        clash.email = "other@example.com".to_string();

        let result = users.add(clash).unwrap();
        assert_eq!(result.failure(), Some(&WriteFailure::IdCollision));
        assert_eq!(users.find("ada").unwrap().unwrap().value().city, "london");
    }

    #[test]
    fn primary_index_collision_leaves_count_unchanged() {
        let users = users();
        users.add(user("ada", "london")).unwrap();
        let mut clash = user("bob", "paris");
        clash.email = "ada@example.com".to_string();

        let result = users.add(clash).unwrap();
        assert_eq!(
            result.failure(),
            Some(&WriteFailure::IndexCollision {
                index: "email".to_string()
            })
        );
        assert_eq!(users.count().unwrap(), 1);
        assert_eq!(users.count_index_entries("city").unwrap(), 1);
        assert!(users.find("bob").unwrap().is_none());
    }

    #[test]
    fn set_honours_expected_version() {
        let users = users();
        let first = users.add(user("ada", "london")).unwrap();
        let stamp = first.versionstamp().unwrap();

        let moved = users
            .set_with("ada", user("ada", "paris"), if_version(stamp))
            .unwrap();
        assert!(moved.is_committed());

        let stale = users
            .set_with("ada", user("ada", "rome"), if_version(stamp))
            .unwrap();
        assert_eq!(stale.failure(), Some(&WriteFailure::VersionMismatch));
        assert_eq!(users.find("ada").unwrap().unwrap().value().city, "paris");

        let absent = users
            .set_with("zed", user("zed", "rome"), if_version(Versionstamp::new(1)))
            .unwrap();
        assert_eq!(absent.failure(), Some(&WriteFailure::VersionMismatch));
    }

    #[test]
    fn set_moves_index_entries() {
        let users = users();
        users.add(user("ada", "london")).unwrap();
        users.set("ada", user("ada", "paris")).unwrap();

        assert_eq!(users.count_by_secondary_index("city", "london").unwrap(), 0);
        assert_eq!(users.count_by_secondary_index("city", "paris").unwrap(), 1);
        assert_eq!(users.count_index_entries("email").unwrap(), 1);

        let mut renamed = user("ada", "paris");
        renamed.email = "lovelace@example.com".to_string();
        users.set("ada", renamed).unwrap();
        assert!(users
            .find_by_primary_index("email", "ada@example.com")
            .unwrap()
            .is_none());
        let found = users
            .find_by_primary_index("email", "lovelace@example.com")
            .unwrap()
            .unwrap();
        assert_eq!(found.id(), &KeyPart::from("ada"));
    }

    #[test]
    fn set_may_not_take_another_documents_primary_value() {
        let users = users();
        users.add(user("ada", "london")).unwrap();
        users.add(user("bob", "london")).unwrap();

        let mut clash = user("bob", "london");
        clash.email = "ada@example.com".to_string();
        let result = users.set("bob", clash).unwrap();
        assert_eq!(
            result.failure(),
            Some(&WriteFailure::IndexCollision {
                index: "email".to_string()
            })
        );
        assert_eq!(
            users.find("bob").unwrap().unwrap().value().email,
            "bob@example.com"
        );
    }

    #[test]
    fn update_applies_the_updater() {
        let users = users();
        users.add(user("ada", "london")).unwrap();

        let result = users
            .update("ada", |mut u| {
                u.city = "paris".to_string();
                u
            })
            .unwrap();
        assert!(result.is_committed());
        assert_eq!(users.find("ada").unwrap().unwrap().value().city, "paris");

        let missing = users.update("bob", |u| u).unwrap();
        assert_eq!(missing.failure(), Some(&WriteFailure::NotFound));

        let stale = users
            .update_with("ada", |u| u, if_version(Versionstamp::new(0)))
            .unwrap();
        assert_eq!(stale.failure(), Some(&WriteFailure::VersionMismatch));
    }

    #[test]
    fn upsert_inserts_then_updates() {
        let users = users();
        let relocate = |mut u: User| {
            u.city = "berlin".to_string();
            u
        };

        users.upsert("ada", user("ada", "london"), relocate).unwrap();
        assert_eq!(users.find("ada").unwrap().unwrap().value().city, "london");

        users.upsert("ada", user("ada", "london"), relocate).unwrap();
        assert_eq!(users.find("ada").unwrap().unwrap().value().city, "berlin");
        assert_eq!(users.count().unwrap(), 1);
    }

    #[test]
    fn delete_removes_document_and_index_entries() {
        let users = users();
        users.add(user("ada", "london")).unwrap();
        users.add(user("bob", "london")).unwrap();

        assert!(users.delete("ada").unwrap().is_committed());
        assert_eq!(users.count().unwrap(), 1);
        assert_eq!(users.count_by_secondary_index("city", "london").unwrap(), 1);
        assert!(users
            .find_by_primary_index("email", "ada@example.com")
            .unwrap()
            .is_none());

        let again = users.delete("ada").unwrap();
        assert_eq!(again.failure(), Some(&WriteFailure::NotFound));
        assert_eq!(users.count().unwrap(), 1);
    }

    #[test]
    fn delete_with_stale_version_keeps_document() {
        let users = users();
        let added = users.add(user("ada", "london")).unwrap();
        users.set("ada", user("ada", "paris")).unwrap();

        let result = users
            .delete_with("ada", if_version(added.versionstamp().unwrap()))
            .unwrap();
        assert_eq!(result.failure(), Some(&WriteFailure::VersionMismatch));
        assert_eq!(users.count().unwrap(), 1);
    }

    #[test]
    fn secondary_index_lookup_and_delete() {
        let users = users();
        for (name, city) in [("ada", "london"), ("bob", "paris"), ("cy", "london")] {
            users.add(user(name, city)).unwrap();
        }

        let page = users
            .find_by_secondary_index("city", "london", &QueryOptions::new())
            .unwrap();
        let names: Vec<_> = page.values().iter().map(|u| u.name.clone()).collect();
        assert_eq!(names, vec!["ada", "cy"]);
        assert!(page.cursor.is_none());

        assert_eq!(users.delete_by_secondary_index("city", "london").unwrap(), 2);
        assert_eq!(users.count().unwrap(), 1);
        assert_eq!(users.count_index_entries("email").unwrap(), 1);
    }

    #[test]
    fn primary_index_delete() {
        let users = users();
        users.add(user("ada", "london")).unwrap();
        let result = users
            .delete_by_primary_index("email", "ada@example.com")
            .unwrap();
        assert_eq!(result.id(), Some(&KeyPart::from("ada")));
        assert_eq!(users.count().unwrap(), 0);

        let missing = users
            .delete_by_primary_index("email", "ada@example.com")
            .unwrap();
        assert_eq!(missing.failure(), Some(&WriteFailure::NotFound));
    }

    #[test]
    fn index_lookups_check_kind_and_name() {
        let users = users();
        assert_eq!(
            users
                .find_by_primary_index("city", "london")
                .unwrap_err()
                .kind(),
            &ErrorKind::InvalidOperation
        );
        assert_eq!(
            users
                .count_by_secondary_index("age", 3)
                .unwrap_err()
                .kind(),
            &ErrorKind::IndexNotFound
        );
    }

    #[test]
    fn delete_many_honours_filter_and_limit() {
        let users = users();
        for n in 0..10 {
            let city = if n % 2 == 0 { "london" } else { "paris" };
            users.add(user(&format!("u{}", n), city)).unwrap();
        }

        let in_london = filter_by(|d: &Document<User>| d.value().city == "london");
        assert_eq!(users.delete_many(&in_london.limit(2)).unwrap(), 2);
        assert_eq!(users.count().unwrap(), 8);

        let in_london = filter_by(|d: &Document<User>| d.value().city == "london");
        assert_eq!(users.delete_many(&in_london).unwrap(), 3);
        assert_eq!(users.count_by_secondary_index("city", "london").unwrap(), 0);

        assert_eq!(users.delete_all().unwrap(), 5);
        assert_eq!(users.count().unwrap(), 0);
        assert_eq!(users.count_index_entries("email").unwrap(), 0);
        assert_eq!(users.count_index_entries("city").unwrap(), 0);
    }

    #[test]
    fn for_each_stops_on_break_and_propagates_errors() {
        let users = users();
        for name in ["a", "b", "c", "d"] {
            users.add(user(name, "london")).unwrap();
        }

        let mut seen = Vec::new();
        users
            .for_each(|document| {
                seen.push(document.value().name.clone());
                if seen.len() == 2 {
                    Ok(ControlFlow::Break(()))
                } else {
                    Ok(ControlFlow::Continue(()))
                }
            })
            .unwrap();
        assert_eq!(seen, vec!["a", "b"]);

        let err = users
            .for_each(|_| Err(TesseraError::new("stop", ErrorKind::InternalError)))
            .unwrap_err();
        assert_eq!(err.message(), "stop");
    }

    #[test]
    fn query_helpers() {
        let users = users();
        for name in ["a", "b", "c"] {
            users.add(user(name, "london")).unwrap();
        }

        let names = users
            .map(&QueryOptions::new().reverse(true), |d| d.into_value().name)
            .unwrap();
        assert_eq!(names, vec!["c", "b", "a"]);

        let first = users.get_one(&QueryOptions::new()).unwrap().unwrap();
        assert_eq!(first.id(), &KeyPart::from("a"));

        let page = users.get_many(&limit_to(2)).unwrap();
        assert_eq!(page.len(), 2);
        assert!(page.cursor.is_some());
        assert_eq!(
            users
                .count_with(&filter_by(|d: &Document<User>| d.value().name != "b"))
                .unwrap(),
            2
        );

        let found = users
            .find_many(&[KeyPart::from("c"), KeyPart::from("x"), KeyPart::from("a")])
            .unwrap();
        let ids: Vec<_> = found.iter().map(|d| d.id().clone()).collect();
        assert_eq!(ids, vec![KeyPart::from("c"), KeyPart::from("a")]);
    }

    #[test]
    fn segmented_values_round_trip() {
        let config = InMemoryStoreConfig::new();
        config.set_max_value_size(2048);
        let db = Tessera::builder()
            .store(InMemoryStore::new(config))
            .open()
            .unwrap();
        let descriptor = CollectionBuilder::<User>::new("users")
            .id_strategy(IdStrategy::derived(|u: &User| u.name.clone()))
            .serialization(SerializationMode::Binary)
            .build()
            .unwrap();
        let users = db.collection(&descriptor).unwrap();

        let mut big = user("ada", "london");
        big.bio = "x".repeat(10_000);
        assert!(users.add(big.clone()).unwrap().is_committed());
        assert_eq!(users.find("ada").unwrap().unwrap().value(), &big);

        big.bio = "y".repeat(3_000);
        users.set("ada", big.clone()).unwrap();
        assert_eq!(users.find("ada").unwrap().unwrap().value(), &big);

        big.bio = "short".to_string();
        users.set("ada", big.clone()).unwrap();
        assert_eq!(users.find("ada").unwrap().unwrap().value(), &big);

        assert!(users.delete("ada").unwrap().is_committed());
        assert_eq!(db.wipe().unwrap(), 0);
    }

    #[test]
    fn values_with_more_segments_than_one_commit_holds_are_rejected() {
        let config = InMemoryStoreConfig::new();
        config.set_max_value_size(1_024);
        config.set_max_atomic_operations(8);
        let db = Tessera::builder()
            .store(InMemoryStore::new(config))
            .open()
            .unwrap();
        let descriptor = CollectionBuilder::<User>::new("users")
            .id_strategy(IdStrategy::derived(|u: &User| u.name.clone()))
            .serialization(SerializationMode::Binary)
            .build()
            .unwrap();
        let users = db.collection(&descriptor).unwrap();

        let mut big = user("ada", "london");
        big.bio = "x".repeat(10_000);
        let err = users.add(big.clone()).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValueTooLarge);
        assert_eq!(users.count().unwrap(), 0);

        big.bio = "x".repeat(2_000);
        assert!(users.add(big).unwrap().is_committed());
    }

    #[test]
    fn structural_values_over_the_limit_are_rejected() {
        let config = InMemoryStoreConfig::new();
        config.set_max_value_size(256);
        let db = Tessera::builder()
            .store(InMemoryStore::new(config))
            .open()
            .unwrap();
        let users = db.collection(&users_descriptor()).unwrap();

        let mut big = user("ada", "london");
        big.bio = "x".repeat(1_000);
        let err = users.add(big).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValueTooLarge);
        assert_eq!(users.count().unwrap(), 0);
    }

    #[test]
    fn asymmetric_model_derives_stored_fields() {
        #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
        struct Tagged {
            name: String,
            length: usize,
        }

        let db = Tessera::builder().open().unwrap();
        let descriptor = CollectionBuilder::with_model(
            "tags",
            Model::new(|name: String| {
                Ok(Tagged {
                    length: name.len(),
                    name,
                })
            }),
        )
        .id_strategy(IdStrategy::derived(|t: &Tagged| t.name.clone()))
        .build()
        .unwrap();
        let tags = db.collection(&descriptor).unwrap();

        tags.add("rust".to_string()).unwrap();
        let stored = tags.find("rust").unwrap().unwrap();
        assert_eq!(stored.value().length, 4);
    }

    #[test]
    fn operations_fail_after_close() {
        let db = Tessera::builder().open().unwrap();
        let users = db.collection(&users_descriptor()).unwrap();
        db.close().unwrap();

        let err = users.add(user("ada", "london")).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::StoreAlreadyClosed);
        assert_eq!(
            users.count().unwrap_err().kind(),
            &ErrorKind::StoreAlreadyClosed
        );
    }

    #[test]
    fn handles_share_across_threads() {
        let users = users();
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let users = users.clone();
                std::thread::spawn(move || {
                    for n in 0..25 {
                        let result = users.add(user(&format!("t{}-{}", t, n), "london")).unwrap();
                        assert!(result.is_committed());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(users.count().unwrap(), 100);
        assert_eq!(users.count_by_secondary_index("city", "london").unwrap(), 100);
    }
}
