use crate::index::IndexDescriptor;
use crate::key::{encode_single, CollectionKeys, KeyPart};
use crate::store::AtomicOperation;

/// A primary index entry a write wants to create. The write only commits while the entry is
/// absent; after a conflict the claim tells which index to blame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexClaim {
    pub index: String,
    pub key: Vec<u8>,
}

/// Index entries to remove and insert for one document write.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexDelta {
    removals: Vec<Vec<u8>>,
    insertions: Vec<(Vec<u8>, Vec<u8>)>,
    claims: Vec<IndexClaim>,
}

impl IndexDelta {
    pub fn removals(&self) -> &[Vec<u8>] {
        &self.removals
    }

    pub fn insertions(&self) -> &[(Vec<u8>, Vec<u8>)] {
        &self.insertions
    }

    pub fn claims(&self) -> &[IndexClaim] {
        &self.claims
    }

    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.insertions.is_empty()
    }

    /// Adds the delta to `op`: an absence check per claim, then removals, then insertions.
    pub fn apply_to(&self, op: &mut AtomicOperation) {
        for claim in &self.claims {
            op.check(claim.key.clone(), None);
        }
        for key in &self.removals {
            op.delete(key.clone());
        }
        for (key, value) in &self.insertions {
            op.set(key.clone(), value.clone());
        }
    }
}

/// Computes index deltas for the declared indices of a collection.
pub struct IndexWriter<'a, O> {
    keys: &'a CollectionKeys,
    indices: &'a [IndexDescriptor<O>],
}

impl<'a, O> IndexWriter<'a, O> {
    pub fn new(keys: &'a CollectionKeys, indices: &'a [IndexDescriptor<O>]) -> Self {
        IndexWriter { keys, indices }
    }

    /// Diffs the index values of `old` and `new` for document `id`.
    ///
    /// `old` is `None` when the document is created, `new` is `None` when it is deleted. An
    /// index whose value did not change contributes nothing.
    pub fn diff(&self, id: &KeyPart, old: Option<&O>, new: Option<&O>) -> IndexDelta {
        let mut delta = IndexDelta::default();
        let payload = encode_single(id);

        for index in self.indices {
            let old_value = old.map(|value| index.value_of(value));
            let new_value = new.map(|value| index.value_of(value));
            if old_value == new_value {
                continue;
            }

            if let Some(value) = old_value {
                delta
                    .removals
                    .push(index.entry_key(self.keys, &value, id).encode());
            }

            if let Some(value) = new_value {
                let key = index.entry_key(self.keys, &value, id).encode();
                if index.is_primary() {
                    delta.claims.push(IndexClaim {
                        index: index.name().to_string(),
                        key: key.clone(),
                    });
                }
                delta.insertions.push((key, payload.clone()));
            }
        }

        log::trace!(
            "Index delta for {}: {} removals, {} insertions",
            id,
            delta.removals.len(),
            delta.insertions.len()
        );
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexKind;
    use crate::store::Mutation;

    #[derive(Clone)]
    struct User {
        email: String,
        city: String,
    }

    fn user(email: &str, city: &str) -> User {
        User {
            email: email.into(),
            city: city.into(),
        }
    }

    fn indices() -> Vec<IndexDescriptor<User>> {
        vec![
            IndexDescriptor::new("email", IndexKind::Primary, |u: &User| u.email.clone()),
            IndexDescriptor::new("city", IndexKind::Secondary, |u: &User| u.city.clone()),
        ]
    }

    fn keys() -> CollectionKeys {
        CollectionKeys::new("tessera", "users").unwrap()
    }

    #[test]
    fn create_inserts_every_index_and_claims_primary() {
        let keys = keys();
        let indices = indices();
        let writer = IndexWriter::new(&keys, &indices);
        let id = KeyPart::from("u1");

        let delta = writer.diff(&id, None, Some(&user("a@x", "Oslo")));
        assert!(delta.removals().is_empty());
        assert_eq!(delta.insertions().len(), 2);
        assert_eq!(delta.claims().len(), 1);
        assert_eq!(delta.claims()[0].index, "email");
        assert_eq!(
            delta.claims()[0].key,
            keys.index_key("email", &KeyPart::from("a@x"), None).encode()
        );
        assert!(delta
            .insertions()
            .iter()
            .all(|(_, payload)| payload == &encode_single(&id)));
    }

    #[test]
    fn delete_only_removes() {
        let keys = keys();
        let indices = indices();
        let writer = IndexWriter::new(&keys, &indices);
        let id = KeyPart::from("u1");

        let delta = writer.diff(&id, Some(&user("a@x", "Oslo")), None);
        assert_eq!(delta.removals().len(), 2);
        assert!(delta.insertions().is_empty());
        assert!(delta.claims().is_empty());
        assert!(delta
            .removals()
            .contains(&keys.index_key("city", &KeyPart::from("Oslo"), Some(&id)).encode()));
    }

    #[test]
    fn update_touches_only_changed_indices() {
        let keys = keys();
        let indices = indices();
        let writer = IndexWriter::new(&keys, &indices);
        let id = KeyPart::from("u1");

        let delta = writer.diff(&id, Some(&user("a@x", "Oslo")), Some(&user("a@x", "Rome")));
        assert_eq!(
            delta.removals(),
            &[keys.index_key("city", &KeyPart::from("Oslo"), Some(&id)).encode()]
        );
        assert_eq!(delta.insertions().len(), 1);
        assert!(delta.claims().is_empty());

        let unchanged = writer.diff(&id, Some(&user("a@x", "Oslo")), Some(&user("a@x", "Oslo")));
        assert!(unchanged.is_empty());
    }

    #[test]
    fn apply_to_orders_checks_removals_insertions() {
        let keys = keys();
        let indices = indices();
        let writer = IndexWriter::new(&keys, &indices);
        let id = KeyPart::from("u1");

        let delta = writer.diff(&id, Some(&user("a@x", "Oslo")), Some(&user("b@x", "Oslo")));
        let mut op = AtomicOperation::new();
        delta.apply_to(&mut op);

        assert_eq!(op.checks().len(), 1);
        assert_eq!(op.checks()[0].versionstamp, None);
        assert!(matches!(op.mutations()[0], Mutation::Delete { .. }));
        assert!(matches!(op.mutations()[1], Mutation::Set { .. }));
    }
}
