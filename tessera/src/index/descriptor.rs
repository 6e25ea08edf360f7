use crate::key::{CollectionKeys, Key, KeyPart};
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Uniqueness of an index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// At most one document per index value.
    Primary,
    /// Any number of documents per index value.
    Secondary,
}

impl Display for IndexKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexKind::Primary => write!(f, "primary"),
            IndexKind::Secondary => write!(f, "secondary"),
        }
    }
}

type Accessor<O> = Arc<dyn Fn(&O) -> KeyPart + Send + Sync>;

/// Declaration of one index on a collection of `O`.
pub struct IndexDescriptor<O> {
    inner: Arc<IndexDescriptorInner<O>>,
}

struct IndexDescriptorInner<O> {
    name: String,
    kind: IndexKind,
    accessor: Accessor<O>,
}

impl<O: 'static> IndexDescriptor<O> {
    pub fn new<K: Into<KeyPart> + 'static>(
        name: &str,
        kind: IndexKind,
        accessor: impl Fn(&O) -> K + Send + Sync + 'static,
    ) -> Self {
        IndexDescriptor {
            inner: Arc::new(IndexDescriptorInner {
                name: name.to_string(),
                kind,
                accessor: Arc::new(move |value: &O| -> KeyPart { accessor(value).into() }),
            }),
        }
    }
}

impl<O> IndexDescriptor<O> {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn kind(&self) -> IndexKind {
        self.inner.kind
    }

    pub fn is_primary(&self) -> bool {
        self.inner.kind == IndexKind::Primary
    }

    /// Extracts the index value of `value`.
    pub fn value_of(&self, value: &O) -> KeyPart {
        (self.inner.accessor)(value)
    }

    /// Key of the entry this index holds for document `id` with index value `value`.
    pub fn entry_key(&self, keys: &CollectionKeys, value: &KeyPart, id: &KeyPart) -> Key {
        match self.inner.kind {
            IndexKind::Primary => keys.index_key(&self.inner.name, value, None),
            IndexKind::Secondary => keys.index_key(&self.inner.name, value, Some(id)),
        }
    }
}

impl<O> Clone for IndexDescriptor<O> {
    fn clone(&self) -> Self {
        IndexDescriptor {
            inner: self.inner.clone(),
        }
    }
}

impl<O> Debug for IndexDescriptor<O> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexDescriptor")
            .field("name", &self.inner.name)
            .field("kind", &self.inner.kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct User {
        email: String,
        age: i64,
    }

    #[test]
    fn extracts_values_through_accessor() {
        let email = IndexDescriptor::new("email", IndexKind::Primary, |u: &User| u.email.clone());
        let age = IndexDescriptor::new("age", IndexKind::Secondary, |u: &User| u.age);
        let user = User {
            email: "ada@example.com".into(),
            age: 36,
        };

        assert_eq!(email.value_of(&user), KeyPart::from("ada@example.com"));
        assert_eq!(age.value_of(&user), KeyPart::from(36_i64));
        assert!(email.is_primary());
        assert!(!age.is_primary());
    }

    #[test]
    fn only_secondary_entries_carry_the_id() {
        let keys = CollectionKeys::new("tessera", "users").unwrap();
        let id = KeyPart::from("u1");
        let value = KeyPart::from(36_i64);

        let primary = IndexDescriptor::new("age", IndexKind::Primary, |u: &User| u.age);
        let secondary = IndexDescriptor::new("age", IndexKind::Secondary, |u: &User| u.age);

        assert_eq!(
            primary.entry_key(&keys, &value, &id).to_string(),
            "/tessera/users/index/age/36"
        );
        assert_eq!(
            secondary.entry_key(&keys, &value, &id).to_string(),
            "/tessera/users/index/age/36/u1"
        );
    }

    #[test]
    fn debug_names_index() {
        let index = IndexDescriptor::new("age", IndexKind::Secondary, |u: &User| u.age);
        assert_eq!(
            format!("{:?}", index),
            "IndexDescriptor { name: \"age\", kind: Secondary }"
        );
        assert_eq!(IndexKind::Primary.to_string(), "primary");
    }
}
