use crate::common::{ID_KEY_PREFIX, INDEX_KEY_PREFIX, NAME_SEPARATOR, SEGMENT_KEY_PREFIX};
use crate::errors::{ErrorKind, TesseraError, TesseraResult};
use crate::key::{decode_single, encode_part, Key, KeyPart};

/// Validates a prefix, collection or index name.
///
/// Names must be non-empty and free of `/`, the separator keys are rendered with.
pub fn validate_name(name: &str, what: &str) -> TesseraResult<()> {
    if name.is_empty() {
        log::error!("{} name cannot be empty", what);
        return Err(TesseraError::new(
            &format!("{} name cannot be empty", what),
            ErrorKind::InvalidName,
        ));
    }

    if name.contains(NAME_SEPARATOR) {
        log::error!("{} name '{}' contains '{}'", what, name, NAME_SEPARATOR);
        return Err(TesseraError::new(
            &format!("{} name '{}' cannot contain '{}'", what, name, NAME_SEPARATOR),
            ErrorKind::InvalidName,
        ));
    }
    Ok(())
}

/// The key layout of one collection.
///
/// All keys of a collection share [`base`](CollectionKeys::base); primary records, segments and
/// index entries live below three disjoint sub-prefixes, so a scan over one space never yields
/// entries of another.
#[derive(Clone, Debug)]
pub struct CollectionKeys {
    collection: String,
    base: Key,
    id_space: Key,
    segment_space: Key,
    index_space: Key,
    id_prefix: Vec<u8>,
}

impl CollectionKeys {
    pub fn new(prefix: &str, collection: &str) -> TesseraResult<Self> {
        validate_name(prefix, "Prefix")?;
        validate_name(collection, "Collection")?;

        let base = Key::new(vec![KeyPart::from(prefix), KeyPart::from(collection)]);
        let id_space = base.extend(ID_KEY_PREFIX);
        let segment_space = base.extend(SEGMENT_KEY_PREFIX);
        let index_space = base.extend(INDEX_KEY_PREFIX);
        let id_prefix = id_space.encode();

        Ok(CollectionKeys {
            collection: collection.to_string(),
            base,
            id_space,
            segment_space,
            index_space,
            id_prefix,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn base(&self) -> &Key {
        &self.base
    }

    pub fn id_space(&self) -> &Key {
        &self.id_space
    }

    pub fn segment_space(&self) -> &Key {
        &self.segment_space
    }

    pub fn index_space(&self) -> &Key {
        &self.index_space
    }

    /// Encoded prefix shared by every primary record key.
    pub fn id_prefix(&self) -> &[u8] {
        &self.id_prefix
    }

    pub fn document_key(&self, id: &KeyPart) -> Key {
        self.id_space.extend(id.clone())
    }

    /// Encoded primary record key, built without cloning the prefix tuple.
    pub fn encoded_document_key(&self, id: &KeyPart) -> Vec<u8> {
        let mut key = self.id_prefix.clone();
        encode_part(id, &mut key);
        key
    }

    pub fn segment_prefix(&self, id: &KeyPart) -> Key {
        self.segment_space.extend(id.clone())
    }

    pub fn segment_key(&self, id: &KeyPart, n: u32) -> Key {
        self.segment_prefix(id).extend(n)
    }

    /// Prefix of all entries of one index.
    pub fn index_prefix(&self, index: &str) -> Key {
        self.index_space.extend(index)
    }

    /// Prefix of all entries of one index holding `value`.
    pub fn index_value_prefix(&self, index: &str, value: &KeyPart) -> Key {
        self.index_prefix(index).extend(value.clone())
    }

    /// Key of an index entry. Secondary index entries carry the document id as a suffix so
    /// entries of documents sharing a value stay distinct; primary index entries do not.
    pub fn index_key(&self, index: &str, value: &KeyPart, id: Option<&KeyPart>) -> Key {
        let key = self.index_value_prefix(index, value);
        match id {
            Some(id) => key.extend(id.clone()),
            None => key,
        }
    }

    /// Recovers the document id from an encoded primary record key.
    pub fn id_from_document_key(&self, encoded: &[u8]) -> TesseraResult<KeyPart> {
        match encoded.strip_prefix(self.id_prefix.as_slice()) {
            Some(suffix) => decode_single(suffix),
            None => {
                log::error!(
                    "Key does not belong to the id space of collection {}",
                    self.collection
                );
                Err(TesseraError::new(
                    &format!(
                        "Key does not belong to the id space of collection {}",
                        self.collection
                    ),
                    ErrorKind::Corruption,
                ))
            }
        }
    }
}
