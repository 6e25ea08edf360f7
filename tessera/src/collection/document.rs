use crate::key::KeyPart;
use crate::store::Versionstamp;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Bounds every stored document value satisfies.
pub trait DocumentValue: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> DocumentValue for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

/// A stored document: its id, the versionstamp of the commit that last wrote it and its value.
///
/// The versionstamp is the optimistic concurrency token. Pass it back through
/// [`WriteOptions::expected_version`](crate::collection::WriteOptions::expected_version) to make a
/// write conditional on the document being unchanged since it was read.
#[derive(Clone, Debug, PartialEq)]
pub struct Document<O> {
    id: KeyPart,
    versionstamp: Versionstamp,
    value: O,
}

impl<O> Document<O> {
    pub fn new(id: KeyPart, versionstamp: Versionstamp, value: O) -> Self {
        Document {
            id,
            versionstamp,
            value,
        }
    }

    pub fn id(&self) -> &KeyPart {
        &self.id
    }

    pub fn versionstamp(&self) -> Versionstamp {
        self.versionstamp
    }

    pub fn value(&self) -> &O {
        &self.value
    }

    pub fn into_value(self) -> O {
        self.value
    }

    pub fn into_parts(self) -> (KeyPart, Versionstamp, O) {
        (self.id, self.versionstamp, self.value)
    }
}
