//! Document codec.
//!
//! Maps a document value to the physical store entries that hold it and back. A value is
//! serialized with the collection's [`SerializationMode`] and wrapped in a [`StoredRecord`]:
//!
//! - **Inline**: the record carries the serialized bytes and fits one store entry
//! - **Segmented**: the record is a head carrying the total size and segment count, and the
//!   bytes are split across ordered segment entries written in the same atomic operation
//!
//! Reassembly concatenates the segments in order and fails with
//! [`ErrorKind::Corruption`](crate::errors::ErrorKind::Corruption) when a segment is missing,
//! stale or the total size does not add up.
//!
//! [`Model`] covers collections whose insert shape differs from the stored shape.

mod document_codec;
mod model;
mod serializer;
mod stored_record;

pub use document_codec::*;
pub use model::*;
pub use serializer::*;
pub use stored_record::*;
