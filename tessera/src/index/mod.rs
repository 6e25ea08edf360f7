//! Index maintenance.
//!
//! Indices are declared per collection through [`IndexDescriptor`]s. Each descriptor names the
//! index, says whether it is [`IndexKind::Primary`] (at most one document per value) or
//! [`IndexKind::Secondary`] (many documents per value) and supplies the accessor that extracts
//! the index value from a stored document.
//!
//! [`IndexWriter::diff`] turns an old and a new document value into an [`IndexDelta`]: the index
//! entries to remove, the entries to insert and, for primary indices, the "value must be
//! unclaimed" checks. The delta is applied to the same atomic operation as the primary write,
//! so a document and its index entries always change together.

mod descriptor;
mod index_writer;

pub use descriptor::*;
pub use index_writer::*;
