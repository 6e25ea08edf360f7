//! The ordered key-value store contract and its in-memory implementation.
//!
//! Tessera does not own a storage engine. Every collection talks to a [`KvStore`], a cheap
//! handle over a [`KvStoreProvider`] that offers:
//! - ordered byte-string keys with point reads ([`get`](KvStoreProvider::get),
//!   [`get_many`](KvStoreProvider::get_many))
//! - range scans in either direction with a limit and a resumption cursor
//!   ([`scan`](KvStoreProvider::scan))
//! - atomic operations: a set of per-key version checks plus puts and deletes that either all
//!   apply or none do ([`commit`](KvStoreProvider::commit))
//!
//! Every committed write stamps the keys it touches with a fresh [`Versionstamp`], which the
//! collection layer hands to callers as the optimistic concurrency token.
//!
//! Backends:
//! - **In-Memory Store**: [`memory::InMemoryStore`] for tests and ephemeral data
//! - **Fjall Store**: `tessera-fjall-adapter` for persistent, LSM-based storage

mod atomic_operation;
mod entry;
mod kv_store;
pub mod memory;
mod versionstamp;

pub use atomic_operation::*;
pub use entry::*;
pub use kv_store::*;
pub use versionstamp::*;
