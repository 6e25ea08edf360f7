//! # Tessera - typed document collections over an ordered key-value store
//!
//! Tessera turns any ordered, transactional key-value store into a document database:
//! typed collections with generated or derived ids, primary and secondary indices, values too
//! large for one store entry, and resumable cursor pagination.
//!
//! ## Key Features
//!
//! - **Typed collections**: any `serde` type is a document value; an optional model turns the
//!   insert shape into the stored shape
//! - **Atomic writes**: a document, its segments and its index entries change in one store
//!   transaction guarded by version checks
//! - **Optimistic concurrency**: every document carries the versionstamp of its last write
//! - **Indices**: primary (unique value) and secondary (shared value) indices maintained on write
//! - **Large values**: binary-serialized values above the store's entry limit are segmented
//! - **Pagination**: cursor, offset, id range, reverse and filter, with stable ordering
//! - **Pluggable stores**: in-memory store built in, fjall through `tessera-fjall-adapter`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tessera::collection::{CollectionBuilder, IdStrategy};
//! use tessera::query::limit_to;
//! use tessera::tessera::Tessera;
//!
//! let db = Tessera::builder().open()?;
//! let descriptor = CollectionBuilder::<User>::new("users")
//!     .id_strategy(IdStrategy::Snowflake)
//!     .primary_index("email", |u: &User| u.email.clone())
//!     .build()?;
//! let users = db.collection(&descriptor)?;
//!
//! users.add(User::new("ada@example.com"))?;
//! let page = users.get_many(&limit_to(10))?;
//! db.close()?;
//! ```
//!
//! ## Module Organization
//!
//! - [`codec`] - Stored record format, serializers and segmentation
//! - [`collection`] - Collection declaration, documents and the collection handle
//! - [`common`] - Constants and small shared utilities
//! - [`errors`] - Error types and result definitions
//! - [`index`] - Index declarations and index maintenance
//! - [`key`] - Order-preserving tuple keys and the persisted key layout
//! - [`query`] - Query options, pages and cursors
//! - [`store`] - The key-value store contract and the in-memory store
//! - [`tessera`] - The database handle
//! - [`tessera_builder`] - Database builder
//! - [`tessera_config`] - Database configuration

use crate::collection::snowflake::SnowflakeIdGenerator;
use std::sync::LazyLock;

pub mod codec;
pub mod collection;
pub mod common;
pub mod errors;
pub mod index;
pub mod key;
pub mod query;
pub mod store;
pub mod tessera;
pub mod tessera_builder;
pub mod tessera_config;

pub use crate::tessera::Tessera;

pub(crate) static ID_GENERATOR: LazyLock<SnowflakeIdGenerator> =
    LazyLock::new(SnowflakeIdGenerator::new);
