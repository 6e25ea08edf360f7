//! Typed document collections.
//!
//! A collection is declared once with a [`CollectionBuilder`] and opened against a database with
//! [`Tessera::collection`](crate::tessera::Tessera::collection):
//!
//! ```rust,ignore
//! use tessera::collection::{CollectionBuilder, IdStrategy};
//!
//! let descriptor = CollectionBuilder::<User>::new("users")
//!     .id_strategy(IdStrategy::Snowflake)
//!     .primary_index("email", |u: &User| u.email.clone())
//!     .build()?;
//! let users = db.collection(&descriptor)?;
//!
//! let result = users.add(user)?;
//! if let Some(failure) = result.failure() {
//!     println!("not added: {}", failure);
//! }
//! ```
//!
//! # Documents
//!
//! A [`Document`] is the id, the value and the versionstamp of the commit that last wrote it.
//! Ids are [`KeyPart`](crate::key::KeyPart)s chosen by the [`IdStrategy`]:
//! - `Uuid`: random v4 strings (default)
//! - `Snowflake`: time-ordered integers, so id order is insertion order
//! - `Derived`: computed from the value, so adding the same value twice collides
//!
//! # Writes
//!
//! Every write is one atomic operation over the primary record, its segments and its index
//! entries. Expected conditions come back as a [`WriteResult`] rather than an error, and a
//! version precondition can be attached through [`WriteOptions`].

mod collection_builder;
mod document;
mod id_strategy;
pub(crate) mod operation;
mod options;
pub mod snowflake;
mod tessera_collection;
mod write_result;

pub use collection_builder::*;
pub use document::*;
pub use id_strategy::*;
pub use options::*;
pub use tessera_collection::Collection;
pub(crate) use tessera_collection::ManagedCollection;
pub use write_result::*;
