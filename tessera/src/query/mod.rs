//! Pagination engine.
//!
//! A query selects a contiguous key range of a collection (all documents, an id range, or the
//! entries of one index value), walks it in either direction and assembles a [`Page`]:
//!
//! - `start_id` / `end_id` bound the id range (inclusive / exclusive)
//! - `cursor` resumes right after the last document of an earlier page
//! - `offset` skips that many matching documents from the start of the range
//! - `filter` drops documents after decoding, before they count against `limit`
//! - `limit` caps the number of documents in the page
//!
//! Ranges are read in batches of `batch_size` entries. No lock is held between batches, so a
//! long scan sees each batch consistently but not the collection as a whole.
//!
//! # Examples
//!
//! ```rust,ignore
//! use tessera::query::{limit_to, QueryOptions};
//!
//! let mut page = users.get_many(&limit_to(100))?;
//! while let Some(cursor) = page.cursor.take() {
//!     page = users.get_many(&QueryOptions::new().cursor(cursor).limit(100))?;
//! }
//! ```

mod cursor;
mod page;
mod paginator;
mod query_options;

pub use cursor::*;
pub use page::*;
pub(crate) use paginator::*;
pub use query_options::*;
