//! Key codec.
//!
//! Logical keys are tuples of [`KeyPart`]s. The tuple codec turns them into byte strings whose
//! lexicographic order equals the logical tuple order, so a range scan over encoded keys visits
//! documents in id order and a tuple prefix is always a byte prefix of every key below it.
//!
//! [`CollectionKeys`] derives the persisted layout of a collection from the database prefix
//! and the collection name:
//!
//! ```text
//! <prefix>/<collection>/id/<id>                       primary record (or segmented head)
//! <prefix>/<collection>/segment/<id>/<n>              n-th segment of an oversized value
//! <prefix>/<collection>/index/<index>/<value>         primary index entry
//! <prefix>/<collection>/index/<index>/<value>/<id>    secondary index entry
//! ```

mod collection_keys;
mod key_part;
mod tuple;

pub use collection_keys::*;
pub use key_part::*;
pub use tuple::*;
