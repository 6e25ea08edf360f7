use crate::errors::{ErrorKind, TesseraError, TesseraResult};
use crate::key::KeyPart;
use crate::store::Versionstamp;
use std::fmt::{Display, Formatter};

/// Why a write did not commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteFailure {
    /// A document with the id already exists.
    IdCollision,
    /// The value of a primary index is claimed by another document.
    IndexCollision { index: String },
    /// The document changed since the expected version was read.
    VersionMismatch,
    /// The document does not exist.
    NotFound,
}

impl WriteFailure {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WriteFailure::IdCollision => ErrorKind::IdCollision,
            WriteFailure::IndexCollision { .. } => ErrorKind::IndexCollision,
            WriteFailure::VersionMismatch => ErrorKind::VersionMismatch,
            WriteFailure::NotFound => ErrorKind::NotFound,
        }
    }
}

impl Display for WriteFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteFailure::IdCollision => write!(f, "A document with the same id already exists"),
            WriteFailure::IndexCollision { index } => {
                write!(f, "The value of primary index '{}' is already claimed", index)
            }
            WriteFailure::VersionMismatch => write!(f, "The document changed since it was read"),
            WriteFailure::NotFound => write!(f, "The document does not exist"),
        }
    }
}

/// Outcome of a mutating collection operation.
///
/// Expected business conditions come back as [`WriteResult::Failed`] so callers can branch on
/// the cause; `Err` is left for corruption, store failures and invalid input.
///
/// # Examples
///
/// ```rust,ignore
/// match users.add(user)? {
///     WriteResult::Committed { id, versionstamp } => println!("stored {} at {}", id, versionstamp),
///     WriteResult::Failed(WriteFailure::IndexCollision { index }) => println!("{} taken", index),
///     WriteResult::Failed(other) => println!("not stored: {}", other),
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteResult {
    Committed {
        id: KeyPart,
        versionstamp: Versionstamp,
    },
    Failed(WriteFailure),
}

impl WriteResult {
    pub(crate) fn committed(id: KeyPart, versionstamp: Versionstamp) -> Self {
        WriteResult::Committed { id, versionstamp }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, WriteResult::Committed { .. })
    }

    pub fn id(&self) -> Option<&KeyPart> {
        match self {
            WriteResult::Committed { id, .. } => Some(id),
            WriteResult::Failed(_) => None,
        }
    }

    pub fn versionstamp(&self) -> Option<Versionstamp> {
        match self {
            WriteResult::Committed { versionstamp, .. } => Some(*versionstamp),
            WriteResult::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&WriteFailure> {
        match self {
            WriteResult::Committed { .. } => None,
            WriteResult::Failed(failure) => Some(failure),
        }
    }

    /// Converts a failure into an error, for callers that prefer `?` over matching.
    pub fn into_result(self) -> TesseraResult<(KeyPart, Versionstamp)> {
        match self {
            WriteResult::Committed { id, versionstamp } => Ok((id, versionstamp)),
            WriteResult::Failed(failure) => {
                Err(TesseraError::new(&failure.to_string(), failure.kind()))
            }
        }
    }
}
