use backtrace::Backtrace;
use serde::{de, ser};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for Tessera operations
///
/// Business conditions (`IdCollision`, `IndexCollision`, `VersionMismatch`, `NotFound`) are
/// normally reported through [`WriteResult`](crate::collection::WriteResult) rather than as
/// an `Err`. The kinds are still listed here so the failure can be converted into an error
/// with [`WriteResult::into_result`](crate::collection::WriteResult::into_result) when a caller
/// prefers `?` propagation.
///
/// # Examples
///
/// ```rust,ignore
/// use tessera::errors::{TesseraError, ErrorKind, TesseraResult};
///
/// fn example() -> TesseraResult<()> {
///     Err(TesseraError::new("Malformed cursor", ErrorKind::InvalidQuery))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Business conditions
    /// The requested document does not exist
    NotFound,
    /// A document with the same id already exists
    IdCollision,
    /// A primary index value is already claimed by another document
    IndexCollision,
    /// The optimistic concurrency precondition did not hold
    VersionMismatch,

    // Data errors
    /// Stored data could not be reassembled or decoded
    Corruption,
    /// Error encoding or decoding a value
    EncodingError,
    /// Encoded value does not fit into a single store entry
    ValueTooLarge,

    // Input errors
    /// Pagination parameters are malformed
    InvalidQuery,
    /// A collection, index or prefix name is malformed
    InvalidName,
    /// A document id could not be used as a key
    InvalidId,
    /// The index is not declared on the collection
    IndexNotFound,
    /// The operation is not valid in the current context
    InvalidOperation,

    // Store errors
    /// Transport or backend failure of the underlying store
    StoreUnavailable,
    /// Store has already been closed
    StoreAlreadyClosed,

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::IdCollision => write!(f, "Id collision"),
            ErrorKind::IndexCollision => write!(f, "Index collision"),
            ErrorKind::VersionMismatch => write!(f, "Version mismatch"),
            ErrorKind::Corruption => write!(f, "Corruption"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::ValueTooLarge => write!(f, "Value too large"),
            ErrorKind::InvalidQuery => write!(f, "Invalid query"),
            ErrorKind::InvalidName => write!(f, "Invalid name"),
            ErrorKind::InvalidId => write!(f, "Invalid id"),
            ErrorKind::IndexNotFound => write!(f, "Index not found"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::StoreUnavailable => write!(f, "Store unavailable"),
            ErrorKind::StoreAlreadyClosed => write!(f, "Store already closed"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom Tessera error type.
///
/// `TesseraError` encapsulates error information including the error message, kind, and optional cause.
/// It supports error chaining and backtraces for debugging.
///
/// # Examples
///
/// ```rust,ignore
/// use tessera::errors::{TesseraError, ErrorKind};
///
/// // Create a simple error
/// let err = TesseraError::new("Segment 3 is missing", ErrorKind::Corruption);
///
/// // Create an error with a cause
/// let cause = TesseraError::new("disk gone", ErrorKind::StoreUnavailable);
/// let err = TesseraError::new_with_cause("Commit failed", ErrorKind::StoreUnavailable, cause);
/// ```
#[derive(Clone)]
pub struct TesseraError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<TesseraError>>,
    backtrace: Atomic<Backtrace>,
}

impl TesseraError {
    /// Creates a new `TesseraError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        TesseraError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new_unresolved()),
        }
    }

    /// Creates a new `TesseraError` with a cause error.
    ///
    /// This creates an error chain where the cause error is preserved for debugging.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: TesseraError) -> Self {
        TesseraError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new_unresolved()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&TesseraError> {
        self.cause.as_deref()
    }
}

impl Display for TesseraError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for TesseraError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => {
                let mut backtrace = self.backtrace.write();
                backtrace.resolve();
                write!(f, "{}\n{:?}", self.message, *backtrace)
            }
        }
    }
}

impl Error for TesseraError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for Tessera operations.
pub type TesseraResult<T> = Result<T, TesseraError>;

impl de::Error for TesseraError {
    fn custom<T: Display>(msg: T) -> Self {
        TesseraError::new(&msg.to_string(), ErrorKind::EncodingError)
    }
}

impl ser::Error for TesseraError {
    fn custom<T: Display>(msg: T) -> Self {
        TesseraError::new(&msg.to_string(), ErrorKind::EncodingError)
    }
}

impl From<std::io::Error> for TesseraError {
    fn from(err: std::io::Error) -> Self {
        TesseraError::new(&format!("IO error: {}", err), ErrorKind::StoreUnavailable)
    }
}

impl From<serde_json::Error> for TesseraError {
    fn from(err: serde_json::Error) -> Self {
        TesseraError::new(&format!("JSON encoding error: {}", err), ErrorKind::EncodingError)
    }
}

impl From<bincode::error::EncodeError> for TesseraError {
    fn from(err: bincode::error::EncodeError) -> Self {
        TesseraError::new(&format!("Binary encoding error: {}", err), ErrorKind::EncodingError)
    }
}

impl From<bincode::error::DecodeError> for TesseraError {
    fn from(err: bincode::error::DecodeError) -> Self {
        TesseraError::new(&format!("Binary decoding error: {}", err), ErrorKind::EncodingError)
    }
}

impl From<base64::DecodeError> for TesseraError {
    fn from(err: base64::DecodeError) -> Self {
        TesseraError::new(&format!("Malformed cursor: {}", err), ErrorKind::InvalidQuery)
    }
}

impl From<std::string::FromUtf8Error> for TesseraError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        TesseraError::new(
            &format!("UTF-8 encoding error: {}", err),
            ErrorKind::EncodingError,
        )
    }
}
