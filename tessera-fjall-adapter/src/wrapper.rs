use std::error::Error;
use tessera::errors::{ErrorKind, TesseraError};
use tessera::store::Versionstamp;
use thiserror::Error;

const STAMP_LEN: usize = 8;

/// Errors raised while unpacking what the adapter itself wrote to fjall.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FjallValueError {
    #[error("Stored value of {0} bytes is shorter than its versionstamp header")]
    Truncated(usize),
    #[error("Commit counter of {0} bytes is malformed")]
    MalformedCounter(usize),
}

impl From<FjallValueError> for TesseraError {
    fn from(err: FjallValueError) -> Self {
        TesseraError::new(&err.to_string(), ErrorKind::Corruption)
    }
}

pub type FjallValueResult<T> = Result<T, FjallValueError>;

/// A value as fjall holds it: the versionstamp of the commit that wrote it, big endian,
/// followed by the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct FjallValue {
    pub versionstamp: Versionstamp,
    pub payload: Vec<u8>,
}

impl FjallValue {
    pub fn new(versionstamp: Versionstamp, payload: Vec<u8>) -> Self {
        FjallValue {
            versionstamp,
            payload,
        }
    }

    #[inline]
    pub fn encode(versionstamp: Versionstamp, payload: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(STAMP_LEN + payload.len());
        bytes.extend_from_slice(&versionstamp.as_u64().to_be_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    #[inline]
    pub fn decode(bytes: &[u8]) -> FjallValueResult<FjallValue> {
        let stamp = Self::read_stamp(bytes)?;
        Ok(FjallValue::new(stamp, bytes[STAMP_LEN..].to_vec()))
    }

    /// Reads only the versionstamp, for precondition checks.
    #[inline]
    pub fn read_stamp(bytes: &[u8]) -> FjallValueResult<Versionstamp> {
        let header: [u8; STAMP_LEN] = bytes
            .get(..STAMP_LEN)
            .and_then(|header| header.try_into().ok())
            .ok_or(FjallValueError::Truncated(bytes.len()))?;
        Ok(Versionstamp::new(u64::from_be_bytes(header)))
    }
}

pub(crate) fn encode_counter(value: u64) -> [u8; STAMP_LEN] {
    value.to_be_bytes()
}

pub(crate) fn decode_counter(bytes: &[u8]) -> FjallValueResult<u64> {
    let counter: [u8; STAMP_LEN] = bytes
        .try_into()
        .map_err(|_| FjallValueError::MalformedCounter(bytes.len()))?;
    Ok(u64::from_be_bytes(counter))
}

pub(crate) fn to_tessera_error(error: impl Error) -> TesseraError {
    let error_msg = error.to_string();
    let error_kind = if error_msg.contains("closed") || error_msg.contains("poisoned") {
        ErrorKind::StoreAlreadyClosed
    } else if error_msg.contains("corrupt") {
        ErrorKind::Corruption
    } else {
        ErrorKind::StoreUnavailable
    };
    TesseraError::new(&format!("Fjall error: {}", error_msg), error_kind)
}
