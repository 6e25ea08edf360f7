use crate::codec::StoredFormat;
use crate::errors::TesseraResult;
use bincode::config;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Turns document values into bytes and back.
///
/// Collections configured with [`SerializationMode::Custom`] delegate to an implementation of
/// this trait; the built-in modes use [`JsonSerializer`] and [`BincodeSerializer`].
pub trait ValueSerializer<T>: Send + Sync {
    fn serialize(&self, value: &T) -> TesseraResult<Vec<u8>>;

    fn deserialize(&self, bytes: &[u8]) -> TesseraResult<T>;
}

/// Structural encoding via `serde_json`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonSerializer;

impl<T: Serialize + DeserializeOwned> ValueSerializer<T> for JsonSerializer {
    fn serialize(&self, value: &T) -> TesseraResult<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn deserialize(&self, bytes: &[u8]) -> TesseraResult<T> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Compact binary encoding via `bincode`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BincodeSerializer;

impl<T: Serialize + DeserializeOwned> ValueSerializer<T> for BincodeSerializer {
    fn serialize(&self, value: &T) -> TesseraResult<Vec<u8>> {
        Ok(bincode::serde::encode_to_vec(value, config::standard())?)
    }

    fn deserialize(&self, bytes: &[u8]) -> TesseraResult<T> {
        let (value, _) = bincode::serde::decode_from_slice(bytes, config::standard())?;
        Ok(value)
    }
}

/// How a collection stores its values.
pub enum SerializationMode<T> {
    /// JSON stored inline. Values that do not fit a single entry are rejected.
    Structural,
    /// Bincode, segmented when the value outgrows a single entry.
    Binary,
    /// A caller-supplied serializer, segmented like [`Binary`](SerializationMode::Binary).
    Custom(Arc<dyn ValueSerializer<T>>),
}

impl<T> SerializationMode<T> {
    pub fn custom<S: ValueSerializer<T> + 'static>(serializer: S) -> Self {
        SerializationMode::Custom(Arc::new(serializer))
    }

    pub fn format(&self) -> StoredFormat {
        match self {
            SerializationMode::Structural => StoredFormat::Json,
            SerializationMode::Binary => StoredFormat::Bincode,
            SerializationMode::Custom(_) => StoredFormat::Custom,
        }
    }

    pub fn allows_segments(&self) -> bool {
        !matches!(self, SerializationMode::Structural)
    }
}

impl<T> Clone for SerializationMode<T> {
    fn clone(&self) -> Self {
        match self {
            SerializationMode::Structural => SerializationMode::Structural,
            SerializationMode::Binary => SerializationMode::Binary,
            SerializationMode::Custom(serializer) => SerializationMode::Custom(serializer.clone()),
        }
    }
}

impl<T> Default for SerializationMode<T> {
    fn default() -> Self {
        SerializationMode::Structural
    }
}

impl<T> Debug for SerializationMode<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SerializationMode::Structural => write!(f, "Structural"),
            SerializationMode::Binary => write!(f, "Binary"),
            SerializationMode::Custom(_) => write!(f, "Custom"),
        }
    }
}
