use crate::codec::{
    BincodeSerializer, JsonSerializer, SerializationMode, StoredFormat, StoredRecord,
    ValueSerializer,
};
use crate::common::SEGMENT_HEADROOM;
use crate::errors::{ErrorKind, TesseraError, TesseraResult};
use crate::store::{KvEntry, Versionstamp};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Physical form of one document: the value of its primary record key and, for segmented
/// values, the ordered segment payloads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedDocument {
    pub head: Vec<u8>,
    pub segments: Vec<Vec<u8>>,
}

impl EncodedDocument {
    pub fn is_segmented(&self) -> bool {
        !self.segments.is_empty()
    }
}

/// Largest segment payload for a store accepting values of up to `max_value_size` bytes.
pub fn segment_size(max_value_size: usize) -> usize {
    max_value_size
        .saturating_sub(SEGMENT_HEADROOM)
        .max(max_value_size / 2)
        .max(1)
}

/// Encodes and decodes the values of one collection.
pub struct DocumentCodec<O> {
    mode: SerializationMode<O>,
}

impl<O> Clone for DocumentCodec<O> {
    fn clone(&self) -> Self {
        DocumentCodec {
            mode: self.mode.clone(),
        }
    }
}

impl<O: Serialize + DeserializeOwned> DocumentCodec<O> {
    pub fn new(mode: SerializationMode<O>) -> Self {
        DocumentCodec { mode }
    }

    pub fn mode(&self) -> &SerializationMode<O> {
        &self.mode
    }

    /// Encodes `value` into a record that fits entries of `max_value_size` bytes.
    ///
    /// Structural values that outgrow a single entry fail with [`ErrorKind::ValueTooLarge`];
    /// the other modes fall back to a head record plus at most `max_segments` segments.
    pub fn encode(
        &self,
        value: &O,
        max_value_size: usize,
        max_segments: usize,
    ) -> TesseraResult<EncodedDocument> {
        let format = self.mode.format();
        let bytes = match &self.mode {
            SerializationMode::Structural => JsonSerializer.serialize(value)?,
            SerializationMode::Binary => BincodeSerializer.serialize(value)?,
            SerializationMode::Custom(serializer) => serializer.serialize(value)?,
        };

        let size = bytes.len();
        let record = StoredRecord::Inline { format, bytes };
        let inline = record.encode()?;
        if inline.len() <= max_value_size {
            return Ok(EncodedDocument {
                head: inline,
                segments: Vec::new(),
            });
        }

        if !self.mode.allows_segments() {
            log::error!(
                "Structural value of {} bytes exceeds the entry limit of {} bytes",
                size,
                max_value_size
            );
            return Err(TesseraError::new(
                &format!(
                    "Structural value of {} bytes exceeds the entry limit of {} bytes, use a binary serialization mode for large values",
                    size, max_value_size
                ),
                ErrorKind::ValueTooLarge,
            ));
        }

        let bytes = match record {
            StoredRecord::Inline { bytes, .. } => bytes,
            StoredRecord::Segmented { .. } => Vec::new(),
        };

        let chunk_size = segment_size(max_value_size);
        let needed = bytes.len().div_ceil(chunk_size);
        let segment_count = match u32::try_from(needed) {
            Ok(count) if needed <= max_segments => count,
            _ => {
                log::error!(
                    "Value of {} bytes needs {} segments, at most {} fit one write",
                    size,
                    needed,
                    max_segments
                );
                return Err(TesseraError::new(
                    &format!(
                        "Value of {} bytes needs {} segments, at most {} fit one write",
                        size, needed, max_segments
                    ),
                    ErrorKind::ValueTooLarge,
                ));
            }
        };
        let segments: Vec<Vec<u8>> = bytes.chunks(chunk_size).map(|chunk| chunk.to_vec()).collect();

        let head = StoredRecord::Segmented {
            format,
            size: size as u64,
            segment_count,
        }
        .encode()?;
        log::trace!("Encoded {} bytes into {} segments", size, segment_count);
        Ok(EncodedDocument { head, segments })
    }

    /// Decodes the serialized bytes of a record, picking the serializer by its format tag.
    pub fn deserialize(&self, format: StoredFormat, bytes: &[u8]) -> TesseraResult<O> {
        let result = match format {
            StoredFormat::Json => JsonSerializer.deserialize(bytes),
            StoredFormat::Bincode => BincodeSerializer.deserialize(bytes),
            StoredFormat::Custom => match &self.mode {
                SerializationMode::Custom(serializer) => serializer.deserialize(bytes),
                _ => {
                    log::error!("Record was written by a custom serializer the collection lacks");
                    return Err(TesseraError::new(
                        "Record was written by a custom serializer the collection lacks",
                        ErrorKind::Corruption,
                    ));
                }
            },
        };

        result.map_err(|e| {
            log::error!("Stored value could not be decoded: {}", e);
            TesseraError::new_with_cause("Stored value could not be decoded", ErrorKind::Corruption, e)
        })
    }

    /// Decodes an inline record. Segmented heads need [`reassemble`] first.
    pub fn decode_inline(&self, record: &StoredRecord) -> TesseraResult<O> {
        match record {
            StoredRecord::Inline { format, bytes } => self.deserialize(*format, bytes),
            StoredRecord::Segmented { .. } => Err(TesseraError::new(
                "Segmented record cannot be decoded without its segments",
                ErrorKind::InternalError,
            )),
        }
    }
}

/// Concatenates the segments of a segmented record.
///
/// `segments` must hold the entries read for segment keys `0..segment_count`, in order and from
/// the same snapshot as the head. Every segment has to exist, carry the head's versionstamp
/// and together add up to the recorded size.
pub fn reassemble(
    record: &StoredRecord,
    head_versionstamp: Versionstamp,
    segments: &[Option<KvEntry>],
) -> TesseraResult<Vec<u8>> {
    let (size, segment_count) = match record {
        StoredRecord::Segmented {
            size,
            segment_count,
            ..
        } => (*size, *segment_count),
        StoredRecord::Inline { bytes, .. } => return Ok(bytes.clone()),
    };

    if segments.len() != segment_count as usize {
        log::error!(
            "Expected {} segments, read {}",
            segment_count,
            segments.len()
        );
        return Err(TesseraError::new(
            &format!("Expected {} segments, read {}", segment_count, segments.len()),
            ErrorKind::Corruption,
        ));
    }

    let mut bytes = Vec::with_capacity(size as usize);
    for (n, segment) in segments.iter().enumerate() {
        match segment {
            Some(entry) if entry.versionstamp == head_versionstamp => {
                bytes.extend_from_slice(&entry.value)
            }
            Some(entry) => {
                log::error!(
                    "Segment {} is stale: written at {}, head at {}",
                    n,
                    entry.versionstamp,
                    head_versionstamp
                );
                return Err(TesseraError::new(
                    &format!("Segment {} does not belong to the current head", n),
                    ErrorKind::Corruption,
                ));
            }
            None => {
                log::error!("Segment {} of {} is missing", n, segment_count);
                return Err(TesseraError::new(
                    &format!("Segment {} of {} is missing", n, segment_count),
                    ErrorKind::Corruption,
                ));
            }
        }
    }

    if bytes.len() as u64 != size {
        log::error!("Segments add up to {} bytes, head records {}", bytes.len(), size);
        return Err(TesseraError::new(
            &format!("Segments add up to {} bytes, head records {}", bytes.len(), size),
            ErrorKind::Corruption,
        ));
    }
    Ok(bytes)
}
