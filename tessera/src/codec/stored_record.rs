use crate::errors::{ErrorKind, TesseraError, TesseraResult};
use bincode::config;
use serde::{Deserialize, Serialize};

/// Serialization format tag persisted with every record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoredFormat {
    Json,
    Bincode,
    Custom,
}

/// The value of a primary record key.
///
/// A record either holds the serialized document itself or is the head of a segmented value
/// whose bytes live in `segment_count` entries under the document's segment prefix.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoredRecord {
    Inline {
        format: StoredFormat,
        bytes: Vec<u8>,
    },
    Segmented {
        format: StoredFormat,
        size: u64,
        segment_count: u32,
    },
}

impl StoredRecord {
    pub fn format(&self) -> StoredFormat {
        match self {
            StoredRecord::Inline { format, .. } => *format,
            StoredRecord::Segmented { format, .. } => *format,
        }
    }

    /// Number of segment entries that belong to this record.
    pub fn segment_count(&self) -> u32 {
        match self {
            StoredRecord::Inline { .. } => 0,
            StoredRecord::Segmented { segment_count, .. } => *segment_count,
        }
    }

    pub fn encode(&self) -> TesseraResult<Vec<u8>> {
        Ok(bincode::serde::encode_to_vec(self, config::standard())?)
    }

    pub fn decode(bytes: &[u8]) -> TesseraResult<StoredRecord> {
        match bincode::serde::decode_from_slice::<StoredRecord, _>(bytes, config::standard()) {
            Ok((record, read)) if read == bytes.len() => Ok(record),
            Ok(_) => {
                log::error!("Stored record carries trailing bytes");
                Err(TesseraError::new(
                    "Stored record carries trailing bytes",
                    ErrorKind::Corruption,
                ))
            }
            Err(e) => {
                log::error!("Stored record could not be decoded: {}", e);
                Err(TesseraError::new_with_cause(
                    "Stored record could not be decoded",
                    ErrorKind::Corruption,
                    TesseraError::from(e),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_record_survives_encoding() {
        let record = StoredRecord::Inline {
            format: StoredFormat::Json,
            bytes: b"{}".to_vec(),
        };
        let decoded = StoredRecord::decode(&record.encode().unwrap()).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(decoded.segment_count(), 0);
    }

    #[test]
    fn head_record_reports_segments() {
        let head = StoredRecord::Segmented {
            format: StoredFormat::Bincode,
            size: 200_000,
            segment_count: 4,
        };
        let decoded = StoredRecord::decode(&head.encode().unwrap()).unwrap();
        assert_eq!(decoded.segment_count(), 4);
        assert_eq!(decoded.format(), StoredFormat::Bincode);
    }

    #[test]
    fn garbage_is_corruption() {
        let err = StoredRecord::decode(&[0xff, 0xff, 0xff]).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::Corruption);

        let mut bytes = StoredRecord::Inline {
            format: StoredFormat::Json,
            bytes: vec![1],
        }
        .encode()
        .unwrap();
        bytes.push(0);
        assert_eq!(
            StoredRecord::decode(&bytes).unwrap_err().kind(),
            &ErrorKind::Corruption
        );
    }
}
