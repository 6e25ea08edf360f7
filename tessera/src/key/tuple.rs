use crate::errors::{ErrorKind, TesseraError, TesseraResult};
use crate::key::KeyPart;
use std::fmt::{Display, Formatter};

const BYTES_CODE: u8 = 0x01;
const STRING_CODE: u8 = 0x02;
const FLOAT_CODE: u8 = 0x21;
const INT_CODE: u8 = 0x22;
const FALSE_CODE: u8 = 0x26;
const TRUE_CODE: u8 = 0x27;

const TERMINATOR: u8 = 0x00;
const ESCAPE: u8 = 0xff;
const SIGN_BIT: u64 = 1 << 63;

/// A logical key: an ordered tuple of [`KeyPart`]s.
///
/// `Key` orders element-wise, which is also the order of its [`encode`](Key::encode)d form.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Key(Vec<KeyPart>);

impl Key {
    pub fn new(parts: Vec<KeyPart>) -> Self {
        Key(parts)
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a new key with `part` appended.
    pub fn extend(&self, part: impl Into<KeyPart>) -> Key {
        let mut parts = self.0.clone();
        parts.push(part.into());
        Key(parts)
    }

    pub fn last(&self) -> Option<&KeyPart> {
        self.0.last()
    }

    pub fn starts_with(&self, prefix: &Key) -> bool {
        self.0.starts_with(&prefix.0)
    }

    pub fn encode(&self) -> Vec<u8> {
        encode_key(&self.0)
    }

    pub fn decode(bytes: &[u8]) -> TesseraResult<Key> {
        decode_key(bytes).map(Key)
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for part in &self.0 {
            write!(f, "/{}", part)?;
        }
        Ok(())
    }
}

impl From<Vec<KeyPart>> for Key {
    fn from(parts: Vec<KeyPart>) -> Self {
        Key(parts)
    }
}

/// Encodes a tuple of key parts into an order-preserving byte string.
pub fn encode_key(parts: &[KeyPart]) -> Vec<u8> {
    let mut out = Vec::with_capacity(parts.len() * 12);
    for part in parts {
        encode_part(part, &mut out);
    }
    out
}

/// Appends the encoding of a single key part to `out`.
pub fn encode_part(part: &KeyPart, out: &mut Vec<u8>) {
    match part {
        KeyPart::Bytes(bytes) => {
            out.push(BYTES_CODE);
            write_escaped(bytes, out);
        }
        KeyPart::String(s) => {
            out.push(STRING_CODE);
            write_escaped(s.as_bytes(), out);
        }
        KeyPart::Float(f) => {
            out.push(FLOAT_CODE);
            let bits = f.to_bits();
            let ordered = if bits & SIGN_BIT != 0 {
                !bits
            } else {
                bits ^ SIGN_BIT
            };
            out.extend_from_slice(&ordered.to_be_bytes());
        }
        KeyPart::Int(i) => {
            out.push(INT_CODE);
            out.extend_from_slice(&((*i as u64) ^ SIGN_BIT).to_be_bytes());
        }
        KeyPart::Bool(false) => out.push(FALSE_CODE),
        KeyPart::Bool(true) => out.push(TRUE_CODE),
    }
}

/// Encodes a single part on its own.
pub fn encode_single(part: &KeyPart) -> Vec<u8> {
    let mut out = Vec::new();
    encode_part(part, &mut out);
    out
}

fn write_escaped(bytes: &[u8], out: &mut Vec<u8>) {
    for &byte in bytes {
        out.push(byte);
        if byte == TERMINATOR {
            out.push(ESCAPE);
        }
    }
    out.push(TERMINATOR);
}

/// Decodes an encoded tuple back into its parts.
pub fn decode_key(bytes: &[u8]) -> TesseraResult<Vec<KeyPart>> {
    let mut parts = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let (part, next) = decode_part(bytes, pos)?;
        parts.push(part);
        pos = next;
    }
    Ok(parts)
}

/// Decodes an encoding that must contain exactly one part.
pub fn decode_single(bytes: &[u8]) -> TesseraResult<KeyPart> {
    let (part, next) = decode_part(bytes, 0)?;
    if next != bytes.len() {
        log::error!("Trailing bytes after key part at offset {}", next);
        return Err(TesseraError::new(
            "Trailing bytes after key part",
            ErrorKind::Corruption,
        ));
    }
    Ok(part)
}

fn decode_part(bytes: &[u8], pos: usize) -> TesseraResult<(KeyPart, usize)> {
    let code = *bytes
        .get(pos)
        .ok_or_else(|| TesseraError::new("Empty key part", ErrorKind::Corruption))?;
    let body = pos + 1;
    match code {
        BYTES_CODE => {
            let (raw, next) = read_escaped(bytes, body)?;
            Ok((KeyPart::Bytes(raw), next))
        }
        STRING_CODE => {
            let (raw, next) = read_escaped(bytes, body)?;
            Ok((KeyPart::String(String::from_utf8(raw)?), next))
        }
        FLOAT_CODE => {
            let ordered = read_u64(bytes, body)?;
            let bits = if ordered & SIGN_BIT != 0 {
                ordered ^ SIGN_BIT
            } else {
                !ordered
            };
            Ok((KeyPart::Float(f64::from_bits(bits)), body + 8))
        }
        INT_CODE => {
            let raw = read_u64(bytes, body)?;
            Ok((KeyPart::Int((raw ^ SIGN_BIT) as i64), body + 8))
        }
        FALSE_CODE => Ok((KeyPart::Bool(false), body)),
        TRUE_CODE => Ok((KeyPart::Bool(true), body)),
        other => {
            log::error!("Unknown key part type code {:#04x} at offset {}", other, pos);
            Err(TesseraError::new(
                &format!("Unknown key part type code {:#04x}", other),
                ErrorKind::Corruption,
            ))
        }
    }
}

fn read_escaped(bytes: &[u8], mut pos: usize) -> TesseraResult<(Vec<u8>, usize)> {
    let mut raw = Vec::new();
    while pos < bytes.len() {
        let byte = bytes[pos];
        if byte == TERMINATOR {
            if bytes.get(pos + 1) == Some(&ESCAPE) {
                raw.push(TERMINATOR);
                pos += 2;
                continue;
            }
            return Ok((raw, pos + 1));
        }
        raw.push(byte);
        pos += 1;
    }
    Err(TesseraError::new(
        "Unterminated key part",
        ErrorKind::Corruption,
    ))
}

fn read_u64(bytes: &[u8], pos: usize) -> TesseraResult<u64> {
    let slice = bytes.get(pos..pos + 8).ok_or_else(|| {
        TesseraError::new("Truncated numeric key part", ErrorKind::Corruption)
    })?;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(slice);
    Ok(u64::from_be_bytes(buf))
}

/// Smallest byte string greater than every key that starts with `prefix`.
///
/// Every encoded part starts with a type code below `0xff`, so appending `0xff` bounds the
/// prefix range from above.
pub fn prefix_end(prefix: &[u8]) -> Vec<u8> {
    let mut end = prefix.to_vec();
    end.push(ESCAPE);
    end
}
