use crate::errors::{ErrorKind, TesseraError, TesseraResult};
use crate::key::decode_single;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Renders the key suffix of the last returned entry as an opaque cursor.
pub fn encode_cursor(suffix: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(suffix)
}

/// Recovers the key suffix a cursor stands for.
///
/// The suffix must be one tuple-encoded key part, the document id.
pub fn decode_cursor(cursor: &str) -> TesseraResult<Vec<u8>> {
    let suffix = URL_SAFE_NO_PAD.decode(cursor).map_err(|e| {
        log::error!("Cursor '{}' is not valid base64: {}", cursor, e);
        TesseraError::from(e)
    })?;

    if let Err(e) = decode_single(&suffix) {
        log::error!("Cursor '{}' does not encode a document id", cursor);
        return Err(TesseraError::new_with_cause(
            &format!("Cursor '{}' does not encode a document id", cursor),
            ErrorKind::InvalidQuery,
            e,
        ));
    }
    Ok(suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{encode_single, KeyPart};

    #[test]
    fn cursor_is_url_safe_and_decodes() {
        let suffix = encode_single(&KeyPart::from("user/42?x"));
        let cursor = encode_cursor(&suffix);
        assert!(cursor
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(decode_cursor(&cursor).unwrap(), suffix);
    }

    #[test]
    fn malformed_cursors_are_invalid_queries() {
        assert_eq!(
            decode_cursor("not base64!").unwrap_err().kind(),
            &ErrorKind::InvalidQuery
        );
        let not_a_key = encode_cursor(&[0x99, 0x01]);
        assert_eq!(
            decode_cursor(&not_a_key).unwrap_err().kind(),
            &ErrorKind::InvalidQuery
        );
    }
}
