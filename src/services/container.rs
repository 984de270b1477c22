//! p7x container parsing.
//!
//! A p7x signature part is a 4-byte file identifier followed by the DER
//! encoding of a PKCS#7 signed-data message. Only the header is checked here;
//! the payload is handed over untouched.

use crate::domain::constants::{MAX_P7X_STREAM_SIZE, P7X_FILE_ID, P7X_HEADER_SIZE};
use crate::domain::pkcs7::SignatureBlob;
use crate::infra::error::{ValidationError, ValidationResult};
use std::io::{ErrorKind, Read, Seek, SeekFrom};

/// Reads a [`SignatureBlob`] out of a p7x stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContainerParser;

impl ContainerParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Validate the header and return the bytes that follow it.
    ///
    /// # Errors
    ///
    /// Returns `SignatureInvalid` when the stream is too short or too long,
    /// the file identifier does not match, fewer bytes than announced by the
    /// stream length can be read, or the stream fails.
    pub fn read_signature<R: Read + Seek>(&self, stream: &mut R) -> ValidationResult<SignatureBlob> {
        let length = stream.seek(SeekFrom::End(0))?;
        stream.seek(SeekFrom::Start(0))?;

        if length <= P7X_HEADER_SIZE || length > MAX_P7X_STREAM_SIZE {
            return Err(ValidationError::signature_invalid(format!(
                "p7x stream length {length} outside ({P7X_HEADER_SIZE}, {MAX_P7X_STREAM_SIZE}]"
            )));
        }

        let mut header = [0u8; 4];
        stream.read_exact(&mut header).map_err(short_read)?;
        let file_id = u32::from_le_bytes(header);
        if file_id != P7X_FILE_ID {
            return Err(ValidationError::signature_invalid(format!(
                "unexpected p7x file identifier {file_id:#010x}"
            )));
        }

        // Bounded above, so the cast cannot truncate.
        let payload_len = (length - P7X_HEADER_SIZE) as usize;
        let mut payload = vec![0u8; payload_len];
        stream.read_exact(&mut payload).map_err(short_read)?;

        log::debug!("Read {payload_len} byte p7x signature payload");
        Ok(SignatureBlob::from_der(payload))
    }
}

fn short_read(error: std::io::Error) -> ValidationError {
    if error.kind() == ErrorKind::UnexpectedEof {
        ValidationError::signature_invalid("p7x stream ended before its announced length")
    } else {
        error.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn p7x(payload: &[u8]) -> Cursor<Vec<u8>> {
        let mut bytes = P7X_FILE_ID.to_le_bytes().to_vec();
        bytes.extend_from_slice(payload);
        Cursor::new(bytes)
    }

    #[test]
    fn test_strips_header() {
        let blob = ContainerParser::new()
            .read_signature(&mut p7x(&[0x30, 0x00, 0xff]))
            .unwrap();
        assert_eq!(blob.as_der(), &[0x30, 0x00, 0xff]);
    }

    #[test]
    fn test_header_only_stream_is_rejected() {
        let err = ContainerParser::new()
            .read_signature(&mut p7x(&[]))
            .unwrap_err();
        assert!(err.is_signature_invalid());
    }

    #[test]
    fn test_bad_magic_is_rejected() {
        let mut stream = Cursor::new(b"PKCY\x30\x00".to_vec());
        let err = ContainerParser::new().read_signature(&mut stream).unwrap_err();
        assert!(err.to_string().contains("file identifier"));
    }

    #[test]
    fn test_size_boundaries() {
        let max_payload = (MAX_P7X_STREAM_SIZE - P7X_HEADER_SIZE) as usize;
        let blob = ContainerParser::new()
            .read_signature(&mut p7x(&vec![0u8; max_payload]))
            .unwrap();
        assert_eq!(blob.len(), max_payload);

        let err = ContainerParser::new()
            .read_signature(&mut p7x(&vec![0u8; max_payload + 1]))
            .unwrap_err();
        assert!(err.is_signature_invalid());
    }

    #[test]
    fn test_reads_from_start_regardless_of_position() {
        let mut stream = p7x(&[1, 2, 3]);
        stream.set_position(5);
        let blob = ContainerParser::new().read_signature(&mut stream).unwrap();
        assert_eq!(blob.as_der(), &[1, 2, 3]);
    }
}
