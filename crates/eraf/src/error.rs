//! Error types for the container codec and field cipher.

use thiserror::Error;

use crate::cipher::NONCE_LEN;
use crate::header::HEADER_LEN;

/// Top-level error type for every fallible ERAF operation.
///
/// Variants map to a coarse [`ErrorKind`] via [`ErafError::kind`] so callers
/// can branch on the failure class without matching on payloads.
#[derive(Debug, Error)]
pub enum ErafError {
    /// The input is shorter than the fixed header.
    #[error("buffer too small: need at least {HEADER_LEN} bytes, got {have}")]
    BufferTooSmall { have: usize },

    /// A header-derived offset/length pair points past the end of the payload.
    #[error("{field} slice {start}..{end} exceeds payload of {payload_len} bytes")]
    SliceOutOfRange {
        field: &'static str,
        start: usize,
        end: usize,
        payload_len: usize,
    },

    /// The AES key is not 16, 24 or 32 bytes long.
    #[error("invalid key length: expected 16, 24 or 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    /// A non-empty field needs sealing or opening but no nonce was supplied.
    #[error("missing nonce")]
    MissingNonce,

    /// The nonce is non-empty but not the length the AEAD requires.
    #[error("invalid nonce length: expected {NONCE_LEN} bytes, got {0}")]
    InvalidNonceLength(usize),

    /// AEAD tag verification failed while opening a field.
    #[error("authentication failed for field {0}")]
    AuthenticationFailed(&'static str),

    /// The AEAD refused to seal a field.
    #[error("seal failed for field {0}")]
    SealFailed(&'static str),

    /// Sealing would grow the payload until a header offset no longer fits in u16.
    #[error("sealed layout needs header offset {offset}, beyond the u16 limit of 65535")]
    OffsetOverflow { offset: usize },

    /// Reading from or writing to a byte stream failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A certificate or key field is empty, malformed, or rejected by rustls.
    #[error("certificate error: {0}")]
    Certificate(String),
}

/// Failure class of an [`ErafError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BufferTooSmall,
    SliceOutOfRange,
    InvalidKeyLength,
    MissingNonce,
    InvalidNonceLength,
    AuthenticationFailed,
    SealFailed,
    OffsetOverflow,
    Io,
    Certificate,
}

impl ErafError {
    /// Returns the failure class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ErafError::BufferTooSmall { .. } => ErrorKind::BufferTooSmall,
            ErafError::SliceOutOfRange { .. } => ErrorKind::SliceOutOfRange,
            ErafError::InvalidKeyLength(_) => ErrorKind::InvalidKeyLength,
            ErafError::MissingNonce => ErrorKind::MissingNonce,
            ErafError::InvalidNonceLength(_) => ErrorKind::InvalidNonceLength,
            ErafError::AuthenticationFailed(_) => ErrorKind::AuthenticationFailed,
            ErafError::SealFailed(_) => ErrorKind::SealFailed,
            ErafError::OffsetOverflow { .. } => ErrorKind::OffsetOverflow,
            ErafError::Io(_) => ErrorKind::Io,
            ErafError::Certificate(_) => ErrorKind::Certificate,
        }
    }
}

impl From<rustls::Error> for ErafError {
    fn from(e: rustls::Error) -> Self {
        ErafError::Certificate(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_match_variants() {
        assert_eq!(
            ErafError::BufferTooSmall { have: 3 }.kind(),
            ErrorKind::BufferTooSmall
        );
        assert_eq!(ErafError::InvalidKeyLength(7).kind(), ErrorKind::InvalidKeyLength);
        assert_eq!(ErafError::MissingNonce.kind(), ErrorKind::MissingNonce);
        assert_eq!(
            ErafError::AuthenticationFailed("email").kind(),
            ErrorKind::AuthenticationFailed
        );
        assert_eq!(
            ErafError::OffsetOverflow { offset: 65_578 }.kind(),
            ErrorKind::OffsetOverflow
        );
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        assert_eq!(ErafError::from(io).kind(), ErrorKind::Io);
    }

    #[test]
    fn display_includes_context() {
        let e = ErafError::SliceOutOfRange {
            field: "username",
            start: 3,
            end: 90,
            payload_len: 20,
        };
        let msg = e.to_string();
        assert!(msg.contains("username"));
        assert!(msg.contains("3..90"));
        assert!(msg.contains("20"));

        let e = ErafError::BufferTooSmall { have: 49 };
        assert!(e.to_string().contains("50"));
    }
}
