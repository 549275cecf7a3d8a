//! Fixed-size offset/length table that prefixes every serialized container.
//!
//! # Layout
//!
//! ```text
//! byte 0        version position (u8, always 0)
//! byte 1        version length   (u8, always 3)
//! bytes 2..50   one (offset: u16 BE, length: u16 BE) pair per field, in wire order
//! ```
//!
//! Offsets are relative to the start of the payload, which begins with the
//! three version bytes. The last pair records a length but the field itself
//! extends to the end of the payload.

use bytes::{Buf, BufMut};
use tracing::warn;

use crate::error::ErafError;
use crate::field::{Field, FIELD_COUNT, MAX_FIELD_LEN};

/// Size of the header in bytes for the twelve-field layout.
pub const HEADER_LEN: usize = 2 + 4 * FIELD_COUNT;

/// Number of version bytes at the start of the payload.
pub const VERSION_LEN: usize = 3;

/// Position of the version bytes inside the payload.
pub const VERSION_POSITION: u8 = 0;

/// One `(offset, length)` entry of the header table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpan {
    pub offset: u16,
    pub length: u16,
}

impl FieldSpan {
    /// Exclusive end of the span, computed without u16 overflow.
    pub fn end(&self) -> usize {
        self.offset as usize + self.length as usize
    }
}

/// The raw header bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header([u8; HEADER_LEN]);

impl Header {
    /// Build the header for the given field contents.
    ///
    /// The running offset starts after the version bytes and advances by each
    /// field's length. Offsets are u16 and wrap once the cumulative payload
    /// passes 65535 bytes; such a container cannot be decoded faithfully.
    /// Lengths are clamped to [`MAX_FIELD_LEN`].
    pub(crate) fn compute(fields: &[Vec<u8>; FIELD_COUNT]) -> Self {
        let mut out = [0u8; HEADER_LEN];
        let mut buf = &mut out[..];
        buf.put_u8(VERSION_POSITION);
        buf.put_u8(VERSION_LEN as u8);

        let mut offset = VERSION_LEN as u16;
        let mut wrapped = false;
        for field in Field::ALL {
            let length = fields[field.index()].len().min(MAX_FIELD_LEN) as u16;
            buf.put_u16(offset);
            buf.put_u16(length);
            if field.is_last() {
                break;
            }
            offset = match offset.checked_add(length) {
                Some(next) => next,
                None => {
                    wrapped = true;
                    offset.wrapping_add(length)
                }
            };
        }

        if wrapped {
            warn!("cumulative payload exceeds u16 offsets; header offsets wrapped");
        }
        Header(out)
    }

    /// Copy the header out of the first [`HEADER_LEN`] bytes of `buf`.
    ///
    /// # Errors
    ///
    /// Returns [`ErafError::BufferTooSmall`] if `buf` is shorter than the header.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, ErafError> {
        let bytes = buf
            .get(..HEADER_LEN)
            .ok_or(ErafError::BufferTooSmall { have: buf.len() })?;
        let mut out = [0u8; HEADER_LEN];
        out.copy_from_slice(bytes);
        Ok(Header(out))
    }

    /// Version position byte. Addressed directly, not as a u16.
    pub fn version_position(&self) -> u8 {
        self.0[0]
    }

    /// Version length byte.
    pub fn version_len(&self) -> u8 {
        self.0[1]
    }

    /// Read the `(offset, length)` pair recorded for `field`.
    pub fn span(&self, field: Field) -> FieldSpan {
        let mut slot = &self.0[field.slot()..field.slot() + 4];
        FieldSpan {
            offset: slot.get_u16(),
            length: slot.get_u16(),
        }
    }

    pub fn as_bytes(&self) -> &[u8; HEADER_LEN] {
        &self.0
    }
}

impl Default for Header {
    /// The header of an empty container.
    fn default() -> Self {
        Header::compute(&Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields_with(field: Field, len: usize) -> [Vec<u8>; FIELD_COUNT] {
        let mut fields: [Vec<u8>; FIELD_COUNT] = Default::default();
        fields[field.index()] = vec![0xAB; len];
        fields
    }

    #[test]
    fn header_len_is_fifty() {
        assert_eq!(HEADER_LEN, 50);
    }

    #[test]
    fn empty_header_points_every_field_past_version() {
        let h = Header::default();
        assert_eq!(h.version_position(), 0);
        assert_eq!(h.version_len(), 3);
        for field in Field::ALL {
            assert_eq!(h.span(field), FieldSpan { offset: 3, length: 0 });
        }
        assert_eq!(&h.as_bytes()[..6], &hex::decode("000300030000").unwrap()[..]);
    }

    #[test]
    fn offsets_are_contiguous() {
        let mut fields: [Vec<u8>; FIELD_COUNT] = Default::default();
        for (i, f) in fields.iter_mut().enumerate() {
            *f = vec![i as u8; i + 1];
        }
        let h = Header::compute(&fields);
        let mut expected = VERSION_LEN;
        for field in Field::ALL {
            let span = h.span(field);
            assert_eq!(span.offset as usize, expected);
            assert_eq!(span.length as usize, field.index() + 1);
            expected += span.length as usize;
        }
    }

    #[test]
    fn username_slot_is_big_endian() {
        let h = Header::compute(&fields_with(Field::Username, 16));
        assert_eq!(&h.as_bytes()[30..34], &[0, 3, 0, 16]);
        assert_eq!(h.span(Field::Password).offset, 19);
    }

    #[test]
    fn last_field_records_length_only() {
        let h = Header::compute(&fields_with(Field::RootCertificate, 300));
        let span = h.span(Field::RootCertificate);
        assert_eq!(span.offset, 3);
        assert_eq!(span.length, 300);
        assert_eq!(span.end(), 303);
    }

    #[test]
    fn offsets_wrap_past_u16() {
        let mut fields: [Vec<u8>; FIELD_COUNT] = Default::default();
        fields[Field::Certificate.index()] = vec![0; 65_535];
        fields[Field::PrivateKey.index()] = vec![0; 10];
        let h = Header::compute(&fields);
        // 3 + 65535 wraps to 2
        assert_eq!(h.span(Field::PrivateKey).offset, 2);
    }

    #[test]
    fn overlong_length_is_clamped() {
        let h = Header::compute(&fields_with(Field::Token, 70_000));
        assert_eq!(h.span(Field::Token).length, u16::MAX);
        assert_eq!(h.span(Field::Signature).offset, 3u16.wrapping_add(u16::MAX));
    }

    #[test]
    fn from_bytes_rejects_short_input() {
        let err = Header::from_bytes(&[0u8; HEADER_LEN - 1]).unwrap_err();
        assert!(matches!(err, ErafError::BufferTooSmall { have: 49 }));
        assert!(Header::from_bytes(&[0u8; HEADER_LEN]).is_ok());
    }
}
