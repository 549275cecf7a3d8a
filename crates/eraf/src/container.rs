//! The in-memory ERAF record and its byte-exact codec.
//!
//! # Wire format
//!
//! ```text
//! header (50 bytes, see [`crate::header`])
//! version (3) ++ nonce ++ tag ++ serial_number ++ identifier ++ certificate ++
//! private_key ++ email ++ username ++ password ++ token ++ signature ++ root_certificate
//! ```
//!
//! No padding and no delimiters; the header is the only index.

use aes_gcm::aead::{rand_core::RngCore, OsRng};
use tracing::{debug, warn};

use crate::cipher::NONCE_LEN;
use crate::error::ErafError;
use crate::field::{Field, FIELD_COUNT, MAX_FIELD_LEN, SEALABLE_COUNT};
use crate::header::{Header, HEADER_LEN, VERSION_LEN};

/// One ERAF record: a version triple plus twelve byte fields.
///
/// Every setter truncates its input to [`MAX_FIELD_LEN`] bytes and refreshes
/// the stored header, so [`Container::header`] always matches the fields.
#[derive(Clone, PartialEq, Eq)]
pub struct Container {
    header: Header,
    version: [u8; VERSION_LEN],
    fields: [Vec<u8>; FIELD_COUNT],
}

impl Container {
    /// Create an empty container: version `0.0.0`, every field zero-length.
    pub fn new() -> Self {
        Self {
            header: Header::default(),
            version: [0; VERSION_LEN],
            fields: Default::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Version
    // -----------------------------------------------------------------------

    pub fn version_major(&self) -> u8 {
        self.version[0]
    }

    pub fn version_minor(&self) -> u8 {
        self.version[1]
    }

    pub fn version_patch(&self) -> u8 {
        self.version[2]
    }

    pub fn set_version_major(&mut self, v: u8) -> &mut Self {
        self.version[0] = v;
        self
    }

    pub fn set_version_minor(&mut self, v: u8) -> &mut Self {
        self.version[1] = v;
        self
    }

    pub fn set_version_patch(&mut self, v: u8) -> &mut Self {
        self.version[2] = v;
        self
    }

    /// Set all three version components at once.
    pub fn set_version(&mut self, major: u8, minor: u8, patch: u8) -> &mut Self {
        self.version = [major, minor, patch];
        self
    }

    /// The version as `"major.minor.patch"`.
    pub fn semantic_version(&self) -> String {
        format!(
            "{}.{}.{}",
            self.version[0], self.version[1], self.version[2]
        )
    }

    // -----------------------------------------------------------------------
    // Fields
    // -----------------------------------------------------------------------

    /// Current contents of `field`. Empty when unset.
    pub fn field(&self, field: Field) -> &[u8] {
        &self.fields[field.index()]
    }

    /// Replace `field`, silently truncating to [`MAX_FIELD_LEN`] bytes.
    pub fn set_field(&mut self, field: Field, value: impl Into<Vec<u8>>) -> &mut Self {
        let mut value = value.into();
        value.truncate(MAX_FIELD_LEN);
        self.fields[field.index()] = value;
        self.recompute_header();
        self
    }

    /// Chaining form of [`Container::set_field`] for building containers by value.
    pub fn with_field(mut self, field: Field, value: impl Into<Vec<u8>>) -> Self {
        self.set_field(field, value);
        self
    }

    pub fn nonce(&self) -> &[u8] {
        self.field(Field::Nonce)
    }

    pub fn set_nonce(&mut self, nonce: impl Into<Vec<u8>>) -> &mut Self {
        self.set_field(Field::Nonce, nonce)
    }

    /// Store a fresh random nonce from the OS CSPRNG and return a copy of it.
    pub fn set_random_nonce(&mut self) -> [u8; NONCE_LEN] {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        self.set_nonce(nonce.to_vec());
        nonce
    }

    /// Replace every sealable field in one step. Used by the cipher commit.
    pub(crate) fn replace_sealable(&mut self, values: [Vec<u8>; SEALABLE_COUNT]) {
        for (field, mut value) in Field::SEALABLE.into_iter().zip(values) {
            value.truncate(MAX_FIELD_LEN);
            self.fields[field.index()] = value;
        }
        self.recompute_header();
    }

    // -----------------------------------------------------------------------
    // Header and lengths
    // -----------------------------------------------------------------------

    /// Rebuild the stored header from the current field lengths.
    pub fn recompute_header(&mut self) {
        self.header = Header::compute(&self.fields);
    }

    /// The header as of the last mutation.
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn header_len(&self) -> usize {
        HEADER_LEN
    }

    /// Version bytes plus every field.
    pub fn payload_len(&self) -> usize {
        VERSION_LEN + self.fields.iter().map(Vec::len).sum::<usize>()
    }

    pub fn total_len(&self) -> usize {
        self.header_len() + self.payload_len()
    }

    /// The payload alone: version bytes followed by every field in wire order.
    pub fn payload(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.payload_len());
        out.extend_from_slice(&self.version);
        for value in &self.fields {
            out.extend_from_slice(value);
        }
        out
    }

    // -----------------------------------------------------------------------
    // Codec
    // -----------------------------------------------------------------------

    /// Serialize to `header ++ payload`.
    ///
    /// The header is computed from the current fields, so two calls without
    /// an intervening mutation return identical bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let header = Header::compute(&self.fields);
        let mut out = Vec::with_capacity(self.total_len());
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(&self.version);
        for value in &self.fields {
            out.extend_from_slice(value);
        }
        out
    }

    /// Decode a container from `bytes`.
    ///
    /// Each field is sliced from the payload using its header entry. The last
    /// field runs from its offset to the end of the payload, so trailing bytes
    /// are absorbed into it (up to [`MAX_FIELD_LEN`]). The stored header is
    /// then rebuilt from the decoded fields rather than copied from the input.
    ///
    /// # Errors
    ///
    /// - [`ErafError::BufferTooSmall`] if `bytes` is shorter than the header.
    /// - [`ErafError::SliceOutOfRange`] if any recorded span exceeds the payload,
    ///   or the version span is shorter than three bytes.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, ErafError> {
        let header = Header::from_bytes(bytes)?;
        let payload = &bytes[HEADER_LEN..];

        let version_start = header.version_position() as usize;
        let version_end = version_start + header.version_len() as usize;
        let version_bytes = payload
            .get(version_start..version_end)
            .filter(|v| v.len() >= VERSION_LEN)
            .ok_or(ErafError::SliceOutOfRange {
                field: "version",
                start: version_start,
                end: version_end,
                payload_len: payload.len(),
            })?;

        let mut container = Container::new();
        container
            .version
            .copy_from_slice(&version_bytes[..VERSION_LEN]);

        for field in Field::ALL {
            let span = header.span(field);
            let start = span.offset as usize;
            let end = span.end();
            if end > payload.len() {
                return Err(ErafError::SliceOutOfRange {
                    field: field.name(),
                    start,
                    end,
                    payload_len: payload.len(),
                });
            }

            let value = if field.is_last() {
                let rest = &payload[start..];
                if rest.len() > span.length as usize {
                    warn!(
                        field = field.name(),
                        recorded = span.length,
                        absorbed = rest.len(),
                        "trailing bytes absorbed into last field"
                    );
                }
                rest
            } else {
                &payload[start..end]
            };

            let mut value = value.to_vec();
            value.truncate(MAX_FIELD_LEN);
            container.fields[field.index()] = value;
        }

        container.recompute_header();
        debug!(
            version = %container.semantic_version(),
            payload_len = container.payload_len(),
            "container decoded"
        );
        Ok(container)
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    /// Field lengths only; contents may be secret.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("Container");
        s.field("version", &self.semantic_version());
        for field in Field::ALL {
            s.field(field.name(), &self.fields[field.index()].len());
        }
        s.finish()
    }
}
