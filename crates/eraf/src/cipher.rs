//! AES-GCM sealing and opening of container fields.
//!
//! **Algorithm:** AES-GCM with a 96-bit nonce and a 128-bit tag, no associated
//! data. The key length selects AES-128, AES-192 or AES-256.
//!
//! **Transactions:** [`seal_all`] and [`open_all`] compute every sealable field
//! into a staging array first and commit only when all of them succeed. On
//! any failure the container is left exactly as it was.
//!
//! `Nonce` and `Tag` are never encrypted. Empty fields stay empty without
//! touching the AEAD.

use aes_gcm::aead::{consts::U12, rand_core::RngCore, Aead, KeyInit, OsRng};
use aes_gcm::aes::Aes192;
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm, Nonce};
use tracing::debug;

use crate::container::Container;
use crate::error::ErafError;
use crate::field::{Field, MAX_FIELD_LEN, SEALABLE_COUNT};
use crate::header::VERSION_LEN;

/// Byte length of the AES-GCM nonce (96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte length of the authentication tag appended to every sealed field.
pub const TAG_LEN: usize = 16;

/// Accepted key lengths: AES-128, AES-192 and AES-256.
pub const KEY_LENS: [usize; 3] = [16, 24, 32];

type Aes192Gcm = AesGcm<Aes192, U12>;

/// AES-GCM instance selected by key length.
enum FieldCipher {
    Aes128(Aes128Gcm),
    Aes192(Aes192Gcm),
    Aes256(Aes256Gcm),
}

impl FieldCipher {
    fn new(key: &[u8]) -> Result<Self, ErafError> {
        let invalid = |_| ErafError::InvalidKeyLength(key.len());
        match key.len() {
            16 => Aes128Gcm::new_from_slice(key).map(Self::Aes128).map_err(invalid),
            24 => Aes192Gcm::new_from_slice(key).map(Self::Aes192).map_err(invalid),
            32 => Aes256Gcm::new_from_slice(key).map(Self::Aes256).map_err(invalid),
            n => Err(ErafError::InvalidKeyLength(n)),
        }
    }

    fn seal(&self, nonce: &Nonce<U12>, plaintext: &[u8]) -> aes_gcm::aead::Result<Vec<u8>> {
        match self {
            FieldCipher::Aes128(c) => c.encrypt(nonce, plaintext),
            FieldCipher::Aes192(c) => c.encrypt(nonce, plaintext),
            FieldCipher::Aes256(c) => c.encrypt(nonce, plaintext),
        }
    }

    fn open(&self, nonce: &Nonce<U12>, ciphertext: &[u8]) -> aes_gcm::aead::Result<Vec<u8>> {
        match self {
            FieldCipher::Aes128(c) => c.decrypt(nonce, ciphertext),
            FieldCipher::Aes192(c) => c.decrypt(nonce, ciphertext),
            FieldCipher::Aes256(c) => c.decrypt(nonce, ciphertext),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Seal,
    Open,
}

fn checked_nonce(nonce: &[u8]) -> Result<&Nonce<U12>, ErafError> {
    match nonce.len() {
        0 => Err(ErafError::MissingNonce),
        NONCE_LEN => Ok(Nonce::from_slice(nonce)),
        n => Err(ErafError::InvalidNonceLength(n)),
    }
}

/// Seal a single value. Empty input yields empty output.
///
/// # Errors
///
/// - [`ErafError::InvalidKeyLength`] if `key` is not 16, 24 or 32 bytes.
/// - [`ErafError::MissingNonce`] / [`ErafError::InvalidNonceLength`] if
///   `plaintext` is non-empty and `nonce` is not [`NONCE_LEN`] bytes.
pub fn seal_field(key: &[u8], nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, ErafError> {
    let cipher = FieldCipher::new(key)?;
    if plaintext.is_empty() {
        return Ok(Vec::new());
    }
    cipher
        .seal(checked_nonce(nonce)?, plaintext)
        .map_err(|_| ErafError::SealFailed("value"))
}

/// Open a single value sealed by [`seal_field`]. Empty input yields empty output.
///
/// # Errors
///
/// As [`seal_field`], plus [`ErafError::AuthenticationFailed`] if the tag
/// does not verify (wrong key, wrong nonce, tampered or plain input).
pub fn open_field(key: &[u8], nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, ErafError> {
    let cipher = FieldCipher::new(key)?;
    if ciphertext.is_empty() {
        return Ok(Vec::new());
    }
    cipher
        .open(checked_nonce(nonce)?, ciphertext)
        .map_err(|_| ErafError::AuthenticationFailed("value"))
}

/// Run `direction` over every sealable field without touching `container`.
fn stage(
    container: &Container,
    nonce: &[u8],
    key: &[u8],
    direction: Direction,
) -> Result<[Vec<u8>; SEALABLE_COUNT], ErafError> {
    let cipher = FieldCipher::new(key)?;
    if !nonce.is_empty() {
        checked_nonce(nonce)?;
    }
    let mut staged: [Vec<u8>; SEALABLE_COUNT] = Default::default();

    for (out, field) in staged.iter_mut().zip(Field::SEALABLE) {
        let input = container.field(field);
        if input.is_empty() {
            continue;
        }
        let nonce = checked_nonce(nonce)?;
        *out = match direction {
            Direction::Seal => {
                let sealed = cipher
                    .seal(nonce, input)
                    .map_err(|_| ErafError::SealFailed(field.name()))?;
                // a sealed value that no longer fits its u16 length slot would be truncated
                if sealed.len() > MAX_FIELD_LEN {
                    return Err(ErafError::SealFailed(field.name()));
                }
                sealed
            }
            Direction::Open => cipher
                .open(nonce, input)
                .map_err(|_| ErafError::AuthenticationFailed(field.name()))?,
        };
    }

    if direction == Direction::Seal {
        check_offsets(container, nonce, &staged)?;
    }
    Ok(staged)
}

/// Reject a seal whose committed layout would push a header offset past u16.
///
/// Every field but the last contributes to the offset of the field after it,
/// so the last field's offset is the largest one the header has to record.
fn check_offsets(
    container: &Container,
    nonce: &[u8],
    staged: &[Vec<u8>; SEALABLE_COUNT],
) -> Result<(), ErafError> {
    let nonce_len = if nonce.is_empty() {
        container.nonce().len()
    } else {
        nonce.len()
    };
    let sealed_len: usize = Field::SEALABLE
        .into_iter()
        .zip(staged)
        .filter(|(field, _)| !field.is_last())
        .map(|(_, value)| value.len())
        .sum();
    let last_offset = VERSION_LEN + nonce_len + container.field(Field::Tag).len() + sealed_len;
    if last_offset > u16::MAX as usize {
        return Err(ErafError::OffsetOverflow { offset: last_offset });
    }
    Ok(())
}

/// Seal every sealable field of `container` with `key` and `nonce`.
///
/// On success the sealed values replace the plaintext in one step, the
/// header is recomputed, and a non-empty `nonce` is stored in the container's
/// `nonce` field. On failure `container` is unchanged.
///
/// # Errors
///
/// - [`ErafError::InvalidKeyLength`] if `key` is not 16, 24 or 32 bytes.
/// - [`ErafError::MissingNonce`] if `nonce` is empty and any sealable field is not.
/// - [`ErafError::InvalidNonceLength`] if `nonce` is not [`NONCE_LEN`] bytes.
/// - [`ErafError::SealFailed`] if a sealed value would exceed the field size limit.
/// - [`ErafError::OffsetOverflow`] if the sealed fields would push a header
///   offset past 65535.
pub fn seal_all(container: &mut Container, nonce: &[u8], key: &[u8]) -> Result<(), ErafError> {
    let staged = stage(container, nonce, key, Direction::Seal)?;
    if !nonce.is_empty() {
        container.set_nonce(nonce.to_vec());
    }
    container.replace_sealable(staged);
    debug!(key_bits = key.len() * 8, "container fields sealed");
    Ok(())
}

/// Generate a fresh random nonce, store it in `container`, and seal with it.
///
/// The nonce is only stored if sealing succeeds. Returns the nonce used.
///
/// # Errors
///
/// As [`seal_all`].
pub fn seal_all_with_fresh_nonce(
    container: &mut Container,
    key: &[u8],
) -> Result<[u8; NONCE_LEN], ErafError> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    seal_all(container, &nonce, key)?;
    Ok(nonce)
}

/// Open every sealable field of `container` with `key` and `nonce`.
///
/// Same all-or-nothing semantics as [`seal_all`]. The `nonce` field itself
/// is left alone.
///
/// # Errors
///
/// - [`ErafError::InvalidKeyLength`], [`ErafError::MissingNonce`] and
///   [`ErafError::InvalidNonceLength`] as for [`seal_all`].
/// - [`ErafError::AuthenticationFailed`] naming the first field whose tag
///   does not verify. Opening fields that were never sealed fails this way.
pub fn open_all(container: &mut Container, nonce: &[u8], key: &[u8]) -> Result<(), ErafError> {
    let staged = stage(container, nonce, key, Direction::Open)?;
    container.replace_sealable(staged);
    debug!(key_bits = key.len() * 8, "container fields opened");
    Ok(())
}

impl Container {
    /// See [`seal_all`].
    pub fn seal_all(&mut self, nonce: &[u8], key: impl AsRef<[u8]>) -> Result<(), ErafError> {
        seal_all(self, nonce, key.as_ref())
    }

    /// See [`seal_all_with_fresh_nonce`].
    pub fn seal_all_with_fresh_nonce(
        &mut self,
        key: impl AsRef<[u8]>,
    ) -> Result<[u8; NONCE_LEN], ErafError> {
        seal_all_with_fresh_nonce(self, key.as_ref())
    }

    /// See [`open_all`].
    pub fn open_all(&mut self, nonce: &[u8], key: impl AsRef<[u8]>) -> Result<(), ErafError> {
        open_all(self, nonce, key.as_ref())
    }

    /// [`open_all`] using the nonce stored in this container.
    pub fn open_all_with_stored_nonce(&mut self, key: impl AsRef<[u8]>) -> Result<(), ErafError> {
        let nonce = self.nonce().to_vec();
        open_all(self, &nonce, key.as_ref())
    }
}
