//! [`SecretKey`]: owned AES key material that is wiped on drop.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::cipher::KEY_LENS;
use crate::error::ErafError;

/// An AES-128, AES-192 or AES-256 key.
///
/// The length is checked on construction, so a `SecretKey` can always be
/// passed to [`crate::Container::seal_all`] without an
/// [`ErafError::InvalidKeyLength`]. The bytes are zeroized when the key is
/// dropped.
#[derive(Clone, PartialEq, Eq, ZeroizeOnDrop)]
pub struct SecretKey(Box<[u8]>);

impl SecretKey {
    /// Copy `bytes` into a new key.
    ///
    /// # Errors
    ///
    /// Returns [`ErafError::InvalidKeyLength`] unless `bytes` is 16, 24 or 32 bytes.
    pub fn new(bytes: &[u8]) -> Result<Self, ErafError> {
        if !KEY_LENS.contains(&bytes.len()) {
            return Err(ErafError::InvalidKeyLength(bytes.len()));
        }
        Ok(Self(bytes.into()))
    }

    /// Key length in bits: 128, 192 or 256.
    pub fn bits(&self) -> usize {
        self.0.len() * 8
    }
}

impl TryFrom<Vec<u8>> for SecretKey {
    type Error = ErafError;

    /// Takes ownership of `bytes`; the vector is wiped if it is rejected.
    fn try_from(mut bytes: Vec<u8>) -> Result<Self, Self::Error> {
        if !KEY_LENS.contains(&bytes.len()) {
            let len = bytes.len();
            bytes.zeroize();
            return Err(ErafError::InvalidKeyLength(len));
        }
        Ok(Self(bytes.into_boxed_slice()))
    }
}

impl AsRef<[u8]> for SecretKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretKey({} bits, [REDACTED])", self.bits())
    }
}
