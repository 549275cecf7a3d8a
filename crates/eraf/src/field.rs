//! Field descriptors.
//!
//! A single ordered table drives the header layout, the payload order and
//! the set of fields the cipher touches. Nothing else in the crate hardcodes
//! a field position.

use std::fmt;
use std::str::FromStr;

/// Maximum length of any single field. Longer inputs are truncated on assignment.
pub const MAX_FIELD_LEN: usize = u16::MAX as usize;

/// The twelve variable-length fields of a container, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Nonce,
    Tag,
    SerialNumber,
    Identifier,
    Certificate,
    PrivateKey,
    Email,
    Username,
    Password,
    Token,
    Signature,
    RootCertificate,
}

/// Number of variable-length fields in the reference layout.
pub const FIELD_COUNT: usize = 12;

/// Number of fields the cipher seals.
pub const SEALABLE_COUNT: usize = 10;

impl Field {
    /// Every field in wire order.
    pub const ALL: [Field; FIELD_COUNT] = [
        Field::Nonce,
        Field::Tag,
        Field::SerialNumber,
        Field::Identifier,
        Field::Certificate,
        Field::PrivateKey,
        Field::Email,
        Field::Username,
        Field::Password,
        Field::Token,
        Field::Signature,
        Field::RootCertificate,
    ];

    /// Fields sealed and opened by the cipher. `Nonce` and `Tag` stay in the clear.
    pub const SEALABLE: [Field; SEALABLE_COUNT] = [
        Field::SerialNumber,
        Field::Identifier,
        Field::Certificate,
        Field::PrivateKey,
        Field::Email,
        Field::Username,
        Field::Password,
        Field::Token,
        Field::Signature,
        Field::RootCertificate,
    ];

    /// Position of this field in [`Field::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Byte offset of this field's `(offset, length)` slot inside the header.
    ///
    /// The first two header bytes address the version; each field then
    /// occupies four bytes.
    pub const fn slot(self) -> usize {
        2 + 4 * self.index()
    }

    /// Whether the cipher seals this field.
    pub const fn is_sealable(self) -> bool {
        !matches!(self, Field::Nonce | Field::Tag)
    }

    /// The last field in wire order. Its extent runs to the end of the payload.
    pub const fn is_last(self) -> bool {
        self.index() == FIELD_COUNT - 1
    }

    /// Stable snake_case name, used in errors, logs and the CLI.
    pub const fn name(self) -> &'static str {
        match self {
            Field::Nonce => "nonce",
            Field::Tag => "tag",
            Field::SerialNumber => "serial_number",
            Field::Identifier => "identifier",
            Field::Certificate => "certificate",
            Field::PrivateKey => "private_key",
            Field::Email => "email",
            Field::Username => "username",
            Field::Password => "password",
            Field::Token => "token",
            Field::Signature => "signature",
            Field::RootCertificate => "root_certificate",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a name does not match any [`Field`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownField(pub String);

impl fmt::Display for UnknownField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown field: {}", self.0)
    }
}

impl std::error::Error for UnknownField {}

impl FromStr for Field {
    type Err = UnknownField;

    /// Accepts the snake_case name, with `-` allowed in place of `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Field::ALL
            .into_iter()
            .find(|f| f.name() == normalized)
            .ok_or_else(|| UnknownField(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_follow_wire_layout() {
        assert_eq!(Field::Nonce.slot(), 2);
        assert_eq!(Field::Tag.slot(), 6);
        assert_eq!(Field::Username.slot(), 30);
        assert_eq!(Field::Signature.slot(), 42);
        assert_eq!(Field::RootCertificate.slot(), 46);
    }

    #[test]
    fn all_is_in_index_order() {
        for (i, f) in Field::ALL.iter().enumerate() {
            assert_eq!(f.index(), i);
        }
        assert!(Field::RootCertificate.is_last());
        assert!(!Field::Signature.is_last());
    }

    #[test]
    fn sealable_excludes_nonce_and_tag() {
        assert_eq!(Field::SEALABLE.len(), 10);
        assert!(!Field::SEALABLE.contains(&Field::Nonce));
        assert!(!Field::SEALABLE.contains(&Field::Tag));
        for f in Field::SEALABLE {
            assert!(f.is_sealable());
        }
        assert!(!Field::Nonce.is_sealable());
    }

    #[test]
    fn parse_by_name() {
        assert_eq!("username".parse::<Field>().unwrap(), Field::Username);
        assert_eq!("root-certificate".parse::<Field>().unwrap(), Field::RootCertificate);
        assert_eq!("Private_Key".parse::<Field>().unwrap(), Field::PrivateKey);
        assert!("header".parse::<Field>().is_err());
    }

    #[test]
    fn name_round_trips_through_from_str() {
        for f in Field::ALL {
            assert_eq!(f.name().parse::<Field>().unwrap(), f);
        }
    }
}
