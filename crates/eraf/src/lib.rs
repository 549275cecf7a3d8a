//! # eraf
//!
//! Encoding and sealing of ERAF records: a fixed 50-byte offset/length header
//! followed by a three-byte version and twelve variable-length byte fields.
//!
//! ```text
//! ┌────────────────────┬─────────┬───────┬─────┬─────┬──────────────────┐
//! │ header (50 bytes)  │ version │ nonce │ tag │ ... │ root_certificate │
//! └────────────────────┴─────────┴───────┴─────┴─────┴──────────────────┘
//! ```
//!
//! - [`container`]: the in-memory record and its byte-exact codec.
//! - [`cipher`]: all-or-nothing AES-GCM sealing of the ten sensitive fields.
//! - [`pem`]: rustls configuration built from the certificate fields.
//!
//! The library reads no environment and installs no tracing subscriber.

pub mod cipher;
pub mod container;
pub mod error;
pub mod field;
pub mod header;
pub mod io;
pub mod key;
pub mod pem;

pub use cipher::{open_all, seal_all, seal_all_with_fresh_nonce, NONCE_LEN, TAG_LEN};
pub use container::Container;
pub use error::{ErafError, ErrorKind};
pub use field::{Field, UnknownField, MAX_FIELD_LEN};
pub use header::{FieldSpan, Header, HEADER_LEN};
pub use key::SecretKey;
