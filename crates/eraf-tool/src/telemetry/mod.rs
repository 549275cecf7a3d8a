//! Tracing subscriber setup for `eraf-tool`.
//!
//! # Telemetry invariants
//!
//! - Output is JSON on stderr; stdout carries command output only.
//! - **No field contents or key material** appear in any log field.
//! - Log level comes from `RUST_LOG` if set, else `ERAF_LOG_LEVEL` (default: `warn`).

pub mod init;

pub use init::init_telemetry;
