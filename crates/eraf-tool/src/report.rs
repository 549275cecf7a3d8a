//! JSON report printed by `eraf-tool inspect`.
//!
//! The report describes layout only: version, lengths and the header table.
//! Field contents are never included.

use eraf::{Container, Field};
use serde::{Deserialize, Serialize};

/// Layout summary of one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectReport {
    /// `"major.minor.patch"`.
    pub version: String,
    pub header_len: usize,
    pub payload_len: usize,
    pub total_len: usize,
    /// Whether a nonce is stored, i.e. the container has likely been sealed.
    pub has_nonce: bool,
    /// One entry per field, in wire order.
    pub fields: Vec<FieldReport>,
}

/// Header entry for a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldReport {
    pub name: String,
    pub offset: u16,
    pub length: u16,
    pub sealable: bool,
}

impl InspectReport {
    /// Build a report from a decoded container.
    pub fn from_container(container: &Container) -> Self {
        let header = container.header();
        let fields = Field::ALL
            .into_iter()
            .map(|field| {
                let span = header.span(field);
                FieldReport {
                    name: field.name().to_owned(),
                    offset: span.offset,
                    length: span.length,
                    sealable: field.is_sealable(),
                }
            })
            .collect();

        Self {
            version: container.semantic_version(),
            header_len: container.header_len(),
            payload_len: container.payload_len(),
            total_len: container.total_len(),
            has_nonce: !container.nonce().is_empty(),
            fields,
        }
    }
}
