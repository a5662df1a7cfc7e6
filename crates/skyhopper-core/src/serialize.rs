//! Binary encoding of node attributes.
//!
//! Hosts store a node's attributes on the node's own block. The record is a
//! `bitcode` payload carrying a magic number and format version so stale or
//! foreign data is rejected instead of misread.

use crate::node::NodeAttributes;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a node attribute record.
pub const ATTRIBUTE_MAGIC: u32 = 0x5348_0001;

/// Current record version. Increment when breaking the layout.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", ATTRIBUTE_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported record version {0} (this build reads version {FORMAT_VERSION})")]
    UnsupportedVersion(u32),
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordHeader {
    pub magic: u32,
    pub version: u32,
}

impl RecordHeader {
    pub fn current() -> Self {
        Self {
            magic: ATTRIBUTE_MAGIC,
            version: FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), CodecError> {
        if self.magic != ATTRIBUTE_MAGIC {
            return Err(CodecError::InvalidMagic(self.magic));
        }
        if self.version != FORMAT_VERSION {
            return Err(CodecError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AttributeRecord {
    header: RecordHeader,
    attrs: NodeAttributes,
}

pub fn encode_attributes(attrs: &NodeAttributes) -> Result<Vec<u8>, CodecError> {
    let record = AttributeRecord {
        header: RecordHeader::current(),
        attrs: attrs.clone(),
    };
    bitcode::serialize(&record).map_err(|e| CodecError::Encode(e.to_string()))
}

pub fn decode_attributes(data: &[u8]) -> Result<NodeAttributes, CodecError> {
    let record: AttributeRecord =
        bitcode::deserialize(data).map_err(|e| CodecError::Decode(e.to_string()))?;
    record.header.validate()?;
    Ok(record.attrs)
}
