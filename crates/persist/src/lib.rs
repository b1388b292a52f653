//! Persistence: serialized records for the world graph and node content.
//!
//! Two file kinds exist. State files are JSON — small, human-inspectable,
//! and field-wise tolerant: every record field carries a serde default so a
//! partially corrupt file degrades instead of destroying the session. Node
//! content files are CBOR compressed with zstd behind a sha256 digest
//! header — bulk entity data where corruption must be detected, not
//! tolerated.
//!
//! # Invariants
//! - Records never hold live references; node and entity links are stored
//!   as indices/names and reconnected after a bulk load
//!   ([`DeserialMemory`]).
//! - A digest mismatch on content is an error; a missing optional field in
//!   a state file is not.

mod codec;
mod records;
mod worldio;

pub use codec::{read_node_content, read_state, write_node_content, write_state};
pub use records::{
    EntityRecord, LayerRecord, NodeContentRecord, NodeRecord, StateRecord, WorldGraphRecord,
    WorldRecord,
};
pub use worldio::{DeserialMemory, stack_from_record, stack_to_record, world_from_record, world_to_record};

/// Errors from persistence operations.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CBOR encode error: {0}")]
    CborEncode(String),
    #[error("CBOR decode error: {0}")]
    CborDecode(String),
    #[error("content file is not in skein format")]
    BadHeader,
    #[error("content digest mismatch: expected {expected}, got {actual}")]
    Corrupt { expected: String, actual: String },
}
