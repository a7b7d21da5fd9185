//! Protocol error type.

use thiserror::Error;
use tjson_buffers::TransportError;

pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Error type for protocol encoding and decoding operations.
///
/// Every error is fatal for the current message: the caller must discard
/// the codec's per-message state before attempting the next message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// I/O failure or short read/write on the byte transport.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// Unexpected byte, bad escape, malformed number, lone surrogate,
    /// unknown envelope key, missing required envelope field, or a
    /// mismatched delimiter.
    #[error("invalid data: {0}")]
    InvalidData(String),
    /// Version field did not match the protocol version.
    #[error("bad version: {0}")]
    BadVersion(String),
    /// A decoded count or identifier exceeds its fixed-width range.
    #[error("size limit exceeded: {0}")]
    SizeLimit(String),
    /// Unsupported message type or wire type tag.
    #[error("not implemented: {0}")]
    NotImplemented(String),
}
