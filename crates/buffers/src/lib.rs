//! Byte transport primitives for tjson.
//!
//! This crate provides the blocking byte-source/sink seam the codecs are
//! written against, plus the two concrete pieces they need:
//!
//! - [`Transport`] - blocking `read_exactly`/`write` over an unframed byte
//!   stream
//! - [`MemoryBuffer`] - growable in-memory transport with a read cursor
//! - [`Lookahead`] - one-slot peek wrapper over any transport
//!
//! # Example
//!
//! ```
//! use tjson_buffers::{Lookahead, MemoryBuffer, Transport};
//!
//! let mut buffer = MemoryBuffer::new();
//! buffer.write(b"abc").unwrap();
//!
//! let mut reader = Lookahead::new(buffer);
//! assert_eq!(reader.peek().unwrap(), b'a');
//! assert_eq!(reader.read_byte().unwrap(), b'a');
//! assert_eq!(reader.read_byte().unwrap(), b'b');
//! ```

mod lookahead;
mod memory;

pub use lookahead::Lookahead;
pub use memory::MemoryBuffer;

use thiserror::Error;

/// Error type for transport operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The transport produced fewer bytes than requested.
    #[error("unexpected end of input")]
    Eof,
    /// Any other I/O failure.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => TransportError::Eof,
            _ => TransportError::Io(err.to_string()),
        }
    }
}

/// A blocking, unframed byte transport.
///
/// The codecs require nothing else from the outside world: `read_exactly`
/// blocks until the buffer is filled and `write` blocks until every byte is
/// accepted. Short reads and writes surface as [`TransportError`].
pub trait Transport {
    /// Fills `buf` completely from the transport.
    fn read_exactly(&mut self, buf: &mut [u8]) -> Result<(), TransportError>;

    /// Writes all of `bytes` to the transport.
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
}
