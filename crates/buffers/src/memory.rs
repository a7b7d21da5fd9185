//! Growable in-memory transport.

use crate::{Transport, TransportError};

/// An in-memory byte transport.
///
/// Writes append to an internal buffer; reads consume from a cursor over
/// the same buffer. Used as the slurp buffer of the RPC envelope codec and
/// as the transport in tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryBuffer {
    data: Vec<u8>,
    read_pos: usize,
}

impl MemoryBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            read_pos: 0,
        }
    }

    /// Creates a buffer pre-filled with `bytes`, ready to be read.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: bytes.to_vec(),
            read_pos: 0,
        }
    }

    /// Clears the buffer and rewinds the read cursor.
    pub fn reset(&mut self) {
        self.data.clear();
        self.read_pos = 0;
    }

    /// Everything written to the buffer, including already-read bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Number of bytes written in total.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of bytes not yet consumed by reads.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.read_pos
    }
}

impl Transport for MemoryBuffer {
    fn read_exactly(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        if self.remaining() < buf.len() {
            return Err(TransportError::Eof);
        }
        let end = self.read_pos + buf.len();
        buf.copy_from_slice(&self.data[self.read_pos..end]);
        self.read_pos = end;
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.data.extend_from_slice(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let mut buffer = MemoryBuffer::new();
        buffer.write(b"abcd").unwrap();
        let mut out = [0u8; 2];
        buffer.read_exactly(&mut out).unwrap();
        assert_eq!(&out, b"ab");
        buffer.read_exactly(&mut out).unwrap();
        assert_eq!(&out, b"cd");
    }

    #[test]
    fn test_short_read_is_eof() {
        let mut buffer = MemoryBuffer::from_bytes(b"a");
        let mut out = [0u8; 2];
        assert_eq!(buffer.read_exactly(&mut out), Err(TransportError::Eof));
    }

    #[test]
    fn test_interleaved_write_and_read() {
        let mut buffer = MemoryBuffer::new();
        buffer.write(b"ab").unwrap();
        let mut out = [0u8; 2];
        buffer.read_exactly(&mut out).unwrap();
        buffer.write(b"cd").unwrap();
        buffer.read_exactly(&mut out).unwrap();
        assert_eq!(&out, b"cd");
        assert_eq!(buffer.as_slice(), b"abcd");
    }

    #[test]
    fn test_reset() {
        let mut buffer = MemoryBuffer::from_bytes(b"abc");
        let mut out = [0u8; 1];
        buffer.read_exactly(&mut out).unwrap();
        buffer.reset();
        assert!(buffer.is_empty());
        assert_eq!(buffer.remaining(), 0);
    }
}
