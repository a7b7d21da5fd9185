//! One-byte lookahead over a transport.

use crate::{Transport, TransportError};

/// A one-slot peek wrapper over a blocking transport.
///
/// `peek` pulls a byte from the transport and parks it; repeated peeks are
/// idempotent and the next `read_byte` returns the parked byte without
/// touching the transport again. Writes pass straight through, so a codec
/// can own a single `Lookahead` for both directions.
#[derive(Debug)]
pub struct Lookahead<T> {
    trans: T,
    peeked: Option<u8>,
}

impl<T: Transport> Lookahead<T> {
    /// Wraps a transport.
    pub fn new(trans: T) -> Self {
        Self {
            trans,
            peeked: None,
        }
    }

    /// Consumes and returns one byte.
    #[inline]
    pub fn read_byte(&mut self) -> Result<u8, TransportError> {
        if let Some(byte) = self.peeked.take() {
            return Ok(byte);
        }
        let mut buf = [0u8; 1];
        self.trans.read_exactly(&mut buf)?;
        Ok(buf[0])
    }

    /// Returns the next byte without consuming it.
    #[inline]
    pub fn peek(&mut self) -> Result<u8, TransportError> {
        if let Some(byte) = self.peeked {
            return Ok(byte);
        }
        let mut buf = [0u8; 1];
        self.trans.read_exactly(&mut buf)?;
        self.peeked = Some(buf[0]);
        Ok(buf[0])
    }

    /// Drops a parked peeked byte, if any.
    pub fn clear(&mut self) {
        self.peeked = None;
    }

    /// Shared access to the wrapped transport.
    pub fn get_ref(&self) -> &T {
        &self.trans
    }

    /// Mutable access to the wrapped transport.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.trans
    }

    /// Unwraps the transport, discarding any parked byte.
    pub fn into_inner(self) -> T {
        self.trans
    }
}

impl<T: Transport> Transport for Lookahead<T> {
    fn read_exactly(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        if buf.is_empty() {
            return Ok(());
        }
        if let Some(byte) = self.peeked.take() {
            buf[0] = byte;
            return self.trans.read_exactly(&mut buf[1..]);
        }
        self.trans.read_exactly(buf)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.trans.write(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryBuffer;

    #[test]
    fn test_peek_is_idempotent() {
        let mut reader = Lookahead::new(MemoryBuffer::from_bytes(b"xy"));
        assert_eq!(reader.peek().unwrap(), b'x');
        assert_eq!(reader.peek().unwrap(), b'x');
        assert_eq!(reader.read_byte().unwrap(), b'x');
        assert_eq!(reader.read_byte().unwrap(), b'y');
    }

    #[test]
    fn test_read_exactly_drains_peeked_byte() {
        let mut reader = Lookahead::new(MemoryBuffer::from_bytes(b"abc"));
        reader.peek().unwrap();
        let mut out = [0u8; 3];
        reader.read_exactly(&mut out).unwrap();
        assert_eq!(&out, b"abc");
    }

    #[test]
    fn test_eof_propagates() {
        let mut reader = Lookahead::new(MemoryBuffer::new());
        assert_eq!(reader.peek(), Err(TransportError::Eof));
        assert_eq!(reader.read_byte(), Err(TransportError::Eof));
    }

    #[test]
    fn test_clear_drops_parked_byte() {
        let mut reader = Lookahead::new(MemoryBuffer::from_bytes(b"ab"));
        reader.peek().unwrap();
        reader.clear();
        assert_eq!(reader.read_byte().unwrap(), b'b');
    }
}
