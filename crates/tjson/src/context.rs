//! JSON lexical contexts and the context stack.
//!
//! A context knows which separator or delimiter the stream needs at the
//! current lexical position, and whether a number written there must be
//! quoted. The stack tracks nesting: pushing a context emits (or consumes)
//! the opening delimiter, popping emits (or consumes) the closing one.

use tjson_buffers::{Lookahead, Transport};

use crate::constants::{
    ARRAY_END, ARRAY_START, ELEM_SEPARATOR, OBJECT_END, OBJECT_START, PAIR_SEPARATOR,
};
use crate::error::{ProtocolError, Result};

/// Reads one byte and verifies it is the expected character.
pub(crate) fn expect_char<T: Transport>(reader: &mut Lookahead<T>, expected: u8) -> Result<()> {
    let got = reader.read_byte()?;
    if got != expected {
        return Err(ProtocolError::InvalidData(format!(
            "Expected '{}'; got '{}'.",
            expected as char, got as char
        )));
    }
    Ok(())
}

/// A lexical position in the JSON stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum JsonContext {
    /// Top level; no separators are ever produced.
    Root,
    /// Inside an object member sequence, alternating `:` and `,`.
    Pair { first: bool, colon: bool },
    /// Inside an array element sequence.
    List { first: bool },
}

impl JsonContext {
    pub(crate) fn pair() -> Self {
        JsonContext::Pair {
            first: true,
            colon: true,
        }
    }

    pub(crate) fn list() -> Self {
        JsonContext::List { first: true }
    }

    fn open_delimiter(&self) -> u8 {
        match self {
            JsonContext::Root | JsonContext::Pair { .. } => OBJECT_START,
            JsonContext::List { .. } => ARRAY_START,
        }
    }

    fn close_delimiter(&self) -> u8 {
        match self {
            JsonContext::Root | JsonContext::Pair { .. } => OBJECT_END,
            JsonContext::List { .. } => ARRAY_END,
        }
    }

    /// True if a number at the current position must be written as a string.
    ///
    /// Only the key slot of a pair context quotes numbers.
    fn escape_num(&self) -> bool {
        matches!(self, JsonContext::Pair { colon: true, .. })
    }

    /// Separator owed before the next element, if any.
    fn next_separator(&mut self) -> Option<u8> {
        match self {
            JsonContext::Root => None,
            JsonContext::Pair { first, colon } => {
                if *first {
                    *first = false;
                    *colon = true;
                    None
                } else {
                    let sep = if *colon { PAIR_SEPARATOR } else { ELEM_SEPARATOR };
                    *colon = !*colon;
                    Some(sep)
                }
            }
            JsonContext::List { first } => {
                if *first {
                    *first = false;
                    None
                } else {
                    Some(ELEM_SEPARATOR)
                }
            }
        }
    }
}

/// Stack of active JSON contexts.
///
/// The top context governs the current position; suspended contexts resume
/// when the nested value closes. The stack starts at [`JsonContext::Root`].
#[derive(Debug)]
pub(crate) struct ContextStack {
    top: JsonContext,
    suspended: Vec<JsonContext>,
}

impl ContextStack {
    pub(crate) fn new() -> Self {
        Self {
            top: JsonContext::Root,
            suspended: Vec::new(),
        }
    }

    /// Drops every context and returns to the root.
    pub(crate) fn reset(&mut self) {
        self.top = JsonContext::Root;
        self.suspended.clear();
    }

    /// True if no context is active beyond the root.
    pub(crate) fn is_root(&self) -> bool {
        self.suspended.is_empty() && self.top == JsonContext::Root
    }

    pub(crate) fn escape_num(&self) -> bool {
        self.top.escape_num()
    }

    /// Emits the separator owed before the next element, if any.
    pub(crate) fn write_next<T: Transport>(&mut self, trans: &mut T) -> Result<()> {
        if let Some(sep) = self.top.next_separator() {
            trans.write(&[sep])?;
        }
        Ok(())
    }

    /// Consumes and verifies the separator owed before the next element.
    pub(crate) fn read_next<T: Transport>(&mut self, reader: &mut Lookahead<T>) -> Result<()> {
        if let Some(sep) = self.top.next_separator() {
            expect_char(reader, sep)?;
        }
        Ok(())
    }

    /// Activates `ctx`, emitting the parent separator and opening delimiter.
    pub(crate) fn push_write<T: Transport>(
        &mut self,
        ctx: JsonContext,
        trans: &mut T,
    ) -> Result<()> {
        self.write_next(trans)?;
        trans.write(&[ctx.open_delimiter()])?;
        self.suspended.push(std::mem::replace(&mut self.top, ctx));
        Ok(())
    }

    /// Deactivates the top context, emitting its closing delimiter.
    pub(crate) fn pop_write<T: Transport>(&mut self, trans: &mut T) -> Result<()> {
        let parent = self.suspended.pop().ok_or_else(underflow)?;
        trans.write(&[self.top.close_delimiter()])?;
        self.top = parent;
        Ok(())
    }

    /// Activates `ctx`, consuming the parent separator and opening delimiter.
    pub(crate) fn push_read<T: Transport>(
        &mut self,
        ctx: JsonContext,
        reader: &mut Lookahead<T>,
    ) -> Result<()> {
        self.read_next(reader)?;
        expect_char(reader, ctx.open_delimiter())?;
        self.suspended.push(std::mem::replace(&mut self.top, ctx));
        Ok(())
    }

    /// Deactivates the top context, consuming its closing delimiter.
    pub(crate) fn pop_read<T: Transport>(&mut self, reader: &mut Lookahead<T>) -> Result<()> {
        let parent = self.suspended.pop().ok_or_else(underflow)?;
        expect_char(reader, self.top.close_delimiter())?;
        self.top = parent;
        Ok(())
    }
}

fn underflow() -> ProtocolError {
    ProtocolError::InvalidData("context stack underflow".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tjson_buffers::MemoryBuffer;

    fn written(buffer: &MemoryBuffer) -> &str {
        std::str::from_utf8(buffer.as_slice()).unwrap()
    }

    #[test]
    fn test_pair_context_alternates_separators() {
        let mut stack = ContextStack::new();
        let mut out = MemoryBuffer::new();
        stack.push_write(JsonContext::pair(), &mut out).unwrap();
        for _ in 0..4 {
            stack.write_next(&mut out).unwrap();
            out.write(b"x").unwrap();
        }
        stack.pop_write(&mut out).unwrap();
        assert_eq!(written(&out), "{x:x,x:x}");
        assert!(stack.is_root());
    }

    #[test]
    fn test_pair_context_quotes_numbers_in_key_slot() {
        let mut stack = ContextStack::new();
        let mut out = MemoryBuffer::new();
        stack.push_write(JsonContext::pair(), &mut out).unwrap();
        // Key slot.
        stack.write_next(&mut out).unwrap();
        assert!(stack.escape_num());
        // Value slot.
        stack.write_next(&mut out).unwrap();
        assert!(!stack.escape_num());
        // Key slot again.
        stack.write_next(&mut out).unwrap();
        assert!(stack.escape_num());
    }

    #[test]
    fn test_list_context_separates_elements() {
        let mut stack = ContextStack::new();
        let mut out = MemoryBuffer::new();
        stack.push_write(JsonContext::list(), &mut out).unwrap();
        for _ in 0..3 {
            stack.write_next(&mut out).unwrap();
            out.write(b"1").unwrap();
        }
        stack.pop_write(&mut out).unwrap();
        assert_eq!(written(&out), "[1,1,1]");
    }

    #[test]
    fn test_nested_push_emits_parent_separator() {
        let mut stack = ContextStack::new();
        let mut out = MemoryBuffer::new();
        stack.push_write(JsonContext::list(), &mut out).unwrap();
        stack.write_next(&mut out).unwrap();
        out.write(b"1").unwrap();
        stack.push_write(JsonContext::pair(), &mut out).unwrap();
        stack.pop_write(&mut out).unwrap();
        stack.pop_write(&mut out).unwrap();
        assert_eq!(written(&out), "[1,{}]");
    }

    #[test]
    fn test_read_side_mirrors_write_side() {
        let mut stack = ContextStack::new();
        let mut reader = Lookahead::new(MemoryBuffer::from_bytes(b"[{}]"));
        stack.push_read(JsonContext::list(), &mut reader).unwrap();
        stack.push_read(JsonContext::pair(), &mut reader).unwrap();
        stack.pop_read(&mut reader).unwrap();
        stack.pop_read(&mut reader).unwrap();
        assert!(stack.is_root());
    }

    #[test]
    fn test_read_rejects_wrong_delimiter() {
        let mut stack = ContextStack::new();
        let mut reader = Lookahead::new(MemoryBuffer::from_bytes(b"["));
        let err = stack
            .push_read(JsonContext::pair(), &mut reader)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidData(_)));
    }

    #[test]
    fn test_pop_on_root_underflows() {
        let mut stack = ContextStack::new();
        let mut out = MemoryBuffer::new();
        let err = stack.pop_write(&mut out).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidData(_)));
        // Nothing was written.
        assert!(out.is_empty());
    }
}
