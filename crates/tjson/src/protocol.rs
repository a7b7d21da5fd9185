//! The protocol surface driven by generated serialization code.

use crate::error::Result;
use crate::types::{FieldType, MessageHeader, MessageType};

/// Operations on the type-tagged value grammar.
///
/// This is the surface generated stubs drive between `*_message_begin` and
/// `*_message_end`. Calls must be strictly ordered and balanced; the codec
/// fails fast on misuse rather than producing malformed output.
pub trait ValueProtocol {
    fn write_struct_begin(&mut self) -> Result<()>;
    fn write_struct_end(&mut self) -> Result<()>;
    fn write_field_begin(&mut self, field_type: FieldType, field_id: i16) -> Result<()>;
    fn write_field_end(&mut self) -> Result<()>;
    /// Terminates a field sequence. Emits nothing on this wire format.
    fn write_field_stop(&mut self) -> Result<()>;
    fn write_map_begin(
        &mut self,
        key_type: FieldType,
        value_type: FieldType,
        size: u32,
    ) -> Result<()>;
    fn write_map_end(&mut self) -> Result<()>;
    fn write_list_begin(&mut self, elem_type: FieldType, size: u32) -> Result<()>;
    fn write_list_end(&mut self) -> Result<()>;
    fn write_set_begin(&mut self, elem_type: FieldType, size: u32) -> Result<()>;
    fn write_set_end(&mut self) -> Result<()>;
    fn write_bool(&mut self, value: bool) -> Result<()>;
    fn write_byte(&mut self, value: i8) -> Result<()>;
    fn write_i16(&mut self, value: i16) -> Result<()>;
    fn write_i32(&mut self, value: i32) -> Result<()>;
    fn write_i64(&mut self, value: i64) -> Result<()>;
    fn write_double(&mut self, value: f64) -> Result<()>;
    fn write_string(&mut self, value: &str) -> Result<()>;
    fn write_binary(&mut self, value: &[u8]) -> Result<()>;

    fn read_struct_begin(&mut self) -> Result<()>;
    fn read_struct_end(&mut self) -> Result<()>;
    /// Returns the next field's type and id, or `None` at the end of the
    /// enclosing struct.
    fn read_field_begin(&mut self) -> Result<Option<(FieldType, i16)>>;
    fn read_field_end(&mut self) -> Result<()>;
    fn read_map_begin(&mut self) -> Result<(FieldType, FieldType, u32)>;
    fn read_map_end(&mut self) -> Result<()>;
    fn read_list_begin(&mut self) -> Result<(FieldType, u32)>;
    fn read_list_end(&mut self) -> Result<()>;
    fn read_set_begin(&mut self) -> Result<(FieldType, u32)>;
    fn read_set_end(&mut self) -> Result<()>;
    fn read_bool(&mut self) -> Result<bool>;
    fn read_byte(&mut self) -> Result<i8>;
    fn read_i16(&mut self) -> Result<i16>;
    fn read_i32(&mut self) -> Result<i32>;
    fn read_i64(&mut self) -> Result<i64>;
    fn read_double(&mut self) -> Result<f64>;
    fn read_string(&mut self) -> Result<String>;
    fn read_binary(&mut self) -> Result<Vec<u8>>;
}

/// A complete wire protocol: value operations plus message framing.
pub trait Protocol: ValueProtocol {
    fn write_message_begin(
        &mut self,
        name: &str,
        message_type: MessageType,
        sequence_id: i32,
    ) -> Result<()>;
    fn write_message_end(&mut self) -> Result<()>;
    fn read_message_begin(&mut self) -> Result<MessageHeader>;
    fn read_message_end(&mut self) -> Result<()>;
}
