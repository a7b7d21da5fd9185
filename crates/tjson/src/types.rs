//! Wire type identifiers and the message envelope header.

use crate::error::{ProtocolError, Result};

/// Type of an IDL value on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Stop,
    Bool,
    Byte,
    Double,
    I16,
    I32,
    I64,
    String,
    Struct,
    Map,
    Set,
    List,
}

/// Kind of an RPC message.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Call = 1,
    Reply = 2,
    Exception = 3,
    Oneway = 4,
}

impl TryFrom<u64> for MessageType {
    type Error = u64;
    fn try_from(v: u64) -> std::result::Result<Self, Self::Error> {
        match v {
            1 => Ok(Self::Call),
            2 => Ok(Self::Reply),
            3 => Ok(Self::Exception),
            4 => Ok(Self::Oneway),
            other => Err(other),
        }
    }
}

/// Header fields of a decoded message envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub name: String,
    pub message_type: MessageType,
    pub sequence_id: i32,
}

/// Short wire tag for a field type.
///
/// `Stop` has no wire spelling; asking for one is an error, matching the
/// write-side contract that `Stop` only terminates field sequences.
pub fn type_tag(field_type: FieldType) -> Result<&'static str> {
    match field_type {
        FieldType::Bool => Ok("tf"),
        FieldType::Byte => Ok("i8"),
        FieldType::I16 => Ok("i16"),
        FieldType::I32 => Ok("i32"),
        FieldType::I64 => Ok("i64"),
        FieldType::Double => Ok("dbl"),
        FieldType::String => Ok("str"),
        FieldType::Struct => Ok("rec"),
        FieldType::Map => Ok("map"),
        FieldType::Set => Ok("set"),
        FieldType::List => Ok("lst"),
        FieldType::Stop => Err(ProtocolError::NotImplemented(
            "Unrecognized type".to_owned(),
        )),
    }
}

/// Field type for a short wire tag.
pub fn type_for_tag(tag: &[u8]) -> Result<FieldType> {
    match tag {
        b"tf" => Ok(FieldType::Bool),
        b"i8" => Ok(FieldType::Byte),
        b"i16" => Ok(FieldType::I16),
        b"i32" => Ok(FieldType::I32),
        b"i64" => Ok(FieldType::I64),
        b"dbl" => Ok(FieldType::Double),
        b"str" => Ok(FieldType::String),
        b"rec" => Ok(FieldType::Struct),
        b"map" => Ok(FieldType::Map),
        b"set" => Ok(FieldType::Set),
        b"lst" => Ok(FieldType::List),
        _ => Err(ProtocolError::NotImplemented(format!(
            "Unrecognized type: {}",
            String::from_utf8_lossy(tag)
        ))),
    }
}
