//! Thrift-compatible JSON wire protocols.
//!
//! Two textual encodings of the same type-tagged value grammar:
//!
//! - [`JsonProtocol`] - the array-framed compact encoding
//!   `[1,name,messageType,sequenceId,payload]`
//! - [`JsonRpcProtocol`] - a JSON-RPC 2.0 object-framed envelope carrying
//!   the same payload inside `params`/`result`/`error.data`
//!
//! Both speak the value grammar of [`ValueProtocol`]: structs are objects
//! keyed by quoted decimal field ids, each value wrapped in a one-pair
//! object keyed by its type tag (`tf`, `i8`, `i16`, `i32`, `i64`, `dbl`,
//! `str`, `rec`, `map`, `lst`, `set`); lists and sets are arrays headed by
//! the element tag and count; maps are arrays headed by key/value tags and
//! count followed by an entries object. Produced bytes are deterministic.
//!
//! # Example
//!
//! ```
//! use tjson::{JsonRpcProtocol, MessageType, Protocol, ValueProtocol};
//! use tjson_buffers::MemoryBuffer;
//!
//! let mut proto = JsonRpcProtocol::new(MemoryBuffer::new());
//! proto.write_message_begin("ping", MessageType::Call, 7).unwrap();
//! proto.write_struct_begin().unwrap();
//! proto.write_field_stop().unwrap();
//! proto.write_struct_end().unwrap();
//! proto.write_message_end().unwrap();
//!
//! let out = String::from_utf8(proto.transport().as_slice().to_vec()).unwrap();
//! assert_eq!(out, r#"{"jsonrpc":"2.0","method":"ping","params":{},"id":7}"#);
//! ```

mod constants;
mod context;
mod error;
mod json;
mod jsonrpc;
mod protocol;
mod types;

pub use error::{ProtocolError, Result};
pub use json::JsonProtocol;
pub use jsonrpc::{JsonRpcProtocol, MessageFlags};
pub use protocol::{Protocol, ValueProtocol};
pub use types::{type_for_tag, type_tag, FieldType, MessageHeader, MessageType};
