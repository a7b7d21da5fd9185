//! Object-framed JSON-RPC 2.0 message envelope.
//!
//! [`JsonRpcProtocol`] writes envelopes with a fixed key order and reads
//! them in whatever order the peer produced. Because JSON object members
//! are unordered, the reader parses the complete envelope before it can
//! answer the message header; payload members (`params`, `result`,
//! `error.data`) are slurped verbatim into a memory buffer, and the codec
//! then rebinds itself to that buffer so generated-stub reads observe the
//! ordered value stream they expect.

use tjson_buffers::{MemoryBuffer, Transport};

use crate::constants::{OBJECT_END, OBJECT_START};
use crate::error::{ProtocolError, Result};
use crate::json::JsonProtocol;
use crate::protocol::{Protocol, ValueProtocol};
use crate::types::{FieldType, MessageHeader, MessageType};

const KEY_JSONRPC: &str = "jsonrpc";
const KEY_METHOD: &str = "method";
const KEY_PARAMS: &str = "params";
const KEY_ID: &str = "id";
const KEY_RESULT: &str = "result";
const KEY_ERROR: &str = "error";
const KEY_CODE: &str = "code";
const KEY_MESSAGE: &str = "message";
const KEY_DATA: &str = "data";

/// Version string carried by every envelope.
const JSONRPC_VERSION: &str = "2.0";

/// Error code reported for exceptions.
const EXCEPTION_CODE: i32 = -32000;
/// Error message reported for exceptions.
const EXCEPTION_MESSAGE: &str = "Thrift exception";

/// Set of envelope members observed while reading (or owed while writing)
/// a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageFlags(u32);

impl MessageFlags {
    pub const UNSET: Self = Self(0);
    pub const VERSION: Self = Self(1 << 0);
    pub const METHOD: Self = Self(1 << 1);
    pub const ID: Self = Self(1 << 2);
    pub const PARAMS: Self = Self(1 << 3);
    pub const RESULT: Self = Self(1 << 4);
    pub const ERR_CODE: Self = Self(1 << 5);
    pub const ERR_MSG: Self = Self(1 << 6);
    pub const ERR_DATA: Self = Self(1 << 7);

    pub const REQUEST: Self = Self(Self::VERSION.0 | Self::ID.0 | Self::METHOD.0);
    pub const FULL_REQUEST: Self = Self(Self::REQUEST.0 | Self::PARAMS.0);
    pub const NOTIFICATION: Self = Self(Self::VERSION.0 | Self::METHOD.0);
    pub const FULL_NOTIFICATION: Self = Self(Self::NOTIFICATION.0 | Self::PARAMS.0);
    pub const RESPONSE: Self = Self(Self::VERSION.0 | Self::ID.0 | Self::RESULT.0);
    pub const ERROR: Self = Self(Self::VERSION.0 | Self::ID.0 | Self::ERR_CODE.0 | Self::ERR_MSG.0);
    pub const FULL_ERROR: Self = Self(Self::ERROR.0 | Self::ERR_DATA.0);

    fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

/// Envelope fields captured while a message is in flight.
#[derive(Debug, Default)]
struct EnvelopeScratch {
    method: String,
    id: i32,
    error_code: i32,
    error_message: String,
}

/// Which byte source value operations are bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RwMode {
    /// The transport; envelope parsing and all writing happen here.
    Transport,
    /// The slurp buffer; payload reads happen here after the envelope
    /// resolves.
    Buffered,
}

/// JSON-RPC 2.0 protocol bound to one byte transport.
///
/// Write-side key order is fixed: `jsonrpc`, then `method`/`result`/`error`,
/// then `params`/`data`, then `id` (absent for notifications). The read
/// side accepts members in any order.
pub struct JsonRpcProtocol<T: Transport> {
    mode: RwMode,
    flags: MessageFlags,
    scratch: EnvelopeScratch,
    main: JsonProtocol<T>,
    payload: JsonProtocol<MemoryBuffer>,
}

impl<T: Transport> JsonRpcProtocol<T> {
    pub fn new(transport: T) -> Self {
        Self {
            mode: RwMode::Transport,
            flags: MessageFlags::UNSET,
            scratch: EnvelopeScratch::default(),
            main: JsonProtocol::new(transport),
            payload: JsonProtocol::new(MemoryBuffer::new()),
        }
    }

    /// Shared access to the transport.
    pub fn transport(&self) -> &T {
        self.main.transport()
    }

    /// Mutable access to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        self.main.transport_mut()
    }

    /// Consumes the protocol and returns the transport.
    pub fn into_inner(self) -> T {
        self.main.into_inner()
    }

    /// Flag state of the message in flight.
    pub fn flags(&self) -> MessageFlags {
        self.flags
    }

    fn active(&mut self) -> &mut (dyn ValueProtocol + '_) {
        match self.mode {
            RwMode::Transport => &mut self.main,
            RwMode::Buffered => &mut self.payload,
        }
    }

    /// Clears everything bound to the current message: flags, mode, the
    /// slurp buffer and the payload codec state on top of it.
    fn reset_message_state(&mut self) {
        self.flags = MessageFlags::UNSET;
        self.mode = RwMode::Transport;
        self.payload.reset();
        self.payload.transport_mut().reset();
    }

    /// Stands in an empty struct for a payload slot the peer left out.
    fn synthesize_empty_payload(&mut self) -> Result<()> {
        self.payload
            .transport_mut()
            .write(&[OBJECT_START, OBJECT_END])?;
        Ok(())
    }

    /// Reads one envelope member and folds it into the flag set.
    ///
    /// The same dispatch serves the top-level envelope and the nested
    /// `error` object, which recurses here for `code`, `message` and
    /// `data`.
    fn read_envelope_field(&mut self) -> Result<()> {
        let key = self.main.read_json_string(false)?;
        if key == KEY_JSONRPC.as_bytes() {
            let version = self.main.read_string()?;
            if version != JSONRPC_VERSION {
                return Err(ProtocolError::BadVersion(
                    "Message contained bad version.".to_owned(),
                ));
            }
            self.flags.insert(MessageFlags::VERSION);
        } else if key == KEY_METHOD.as_bytes() {
            self.scratch.method = self.main.read_string()?;
            self.flags.insert(MessageFlags::METHOD);
        } else if key == KEY_ID.as_bytes() {
            self.scratch.id = self.main.read_i32()?;
            self.flags.insert(MessageFlags::ID);
        } else if key == KEY_PARAMS.as_bytes() {
            self.main.read_json_object_raw(self.payload.transport_mut())?;
            self.flags.insert(MessageFlags::PARAMS);
        } else if key == KEY_RESULT.as_bytes() {
            self.main.read_json_object_raw(self.payload.transport_mut())?;
            self.flags.insert(MessageFlags::RESULT);
        } else if key == KEY_ERROR.as_bytes() {
            self.main.read_struct_begin()?;
            loop {
                self.read_envelope_field()?;
                if self.main.peek()? == OBJECT_END {
                    break;
                }
            }
            self.main.read_struct_end()?;
        } else if key == KEY_CODE.as_bytes() {
            self.scratch.error_code = self.main.read_i32()?;
            self.flags.insert(MessageFlags::ERR_CODE);
        } else if key == KEY_MESSAGE.as_bytes() {
            self.scratch.error_message = self.main.read_string()?;
            self.flags.insert(MessageFlags::ERR_MSG);
        } else if key == KEY_DATA.as_bytes() {
            self.main.read_json_object_raw(self.payload.transport_mut())?;
            self.flags.insert(MessageFlags::ERR_DATA);
        } else {
            return Err(ProtocolError::InvalidData(format!(
                "Unknown JSONRPC keyword: {}",
                String::from_utf8_lossy(&key)
            )));
        }
        Ok(())
    }
}

impl<T: Transport> Protocol for JsonRpcProtocol<T> {
    fn write_message_begin(
        &mut self,
        name: &str,
        message_type: MessageType,
        sequence_id: i32,
    ) -> Result<()> {
        self.reset_message_state();

        self.main.write_struct_begin()?;
        self.main.write_string(KEY_JSONRPC)?;
        self.main.write_string(JSONRPC_VERSION)?;

        // The target flag state follows from the message type alone; the
        // write path never accumulates.
        match message_type {
            MessageType::Call => {
                self.scratch.method = name.to_owned();
                self.scratch.id = sequence_id;
                self.flags = MessageFlags::REQUEST;
                self.main.write_string(KEY_METHOD)?;
                self.main.write_string(name)?;
                self.main.write_string(KEY_PARAMS)?;
            }
            MessageType::Oneway => {
                self.scratch.method = name.to_owned();
                self.flags = MessageFlags::NOTIFICATION;
                self.main.write_string(KEY_METHOD)?;
                self.main.write_string(name)?;
                self.main.write_string(KEY_PARAMS)?;
            }
            MessageType::Reply => {
                self.scratch.id = sequence_id;
                self.flags = MessageFlags::RESPONSE;
                self.main.write_string(KEY_RESULT)?;
            }
            MessageType::Exception => {
                self.scratch.id = sequence_id;
                self.scratch.error_code = EXCEPTION_CODE;
                self.scratch.error_message = EXCEPTION_MESSAGE.to_owned();
                self.flags = MessageFlags::ERROR;
                self.main.write_string(KEY_ERROR)?;
                self.main.write_struct_begin()?;
                self.main.write_string(KEY_CODE)?;
                self.main.write_i32(self.scratch.error_code)?;
                self.main.write_string(KEY_MESSAGE)?;
                self.main.write_string(EXCEPTION_MESSAGE)?;
                self.main.write_string(KEY_DATA)?;
            }
        }
        Ok(())
    }

    fn write_message_end(&mut self) -> Result<()> {
        match self.flags {
            MessageFlags::REQUEST | MessageFlags::FULL_REQUEST | MessageFlags::RESPONSE => {
                self.main.write_string(KEY_ID)?;
                self.main.write_i32(self.scratch.id)?;
            }
            MessageFlags::ERROR | MessageFlags::FULL_ERROR => {
                self.main.write_struct_end()?;
                self.main.write_string(KEY_ID)?;
                self.main.write_i32(self.scratch.id)?;
            }
            MessageFlags::NOTIFICATION => {}
            _ => {
                self.reset_message_state();
                return Err(ProtocolError::InvalidData(
                    "Invalid JSONRPC message".to_owned(),
                ));
            }
        }
        self.main.write_struct_end()?;
        self.reset_message_state();
        Ok(())
    }

    fn read_message_begin(&mut self) -> Result<MessageHeader> {
        self.reset_message_state();

        // The complete envelope must be observed before the header can be
        // answered.
        self.main.read_struct_begin()?;
        while self.main.peek()? != OBJECT_END {
            self.read_envelope_field()?;
        }
        self.main.read_struct_end()?;

        let header = match self.flags {
            MessageFlags::REQUEST | MessageFlags::FULL_REQUEST => {
                if self.flags == MessageFlags::REQUEST {
                    self.synthesize_empty_payload()?;
                }
                MessageHeader {
                    name: self.scratch.method.clone(),
                    message_type: MessageType::Call,
                    sequence_id: self.scratch.id,
                }
            }
            MessageFlags::NOTIFICATION | MessageFlags::FULL_NOTIFICATION => {
                if self.flags == MessageFlags::NOTIFICATION {
                    self.synthesize_empty_payload()?;
                }
                MessageHeader {
                    name: self.scratch.method.clone(),
                    message_type: MessageType::Oneway,
                    // Notifications carry no id.
                    sequence_id: 0,
                }
            }
            MessageFlags::RESPONSE => MessageHeader {
                // Responses carry no method; the caller matches by
                // sequence id alone.
                name: String::new(),
                message_type: MessageType::Reply,
                sequence_id: self.scratch.id,
            },
            MessageFlags::ERROR | MessageFlags::FULL_ERROR => {
                if self.flags == MessageFlags::ERROR {
                    self.synthesize_empty_payload()?;
                }
                MessageHeader {
                    name: String::new(),
                    message_type: MessageType::Exception,
                    sequence_id: self.scratch.id,
                }
            }
            _ => {
                self.reset_message_state();
                return Err(ProtocolError::InvalidData(
                    "Invalid JSONRPC message".to_owned(),
                ));
            }
        };

        // Rebind: generated-stub reads now consume the slurped payload.
        self.mode = RwMode::Buffered;
        Ok(header)
    }

    fn read_message_end(&mut self) -> Result<()> {
        self.reset_message_state();
        Ok(())
    }
}

impl<T: Transport> ValueProtocol for JsonRpcProtocol<T> {
    fn write_struct_begin(&mut self) -> Result<()> {
        self.active().write_struct_begin()
    }

    fn write_struct_end(&mut self) -> Result<()> {
        self.active().write_struct_end()
    }

    fn write_field_begin(&mut self, field_type: FieldType, field_id: i16) -> Result<()> {
        self.active().write_field_begin(field_type, field_id)
    }

    fn write_field_end(&mut self) -> Result<()> {
        self.active().write_field_end()
    }

    fn write_field_stop(&mut self) -> Result<()> {
        self.active().write_field_stop()
    }

    fn write_map_begin(
        &mut self,
        key_type: FieldType,
        value_type: FieldType,
        size: u32,
    ) -> Result<()> {
        self.active().write_map_begin(key_type, value_type, size)
    }

    fn write_map_end(&mut self) -> Result<()> {
        self.active().write_map_end()
    }

    fn write_list_begin(&mut self, elem_type: FieldType, size: u32) -> Result<()> {
        self.active().write_list_begin(elem_type, size)
    }

    fn write_list_end(&mut self) -> Result<()> {
        self.active().write_list_end()
    }

    fn write_set_begin(&mut self, elem_type: FieldType, size: u32) -> Result<()> {
        self.active().write_set_begin(elem_type, size)
    }

    fn write_set_end(&mut self) -> Result<()> {
        self.active().write_set_end()
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.active().write_bool(value)
    }

    fn write_byte(&mut self, value: i8) -> Result<()> {
        self.active().write_byte(value)
    }

    fn write_i16(&mut self, value: i16) -> Result<()> {
        self.active().write_i16(value)
    }

    fn write_i32(&mut self, value: i32) -> Result<()> {
        self.active().write_i32(value)
    }

    fn write_i64(&mut self, value: i64) -> Result<()> {
        self.active().write_i64(value)
    }

    fn write_double(&mut self, value: f64) -> Result<()> {
        self.active().write_double(value)
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        self.active().write_string(value)
    }

    fn write_binary(&mut self, value: &[u8]) -> Result<()> {
        self.active().write_binary(value)
    }

    fn read_struct_begin(&mut self) -> Result<()> {
        self.active().read_struct_begin()
    }

    fn read_struct_end(&mut self) -> Result<()> {
        self.active().read_struct_end()
    }

    fn read_field_begin(&mut self) -> Result<Option<(FieldType, i16)>> {
        self.active().read_field_begin()
    }

    fn read_field_end(&mut self) -> Result<()> {
        self.active().read_field_end()
    }

    fn read_map_begin(&mut self) -> Result<(FieldType, FieldType, u32)> {
        self.active().read_map_begin()
    }

    fn read_map_end(&mut self) -> Result<()> {
        self.active().read_map_end()
    }

    fn read_list_begin(&mut self) -> Result<(FieldType, u32)> {
        self.active().read_list_begin()
    }

    fn read_list_end(&mut self) -> Result<()> {
        self.active().read_list_end()
    }

    fn read_set_begin(&mut self) -> Result<(FieldType, u32)> {
        self.active().read_set_begin()
    }

    fn read_set_end(&mut self) -> Result<()> {
        self.active().read_set_end()
    }

    fn read_bool(&mut self) -> Result<bool> {
        self.active().read_bool()
    }

    fn read_byte(&mut self) -> Result<i8> {
        self.active().read_byte()
    }

    fn read_i16(&mut self) -> Result<i16> {
        self.active().read_i16()
    }

    fn read_i32(&mut self) -> Result<i32> {
        self.active().read_i32()
    }

    fn read_i64(&mut self) -> Result<i64> {
        self.active().read_i64()
    }

    fn read_double(&mut self) -> Result<f64> {
        self.active().read_double()
    }

    fn read_string(&mut self) -> Result<String> {
        self.active().read_string()
    }

    fn read_binary(&mut self) -> Result<Vec<u8>> {
        self.active().read_binary()
    }
}
