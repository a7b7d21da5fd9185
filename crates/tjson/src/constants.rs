//! JSON lexical constants shared by the codec modules.

pub(crate) const OBJECT_START: u8 = b'{';
pub(crate) const OBJECT_END: u8 = b'}';
pub(crate) const ARRAY_START: u8 = b'[';
pub(crate) const ARRAY_END: u8 = b']';
pub(crate) const PAIR_SEPARATOR: u8 = b':';
pub(crate) const ELEM_SEPARATOR: u8 = b',';
pub(crate) const BACKSLASH: u8 = b'\\';
pub(crate) const STRING_DELIMITER: u8 = b'"';
pub(crate) const ESCAPE_CHAR: u8 = b'u';

/// Prefix of a `\u00xx` escape sequence.
pub(crate) const ESCAPE_PREFIX: &[u8] = b"\\u00";

// Handling for the bytes below 0x30:
//   0       escape as `\u00xx`
//   1       output as-is
//   other   escape as `\` + that letter
// `/` is deliberately absent from the short escapes.
#[rustfmt::skip]
pub(crate) const CHAR_TABLE: [u8; 0x30] = [
    //  0  1  2     3  4  5  6  7  8     9     a     b  c     d     e  f
        0, 0, 0,    0, 0, 0, 0, 0, b'b', b't', b'n', 0, b'f', b'r', 0, 0, // 0x00
        0, 0, 0,    0, 0, 0, 0, 0, 0,    0,    0,    0, 0,    0,    0, 0, // 0x10
        1, 1, b'"', 1, 1, 1, 1, 1, 1,    1,    1,    1, 1,    1,    1, 1, // 0x20
];

/// Quoted spellings of the three non-finite doubles.
pub(crate) const TOKEN_NAN: &str = "NaN";
pub(crate) const TOKEN_INFINITY: &str = "Infinity";
pub(crate) const TOKEN_NEG_INFINITY: &str = "-Infinity";
