//! Base64 encoding and decoding for the tjson wire format.
//!
//! The wire carries binary values as **unpadded** base64: every full
//! 3-byte block becomes 4 characters, and a trailing remainder of `len`
//! bytes becomes `len + 1` characters with no `=` padding. Readers must
//! accept both padded and unpadded input, so [`from_base64`] strips up to
//! two trailing `=` before decoding.
//!
//! # Example
//!
//! ```
//! use tjson_base64::{from_base64, to_base64};
//!
//! assert_eq!(to_base64(b"hello world"), "aGVsbG8gd29ybGQ");
//! assert_eq!(from_base64(b"aGVsbG8gd29ybGQ=").unwrap(), b"hello world");
//! assert_eq!(from_base64(b"aGVsbG8gd29ybGQ").unwrap(), b"hello world");
//! ```

mod constants;
mod from_base64;
mod to_base64;

pub use constants::ALPHABET;
pub use from_base64::{from_base64, from_base64_lenient};
pub use to_base64::to_base64;

use thiserror::Error;

/// Error type for base64 decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Base64Error {
    #[error("invalid base64 character 0x{0:02x}")]
    InvalidCharacter(u8),
    #[error("invalid base64 length")]
    InvalidLength,
}
