//! Base64 decoding, strict and lenient.

use crate::constants::{DECODE_TABLE, PAD};
use crate::Base64Error;

/// Returns the input length with up to two trailing `=` stripped.
fn strip_padding(encoded: &[u8]) -> usize {
    let mut len = encoded.len();
    let limit = len.saturating_sub(2);
    while len > limit && encoded[len - 1] == PAD {
        len -= 1;
    }
    len
}

fn sextet(ch: u8) -> Result<u32, Base64Error> {
    match DECODE_TABLE[ch as usize] {
        -1 => Err(Base64Error::InvalidCharacter(ch)),
        v => Ok(v as u32),
    }
}

fn sextet_lenient(ch: u8) -> u32 {
    match DECODE_TABLE[ch as usize] {
        -1 => 0,
        v => v as u32,
    }
}

/// Decodes base64, accepting both padded and unpadded input.
///
/// Up to two trailing `=` are stripped, then 4-character blocks and a final
/// unpadded group of 2 or 3 characters are decoded. A character outside the
/// alphabet or a dangling single trailing character is an error.
///
/// # Example
///
/// ```
/// use tjson_base64::from_base64;
///
/// assert_eq!(from_base64(b"Zm9v").unwrap(), b"foo");
/// assert_eq!(from_base64(b"Zm9vYg==").unwrap(), b"foob");
/// assert_eq!(from_base64(b"Zm9vYg").unwrap(), b"foob");
/// ```
pub fn from_base64(encoded: &[u8]) -> Result<Vec<u8>, Base64Error> {
    let data = &encoded[..strip_padding(encoded)];
    let mut out = Vec::with_capacity(data.len() * 3 / 4 + 2);
    for block in data.chunks(4) {
        match *block {
            [c0, c1, c2, c3] => {
                let v = (sextet(c0)? << 18) | (sextet(c1)? << 12) | (sextet(c2)? << 6) | sextet(c3)?;
                out.push((v >> 16) as u8);
                out.push((v >> 8) as u8);
                out.push(v as u8);
            }
            [c0, c1, c2] => {
                let v = (sextet(c0)? << 12) | (sextet(c1)? << 6) | sextet(c2)?;
                out.push((v >> 10) as u8);
                out.push((v >> 2) as u8);
            }
            [c0, c1] => {
                let v = (sextet(c0)? << 6) | sextet(c1)?;
                out.push((v >> 4) as u8);
            }
            _ => return Err(Base64Error::InvalidLength),
        }
    }
    Ok(out)
}

/// Decodes base64 without ever failing.
///
/// Characters outside the alphabet decode as zero bits and a dangling
/// single trailing character is dropped. This is the read path for binary
/// wire values, which must also be able to pass over a plain string field
/// that was never base64 to begin with.
pub fn from_base64_lenient(encoded: &[u8]) -> Vec<u8> {
    let data = &encoded[..strip_padding(encoded)];
    let mut out = Vec::with_capacity(data.len() * 3 / 4 + 2);
    for block in data.chunks(4) {
        match *block {
            [c0, c1, c2, c3] => {
                let v = (sextet_lenient(c0) << 18)
                    | (sextet_lenient(c1) << 12)
                    | (sextet_lenient(c2) << 6)
                    | sextet_lenient(c3);
                out.push((v >> 16) as u8);
                out.push((v >> 8) as u8);
                out.push(v as u8);
            }
            [c0, c1, c2] => {
                let v = (sextet_lenient(c0) << 12) | (sextet_lenient(c1) << 6) | sextet_lenient(c2);
                out.push((v >> 10) as u8);
                out.push((v >> 2) as u8);
            }
            [c0, c1] => {
                let v = (sextet_lenient(c0) << 6) | sextet_lenient(c1);
                out.push((v >> 4) as u8);
            }
            _ => {}
        }
    }
    out
}
