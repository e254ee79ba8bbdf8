//! Consistent Overhead Byte Stuffing.
//!
//! Removes every zero byte from a payload so that a single `0x00` can
//! delimit frames on a raw byte stream. Each block starts with a code byte
//! holding the distance to the next (implicit) zero; a code of `0xFF`
//! marks a full 254-byte block with no implicit zero after it.
//!
//! ```text
//! 11 22 00 33          →  03 11 22 02 33 00
//! 00                   →  01 01 00
//! (empty)              →  01 00
//! ```

use crate::error::CodecError;

/// Longest run of data bytes a single code byte can describe.
const MAX_BLOCK: usize = 254;

/// Worst-case encoded size of `len` payload bytes, delimiter included.
pub const fn max_encoded_len(len: usize) -> usize {
    len + len / MAX_BLOCK + 2
}

/// Encode `src` into `dst` and append the trailing zero delimiter.
///
/// `dst` must hold [`max_encoded_len`] bytes; a smaller buffer is
/// rejected up front so nothing is ever half-written.
pub fn encode(src: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
    if dst.len() < max_encoded_len(src.len()) {
        return Err(CodecError::BufferTooSmall);
    }

    let mut code_idx = 0;
    let mut out = 1;
    let mut code: u8 = 1;

    for &byte in src {
        if byte == 0 {
            dst[code_idx] = code;
            code_idx = out;
            out += 1;
            code = 1;
        } else {
            dst[out] = byte;
            out += 1;
            code += 1;
            if code == 0xFF {
                dst[code_idx] = code;
                code_idx = out;
                out += 1;
                code = 1;
            }
        }
    }

    dst[code_idx] = code;
    dst[out] = 0;
    Ok(out + 1)
}

/// Decode a complete frame, trailing delimiter included.
pub fn decode(frame: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
    match frame.split_last() {
        Some((0, body)) => decode_body(body, dst),
        _ => Err(CodecError::MissingDelimiter),
    }
}

/// Decode a frame body that has already been split off at its delimiter.
pub fn decode_body(body: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
    let mut i = 0;
    let mut out = 0;

    while i < body.len() {
        let code = body[i];
        if code == 0 {
            return Err(CodecError::UnexpectedZero);
        }
        i += 1;

        let run = code as usize - 1;
        let Some(block) = body.get(i..i + run) else {
            return Err(CodecError::Truncated);
        };
        if block.contains(&0) {
            return Err(CodecError::UnexpectedZero);
        }
        let Some(slot) = dst.get_mut(out..out + run) else {
            return Err(CodecError::BufferTooSmall);
        };
        slot.copy_from_slice(block);
        out += run;
        i += run;

        if code != 0xFF && i < body.len() {
            let Some(z) = dst.get_mut(out) else {
                return Err(CodecError::BufferTooSmall);
            };
            *z = 0;
            out += 1;
        }
    }

    Ok(out)
}
