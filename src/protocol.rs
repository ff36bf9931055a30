//! Line framing for the echo exchange.
//!
//! The wire format is a single newline-terminated line in each
//! direction. The payload is raw bytes: no UTF-8 requirement, and a
//! `\r` before the `\n` belongs to the payload and is echoed back
//! untouched.

use bytes::{BufMut, BytesMut};

/// Split one line off the front of `input`.
///
/// Returns the payload without its `\n` delimiter and the number of
/// bytes consumed (payload plus delimiter), or `None` if no delimiter
/// has arrived yet.
pub fn split_line(input: &[u8]) -> Option<(&[u8], usize)> {
    let pos = input.iter().position(|&b| b == b'\n')?;
    Some((&input[..pos], pos + 1))
}

/// Frame a payload for the wire: payload followed by `\n`.
pub fn frame(payload: &[u8]) -> BytesMut {
    let mut out = BytesMut::with_capacity(payload.len() + 1);
    out.put_slice(payload);
    out.put_u8(b'\n');
    out
}
