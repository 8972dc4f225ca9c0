//! The probe's single reply: a big-endian `u16` length followed by that many
//! bytes of UTF-8 holding the tracer pid in decimal.

use crate::tracer::error::{ProbeError, Result};
use std::io::{ErrorKind, Read, Write};

/// Longest reply accepted; an `i32` never needs more than 11 characters.
const MAX_REPLY_LEN: usize = 16;

pub fn write_reply<W: Write>(writer: &mut W, tracer_pid: i32) -> Result<()> {
    let text = tracer_pid.to_string();
    // Length always fits: at most 11 bytes.
    let len = text.len() as u16;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Reads exactly one reply. End of stream before a complete reply is
/// [`ProbeError::Closed`].
pub fn read_reply<R: Read>(reader: &mut R) -> Result<i32> {
    let mut len = [0u8; 2];
    read_exact_or_closed(reader, &mut len)?;
    let len = u16::from_be_bytes(len) as usize;
    if len == 0 || len > MAX_REPLY_LEN {
        return Err(ProbeError::Malformed(format!("reply length {len}")));
    }

    let mut body = vec![0u8; len];
    read_exact_or_closed(reader, &mut body)?;
    let text = std::str::from_utf8(&body)
        .map_err(|e| ProbeError::Malformed(format!("reply is not UTF-8: {e}")))?;
    text.trim()
        .parse::<i32>()
        .map_err(|e| ProbeError::Malformed(format!("{text:?}: {e}")))
}

fn read_exact_or_closed<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => ProbeError::Closed,
        _ => ProbeError::Io(e),
    })
}
