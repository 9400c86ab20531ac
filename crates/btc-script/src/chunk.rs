//! Script chunk parsing and encoding.
//!
//! A script chunk is either an opcode or a data push with its associated
//! bytes. This module handles decoding raw script bytes into structured
//! chunks and encoding push data with the correct OP_PUSHDATA prefix.
//! Decoding and re-encoding a well-formed script yields the identical
//! byte string.

use crate::opcodes::*;
use crate::ScriptError;

/// A single parsed element of a Bitcoin script.
///
/// Each chunk is either a standalone opcode (like OP_DUP) or a data push
/// that carries the opcode byte and the pushed data bytes. For direct
/// pushes (1-75 bytes) the opcode byte is the push length itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptChunk {
    /// The opcode byte. For direct pushes (1-75 bytes), this is the length.
    pub op: u8,
    /// The data payload, if this chunk is a push operation.
    pub data: Option<Vec<u8>>,
}

impl ScriptChunk {
    /// Convert this chunk to its ASM string representation.
    ///
    /// Data push chunks are rendered as hex strings; non-push opcodes use
    /// their canonical OP_xxx name.
    pub fn to_asm_string(&self) -> String {
        if self.op > OP_0 && self.op <= OP_PUSHDATA4 {
            if let Some(ref data) = self.data {
                return hex::encode(data);
            }
        }
        opcode_to_string(self.op).to_string()
    }

    /// Serialize this chunk back to raw script bytes.
    ///
    /// Push chunks emit their length prefix followed by the data; all
    /// other chunks emit the single opcode byte.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![self.op];
        if let Some(ref data) = self.data {
            match self.op {
                OP_PUSHDATA1 => out.push(data.len() as u8),
                OP_PUSHDATA2 => out.extend_from_slice(&(data.len() as u16).to_le_bytes()),
                OP_PUSHDATA4 => out.extend_from_slice(&(data.len() as u32).to_le_bytes()),
                _ => {}
            }
            out.extend_from_slice(data);
        }
        out
    }
}

/// Decode raw script bytes into a vector of `ScriptChunk` values.
///
/// Handles direct pushes (opcode bytes 0x01-0x4b) and the extended
/// OP_PUSHDATA1/2/4 forms with their 1/2/4-byte little-endian length
/// fields. Every other byte is a standalone opcode.
///
/// # Arguments
/// * `bytes` - The raw script bytes to decode.
///
/// # Returns
/// A vector of parsed chunks, or a `ScriptError` if the data is truncated.
pub fn decode_script(bytes: &[u8]) -> Result<Vec<ScriptChunk>, ScriptError> {
    let mut chunks = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let op = bytes[pos];

        match op {
            OP_PUSHDATA1 => {
                if bytes.len() < pos + 2 {
                    return Err(ScriptError::DataTooSmall);
                }
                let length = bytes[pos + 1] as usize;
                pos += 2;
                if bytes.len() < pos + length {
                    return Err(ScriptError::DataTooSmall);
                }
                let data = bytes[pos..pos + length].to_vec();
                chunks.push(ScriptChunk { op, data: Some(data) });
                pos += length;
            }
            OP_PUSHDATA2 => {
                if bytes.len() < pos + 3 {
                    return Err(ScriptError::DataTooSmall);
                }
                let length = u16::from_le_bytes([bytes[pos + 1], bytes[pos + 2]]) as usize;
                pos += 3;
                if bytes.len() < pos + length {
                    return Err(ScriptError::DataTooSmall);
                }
                let data = bytes[pos..pos + length].to_vec();
                chunks.push(ScriptChunk { op, data: Some(data) });
                pos += length;
            }
            OP_PUSHDATA4 => {
                if bytes.len() < pos + 5 {
                    return Err(ScriptError::DataTooSmall);
                }
                let length = u32::from_le_bytes([
                    bytes[pos + 1],
                    bytes[pos + 2],
                    bytes[pos + 3],
                    bytes[pos + 4],
                ]) as usize;
                pos += 5;
                if bytes.len() < pos + length {
                    return Err(ScriptError::DataTooSmall);
                }
                let data = bytes[pos..pos + length].to_vec();
                chunks.push(ScriptChunk { op, data: Some(data) });
                pos += length;
            }
            0x01..=0x4b => {
                // Direct push: op byte is the number of bytes to push.
                let length = op as usize;
                if bytes.len() < pos + 1 + length {
                    return Err(ScriptError::DataTooSmall);
                }
                let data = bytes[pos + 1..pos + 1 + length].to_vec();
                chunks.push(ScriptChunk { op, data: Some(data) });
                pos += 1 + length;
            }
            _ => {
                chunks.push(ScriptChunk { op, data: None });
                pos += 1;
            }
        }
    }

    Ok(chunks)
}

/// Serialize a chunk sequence back to raw script bytes.
///
/// Inverse of [`decode_script`]: for any well-formed script,
/// `encode_script(&decode_script(b)?) == b`.
pub fn encode_script(chunks: &[ScriptChunk]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for chunk in chunks {
        bytes.extend_from_slice(&chunk.to_bytes());
    }
    bytes
}

/// Compute the push prefix bytes for a data payload of the given length.
///
/// Picks the minimal encoding: direct push-length for `len <= 75`,
/// OP_PUSHDATA1 for `len <= 255`, OP_PUSHDATA2 for `len <= 65535`, and
/// OP_PUSHDATA4 above that.
///
/// # Arguments
/// * `data_len` - The length of the data to be pushed.
///
/// # Returns
/// A byte vector containing the appropriate prefix, or an error if the
/// data is too large for the protocol.
pub fn push_data_prefix(data_len: usize) -> Result<Vec<u8>, ScriptError> {
    if data_len <= 75 {
        Ok(vec![data_len as u8])
    } else if data_len <= 0xFF {
        Ok(vec![OP_PUSHDATA1, data_len as u8])
    } else if data_len <= 0xFFFF {
        let mut buf = vec![OP_PUSHDATA2];
        buf.extend_from_slice(&(data_len as u16).to_le_bytes());
        Ok(buf)
    } else if data_len <= 0xFFFFFFFF {
        let mut buf = vec![OP_PUSHDATA4];
        buf.extend_from_slice(&(data_len as u32).to_le_bytes());
        Ok(buf)
    } else {
        Err(ScriptError::DataTooBig)
    }
}

/// Encode multiple data payloads into a single byte vector with push
/// prefixes.
///
/// Each element in `parts` gets its own minimal push prefix based on its
/// length.
///
/// # Arguments
/// * `parts` - Slice of data byte slices to encode.
///
/// # Returns
/// A byte vector containing all pushes concatenated, or an error if any
/// part is too large.
pub fn encode_push_datas(parts: &[&[u8]]) -> Result<Vec<u8>, ScriptError> {
    let mut result = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        let prefix = push_data_prefix(part.len()).map_err(|_| ScriptError::PartTooBig(i))?;
        result.extend_from_slice(&prefix);
        result.extend_from_slice(part);
    }
    Ok(result)
}
