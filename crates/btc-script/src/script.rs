//! The Script type.
//!
//! A script is an opaque byte vector until something needs structure:
//! classification matches the standard output templates directly on the
//! bytes, while ASM rendering and the interpreter go through the chunk
//! decoder. Builders always emit minimal push encodings.

use std::fmt;

use crate::chunk::{decode_script, push_data_prefix, ScriptChunk};
use crate::opcodes::*;
use crate::ScriptError;

/// A Bitcoin script, wrapping its raw bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Script(Vec<u8>);

impl Script {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// The empty script.
    pub fn new() -> Self {
        Script(Vec::new())
    }

    /// Wrap a copy of raw script bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Script(bytes.to_vec())
    }

    /// Parse a script from hex.
    pub fn from_hex(hex_str: &str) -> Result<Self, ScriptError> {
        Ok(Script(hex::decode(hex_str)?))
    }

    /// Assemble a script from its ASM form.
    ///
    /// Whitespace-separated tokens are resolved against the opcode
    /// table first; anything unrecognized is decoded as hex and pushed
    /// with a minimal prefix.
    pub fn from_asm(asm: &str) -> Result<Self, ScriptError> {
        let mut script = Script::new();
        for token in asm.split_whitespace() {
            match string_to_opcode(token) {
                Some(op) => script.append_opcodes(&[op])?,
                None => script.append_push_data_hex(token)?,
            }
        }
        Ok(script)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Borrow the raw bytes.
    pub fn to_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Render the bytes as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Script length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the script has no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decode the script into its chunk sequence.
    pub fn chunks(&self) -> Result<Vec<ScriptChunk>, ScriptError> {
        decode_script(&self.0)
    }

    /// Render the script as space-separated ASM tokens: hex for data
    /// pushes, OP_xxx names for everything else. Malformed scripts
    /// render as the empty string.
    pub fn to_asm(&self) -> String {
        match self.chunks() {
            Ok(chunks) => chunks
                .iter()
                .map(|c| c.to_asm_string())
                .collect::<Vec<_>>()
                .join(" "),
            Err(_) => String::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Template recognition and extraction
    // -----------------------------------------------------------------------

    /// Extract the hash from a P2PKH locking script
    /// (`OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG`).
    pub fn public_key_hash(&self) -> Result<[u8; 20], ScriptError> {
        match self.0.as_slice() {
            [] => Err(ScriptError::EmptyScript),
            [OP_DUP, OP_HASH160, OP_DATA_20, tail @ ..]
                if tail.len() == 22 && tail[20] == OP_EQUALVERIFY && tail[21] == OP_CHECKSIG =>
            {
                let mut hash = [0u8; 20];
                hash.copy_from_slice(&tail[..20]);
                Ok(hash)
            }
            _ => Err(ScriptError::TemplateMismatch("P2PKH")),
        }
    }

    /// Extract the hash from a P2SH locking script
    /// (`OP_HASH160 <20> OP_EQUAL`).
    pub fn script_hash(&self) -> Result<[u8; 20], ScriptError> {
        match self.0.as_slice() {
            [] => Err(ScriptError::EmptyScript),
            [OP_HASH160, OP_DATA_20, tail @ ..] if tail.len() == 21 && tail[20] == OP_EQUAL => {
                let mut hash = [0u8; 20];
                hash.copy_from_slice(&tail[..20]);
                Ok(hash)
            }
            _ => Err(ScriptError::TemplateMismatch("P2SH")),
        }
    }

    /// True for the P2PKH template.
    pub fn is_p2pkh(&self) -> bool {
        self.public_key_hash().is_ok()
    }

    /// True for the P2SH template.
    pub fn is_p2sh(&self) -> bool {
        self.script_hash().is_ok()
    }

    /// True for `<pubkey> OP_CHECKSIG` with a plausibly encoded key
    /// (33-byte compressed or 65-byte uncompressed).
    pub fn is_p2pk(&self) -> bool {
        let chunks = match self.chunks() {
            Ok(c) => c,
            Err(_) => return false,
        };
        match chunks.as_slice() {
            [push, tail] if tail.op == OP_CHECKSIG => {
                push.data.as_deref().map_or(false, looks_like_pubkey)
            }
            _ => false,
        }
    }

    /// True for `OP_m <pk_1>...<pk_n> OP_n OP_CHECKMULTISIG`.
    pub fn is_multisig(&self) -> bool {
        let chunks = match self.chunks() {
            Ok(c) => c,
            Err(_) => return false,
        };
        match chunks.as_slice() {
            [m, keys @ .., n, last] if last.op == OP_CHECKMULTISIG => {
                !keys.is_empty()
                    && is_small_int_op(m.op)
                    && is_small_int_op(n.op)
                    && keys
                        .iter()
                        .all(|k| k.data.as_deref().map_or(false, |d| !d.is_empty()))
            }
            _ => false,
        }
    }

    /// True for data-carrier outputs beginning with OP_RETURN.
    pub fn is_null_data(&self) -> bool {
        self.0.first() == Some(&OP_RETURN)
    }

    /// True when every chunk is a push. Small-integer opcodes count,
    /// as does OP_RESERVED (consensus quirk).
    pub fn is_push_only(&self) -> bool {
        match self.chunks() {
            Ok(chunks) => chunks.iter().all(|c| c.op <= OP_16),
            Err(_) => false,
        }
    }

    /// Detect a segwit witness program: a small-integer version opcode
    /// followed by one direct push of 2 to 40 bytes.
    ///
    /// # Returns
    /// `Some((version, program))` when the script matches, else `None`.
    pub fn witness_program(&self) -> Option<(u8, &[u8])> {
        match self.0.as_slice() {
            [version_op, push_len, program @ ..] => {
                let version = small_int_value(*version_op)?;
                if (2..=40).contains(&(*push_len as usize)) && program.len() == *push_len as usize {
                    Some((version, program))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // Builders
    // -----------------------------------------------------------------------

    /// Push `data` with the smallest prefix that can express it.
    pub fn append_push_data(&mut self, data: &[u8]) -> Result<(), ScriptError> {
        let prefix = push_data_prefix(data.len())?;
        self.0.extend_from_slice(&prefix);
        self.0.extend_from_slice(data);
        Ok(())
    }

    /// Decode `hex_str` and push it with a minimal prefix.
    pub fn append_push_data_hex(&mut self, hex_str: &str) -> Result<(), ScriptError> {
        let data = hex::decode(hex_str).map_err(|_| ScriptError::InvalidOpcodeData)?;
        self.append_push_data(&data)
    }

    /// Append opcode bytes verbatim. Push opcodes are refused here;
    /// data belongs in `append_push_data` so the length framing cannot
    /// go wrong.
    pub fn append_opcodes(&mut self, opcodes: &[u8]) -> Result<(), ScriptError> {
        if let Some(&op) = opcodes
            .iter()
            .find(|&&op| (OP_DATA_1..=OP_PUSHDATA4).contains(&op))
        {
            return Err(ScriptError::InvalidOpcodeType(
                opcode_to_string(op).to_string(),
            ));
        }
        self.0.extend_from_slice(opcodes);
        Ok(())
    }

    /// Append a small integer (0..=16) as its dedicated opcode.
    pub fn append_small_int(&mut self, n: u8) -> Result<(), ScriptError> {
        let op = small_int_op(n).ok_or(ScriptError::InvalidOpcodeData)?;
        self.0.push(op);
        Ok(())
    }
}

/// A 33-byte compressed (0x02/0x03) or 65-byte uncompressed (0x04)
/// SEC-encoded public key.
fn looks_like_pubkey(bytes: &[u8]) -> bool {
    matches!(bytes, [0x02 | 0x03, rest @ ..] if rest.len() == 32)
        || matches!(bytes, [0x04, rest @ ..] if rest.len() == 64)
}

impl Default for Script {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Script").field(&self.to_hex()).finish()
    }
}

impl serde::Serialize for Script {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Script {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        Script::from_hex(&hex_str).map_err(serde::de::Error::custom)
    }
}
