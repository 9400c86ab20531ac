//! Output script classification and templates.
//!
//! A `ScriptPubKey` pairs raw locking-script bytes with their recognized
//! standard form. Classification is structural: the script is parsed into
//! chunks and matched against the standard output templates. Everything
//! that matches no template is `NonStandard`.

use crate::opcodes::*;
use crate::{Script, ScriptError};

/// The recognized standard form of a locking script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptPubKey {
    /// `<pubkey> OP_CHECKSIG` - pay directly to a public key.
    P2pk { pubkey: Vec<u8> },
    /// `OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG`.
    P2pkh { pubkey_hash: [u8; 20] },
    /// `OP_HASH160 <20> OP_EQUAL`.
    P2sh { script_hash: [u8; 20] },
    /// `OP_m <pk_1>...<pk_n> OP_n OP_CHECKMULTISIG`.
    Multisig { required: u8, pubkeys: Vec<Vec<u8>> },
    /// `OP_0 <20|32>` - version-0 witness program (P2WPKH / P2WSH).
    WitnessV0 { program: Vec<u8> },
    /// `OP_1..OP_16 <2..40>` - upgradable witness program.
    WitnessUnknown { version: u8, program: Vec<u8> },
    /// `OP_RETURN ...` - provably unspendable data carrier.
    NullData { data: Vec<u8> },
    /// Anything that matches no standard template.
    NonStandard,
    /// The empty script.
    Empty,
}

impl ScriptPubKey {
    /// Classify a locking script into its standard form.
    pub fn classify(script: &Script) -> ScriptPubKey {
        if script.is_empty() {
            return ScriptPubKey::Empty;
        }
        if let Ok(pubkey_hash) = script.public_key_hash() {
            return ScriptPubKey::P2pkh { pubkey_hash };
        }
        if let Ok(script_hash) = script.script_hash() {
            return ScriptPubKey::P2sh { script_hash };
        }
        if let Some((version, program)) = script.witness_program() {
            if version == 0 {
                if program.len() == 20 || program.len() == 32 {
                    return ScriptPubKey::WitnessV0 {
                        program: program.to_vec(),
                    };
                }
                return ScriptPubKey::NonStandard;
            }
            return ScriptPubKey::WitnessUnknown {
                version,
                program: program.to_vec(),
            };
        }

        let chunks = match script.chunks() {
            Ok(c) => c,
            Err(_) => return ScriptPubKey::NonStandard,
        };
        if script.is_null_data() {
            // The carried payload is the concatenation of the data
            // pushes following OP_RETURN, with their push framing
            // stripped. Anything but data pushes after OP_RETURN is
            // not a standard data carrier.
            if chunks[1..].iter().all(|c| c.op <= OP_PUSHDATA4) {
                let data = chunks[1..]
                    .iter()
                    .filter_map(|c| c.data.as_deref())
                    .collect::<Vec<_>>()
                    .concat();
                return ScriptPubKey::NullData { data };
            }
            return ScriptPubKey::NonStandard;
        }
        if script.is_p2pk() {
            if let Some(pubkey) = chunks[0].data.clone() {
                return ScriptPubKey::P2pk { pubkey };
            }
        }
        if script.is_multisig() {
            let required = small_int_value(chunks[0].op);
            let declared = small_int_value(chunks[chunks.len() - 2].op);
            let pubkeys: Option<Vec<Vec<u8>>> = chunks[1..chunks.len() - 2]
                .iter()
                .map(|c| c.data.clone())
                .collect();
            if let (Some(required), Some(declared), Some(pubkeys)) = (required, declared, pubkeys) {
                if pubkeys.len() == declared as usize && required <= declared {
                    return ScriptPubKey::Multisig { required, pubkeys };
                }
            }
            return ScriptPubKey::NonStandard;
        }
        ScriptPubKey::NonStandard
    }

    // -----------------------------------------------------------------------
    // Template constructors (byte-exact standard forms)
    // -----------------------------------------------------------------------

    /// Build the P2PK locking script `<pubkey> OP_CHECKSIG`.
    pub fn pay_to_pubkey(pubkey: &[u8]) -> Result<Script, ScriptError> {
        let mut script = Script::new();
        script.append_push_data(pubkey)?;
        script.append_opcodes(&[OP_CHECKSIG])?;
        Ok(script)
    }

    /// Build the P2PKH locking script
    /// `OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG`.
    pub fn pay_to_pubkey_hash(pubkey_hash: &[u8; 20]) -> Script {
        let mut bytes = Vec::with_capacity(25);
        bytes.extend_from_slice(&[OP_DUP, OP_HASH160, 20]);
        bytes.extend_from_slice(pubkey_hash);
        bytes.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
        Script::from_bytes(&bytes)
    }

    /// Build the P2SH locking script `OP_HASH160 <20> OP_EQUAL`.
    pub fn pay_to_script_hash(script_hash: &[u8; 20]) -> Script {
        let mut bytes = Vec::with_capacity(23);
        bytes.extend_from_slice(&[OP_HASH160, 20]);
        bytes.extend_from_slice(script_hash);
        bytes.push(OP_EQUAL);
        Script::from_bytes(&bytes)
    }

    /// Build the bare multisig locking script
    /// `OP_m <pk_1>...<pk_n> OP_n OP_CHECKMULTISIG`.
    ///
    /// # Arguments
    /// * `required` - The signature threshold m, `0 < m <= n`.
    /// * `pubkeys` - The n public keys, `n <= 16` for a small-int count.
    pub fn multisig(required: u8, pubkeys: &[Vec<u8>]) -> Result<Script, ScriptError> {
        if pubkeys.is_empty()
            || pubkeys.len() > 16
            || required == 0
            || required as usize > pubkeys.len()
        {
            return Err(ScriptError::InvalidOpcodeData);
        }
        let mut script = Script::new();
        script.append_small_int(required)?;
        for pk in pubkeys {
            script.append_push_data(pk)?;
        }
        script.append_small_int(pubkeys.len() as u8)?;
        script.append_opcodes(&[OP_CHECKMULTISIG])?;
        Ok(script)
    }

    /// Build a version-0 witness locking script `OP_0 <20|32>`.
    pub fn witness_v0(program: &[u8]) -> Result<Script, ScriptError> {
        if program.len() != 20 && program.len() != 32 {
            return Err(ScriptError::InvalidOpcodeData);
        }
        let mut script = Script::new();
        script.append_opcodes(&[OP_0])?;
        script.append_push_data(program)?;
        Ok(script)
    }

    /// Build a data-carrier locking script `OP_RETURN <data>`.
    pub fn null_data(data: &[u8]) -> Result<Script, ScriptError> {
        let mut script = Script::new();
        script.append_opcodes(&[OP_RETURN])?;
        script.append_push_data(data)?;
        Ok(script)
    }

    // -----------------------------------------------------------------------
    // Extraction
    // -----------------------------------------------------------------------

    /// The 20-byte public key hash, for P2PKH outputs.
    pub fn pubkey_hash(&self) -> Option<&[u8; 20]> {
        match self {
            ScriptPubKey::P2pkh { pubkey_hash } => Some(pubkey_hash),
            _ => None,
        }
    }

    /// The 20-byte script hash, for P2SH outputs.
    pub fn script_hash(&self) -> Option<&[u8; 20]> {
        match self {
            ScriptPubKey::P2sh { script_hash } => Some(script_hash),
            _ => None,
        }
    }

    /// The witness program bytes, for any witness output.
    pub fn witness_program(&self) -> Option<&[u8]> {
        match self {
            ScriptPubKey::WitnessV0 { program } => Some(program),
            ScriptPubKey::WitnessUnknown { program, .. } => Some(program),
            _ => None,
        }
    }
}
