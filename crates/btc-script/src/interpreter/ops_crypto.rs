//! Hashing and signature-checking opcodes.
//!
//! Signature verification itself is delegated to the caller-supplied
//! [`TxContext`](super::TxContext) oracle; this module owns the stack
//! discipline, the encoding checks, and the multisig matching loop.

use num_bigint::BigInt;

use btc_primitives::hash;

use crate::opcodes::*;

use super::error::{ErrorKind, InterpreterError};
use super::flags::ScriptFlags;
use super::limits::{MAX_OPS_PER_SCRIPT, MAX_PUBKEYS_PER_MULTISIG};
use super::parsed_opcode::{find_and_delete, remove_opcode, unparse, ParsedOpcode, ParsedScript};
use super::thread::Thread;

impl<'a> Thread<'a> {
    /// OP_RIPEMD160 / OP_SHA1 / OP_SHA256 / OP_HASH160 / OP_HASH256:
    /// pop one item, push its digest.
    pub(crate) fn op_hash(&mut self, opcode: u8) -> Result<(), InterpreterError> {
        let buf = self.dstack.pop_byte_array()?;
        let digest: Vec<u8> = match opcode {
            OP_RIPEMD160 => hash::ripemd160(&buf).to_vec(),
            OP_SHA1 => hash::sha1(&buf).to_vec(),
            OP_SHA256 => hash::sha256(&buf).to_vec(),
            OP_HASH160 => hash::hash160(&buf).to_vec(),
            _ => hash::sha256d(&buf).to_vec(),
        };
        self.dstack.push_byte_array(digest);
        Ok(())
    }

    /// The script code for sighash purposes: the current script from
    /// just past the last OP_CODESEPARATOR.
    pub(crate) fn sub_script(&self) -> ParsedScript {
        self.scripts[self.script_idx][self.last_code_sep..].to_vec()
    }

    pub(crate) fn op_checksig(&mut self) -> Result<(), InterpreterError> {
        let pubkey = self.dstack.pop_byte_array()?;
        let full_sig = self.dstack.pop_byte_array()?;

        if full_sig.is_empty() {
            self.dstack.push_bool(false);
            return Ok(());
        }

        let sighash_type = full_sig[full_sig.len() - 1] as u32;
        let der_sig = &full_sig[..full_sig.len() - 1];

        self.check_hash_type_encoding(sighash_type)?;
        self.check_signature_encoding(der_sig)?;
        self.check_pub_key_encoding(&pubkey)?;

        let ctx = self.tx_context.ok_or_else(|| {
            InterpreterError::new(ErrorKind::ScriptError, "no transaction context for checksig")
        })?;

        // Legacy sighash scrubs the signature push and any separators
        // from the script code.
        let mut sub = self.sub_script();
        sub = find_and_delete(&sub, &full_sig);
        sub = remove_opcode(&sub, OP_CODESEPARATOR);
        let script_code = unparse(&sub);

        let valid = ctx.verify_signature(&full_sig, &pubkey, &script_code, self.input_idx);
        self.dstack.push_bool(valid);
        Ok(())
    }

    pub(crate) fn op_checksigverify(&mut self, pop: &ParsedOpcode) -> Result<(), InterpreterError> {
        self.op_checksig()?;
        self.abstract_verify(pop, ErrorKind::CheckSigVerifyFailed)
    }

    /// OP_CHECKMULTISIG.
    ///
    /// Pops `n`, the `n` public keys, `m`, the `m` signatures, and the
    /// consensus dummy element. Signatures must match public keys in
    /// order: each signature is tried against the remaining keys from
    /// the top down, consuming one key per attempt.
    pub(crate) fn op_checkmultisig(&mut self) -> Result<(), InterpreterError> {
        let num_keys = self.dstack.pop_int()?.value();
        if num_keys < 0 || num_keys > MAX_PUBKEYS_PER_MULTISIG {
            return Err(InterpreterError::new(
                ErrorKind::PubKeyCount,
                format!("multisig key count {} out of range", num_keys),
            ));
        }

        // Every key in a multisig counts against the opcode budget.
        self.num_ops += num_keys as usize;
        if self.num_ops > MAX_OPS_PER_SCRIPT {
            return Err(InterpreterError::new(
                ErrorKind::OpCount,
                format!("exceeded max operation limit of {}", MAX_OPS_PER_SCRIPT),
            ));
        }

        // Popped top-first: pub_keys[0] is the last key in the script.
        let mut pub_keys = Vec::with_capacity(num_keys as usize);
        for _ in 0..num_keys {
            pub_keys.push(self.dstack.pop_byte_array()?);
        }

        let num_sigs = self.dstack.pop_int()?.value();
        if num_sigs < 0 || num_sigs > num_keys {
            return Err(InterpreterError::new(
                ErrorKind::SigCount,
                format!(
                    "multisig signature count {} out of range for {} keys",
                    num_sigs, num_keys
                ),
            ));
        }

        let mut signatures = Vec::with_capacity(num_sigs as usize);
        for _ in 0..num_sigs {
            signatures.push(self.dstack.pop_byte_array()?);
        }

        // The dummy element is popped unconditionally (off-by-one
        // consensus quirk); NULLDUMMY requires it to be empty.
        let dummy = self.dstack.pop_byte_array()?;
        if self.has_flag(ScriptFlags::NULLDUMMY) && !dummy.is_empty() {
            return Err(InterpreterError::new(
                ErrorKind::SigNullDummy,
                format!("multisig dummy element has length {} instead of 0", dummy.len()),
            ));
        }

        let mut sub = self.sub_script();
        for sig in &signatures {
            sub = find_and_delete(&sub, sig);
        }
        sub = remove_opcode(&sub, OP_CODESEPARATOR);
        let script_code = unparse(&sub);

        let mut success = true;
        let mut sig_idx = 0usize;
        let mut key_idx = 0usize;
        let mut sigs_remaining = num_sigs;
        let mut keys_remaining = num_keys;

        while success && sigs_remaining > 0 {
            // Fewer keys than signatures left means some signature can
            // never match.
            if sigs_remaining > keys_remaining {
                success = false;
                break;
            }

            let sig = &signatures[sig_idx];
            let pubkey = &pub_keys[key_idx];

            if !sig.is_empty() {
                let sighash_type = sig[sig.len() - 1] as u32;
                let der_sig = &sig[..sig.len() - 1];
                self.check_hash_type_encoding(sighash_type)?;
                self.check_signature_encoding(der_sig)?;
                self.check_pub_key_encoding(pubkey)?;

                if let Some(ctx) = self.tx_context {
                    if ctx.verify_signature(sig, pubkey, &script_code, self.input_idx) {
                        sig_idx += 1;
                        sigs_remaining -= 1;
                    }
                }
            }

            key_idx += 1;
            keys_remaining -= 1;
        }

        self.dstack.push_bool(success);
        Ok(())
    }

    pub(crate) fn op_checkmultisigverify(
        &mut self,
        pop: &ParsedOpcode,
    ) -> Result<(), InterpreterError> {
        self.op_checkmultisig()?;
        self.abstract_verify(pop, ErrorKind::CheckMultiSigVerifyFailed)
    }

    // -----------------------------------------------------------------------
    // Encoding checks
    // -----------------------------------------------------------------------

    /// Under STRICTENC, the sighash type byte must name a defined mode
    /// (ALL/NONE/SINGLE, optionally ANYONECANPAY).
    pub(crate) fn check_hash_type_encoding(&self, sighash_type: u32) -> Result<(), InterpreterError> {
        if !self.has_flag(ScriptFlags::STRICTENC) {
            return Ok(());
        }
        let base = sighash_type & !0x80; // mask SIGHASH_ANYONECANPAY
        if !(1..=3).contains(&base) {
            return Err(InterpreterError::new(
                ErrorKind::SigDer,
                format!("invalid sighash type {:#04x}", sighash_type),
            ));
        }
        Ok(())
    }

    /// Under STRICTENC, public keys must be 33-byte compressed or
    /// 65-byte uncompressed.
    pub(crate) fn check_pub_key_encoding(&self, pubkey: &[u8]) -> Result<(), InterpreterError> {
        if !self.has_flag(ScriptFlags::STRICTENC) {
            return Ok(());
        }
        if pubkey.len() == 33 && (pubkey[0] == 0x02 || pubkey[0] == 0x03) {
            return Ok(());
        }
        if pubkey.len() == 65 && pubkey[0] == 0x04 {
            return Ok(());
        }
        Err(InterpreterError::new(
            ErrorKind::PubKeyType,
            "unsupported public key type",
        ))
    }

    /// Under DERSIG / LOW_S / STRICTENC, signatures must be strict DER;
    /// under LOW_S the S value must also be in the lower half order.
    ///
    /// `sig` excludes the trailing sighash-type byte. An empty signature
    /// passes (it simply never verifies).
    pub(crate) fn check_signature_encoding(&self, sig: &[u8]) -> Result<(), InterpreterError> {
        if !self.has_any(&[
            ScriptFlags::DERSIG,
            ScriptFlags::LOW_S,
            ScriptFlags::STRICTENC,
        ]) {
            return Ok(());
        }
        if sig.is_empty() {
            return Ok(());
        }

        let sig_len = sig.len();
        if sig_len < 8 {
            return Err(der_error(format!("signature too short: {} < 8", sig_len)));
        }
        if sig_len > 72 {
            return Err(der_error(format!("signature too long: {} > 72", sig_len)));
        }
        if sig[0] != 0x30 {
            return Err(der_error(format!("wrong sequence tag {:#04x}", sig[0])));
        }
        if sig[1] as usize != sig_len - 2 {
            return Err(der_error(format!(
                "declared length {} does not cover {} bytes",
                sig[1],
                sig_len - 2
            )));
        }

        let r_len = sig[3] as usize;
        let s_type_offset = 4 + r_len;
        if s_type_offset + 1 >= sig_len {
            return Err(der_error("S element missing".to_string()));
        }
        let s_len = sig[s_type_offset + 1] as usize;
        let s_offset = s_type_offset + 2;
        if s_offset + s_len != sig_len {
            return Err(der_error("invalid S length".to_string()));
        }

        if sig[2] != 0x02 {
            return Err(der_error(format!("R integer marker {:#04x} != 0x02", sig[2])));
        }
        if r_len == 0 {
            return Err(der_error("R length is zero".to_string()));
        }
        if sig[4] & 0x80 != 0 {
            return Err(der_error("R is negative".to_string()));
        }
        if r_len > 1 && sig[4] == 0x00 && sig[5] & 0x80 == 0 {
            return Err(der_error("R has excess padding".to_string()));
        }

        if sig[s_type_offset] != 0x02 {
            return Err(der_error(format!(
                "S integer marker {:#04x} != 0x02",
                sig[s_type_offset]
            )));
        }
        if s_len == 0 {
            return Err(der_error("S length is zero".to_string()));
        }
        if sig[s_offset] & 0x80 != 0 {
            return Err(der_error("S is negative".to_string()));
        }
        if s_len > 1 && sig[s_offset] == 0x00 && sig[s_offset + 1] & 0x80 == 0 {
            return Err(der_error("S has excess padding".to_string()));
        }

        if self.has_flag(ScriptFlags::LOW_S) {
            // Half the order of secp256k1.
            let half_order = BigInt::parse_bytes(
                b"7FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF5D576E7357A4501DDFE92F46681B20A0",
                16,
            )
            .expect("constant parses");
            let s_value =
                BigInt::from_bytes_be(num_bigint::Sign::Plus, &sig[s_offset..s_offset + s_len]);
            if s_value > half_order {
                return Err(InterpreterError::new(
                    ErrorKind::SigHighS,
                    "signature S value is unnecessarily high",
                ));
            }
        }

        Ok(())
    }
}

fn der_error(description: String) -> InterpreterError {
    InterpreterError::new(ErrorKind::SigDer, format!("malformed signature: {}", description))
}
