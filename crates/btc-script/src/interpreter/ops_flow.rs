//! Flow control and locktime opcodes.

use super::error::{ErrorKind, InterpreterError};
use super::flags::ScriptFlags;
use super::limits::*;
use super::parsed_opcode::ParsedOpcode;
use super::scriptnum::ScriptNumber;
use super::stack::cast_to_bool;
use super::thread::Thread;

impl<'a> Thread<'a> {
    /// Pop the conditional argument for OP_IF / OP_NOTIF.
    ///
    /// Under MINIMALIF the argument must be empty or exactly 0x01.
    fn pop_if_bool(&mut self) -> Result<bool, InterpreterError> {
        if self.has_flag(ScriptFlags::MINIMALIF) {
            let b = self.dstack.pop_byte_array()?;
            if b.len() > 1 || (b.len() == 1 && b[0] != 1) {
                return Err(InterpreterError::new(
                    ErrorKind::MinimalData,
                    format!("conditional argument {:02x?} is not minimal", b),
                ));
            }
            return Ok(cast_to_bool(&b));
        }
        self.dstack.pop_bool()
    }

    /// OP_IF / OP_NOTIF: push the (possibly negated) truthiness of the
    /// popped top onto the conditional stack. In a disabled branch the
    /// argument is not popped and the nested branch is disabled too.
    pub(crate) fn op_if(&mut self, negate: bool, executing: bool) -> Result<(), InterpreterError> {
        let value = if executing {
            let v = self.pop_if_bool()?;
            if negate {
                !v
            } else {
                v
            }
        } else {
            false
        };
        self.cond_stack.push(value);
        Ok(())
    }

    /// OP_ELSE flips the innermost conditional. Repeated OP_ELSE within
    /// one OP_IF keeps toggling.
    pub(crate) fn op_else(&mut self) -> Result<(), InterpreterError> {
        match self.cond_stack.last_mut() {
            Some(head) => {
                *head = !*head;
                Ok(())
            }
            None => Err(InterpreterError::new(
                ErrorKind::UnbalancedConditional,
                "OP_ELSE with no matching OP_IF",
            )),
        }
    }

    pub(crate) fn op_endif(&mut self) -> Result<(), InterpreterError> {
        if self.cond_stack.pop().is_none() {
            return Err(InterpreterError::new(
                ErrorKind::UnbalancedConditional,
                "OP_ENDIF with no matching OP_IF",
            ));
        }
        Ok(())
    }

    pub(crate) fn op_verify(&mut self, pop: &ParsedOpcode) -> Result<(), InterpreterError> {
        self.abstract_verify(pop, ErrorKind::VerifyFailed)
    }

    /// Pop the top and fail with `kind` unless it is truthy.
    pub(crate) fn abstract_verify(
        &mut self,
        pop: &ParsedOpcode,
        kind: ErrorKind,
    ) -> Result<(), InterpreterError> {
        let verified = self.dstack.pop_bool()?;
        if !verified {
            return Err(InterpreterError::new(kind, format!("{} failed", pop.name())));
        }
        Ok(())
    }

    /// OP_CHECKLOCKTIMEVERIFY (BIP65).
    ///
    /// Without the flag this is OP_NOP2. With it, the top element is a
    /// 5-byte lock time that must be of the same kind as and not greater
    /// than the transaction lock time, and the input must not be final.
    pub(crate) fn op_check_locktime_verify(&mut self) -> Result<(), InterpreterError> {
        if !self.has_flag(ScriptFlags::CHECKLOCKTIMEVERIFY) {
            if self.has_flag(ScriptFlags::DISCOURAGE_UPGRADABLE_NOPS) {
                return Err(InterpreterError::new(
                    ErrorKind::DiscourageUpgradableNops,
                    "OP_NOP2 reserved for soft-fork upgrades",
                ));
            }
            return Ok(());
        }

        let ctx = self.tx_context.ok_or_else(|| {
            InterpreterError::new(
                ErrorKind::ScriptError,
                "no transaction context for CHECKLOCKTIMEVERIFY",
            )
        })?;

        let top = self.dstack.peek_byte_array(0)?;
        let require_minimal = self.has_flag(ScriptFlags::MINIMALDATA);
        let lock_time =
            ScriptNumber::from_bytes(&top, LOCKTIME_NUMBER_LENGTH, require_minimal)?.value();

        if lock_time < 0 {
            return Err(InterpreterError::new(
                ErrorKind::NegativeLockTime,
                format!("negative lock time {}", lock_time),
            ));
        }

        verify_lock_time(ctx.lock_time() as i64, LOCKTIME_THRESHOLD, lock_time)?;

        if ctx.input_sequence(self.input_idx) == SEQUENCE_FINAL {
            return Err(InterpreterError::new(
                ErrorKind::UnsatisfiedLockTime,
                "transaction input is finalized",
            ));
        }

        Ok(())
    }

    /// OP_CHECKSEQUENCEVERIFY (BIP112).
    ///
    /// Without the flag this is OP_NOP3. With it, the top element is a
    /// relative lock that must be satisfied by the input's sequence.
    pub(crate) fn op_check_sequence_verify(&mut self) -> Result<(), InterpreterError> {
        if !self.has_flag(ScriptFlags::CHECKSEQUENCEVERIFY) {
            if self.has_flag(ScriptFlags::DISCOURAGE_UPGRADABLE_NOPS) {
                return Err(InterpreterError::new(
                    ErrorKind::DiscourageUpgradableNops,
                    "OP_NOP3 reserved for soft-fork upgrades",
                ));
            }
            return Ok(());
        }

        let ctx = self.tx_context.ok_or_else(|| {
            InterpreterError::new(
                ErrorKind::ScriptError,
                "no transaction context for CHECKSEQUENCEVERIFY",
            )
        })?;

        let top = self.dstack.peek_byte_array(0)?;
        let require_minimal = self.has_flag(ScriptFlags::MINIMALDATA);
        let sequence =
            ScriptNumber::from_bytes(&top, LOCKTIME_NUMBER_LENGTH, require_minimal)?.value();

        if sequence < 0 {
            return Err(InterpreterError::new(
                ErrorKind::NegativeLockTime,
                format!("negative sequence {}", sequence),
            ));
        }

        // With the disable bit set the operand imposes no constraint.
        if sequence & SEQUENCE_LOCKTIME_DISABLE_FLAG != 0 {
            return Ok(());
        }

        if ctx.tx_version() < 2 {
            return Err(InterpreterError::new(
                ErrorKind::UnsatisfiedLockTime,
                format!("transaction version {} predates relative lock times", ctx.tx_version()),
            ));
        }

        let tx_sequence = ctx.input_sequence(self.input_idx) as i64;
        if tx_sequence & SEQUENCE_LOCKTIME_DISABLE_FLAG != 0 {
            return Err(InterpreterError::new(
                ErrorKind::UnsatisfiedLockTime,
                format!(
                    "transaction sequence {:#x} has relative lock times disabled",
                    tx_sequence
                ),
            ));
        }

        let mask = SEQUENCE_LOCKTIME_TYPE_FLAG | SEQUENCE_LOCKTIME_MASK;
        verify_lock_time(
            tx_sequence & mask,
            SEQUENCE_LOCKTIME_TYPE_FLAG,
            sequence & mask,
        )
    }
}

/// Shared comparison for absolute and relative lock times: both values
/// must be on the same side of `threshold`, and the stack operand must
/// not exceed the transaction's value.
pub(crate) fn verify_lock_time(
    tx_lock_time: i64,
    threshold: i64,
    lock_time: i64,
) -> Result<(), InterpreterError> {
    if (tx_lock_time < threshold && lock_time >= threshold)
        || (tx_lock_time >= threshold && lock_time < threshold)
    {
        return Err(InterpreterError::new(
            ErrorKind::UnsatisfiedLockTime,
            format!(
                "mismatched lock time types: tx lock time {}, stack lock time {}",
                tx_lock_time, lock_time
            ),
        ));
    }
    if lock_time > tx_lock_time {
        return Err(InterpreterError::new(
            ErrorKind::UnsatisfiedLockTime,
            format!(
                "lock time requirement not satisfied: {} > {}",
                lock_time, tx_lock_time
            ),
        ));
    }
    Ok(())
}
