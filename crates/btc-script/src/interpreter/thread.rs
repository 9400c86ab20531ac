//! Script execution thread - the core interpreter loop.
//!
//! A thread evaluates the unlocking script, then the locking script over
//! the same stack, then (as flagged) the P2SH redeem script and/or the
//! witness program. All verdicts are terminal; the caller gets the first
//! failure kind.

use btc_primitives::hash::sha256;

use crate::chunk::push_data_prefix;
use crate::opcodes::*;
use crate::{Script, ScriptPubKey};

use super::error::{ErrorKind, InterpreterError};
use super::flags::ScriptFlags;
use super::limits::*;
use super::parsed_opcode::{is_push_only, parse_script, ParsedOpcode, ParsedScript};
use super::stack::Stack;
use super::TxContext;

/// The execution thread for the script interpreter.
pub struct Thread<'a> {
    /// The main data stack.
    pub dstack: Stack,
    /// The alternate stack used by OP_TOALTSTACK / OP_FROMALTSTACK.
    pub astack: Stack,
    /// Nested IF/NOTIF/ELSE/ENDIF state; execution is enabled iff every
    /// entry is true.
    pub cond_stack: Vec<bool>,
    /// The parsed scripts to execute (unlocking, locking, and optionally
    /// the P2SH redeem script).
    pub scripts: Vec<ParsedScript>,
    /// Index of the currently executing script.
    pub script_idx: usize,
    /// Offset of the current opcode within the current script.
    pub script_off: usize,
    /// Offset just past the most recent OP_CODESEPARATOR.
    pub last_code_sep: usize,
    /// Running count of non-push opcodes in the current script.
    pub num_ops: usize,
    /// Active verification flags.
    pub flags: ScriptFlags,
    /// Whether BIP16 evaluation applies to this spend.
    pub p2sh: bool,
    /// Snapshot of the stack after the unlocking script, for BIP16.
    pub saved_first_stack: Vec<Vec<u8>>,
    /// The redeem script once a P2SH spend has been expanded.
    pub redeem_script: Option<Script>,
    /// The original locking script (witness program detection).
    pub locking_script: Script,
    /// The original unlocking script (witness malleation checks).
    pub unlocking_script: Script,
    /// The witness stack for this input.
    pub witness: &'a [Vec<u8>],
    /// Whether a witness program was verified during this execution.
    pub had_witness: bool,
    /// Optional transaction context for signature and locktime checks.
    pub tx_context: Option<&'a dyn TxContext>,
    /// The transaction input index being verified.
    pub input_idx: usize,
}

impl<'a> Thread<'a> {
    /// Create a new execution thread.
    ///
    /// Validates flag combinations, script sizes, and push-only rules,
    /// and parses both scripts.
    pub fn new(
        unlocking_script: &Script,
        locking_script: &Script,
        witness: &'a [Vec<u8>],
        flags: ScriptFlags,
        tx_context: Option<&'a dyn TxContext>,
        input_idx: usize,
    ) -> Result<Self, InterpreterError> {
        // CLEANSTACK and WITNESS are only defined on top of P2SH.
        if flags.has_flag(ScriptFlags::CLEANSTACK) && !flags.has_flag(ScriptFlags::P2SH) {
            return Err(InterpreterError::new(
                ErrorKind::ScriptError,
                "CLEANSTACK requires P2SH",
            ));
        }
        if flags.has_flag(ScriptFlags::WITNESS) && !flags.has_flag(ScriptFlags::P2SH) {
            return Err(InterpreterError::new(
                ErrorKind::ScriptError,
                "WITNESS requires P2SH",
            ));
        }

        if unlocking_script.len() > MAX_SCRIPT_SIZE {
            return Err(InterpreterError::new(
                ErrorKind::ScriptSize,
                format!(
                    "unlocking script size {} exceeds the max allowed size {}",
                    unlocking_script.len(),
                    MAX_SCRIPT_SIZE
                ),
            ));
        }
        if locking_script.len() > MAX_SCRIPT_SIZE {
            return Err(InterpreterError::new(
                ErrorKind::ScriptSize,
                format!(
                    "locking script size {} exceeds the max allowed size {}",
                    locking_script.len(),
                    MAX_SCRIPT_SIZE
                ),
            ));
        }

        let uscript = parse_script(unlocking_script)?;
        let lscript = parse_script(locking_script)?;

        if flags.has_flag(ScriptFlags::SIGPUSHONLY) && !is_push_only(&uscript) {
            return Err(InterpreterError::new(
                ErrorKind::ScriptError,
                "unlocking script is not push only",
            ));
        }

        let p2sh = flags.has_flag(ScriptFlags::P2SH) && locking_script.is_p2sh();
        if p2sh && !is_push_only(&uscript) {
            return Err(InterpreterError::new(
                ErrorKind::ScriptError,
                "pay to script hash unlocking script is not push only",
            ));
        }

        let require_minimal = flags.has_flag(ScriptFlags::MINIMALDATA);

        Ok(Thread {
            dstack: Stack::new(require_minimal),
            astack: Stack::new_alt(require_minimal),
            cond_stack: Vec::new(),
            scripts: vec![uscript, lscript],
            script_idx: 0,
            script_off: 0,
            last_code_sep: 0,
            num_ops: 0,
            flags,
            p2sh,
            saved_first_stack: Vec::new(),
            redeem_script: None,
            locking_script: locking_script.clone(),
            unlocking_script: unlocking_script.clone(),
            witness,
            had_witness: false,
            tx_context,
            input_idx,
        })
    }

    /// Check if a specific verification flag is set.
    pub fn has_flag(&self, flag: ScriptFlags) -> bool {
        self.flags.has_flag(flag)
    }

    /// Check if any of the given verification flags are set.
    pub fn has_any(&self, flags: &[ScriptFlags]) -> bool {
        self.flags.has_any(flags)
    }

    /// Return true if the current conditional branch is executing.
    pub fn is_branch_executing(&self) -> bool {
        self.cond_stack.iter().all(|&v| v)
    }

    /// Execute all scripts to completion.
    pub fn execute(&mut self) -> Result<(), InterpreterError> {
        while self.script_idx < self.scripts.len() {
            if self.script_off < self.scripts[self.script_idx].len() {
                let pop = self.scripts[self.script_idx][self.script_off].clone();
                self.execute_opcode(&pop)?;
                self.script_off += 1;

                let combined = self.dstack.depth() + self.astack.depth();
                if combined > MAX_STACK_SIZE {
                    return Err(InterpreterError::new(
                        ErrorKind::StackSize,
                        format!(
                            "combined stack size {} exceeds the max allowed {}",
                            combined, MAX_STACK_SIZE
                        ),
                    ));
                }
            } else {
                self.finish_script()?;
            }
        }

        self.check_final_stack()?;

        if self.has_flag(ScriptFlags::WITNESS) && !self.had_witness && !self.witness.is_empty() {
            return Err(InterpreterError::new(
                ErrorKind::ScriptError,
                "witness provided for a non-witness spend",
            ));
        }

        Ok(())
    }

    /// Close out the current script and transition to the next phase.
    fn finish_script(&mut self) -> Result<(), InterpreterError> {
        if !self.cond_stack.is_empty() {
            return Err(InterpreterError::new(
                ErrorKind::UnbalancedConditional,
                "end of script reached in conditional execution",
            ));
        }

        // The alt stack does not persist between scripts.
        self.astack.clear();
        self.num_ops = 0;
        self.script_off = 0;
        self.last_code_sep = 0;
        self.script_idx += 1;

        match self.script_idx {
            // Unlocking script done.
            1 => {
                if self.p2sh {
                    self.saved_first_stack = self.dstack.items();
                }
                Ok(())
            }
            // Locking script done: native witness, then P2SH expansion.
            2 => {
                if self.has_flag(ScriptFlags::WITNESS) {
                    if let Some((version, program)) = self.locking_script.witness_program() {
                        let program = program.to_vec();
                        self.require_truthy_top()?;
                        if !self.unlocking_script.is_empty() {
                            return Err(InterpreterError::new(
                                ErrorKind::WitnessMalleated,
                                "unlocking script must be empty for a native witness spend",
                            ));
                        }
                        self.had_witness = true;
                        self.execute_witness_program(version, &program)?;
                        self.dstack.set_items(vec![vec![1]]);
                        return Ok(());
                    }
                }
                if self.p2sh {
                    self.require_truthy_top()?;
                    let mut saved = std::mem::take(&mut self.saved_first_stack);
                    let redeem_bytes = saved.pop().ok_or_else(|| {
                        InterpreterError::new(
                            ErrorKind::InvalidStackOperation,
                            "pay to script hash with an empty unlocking stack",
                        )
                    })?;
                    let redeem = Script::from_bytes(&redeem_bytes);
                    let parsed = parse_script(&redeem)?;
                    self.dstack.set_items(saved);
                    self.scripts.push(parsed);
                    self.redeem_script = Some(redeem);
                }
                Ok(())
            }
            // Redeem script done: P2SH-wrapped witness.
            3 => {
                if self.has_flag(ScriptFlags::WITNESS) {
                    if let Some(redeem) = self.redeem_script.clone() {
                        if let Some((version, program)) = redeem.witness_program() {
                            self.require_truthy_top()?;
                            // The unlocking script must be exactly the
                            // canonical single push of the redeem script.
                            let mut expected = push_data_prefix(redeem.len()).map_err(|_| {
                                InterpreterError::new(
                                    ErrorKind::WitnessMalleated,
                                    "redeem script too large",
                                )
                            })?;
                            expected.extend_from_slice(redeem.to_bytes());
                            if self.unlocking_script.to_bytes() != expected.as_slice() {
                                return Err(InterpreterError::new(
                                    ErrorKind::WitnessMalleated,
                                    "unlocking script must be a single push of the witness redeem script",
                                ));
                            }
                            self.had_witness = true;
                            self.execute_witness_program(version, program)?;
                            self.dstack.set_items(vec![vec![1]]);
                        }
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Fail unless the stack is non-empty with a truthy top element.
    fn require_truthy_top(&self) -> Result<(), InterpreterError> {
        if self.dstack.depth() == 0 || !self.dstack.peek_bool(0)? {
            return Err(InterpreterError::new(
                ErrorKind::ScriptError,
                "false stack entry at end of script execution",
            ));
        }
        Ok(())
    }

    /// Verdict for the fully evaluated spend.
    fn check_final_stack(&mut self) -> Result<(), InterpreterError> {
        if self.dstack.depth() < 1 {
            return Err(InterpreterError::new(
                ErrorKind::ScriptError,
                "stack empty at end of script execution",
            ));
        }
        if self.has_flag(ScriptFlags::CLEANSTACK) && self.dstack.depth() != 1 {
            return Err(InterpreterError::new(
                ErrorKind::ScriptError,
                format!("stack contains {} unexpected items", self.dstack.depth() - 1),
            ));
        }
        if !self.dstack.pop_bool()? {
            return Err(InterpreterError::new(
                ErrorKind::ScriptError,
                "false stack entry at end of script execution",
            ));
        }
        Ok(())
    }

    /// Run checks that apply to every opcode, then dispatch.
    fn execute_opcode(&mut self, pop: &ParsedOpcode) -> Result<(), InterpreterError> {
        if pop.data.len() > MAX_SCRIPT_ELEMENT_SIZE {
            return Err(InterpreterError::new(
                ErrorKind::PushSize,
                format!(
                    "element size {} exceeds max allowed size {}",
                    pop.data.len(),
                    MAX_SCRIPT_ELEMENT_SIZE
                ),
            ));
        }

        // Disabled opcodes fail wherever they appear, executed or not.
        if pop.is_disabled() {
            return Err(InterpreterError::new(
                ErrorKind::DisabledOpcode,
                format!("attempt to execute disabled opcode {}", pop.name()),
            ));
        }

        // Count non-push operations, executed or not.
        if pop.opcode > OP_16 {
            self.num_ops += 1;
            if self.num_ops > MAX_OPS_PER_SCRIPT {
                return Err(InterpreterError::new(
                    ErrorKind::OpCount,
                    format!("exceeded max operation limit of {}", MAX_OPS_PER_SCRIPT),
                ));
            }
        }

        let executing = self.is_branch_executing();
        if !executing && !pop.is_conditional() {
            return Ok(());
        }

        if executing
            && pop.opcode <= OP_PUSHDATA4
            && self.has_flag(ScriptFlags::MINIMALDATA)
        {
            pop.enforce_minimal_push()?;
        }

        self.dispatch_opcode(pop, executing)
    }

    fn dispatch_opcode(
        &mut self,
        pop: &ParsedOpcode,
        executing: bool,
    ) -> Result<(), InterpreterError> {
        match pop.opcode {
            OP_0 => {
                self.dstack.push_byte_array(vec![]);
                Ok(())
            }
            op if (0x01..=0x4b).contains(&op) => {
                self.dstack.push_byte_array(pop.data.clone());
                Ok(())
            }
            OP_PUSHDATA1 | OP_PUSHDATA2 | OP_PUSHDATA4 => {
                self.dstack.push_byte_array(pop.data.clone());
                Ok(())
            }
            OP_1NEGATE => {
                self.dstack.push_byte_array(vec![0x81]);
                Ok(())
            }
            op if (OP_1..=OP_16).contains(&op) => {
                self.dstack.push_byte_array(vec![op - (OP_1 - 1)]);
                Ok(())
            }

            OP_NOP => Ok(()),
            OP_IF => self.op_if(false, executing),
            OP_NOTIF => self.op_if(true, executing),
            OP_VERIF | OP_VERNOTIF => Err(InterpreterError::new(
                ErrorKind::BadOpcode,
                format!("attempt to execute reserved opcode {}", pop.name()),
            )),
            OP_ELSE => self.op_else(),
            OP_ENDIF => self.op_endif(),
            OP_VERIFY => self.op_verify(pop),
            OP_RETURN => Err(InterpreterError::new(
                ErrorKind::ReturnExecuted,
                "OP_RETURN was executed",
            )),

            // Locktime
            OP_CHECKLOCKTIMEVERIFY => self.op_check_locktime_verify(),
            OP_CHECKSEQUENCEVERIFY => self.op_check_sequence_verify(),

            // Stack ops
            OP_TOALTSTACK => self.op_to_alt_stack(),
            OP_FROMALTSTACK => self.op_from_alt_stack(),
            OP_2DROP => self.dstack.drop_n(2),
            OP_2DUP => self.dstack.dup_n(2),
            OP_3DUP => self.dstack.dup_n(3),
            OP_2OVER => self.dstack.over_n(2),
            OP_2ROT => self.dstack.rot_n(2),
            OP_2SWAP => self.dstack.swap_n(2),
            OP_IFDUP => self.op_ifdup(),
            OP_DEPTH => self.op_depth(),
            OP_DROP => self.dstack.drop_n(1),
            OP_DUP => self.dstack.dup_n(1),
            OP_NIP => self.dstack.nip_n_discard(1),
            OP_OVER => self.dstack.over_n(1),
            OP_PICK => self.op_pick(),
            OP_ROLL => self.op_roll(),
            OP_ROT => self.dstack.rot_n(1),
            OP_SWAP => self.dstack.swap_n(1),
            OP_TUCK => self.dstack.tuck(),

            // Data
            OP_SIZE => self.op_size(),
            OP_EQUAL => self.op_equal(),
            OP_EQUALVERIFY => self.op_equalverify(pop),

            // Arithmetic
            OP_1ADD => self.op_unary_num(|a| a + 1),
            OP_1SUB => self.op_unary_num(|a| a - 1),
            OP_NEGATE => self.op_unary_num(|a| -a),
            OP_ABS => self.op_unary_num(|a| a.abs()),
            OP_NOT => self.op_unary_num(|a| i64::from(a == 0)),
            OP_0NOTEQUAL => self.op_unary_num(|a| i64::from(a != 0)),
            OP_ADD => self.op_binary_num(|a, b| a + b),
            OP_SUB => self.op_binary_num(|a, b| a - b),
            OP_BOOLAND => self.op_binary_num(|a, b| i64::from(a != 0 && b != 0)),
            OP_BOOLOR => self.op_binary_num(|a, b| i64::from(a != 0 || b != 0)),
            OP_NUMEQUAL => self.op_binary_num(|a, b| i64::from(a == b)),
            OP_NUMEQUALVERIFY => self.op_numequalverify(pop),
            OP_NUMNOTEQUAL => self.op_binary_num(|a, b| i64::from(a != b)),
            OP_LESSTHAN => self.op_binary_num(|a, b| i64::from(a < b)),
            OP_GREATERTHAN => self.op_binary_num(|a, b| i64::from(a > b)),
            OP_LESSTHANOREQUAL => self.op_binary_num(|a, b| i64::from(a <= b)),
            OP_GREATERTHANOREQUAL => self.op_binary_num(|a, b| i64::from(a >= b)),
            OP_MIN => self.op_binary_num(|a, b| a.min(b)),
            OP_MAX => self.op_binary_num(|a, b| a.max(b)),
            OP_WITHIN => self.op_within(),

            // Crypto
            OP_RIPEMD160 | OP_SHA1 | OP_SHA256 | OP_HASH160 | OP_HASH256 => {
                self.op_hash(pop.opcode)
            }
            OP_CODESEPARATOR => {
                self.last_code_sep = self.script_off + 1;
                Ok(())
            }
            OP_CHECKSIG => self.op_checksig(),
            OP_CHECKSIGVERIFY => self.op_checksigverify(pop),
            OP_CHECKMULTISIG => self.op_checkmultisig(),
            OP_CHECKMULTISIGVERIFY => self.op_checkmultisigverify(pop),

            // Upgradable NOPs
            OP_NOP1 | OP_NOP4 | OP_NOP5 | OP_NOP6 | OP_NOP7 | OP_NOP8 | OP_NOP9 | OP_NOP10 => {
                if self.has_flag(ScriptFlags::DISCOURAGE_UPGRADABLE_NOPS) {
                    return Err(InterpreterError::new(
                        ErrorKind::DiscourageUpgradableNops,
                        format!("{} reserved for soft-fork upgrades", pop.name()),
                    ));
                }
                Ok(())
            }

            // Reserved and unknown opcodes
            _ => Err(InterpreterError::new(
                ErrorKind::BadOpcode,
                format!("attempt to execute invalid opcode {}", pop.name()),
            )),
        }
    }

    // -----------------------------------------------------------------------
    // Witness program execution (BIP141, version 0)
    // -----------------------------------------------------------------------

    /// Verify the witness against a witness program.
    fn execute_witness_program(
        &mut self,
        version: u8,
        program: &[u8],
    ) -> Result<(), InterpreterError> {
        if version == 0 {
            return match program.len() {
                20 => {
                    // P2WPKH: the witness is exactly <signature> <pubkey>,
                    // run against the implied P2PKH template.
                    if self.witness.len() != 2 {
                        return Err(InterpreterError::new(
                            ErrorKind::WitnessProgramMismatch,
                            format!(
                                "P2WPKH witness has {} items instead of 2",
                                self.witness.len()
                            ),
                        ));
                    }
                    let mut hash = [0u8; 20];
                    hash.copy_from_slice(program);
                    let script = ScriptPubKey::pay_to_pubkey_hash(&hash);
                    self.run_witness_script(&script, self.witness.to_vec())
                }
                32 => {
                    // P2WSH: the last witness item is the script whose
                    // SHA-256 must equal the program.
                    if self.witness.is_empty() {
                        return Err(InterpreterError::new(
                            ErrorKind::WitnessProgramWitnessEmpty,
                            "P2WSH spend with an empty witness",
                        ));
                    }
                    let witness_script = Script::from_bytes(&self.witness[self.witness.len() - 1]);
                    if sha256(witness_script.to_bytes()) != program {
                        return Err(InterpreterError::new(
                            ErrorKind::WitnessProgramMismatch,
                            "witness script does not hash to the witness program",
                        ));
                    }
                    let initial = self.witness[..self.witness.len() - 1].to_vec();
                    self.run_witness_script(&witness_script, initial)
                }
                n => Err(InterpreterError::new(
                    ErrorKind::WitnessProgramWrongLength,
                    format!("version 0 witness program of {} bytes", n),
                )),
            };
        }

        if self.has_flag(ScriptFlags::DISCOURAGE_UPGRADABLE_WITNESS_PROGRAM) {
            return Err(InterpreterError::new(
                ErrorKind::DiscourageUpgradableWitnessProgram,
                format!("witness version {} reserved for soft-fork upgrades", version),
            ));
        }
        Ok(())
    }

    /// Evaluate a witness script over the given initial stack. The run
    /// must finish with exactly one truthy element.
    fn run_witness_script(
        &mut self,
        script: &Script,
        initial: Vec<Vec<u8>>,
    ) -> Result<(), InterpreterError> {
        for item in &initial {
            if item.len() > MAX_SCRIPT_ELEMENT_SIZE {
                return Err(InterpreterError::new(
                    ErrorKind::PushSize,
                    format!(
                        "witness item size {} exceeds max allowed size {}",
                        item.len(),
                        MAX_SCRIPT_ELEMENT_SIZE
                    ),
                ));
            }
        }
        if script.len() > MAX_SCRIPT_SIZE {
            return Err(InterpreterError::new(
                ErrorKind::ScriptSize,
                format!("witness script size {} exceeds the max allowed", script.len()),
            ));
        }

        let parsed = parse_script(script)?;
        let require_minimal = self.has_flag(ScriptFlags::MINIMALDATA);
        let mut dstack = Stack::new(require_minimal);
        dstack.set_items(initial);

        let mut sub = Thread {
            dstack,
            astack: Stack::new_alt(require_minimal),
            cond_stack: Vec::new(),
            scripts: vec![parsed],
            script_idx: 0,
            script_off: 0,
            last_code_sep: 0,
            num_ops: 0,
            flags: self.flags,
            p2sh: false,
            saved_first_stack: Vec::new(),
            redeem_script: None,
            locking_script: script.clone(),
            unlocking_script: Script::new(),
            witness: &[],
            had_witness: true,
            tx_context: self.tx_context,
            input_idx: self.input_idx,
        };

        while sub.script_idx < sub.scripts.len() {
            if sub.script_off < sub.scripts[sub.script_idx].len() {
                let pop = sub.scripts[sub.script_idx][sub.script_off].clone();
                sub.execute_opcode(&pop)?;
                sub.script_off += 1;

                let combined = sub.dstack.depth() + sub.astack.depth();
                if combined > MAX_STACK_SIZE {
                    return Err(InterpreterError::new(
                        ErrorKind::StackSize,
                        format!(
                            "combined stack size {} exceeds the max allowed {}",
                            combined, MAX_STACK_SIZE
                        ),
                    ));
                }
            } else {
                sub.finish_script()?;
            }
        }

        if sub.dstack.depth() != 1 || !sub.dstack.peek_bool(0)? {
            return Err(InterpreterError::new(
                ErrorKind::ScriptError,
                "witness script did not finish with a single true value",
            ));
        }
        Ok(())
    }
}
