//! Interpreter verdict kinds.
//!
//! Every failure mode the interpreter can produce is a distinct kind;
//! all of them are terminal. The caller receives the kind plus a
//! human-readable description for logging and policy decisions.

use std::fmt;

/// The failure kinds a script evaluation can terminate with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Generic failure: final stack false or empty, missing transaction
    /// context, unexpected witness data, or a numeric overflow.
    ScriptError,
    /// A stack operation needed more items than were present.
    InvalidStackOperation,
    /// OP_FROMALTSTACK with an empty alt stack.
    InvalidAltStackOperation,
    /// A disabled opcode appeared anywhere in the script.
    DisabledOpcode,
    /// IF/ELSE/ENDIF nesting did not balance.
    UnbalancedConditional,
    /// OP_VERIFY (or OP_EQUALVERIFY) popped a false value.
    VerifyFailed,
    /// OP_RETURN was reached in an executed branch.
    ReturnExecuted,
    /// OP_NUMEQUALVERIFY popped a false comparison.
    NumEqualVerifyFailed,
    /// OP_CHECKSIGVERIFY failed.
    CheckSigVerifyFailed,
    /// OP_CHECKMULTISIGVERIFY failed.
    CheckMultiSigVerifyFailed,
    /// A pushed element exceeded 520 bytes.
    PushSize,
    /// A script exceeded 10,000 bytes.
    ScriptSize,
    /// More than 201 non-push opcodes were processed.
    OpCount,
    /// Combined stack and alt-stack size exceeded 1,000 items.
    StackSize,
    /// Multisig signature count was negative or above the key count.
    SigCount,
    /// Multisig key count was negative or above 20.
    PubKeyCount,
    /// A push or number was not minimally encoded under MINIMALDATA.
    MinimalData,
    /// CHECKLOCKTIMEVERIFY / CHECKSEQUENCEVERIFY operand was negative.
    NegativeLockTime,
    /// The transaction does not satisfy the required lock time.
    UnsatisfiedLockTime,
    /// A signature S value was above the curve half order under LOW_S.
    SigHighS,
    /// A signature was not strict DER under DERSIG/STRICTENC.
    SigDer,
    /// A public key was not compressed/uncompressed under STRICTENC.
    PubKeyType,
    /// The multisig dummy element was non-empty under NULLDUMMY.
    SigNullDummy,
    /// An upgradable NOP was executed under DISCOURAGE_UPGRADABLE_NOPS.
    DiscourageUpgradableNops,
    /// An unknown witness version was used under
    /// DISCOURAGE_UPGRADABLE_WITNESS_PROGRAM.
    DiscourageUpgradableWitnessProgram,
    /// A native witness spend carried a non-empty scriptSig (or a
    /// wrapped spend malformed its redeem push).
    WitnessMalleated,
    /// A version-0 witness program was neither 20 nor 32 bytes.
    WitnessProgramWrongLength,
    /// A P2WSH spend carried an empty witness.
    WitnessProgramWitnessEmpty,
    /// The witness did not match the program (hash or arity mismatch).
    WitnessProgramMismatch,
    /// An unknown or reserved opcode, or a truncated push.
    BadOpcode,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A script interpreter error: the verdict kind plus a description.
#[derive(Debug, Clone)]
pub struct InterpreterError {
    pub kind: ErrorKind,
    pub description: String,
}

impl InterpreterError {
    pub fn new(kind: ErrorKind, description: impl Into<String>) -> Self {
        InterpreterError {
            kind,
            description: description.into(),
        }
    }
}

impl fmt::Display for InterpreterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.description)
    }
}

impl std::error::Error for InterpreterError {}
