//! Script verification flags (bitmask).
//!
//! Flags are pure configuration: they change which encodings and
//! upgrade paths are enforced, never the data model.

use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Script verification flags controlling interpreter behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScriptFlags(pub u32);

impl ScriptFlags {
    /// No flags set.
    pub const NONE: ScriptFlags = ScriptFlags(0);
    /// Evaluate P2SH (BIP16) subscripts.
    pub const P2SH: ScriptFlags = ScriptFlags(1 << 0);
    /// Require strict signature, pubkey, and sighash-type encoding.
    pub const STRICTENC: ScriptFlags = ScriptFlags(1 << 1);
    /// Require strict DER (BIP66) signature encoding.
    pub const DERSIG: ScriptFlags = ScriptFlags(1 << 2);
    /// Require the S value of signatures in the lower half order.
    pub const LOW_S: ScriptFlags = ScriptFlags(1 << 3);
    /// Require the multisig dummy element to be empty (BIP147).
    pub const NULLDUMMY: ScriptFlags = ScriptFlags(1 << 4);
    /// Require the unlocking script to contain only pushes.
    pub const SIGPUSHONLY: ScriptFlags = ScriptFlags(1 << 5);
    /// Require minimal encodings for pushes and numbers (BIP62).
    pub const MINIMALDATA: ScriptFlags = ScriptFlags(1 << 6);
    /// Fail on the upgradable NOP opcodes (NOP1, NOP4..NOP10).
    pub const DISCOURAGE_UPGRADABLE_NOPS: ScriptFlags = ScriptFlags(1 << 7);
    /// Require exactly one element on the stack after evaluation.
    pub const CLEANSTACK: ScriptFlags = ScriptFlags(1 << 8);
    /// Enable CHECKLOCKTIMEVERIFY (BIP65).
    pub const CHECKLOCKTIMEVERIFY: ScriptFlags = ScriptFlags(1 << 9);
    /// Enable CHECKSEQUENCEVERIFY (BIP112).
    pub const CHECKSEQUENCEVERIFY: ScriptFlags = ScriptFlags(1 << 10);
    /// Enable witness program evaluation (BIP141).
    pub const WITNESS: ScriptFlags = ScriptFlags(1 << 11);
    /// Fail on witness versions this interpreter does not know.
    pub const DISCOURAGE_UPGRADABLE_WITNESS_PROGRAM: ScriptFlags = ScriptFlags(1 << 12);
    /// Require OP_IF/OP_NOTIF arguments to be empty or exactly 0x01.
    pub const MINIMALIF: ScriptFlags = ScriptFlags(1 << 13);

    /// Return true if every bit of `flag` is set in this value.
    pub fn has_flag(self, flag: ScriptFlags) -> bool {
        self.0 & flag.0 == flag.0
    }

    /// Return true if any of the given flags are set in this value.
    pub fn has_any(self, flags: &[ScriptFlags]) -> bool {
        flags.iter().any(|f| self.has_flag(*f))
    }

    /// Set the given flag bits in this value.
    pub fn add_flag(&mut self, flag: ScriptFlags) {
        self.0 |= flag.0;
    }
}

impl BitOr for ScriptFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        ScriptFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for ScriptFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ScriptFlags {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        ScriptFlags(self.0 & rhs.0)
    }
}
