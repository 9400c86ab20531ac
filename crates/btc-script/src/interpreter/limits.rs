//! Consensus resource limits enforced by the interpreter.

/// Maximum script byte size.
pub const MAX_SCRIPT_SIZE: usize = 10_000;
/// Maximum single data element byte size.
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;
/// Maximum combined stack size (data + alt).
pub const MAX_STACK_SIZE: usize = 1_000;
/// Maximum number of non-push opcodes per script.
pub const MAX_OPS_PER_SCRIPT: usize = 201;
/// Maximum number of public keys in a multisig operation.
pub const MAX_PUBKEYS_PER_MULTISIG: i64 = 20;
/// Maximum byte length for numeric stack values.
pub const MAX_SCRIPT_NUMBER_LENGTH: usize = 4;
/// Byte length allowed for CHECKLOCKTIMEVERIFY / CHECKSEQUENCEVERIFY
/// operands (locktimes are unsigned 32-bit, so five bytes).
pub const LOCKTIME_NUMBER_LENGTH: usize = 5;

/// Lock times below this value are block heights, above it timestamps.
pub const LOCKTIME_THRESHOLD: i64 = 500_000_000;
/// An input sequence of this value opts out of lock-time enforcement.
pub const SEQUENCE_FINAL: u32 = 0xffff_ffff;
/// Sequence bit disabling relative lock-time (BIP112).
pub const SEQUENCE_LOCKTIME_DISABLE_FLAG: i64 = 1 << 31;
/// Sequence bit selecting time-based (vs height-based) relative locks.
pub const SEQUENCE_LOCKTIME_TYPE_FLAG: i64 = 1 << 22;
/// Mask extracting the relative lock-time value from a sequence.
pub const SEQUENCE_LOCKTIME_MASK: i64 = 0x0000_ffff;
