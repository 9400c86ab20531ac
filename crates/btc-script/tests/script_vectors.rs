//! Scenario and resource-limit vectors for the script engine.
//!
//! Exercises the multisig script-signature shape, single-opcode
//! semantics, disabled-opcode rejection, and every consensus resource
//! bound through the public Engine interface.

use btc_script::interpreter::{Engine, ErrorKind, InterpreterError, ScriptFlags, TxContext};
use btc_script::opcodes::*;
use btc_script::{Script, ScriptPubKey};

/// Oracle accepting a fixed set of (signature, pubkey) pairs.
struct StubContext {
    accepted: Vec<(Vec<u8>, Vec<u8>)>,
}

impl TxContext for StubContext {
    fn verify_signature(
        &self,
        sig: &[u8],
        pubkey: &[u8],
        _script_code: &Script,
        _input_idx: usize,
    ) -> bool {
        self.accepted.iter().any(|(s, p)| s == sig && p == pubkey)
    }

    fn lock_time(&self) -> u32 {
        0
    }

    fn tx_version(&self) -> u32 {
        2
    }

    fn input_sequence(&self, _input_idx: usize) -> u32 {
        0
    }
}

fn run(unlock: &Script, lock: &Script) -> Result<(), InterpreterError> {
    Engine::new().execute(unlock, lock, &[], ScriptFlags::NONE, None, 0)
}

// ---------------------------------------------------------------------------
// Multisig script-signature parsing (2-of-3 P2SH shape)
// ---------------------------------------------------------------------------

/// A P2SH multisig script signature parses into OP_0, two signature
/// pushes, and an OP_PUSHDATA1 of the 105-byte redeem script, which in
/// turn parses as `OP_2 <pk> <pk> <pk> OP_3 OP_CHECKMULTISIG`.
#[test]
fn test_multisig_script_sig_parses() {
    let mut sig1 = vec![0x30u8];
    sig1.extend_from_slice(&[0x44; 69]);
    sig1.push(0x01); // 71 bytes
    let mut sig2 = vec![0x30u8];
    sig2.extend_from_slice(&[0x45; 70]);
    sig2.push(0x01); // 72 bytes

    let mut redeem = Script::new();
    redeem.append_opcodes(&[OP_2]).expect("opcode");
    for seed in [0x11u8, 0x22, 0x33] {
        let mut pk = vec![0x02];
        pk.extend_from_slice(&[seed; 32]);
        redeem.append_push_data(&pk).expect("push");
    }
    redeem.append_opcodes(&[OP_3, OP_CHECKMULTISIG]).expect("opcodes");
    assert_eq!(redeem.len(), 105);

    // script signature: OP_0 <sig1> <sig2> OP_PUSHDATA1 <105-byte redeem>
    let mut script_sig = vec![OP_0];
    script_sig.push(sig1.len() as u8); // 0x47
    script_sig.extend_from_slice(&sig1);
    script_sig.push(sig2.len() as u8); // 0x48
    script_sig.extend_from_slice(&sig2);
    script_sig.push(OP_PUSHDATA1); // 0x4c
    script_sig.push(redeem.len() as u8); // 0x69
    script_sig.extend_from_slice(redeem.to_bytes());

    let script = Script::from_bytes(&script_sig);
    let chunks = script.chunks().expect("should parse");
    assert_eq!(chunks.len(), 4);
    assert_eq!(chunks[0].op, OP_0);
    assert_eq!(chunks[1].op, 0x47);
    assert_eq!(chunks[1].data.as_ref().expect("sig push").len(), 71);
    assert_eq!(chunks[2].op, 0x48);
    assert_eq!(chunks[2].data.as_ref().expect("sig push").len(), 72);
    assert_eq!(chunks[3].op, OP_PUSHDATA1);
    let redeem_data = chunks[3].data.as_ref().expect("redeem push");
    assert_eq!(redeem_data.len(), 105);

    let redeem_chunks = Script::from_bytes(redeem_data).chunks().expect("redeem parses");
    assert_eq!(redeem_chunks.len(), 6);
    assert_eq!(redeem_chunks[0].op, OP_2);
    for chunk in &redeem_chunks[1..4] {
        assert_eq!(chunk.data.as_ref().expect("pubkey push").len(), 33);
    }
    assert_eq!(redeem_chunks[4].op, OP_3);
    assert_eq!(redeem_chunks[5].op, OP_CHECKMULTISIG);

    // the whole script signature is push-only, as P2SH requires
    assert!(script.is_push_only());
}

// ---------------------------------------------------------------------------
// Single-opcode semantics
// ---------------------------------------------------------------------------

/// OP_DUP on a stack of [0xAB] leaves [0xAB, 0xAB] and succeeds.
#[test]
fn test_op_dup_duplicates() {
    let unlock = Script::from_bytes(&[0x01, 0xab]);
    let lock = Script::from_bytes(&[OP_DUP, OP_EQUAL]);
    // equality of the two copies proves the duplicate
    assert!(run(&unlock, &lock).is_ok());
}

/// 1-of-2 CHECKMULTISIG succeeds when the signature matches the second
/// key, consuming keys from the top down.
#[test]
fn test_checkmultisig_1_of_2_second_key() {
    let sig1 = b"\x30only-sig\x01".to_vec();
    let pk1 = vec![0x02; 33];
    let pk2 = vec![0x03; 33];
    let ctx = StubContext {
        accepted: vec![(sig1.clone(), pk2.clone())],
    };

    let mut unlock = Script::new();
    unlock.append_opcodes(&[OP_0]).expect("dummy");
    unlock.append_push_data(&sig1).expect("sig");

    let lock = ScriptPubKey::multisig(1, &[pk1, pk2]).expect("template");

    let result = Engine::new().execute(&unlock, &lock, &[], ScriptFlags::NONE, Some(&ctx), 0);
    assert!(result.is_ok(), "1-of-2 should succeed: {:?}", result.err());
}

/// A script containing OP_CAT fails with DisabledOpcode even when the
/// branch holding it never executes.
#[test]
fn test_disabled_opcode_in_unexecuted_branch() {
    let unlock = Script::from_bytes(&[OP_1]);
    let lock = Script::from_bytes(&[OP_0, OP_IF, OP_0, OP_CAT, OP_ENDIF]);
    let err = run(&unlock, &lock).expect_err("OP_CAT is disabled");
    assert_eq!(err.kind, ErrorKind::DisabledOpcode);
}

// ---------------------------------------------------------------------------
// Resource limits
// ---------------------------------------------------------------------------

/// Scripts above 10,000 bytes are rejected before execution.
#[test]
fn test_script_size_limit() {
    let lock = Script::from_bytes(&vec![OP_NOP; 10_001]);
    let err = run(&Script::from_bytes(&[OP_1]), &lock).expect_err("oversized script");
    assert_eq!(err.kind, ErrorKind::ScriptSize);

    // exactly at the limit the size check passes (the op count fails
    // later, which is the point: the bound is on bytes, not ops)
    let lock = Script::from_bytes(&vec![OP_NOP; 10_000]);
    let err = run(&Script::from_bytes(&[OP_1]), &lock).expect_err("too many ops");
    assert_eq!(err.kind, ErrorKind::OpCount);
}

/// A single push above 520 bytes is fatal.
#[test]
fn test_push_size_limit() {
    let mut unlock = Script::new();
    unlock.append_push_data(&[0xaa; 521]).expect("push encodes");
    let err = run(&unlock, &Script::from_bytes(&[OP_1])).expect_err("oversized push");
    assert_eq!(err.kind, ErrorKind::PushSize);

    // 520 bytes exactly is fine
    let mut unlock = Script::new();
    unlock.append_push_data(&[0xaa; 520]).expect("push encodes");
    assert!(run(&unlock, &Script::from_bytes(&[OP_1])).is_ok());
}

/// More than 1,000 combined stack items is fatal.
#[test]
fn test_stack_size_limit() {
    // 1,001 pushes of OP_1
    let lock = Script::from_bytes(&vec![OP_1; 1_001]);
    let err = run(&Script::new(), &lock).expect_err("stack overflow");
    assert_eq!(err.kind, ErrorKind::StackSize);

    // exactly 1,000 is fine
    let lock = Script::from_bytes(&vec![OP_1; 1_000]);
    assert!(run(&Script::new(), &lock).is_ok());
}

/// More than 201 executed non-push opcodes is fatal.
#[test]
fn test_op_count_limit() {
    // 201 NOPs pass
    let mut bytes = vec![OP_1];
    bytes.extend_from_slice(&vec![OP_NOP; 201]);
    assert!(run(&Script::new(), &Script::from_bytes(&bytes)).is_ok());

    // 202 fail
    let mut bytes = vec![OP_1];
    bytes.extend_from_slice(&vec![OP_NOP; 202]);
    let err = run(&Script::new(), &Script::from_bytes(&bytes)).expect_err("too many ops");
    assert_eq!(err.kind, ErrorKind::OpCount);
}

/// Multisig keys count against the opcode budget.
#[test]
fn test_multisig_key_op_count() {
    // 190 NOPs, then a 20-key multisig: 190 + 1 + 20 = 211 > 201.
    let mut bytes = vec![OP_0, OP_0]; // dummy, m = 0
    for _ in 0..20 {
        bytes.extend_from_slice(&[0x01, 0x02]); // 1-byte "keys"
    }
    bytes.extend_from_slice(&[0x01, 20]); // n = 20
    bytes.extend_from_slice(&vec![OP_NOP; 190]);
    bytes.extend_from_slice(&[OP_CHECKMULTISIG, OP_DROP, OP_1]);

    let err = run(&Script::new(), &Script::from_bytes(&bytes)).expect_err("op budget exceeded");
    assert_eq!(err.kind, ErrorKind::OpCount);
}

/// Multisig rejects more than 20 keys and more signatures than keys.
#[test]
fn test_multisig_count_limits() {
    // n = 21
    let lock = Script::from_bytes(&[0x01, 21, OP_CHECKMULTISIG]);
    let err = run(&Script::from_bytes(&[OP_0]), &lock).expect_err("21 keys");
    assert_eq!(err.kind, ErrorKind::PubKeyCount);

    // m = 2 with n = 1
    let mut bytes = Vec::new();
    bytes.push(OP_2); // m = 2 (below the key)
    bytes.extend_from_slice(&[0x01, 0x02]); // one "key"
    bytes.push(OP_1); // n = 1
    bytes.push(OP_CHECKMULTISIG);
    let err = run(&Script::from_bytes(&[OP_0, OP_0, OP_0]), &Script::from_bytes(&bytes))
        .expect_err("m > n");
    assert_eq!(err.kind, ErrorKind::SigCount);
}
