//! Full Bitcoin script interpreter.
//!
//! Executes unlocking and locking scripts to verify transaction inputs,
//! supporting all enabled opcodes, the consensus resource limits, P2SH
//! redemption, and version-0 witness programs.
//!
//! # Architecture
//!
//! The interpreter does not know how to compute signature hashes.
//! Callers provide a [`TxContext`] implementation that owns the
//! spending transaction and answers signature and locktime queries;
//! the interpreter treats it as a pure, deterministic oracle.
//!
//! # Example
//!
//! ```ignore
//! use btc_script::interpreter::{Engine, ScriptFlags};
//!
//! let engine = Engine::new();
//! engine.execute(
//!     &unlocking_script,
//!     &locking_script,
//!     &witness,
//!     ScriptFlags::P2SH | ScriptFlags::WITNESS,
//!     Some(&tx_context),
//!     0,
//! )?;
//! ```

pub mod error;
pub mod flags;
pub mod limits;
pub mod ops_arithmetic;
pub mod ops_crypto;
pub mod ops_data;
pub mod ops_flow;
pub mod ops_stack;
pub mod parsed_opcode;
pub mod scriptnum;
pub mod stack;
pub mod thread;

pub use error::{ErrorKind, InterpreterError};
pub use flags::ScriptFlags;
pub use parsed_opcode::{ParsedOpcode, ParsedScript};
pub use scriptnum::ScriptNumber;
pub use stack::Stack;

use crate::Script;
use thread::Thread;

/// Transaction context trait - the signature-verification oracle.
///
/// Implementors hold the spending transaction and answer the queries
/// the interpreter cannot compute itself. The interpreter assumes every
/// method is a pure function of its inputs, so results may be memoized.
pub trait TxContext {
    /// Verify a signature against a public key for the given input.
    ///
    /// `sig` includes the trailing sighash-type byte. `script_code` is
    /// the portion of the script being evaluated that is committed to
    /// by the signature hash.
    fn verify_signature(
        &self,
        sig: &[u8],
        pubkey: &[u8],
        script_code: &Script,
        input_idx: usize,
    ) -> bool;

    /// The transaction lock time.
    fn lock_time(&self) -> u32;

    /// The transaction version.
    fn tx_version(&self) -> u32;

    /// The sequence number of the given input.
    fn input_sequence(&self, input_idx: usize) -> u32;
}

/// The script execution engine.
pub struct Engine;

impl Engine {
    pub fn new() -> Self {
        Engine
    }

    /// Execute an unlocking + locking script pair.
    ///
    /// # Arguments
    /// * `unlocking_script` - The input's unlocking (signature) script.
    /// * `locking_script` - The output's locking script.
    /// * `witness` - The input's witness stack (empty when not a
    ///   segwit spend).
    /// * `flags` - Verification flags.
    /// * `tx_context` - Optional transaction context for signature and
    ///   locktime operations.
    /// * `input_idx` - The input index being verified.
    pub fn execute(
        &self,
        unlocking_script: &Script,
        locking_script: &Script,
        witness: &[Vec<u8>],
        flags: ScriptFlags,
        tx_context: Option<&dyn TxContext>,
        input_idx: usize,
    ) -> Result<(), InterpreterError> {
        let mut thread = Thread::new(
            unlocking_script,
            locking_script,
            witness,
            flags,
            tx_context,
            input_idx,
        )?;
        thread.execute()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
