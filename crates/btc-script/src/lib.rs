//! Bitcoin script parsing, execution, and address handling.
//!
//! Provides the Bitcoin `Script` type, the consensus opcode table, script
//! chunk parsing, output-script classification and templates, Base58Check
//! and Bech32 address codecs, and a full script interpreter engine.

pub mod address;
pub mod bech32;
pub mod chunk;
pub mod interpreter;
pub mod opcodes;
pub mod script;
pub mod script_pubkey;

mod error;
pub use address::{Address, AddressError, Network};
pub use chunk::ScriptChunk;
pub use error::ScriptError;
pub use script::Script;
pub use script_pubkey::ScriptPubKey;
