//! Bitcoin protocol library - hash primitives and Base58Check encoding.
//!
//! This crate provides the foundational building blocks consumed by the
//! script and address layers:
//! - Hash functions (SHA-256, SHA-256d, RIPEMD-160, SHA-1, Hash160)
//! - Base58 and Base58Check encoding/decoding

pub mod base58;
pub mod hash;

mod error;
pub use error::PrimitivesError;
