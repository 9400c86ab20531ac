//! Digest functions used by the script and address layers.
//!
//! Only hashing lives here: SHA-256 and its doubled form, RIPEMD-160,
//! SHA-1, and the HASH160 composition. Elliptic-curve operations are
//! deliberately absent; signature checking happens behind the
//! interpreter's oracle.

use ripemd::Ripemd160;
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// SHA-256 of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Double SHA-256 of `data`: SHA-256(SHA-256(data)).
///
/// This is the digest behind transaction ids, block hashes, and the
/// Base58Check checksum.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// RIPEMD-160 of `data`.
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest);
    out
}

/// SHA-1 of `data`. Kept solely because OP_SHA1 is in the consensus
/// opcode set.
pub fn sha1(data: &[u8]) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest);
    out
}

/// HASH160 of `data`: RIPEMD-160(SHA-256(data)).
///
/// The digest public keys and redeem scripts are reduced to in P2PKH
/// and P2SH outputs.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    ripemd160(&sha256(data))
}
