/// Error types for the primitives crate.
#[derive(Debug, thiserror::Error)]
pub enum PrimitivesError {
    /// Invalid Base58 input (bad character or length).
    #[error("invalid base58: {0}")]
    InvalidBase58(String),

    /// Base58Check checksum does not match the payload.
    #[error("checksum mismatch")]
    ChecksumMismatch,
}
