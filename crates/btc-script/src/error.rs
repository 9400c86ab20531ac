/// Error types for script parsing and construction.
///
/// Covers chunk decoding failures, ASM parsing, and script
/// classification problems. Interpreter verdicts have their own type in
/// [`crate::interpreter::InterpreterError`].
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// An unrecognized token was encountered during ASM parsing.
    #[error("invalid opcode data")]
    InvalidOpcodeData,

    /// Attempted to use append_opcodes for a push data opcode.
    #[error("use append_push_data for push data opcodes: {0}")]
    InvalidOpcodeType(String),

    /// Hex decoding error.
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    /// Script is empty when a non-empty script was expected.
    #[error("script is empty")]
    EmptyScript,

    /// Script does not match the expected output template.
    #[error("script is not a {0} output")]
    TemplateMismatch(&'static str),

    /// Not enough data in the script to complete a push operation.
    #[error("not enough data")]
    DataTooSmall,

    /// Push data exceeds the maximum encodable size.
    #[error("data too big")]
    DataTooBig,

    /// A push data part exceeds protocol limits.
    #[error("part too big '{0}'")]
    PartTooBig(usize),
}
