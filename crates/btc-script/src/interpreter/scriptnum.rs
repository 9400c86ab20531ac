//! Stack-resident numbers with Bitcoin consensus encoding.
//!
//! Numbers on the stack are little-endian, sign-magnitude byte arrays
//! with the sign bit in the most significant bit of the last byte. The
//! empty array encodes zero. Numeric opcodes read at most 4 bytes, so
//! every decodable operand fits an `i64`; results are range-checked
//! back into the 4-byte interval before they are pushed.

use super::error::{ErrorKind, InterpreterError};

/// The largest value a numeric opcode may produce or consume.
const NUM_MAX: i64 = i32::MAX as i64;

/// A script number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScriptNumber(i64);

impl ScriptNumber {
    /// Wrap a raw value without range checking.
    ///
    /// Used for values the interpreter produces itself (stack depths,
    /// element sizes, booleans) that are known to be in range.
    pub fn new(value: i64) -> Self {
        ScriptNumber(value)
    }

    /// Wrap an arithmetic result, failing if it overflows the 4-byte
    /// interval `[-(2^31-1), 2^31-1]`.
    pub fn checked(value: i64) -> Result<Self, InterpreterError> {
        if !(-NUM_MAX..=NUM_MAX).contains(&value) {
            return Err(InterpreterError::new(
                ErrorKind::ScriptError,
                format!("arithmetic result {} overflows 4 bytes", value),
            ));
        }
        Ok(ScriptNumber(value))
    }

    /// Parse a byte array into a ScriptNumber.
    ///
    /// # Arguments
    /// * `bytes` - The little-endian sign-magnitude encoding.
    /// * `max_len` - Maximum accepted byte length (4 for arithmetic,
    ///   5 for lock times).
    /// * `require_minimal` - Reject non-minimal encodings.
    pub fn from_bytes(
        bytes: &[u8],
        max_len: usize,
        require_minimal: bool,
    ) -> Result<Self, InterpreterError> {
        if bytes.len() > max_len {
            return Err(InterpreterError::new(
                ErrorKind::ScriptError,
                format!(
                    "numeric value encoded as {:02x?} is {} bytes which exceeds the max allowed of {}",
                    bytes,
                    bytes.len(),
                    max_len
                ),
            ));
        }

        if require_minimal {
            check_minimal_encoding(bytes)?;
        }

        if bytes.is_empty() {
            return Ok(ScriptNumber(0));
        }

        // Little endian magnitude with a sign bit in the top byte.
        let mut v: i64 = 0;
        for (i, &b) in bytes.iter().enumerate() {
            v |= (b as i64) << (8 * i);
        }
        if bytes[bytes.len() - 1] & 0x80 != 0 {
            let mask = !(0x80i64 << (8 * (bytes.len() - 1)));
            v = -(v & mask);
        }

        Ok(ScriptNumber(v))
    }

    /// Serialize the number minimally: little-endian magnitude with the
    /// sign bit in the last byte; zero encodes as the empty array.
    pub fn to_bytes(&self) -> Vec<u8> {
        if self.0 == 0 {
            return vec![];
        }

        let negative = self.0 < 0;
        let mut magnitude = self.0.unsigned_abs();
        let mut result = Vec::new();
        while magnitude > 0 {
            result.push((magnitude & 0xff) as u8);
            magnitude >>= 8;
        }

        // If the top magnitude bit is set, the sign needs its own byte.
        let last = result.len() - 1;
        if result[last] & 0x80 != 0 {
            result.push(if negative { 0x80 } else { 0x00 });
        } else if negative {
            result[last] |= 0x80;
        }

        result
    }

    /// The numeric value.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Return true if this number is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

/// Check that a byte array is the minimal encoding of its value.
///
/// An encoding is non-minimal when the last byte carries no information:
/// its low seven bits are zero and the sign bit could have lived on the
/// previous byte.
pub fn check_minimal_encoding(bytes: &[u8]) -> Result<(), InterpreterError> {
    if bytes.is_empty() {
        return Ok(());
    }
    if bytes[bytes.len() - 1] & 0x7f == 0 {
        if bytes.len() == 1 || bytes[bytes.len() - 2] & 0x80 == 0 {
            return Err(InterpreterError::new(
                ErrorKind::MinimalData,
                format!("numeric value encoded as {:02x?} is not minimally encoded", bytes),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex_to_bytes(s: &str) -> Vec<u8> {
        hex::decode(s).expect("valid hex")
    }

    /// Serialization vectors across the full representable range.
    #[test]
    fn test_script_num_bytes() {
        let tests: Vec<(i64, Vec<u8>)> = vec![
            (0, vec![]),
            (1, hex_to_bytes("01")),
            (-1, hex_to_bytes("81")),
            (127, hex_to_bytes("7f")),
            (-127, hex_to_bytes("ff")),
            (128, hex_to_bytes("8000")),
            (-128, hex_to_bytes("8080")),
            (129, hex_to_bytes("8100")),
            (-129, hex_to_bytes("8180")),
            (256, hex_to_bytes("0001")),
            (-256, hex_to_bytes("0081")),
            (32767, hex_to_bytes("ff7f")),
            (-32767, hex_to_bytes("ffff")),
            (32768, hex_to_bytes("008000")),
            (-32768, hex_to_bytes("008080")),
            (65535, hex_to_bytes("ffff00")),
            (-65535, hex_to_bytes("ffff80")),
            (524288, hex_to_bytes("000008")),
            (-524288, hex_to_bytes("000088")),
            (7340032, hex_to_bytes("000070")),
            (-7340032, hex_to_bytes("0000f0")),
            (8388608, hex_to_bytes("00008000")),
            (-8388608, hex_to_bytes("00008080")),
            (2147483647, hex_to_bytes("ffffff7f")),
            (-2147483647, hex_to_bytes("ffffffff")),
        ];

        for (num, expected) in &tests {
            let got = ScriptNumber::new(*num).to_bytes();
            assert_eq!(
                &got, expected,
                "to_bytes: num={}, got={:02x?}, want={:02x?}",
                num, got, expected
            );
        }
    }

    /// Parsing vectors, including minimal-encoding rejections.
    #[test]
    fn test_make_script_num() {
        struct Test {
            serialized: Vec<u8>,
            num: i64,
            max_len: usize,
            minimal: bool,
            expect_err: bool,
        }

        let tests = vec![
            // Minimal encoding rejects negative zero
            Test { serialized: hex_to_bytes("80"), num: 0, max_len: 4, minimal: true, expect_err: true },
            // Valid minimally encoded values
            Test { serialized: vec![], num: 0, max_len: 4, minimal: true, expect_err: false },
            Test { serialized: hex_to_bytes("01"), num: 1, max_len: 4, minimal: true, expect_err: false },
            Test { serialized: hex_to_bytes("81"), num: -1, max_len: 4, minimal: true, expect_err: false },
            Test { serialized: hex_to_bytes("7f"), num: 127, max_len: 4, minimal: true, expect_err: false },
            Test { serialized: hex_to_bytes("ff"), num: -127, max_len: 4, minimal: true, expect_err: false },
            Test { serialized: hex_to_bytes("8000"), num: 128, max_len: 4, minimal: true, expect_err: false },
            Test { serialized: hex_to_bytes("8080"), num: -128, max_len: 4, minimal: true, expect_err: false },
            Test { serialized: hex_to_bytes("0001"), num: 256, max_len: 4, minimal: true, expect_err: false },
            Test { serialized: hex_to_bytes("0081"), num: -256, max_len: 4, minimal: true, expect_err: false },
            Test { serialized: hex_to_bytes("ffffff7f"), num: 2147483647, max_len: 4, minimal: true, expect_err: false },
            Test { serialized: hex_to_bytes("ffffffff"), num: -2147483647, max_len: 4, minimal: true, expect_err: false },
            // Five-byte lock times
            Test { serialized: hex_to_bytes("ffffffff7f"), num: 549755813887, max_len: 5, minimal: true, expect_err: false },
            Test { serialized: hex_to_bytes("ffffffffff"), num: -549755813887, max_len: 5, minimal: true, expect_err: false },
            // Out of range for 4-byte operands
            Test { serialized: hex_to_bytes("0000008000"), num: 0, max_len: 4, minimal: true, expect_err: true },
            // Non-minimal encodings with the flag set
            Test { serialized: hex_to_bytes("00"), num: 0, max_len: 4, minimal: true, expect_err: true },
            Test { serialized: hex_to_bytes("0100"), num: 0, max_len: 4, minimal: true, expect_err: true },
            // The same encodings without the flag are tolerated
            Test { serialized: hex_to_bytes("00"), num: 0, max_len: 4, minimal: false, expect_err: false },
            Test { serialized: hex_to_bytes("0100"), num: 1, max_len: 4, minimal: false, expect_err: false },
        ];

        for test in &tests {
            let result = ScriptNumber::from_bytes(&test.serialized, test.max_len, test.minimal);
            match result {
                Ok(sn) => {
                    assert!(
                        !test.expect_err,
                        "from_bytes({:02x?}): expected error",
                        test.serialized
                    );
                    assert_eq!(
                        sn.value(),
                        test.num,
                        "from_bytes({:02x?}): got {}, want {}",
                        test.serialized,
                        sn.value(),
                        test.num
                    );
                }
                Err(_) => {
                    assert!(
                        test.expect_err,
                        "from_bytes({:02x?}): unexpected error",
                        test.serialized
                    );
                }
            }
        }
    }

    /// Encode then decode is the identity across the boundary values.
    #[test]
    fn test_roundtrip_boundaries() {
        for v in [0i64, 1, -1, 127, -127, 128, -128, 2147483647, -2147483647] {
            let bytes = ScriptNumber::new(v).to_bytes();
            let back = ScriptNumber::from_bytes(&bytes, 4, true).expect("should decode");
            assert_eq!(back.value(), v);
        }
    }

    /// checked() enforces the 4-byte result interval.
    #[test]
    fn test_checked_overflow() {
        assert!(ScriptNumber::checked(i32::MAX as i64).is_ok());
        assert!(ScriptNumber::checked(-(i32::MAX as i64)).is_ok());
        assert!(ScriptNumber::checked(i32::MAX as i64 + 1).is_err());
        assert!(ScriptNumber::checked(i32::MIN as i64).is_err());
    }

    /// Minimal-encoding checker accepts sign-carrying final bytes.
    #[test]
    fn test_check_minimal_encoding() {
        assert!(check_minimal_encoding(&[]).is_ok());
        assert!(check_minimal_encoding(&[0x7f]).is_ok());
        // 0x80 alone is negative zero
        assert!(check_minimal_encoding(&[0x80]).is_err());
        // trailing zero byte after a byte without its high bit
        assert!(check_minimal_encoding(&[0x01, 0x00]).is_err());
        // trailing sign byte is required when the magnitude uses bit 7
        assert!(check_minimal_encoding(&[0x80, 0x00]).is_ok());
        assert!(check_minimal_encoding(&[0x80, 0x80]).is_ok());
    }
}
