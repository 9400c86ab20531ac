//! Base58 and Base58Check codecs.
//!
//! Legacy addresses serialize through Bitcoin's 58-character alphabet,
//! which drops 0, O, I, and l to keep hand-copied strings unambiguous.
//! The alphabet conversion is delegated to the `bs58` crate; the
//! Check variant's four-byte double-SHA-256 checksum discipline lives
//! here.

use crate::hash::sha256d;
use crate::PrimitivesError;

/// Number of checksum bytes appended by the Check variant.
const CHECKSUM_LEN: usize = 4;

/// Encode bytes with Bitcoin's Base58 alphabet.
///
/// Each leading zero byte becomes a leading '1' character.
pub fn encode(data: &[u8]) -> String {
    bs58::encode(data)
        .with_alphabet(bs58::Alphabet::BITCOIN)
        .into_string()
}

/// Decode a Base58 string into bytes.
///
/// # Returns
/// The decoded bytes, or `InvalidBase58` when the input contains a
/// character outside the alphabet.
pub fn decode(s: &str) -> Result<Vec<u8>, PrimitivesError> {
    bs58::decode(s)
        .with_alphabet(bs58::Alphabet::BITCOIN)
        .into_vec()
        .map_err(|e| PrimitivesError::InvalidBase58(e.to_string()))
}

/// Base58Check-encode: append the first four bytes of SHA-256d(data)
/// and encode the whole thing.
///
/// `data` is conventionally a version byte followed by the payload.
pub fn check_encode(data: &[u8]) -> String {
    let mut buf = Vec::with_capacity(data.len() + CHECKSUM_LEN);
    buf.extend_from_slice(data);
    buf.extend_from_slice(&sha256d(data)[..CHECKSUM_LEN]);
    encode(&buf)
}

/// Decode a Base58Check string, stripping and verifying the trailing
/// checksum.
///
/// # Returns
/// The payload without its checksum; `ChecksumMismatch` when the
/// trailing four bytes disagree with SHA-256d of the payload, or
/// `InvalidBase58` for strings too short to carry a checksum at all.
pub fn check_decode(s: &str) -> Result<Vec<u8>, PrimitivesError> {
    let mut decoded = decode(s)?;
    if decoded.len() < CHECKSUM_LEN {
        return Err(PrimitivesError::InvalidBase58(format!(
            "{} decoded bytes cannot carry a checksum",
            decoded.len()
        )));
    }
    let checksum = decoded.split_off(decoded.len() - CHECKSUM_LEN);
    if checksum != sha256d(&decoded)[..CHECKSUM_LEN] {
        return Err(PrimitivesError::ChecksumMismatch);
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Raw Base58
    // -----------------------------------------------------------------------

    /// Encode/decode agree with the reference pairs both ways.
    #[test]
    fn test_known_pairs() {
        let pairs: &[(&str, &str)] = &[
            ("", ""),
            ("61", "2g"),
            ("626262", "a3gV"),
            ("636363", "aPEr"),
            ("516b6fcd0f", "ABnLTmg"),
            ("572e4794", "3EFU7m"),
            ("10c8511e", "Rt5zm"),
            ("73696d706c792061206c6f6e6720737472696e67", "2cFupjhnEsSn59qHXstmK2ffpLv2"),
        ];
        for (hex_in, b58) in pairs {
            let raw = hex::decode(hex_in).expect("valid hex");
            assert_eq!(&encode(&raw), b58, "encode {}", hex_in);
            assert_eq!(&decode(b58).expect("valid base58"), &raw, "decode {}", b58);
        }
    }

    /// Zero bytes map one-for-one onto '1' characters.
    #[test]
    fn test_zero_prefix_preserved() {
        assert_eq!(encode(&[0u8; 10]), "1111111111");
        assert_eq!(decode("1111111111").expect("valid base58"), vec![0u8; 10]);

        // zeros followed by data keep their count
        let raw = hex::decode("000000fd3c").expect("valid hex");
        let encoded = encode(&raw);
        assert!(encoded.starts_with("111"));
        assert_eq!(decode(&encoded).expect("valid base58"), raw);
    }

    /// The four excluded look-alike characters are rejected.
    #[test]
    fn test_excluded_characters_rejected() {
        for bad in ["0", "O", "I", "l", "Rt5zm!"] {
            assert!(decode(bad).is_err(), "{:?} should not decode", bad);
        }
    }

    // -----------------------------------------------------------------------
    // Base58Check
    // -----------------------------------------------------------------------

    /// The genesis coinbase key hash under both network version bytes
    /// yields the documented address strings.
    #[test]
    fn test_check_encode_known_addresses() {
        let hash = hex::decode("62e907b15cbf27d5425399ebf6f0fb50ebb88f18").expect("valid hex");

        let mut mainnet = vec![0x00];
        mainnet.extend_from_slice(&hash);
        assert_eq!(check_encode(&mainnet), "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa");

        let mut testnet = vec![0x6f];
        testnet.extend_from_slice(&hash);
        assert_eq!(check_encode(&testnet), "mpXwg4jMtRhuSpVq4xS3HFHmCmWp9NyGKt");
    }

    /// check_decode returns the payload check_encode was given.
    #[test]
    fn test_check_roundtrip() {
        let payload = hex::decode("05748284390f9e263a4b766a75d0633c50426eb875").expect("valid hex");
        let decoded = check_decode(&check_encode(&payload)).expect("checksum holds");
        assert_eq!(decoded, payload);
    }

    /// One flipped character anywhere invalidates the checksum.
    #[test]
    fn test_check_detects_corruption() {
        let encoded = check_encode(&[0x00, 0xde, 0xad, 0xbe, 0xef]);
        let mut chars: Vec<char> = encoded.chars().collect();
        let mid = chars.len() / 2;
        chars[mid] = if chars[mid] == '2' { '3' } else { '2' };
        let corrupted: String = chars.into_iter().collect();
        assert!(matches!(
            check_decode(&corrupted),
            Err(PrimitivesError::ChecksumMismatch)
        ));
    }

    /// Fewer than four decoded bytes is rejected before any checksum
    /// comparison.
    #[test]
    fn test_check_decode_too_short() {
        assert!(matches!(
            check_decode("2g"),
            Err(PrimitivesError::InvalidBase58(_))
        ));
    }
}
