//! Bech32 (BIP173) encoding and decoding for segwit addresses.
//!
//! A Bech32 string is `hrp '1' data checksum` where the data part is a
//! base32 rendition of the witness version followed by the 5-bit
//! regrouped witness program, and the checksum is six symbols of a BCH
//! code over GF(32). Encoded output is lowercase; decoding accepts a
//! string that is entirely lowercase or entirely uppercase, never mixed.

use std::fmt;

/// The 32-character Bech32 alphabet.
const CHARSET: &[u8] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// BCH generator constants for the checksum polymod.
const GENERATORS: [u32; 5] = [0x3b6a57b2, 0x26508e6d, 0x1ea119fa, 0x3d4233dd, 0x2a1462b3];

/// Maximum total length of an encoded Bech32 string.
const MAX_LENGTH: usize = 90;
/// Minimum total length (1-char hrp + separator + checksum).
const MIN_LENGTH: usize = 8;

/// Errors raised by the Bech32 codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bech32Error {
    /// A character outside the Bech32 alphabet (or a malformed HRP /
    /// missing separator / out-of-range length).
    BadCharset,
    /// The six-symbol BCH checksum did not verify.
    BadChecksum,
    /// The string mixes upper and lower case.
    MixedCase,
    /// The 5-bit groups do not regroup into whole bytes (illegal padding).
    BadPadding,
}

impl fmt::Display for Bech32Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bech32Error::BadCharset => write!(f, "invalid bech32 character"),
            Bech32Error::BadChecksum => write!(f, "bech32 checksum mismatch"),
            Bech32Error::MixedCase => write!(f, "mixed-case bech32 string"),
            Bech32Error::BadPadding => write!(f, "invalid bech32 padding"),
        }
    }
}

impl std::error::Error for Bech32Error {}

/// The BCH checksum polynomial evaluation over GF(32).
fn polymod(values: &[u8]) -> u32 {
    let mut chk: u32 = 1;
    for &v in values {
        let top = chk >> 25;
        chk = ((chk & 0x1ffffff) << 5) ^ (v as u32);
        for (i, &gen) in GENERATORS.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= gen;
            }
        }
    }
    chk
}

/// Expand a human-readable part for checksum computation:
/// high bits of each character, a zero separator, then the low bits.
fn hrp_expand(hrp: &str) -> Vec<u8> {
    let bytes = hrp.as_bytes();
    let mut out = Vec::with_capacity(bytes.len() * 2 + 1);
    out.extend(bytes.iter().map(|c| c >> 5));
    out.push(0);
    out.extend(bytes.iter().map(|c| c & 31));
    out
}

/// Verify the checksum of an hrp + data-part combination.
pub fn verify_checksum(hrp: &str, data: &[u8]) -> bool {
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(data);
    polymod(&values) == 1
}

/// Compute the six checksum symbols for an hrp + data-part combination.
fn create_checksum(hrp: &str, data: &[u8]) -> [u8; 6] {
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(data);
    values.extend_from_slice(&[0; 6]);
    let m = polymod(&values) ^ 1;
    let mut checksum = [0u8; 6];
    for (i, c) in checksum.iter_mut().enumerate() {
        *c = ((m >> (5 * (5 - i))) & 31) as u8;
    }
    checksum
}

/// Regroup a bit stream from `from`-bit groups to `to`-bit groups.
///
/// With `pad` set, a final partial group is zero-filled (encoding
/// direction). Without it, leftover bits must be zero and fewer than
/// `from` bits, otherwise the input is rejected (decoding direction).
pub fn convert_bits(data: &[u8], from: u32, to: u32, pad: bool) -> Result<Vec<u8>, Bech32Error> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut out = Vec::new();
    let maxv: u32 = (1 << to) - 1;
    for &value in data {
        if (value as u32) >> from != 0 {
            return Err(Bech32Error::BadCharset);
        }
        acc = (acc << from) | value as u32;
        bits += from;
        while bits >= to {
            bits -= to;
            out.push(((acc >> bits) & maxv) as u8);
        }
    }
    if pad {
        if bits > 0 {
            out.push(((acc << (to - bits)) & maxv) as u8);
        }
    } else if bits >= from || ((acc << (to - bits)) & maxv) != 0 {
        return Err(Bech32Error::BadPadding);
    }
    Ok(out)
}

/// Encode a witness version and program as a Bech32 address string.
///
/// # Arguments
/// * `hrp` - The human-readable part ("bc" or "tb").
/// * `version` - The witness version, 0..=16.
/// * `program` - The witness program bytes.
///
/// # Returns
/// The lowercase Bech32 string.
pub fn encode(hrp: &str, version: u8, program: &[u8]) -> Result<String, Bech32Error> {
    if version > 31 {
        return Err(Bech32Error::BadCharset);
    }
    let mut data = vec![version];
    data.extend(convert_bits(program, 8, 5, true)?);
    let checksum = create_checksum(hrp, &data);

    let mut out = String::with_capacity(hrp.len() + 1 + data.len() + 6);
    out.push_str(hrp);
    out.push('1');
    for &d in data.iter().chain(checksum.iter()) {
        out.push(CHARSET[d as usize] as char);
    }
    if out.len() > MAX_LENGTH {
        return Err(Bech32Error::BadCharset);
    }
    Ok(out)
}

/// Decode a Bech32 address string.
///
/// Verifies charset, case uniformity, length bounds, and the checksum,
/// then regroups the data part back to 8-bit bytes.
///
/// # Arguments
/// * `s` - The Bech32 string (all-lowercase or all-uppercase).
///
/// # Returns
/// `(hrp, witness_version, program_bytes)` on success.
pub fn decode(s: &str) -> Result<(String, u8, Vec<u8>), Bech32Error> {
    if s.len() < MIN_LENGTH || s.len() > MAX_LENGTH {
        return Err(Bech32Error::BadCharset);
    }

    let has_lower = s.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = s.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(Bech32Error::MixedCase);
    }
    let s = s.to_ascii_lowercase();

    // The separator is the last '1' in the string.
    let sep = s.rfind('1').ok_or(Bech32Error::BadCharset)?;
    if sep == 0 || sep + 7 > s.len() {
        return Err(Bech32Error::BadCharset);
    }
    let hrp = &s[..sep];
    if hrp.bytes().any(|b| !(33..=126).contains(&b)) {
        return Err(Bech32Error::BadCharset);
    }

    let mut data = Vec::with_capacity(s.len() - sep - 1);
    for c in s[sep + 1..].bytes() {
        let v = CHARSET
            .iter()
            .position(|&x| x == c)
            .ok_or(Bech32Error::BadCharset)?;
        data.push(v as u8);
    }

    if !verify_checksum(hrp, &data) {
        return Err(Bech32Error::BadChecksum);
    }

    let payload = &data[..data.len() - 6];
    if payload.is_empty() {
        return Err(Bech32Error::BadCharset);
    }
    let version = payload[0];
    let program = convert_bits(&payload[1..], 5, 8, false)?;

    Ok((hrp.to_string(), version, program))
}

#[cfg(test)]
mod tests {
    //! BIP173 reference vector tests for the Bech32 codec.

    use super::*;

    // -----------------------------------------------------------------------
    // Checksum machinery
    // -----------------------------------------------------------------------

    /// BIP173 valid checksum strings all verify.
    #[test]
    fn test_valid_checksums() {
        for s in [
            "A12UEL5L",
            "an83characterlonghumanreadablepartthatcontainsthenumber1andtheexcludedcharactersbio1tt5tgs",
            "abcdef1qpzry9x8gf2tvdw0s3jn54khce6mua7lmqqqxw",
            "split1checkupstagehandshakeupstreamerranterredcaperred2y9e3w",
        ] {
            let lower = s.to_ascii_lowercase();
            let sep = lower.rfind('1').expect("has separator");
            let hrp = &lower[..sep];
            let data: Vec<u8> = lower[sep + 1..]
                .bytes()
                .map(|c| CHARSET.iter().position(|&x| x == c).expect("in charset") as u8)
                .collect();
            assert!(verify_checksum(hrp, &data), "checksum failed for {}", s);
        }
    }

    /// Flipping any data character breaks the checksum.
    #[test]
    fn test_checksum_detects_corruption() {
        let encoded = encode("bc", 0, &[0x75; 20]).expect("should encode");
        for i in 3..encoded.len() {
            let mut corrupted: Vec<u8> = encoded.bytes().collect();
            corrupted[i] = if corrupted[i] == b'q' { b'p' } else { b'q' };
            let corrupted = String::from_utf8(corrupted).expect("ascii");
            assert!(
                decode(&corrupted).is_err(),
                "corruption at {} not detected: {}",
                i,
                corrupted
            );
        }
    }

    // -----------------------------------------------------------------------
    // Segwit address vectors (BIP173)
    // -----------------------------------------------------------------------

    /// The canonical mainnet P2WPKH example.
    #[test]
    fn test_encode_p2wpkh_mainnet() {
        let program = hex::decode("751e76e8199196d454941c45d1b3a323f1433bd6").expect("valid hex");
        let encoded = encode("bc", 0, &program).expect("should encode");
        assert_eq!(encoded, "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4");
    }

    /// The canonical testnet P2WSH example.
    #[test]
    fn test_encode_p2wsh_testnet() {
        let program = hex::decode(
            "1863143c14c5166804bd19203356da136c985678cd4d27a1b8c6329604903262",
        )
        .expect("valid hex");
        let encoded = encode("tb", 0, &program).expect("should encode");
        assert_eq!(
            encoded,
            "tb1qrp33g0q5c5txsp9arysrx4k6zdkfs4nce4xj0gdcccefvpysxf3q0sl5k7"
        );
    }

    /// Decode reverses encode for the mainnet example.
    #[test]
    fn test_decode_p2wpkh_mainnet() {
        let (hrp, version, program) =
            decode("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4").expect("should decode");
        assert_eq!(hrp, "bc");
        assert_eq!(version, 0);
        assert_eq!(
            hex::encode(program),
            "751e76e8199196d454941c45d1b3a323f1433bd6"
        );
    }

    /// An all-uppercase string decodes to the same value.
    #[test]
    fn test_decode_uppercase() {
        let (hrp, version, program) =
            decode("BC1QW508D6QEJXTDG4Y5R3ZARVARY0C5XW7KV8F3T4").expect("should decode");
        assert_eq!(hrp, "bc");
        assert_eq!(version, 0);
        assert_eq!(program.len(), 20);
    }

    /// Mixed case is rejected.
    #[test]
    fn test_decode_mixed_case() {
        assert_eq!(
            decode("bc1QW508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4"),
            Err(Bech32Error::MixedCase)
        );
    }

    /// A corrupted checksum character is rejected.
    #[test]
    fn test_decode_bad_checksum() {
        assert_eq!(
            decode("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t5"),
            Err(Bech32Error::BadChecksum)
        );
    }

    /// Characters outside the alphabet are rejected.
    #[test]
    fn test_decode_bad_charset() {
        // 'b' is one of the four characters excluded from the alphabet.
        assert!(decode("bc1b508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4").is_err());
        // Embedded spaces are invalid.
        assert!(decode("bc1 w508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4").is_err());
    }

    /// Length bounds are enforced.
    #[test]
    fn test_decode_length_bounds() {
        assert!(decode("a1qqq").is_err());
        let long = format!("bc1{}", "q".repeat(95));
        assert!(decode(&long).is_err());
    }

    // -----------------------------------------------------------------------
    // Bit regrouping
    // -----------------------------------------------------------------------

    /// 8->5->8 bit regrouping round-trips.
    #[test]
    fn test_convert_bits_roundtrip() {
        let data: Vec<u8> = (0u8..=255).collect();
        let five = convert_bits(&data, 8, 5, true).expect("to 5-bit");
        let eight = convert_bits(&five, 5, 8, false).expect("back to 8-bit");
        assert_eq!(eight, data);
    }

    /// Non-zero padding is rejected when decoding.
    #[test]
    fn test_convert_bits_bad_padding() {
        // A single 5-bit group cannot produce any 8-bit byte; its bits
        // must be zero to be legal padding.
        assert!(convert_bits(&[0x1f], 5, 8, false).is_err());
    }
}
