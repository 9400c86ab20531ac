//! Bitcoin address handling.
//!
//! Supports P2PKH and P2SH addresses (Base58Check with SHA-256d
//! checksums) and segwit addresses (Bech32 per BIP173), with
//! mainnet/testnet discrimination and conversion to the matching
//! locking-script template.

use std::fmt;
use std::str::FromStr;

use btc_primitives::base58;
use btc_primitives::hash::hash160;
use btc_primitives::PrimitivesError;

use crate::bech32::{self, Bech32Error};
use crate::opcodes::small_int_op;
use crate::{Script, ScriptPubKey};

/// Mainnet P2PKH address version byte.
const MAINNET_P2PKH: u8 = 0x00;
/// Mainnet P2SH address version byte.
const MAINNET_P2SH: u8 = 0x05;
/// Testnet P2PKH address version byte.
const TESTNET_P2PKH: u8 = 0x6f;
/// Testnet P2SH address version byte.
const TESTNET_P2SH: u8 = 0xc4;

/// Mainnet Bech32 human-readable part.
const MAINNET_HRP: &str = "bc";
/// Testnet/regtest Bech32 human-readable part.
const TESTNET_HRP: &str = "tb";

/// Bitcoin network type for address prefix selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Network {
    /// Bitcoin mainnet (Base58 prefixes '1'/'3', HRP "bc").
    Mainnet,
    /// Bitcoin testnet and regtest (prefixes 'm'/'n'/'2', HRP "tb").
    Testnet,
}

impl Network {
    fn hrp(self) -> &'static str {
        match self {
            Network::Mainnet => MAINNET_HRP,
            Network::Testnet => TESTNET_HRP,
        }
    }
}

/// Errors raised while parsing or constructing an address.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AddressError {
    /// The string is not valid Base58 (bad character or length).
    #[error("bad base58: {0}")]
    BadBase58(String),

    /// The Base58Check checksum did not verify.
    #[error("base58 checksum mismatch")]
    BadChecksum,

    /// The version byte matches no known address type.
    #[error("unknown address version byte {0:#04x}")]
    UnknownVersion(u8),

    /// A character outside the Bech32 alphabet or a malformed data part.
    #[error("bad bech32 character")]
    BadBech32Charset,

    /// The Bech32 checksum did not verify.
    #[error("bech32 checksum mismatch")]
    BadBech32Checksum,

    /// The Bech32 string mixes upper and lower case.
    #[error("mixed-case bech32 string")]
    MixedCase,

    /// The human-readable part matches no known network.
    #[error("unknown bech32 prefix '{0}'")]
    HrpUnknown(String),

    /// The witness program length is illegal for its version.
    #[error("invalid witness program length {0}")]
    ProgramLength(usize),

    /// The witness version is outside 0..=16.
    #[error("witness version {0} out of range")]
    WitnessVersionOutOfRange(u8),
}

impl From<PrimitivesError> for AddressError {
    fn from(e: PrimitivesError) -> Self {
        match e {
            PrimitivesError::InvalidBase58(msg) => AddressError::BadBase58(msg),
            PrimitivesError::ChecksumMismatch => AddressError::BadChecksum,
        }
    }
}

impl From<Bech32Error> for AddressError {
    fn from(e: Bech32Error) -> Self {
        match e {
            Bech32Error::BadChecksum => AddressError::BadBech32Checksum,
            Bech32Error::MixedCase => AddressError::MixedCase,
            Bech32Error::BadCharset | Bech32Error::BadPadding => AddressError::BadBech32Charset,
        }
    }
}

/// A Bitcoin address.
///
/// Base58Check forms carry a 20-byte hash160 payload; Bech32 forms carry
/// a witness version and program. Round-tripping through the string form
/// yields an equal value, and `script_pubkey` produces the byte-exact
/// locking template for each variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Address {
    /// Pay-to-public-key-hash, Base58Check versions 0x00 / 0x6f.
    P2pkh {
        network: Network,
        pubkey_hash: [u8; 20],
    },
    /// Pay-to-script-hash, Base58Check versions 0x05 / 0xc4.
    P2sh {
        network: Network,
        script_hash: [u8; 20],
    },
    /// Native segwit, Bech32 over "bc" / "tb".
    Bech32 {
        network: Network,
        version: u8,
        program: Vec<u8>,
    },
}

impl Address {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// Create a P2PKH address from a 20-byte public key hash.
    pub fn p2pkh(pubkey_hash: [u8; 20], network: Network) -> Self {
        Address::P2pkh {
            network,
            pubkey_hash,
        }
    }

    /// Create a P2PKH address from raw public key bytes (hash160 applied).
    pub fn from_pubkey(pubkey: &[u8], network: Network) -> Self {
        Address::P2pkh {
            network,
            pubkey_hash: hash160(pubkey),
        }
    }

    /// Create a P2SH address from a 20-byte script hash.
    pub fn p2sh(script_hash: [u8; 20], network: Network) -> Self {
        Address::P2sh {
            network,
            script_hash,
        }
    }

    /// Create a P2SH address for a redeem script (hash160 applied).
    pub fn p2sh_of_script(redeem_script: &Script, network: Network) -> Self {
        Address::P2sh {
            network,
            script_hash: hash160(redeem_script.to_bytes()),
        }
    }

    /// Create a P2WPKH address from a 20-byte key hash.
    pub fn p2wpkh(program: [u8; 20], network: Network) -> Self {
        Address::Bech32 {
            network,
            version: 0,
            program: program.to_vec(),
        }
    }

    /// Create a P2WSH address from a 32-byte script hash (SHA-256).
    pub fn p2wsh(program: [u8; 32], network: Network) -> Self {
        Address::Bech32 {
            network,
            version: 0,
            program: program.to_vec(),
        }
    }

    /// Create a segwit address for an arbitrary witness version.
    ///
    /// Version 0 programs must be exactly 20 or 32 bytes; versions 1..=16
    /// accept programs of 2..=40 bytes.
    pub fn witness(version: u8, program: Vec<u8>, network: Network) -> Result<Self, AddressError> {
        validate_witness(version, &program)?;
        Ok(Address::Bech32 {
            network,
            version,
            program,
        })
    }

    // -----------------------------------------------------------------------
    // Parsing
    // -----------------------------------------------------------------------

    /// Parse an address from its text form.
    ///
    /// Strings whose prefix (up to the last '1') is a known Bech32 HRP
    /// take the Bech32 path; everything else is treated as Base58Check.
    ///
    /// # Arguments
    /// * `s` - The address string.
    ///
    /// # Returns
    /// An `Address`, or an `AddressError` describing the first defect.
    pub fn from_string(s: &str) -> Result<Self, AddressError> {
        if let Some(sep) = s.rfind('1') {
            let prefix = s[..sep].to_ascii_lowercase();
            if prefix == MAINNET_HRP || prefix == TESTNET_HRP {
                return Self::from_bech32(s);
            }
        }
        Self::from_base58check(s)
    }

    fn from_base58check(s: &str) -> Result<Self, AddressError> {
        let payload = base58::check_decode(s)?;
        if payload.len() != 21 {
            return Err(AddressError::BadBase58(format!(
                "payload is {} bytes, expected 21",
                payload.len()
            )));
        }
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&payload[1..]);
        match payload[0] {
            MAINNET_P2PKH => Ok(Address::p2pkh(hash, Network::Mainnet)),
            TESTNET_P2PKH => Ok(Address::p2pkh(hash, Network::Testnet)),
            MAINNET_P2SH => Ok(Address::p2sh(hash, Network::Mainnet)),
            TESTNET_P2SH => Ok(Address::p2sh(hash, Network::Testnet)),
            v => Err(AddressError::UnknownVersion(v)),
        }
    }

    fn from_bech32(s: &str) -> Result<Self, AddressError> {
        let (hrp, version, program) = bech32::decode(s)?;
        let network = match hrp.as_str() {
            MAINNET_HRP => Network::Mainnet,
            TESTNET_HRP => Network::Testnet,
            _ => return Err(AddressError::HrpUnknown(hrp)),
        };
        validate_witness(version, &program)?;
        Ok(Address::Bech32 {
            network,
            version,
            program,
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The network this address belongs to.
    pub fn network(&self) -> Network {
        match self {
            Address::P2pkh { network, .. }
            | Address::P2sh { network, .. }
            | Address::Bech32 { network, .. } => *network,
        }
    }

    /// Build the locking script this address pays to.
    ///
    /// P2PKH and P2SH produce their Base58 templates; Bech32 produces the
    /// witness program script `OP_n <program>`.
    pub fn script_pubkey(&self) -> Script {
        match self {
            Address::P2pkh { pubkey_hash, .. } => ScriptPubKey::pay_to_pubkey_hash(pubkey_hash),
            Address::P2sh { script_hash, .. } => ScriptPubKey::pay_to_script_hash(script_hash),
            Address::Bech32 {
                version, program, ..
            } => {
                let mut bytes = Vec::with_capacity(2 + program.len());
                // Witness version and program length both fit a single
                // byte; validate_witness has already bounded them.
                bytes.push(small_int_op(*version).unwrap_or(0));
                bytes.push(program.len() as u8);
                bytes.extend_from_slice(program);
                Script::from_bytes(&bytes)
            }
        }
    }
}

fn validate_witness(version: u8, program: &[u8]) -> Result<(), AddressError> {
    if version > 16 {
        return Err(AddressError::WitnessVersionOutOfRange(version));
    }
    if version == 0 {
        if program.len() != 20 && program.len() != 32 {
            return Err(AddressError::ProgramLength(program.len()));
        }
    } else if !(2..=40).contains(&program.len()) {
        return Err(AddressError::ProgramLength(program.len()));
    }
    Ok(())
}

impl fmt::Display for Address {
    /// Display the address in its canonical text form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::P2pkh {
                network,
                pubkey_hash,
            } => {
                let version = match network {
                    Network::Mainnet => MAINNET_P2PKH,
                    Network::Testnet => TESTNET_P2PKH,
                };
                let mut payload = Vec::with_capacity(21);
                payload.push(version);
                payload.extend_from_slice(pubkey_hash);
                write!(f, "{}", base58::check_encode(&payload))
            }
            Address::P2sh {
                network,
                script_hash,
            } => {
                let version = match network {
                    Network::Mainnet => MAINNET_P2SH,
                    Network::Testnet => TESTNET_P2SH,
                };
                let mut payload = Vec::with_capacity(21);
                payload.push(version);
                payload.extend_from_slice(script_hash);
                write!(f, "{}", base58::check_encode(&payload))
            }
            Address::Bech32 {
                network,
                version,
                program,
            } => {
                let encoded =
                    bech32::encode(network.hrp(), *version, program).map_err(|_| fmt::Error)?;
                write!(f, "{}", encoded)
            }
        }
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_string(s)
    }
}
