// Payment-proof address formats
//
// Three wire-exact families: onion-v3 style (base32, ed25519 key with
// a truncated SHA3 checksum), MQS style (base58check over a secp
// public key) and slatepack style (bech32 over an ed25519 key).

pub mod base32;
pub mod bech32;

use ed25519_dalek::VerifyingKey;
use sha2::{Digest, Sha256};
use sha3::Sha3_256;

use crate::codec::CompactAddress;
use crate::crypto::PublicKey;
use crate::error::{Error, Result};
use crate::policy::Network;

/// Domain-separation seed the onion checksum is computed over.
const ONION_CHECKSUM_SEED: &[u8] = b".onion checksum";
/// Version byte of the onion address format.
const ONION_VERSION: u8 = 0x03;
/// Encoded length of an onion address: 35 bytes in base32.
const ONION_ADDRESS_LEN: usize = 56;

/// An ed25519 key in the 56-character onion-v3 representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnionAddress {
    pub key: [u8; 32],
}

impl OnionAddress {
    pub fn from_key(key: [u8; 32]) -> Result<Self> {
        VerifyingKey::from_bytes(&key).map_err(|_| Error::InvalidData)?;
        Ok(OnionAddress { key })
    }

    fn checksum(key: &[u8; 32]) -> [u8; 2] {
        let mut hasher = Sha3_256::new();
        hasher.update(ONION_CHECKSUM_SEED);
        hasher.update(key);
        hasher.update([ONION_VERSION]);
        let digest = hasher.finalize();
        [digest[0], digest[1]]
    }

    pub fn encode(&self) -> String {
        let mut raw = Vec::with_capacity(35);
        raw.extend_from_slice(&self.key);
        raw.extend_from_slice(&Self::checksum(&self.key));
        raw.push(ONION_VERSION);
        base32::encode(&raw)
    }

    pub fn decode(s: &str) -> Result<Self> {
        if s.len() != ONION_ADDRESS_LEN {
            return Err(Error::InvalidData);
        }
        let raw = base32::decode(s)?;
        if raw.len() != 35 || raw[34] != ONION_VERSION {
            return Err(Error::InvalidData);
        }
        let key: [u8; 32] = raw[..32].try_into().expect("fixed split");
        if raw[32..34] != Self::checksum(&key) {
            return Err(Error::InvalidData);
        }
        Self::from_key(key)
    }
}

/// A secp public key in the base58check MQS representation. The
/// two-byte version prefix is network-specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MqsAddress {
    pub network: Network,
    pub key: PublicKey,
}

impl MqsAddress {
    fn version(network: Network) -> [u8; 2] {
        if network.is_mainnet() {
            [1, 69]
        } else {
            [1, 121]
        }
    }

    pub fn encode(&self) -> String {
        let mut payload = Vec::with_capacity(2 + 33 + 4);
        payload.extend_from_slice(&Self::version(self.network));
        payload.extend_from_slice(self.key.as_bytes());
        let digest = Sha256::digest(Sha256::digest(&payload));
        payload.extend_from_slice(&digest[..4]);
        bs58::encode(payload).into_string()
    }

    pub fn decode(s: &str, network: Network) -> Result<Self> {
        let raw = bs58::decode(s).into_vec().map_err(|_| Error::InvalidData)?;
        if raw.len() != 2 + 33 + 4 {
            return Err(Error::InvalidData);
        }
        let (payload, checksum) = raw.split_at(raw.len() - 4);
        let digest = Sha256::digest(Sha256::digest(payload));
        if checksum != &digest[..4] {
            return Err(Error::InvalidData);
        }
        if payload[..2] != Self::version(network) {
            return Err(Error::InvalidData);
        }
        Ok(MqsAddress {
            network,
            key: PublicKey::from_slice(&payload[2..])?,
        })
    }
}

/// An ed25519 key in the bech32 slatepack representation used by the
/// grin family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlatepackAddress {
    pub network: Network,
    pub key: [u8; 32],
}

impl SlatepackAddress {
    fn hrp(network: Network) -> &'static str {
        if network.is_mainnet() {
            "grin"
        } else {
            "tgrin"
        }
    }

    pub fn from_key(network: Network, key: [u8; 32]) -> Result<Self> {
        VerifyingKey::from_bytes(&key).map_err(|_| Error::InvalidData)?;
        Ok(SlatepackAddress { network, key })
    }

    pub fn encode(&self) -> Result<String> {
        bech32::encode(Self::hrp(self.network), &self.key)
    }

    pub fn decode(s: &str, network: Network) -> Result<Self> {
        let (hrp, data) = bech32::decode(s)?;
        if hrp != Self::hrp(network) {
            return Err(Error::InvalidData);
        }
        let key: [u8; 32] = data.try_into().map_err(|_| Error::InvalidData)?;
        Self::from_key(network, key)
    }
}

/// Any address a payment proof can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofAddress {
    Onion(OnionAddress),
    Mqs(MqsAddress),
    Slatepack(SlatepackAddress),
}

impl ProofAddress {
    /// Parse any of the three representations, detecting the family
    /// from shape.
    pub fn parse(s: &str, network: Network) -> Result<Self> {
        if s.len() == ONION_ADDRESS_LEN {
            if let Ok(addr) = OnionAddress::decode(s) {
                return Ok(ProofAddress::Onion(addr));
            }
        }
        if s.starts_with("grin1") || s.starts_with("tgrin1") {
            return SlatepackAddress::decode(s, network).map(ProofAddress::Slatepack);
        }
        MqsAddress::decode(s, network).map(ProofAddress::Mqs)
    }

    pub fn encode(&self) -> Result<String> {
        match self {
            ProofAddress::Onion(a) => Ok(a.encode()),
            ProofAddress::Mqs(a) => Ok(a.encode()),
            ProofAddress::Slatepack(a) => a.encode(),
        }
    }

    /// The ed25519 verifying key, for the families that carry one.
    pub fn ed25519_key(&self) -> Option<[u8; 32]> {
        match self {
            ProofAddress::Onion(a) => Some(a.key),
            ProofAddress::Slatepack(a) => Some(a.key),
            ProofAddress::Mqs(_) => None,
        }
    }

    pub fn secp_key(&self) -> Option<PublicKey> {
        match self {
            ProofAddress::Mqs(a) => Some(a.key),
            _ => None,
        }
    }

    /// Down-convert to the compact tier's one-bit-family form.
    pub fn to_compact(&self) -> CompactAddress {
        match self {
            ProofAddress::Onion(a) => CompactAddress::Ed25519(a.key),
            ProofAddress::Slatepack(a) => CompactAddress::Ed25519(a.key),
            ProofAddress::Mqs(a) => CompactAddress::Secp(a.key.0),
        }
    }

    /// Lift a compact-tier address; the ed25519 family maps to the
    /// network's native representation.
    pub fn from_compact(compact: CompactAddress, network: Network) -> Result<Self> {
        match compact {
            CompactAddress::Secp(bytes) => Ok(ProofAddress::Mqs(MqsAddress {
                network,
                key: PublicKey::from_slice(&bytes)?,
            })),
            CompactAddress::Ed25519(key) => {
                if network.is_grin_family() {
                    SlatepackAddress::from_key(network, key).map(ProofAddress::Slatepack)
                } else {
                    OnionAddress::from_key(key).map(ProofAddress::Onion)
                }
            }
        }
    }
}

impl std::fmt::Display for ProofAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.encode() {
            Ok(s) => f.write_str(&s),
            Err(_) => Err(std::fmt::Error),
        }
    }
}
