// Transaction kernel — the proof-of-validity record
//
// The signature is computed over a message derived from the kernel's
// feature data, never over its serialized form. Excess and signature
// stay all-zero until finalization.

use serde::{Deserialize, Serialize};

use crate::codec::{BitReader, BitWriter};
use crate::crypto::{verify_final, Commitment, Signature};
use crate::error::{Error, Result};
use crate::policy::Network;
use crate::ser::{hex_commitment, hex_signature, string_u64};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KernelFeatures {
    Plain,
    Coinbase,
    HeightLocked,
    NoRecentDuplicate,
}

impl KernelFeatures {
    pub fn as_u8(self) -> u8 {
        match self {
            KernelFeatures::Plain => 0,
            KernelFeatures::Coinbase => 1,
            KernelFeatures::HeightLocked => 2,
            KernelFeatures::NoRecentDuplicate => 3,
        }
    }

    pub fn from_u8(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(KernelFeatures::Plain),
            1 => Ok(KernelFeatures::Coinbase),
            2 => Ok(KernelFeatures::HeightLocked),
            3 => Ok(KernelFeatures::NoRecentDuplicate),
            _ => Err(Error::InvalidData),
        }
    }
}

/// Field order matches the legacy JSON layouts (alphabetical).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kernel {
    #[serde(with = "hex_commitment")]
    pub excess: Commitment,
    #[serde(with = "hex_signature")]
    pub excess_sig: Signature,
    pub features: KernelFeatures,
    #[serde(with = "string_u64")]
    pub fee: u64,
    #[serde(with = "string_u64")]
    pub lock_height: u64,
    /// Only meaningful for NoRecentDuplicate kernels; the legacy JSON
    /// tiers cannot carry it.
    #[serde(skip)]
    pub relative_height: u64,
}

impl Kernel {
    /// A bare kernel, as a slate starts with.
    pub fn bare(features: KernelFeatures, fee: u64) -> Self {
        Kernel {
            excess: Commitment::zero(),
            excess_sig: Signature::zero(),
            features,
            fee,
            lock_height: 0,
            relative_height: 0,
        }
    }

    /// A kernel is complete once its signature is installed.
    pub fn is_complete(&self) -> bool {
        !self.excess_sig.is_zero()
    }

    /// The exact message signatures commit to: feature byte, then fee
    /// and the feature's height field, big-endian, hashed to 32 bytes.
    pub fn signature_message(&self) -> Result<[u8; 32]> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[self.features.as_u8()]);
        match self.features {
            KernelFeatures::Plain => {
                hasher.update(&self.fee.to_be_bytes());
            }
            KernelFeatures::Coinbase => {}
            KernelFeatures::HeightLocked => {
                hasher.update(&self.fee.to_be_bytes());
                hasher.update(&self.lock_height.to_be_bytes());
            }
            KernelFeatures::NoRecentDuplicate => {
                let relative: u16 = self
                    .relative_height
                    .try_into()
                    .map_err(|_| Error::UnsupportedSlate)?;
                hasher.update(&self.fee.to_be_bytes());
                hasher.update(&relative.to_be_bytes());
            }
        }
        Ok(*hasher.finalize().as_bytes())
    }

    /// Canonical content hash, used only for sorting and uniqueness.
    pub fn sort_hash(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[self.features.as_u8()]);
        hasher.update(&self.fee.to_be_bytes());
        hasher.update(&self.lock_height.to_be_bytes());
        hasher.update(&self.relative_height.to_be_bytes());
        hasher.update(self.excess.as_bytes());
        hasher.update(self.excess_sig.as_bytes());
        *hasher.finalize().as_bytes()
    }

    /// Structural validity against a network's rules. A complete
    /// kernel must also carry a signature that verifies against its
    /// own excess.
    pub fn validate(&self, network: Network) -> Result<()> {
        match self.features {
            KernelFeatures::Plain | KernelFeatures::Coinbase => {
                if self.lock_height != 0 || self.relative_height != 0 {
                    return Err(Error::UnsupportedSlate);
                }
            }
            KernelFeatures::HeightLocked => {
                if self.relative_height != 0 {
                    return Err(Error::UnsupportedSlate);
                }
            }
            KernelFeatures::NoRecentDuplicate => {
                if !network.nrd_enabled() {
                    return Err(Error::UnsupportedSlate);
                }
                if self.relative_height == 0
                    || self.relative_height > network.max_relative_height()
                    || self.lock_height != 0
                {
                    return Err(Error::UnsupportedSlate);
                }
            }
        }
        if self.fee > network.max_tx_fee() {
            return Err(Error::UnsupportedSlate);
        }
        self.excess.verify_format()?;

        if self.is_complete() {
            if self.excess.is_zero() {
                return Err(Error::UnsupportedSlate);
            }
            let msg = self.signature_message()?;
            let key = self.excess.to_pubkey()?;
            if !verify_final(&self.excess_sig, &key, &msg)? {
                return Err(Error::UnsupportedSlate);
            }
        }
        Ok(())
    }

    pub fn write_binary(&self, w: &mut BitWriter) {
        w.write_bits(self.features.as_u8() as u32, 8);
        w.write_u64(self.fee, 64);
        match self.features {
            KernelFeatures::NoRecentDuplicate => w.write_u64(self.relative_height, 64),
            _ => w.write_u64(self.lock_height, 64),
        }
        w.write_bytes(self.excess.as_bytes());
        w.write_bytes(self.excess_sig.as_bytes());
    }

    pub fn read_binary(r: &mut BitReader<'_>, network: Network) -> Result<Self> {
        let features = KernelFeatures::from_u8(r.read_bits(8)? as u8)?;
        let fee = r.read_u64(64)?;
        let height = r.read_u64(64)?;
        let (lock_height, relative_height) = match features {
            KernelFeatures::NoRecentDuplicate => (0, height),
            _ => (height, 0),
        };
        let kernel = Kernel {
            excess: Commitment(r.read_array::<33>()?),
            excess_sig: Signature(r.read_array::<64>()?),
            features,
            fee,
            lock_height,
            relative_height,
        };
        kernel.validate(network)?;
        Ok(kernel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{sign_partial, PublicKey, SecretScalar};

    #[test]
    fn test_bare_kernel_is_incomplete() {
        let kernel = Kernel::bare(KernelFeatures::Plain, 80_000);
        assert!(!kernel.is_complete());
        kernel.validate(Network::MwcMainnet).unwrap();
    }

    #[test]
    fn test_signature_message_varies_by_feature() {
        let plain = Kernel::bare(KernelFeatures::Plain, 10);
        let mut locked = Kernel::bare(KernelFeatures::HeightLocked, 10);
        locked.lock_height = 100;
        let coinbase = Kernel::bare(KernelFeatures::Coinbase, 0);

        let m1 = plain.signature_message().unwrap();
        let m2 = locked.signature_message().unwrap();
        let m3 = coinbase.signature_message().unwrap();
        assert_ne!(m1, m2);
        assert_ne!(m1, m3);
        assert_ne!(m2, m3);
    }

    #[test]
    fn test_plain_kernel_rejects_lock_height() {
        let mut kernel = Kernel::bare(KernelFeatures::Plain, 10);
        kernel.lock_height = 5;
        assert!(kernel.validate(Network::MwcMainnet).is_err());
    }

    #[test]
    fn test_nrd_requires_enabled_network() {
        let mut kernel = Kernel::bare(KernelFeatures::NoRecentDuplicate, 10);
        kernel.relative_height = 100;
        kernel.validate(Network::GrinMainnet).unwrap();
        assert!(kernel.validate(Network::MwcMainnet).is_err());
    }

    #[test]
    fn test_nrd_relative_height_bounds() {
        let mut kernel = Kernel::bare(KernelFeatures::NoRecentDuplicate, 10);
        kernel.relative_height = 0;
        assert!(kernel.validate(Network::GrinMainnet).is_err());
        kernel.relative_height = Network::GrinMainnet.max_relative_height() + 1;
        assert!(kernel.validate(Network::GrinMainnet).is_err());
    }

    #[test]
    fn test_complete_kernel_signature_checked() {
        // Single-party signature: excess = x·G, nonce sum = k·G.
        let x = SecretScalar::random().unwrap();
        let k = SecretScalar::random().unwrap();
        let p = PublicKey::from_secret(&x).unwrap();
        let r = PublicKey::from_secret(&k).unwrap();

        let mut kernel = Kernel::bare(KernelFeatures::Plain, 42);
        kernel.excess = p.to_commitment();
        let msg = kernel.signature_message().unwrap();
        kernel.excess_sig = sign_partial(&x, &k, &r, &p, &msg).unwrap();

        kernel.validate(Network::MwcMainnet).unwrap();

        // Any fee change invalidates the stored signature.
        kernel.fee = 43;
        assert!(kernel.validate(Network::MwcMainnet).is_err());
    }

    #[test]
    fn test_binary_roundtrip_nrd() {
        let mut kernel = Kernel::bare(KernelFeatures::NoRecentDuplicate, 7);
        kernel.relative_height = 1_000;
        let mut w = BitWriter::new();
        kernel.write_binary(&mut w);
        let bytes = w.into_bytes();
        let mut r = BitReader::new(&bytes);
        assert_eq!(Kernel::read_binary(&mut r, Network::GrinMainnet).unwrap(), kernel);
    }

    #[test]
    fn test_json_layout_matches_legacy() {
        let kernel = Kernel::bare(KernelFeatures::Plain, 80_000);
        let json = serde_json::to_value(kernel).unwrap();
        assert_eq!(json["features"], "Plain");
        assert_eq!(json["fee"], "80000");
        assert_eq!(json["lock_height"], "0");
        assert_eq!(json["excess"].as_str().unwrap(), "0".repeat(66));
        assert_eq!(json["excess_sig"].as_str().unwrap(), "0".repeat(128));
    }
}
