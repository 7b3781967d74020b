// Transaction output — commitment plus range proof

use serde::{Deserialize, Serialize};

use crate::codec::fields;
use crate::codec::{BitReader, BitWriter, MAX_PROOF_SIZE};
use crate::crypto::{verify_rangeproof_format, Commitment};
use crate::error::{Error, Result};
use crate::ser::{hex_bytes, hex_commitment};

use super::input::OutputFeatures;

/// A new output: commitment, features and the range proof showing the
/// committed value is non-negative. Field order matches the legacy
/// JSON layouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    #[serde(with = "hex_commitment")]
    pub commit: Commitment,
    pub features: OutputFeatures,
    #[serde(with = "hex_bytes")]
    pub proof: Vec<u8>,
}

impl Output {
    pub fn new(features: OutputFeatures, commit: Commitment, proof: Vec<u8>) -> Self {
        Output {
            commit,
            features,
            proof,
        }
    }

    /// Canonical content hash, used only for sorting and uniqueness.
    pub fn sort_hash(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[self.features.as_u8()]);
        hasher.update(self.commit.as_bytes());
        hasher.update(&self.proof);
        *hasher.finalize().as_bytes()
    }

    pub fn validate(&self) -> Result<()> {
        self.commit.verify_format()?;
        verify_rangeproof_format(&self.proof)
    }

    pub fn write_binary(&self, w: &mut BitWriter) {
        w.write_bits(self.features.as_u8() as u32, 8);
        w.write_bytes(self.commit.as_bytes());
        w.write_u64(self.proof.len() as u64, 64);
        w.write_bytes(&self.proof);
    }

    pub fn read_binary(r: &mut BitReader<'_>) -> Result<Self> {
        let features = OutputFeatures::from_u8(r.read_bits(8)? as u8)?;
        let commit = Commitment(r.read_array::<33>()?);
        let len = r.read_u64(64)? as usize;
        if len == 0 || len > MAX_PROOF_SIZE {
            return Err(Error::InvalidData);
        }
        let proof = r.read_bytes(len)?;
        let output = Output {
            commit,
            features,
            proof,
        };
        output.validate()?;
        Ok(output)
    }

    /// Compact tier: one feature bit, the commitment, then the
    /// ten-bit-length-prefixed proof.
    pub fn write_compact(&self, w: &mut BitWriter) {
        w.write_bool(self.features == OutputFeatures::Coinbase);
        w.write_bytes(self.commit.as_bytes());
        fields::write_rangeproof(w, &self.proof);
    }

    pub fn read_compact(r: &mut BitReader<'_>) -> Result<Self> {
        let features = if r.read_bool()? {
            OutputFeatures::Coinbase
        } else {
            OutputFeatures::Plain
        };
        let commit = Commitment(r.read_array::<33>()?);
        let proof = fields::read_rangeproof(r)?;
        let output = Output {
            commit,
            features,
            proof,
        };
        output.validate()?;
        Ok(output)
    }
}
