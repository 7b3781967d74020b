// Transaction input — a reference to an output being spent

use serde::{Deserialize, Serialize};

use crate::codec::{BitReader, BitWriter};
use crate::crypto::Commitment;
use crate::error::Result;
use crate::ser::hex_commitment;

/// Output feature set, shared by inputs (which reference outputs) and
/// outputs themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFeatures {
    Plain,
    Coinbase,
}

impl OutputFeatures {
    pub fn as_u8(self) -> u8 {
        match self {
            OutputFeatures::Plain => 0,
            OutputFeatures::Coinbase => 1,
        }
    }

    pub fn from_u8(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(OutputFeatures::Plain),
            1 => Ok(OutputFeatures::Coinbase),
            _ => Err(crate::error::Error::InvalidData),
        }
    }
}

/// A spent output: its features and the commitment being consumed.
/// Field order matches the legacy JSON layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    #[serde(with = "hex_commitment")]
    pub commit: Commitment,
    pub features: OutputFeatures,
}

impl Input {
    pub fn new(features: OutputFeatures, commit: Commitment) -> Self {
        Input { commit, features }
    }

    /// Canonical content hash, used only for sorting and uniqueness.
    pub fn sort_hash(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[self.features.as_u8()]);
        hasher.update(self.commit.as_bytes());
        *hasher.finalize().as_bytes()
    }

    pub fn validate(&self) -> Result<()> {
        self.commit.verify_format()
    }

    pub fn write_binary(&self, w: &mut BitWriter) {
        w.write_bits(self.features.as_u8() as u32, 8);
        w.write_bytes(self.commit.as_bytes());
    }

    pub fn read_binary(r: &mut BitReader<'_>) -> Result<Self> {
        let features = OutputFeatures::from_u8(r.read_bits(8)? as u8)?;
        let commit = Commitment(r.read_array::<33>()?);
        let input = Input { commit, features };
        input.validate()?;
        Ok(input)
    }

    /// Compact tier: one feature bit, then the raw commitment.
    pub fn write_compact(&self, w: &mut BitWriter) {
        w.write_bool(self.features == OutputFeatures::Coinbase);
        w.write_bytes(self.commit.as_bytes());
    }

    pub fn read_compact(r: &mut BitReader<'_>) -> Result<Self> {
        let features = if r.read_bool()? {
            OutputFeatures::Coinbase
        } else {
            OutputFeatures::Plain
        };
        let commit = Commitment(r.read_array::<33>()?);
        let input = Input { commit, features };
        input.validate()?;
        Ok(input)
    }
}
