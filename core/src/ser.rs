// Serde helpers for the legacy JSON wire tiers
//
// The old layouts carry 64-bit numbers as decimal strings and every
// byte field as lowercase hex; these adapters keep the entity structs
// clean of that.

use serde::{de, Deserialize, Deserializer, Serializer};

use crate::crypto::{Commitment, PublicKey, SecretScalar, Signature};

/// u64 as a decimal string. Bare numbers are accepted on input for
/// tolerance with older emitters.
pub mod string_u64 {
    use super::*;

    pub fn serialize<S: Serializer>(value: &u64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }
        match Raw::deserialize(d)? {
            Raw::Text(s) => s.parse().map_err(de::Error::custom),
            Raw::Number(n) => Ok(n),
        }
    }
}

/// Option<u64> as an optional decimal string.
pub mod opt_string_u64 {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<u64>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => s.serialize_some(&v.to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        raw.map(|s| s.parse().map_err(de::Error::custom)).transpose()
    }
}

pub mod hex_commitment {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Commitment, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_hex())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Commitment, D::Error> {
        let raw = String::deserialize(d)?;
        Commitment::from_hex(&raw).map_err(de::Error::custom)
    }
}

pub mod hex_signature {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Signature, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_hex())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Signature, D::Error> {
        let raw = String::deserialize(d)?;
        Signature::from_hex(&raw).map_err(de::Error::custom)
    }
}

pub mod opt_hex_signature {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<Signature>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => s.serialize_some(&v.to_hex()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Signature>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        raw.map(|s| Signature::from_hex(&s).map_err(de::Error::custom))
            .transpose()
    }
}

pub mod hex_pubkey {
    use super::*;

    pub fn serialize<S: Serializer>(value: &PublicKey, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_hex())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<PublicKey, D::Error> {
        let raw = String::deserialize(d)?;
        PublicKey::from_hex(&raw).map_err(de::Error::custom)
    }
}

pub mod hex_secret {
    use super::*;

    pub fn serialize<S: Serializer>(value: &SecretScalar, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_hex())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<SecretScalar, D::Error> {
        let raw = String::deserialize(d)?;
        SecretScalar::from_hex(&raw).map_err(de::Error::custom)
    }
}

pub mod hex_bytes {
    use super::*;

    pub fn serialize<S: Serializer>(value: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(d)?;
        hex::decode(raw).map_err(de::Error::custom)
    }
}
