// Wire envelope — armored, checksummed, optionally encrypted
//
// The record inside the armor: one format byte, one transfer-mode
// byte, a length-prefixed body. Encrypted bodies are age files keyed
// to the recipient's ed25519 address key.

pub mod age;
pub mod armor;

use ed25519_dalek::SigningKey;

use crate::error::{Error, Result};

/// Envelope format tag carried in the record.
const FORMAT_VERSION: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    Plain,
    Encrypted,
}

impl TransferMode {
    fn as_u8(self) -> u8 {
        match self {
            TransferMode::Plain => 0,
            TransferMode::Encrypted => 1,
        }
    }

    fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(TransferMode::Plain),
            1 => Ok(TransferMode::Encrypted),
            _ => Err(Error::InvalidData),
        }
    }
}

/// Wrap a serialized slate for transport. With a recipient key the
/// body travels encrypted; without, it is plain but still
/// checksummed.
pub fn seal(payload: &[u8], recipient: Option<&[u8; 32]>) -> Result<String> {
    let (mode, body) = match recipient {
        Some(key) => (TransferMode::Encrypted, age::encrypt(payload, key)?),
        None => (TransferMode::Plain, payload.to_vec()),
    };
    let mut record = Vec::with_capacity(body.len() + 6);
    record.push(FORMAT_VERSION);
    record.push(mode.as_u8());
    record.extend_from_slice(&(body.len() as u32).to_be_bytes());
    record.extend_from_slice(&body);
    Ok(armor::encode(&record))
}

/// Unwrap an envelope. Checksum, length and format damage — and a
/// missing key for an encrypted body — are all the opaque fault.
pub fn open(text: &str, recipient: Option<&SigningKey>) -> Result<(Vec<u8>, TransferMode)> {
    let record = armor::decode(text)?;
    if record.len() < 6 || record[0] != FORMAT_VERSION {
        return Err(Error::InvalidData);
    }
    let mode = TransferMode::from_u8(record[1])?;
    let length = u32::from_be_bytes(record[2..6].try_into().expect("fixed split")) as usize;
    let body = &record[6..];
    if body.len() != length {
        tracing::debug!("envelope length mismatch");
        return Err(Error::InvalidData);
    }
    match mode {
        TransferMode::Plain => Ok((body.to_vec(), mode)),
        TransferMode::Encrypted => {
            let key = recipient.ok_or(Error::InvalidData)?;
            Ok((age::decrypt(body, key)?, mode))
        }
    }
}
