// Negotiation participant — one party's public contribution

use serde::{Deserialize, Serialize};

use crate::codec::fields;
use crate::codec::{BitReader, BitWriter};
use crate::crypto::{PublicKey, Signature};
use crate::error::{Error, Result};
use crate::ser::{hex_pubkey, opt_hex_signature, string_u64};

/// Sender is always participant 0.
pub const SENDER_ID: u64 = 0;

/// One party's entry in the slate. The free-text message and its
/// signature are legacy-only fields carried for the oldest JSON tiers.
/// Field order matches the legacy JSON layouts (alphabetical).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(with = "string_u64")]
    pub id: u64,
    pub message: Option<String>,
    #[serde(with = "opt_hex_signature")]
    pub message_sig: Option<Signature>,
    #[serde(with = "opt_hex_signature")]
    pub part_sig: Option<Signature>,
    #[serde(with = "hex_pubkey")]
    pub public_blind_excess: PublicKey,
    #[serde(with = "hex_pubkey")]
    pub public_nonce: PublicKey,
}

impl Participant {
    pub fn new(id: u64, public_blind_excess: PublicKey, public_nonce: PublicKey) -> Self {
        Participant {
            id,
            message: None,
            message_sig: None,
            part_sig: None,
            public_blind_excess,
            public_nonce,
        }
    }

    pub fn is_sender(&self) -> bool {
        self.id == SENDER_ID
    }

    pub fn has_signed(&self) -> bool {
        self.part_sig.is_some()
    }

    pub fn write_binary(&self, w: &mut BitWriter) {
        w.write_u64(self.id, 8);
        w.write_bytes(self.public_blind_excess.as_bytes());
        w.write_bytes(self.public_nonce.as_bytes());
        let mut flags = 0u32;
        if self.part_sig.is_some() {
            flags |= 1;
        }
        if self.message.is_some() {
            flags |= 2;
        }
        w.write_bits(flags, 8);
        if let Some(sig) = &self.part_sig {
            w.write_bytes(sig.as_bytes());
        }
        if let Some(message) = &self.message {
            let raw = message.as_bytes();
            w.write_u64(raw.len() as u64, 16);
            w.write_bytes(raw);
            match &self.message_sig {
                Some(sig) => {
                    w.write_bits(1, 8);
                    w.write_bytes(sig.as_bytes());
                }
                None => w.write_bits(0, 8),
            }
        }
    }

    pub fn read_binary(r: &mut BitReader<'_>) -> Result<Self> {
        let id = r.read_u64(8)?;
        let public_blind_excess = PublicKey::from_slice(&r.read_bytes(33)?)?;
        let public_nonce = PublicKey::from_slice(&r.read_bytes(33)?)?;
        let flags = r.read_bits(8)?;
        if flags & !0x03 != 0 {
            return Err(Error::InvalidData);
        }
        let part_sig = if flags & 1 != 0 {
            Some(Signature(r.read_array::<64>()?))
        } else {
            None
        };
        let (message, message_sig) = if flags & 2 != 0 {
            let len = r.read_u64(16)? as usize;
            let raw = r.read_bytes(len)?;
            let text = String::from_utf8(raw).map_err(|_| Error::InvalidData)?;
            let sig = if r.read_bits(8)? != 0 {
                Some(Signature(r.read_array::<64>()?))
            } else {
                None
            };
            (Some(text), sig)
        } else {
            (None, None)
        };
        Ok(Participant {
            id,
            message,
            message_sig,
            part_sig,
            public_blind_excess,
            public_nonce,
        })
    }

    /// Compact tier: key codecs plus presence bits; the message rides
    /// through the dictionary compressor.
    pub fn write_compact(&self, w: &mut BitWriter) {
        fields::write_pubkey(w, self.public_blind_excess.as_bytes());
        fields::write_pubkey(w, self.public_nonce.as_bytes());
        match &self.part_sig {
            Some(sig) => {
                w.write_bool(true);
                fields::write_signature(w, sig.as_bytes());
            }
            None => w.write_bool(false),
        }
        match &self.message {
            Some(message) => {
                w.write_bool(true);
                fields::write_message(w, message);
                match &self.message_sig {
                    Some(sig) => {
                        w.write_bool(true);
                        fields::write_signature(w, sig.as_bytes());
                    }
                    None => w.write_bool(false),
                }
            }
            None => w.write_bool(false),
        }
    }

    pub fn read_compact(r: &mut BitReader<'_>, id: u64) -> Result<Self> {
        let public_blind_excess = PublicKey::from_slice(&fields::read_pubkey(r)?)?;
        let public_nonce = PublicKey::from_slice(&fields::read_pubkey(r)?)?;
        let part_sig = if r.read_bool()? {
            Some(Signature(fields::read_signature(r)?))
        } else {
            None
        };
        let (message, message_sig) = if r.read_bool()? {
            let text = fields::read_message(r)?;
            let sig = if r.read_bool()? {
                Some(Signature(fields::read_signature(r)?))
            } else {
                None
            };
            (Some(text), sig)
        } else {
            (None, None)
        };
        Ok(Participant {
            id,
            message,
            message_sig,
            part_sig,
            public_blind_excess,
            public_nonce,
        })
    }
}
