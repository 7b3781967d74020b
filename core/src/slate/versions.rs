// Wire tiers, purposes and version negotiation

use serde::{Deserialize, Serialize};

use crate::entities::KernelFeatures;
use crate::error::{Error, Result};

/// The closed set of wire tiers, oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlateVersion {
    /// Legacy JSON, no ttl / payment proof / network tag
    V2,
    /// Legacy JSON with ttl, payment proof and network tag
    V3,
    /// Compact JSON (short keys) and the equivalent binary record
    V4,
    /// Maximally-compressed bit-packed record
    SP,
}

impl SlateVersion {
    pub fn as_u16(self) -> u16 {
        match self {
            SlateVersion::V2 => 2,
            SlateVersion::V3 => 3,
            SlateVersion::V4 => 4,
            SlateVersion::SP => 5,
        }
    }

    pub fn from_u16(value: u16) -> Result<Self> {
        match value {
            2 => Ok(SlateVersion::V2),
            3 => Ok(SlateVersion::V3),
            4 => Ok(SlateVersion::V4),
            5 => Ok(SlateVersion::SP),
            _ => Err(Error::UnsupportedSlate),
        }
    }
}

/// What a serialized slate is for. Three bits on the compact wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlatePurpose {
    SendInitial,
    SendResponse,
    InvoiceInitial,
    InvoiceResponse,
    Full,
}

impl SlatePurpose {
    pub fn as_u8(self) -> u8 {
        match self {
            SlatePurpose::SendInitial => 0,
            SlatePurpose::SendResponse => 1,
            SlatePurpose::InvoiceInitial => 2,
            SlatePurpose::InvoiceResponse => 3,
            SlatePurpose::Full => 4,
        }
    }

    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(SlatePurpose::SendInitial),
            1 => Ok(SlatePurpose::SendResponse),
            2 => Ok(SlatePurpose::InvoiceInitial),
            3 => Ok(SlatePurpose::InvoiceResponse),
            4 => Ok(SlatePurpose::Full),
            _ => Err(Error::InvalidData),
        }
    }

    pub fn is_response(self) -> bool {
        matches!(self, SlatePurpose::SendResponse | SlatePurpose::InvoiceResponse)
    }
}

/// Pick the most compact tier both parties support.
///
/// The bit-packed tier only handles plain kernels with no
/// time-to-live; time-to-live or a payment proof rules out the oldest
/// JSON tier entirely. Falls back to V3, the most widely spoken tier,
/// when the recipient advertises nothing usable.
pub fn minimum_compatible_version(
    kernel_features: KernelFeatures,
    has_ttl: bool,
    has_payment_proof: bool,
    recipient: &[SlateVersion],
) -> SlateVersion {
    let preference = [
        SlateVersion::SP,
        SlateVersion::V4,
        SlateVersion::V3,
        SlateVersion::V2,
    ];
    for tier in preference {
        if !recipient.contains(&tier) {
            continue;
        }
        match tier {
            SlateVersion::SP => {
                if kernel_features != KernelFeatures::Plain || has_ttl {
                    continue;
                }
            }
            SlateVersion::V2 => {
                if has_ttl || has_payment_proof {
                    continue;
                }
            }
            _ => {}
        }
        return tier;
    }
    SlateVersion::V3
}
