// Compact field codec — typed encoders over the bit packer
//
// Every field the bit-packed wire tier carries goes through here, so
// the layout rules live in exactly one place.

use uuid::Uuid;

use super::bits::{BitReader, BitWriter};
use super::textpack;
use crate::error::{Error, Result};

/// Bits in the leading purpose tag.
pub const PURPOSE_BITS: u32 = 3;
/// Bits in the varint width header.
const WIDTH_BITS: u32 = 6;
/// Bits in the hundreds-scaling counter.
const SCALE_BITS: u32 = 3;
/// Most ÷100 steps the scaler may peel off.
const MAX_SCALE: u32 = 7;
/// Bits in a range-proof length prefix.
const PROOF_LEN_BITS: u32 = 10;
/// Bits in a public-key length prefix.
const PUBKEY_LEN_BITS: u32 = 7;
/// Largest serialized range proof.
pub const MAX_PROOF_SIZE: usize = 675;

/// An address as the compact tier carries it: one family bit, then the
/// family's fixed-width raw key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompactAddress {
    /// secp256k1 family (MQS-style), 33-byte compressed key
    Secp([u8; 33]),
    /// ed25519 family (onion/slatepack-style), 32-byte key
    Ed25519([u8; 32]),
}

pub fn write_purpose(w: &mut BitWriter, tag: u8) {
    w.write_bits(tag as u32, PURPOSE_BITS);
}

pub fn read_purpose(r: &mut BitReader<'_>) -> Result<u8> {
    Ok(r.read_bits(PURPOSE_BITS)? as u8)
}

/// Self-describing unsigned integer. With `hundreds` enabled, trailing
/// ÷100 factors (up to seven) are peeled off first and re-applied on
/// decode; then a six-bit width header names how many raw bits follow.
pub fn write_varint(w: &mut BitWriter, value: u64, hundreds: bool) {
    let mut v = value;
    if hundreds {
        let mut scale = 0u32;
        while scale < MAX_SCALE && v >= 100 && v % 100 == 0 {
            v /= 100;
            scale += 1;
        }
        w.write_bits(scale, SCALE_BITS);
    }
    let width = (64 - v.leading_zeros()).max(1);
    w.write_bits(width - 1, WIDTH_BITS);
    w.write_u64(v, width);
}

pub fn read_varint(r: &mut BitReader<'_>, hundreds: bool) -> Result<u64> {
    let scale = if hundreds { r.read_bits(SCALE_BITS)? } else { 0 };
    let width = r.read_bits(WIDTH_BITS)? + 1;
    let mut value = r.read_u64(width)?;
    for _ in 0..scale {
        value = value.checked_mul(100).ok_or(Error::InvalidData)?;
    }
    Ok(value)
}

pub fn write_commitment(w: &mut BitWriter, commitment: &[u8; 33]) {
    w.write_bytes(commitment);
}

pub fn read_commitment(r: &mut BitReader<'_>) -> Result<[u8; 33]> {
    r.read_array::<33>()
}

pub fn write_signature(w: &mut BitWriter, signature: &[u8; 64]) {
    w.write_bytes(signature);
}

pub fn read_signature(r: &mut BitReader<'_>) -> Result<[u8; 64]> {
    r.read_array::<64>()
}

/// Range proofs are variable length, prefixed with a ten-bit byte count.
pub fn write_rangeproof(w: &mut BitWriter, proof: &[u8]) {
    assert!(
        !proof.is_empty() && proof.len() <= MAX_PROOF_SIZE,
        "range proof size out of range"
    );
    w.write_bits(proof.len() as u32, PROOF_LEN_BITS);
    w.write_bytes(proof);
}

pub fn read_rangeproof(r: &mut BitReader<'_>) -> Result<Vec<u8>> {
    let len = r.read_bits(PROOF_LEN_BITS)? as usize;
    if len == 0 || len > MAX_PROOF_SIZE {
        return Err(Error::InvalidData);
    }
    r.read_bytes(len)
}

/// Public keys occur in both compressed (33) and uncompressed (65)
/// SEC1 form, so they carry a seven-bit length prefix.
pub fn write_pubkey(w: &mut BitWriter, key: &[u8]) {
    assert!(
        key.len() == 33 || key.len() == 65,
        "public key length out of range"
    );
    w.write_bits(key.len() as u32, PUBKEY_LEN_BITS);
    w.write_bytes(key);
}

pub fn read_pubkey(r: &mut BitReader<'_>) -> Result<Vec<u8>> {
    let len = r.read_bits(PUBKEY_LEN_BITS)? as usize;
    if len != 33 && len != 65 {
        return Err(Error::InvalidData);
    }
    r.read_bytes(len)
}

/// UUIDs travel as their 16 raw bytes, except that the alternate
/// variant (variant bits `110`) stores its first three fields
/// byte-swapped; the swap is applied symmetrically on both paths.
pub fn write_uuid(w: &mut BitWriter, id: &Uuid) {
    w.write_bytes(&swap_uuid_fields(*id.as_bytes()));
}

pub fn read_uuid(r: &mut BitReader<'_>) -> Result<Uuid> {
    let bytes = r.read_array::<16>()?;
    Ok(Uuid::from_bytes(swap_uuid_fields(bytes)))
}

/// Reverse time_low, time_mid and time_hi when the variant nibble says
/// the UUID uses the alternate (mixed-endian) representation. The swap
/// is its own inverse.
fn swap_uuid_fields(mut bytes: [u8; 16]) -> [u8; 16] {
    if bytes[8] >> 5 == 0b110 {
        bytes[0..4].reverse();
        bytes[4..6].reverse();
        bytes[6..8].reverse();
    }
    bytes
}

pub fn write_address(w: &mut BitWriter, address: &CompactAddress) {
    match address {
        CompactAddress::Secp(key) => {
            w.write_bool(true);
            w.write_bytes(key);
        }
        CompactAddress::Ed25519(key) => {
            w.write_bool(false);
            w.write_bytes(key);
        }
    }
}

pub fn read_address(r: &mut BitReader<'_>) -> Result<CompactAddress> {
    if r.read_bool()? {
        Ok(CompactAddress::Secp(r.read_array::<33>()?))
    } else {
        Ok(CompactAddress::Ed25519(r.read_array::<32>()?))
    }
}

/// Free-text participant messages go through the dictionary compressor,
/// then a plain (unscaled) varint length prefix.
pub fn write_message(w: &mut BitWriter, message: &str) {
    let packed = textpack::compress(message.as_bytes());
    write_varint(w, packed.len() as u64, false);
    w.write_bytes(&packed);
}

pub fn read_message(r: &mut BitReader<'_>) -> Result<String> {
    let len = read_varint(r, false)? as usize;
    let packed = r.read_bytes(len)?;
    let raw = textpack::decompress(&packed)?;
    String::from_utf8(raw).map_err(|_| Error::InvalidData)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn roundtrip_varint(value: u64, hundreds: bool) -> u64 {
        let mut w = BitWriter::new();
        write_varint(&mut w, value, hundreds);
        let bytes = w.into_bytes();
        let mut r = BitReader::new(&bytes);
        read_varint(&mut r, hundreds).unwrap()
    }

    #[test]
    fn test_varint_edge_values() {
        for value in [0, 1, 99, 100, 10_000, 1_000_000, u64::MAX] {
            assert_eq!(roundtrip_varint(value, false), value);
            assert_eq!(roundtrip_varint(value, true), value);
        }
    }

    #[test]
    fn test_hundreds_scaling_shrinks_round_amounts() {
        // 2_000_000_000 peels to 20 over four scale steps: 3 + 6 + 5
        // bits versus 6 + 31 without scaling.
        let mut scaled = BitWriter::new();
        write_varint(&mut scaled, 2_000_000_000, true);
        let mut plain = BitWriter::new();
        write_varint(&mut plain, 2_000_000_000, false);
        assert!(scaled.bit_len() < plain.bit_len());
    }

    #[test]
    fn test_scale_overflow_is_decode_fault() {
        // Hand-build scale=7 over a value that overflows u64 on rescale.
        let mut w = BitWriter::new();
        w.write_bits(7, 3);
        w.write_bits(63, 6);
        w.write_u64(u64::MAX, 64);
        let bytes = w.into_bytes();
        let mut r = BitReader::new(&bytes);
        assert!(read_varint(&mut r, true).is_err());
    }

    #[test]
    fn test_purpose_roundtrip() {
        let mut w = BitWriter::new();
        write_purpose(&mut w, 4);
        let bytes = w.into_bytes();
        let mut r = BitReader::new(&bytes);
        assert_eq!(read_purpose(&mut r).unwrap(), 4);
    }

    #[test]
    fn test_rfc_uuid_passes_through_unswapped() {
        // Version 4, variant 10x — stored as-is.
        let id = Uuid::from_bytes([
            0x04, 0x36, 0x43, 0x0c, 0x2b, 0x02, 0x62, 0x4c, 0xa0, 0x32, 0x57, 0x05, 0x01, 0x21,
            0x2b, 0x00,
        ]);
        let mut w = BitWriter::new();
        write_uuid(&mut w, &id);
        let bytes = w.into_bytes();
        assert_eq!(&bytes[..16], id.as_bytes());
        let mut r = BitReader::new(&bytes);
        assert_eq!(read_uuid(&mut r).unwrap(), id);
    }

    #[test]
    fn test_alternate_variant_swaps_and_roundtrips() {
        // Variant bits 110 — first three fields byte-swapped on the wire.
        let id = Uuid::from_bytes([
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0xC0, 0x32, 0x57, 0x05, 0x01, 0x21,
            0x2b, 0x00,
        ]);
        let mut w = BitWriter::new();
        write_uuid(&mut w, &id);
        let bytes = w.into_bytes();
        assert_eq!(&bytes[..4], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&bytes[4..6], &[0x06, 0x05]);
        assert_eq!(&bytes[6..8], &[0x08, 0x07]);
        let mut r = BitReader::new(&bytes);
        assert_eq!(read_uuid(&mut r).unwrap(), id);
    }

    #[test]
    fn test_rangeproof_length_limits() {
        let mut w = BitWriter::new();
        write_rangeproof(&mut w, &vec![0xAB; MAX_PROOF_SIZE]);
        let bytes = w.into_bytes();
        let mut r = BitReader::new(&bytes);
        assert_eq!(read_rangeproof(&mut r).unwrap().len(), MAX_PROOF_SIZE);

        // A length above the cap must be rejected even if bytes follow.
        let mut w = BitWriter::new();
        w.write_bits((MAX_PROOF_SIZE + 1) as u32, 10);
        w.write_bytes(&vec![0u8; MAX_PROOF_SIZE + 1]);
        let bytes = w.into_bytes();
        let mut r = BitReader::new(&bytes);
        assert!(read_rangeproof(&mut r).is_err());
    }

    #[test]
    fn test_pubkey_rejects_odd_length() {
        let mut w = BitWriter::new();
        w.write_bits(34, 7);
        w.write_bytes(&[0u8; 34]);
        let bytes = w.into_bytes();
        let mut r = BitReader::new(&bytes);
        assert!(read_pubkey(&mut r).is_err());
    }

    #[test]
    fn test_address_families() {
        for addr in [
            CompactAddress::Secp([0x02; 33]),
            CompactAddress::Ed25519([0x7F; 32]),
        ] {
            let mut w = BitWriter::new();
            write_address(&mut w, &addr);
            let bytes = w.into_bytes();
            let mut r = BitReader::new(&bytes);
            assert_eq!(read_address(&mut r).unwrap(), addr);
        }
    }

    #[test]
    fn test_message_roundtrip() {
        let mut w = BitWriter::new();
        write_message(&mut w, "thanks for the coffee");
        let bytes = w.into_bytes();
        let mut r = BitReader::new(&bytes);
        assert_eq!(read_message(&mut r).unwrap(), "thanks for the coffee");
    }

    proptest! {
        #[test]
        fn prop_varint_roundtrip(value in any::<u64>(), hundreds in any::<bool>()) {
            prop_assert_eq!(roundtrip_varint(value, hundreds), value);
        }

        #[test]
        fn prop_message_roundtrip(text in "[ -~]{0,120}") {
            let mut w = BitWriter::new();
            write_message(&mut w, &text);
            let bytes = w.into_bytes();
            let mut r = BitReader::new(&bytes);
            prop_assert_eq!(read_message(&mut r).unwrap(), text);
        }
    }
}
