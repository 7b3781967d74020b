// Binary wire tier ("4", binary form)
//
// A fixed/variable record: two-byte tier marker, explicit
// optional-field bitmask, then length-prefixed entity lists. Byte
// aligned throughout, so it shares the bit cursor with the compact
// tier at no cost.

use uuid::Uuid;

use crate::address::ProofAddress;
use crate::codec::{BitReader, BitWriter, CompactAddress};
use crate::crypto::{Commitment, SecretScalar, Signature};
use crate::entities::{Input, Kernel, KernelFeatures, Output, Participant};
use crate::error::{Error, Result};
use crate::policy::Network;
use crate::slate::{PaymentProof, Slate, SlateState, SlateVersion};

const TIER_MARKER: u16 = 4;

const FLAG_AMOUNT: u32 = 1;
const FLAG_FEE: u32 = 1 << 1;
const FLAG_HEIGHT: u32 = 1 << 2;
const FLAG_LOCK: u32 = 1 << 3;
const FLAG_RELATIVE: u32 = 1 << 4;
const FLAG_TTL: u32 = 1 << 5;
const FLAG_PROOF: u32 = 1 << 6;
const FLAG_PARTS: u32 = 1 << 7;

/// True when the buffer leads with the binary tier marker.
pub fn has_marker(data: &[u8]) -> bool {
    data.len() >= 2 && u16::from_be_bytes([data[0], data[1]]) == TIER_MARKER
}

fn state_to_u8(state: SlateState) -> u8 {
    match state {
        SlateState::Building => 1,
        SlateState::Responded => 2,
        SlateState::Finalized => 3,
    }
}

fn state_from_u8(value: u8) -> Result<SlateState> {
    match value {
        1 => Ok(SlateState::Building),
        2 => Ok(SlateState::Responded),
        3 => Ok(SlateState::Finalized),
        _ => Err(Error::InvalidData),
    }
}

fn write_compact_address(w: &mut BitWriter, address: &CompactAddress) {
    match address {
        CompactAddress::Ed25519(key) => {
            w.write_bits(0, 8);
            w.write_bytes(key);
        }
        CompactAddress::Secp(key) => {
            w.write_bits(1, 8);
            w.write_bytes(key);
        }
    }
}

fn read_compact_address(r: &mut BitReader<'_>) -> Result<CompactAddress> {
    match r.read_bits(8)? {
        0 => Ok(CompactAddress::Ed25519(r.read_array::<32>()?)),
        1 => Ok(CompactAddress::Secp(r.read_array::<33>()?)),
        _ => Err(Error::InvalidData),
    }
}

pub fn serialize(slate: &Slate) -> Result<Vec<u8>> {
    let kernel = slate.kernel()?;
    // One-byte participant fields bound what this record can carry.
    if slate.num_participants > 255 || slate.participants.iter().any(|p| p.id > 255) {
        return Err(Error::UnsupportedSlate);
    }
    let mut w = BitWriter::new();

    w.write_bits(TIER_MARKER as u32, 16);
    w.write_bits(slate.header_version() as u32, 16);
    w.write_bytes(slate.id.as_bytes());
    w.write_bits(state_to_u8(slate.state) as u32, 8);

    let mut flags = 0u32;
    if slate.amount != 0 {
        flags |= FLAG_AMOUNT;
    }
    if slate.fee != 0 {
        flags |= FLAG_FEE;
    }
    if slate.height != 0 {
        flags |= FLAG_HEIGHT;
    }
    if slate.lock_height != 0 {
        flags |= FLAG_LOCK;
    }
    if kernel.relative_height != 0 {
        flags |= FLAG_RELATIVE;
    }
    if slate.ttl_cutoff_height.is_some() {
        flags |= FLAG_TTL;
    }
    if slate.payment_proof.is_some() {
        flags |= FLAG_PROOF;
    }
    if slate.num_participants != 2 {
        flags |= FLAG_PARTS;
    }
    w.write_bits(flags, 8);

    if flags & FLAG_AMOUNT != 0 {
        w.write_u64(slate.amount, 64);
    }
    if flags & FLAG_FEE != 0 {
        w.write_u64(slate.fee, 64);
    }
    if flags & FLAG_HEIGHT != 0 {
        w.write_u64(slate.height, 64);
    }
    if flags & FLAG_LOCK != 0 {
        w.write_u64(slate.lock_height, 64);
    }
    if flags & FLAG_RELATIVE != 0 {
        w.write_u64(kernel.relative_height, 64);
    }
    if let Some(ttl) = slate.ttl_cutoff_height {
        w.write_u64(ttl, 64);
    }
    if flags & FLAG_PARTS != 0 {
        w.write_bits(slate.num_participants as u32, 8);
    }

    w.write_bytes(slate.offset.as_bytes());

    w.write_bits(kernel.features.as_u8() as u32, 8);
    if kernel.is_complete() {
        w.write_bits(1, 8);
        w.write_bytes(kernel.excess.as_bytes());
        w.write_bytes(kernel.excess_sig.as_bytes());
    } else {
        w.write_bits(0, 8);
    }

    w.write_bits(slate.participants.len() as u32, 8);
    for participant in &slate.participants {
        participant.write_binary(&mut w);
    }
    w.write_bits(slate.inputs.len() as u32, 16);
    for input in &slate.inputs {
        input.write_binary(&mut w);
    }
    w.write_bits(slate.outputs.len() as u32, 16);
    for output in &slate.outputs {
        output.write_binary(&mut w);
    }

    if let Some(proof) = &slate.payment_proof {
        write_compact_address(&mut w, &proof.sender_address.to_compact());
        write_compact_address(&mut w, &proof.receiver_address.to_compact());
        match &proof.receiver_signature {
            Some(sig) => {
                let sig: &[u8; 64] =
                    sig.as_slice().try_into().map_err(|_| Error::UnsupportedSlate)?;
                w.write_bits(1, 8);
                w.write_bytes(sig);
            }
            None => w.write_bits(0, 8),
        }
    }

    Ok(w.into_bytes())
}

pub fn deserialize(data: &[u8], network: Network) -> Result<Slate> {
    let mut r = BitReader::new(data);

    if r.read_bits(16)? as u16 != TIER_MARKER {
        return Err(Error::InvalidData);
    }
    let header_version = r.read_bits(16)? as u16;
    let id = Uuid::from_bytes(r.read_array::<16>()?);
    let state = state_from_u8(r.read_bits(8)? as u8)?;
    let flags = r.read_bits(8)?;

    let amount = if flags & FLAG_AMOUNT != 0 { r.read_u64(64)? } else { 0 };
    let fee = if flags & FLAG_FEE != 0 { r.read_u64(64)? } else { 0 };
    let height = if flags & FLAG_HEIGHT != 0 { r.read_u64(64)? } else { 0 };
    let lock_height = if flags & FLAG_LOCK != 0 { r.read_u64(64)? } else { 0 };
    let relative_height = if flags & FLAG_RELATIVE != 0 { r.read_u64(64)? } else { 0 };
    let ttl_cutoff_height = if flags & FLAG_TTL != 0 {
        Some(r.read_u64(64)?)
    } else {
        None
    };
    let num_participants = if flags & FLAG_PARTS != 0 {
        r.read_bits(8)? as u64
    } else {
        2
    };

    if header_version != network.header_version(height) {
        return Err(Error::UnsupportedSlate);
    }

    let offset = SecretScalar::from_slice(&r.read_bytes(32)?)?;

    let mut kernel = Kernel::bare(KernelFeatures::from_u8(r.read_bits(8)? as u8)?, fee);
    kernel.lock_height = lock_height;
    kernel.relative_height = relative_height;
    match r.read_bits(8)? {
        0 => {}
        1 => {
            kernel.excess = Commitment(r.read_array::<33>()?);
            kernel.excess_sig = Signature(r.read_array::<64>()?);
        }
        _ => return Err(Error::InvalidData),
    }

    let sig_count = r.read_bits(8)? as usize;
    let mut participants = Vec::with_capacity(sig_count);
    for _ in 0..sig_count {
        participants.push(Participant::read_binary(&mut r)?);
    }

    let input_count = r.read_bits(16)? as usize;
    let mut inputs = Vec::with_capacity(input_count);
    for _ in 0..input_count {
        inputs.push(Input::read_binary(&mut r)?);
    }
    let output_count = r.read_bits(16)? as usize;
    let mut outputs = Vec::with_capacity(output_count);
    for _ in 0..output_count {
        outputs.push(Output::read_binary(&mut r)?);
    }

    let payment_proof = if flags & FLAG_PROOF != 0 {
        let sender = ProofAddress::from_compact(read_compact_address(&mut r)?, network)?;
        let receiver = ProofAddress::from_compact(read_compact_address(&mut r)?, network)?;
        let receiver_signature = match r.read_bits(8)? {
            0 => None,
            1 => Some(r.read_bytes(64)?),
            _ => return Err(Error::InvalidData),
        };
        Some(PaymentProof {
            sender_address: sender,
            receiver_address: receiver,
            receiver_signature,
        })
    } else {
        None
    };

    if r.remaining() >= 8 {
        // Trailing garbage is not tolerated.
        return Err(Error::InvalidData);
    }

    Ok(Slate {
        network,
        state,
        id,
        version: SlateVersion::V4,
        original_version: SlateVersion::V4,
        num_participants,
        amount,
        fee,
        height,
        lock_height,
        ttl_cutoff_height,
        offset,
        inputs,
        outputs,
        kernels: vec![kernel],
        participants,
        payment_proof,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{commit, PublicKey};
    use crate::entities::OutputFeatures;

    fn sample_slate() -> Slate {
        let net = Network::MwcFloonet;
        let mut slate = Slate::new(net, 750_000_000, net.required_fee(1, 1, 1), 20, KernelFeatures::Plain);
        let bi = SecretScalar::random().unwrap();
        let bo = SecretScalar::random().unwrap();
        assert!(slate.add_inputs(
            vec![Input::new(OutputFeatures::Plain, commit(1_000_000_000, &bi).unwrap())],
            1
        ));
        assert!(slate.add_outputs(vec![Output::new(
            OutputFeatures::Plain,
            commit(200_000_000, &bo).unwrap(),
            vec![0x5C; 90],
        )]));
        let x = SecretScalar::random().unwrap();
        let k = SecretScalar::random().unwrap();
        slate
            .add_participant(Participant::new(
                0,
                PublicKey::from_secret(&x).unwrap(),
                PublicKey::from_secret(&k).unwrap(),
            ))
            .unwrap();
        slate.create_offset().unwrap();
        slate.version = SlateVersion::V4;
        slate.original_version = SlateVersion::V4;
        slate
    }

    #[test]
    fn test_marker_detection() {
        let slate = sample_slate();
        let bytes = serialize(&slate).unwrap();
        assert!(has_marker(&bytes));
        assert!(!has_marker(&[0x7B, 0x22]));
    }

    #[test]
    fn test_roundtrip() {
        let slate = sample_slate();
        let bytes = serialize(&slate).unwrap();
        let back = deserialize(&bytes, slate.network).unwrap();
        assert_eq!(back, slate);
    }

    #[test]
    fn test_roundtrip_with_ttl_and_parts() {
        let mut slate = sample_slate();
        slate.ttl_cutoff_height = Some(200);
        slate.num_participants = 3;
        let bytes = serialize(&slate).unwrap();
        let back = deserialize(&bytes, slate.network).unwrap();
        assert_eq!(back.ttl_cutoff_height, Some(200));
        assert_eq!(back.num_participants, 3);
    }

    #[test]
    fn test_truncated_record_rejected() {
        let slate = sample_slate();
        let bytes = serialize(&slate).unwrap();
        assert!(deserialize(&bytes[..bytes.len() - 3], slate.network).is_err());
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let slate = sample_slate();
        let mut bytes = serialize(&slate).unwrap();
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        assert!(deserialize(&bytes, slate.network).is_err());
    }

    #[test]
    fn test_bad_state_rejected() {
        let slate = sample_slate();
        let mut bytes = serialize(&slate).unwrap();
        // State byte sits after marker (2) + header (2) + uuid (16).
        bytes[20] = 9;
        assert!(deserialize(&bytes, slate.network).is_err());
    }
}
