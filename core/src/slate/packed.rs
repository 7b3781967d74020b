// Bit-packed wire tier ("SP")
//
// The smallest encoding: plain kernels only, no time-to-live, no
// byte alignment anywhere. A response carries only what the recipient
// added; everything else is inherited from the initiating slate at
// decode time, including the offset, which both sides contribute a
// share of.

use crate::address::ProofAddress;
use crate::codec::{fields, BitReader, BitWriter};
use crate::crypto::{Commitment, SecretScalar, Signature};
use crate::entities::{Input, Kernel, KernelFeatures, Output, Participant};
use crate::error::{Error, Result};
use crate::policy::Network;
use crate::slate::{PaymentProof, Slate, SlatePurpose, SlateState, SlateVersion};

pub fn serialize(slate: &Slate, purpose: SlatePurpose) -> Result<Vec<u8>> {
    let kernel = slate.kernel()?;
    if kernel.features != KernelFeatures::Plain
        || slate.ttl_cutoff_height.is_some()
        || slate.lock_height != 0
    {
        return Err(Error::UnsupportedSlate);
    }

    let mut w = BitWriter::new();
    fields::write_purpose(&mut w, purpose.as_u8());
    fields::write_uuid(&mut w, &slate.id);
    w.write_bool(slate.network.is_mainnet());

    let omit_negotiated = purpose.is_response();
    if !omit_negotiated && slate.amount != 0 {
        w.write_bool(true);
        fields::write_varint(&mut w, slate.amount, true);
    } else {
        w.write_bool(false);
    }
    if !omit_negotiated && slate.fee != 0 {
        w.write_bool(true);
        fields::write_varint(&mut w, slate.fee, true);
    } else {
        w.write_bool(false);
    }
    fields::write_varint(&mut w, slate.height, false);

    if slate.offset.is_zero() {
        w.write_bool(false);
    } else {
        w.write_bool(true);
        w.write_bytes(slate.offset.as_bytes());
    }

    match &slate.payment_proof {
        Some(proof) => {
            w.write_bool(true);
            fields::write_address(&mut w, &proof.sender_address.to_compact());
            fields::write_address(&mut w, &proof.receiver_address.to_compact());
            match &proof.receiver_signature {
                Some(sig) => {
                    let sig: &[u8; 64] =
                        sig.as_slice().try_into().map_err(|_| Error::UnsupportedSlate)?;
                    w.write_bool(true);
                    w.write_bytes(sig);
                }
                None => w.write_bool(false),
            }
        }
        None => w.write_bool(false),
    }

    fields::write_varint(&mut w, slate.num_participants, false);

    let participants: Vec<&Participant> = if omit_negotiated {
        // A response carries only the entries the recipient added.
        slate.participants.iter().filter(|p| !p.is_sender()).collect()
    } else {
        slate.participants.iter().collect()
    };
    fields::write_varint(&mut w, participants.len() as u64, false);
    for participant in participants {
        fields::write_varint(&mut w, participant.id, false);
        participant.write_compact(&mut w);
    }

    let inputs: &[Input] = if omit_negotiated { &[] } else { &slate.inputs };
    fields::write_varint(&mut w, inputs.len() as u64, false);
    for input in inputs {
        input.write_compact(&mut w);
    }

    fields::write_varint(&mut w, slate.outputs.len() as u64, false);
    for output in &slate.outputs {
        output.write_compact(&mut w);
    }

    if kernel.is_complete() {
        w.write_bool(true);
        w.write_bytes(kernel.excess.as_bytes());
        w.write_bytes(kernel.excess_sig.as_bytes());
    } else {
        w.write_bool(false);
    }

    Ok(w.into_bytes())
}

struct PackedRaw {
    purpose: SlatePurpose,
    id: uuid::Uuid,
    amount: Option<u64>,
    fee: Option<u64>,
    height: u64,
    offset: Option<SecretScalar>,
    proof: Option<PaymentProof>,
    num_participants: u64,
    participants: Vec<Participant>,
    inputs: Vec<Input>,
    outputs: Vec<Output>,
    kernel_data: Option<(Commitment, Signature)>,
}

fn read_raw(data: &[u8], network: Network) -> Result<PackedRaw> {
    let mut r = BitReader::new(data);

    let purpose = SlatePurpose::from_u8(fields::read_purpose(&mut r)?)?;
    let id = fields::read_uuid(&mut r)?;
    let mainnet = r.read_bool()?;
    if mainnet != network.is_mainnet() {
        return Err(Error::InvalidData);
    }

    let amount = if r.read_bool()? {
        Some(fields::read_varint(&mut r, true)?)
    } else {
        None
    };
    let fee = if r.read_bool()? {
        Some(fields::read_varint(&mut r, true)?)
    } else {
        None
    };
    let height = fields::read_varint(&mut r, false)?;

    let offset = if r.read_bool()? {
        Some(SecretScalar::from_slice(&r.read_bytes(32)?)?)
    } else {
        None
    };

    let proof = if r.read_bool()? {
        let sender = ProofAddress::from_compact(fields::read_address(&mut r)?, network)?;
        let receiver = ProofAddress::from_compact(fields::read_address(&mut r)?, network)?;
        let receiver_signature = if r.read_bool()? {
            Some(r.read_bytes(64)?)
        } else {
            None
        };
        Some(PaymentProof {
            sender_address: sender,
            receiver_address: receiver,
            receiver_signature,
        })
    } else {
        None
    };

    let num_participants = fields::read_varint(&mut r, false)?;

    let participant_count = fields::read_varint(&mut r, false)? as usize;
    let mut participants = Vec::with_capacity(participant_count);
    for _ in 0..participant_count {
        let id = fields::read_varint(&mut r, false)?;
        participants.push(Participant::read_compact(&mut r, id)?);
    }

    let input_count = fields::read_varint(&mut r, false)? as usize;
    let mut inputs = Vec::with_capacity(input_count);
    for _ in 0..input_count {
        inputs.push(Input::read_compact(&mut r)?);
    }
    let output_count = fields::read_varint(&mut r, false)? as usize;
    let mut outputs = Vec::with_capacity(output_count);
    for _ in 0..output_count {
        outputs.push(Output::read_compact(&mut r)?);
    }

    let kernel_data = if r.read_bool()? {
        Some((
            Commitment(r.read_array::<33>()?),
            Signature(r.read_array::<64>()?),
        ))
    } else {
        None
    };

    if r.remaining() >= 8 {
        return Err(Error::InvalidData);
    }

    Ok(PackedRaw {
        purpose,
        id,
        amount,
        fee,
        height,
        offset,
        proof,
        num_participants,
        participants,
        inputs,
        outputs,
        kernel_data,
    })
}

pub fn deserialize(
    data: &[u8],
    network: Network,
    purpose: SlatePurpose,
    initiating: Option<&Slate>,
) -> Result<Slate> {
    let raw = read_raw(data, network)?;
    if raw.purpose != purpose {
        return Err(Error::InvalidData);
    }

    if purpose.is_response() {
        let initiating = initiating.ok_or(Error::UnsupportedSlate)?;
        return merge_response(raw, initiating);
    }

    let mut kernel = Kernel::bare(KernelFeatures::Plain, raw.fee.unwrap_or(0));
    if let Some((excess, sig)) = raw.kernel_data {
        kernel.excess = excess;
        kernel.excess_sig = sig;
    }
    let state = if kernel.is_complete() {
        SlateState::Finalized
    } else if raw.participants.iter().any(|p| !p.is_sender() && p.has_signed()) {
        SlateState::Responded
    } else {
        SlateState::Building
    };

    let mut participants = raw.participants;
    participants.sort_by_key(|p| p.id);

    Ok(Slate {
        network,
        state,
        id: raw.id,
        version: SlateVersion::SP,
        original_version: SlateVersion::SP,
        num_participants: raw.num_participants,
        amount: raw.amount.unwrap_or(0),
        fee: raw.fee.unwrap_or(0),
        height: raw.height,
        lock_height: 0,
        ttl_cutoff_height: None,
        offset: raw.offset.unwrap_or_else(SecretScalar::zero),
        inputs: raw.inputs,
        outputs: raw.outputs,
        kernels: vec![kernel],
        participants,
        payment_proof: raw.proof,
    })
}

/// Fold a response record into a copy of the initiating slate. The
/// response may only add: its participant entries, its outputs, its
/// offset share and the payment-proof signature.
fn merge_response(raw: PackedRaw, initiating: &Slate) -> Result<Slate> {
    if raw.id != initiating.id {
        return Err(Error::UnsupportedSlate);
    }
    if let Some(amount) = raw.amount {
        if amount != initiating.amount {
            return Err(Error::UnsupportedSlate);
        }
    }
    if let Some(fee) = raw.fee {
        if fee != initiating.fee {
            return Err(Error::UnsupportedSlate);
        }
    }
    if raw.height != 0 && raw.height != initiating.height {
        return Err(Error::UnsupportedSlate);
    }
    if !raw.inputs.is_empty() && raw.inputs != initiating.inputs {
        return Err(Error::UnsupportedSlate);
    }

    let mut slate = initiating.clone();
    slate.version = SlateVersion::SP;
    slate.state = SlateState::Responded;

    for participant in raw.participants {
        match slate.participants.iter().find(|p| p.id == participant.id) {
            Some(existing) => {
                if *existing != participant {
                    return Err(Error::UnsupportedSlate);
                }
            }
            None => {
                slate.participants.push(participant);
            }
        }
    }
    slate.participants.sort_by_key(|p| p.id);

    if !slate.add_outputs(raw.outputs) {
        return Err(Error::UnsupportedSlate);
    }

    if let Some(share) = raw.offset {
        slate.combine_offsets(&share)?;
    }

    match (&mut slate.payment_proof, raw.proof) {
        (Some(ours), Some(theirs)) => {
            if ours.sender_address != theirs.sender_address
                || ours.receiver_address != theirs.receiver_address
            {
                return Err(Error::UnsupportedSlate);
            }
            if theirs.receiver_signature.is_some() {
                ours.receiver_signature = theirs.receiver_signature;
            }
        }
        (None, Some(_)) => return Err(Error::UnsupportedSlate),
        _ => {}
    }

    if let Some((excess, sig)) = raw.kernel_data {
        let kernel = slate.kernels.first_mut().ok_or(Error::UnsupportedSlate)?;
        kernel.excess = excess;
        kernel.excess_sig = sig;
    }
    Ok(slate)
}
