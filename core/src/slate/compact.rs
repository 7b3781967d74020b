// Compact JSON wire tier ("4", text form)
//
// Short keys, everything optional that can default, inputs and
// outputs share one array and are told apart by the presence of the
// proof field. Kernel data is reconstructed from the slate-level
// fields; a completed kernel additionally carries its excess and
// signature.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::address::ProofAddress;
use crate::crypto::{Commitment, PublicKey, SecretScalar, Signature};
use crate::entities::{
    Input, Kernel, KernelFeatures, Output, OutputFeatures, Participant,
};
use crate::error::{Error, Result};
use crate::policy::Network;
use crate::slate::{PaymentProof, Slate, SlateState, SlateVersion};

fn is_zero(v: &u64) -> bool {
    *v == 0
}

fn is_default_parts(v: &u64) -> bool {
    *v == 2
}

fn default_parts() -> u64 {
    2
}

#[derive(Debug, Serialize, Deserialize)]
struct SigJson {
    xs: String,
    nonce: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    part: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ComJson {
    #[serde(skip_serializing_if = "is_zero_u8", default)]
    f: u8,
    c: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    p: Option<String>,
}

fn is_zero_u8(v: &u8) -> bool {
    *v == 0
}

#[derive(Debug, Serialize, Deserialize)]
struct ProofJson {
    raddr: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    rsig: Option<String>,
    saddr: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct SlateJsonV4 {
    ver: String,
    id: Uuid,
    sta: String,
    #[serde(skip_serializing_if = "is_default_parts", default = "default_parts")]
    num_parts: u64,
    #[serde(skip_serializing_if = "is_zero", default)]
    #[serde(with = "crate::ser::string_u64")]
    amt: u64,
    #[serde(skip_serializing_if = "is_zero", default)]
    #[serde(with = "crate::ser::string_u64")]
    fee: u64,
    #[serde(skip_serializing_if = "is_zero", default)]
    #[serde(with = "crate::ser::string_u64")]
    hgt: u64,
    #[serde(skip_serializing_if = "is_zero", default)]
    #[serde(with = "crate::ser::string_u64")]
    lock: u64,
    #[serde(skip_serializing_if = "is_zero", default)]
    rel: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    #[serde(with = "crate::ser::opt_string_u64")]
    ttl: Option<u64>,
    #[serde(skip_serializing_if = "is_zero_u8", default)]
    feat: u8,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    off: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    exc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    ksig: Option<String>,
    sigs: Vec<SigJson>,
    coms: Vec<ComJson>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    proof: Option<ProofJson>,
}

fn state_tag(state: SlateState) -> &'static str {
    match state {
        SlateState::Building => "S1",
        SlateState::Responded => "S2",
        SlateState::Finalized => "S3",
    }
}

fn state_from_tag(tag: &str) -> Result<SlateState> {
    match tag {
        "S1" => Ok(SlateState::Building),
        "S2" => Ok(SlateState::Responded),
        "S3" => Ok(SlateState::Finalized),
        _ => Err(Error::InvalidData),
    }
}

pub fn serialize(slate: &Slate) -> Result<Vec<u8>> {
    let kernel = slate.kernel()?;

    // Participant ids become array positions; they are dense in
    // practice and anything else cannot ride this tier.
    let mut sigs = Vec::with_capacity(slate.participants.len());
    for (index, participant) in slate.participants.iter().enumerate() {
        if participant.id != index as u64 {
            return Err(Error::UnsupportedSlate);
        }
        sigs.push(SigJson {
            xs: participant.public_blind_excess.to_hex(),
            nonce: participant.public_nonce.to_hex(),
            part: participant.part_sig.as_ref().map(Signature::to_hex),
        });
    }

    let mut coms = Vec::with_capacity(slate.inputs.len() + slate.outputs.len());
    for input in &slate.inputs {
        coms.push(ComJson {
            f: input.features.as_u8(),
            c: input.commit.to_hex(),
            p: None,
        });
    }
    for output in &slate.outputs {
        coms.push(ComJson {
            f: output.features.as_u8(),
            c: output.commit.to_hex(),
            p: Some(hex::encode(&output.proof)),
        });
    }

    let proof = match &slate.payment_proof {
        Some(proof) => Some(ProofJson {
            raddr: proof.receiver_address.encode()?,
            rsig: proof.receiver_signature.as_ref().map(hex::encode),
            saddr: proof.sender_address.encode()?,
        }),
        None => None,
    };

    let json = SlateJsonV4 {
        ver: format!("4:{}", slate.header_version()),
        id: slate.id,
        sta: state_tag(slate.state).to_string(),
        num_parts: slate.num_participants,
        amt: slate.amount,
        fee: slate.fee,
        hgt: slate.height,
        lock: slate.lock_height,
        rel: kernel.relative_height,
        ttl: slate.ttl_cutoff_height,
        feat: kernel.features.as_u8(),
        off: if slate.offset.is_zero() {
            None
        } else {
            Some(slate.offset.to_hex())
        },
        exc: if kernel.excess.is_zero() {
            None
        } else {
            Some(kernel.excess.to_hex())
        },
        ksig: if kernel.excess_sig.is_zero() {
            None
        } else {
            Some(kernel.excess_sig.to_hex())
        },
        sigs,
        coms,
        proof,
    };
    serde_json::to_vec(&json).map_err(|_| Error::InvalidData)
}

pub fn deserialize(value: &serde_json::Value, network: Network) -> Result<Slate> {
    let raw: SlateJsonV4 =
        serde_json::from_value(value.clone()).map_err(|_| Error::InvalidData)?;

    let (tier, header) = raw.ver.split_once(':').ok_or(Error::InvalidData)?;
    if tier != "4" {
        return Err(Error::UnsupportedSlate);
    }
    let header: u16 = header.parse().map_err(|_| Error::InvalidData)?;
    if header != network.header_version(raw.hgt) {
        return Err(Error::UnsupportedSlate);
    }

    let state = state_from_tag(&raw.sta)?;

    let mut participants = Vec::with_capacity(raw.sigs.len());
    for (index, sig) in raw.sigs.iter().enumerate() {
        let mut participant = Participant::new(
            index as u64,
            PublicKey::from_hex(&sig.xs)?,
            PublicKey::from_hex(&sig.nonce)?,
        );
        participant.part_sig = sig.part.as_deref().map(Signature::from_hex).transpose()?;
        participants.push(participant);
    }

    let mut inputs = Vec::new();
    let mut outputs = Vec::new();
    for com in &raw.coms {
        let features = OutputFeatures::from_u8(com.f)?;
        let commit = Commitment::from_hex(&com.c)?;
        match &com.p {
            Some(proof) => outputs.push(Output::new(
                features,
                commit,
                hex::decode(proof).map_err(|_| Error::InvalidData)?,
            )),
            None => inputs.push(Input::new(features, commit)),
        }
    }

    let mut kernel = Kernel::bare(KernelFeatures::from_u8(raw.feat)?, raw.fee);
    kernel.lock_height = raw.lock;
    kernel.relative_height = raw.rel;
    if let Some(exc) = &raw.exc {
        kernel.excess = Commitment::from_hex(exc)?;
    }
    if let Some(ksig) = &raw.ksig {
        kernel.excess_sig = Signature::from_hex(ksig)?;
    }

    let payment_proof = match raw.proof {
        Some(proof) => Some(PaymentProof {
            sender_address: ProofAddress::parse(&proof.saddr, network)?,
            receiver_address: ProofAddress::parse(&proof.raddr, network)?,
            receiver_signature: proof
                .rsig
                .map(|s| hex::decode(s).map_err(|_| Error::InvalidData))
                .transpose()?,
        }),
        None => None,
    };

    Ok(Slate {
        network,
        state,
        id: raw.id,
        version: SlateVersion::V4,
        original_version: SlateVersion::V4,
        num_participants: raw.num_parts,
        amount: raw.amt,
        fee: raw.fee,
        height: raw.hgt,
        lock_height: raw.lock,
        ttl_cutoff_height: raw.ttl,
        offset: match raw.off {
            Some(off) => SecretScalar::from_hex(&off)?,
            None => SecretScalar::zero(),
        },
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
    use crate::crypto::commit;

    fn sample_slate() -> Slate {
        let net = Network::GrinMainnet;
        let mut slate = Slate::new(net, 5_000_000_000, net.required_fee(1, 2, 1), 10, KernelFeatures::Plain);
        let bi = SecretScalar::random().unwrap();
        let bo = SecretScalar::random().unwrap();
        assert!(slate.add_inputs(
            vec![Input::new(OutputFeatures::Plain, commit(9_000_000_000, &bi).unwrap())],
            2
        ));
        assert!(slate.add_outputs(vec![Output::new(
            OutputFeatures::Plain,
            commit(3_000_000_000, &bo).unwrap(),
            vec![0x44; 120],
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
    fn test_short_keys_and_defaults() {
        let slate = sample_slate();
        let bytes = serialize(&slate).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["ver"], "4:1");
        assert_eq!(value["sta"], "S1");
        // Defaults are omitted entirely.
        assert!(value.get("num_parts").is_none());
        assert!(value.get("feat").is_none());
        assert!(value.get("ttl").is_none());
        assert!(value.get("exc").is_none());
    }

    #[test]
    fn test_io_split_by_proof_presence() {
        let slate = sample_slate();
        let bytes = serialize(&slate).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let coms = value["coms"].as_array().unwrap();
        let with_proof = coms.iter().filter(|c| c.get("p").is_some()).count();
        assert_eq!(with_proof, 1);
        assert_eq!(coms.len(), 2);
    }

    #[test]
    fn test_roundtrip() {
        let slate = sample_slate();
        let bytes = serialize(&slate).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let back = deserialize(&value, slate.network).unwrap();
        assert_eq!(back, slate);
    }

    #[test]
    fn test_sparse_participant_ids_cannot_ride() {
        let mut slate = sample_slate();
        let x = SecretScalar::random().unwrap();
        let k = SecretScalar::random().unwrap();
        slate
            .add_participant(Participant::new(
                3,
                PublicKey::from_secret(&x).unwrap(),
                PublicKey::from_secret(&k).unwrap(),
            ))
            .unwrap();
        assert!(serialize(&slate).is_err());
    }

    #[test]
    fn test_bad_state_tag_rejected() {
        let slate = sample_slate();
        let bytes = serialize(&slate).unwrap();
        let mut value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        value["sta"] = "S9".into();
        assert!(deserialize(&value, slate.network).is_err());
    }
}
