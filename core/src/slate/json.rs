// Legacy JSON wire tiers ("2" and "3")
//
// Decimal-string numbers, hex byte fields, alphabetical key order.
// Tier 3 adds the network tag, time-to-live and payment-proof fields;
// tier 2 cannot carry them. Field-for-field these layouts follow the
// slates the old wallets exchange.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::address::ProofAddress;
use crate::entities::{KernelFeatures, Participant};
use crate::error::{Error, Result};
use crate::policy::Network;
use crate::ser::{opt_string_u64, string_u64};
use crate::slate::{PaymentProof, Slate, SlateState, SlateVersion, Transaction, TransactionBody};

#[derive(Debug, Serialize, Deserialize)]
struct VersionInfo {
    block_header_version: u16,
    orig_version: u16,
    version: u16,
}

#[derive(Debug, Serialize, Deserialize)]
struct PaymentProofJson {
    receiver_address: String,
    receiver_signature: Option<String>,
    sender_address: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct SlateJsonV3 {
    #[serde(with = "string_u64")]
    amount: u64,
    coin_type: String,
    #[serde(with = "string_u64")]
    fee: u64,
    #[serde(with = "string_u64")]
    height: u64,
    id: Uuid,
    #[serde(with = "string_u64")]
    lock_height: u64,
    network_type: String,
    num_participants: u64,
    participant_data: Vec<Participant>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    payment_proof: Option<PaymentProofJson>,
    #[serde(with = "opt_string_u64", default)]
    ttl_cutoff_height: Option<u64>,
    tx: Transaction,
    version_info: VersionInfo,
}

#[derive(Debug, Serialize, Deserialize)]
struct SlateJsonV2 {
    #[serde(with = "string_u64")]
    amount: u64,
    #[serde(with = "string_u64")]
    fee: u64,
    #[serde(with = "string_u64")]
    height: u64,
    id: Uuid,
    #[serde(with = "string_u64")]
    lock_height: u64,
    num_participants: u64,
    participant_data: Vec<Participant>,
    tx: Transaction,
    version_info: VersionInfo,
}

pub fn serialize(slate: &Slate, version: SlateVersion) -> Result<Vec<u8>> {
    if slate.kernel()?.features == KernelFeatures::NoRecentDuplicate {
        // The legacy layouts have nowhere to put a relative height.
        return Err(Error::UnsupportedSlate);
    }
    let tx = Transaction {
        body: TransactionBody {
            inputs: slate.inputs.clone(),
            kernels: slate.kernels.clone(),
            outputs: slate.outputs.clone(),
        },
        offset: slate.offset.clone(),
    };
    let version_info = |tier: u16| VersionInfo {
        block_header_version: slate.header_version(),
        orig_version: slate.original_version.as_u16(),
        version: tier,
    };

    let bytes = match version {
        SlateVersion::V2 => {
            if slate.ttl_cutoff_height.is_some() || slate.payment_proof.is_some() {
                return Err(Error::UnsupportedSlate);
            }
            serde_json::to_vec(&SlateJsonV2 {
                amount: slate.amount,
                fee: slate.fee,
                height: slate.height,
                id: slate.id,
                lock_height: slate.lock_height,
                num_participants: slate.num_participants,
                participant_data: slate.participants.clone(),
                tx,
                version_info: version_info(2),
            })
        }
        SlateVersion::V3 => {
            let payment_proof = match &slate.payment_proof {
                Some(proof) => Some(PaymentProofJson {
                    receiver_address: proof.receiver_address.encode()?,
                    receiver_signature: proof.receiver_signature.as_ref().map(hex::encode),
                    sender_address: proof.sender_address.encode()?,
                }),
                None => None,
            };
            serde_json::to_vec(&SlateJsonV3 {
                amount: slate.amount,
                coin_type: slate.network.coin_type().to_string(),
                fee: slate.fee,
                height: slate.height,
                id: slate.id,
                lock_height: slate.lock_height,
                network_type: slate.network.network_type().to_string(),
                num_participants: slate.num_participants,
                participant_data: slate.participants.clone(),
                payment_proof,
                ttl_cutoff_height: slate.ttl_cutoff_height,
                tx,
                version_info: version_info(3),
            })
        }
        _ => return Err(Error::UnsupportedSlate),
    };
    bytes.map_err(|_| Error::InvalidData)
}

pub fn deserialize(value: &serde_json::Value, network: Network) -> Result<Slate> {
    let tier = value
        .get("version_info")
        .and_then(|v| v.get("version"))
        .and_then(|v| v.as_u64())
        .ok_or(Error::InvalidData)?;

    match tier {
        2 => {
            let raw: SlateJsonV2 =
                serde_json::from_value(value.clone()).map_err(|_| Error::InvalidData)?;
            build_slate(
                network,
                SlateVersion::V2,
                raw.version_info,
                raw.amount,
                raw.fee,
                raw.height,
                raw.id,
                raw.lock_height,
                raw.num_participants,
                raw.participant_data,
                None,
                None,
                raw.tx,
            )
        }
        3 => {
            let raw: SlateJsonV3 =
                serde_json::from_value(value.clone()).map_err(|_| Error::InvalidData)?;
            // The network tag must agree with the caller's network.
            let tagged = Network::from_parts(&raw.coin_type, &raw.network_type)?;
            if tagged != network {
                tracing::debug!(tagged = tagged.name(), "network tag mismatch");
                return Err(Error::UnsupportedSlate);
            }
            let payment_proof = match raw.payment_proof {
                Some(proof) => Some(PaymentProof {
                    sender_address: ProofAddress::parse(&proof.sender_address, network)?,
                    receiver_address: ProofAddress::parse(&proof.receiver_address, network)?,
                    receiver_signature: proof
                        .receiver_signature
                        .map(|s| hex::decode(s).map_err(|_| Error::InvalidData))
                        .transpose()?,
                }),
                None => None,
            };
            build_slate(
                network,
                SlateVersion::V3,
                raw.version_info,
                raw.amount,
                raw.fee,
                raw.height,
                raw.id,
                raw.lock_height,
                raw.num_participants,
                raw.participant_data,
                payment_proof,
                raw.ttl_cutoff_height,
                raw.tx,
            )
        }
        _ => Err(Error::UnsupportedSlate),
    }
}

#[allow(clippy::too_many_arguments)]
fn build_slate(
    network: Network,
    version: SlateVersion,
    version_info: VersionInfo,
    amount: u64,
    fee: u64,
    height: u64,
    id: Uuid,
    lock_height: u64,
    num_participants: u64,
    participants: Vec<Participant>,
    payment_proof: Option<PaymentProof>,
    ttl_cutoff_height: Option<u64>,
    tx: Transaction,
) -> Result<Slate> {
    // Header versions are derived from height and policy, never free.
    if version_info.block_header_version != network.header_version(height) {
        return Err(Error::UnsupportedSlate);
    }
    // The kernel must restate the slate's fee and lock height.
    let kernel = tx.body.kernels.first().ok_or(Error::UnsupportedSlate)?;
    if kernel.fee != fee || kernel.lock_height != lock_height {
        return Err(Error::UnsupportedSlate);
    }

    let state = if kernel.is_complete() {
        SlateState::Finalized
    } else if participants.iter().any(|p| !p.is_sender() && p.has_signed()) {
        SlateState::Responded
    } else {
        SlateState::Building
    };

    Ok(Slate {
        network,
        state,
        id,
        version,
        original_version: SlateVersion::from_u16(version_info.orig_version)?,
        num_participants,
        amount,
        fee,
        height,
        lock_height,
        ttl_cutoff_height,
        offset: tx.offset,
        inputs: tx.body.inputs,
        outputs: tx.body.outputs,
        kernels: tx.body.kernels,
        participants,
        payment_proof,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{commit, PublicKey, SecretScalar};
    use crate::entities::{Input, Output, OutputFeatures};

    fn sample_slate() -> Slate {
        let net = Network::MwcMainnet;
        let mut slate = Slate::new(net, 200_000_000, net.required_fee(1, 1, 1), 4, KernelFeatures::Plain);
        let bi = SecretScalar::random().unwrap();
        let bo = SecretScalar::random().unwrap();
        assert!(slate.add_inputs(
            vec![Input::new(OutputFeatures::Coinbase, commit(300_000_000, &bi).unwrap())],
            1
        ));
        assert!(slate.add_outputs(vec![Output::new(
            OutputFeatures::Plain,
            commit(99_000_000, &bo).unwrap(),
            vec![0xEE; 200],
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
        slate
    }

    #[test]
    fn test_v3_layout_keys() {
        let slate = sample_slate();
        let bytes = serialize(&slate, SlateVersion::V3).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["coin_type"], "mwc");
        assert_eq!(value["network_type"], "mainnet");
        assert_eq!(value["amount"], "200000000");
        assert_eq!(value["ttl_cutoff_height"], serde_json::Value::Null);
        assert_eq!(value["version_info"]["version"], 3);
        assert_eq!(value["tx"]["body"]["kernels"][0]["features"], "Plain");
    }

    #[test]
    fn test_v3_roundtrip() {
        let slate = sample_slate();
        let bytes = serialize(&slate, SlateVersion::V3).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let back = deserialize(&value, slate.network).unwrap();
        assert_eq!(back, slate);
    }

    #[test]
    fn test_v2_roundtrip_and_limits() {
        let mut slate = sample_slate();
        let bytes = serialize(&slate, SlateVersion::V2).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let back = deserialize(&value, slate.network).unwrap();
        assert_eq!(back.amount, slate.amount);
        assert_eq!(back.version, SlateVersion::V2);

        // V2 has nowhere to put a ttl.
        slate.ttl_cutoff_height = Some(100);
        assert!(serialize(&slate, SlateVersion::V2).is_err());
    }

    #[test]
    fn test_network_tag_mismatch_rejected() {
        let slate = sample_slate();
        let bytes = serialize(&slate, SlateVersion::V3).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(matches!(
            deserialize(&value, Network::MwcFloonet),
            Err(Error::UnsupportedSlate)
        ));
    }

    #[test]
    fn test_header_version_is_not_free() {
        let slate = sample_slate();
        let bytes = serialize(&slate, SlateVersion::V3).unwrap();
        let mut value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        value["version_info"]["block_header_version"] = 9.into();
        assert!(deserialize(&value, slate.network).is_err());
    }

    #[test]
    fn test_kernel_fee_must_restate_slate_fee() {
        let slate = sample_slate();
        let bytes = serialize(&slate, SlateVersion::V3).unwrap();
        let mut value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        value["tx"]["body"]["kernels"][0]["fee"] = "999".into();
        assert!(deserialize(&value, slate.network).is_err());
    }
}
