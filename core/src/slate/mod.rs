// The slate — shared negotiation object and state machine
//
// Two parties populate one slate cooperatively until its single kernel
// is complete. Every mutation re-checks the structural invariants and
// a failed check leaves the slate exactly as it was; there is no undo,
// only discard-and-restart.

pub mod binary;
pub mod compact;
pub mod json;
pub mod packed;
pub mod versions;

pub use versions::{minimum_compatible_version, SlatePurpose, SlateVersion};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::address::ProofAddress;
use crate::crypto::{
    offset_add, pubkey_sum, transaction_excess, verify_final, verify_kernel_sum, verify_partial,
    Commitment, PublicKey, SecretScalar, Signature,
};
use crate::entities::{Input, Kernel, KernelFeatures, Output, Participant};
use crate::error::{Error, Result};
use crate::policy::{self, Network};
use crate::ser::hex_secret;

/// Negotiation progress. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlateState {
    /// Sender has added its contribution; no complete kernel.
    Building,
    /// Recipient has added its contribution and a partial signature.
    Responded,
    /// Kernel complete, all invariants hold. Terminal.
    Finalized,
}

/// Payment-proof fields: both addresses are set together, the
/// recipient's signature arrives with the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentProof {
    pub sender_address: ProofAddress,
    pub receiver_address: ProofAddress,
    pub receiver_signature: Option<Vec<u8>>,
}

impl PaymentProof {
    /// The bytes an ed25519-family recipient signs:
    /// excess ‖ sender address text ‖ amount (big-endian).
    pub fn message_ed25519(amount: u64, excess: &Commitment, sender: &ProofAddress) -> Result<Vec<u8>> {
        let mut msg = Vec::with_capacity(33 + 64 + 8);
        msg.extend_from_slice(excess.as_bytes());
        msg.extend_from_slice(sender.encode()?.as_bytes());
        msg.extend_from_slice(&amount.to_be_bytes());
        Ok(msg)
    }

    /// The challenge a secp-family recipient signs:
    /// blake3(amount (big-endian) ‖ excess ‖ sender address text).
    pub fn message_secp(amount: u64, excess: &Commitment, sender: &ProofAddress) -> Result<[u8; 32]> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&amount.to_be_bytes());
        hasher.update(excess.as_bytes());
        hasher.update(sender.encode()?.as_bytes());
        Ok(*hasher.finalize().as_bytes())
    }
}

/// The finished transaction body, ready for broadcast. Field order
/// matches the legacy JSON layouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionBody {
    pub inputs: Vec<Input>,
    pub kernels: Vec<Kernel>,
    pub outputs: Vec<Output>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub body: TransactionBody,
    #[serde(with = "hex_secret")]
    pub offset: SecretScalar,
}

/// The negotiation object itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Slate {
    pub network: Network,
    pub state: SlateState,
    /// RFC 4122 version-4 identifier shared by every message of one
    /// negotiation.
    pub id: Uuid,
    pub version: SlateVersion,
    pub original_version: SlateVersion,
    pub num_participants: u64,
    pub amount: u64,
    pub fee: u64,
    /// Block-height context; zero while the building party does not
    /// know the network tip.
    pub height: u64,
    pub lock_height: u64,
    pub ttl_cutoff_height: Option<u64>,
    /// Blinding offset; all-zero until a party contributes one.
    pub offset: SecretScalar,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub kernels: Vec<Kernel>,
    pub participants: Vec<Participant>,
    pub payment_proof: Option<PaymentProof>,
}

impl Slate {
    /// A fresh slate in the Building state: one bare kernel, no
    /// participants yet.
    pub fn new(
        network: Network,
        amount: u64,
        fee: u64,
        height: u64,
        features: KernelFeatures,
    ) -> Self {
        let kernel = Kernel::bare(features, fee);
        Slate {
            network,
            state: SlateState::Building,
            id: Uuid::new_v4(),
            version: SlateVersion::V3,
            original_version: SlateVersion::V3,
            num_participants: 2,
            amount,
            fee,
            height,
            lock_height: 0,
            ttl_cutoff_height: None,
            offset: SecretScalar::zero(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            kernels: vec![kernel],
            participants: Vec::new(),
            payment_proof: None,
        }
    }

    /// Header version is derived, never chosen.
    pub fn header_version(&self) -> u16 {
        self.network.header_version(self.height)
    }

    /// The sole kernel of an in-flight negotiation.
    pub fn kernel(&self) -> Result<&Kernel> {
        match self.kernels.as_slice() {
            [kernel] => Ok(kernel),
            _ => Err(Error::UnsupportedSlate),
        }
    }

    fn kernel_mut(&mut self) -> Result<&mut Kernel> {
        match self.kernels.as_mut_slice() {
            [kernel] => Ok(kernel),
            _ => Err(Error::UnsupportedSlate),
        }
    }

    /// Whether any further structural mutation is allowed.
    fn mutable(&self) -> bool {
        self.state != SlateState::Finalized
            && self.kernels.iter().all(|k| !k.is_complete())
    }

    pub fn weight(&self) -> u64 {
        policy::tx_weight(self.inputs.len(), self.outputs.len(), self.kernels.len())
    }

    pub fn required_fee(&self) -> u64 {
        self.network
            .required_fee(self.inputs.len(), self.outputs.len(), self.kernels.len())
    }

    /// The most compact tier this slate can use with the given
    /// recipient capabilities.
    pub fn negotiate_version(&self, recipient: &[SlateVersion]) -> Result<SlateVersion> {
        Ok(minimum_compatible_version(
            self.kernel()?.features,
            self.ttl_cutoff_height.is_some(),
            self.payment_proof.is_some(),
            recipient,
        ))
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Append inputs, re-sort and re-validate. Returns false and
    /// leaves the slate untouched on any violation, so callers can
    /// retry with a different selection. `expected_outputs` is the
    /// output count the caller intends to reach, so the weight check
    /// anticipates them.
    pub fn add_inputs(&mut self, inputs: Vec<Input>, expected_outputs: usize) -> bool {
        if !self.mutable() {
            return false;
        }
        let mut candidate = self.inputs.clone();
        candidate.extend(inputs);
        candidate.sort_by_key(Input::sort_hash);

        if !strictly_increasing(candidate.iter().map(Input::sort_hash)) {
            return false;
        }
        if candidate.iter().any(|i| i.validate().is_err()) {
            return false;
        }
        let outputs = self.outputs.len().max(expected_outputs);
        let weight = policy::tx_weight(candidate.len(), outputs, self.kernels.len());
        if weight > self.network.max_tx_weight() {
            return false;
        }
        if has_cut_through(&candidate, &self.outputs) {
            return false;
        }
        self.inputs = candidate;
        true
    }

    /// Append outputs, re-sort and re-validate. Same contract as
    /// `add_inputs`.
    pub fn add_outputs(&mut self, outputs: Vec<Output>) -> bool {
        if !self.mutable() {
            return false;
        }
        let mut candidate = self.outputs.clone();
        candidate.extend(outputs);
        candidate.sort_by_key(Output::sort_hash);

        if !strictly_increasing(candidate.iter().map(Output::sort_hash)) {
            return false;
        }
        if candidate.iter().any(|o| o.validate().is_err()) {
            return false;
        }
        let weight = policy::tx_weight(self.inputs.len(), candidate.len(), self.kernels.len());
        if weight > self.network.max_tx_weight() {
            return false;
        }
        if has_cut_through(&self.inputs, &candidate) {
            return false;
        }
        self.outputs = candidate;
        true
    }

    /// Register one party's entry. The recipient's entry moves the
    /// slate to the Responded state.
    pub fn add_participant(&mut self, participant: Participant) -> Result<()> {
        if !self.mutable() {
            return Err(Error::UnsupportedSlate);
        }
        if self.participants.len() as u64 >= self.num_participants {
            return Err(Error::UnsupportedSlate);
        }
        if self.participants.iter().any(|p| p.id == participant.id) {
            return Err(Error::UnsupportedSlate);
        }
        let responded = !participant.is_sender() && participant.has_signed();
        self.participants.push(participant);
        self.participants.sort_by_key(|p| p.id);
        if responded && self.state == SlateState::Building {
            self.state = SlateState::Responded;
        }
        Ok(())
    }

    /// Draw a fresh random offset.
    pub fn create_offset(&mut self) -> Result<()> {
        if !self.mutable() {
            return Err(Error::UnsupportedSlate);
        }
        self.offset = SecretScalar::random()?;
        Ok(())
    }

    /// Fold another party's offset share into ours (compact tier
    /// only; each side holds half of the final offset).
    pub fn combine_offsets(&mut self, other: &SecretScalar) -> Result<()> {
        if !self.mutable() {
            return Err(Error::UnsupportedSlate);
        }
        if self.offset.is_zero() {
            self.offset = other.clone();
            return Ok(());
        }
        self.offset = offset_add(&self.offset, other)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Signing round
    // ------------------------------------------------------------------

    /// Aggregate (nonce sum, blind-excess sum) over every participant.
    pub fn pubkey_sums(&self) -> Result<(PublicKey, PublicKey)> {
        if self.participants.is_empty() {
            return Err(Error::UnsupportedSlate);
        }
        let nonces: Vec<PublicKey> = self.participants.iter().map(|p| p.public_nonce).collect();
        let blinds: Vec<PublicKey> = self
            .participants
            .iter()
            .map(|p| p.public_blind_excess)
            .collect();
        Ok((pubkey_sum(&nonces)?, pubkey_sum(&blinds)?))
    }

    /// Check every partial signature submitted so far against the
    /// aggregate sums and the kernel message.
    pub fn verify_partial_signatures(&self) -> Result<()> {
        let (nonce_sum, blind_sum) = self.pubkey_sums()?;
        let msg = self.kernel()?.signature_message()?;
        for participant in &self.participants {
            if let Some(sig) = &participant.part_sig {
                let ok = verify_partial(
                    sig,
                    &nonce_sum,
                    &blind_sum,
                    &participant.public_nonce,
                    &participant.public_blind_excess,
                    &msg,
                )?;
                if !ok {
                    tracing::debug!(id = %self.id, participant = participant.id,
                        "partial signature rejected");
                    return Err(Error::UnsupportedSlate);
                }
            }
        }
        Ok(())
    }

    /// Install the aggregated signature, compute and install the
    /// excess, and re-check everything. Success is the terminal
    /// Finalized state; failure leaves the slate untouched.
    pub fn set_final_signature(&mut self, signature: Signature) -> Result<()> {
        if self.state == SlateState::Finalized || self.kernel()?.is_complete() {
            return Err(Error::UnsupportedSlate);
        }

        let mut next = self.clone();
        let input_commits: Vec<Commitment> = next.inputs.iter().map(|i| i.commit).collect();
        let output_commits: Vec<Commitment> = next.outputs.iter().map(|o| o.commit).collect();

        let excess = if next.version == SlateVersion::SP {
            // Compact tier: the excess is the sum of the participants'
            // public blind excesses.
            let blinds: Vec<PublicKey> = next
                .participants
                .iter()
                .map(|p| p.public_blind_excess)
                .collect();
            pubkey_sum(&blinds)?.to_commitment()
        } else {
            transaction_excess(&input_commits, &output_commits, next.fee, &next.offset)?
        };

        {
            let kernel = next.kernel_mut()?;
            kernel.excess = excess;
            kernel.excess_sig = signature;
        }

        let required = next.required_fee();
        if required < 1 || next.fee < required || next.fee > next.network.max_tx_fee() {
            tracing::debug!(id = %next.id, fee = next.fee, required, "fee outside bounds");
            return Err(Error::UnsupportedSlate);
        }
        if (next.participants.len() as u64) < next.num_participants {
            return Err(Error::UnsupportedSlate);
        }
        if next.participants.iter().any(|p| !p.has_signed()) {
            return Err(Error::UnsupportedSlate);
        }

        next.verify_partial_signatures()?;
        next.state = SlateState::Finalized;
        next.check_invariants()?;

        if !verify_kernel_sum(&input_commits, &output_commits, next.fee, &next.offset, &[excess])? {
            tracing::debug!(id = %next.id, "kernel sum mismatch");
            return Err(Error::UnsupportedSlate);
        }
        next.verify_payment_proof()?;

        *self = next;
        Ok(())
    }

    /// The broadcastable transaction of a finalized slate.
    pub fn get_transaction(&self) -> Result<Transaction> {
        if self.state != SlateState::Finalized {
            return Err(Error::UnsupportedSlate);
        }
        Ok(Transaction {
            body: TransactionBody {
                inputs: self.inputs.clone(),
                kernels: self.kernels.clone(),
                outputs: self.outputs.clone(),
            },
            offset: self.offset.clone(),
        })
    }

    // ------------------------------------------------------------------
    // Invariants
    // ------------------------------------------------------------------

    /// Every structural invariant, re-run after each mutation and on
    /// every deserialize.
    pub fn check_invariants(&self) -> Result<()> {
        if self.id.get_version_num() != 4 {
            return Err(Error::UnsupportedSlate);
        }
        if self.num_participants < 2 {
            return Err(Error::UnsupportedSlate);
        }
        if self.kernels.len() != 1 {
            return Err(Error::UnsupportedSlate);
        }

        if !strictly_increasing(self.inputs.iter().map(Input::sort_hash))
            || !strictly_increasing(self.outputs.iter().map(Output::sort_hash))
            || !strictly_increasing(self.kernels.iter().map(Kernel::sort_hash))
        {
            return Err(Error::UnsupportedSlate);
        }
        if has_cut_through(&self.inputs, &self.outputs) {
            return Err(Error::UnsupportedSlate);
        }
        if self.weight() > self.network.max_tx_weight() {
            return Err(Error::UnsupportedSlate);
        }

        for input in &self.inputs {
            input.validate().map_err(|_| Error::UnsupportedSlate)?;
        }
        for output in &self.outputs {
            output.validate().map_err(|_| Error::UnsupportedSlate)?;
        }
        for kernel in &self.kernels {
            kernel.validate(self.network)?;
        }

        if self.participants.len() as u64 > self.num_participants {
            return Err(Error::UnsupportedSlate);
        }
        if !self.participants.is_empty() {
            let senders = self.participants.iter().filter(|p| p.is_sender()).count();
            if senders != 1 {
                return Err(Error::UnsupportedSlate);
            }
            if !strictly_increasing(self.participants.iter().map(|p| p.id)) {
                return Err(Error::UnsupportedSlate);
            }
        }

        if let Some(ttl) = self.ttl_cutoff_height {
            if ttl <= self.height || ttl <= self.lock_height {
                return Err(Error::UnsupportedSlate);
            }
        }

        if let Some(proof) = &self.payment_proof {
            if let Some(sig) = &proof.receiver_signature {
                if sig.len() != 64 {
                    return Err(Error::UnsupportedSlate);
                }
            }
        }
        Ok(())
    }

    /// A response must equal its originating slate in every field the
    /// recipient may not extend, and must add at least one output.
    pub fn check_response_against(&self, initiating: &Slate) -> Result<()> {
        let matches = self.id == initiating.id
            && self.network == initiating.network
            && self.amount == initiating.amount
            && self.fee == initiating.fee
            && self.height == initiating.height
            && self.lock_height == initiating.lock_height
            && self.ttl_cutoff_height == initiating.ttl_cutoff_height
            && self.num_participants == initiating.num_participants
            && self.inputs == initiating.inputs;
        if !matches {
            return Err(Error::UnsupportedSlate);
        }

        // The kernel itself (features, fee, heights) must be untouched.
        let (ours, theirs) = (self.kernel()?, initiating.kernel()?);
        if ours.features != theirs.features
            || ours.fee != theirs.fee
            || ours.lock_height != theirs.lock_height
            || ours.relative_height != theirs.relative_height
        {
            return Err(Error::UnsupportedSlate);
        }

        // Offsets agree except on the compact tier, where each side
        // holds only a share.
        if self.version != SlateVersion::SP && self.offset != initiating.offset {
            return Err(Error::UnsupportedSlate);
        }

        match (&self.payment_proof, &initiating.payment_proof) {
            (None, None) => {}
            (Some(ours), Some(theirs)) => {
                if ours.sender_address != theirs.sender_address
                    || ours.receiver_address != theirs.receiver_address
                {
                    return Err(Error::UnsupportedSlate);
                }
            }
            _ => return Err(Error::UnsupportedSlate),
        }

        // Original participants must survive unchanged.
        for original in &initiating.participants {
            if !self.participants.contains(original) {
                return Err(Error::UnsupportedSlate);
            }
        }

        // At least one output beyond what the originator already had.
        if self.outputs.len() <= initiating.outputs.len() {
            return Err(Error::UnsupportedSlate);
        }
        for original in &initiating.outputs {
            if !self.outputs.contains(original) {
                return Err(Error::UnsupportedSlate);
            }
        }
        Ok(())
    }

    /// Verify the recipient's payment-proof signature against the
    /// kernel excess, amount and sender identity. A proof-less slate
    /// passes; a proof without a signature fails once the kernel is
    /// complete.
    pub fn verify_payment_proof(&self) -> Result<()> {
        let proof = match &self.payment_proof {
            Some(proof) => proof,
            None => return Ok(()),
        };
        let kernel = self.kernel()?;
        if !kernel.is_complete() {
            return Ok(());
        }
        let signature = proof
            .receiver_signature
            .as_ref()
            .ok_or(Error::UnsupportedSlate)?;

        if let Some(key) = proof.receiver_address.ed25519_key() {
            use ed25519_dalek::{Signature as EdSignature, Verifier, VerifyingKey};
            let msg =
                PaymentProof::message_ed25519(self.amount, &kernel.excess, &proof.sender_address)?;
            let verifying =
                VerifyingKey::from_bytes(&key).map_err(|_| Error::UnsupportedSlate)?;
            let sig_bytes: [u8; 64] =
                signature.as_slice().try_into().map_err(|_| Error::UnsupportedSlate)?;
            verifying
                .verify(&msg, &EdSignature::from_bytes(&sig_bytes))
                .map_err(|_| Error::UnsupportedSlate)?;
        } else if let Some(key) = proof.receiver_address.secp_key() {
            let msg =
                PaymentProof::message_secp(self.amount, &kernel.excess, &proof.sender_address)?;
            let sig = Signature::from_slice(signature).map_err(|_| Error::UnsupportedSlate)?;
            if !verify_final(&sig, &key, &msg)? {
                return Err(Error::UnsupportedSlate);
            }
        } else {
            return Err(Error::UnsupportedSlate);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Wire dispatch
    // ------------------------------------------------------------------

    /// Serialize into the given tier. The JSON tiers and the compact
    /// JSON form return text; SP returns the bit-packed record. The
    /// binary V4 form has its own entry point.
    pub fn serialize(&self, version: SlateVersion, purpose: SlatePurpose) -> Result<Vec<u8>> {
        match version {
            SlateVersion::V2 | SlateVersion::V3 => json::serialize(self, version),
            SlateVersion::V4 => compact::serialize(self),
            SlateVersion::SP => packed::serialize(self, purpose),
        }
    }

    /// Serialize into the fixed/variable binary V4 record.
    pub fn serialize_binary(&self) -> Result<Vec<u8>> {
        binary::serialize(self)
    }

    /// Reconstruct a slate from any wire tier, auto-detecting the
    /// tier from shape. A response is checked against (and, on the
    /// compact tier, merged with) its initiating slate. A returned
    /// slate always satisfies every invariant.
    pub fn deserialize(
        data: &[u8],
        network: Network,
        purpose: SlatePurpose,
        initiating: Option<&Slate>,
    ) -> Result<Slate> {
        let first = data
            .iter()
            .copied()
            .find(|b| !b.is_ascii_whitespace())
            .ok_or(Error::InvalidData)?;

        let slate = if first == b'{' {
            let value: serde_json::Value =
                serde_json::from_slice(data).map_err(|_| Error::InvalidData)?;
            if value.get("version_info").is_some() {
                json::deserialize(&value, network)?
            } else if value.get("ver").is_some() {
                compact::deserialize(&value, network)?
            } else {
                tracing::debug!("json object with no version marker");
                return Err(Error::InvalidData);
            }
        } else if binary::has_marker(data) {
            binary::deserialize(data, network)?
        } else {
            packed::deserialize(data, network, purpose, initiating)?
        };

        if purpose.is_response() {
            let initiating = initiating.ok_or(Error::UnsupportedSlate)?;
            slate.check_response_against(initiating)?;
        }
        slate.check_invariants()?;
        Ok(slate)
    }
}

fn strictly_increasing<T: Ord>(iter: impl Iterator<Item = T>) -> bool {
    let mut last: Option<T> = None;
    for item in iter {
        if let Some(previous) = &last {
            if *previous >= item {
                return false;
            }
        }
        last = Some(item);
    }
    true
}

fn has_cut_through(inputs: &[Input], outputs: &[Output]) -> bool {
    inputs
        .iter()
        .any(|i| outputs.iter().any(|o| o.commit == i.commit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::commit;
    use crate::entities::OutputFeatures;

    fn slate_with_io() -> (Slate, SecretScalar, SecretScalar) {
        let mut slate = Slate::new(
            Network::MwcMainnet,
            1_000_000,
            Network::MwcMainnet.required_fee(1, 1, 1),
            4,
            KernelFeatures::Plain,
        );
        let bi = SecretScalar::random().unwrap();
        let bo = SecretScalar::random().unwrap();
        let input = Input::new(
            OutputFeatures::Plain,
            commit(1_000_000 + slate.fee, &bi).unwrap(),
        );
        let output = Output::new(
            OutputFeatures::Plain,
            commit(1_000_000, &bo).unwrap(),
            vec![0xCD; 100],
        );
        assert!(slate.add_inputs(vec![input], 1));
        assert!(slate.add_outputs(vec![output]));
        (slate, bi, bo)
    }

    #[test]
    fn test_new_slate_passes_invariants_without_participants() {
        let (slate, _, _) = slate_with_io();
        slate.check_invariants().unwrap();
        assert_eq!(slate.state, SlateState::Building);
    }

    #[test]
    fn test_duplicate_input_rejected_and_slate_unchanged() {
        let (mut slate, _, _) = slate_with_io();
        let before = slate.clone();
        let duplicate = slate.inputs[0];
        assert!(!slate.add_inputs(vec![duplicate], 1));
        assert_eq!(slate, before);
    }

    #[test]
    fn test_cut_through_rejected() {
        let (mut slate, _, _) = slate_with_io();
        let before = slate.clone();
        let echo = Input::new(slate.outputs[0].features, slate.outputs[0].commit);
        assert!(!slate.add_inputs(vec![echo], 1));
        assert_eq!(slate, before);
    }

    #[test]
    fn test_empty_add_is_idempotent() {
        let (mut slate, _, _) = slate_with_io();
        let before = slate.clone();
        assert!(slate.add_inputs(vec![], 1));
        assert!(slate.add_outputs(vec![]));
        assert_eq!(slate, before);
    }

    #[test]
    fn test_weight_limit_enforced() {
        let mut slate = Slate::new(
            Network::MwcMainnet,
            10,
            Network::MwcMainnet.base_fee(),
            0,
            KernelFeatures::Plain,
        );
        // More anticipated outputs than a block can hold.
        assert!(!slate.add_inputs(vec![], 3_000));
    }

    #[test]
    fn test_ttl_must_exceed_heights() {
        let (mut slate, _, _) = slate_with_io();
        slate.ttl_cutoff_height = Some(4);
        assert!(slate.check_invariants().is_err());
        slate.ttl_cutoff_height = Some(5);
        slate.check_invariants().unwrap();
    }

    #[test]
    fn test_participant_bookkeeping() {
        let (mut slate, _, _) = slate_with_io();
        let x0 = SecretScalar::random().unwrap();
        let k0 = SecretScalar::random().unwrap();
        let sender = Participant::new(
            0,
            PublicKey::from_secret(&x0).unwrap(),
            PublicKey::from_secret(&k0).unwrap(),
        );
        slate.add_participant(sender.clone()).unwrap();
        // Same id twice is a protocol violation.
        assert!(slate.add_participant(sender).is_err());
        slate.check_invariants().unwrap();
    }

    #[test]
    fn test_offset_combination() {
        let (mut slate, _, _) = slate_with_io();
        let share = SecretScalar::random().unwrap();
        slate.combine_offsets(&share).unwrap();
        assert_eq!(slate.offset, share);
        let other = SecretScalar::random().unwrap();
        slate.combine_offsets(&other).unwrap();
        assert_ne!(slate.offset, share);
        assert!(!slate.offset.is_zero());
    }

    #[test]
    fn test_get_transaction_requires_finalized() {
        let (slate, _, _) = slate_with_io();
        assert!(slate.get_transaction().is_err());
    }
}
