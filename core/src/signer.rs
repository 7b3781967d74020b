// Signer boundary — the hardware device (or software equivalent)
//
// The device owns every secret: blinds, nonces, proof keys. The slate
// never sees them; it only receives public keys and signatures. A
// session is strictly ordered — start, include each input/output,
// apply the offset, fetch the public key and nonce, then sign — and
// replaying the prefix of that sequence against a device holding live
// session state is part of the protocol (required before resuming a
// previously exported session), not an error.

use async_trait::async_trait;

use crate::address::ProofAddress;
use crate::crypto::{Commitment, PublicKey, SecretScalar, Signature};
use crate::entities::Kernel;
use crate::error::Result;

/// A key-derivation path: depth plus four child indices, matching the
/// wallet's BIP32-style tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyIdentifier {
    pub depth: u8,
    pub path: [u32; 4],
}

impl KeyIdentifier {
    pub fn new(depth: u8, path: [u32; 4]) -> Self {
        KeyIdentifier { depth, path }
    }
}

/// Whether a derived commitment uses the switch-commitment tweak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchCommitmentType {
    None,
    Regular,
}

/// Totals declared when a signing session starts. The device checks
/// the slate's claims against what it is later asked to include.
#[derive(Debug, Clone)]
pub struct SessionTotals {
    pub input_total: u64,
    pub output_total: u64,
    pub fee: u64,
    pub proof_address: Option<ProofAddress>,
}

#[async_trait]
pub trait Signer: Send {
    /// Deterministically derive an output commitment and range proof
    /// for a path, amount and switch type.
    async fn derive_output(
        &self,
        id: &KeyIdentifier,
        amount: u64,
        switch: SwitchCommitmentType,
    ) -> Result<(Commitment, Vec<u8>)>;

    /// Open a signing session, declaring totals up front.
    async fn start_session(&mut self, totals: SessionTotals) -> Result<()>;

    /// Declare one of the session's outputs.
    async fn include_output(
        &mut self,
        id: &KeyIdentifier,
        amount: u64,
        switch: SwitchCommitmentType,
    ) -> Result<()>;

    /// Declare one of the session's inputs.
    async fn include_input(
        &mut self,
        id: &KeyIdentifier,
        amount: u64,
        switch: SwitchCommitmentType,
    ) -> Result<()>;

    /// Fold the slate's offset into the session's blind sum.
    async fn apply_offset(&mut self, offset: &SecretScalar) -> Result<()>;

    /// The session's public blind excess.
    async fn public_blind_excess(&mut self) -> Result<PublicKey>;

    /// The session's public nonce.
    async fn public_nonce(&mut self) -> Result<PublicKey>;

    /// Export the session's secret nonce, encrypted by the device, so
    /// the session can resume later (the device may power off between
    /// the two signing rounds).
    async fn export_secret_nonce(&mut self) -> Result<Vec<u8>>;

    /// Restore a previously exported secret nonce. The caller must
    /// already have replayed start/include/apply-offset.
    async fn import_secret_nonce(&mut self, sealed: &[u8]) -> Result<()>;

    /// The final partial signature over the kernel's message, given
    /// the aggregate nonce and blind-excess sums.
    async fn partial_signature(
        &mut self,
        kernel: &Kernel,
        nonce_sum: &PublicKey,
        pubkey_sum: &PublicKey,
    ) -> Result<Signature>;

    /// Sign a payment-proof message with the session's proof-address
    /// key, when the session declared one.
    async fn payment_proof_signature(&mut self, message: &[u8]) -> Result<Vec<u8>>;

    /// Abandon the session, discarding device state. The slate-side
    /// equivalent is simply dropping the slate.
    async fn abandon_session(&mut self) -> Result<()>;
}
