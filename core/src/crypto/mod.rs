// Cryptographic protocol driver
//
// The curve arithmetic itself comes from k256; this module drives it
// the way the slate protocol needs and owns the wire byte forms.

pub mod secp;

pub use secp::{
    add_signatures, blind_sum, commit, is_valid_scalar, offset_add, pubkey_sum, sign_partial,
    transaction_excess, verify_final, verify_kernel_sum, verify_partial, Commitment, PublicKey,
    SecretScalar, Signature, MAX_UNIQUE_ATTEMPTS,
};

use crate::codec::MAX_PROOF_SIZE;
use crate::error::{Error, Result};

/// Format check for a range proof. Proofs are produced and
/// cryptographically verified elsewhere (signer and chain); the slate
/// only vouches for their shape.
pub fn verify_rangeproof_format(proof: &[u8]) -> Result<()> {
    if proof.is_empty() || proof.len() > MAX_PROOF_SIZE {
        return Err(Error::InvalidData);
    }
    Ok(())
}
