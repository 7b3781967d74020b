// Slatewire Core — Slate Negotiation Spine
//
// Two wallets, one transaction, no shared secrets: everything here
// exists so both sides can fill in one slate and end up with a kernel
// that verifies.

pub mod address;
pub mod codec;
pub mod crypto;
pub mod entities;
pub mod envelope;
pub mod error;
pub mod node;
pub mod policy;
pub mod ser;
pub mod signer;
pub mod slate;

pub use address::{MqsAddress, OnionAddress, ProofAddress, SlatepackAddress};
pub use crypto::{Commitment, PublicKey, SecretScalar, Signature};
pub use entities::{Input, Kernel, KernelFeatures, Output, OutputFeatures, Participant};
pub use error::{Collaborator, Error, Result};
pub use node::NodeClient;
pub use policy::Network;
pub use signer::Signer;
pub use slate::{
    PaymentProof, Slate, SlatePurpose, SlateState, SlateVersion, Transaction, TransactionBody,
};
pub use envelope::TransferMode;
