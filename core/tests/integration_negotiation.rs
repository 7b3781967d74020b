// End-to-end negotiation: sender builds, recipient responds, sender
// finalizes. Real curve math throughout — the only things mocked are
// the range proofs, which the slate only format-checks.

use slatewire_core::crypto::{
    add_signatures, blind_sum, commit, pubkey_sum, sign_partial, SecretScalar,
};
use slatewire_core::entities::{Input, Output, OutputFeatures, Participant};
use slatewire_core::{
    Error, KernelFeatures, Network, PaymentProof, ProofAddress, PublicKey, Slate, SlatePurpose,
    SlateState, SlateVersion,
};

struct Party {
    secret: SecretScalar,
    nonce: SecretScalar,
    public: PublicKey,
    public_nonce: PublicKey,
}

impl Party {
    fn new(secret: SecretScalar) -> Self {
        let nonce = SecretScalar::random().unwrap();
        let public = PublicKey::from_secret(&secret).unwrap();
        let public_nonce = PublicKey::from_secret(&nonce).unwrap();
        Party {
            secret,
            nonce,
            public,
            public_nonce,
        }
    }
}

/// One input covering amount + fee exactly, no change output on the
/// sender side.
fn sender_slate(network: Network) -> (Slate, Party) {
    let amount = 1_000_000;
    let fee = network.required_fee(1, 1, 1);
    let mut slate = Slate::new(network, amount, fee, 4, KernelFeatures::Plain);

    let input_blind = SecretScalar::random().unwrap();
    let input = Input::new(OutputFeatures::Plain, commit(amount + fee, &input_blind).unwrap());
    assert!(slate.add_inputs(vec![input], 1));
    slate.create_offset().unwrap();

    // Sender's secret excess: -input_blind - offset (no own outputs).
    let secret = blind_sum(&[], &[&input_blind, &slate.offset]).unwrap();
    let sender = Party::new(secret);
    slate
        .add_participant(Participant::new(0, sender.public, sender.public_nonce))
        .unwrap();
    slate.check_invariants().unwrap();
    (slate, sender)
}

/// The recipient's turn: add the receiving output and a signed
/// participant entry.
fn respond(initial: &Slate) -> (Slate, Party) {
    let mut slate = initial.clone();
    let output_blind = SecretScalar::random().unwrap();
    let output = Output::new(
        OutputFeatures::Plain,
        commit(slate.amount, &output_blind).unwrap(),
        vec![0x9A; 300],
    );
    assert!(slate.add_outputs(vec![output]));

    let recipient = Party::new(output_blind);
    let nonce_sum = pubkey_sum(&[initial.participants[0].public_nonce, recipient.public_nonce])
        .unwrap();
    let key_sum =
        pubkey_sum(&[initial.participants[0].public_blind_excess, recipient.public]).unwrap();
    let msg = slate.kernel().unwrap().signature_message().unwrap();
    let part_sig = sign_partial(
        &recipient.secret,
        &recipient.nonce,
        &nonce_sum,
        &key_sum,
        &msg,
    )
    .unwrap();

    let mut entry = Participant::new(1, recipient.public, recipient.public_nonce);
    entry.part_sig = Some(part_sig);
    slate.add_participant(entry).unwrap();
    (slate, recipient)
}

fn finalize(slate: &mut Slate, sender: &Party) {
    let (nonce_sum, key_sum) = slate.pubkey_sums().unwrap();
    let msg = slate.kernel().unwrap().signature_message().unwrap();
    let sender_sig =
        sign_partial(&sender.secret, &sender.nonce, &nonce_sum, &key_sum, &msg).unwrap();
    slate.participants[0].part_sig = Some(sender_sig);

    slate.verify_partial_signatures().unwrap();
    let partials: Vec<_> = slate
        .participants
        .iter()
        .map(|p| p.part_sig.unwrap())
        .collect();
    let final_sig = add_signatures(&partials, &nonce_sum).unwrap();
    slate.set_final_signature(final_sig).unwrap();
}

#[test]
fn test_full_negotiation_round() {
    let network = Network::MwcMainnet;
    let (initial, sender) = sender_slate(network);

    // Over the wire to the recipient.
    let wire = initial.serialize(SlateVersion::V3, SlatePurpose::SendInitial).unwrap();
    let received = Slate::deserialize(&wire, network, SlatePurpose::SendInitial, None).unwrap();
    assert_eq!(received, initial);

    // Recipient responds; back over the wire to the sender.
    let (response, _) = respond(&received);
    let wire = response.serialize(SlateVersion::V3, SlatePurpose::SendResponse).unwrap();
    let mut settled =
        Slate::deserialize(&wire, network, SlatePurpose::SendResponse, Some(&initial)).unwrap();
    assert_eq!(settled.state, SlateState::Responded);

    finalize(&mut settled, &sender);
    assert_eq!(settled.state, SlateState::Finalized);

    // The finished body's kernel signature verifies against its own
    // excess (the kernel re-validates inside get_transaction's slate).
    let tx = settled.get_transaction().unwrap();
    assert_eq!(tx.body.kernels.len(), 1);
    assert!(tx.body.kernels[0].is_complete());
    tx.body.kernels[0].validate(network).unwrap();
}

#[test]
fn test_duplicate_inputs_fail_and_leave_slate_unchanged() {
    let network = Network::MwcMainnet;
    let (mut slate, _) = sender_slate(network);
    let before = slate.clone();
    let duplicate = slate.inputs[0];
    assert!(!slate.add_inputs(vec![duplicate], 1));
    assert_eq!(slate, before);
}

#[test]
fn test_response_with_altered_amount_is_rejected() {
    let network = Network::MwcMainnet;
    let (initial, _) = sender_slate(network);
    let (mut response, _) = respond(&initial);
    response.amount += 1;
    let wire = response.serialize(SlateVersion::V3, SlatePurpose::SendResponse).unwrap();

    let err =
        Slate::deserialize(&wire, network, SlatePurpose::SendResponse, Some(&initial)).unwrap_err();
    assert!(matches!(err, Error::UnsupportedSlate));
}

#[test]
fn test_response_must_add_an_output() {
    let network = Network::MwcMainnet;
    let (initial, _) = sender_slate(network);

    // A "response" that added nothing but a participant.
    let mut response = initial.clone();
    let freeloader = Party::new(SecretScalar::random().unwrap());
    response
        .add_participant(Participant::new(1, freeloader.public, freeloader.public_nonce))
        .unwrap();
    let wire = response.serialize(SlateVersion::V3, SlatePurpose::SendResponse).unwrap();
    assert!(Slate::deserialize(&wire, network, SlatePurpose::SendResponse, Some(&initial)).is_err());
}

#[test]
fn test_finalized_slate_is_immutable() {
    let network = Network::MwcMainnet;
    let (initial, sender) = sender_slate(network);
    let (mut slate, _) = respond(&initial);
    finalize(&mut slate, &sender);

    let before = slate.clone();
    let blind = SecretScalar::random().unwrap();
    let extra = Output::new(
        OutputFeatures::Plain,
        commit(5, &blind).unwrap(),
        vec![0x77; 80],
    );
    assert!(!slate.add_outputs(vec![extra]));
    assert!(!slate.add_inputs(vec![], 1));
    assert!(slate.create_offset().is_err());
    assert_eq!(slate, before);

    // A second finalization cannot happen either.
    let sig = slate.kernels[0].excess_sig;
    assert!(slate.set_final_signature(sig).is_err());
}

#[test]
fn test_bad_partial_signature_is_caught() {
    let network = Network::MwcMainnet;
    let (initial, _) = sender_slate(network);
    let (mut slate, _) = respond(&initial);

    // Corrupt the recipient's partial signature.
    let mut sig = slate.participants[1].part_sig.unwrap();
    sig.0[40] ^= 0x01;
    slate.participants[1].part_sig = Some(sig);
    assert!(matches!(
        slate.verify_partial_signatures(),
        Err(Error::UnsupportedSlate)
    ));
}

#[test]
fn test_payment_proof_verified_at_finalization() {
    use ed25519_dalek::{Signer as _, SigningKey};
    use rand::RngCore;

    let network = Network::MwcMainnet;
    let (mut initial, sender) = sender_slate(network);

    // Ed25519 address keys for both ends.
    let mut seed = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut seed);
    let sender_key = SigningKey::from_bytes(&seed);
    rand::rngs::OsRng.fill_bytes(&mut seed);
    let receiver_key = SigningKey::from_bytes(&seed);

    let sender_address = ProofAddress::Onion(
        slatewire_core::OnionAddress::from_key(sender_key.verifying_key().to_bytes()).unwrap(),
    );
    let receiver_address = ProofAddress::Onion(
        slatewire_core::OnionAddress::from_key(receiver_key.verifying_key().to_bytes()).unwrap(),
    );
    initial.payment_proof = Some(PaymentProof {
        sender_address,
        receiver_address,
        receiver_signature: None,
    });

    let (mut slate, _) = respond(&initial);

    // The recipient can compute the eventual excess from the slate
    // alone and sign it.
    let excess = slatewire_core::crypto::transaction_excess(
        &slate.inputs.iter().map(|i| i.commit).collect::<Vec<_>>(),
        &slate.outputs.iter().map(|o| o.commit).collect::<Vec<_>>(),
        slate.fee,
        &slate.offset,
    )
    .unwrap();
    let msg = PaymentProof::message_ed25519(slate.amount, &excess, &sender_address).unwrap();
    let rsig = receiver_key.sign(&msg).to_bytes().to_vec();
    slate.payment_proof.as_mut().unwrap().receiver_signature = Some(rsig.clone());

    finalize(&mut slate, &sender);
    assert_eq!(slate.state, SlateState::Finalized);
    slate.verify_payment_proof().unwrap();

    // A slate whose proof signature is damaged must not finalize.
    let (mut broken, _) = respond(&initial);
    let mut bad = rsig;
    bad[10] ^= 0xFF;
    broken.payment_proof.as_mut().unwrap().receiver_signature = Some(bad);
    let (nonce_sum, key_sum) = broken.pubkey_sums().unwrap();
    let kernel_msg = broken.kernel().unwrap().signature_message().unwrap();
    let sender_sig =
        sign_partial(&sender.secret, &sender.nonce, &nonce_sum, &key_sum, &kernel_msg).unwrap();
    broken.participants[0].part_sig = Some(sender_sig);
    let partials: Vec<_> = broken
        .participants
        .iter()
        .map(|p| p.part_sig.unwrap())
        .collect();
    let final_sig = add_signatures(&partials, &nonce_sum).unwrap();
    let before = broken.clone();
    assert!(broken.set_final_signature(final_sig).is_err());
    assert_eq!(broken, before);
}
