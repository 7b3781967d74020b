// secp256k1 protocol driver
//
// Pedersen commitments, the kernel-sum identity and the single-signer
// signature scheme, built on k256's low-level arithmetic. This module
// owns the byte representations the wire formats carry: 33-byte
// commitments (0x08/0x09 prefix), 33-byte compressed public keys and
// 64-byte (R.x ‖ s) signatures with an even-y nonce convention.

use k256::elliptic_curve::group::Group;
use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::elliptic_curve::{Field, PrimeField};
use k256::{AffinePoint, EncodedPoint, FieldBytes, NonZeroScalar, ProjectivePoint, Scalar};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Collaborator, Error, Result};

/// The value generator H: the standard secp256k1-zkp NUMS point, so
/// commitments here sum against the same generator every MimbleWimble
/// chain uses.
const GENERATOR_H: &str = "0250929b74c1a04954b78b4b6035e97a5e078a5a0f28ec96d547bfee9ace803ac0";

/// Bound on retry-until-valid loops for random scalar draws.
pub const MAX_UNIQUE_ATTEMPTS: usize = 64;

fn crypto_fault(operation: &'static str) -> Error {
    Error::collaborator(Collaborator::Crypto, operation)
}

fn generator_h() -> ProjectivePoint {
    static H: OnceLock<ProjectivePoint> = OnceLock::new();
    *H.get_or_init(|| {
        let bytes = hex::decode(GENERATOR_H).expect("generator constant");
        decode_point(&bytes).expect("generator constant")
    })
}

fn decode_point(bytes: &[u8]) -> Result<ProjectivePoint> {
    let encoded = EncodedPoint::from_bytes(bytes).map_err(|_| Error::InvalidData)?;
    let affine =
        Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
            .ok_or(Error::InvalidData)?;
    Ok(ProjectivePoint::from(affine))
}

fn compress_point(point: &ProjectivePoint) -> [u8; 33] {
    let encoded = point.to_affine().to_encoded_point(true);
    let mut out = [0u8; 33];
    out.copy_from_slice(encoded.as_bytes());
    out
}

/// A 33-byte Pedersen commitment. All-zero is the placeholder a kernel
/// carries until finalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Commitment(pub [u8; 33]);

impl Commitment {
    pub fn zero() -> Self {
        Commitment([0u8; 33])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 33]
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; 33] = bytes.try_into().map_err(|_| Error::InvalidData)?;
        Ok(Commitment(arr))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        Self::from_slice(&hex::decode(s).map_err(|_| Error::InvalidData)?)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }

    /// Commitments carry an 0x08/0x09 parity prefix where SEC1 uses
    /// 0x02/0x03; the underlying point is the same.
    pub(crate) fn to_point(self) -> Result<ProjectivePoint> {
        let mut sec1 = self.0;
        sec1[0] = match sec1[0] {
            0x08 => 0x02,
            0x09 => 0x03,
            _ => return Err(Error::InvalidData),
        };
        decode_point(&sec1)
    }

    pub(crate) fn from_point(point: &ProjectivePoint) -> Self {
        let mut bytes = compress_point(point);
        bytes[0] += 6;
        Commitment(bytes)
    }

    /// Reinterpret as a public key, e.g. to verify a kernel signature
    /// against its own excess.
    pub fn to_pubkey(self) -> Result<PublicKey> {
        let point = self.to_point()?;
        Ok(PublicKey(compress_point(&point)))
    }

    /// Format check used during wire decode: parseable as a curve
    /// point, or the all-zero placeholder.
    pub fn verify_format(&self) -> Result<()> {
        if self.is_zero() {
            return Ok(());
        }
        self.to_point().map(|_| ())
    }
}

/// A compressed secp256k1 public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(pub [u8; 33]);

impl PublicKey {
    /// Accepts compressed or uncompressed SEC1 bytes; stores
    /// compressed.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 33 && bytes.len() != 65 {
            return Err(Error::InvalidData);
        }
        let point = decode_point(bytes)?;
        Ok(PublicKey(compress_point(&point)))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        Self::from_slice(&hex::decode(s).map_err(|_| Error::InvalidData)?)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }

    pub fn from_secret(secret: &SecretScalar) -> Result<Self> {
        let scalar = secret.to_scalar()?;
        if bool::from(scalar.is_zero()) {
            return Err(crypto_fault("public key from zero scalar"));
        }
        Ok(PublicKey(compress_point(
            &(ProjectivePoint::GENERATOR * scalar),
        )))
    }

    fn to_point(self) -> Result<ProjectivePoint> {
        decode_point(&self.0)
    }

    /// A commitment and a public key are the same point in different
    /// clothes; the compact tier computes the kernel excess from key
    /// sums.
    pub fn to_commitment(self) -> Commitment {
        let mut bytes = self.0;
        bytes[0] += 6;
        Commitment(bytes)
    }
}

/// Sum public keys as curve points. Fails on an identity sum.
pub fn pubkey_sum(keys: &[PublicKey]) -> Result<PublicKey> {
    let mut acc = ProjectivePoint::IDENTITY;
    for key in keys {
        acc += key.to_point()?;
    }
    if bool::from(acc.is_identity()) {
        return Err(crypto_fault("public key sum"));
    }
    Ok(PublicKey(compress_point(&acc)))
}

/// A 64-byte single-signer signature: R.x ‖ s, big-endian, with R
/// normalized to even y.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

impl Signature {
    pub fn zero() -> Self {
        Signature([0u8; 64])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 64]
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; 64] = bytes.try_into().map_err(|_| Error::InvalidData)?;
        Ok(Signature(arr))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        Self::from_slice(&hex::decode(s).map_err(|_| Error::InvalidData)?)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    fn rx(&self) -> [u8; 32] {
        self.0[..32].try_into().expect("fixed split")
    }

    fn s(&self) -> Result<Scalar> {
        scalar_from_bytes(self.0[32..].try_into().expect("fixed split"))
    }
}

/// A 32-byte secret scalar: blinding factors, offsets, secret nonces.
/// Wiped on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretScalar(pub [u8; 32]);

impl std::fmt::Debug for SecretScalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        write!(f, "SecretScalar(..)")
    }
}

impl SecretScalar {
    pub fn zero() -> Self {
        SecretScalar([0u8; 32])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Canonical scalar bytes only; the all-zero placeholder is
    /// accepted so unfinished slates can carry it.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| Error::InvalidData)?;
        scalar_from_bytes(arr)?;
        Ok(SecretScalar(arr))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        Self::from_slice(&hex::decode(s).map_err(|_| Error::InvalidData)?)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Draw a fresh non-zero scalar. The retry loop is bounded; the
    /// bound is unreachable in practice but keeps an adversarial
    /// environment from turning this into a spin.
    pub fn random() -> Result<Self> {
        for _ in 0..MAX_UNIQUE_ATTEMPTS {
            let candidate = NonZeroScalar::random(&mut OsRng);
            let bytes: [u8; 32] = candidate.to_bytes().into();
            if bytes != [0u8; 32] {
                return Ok(SecretScalar(bytes));
            }
        }
        Err(crypto_fault("random scalar"))
    }

    fn to_scalar(&self) -> Result<Scalar> {
        scalar_from_bytes(self.0)
    }
}

fn scalar_from_bytes(bytes: [u8; 32]) -> Result<Scalar> {
    Option::<Scalar>::from(Scalar::from_repr(FieldBytes::from(bytes)))
        .ok_or(Error::InvalidData)
}

fn scalar_to_bytes(scalar: &Scalar) -> [u8; 32] {
    scalar.to_bytes().into()
}

/// True iff the bytes are a canonical scalar encoding.
pub fn is_valid_scalar(bytes: &[u8; 32]) -> bool {
    scalar_from_bytes(*bytes).is_ok()
}

/// Σpositive − Σnegative over secret scalars, e.g. output blinds minus
/// input blinds minus the offset. Rejects a zero result.
pub fn blind_sum(positive: &[&SecretScalar], negative: &[&SecretScalar]) -> Result<SecretScalar> {
    let mut acc = Scalar::ZERO;
    for s in positive {
        acc += s.to_scalar()?;
    }
    for s in negative {
        acc -= s.to_scalar()?;
    }
    if bool::from(acc.is_zero()) {
        return Err(crypto_fault("blind sum"));
    }
    Ok(SecretScalar(scalar_to_bytes(&acc)))
}

/// Sum two offset shares. Used by the compact tier, where each party
/// holds half of the final offset.
pub fn offset_add(a: &SecretScalar, b: &SecretScalar) -> Result<SecretScalar> {
    blind_sum(&[a, b], &[])
}

/// Pedersen commitment `blind·G + value·H`.
pub fn commit(value: u64, blind: &SecretScalar) -> Result<Commitment> {
    let point =
        ProjectivePoint::GENERATOR * blind.to_scalar()? + generator_h() * Scalar::from(value);
    if bool::from(point.is_identity()) {
        return Err(crypto_fault("commit"));
    }
    Ok(Commitment::from_point(&point))
}

/// The transaction's cryptographic excess:
/// Σoutputs − Σinputs + overage·H − offset·G.
pub fn transaction_excess(
    inputs: &[Commitment],
    outputs: &[Commitment],
    overage: u64,
    offset: &SecretScalar,
) -> Result<Commitment> {
    let mut acc = ProjectivePoint::IDENTITY;
    for c in outputs {
        acc += c.to_point()?;
    }
    for c in inputs {
        acc -= c.to_point()?;
    }
    acc += generator_h() * Scalar::from(overage);
    if !offset.is_zero() {
        acc -= ProjectivePoint::GENERATOR * offset.to_scalar()?;
    }
    if bool::from(acc.is_identity()) {
        return Err(crypto_fault("transaction excess"));
    }
    Ok(Commitment::from_point(&acc))
}

/// The aggregate kernel-sum identity of a finalized transaction:
/// Σoutputs − Σinputs + overage·H must equal Σexcess + offset·G.
pub fn verify_kernel_sum(
    inputs: &[Commitment],
    outputs: &[Commitment],
    overage: u64,
    offset: &SecretScalar,
    excess: &[Commitment],
) -> Result<bool> {
    let mut lhs = ProjectivePoint::IDENTITY;
    for c in outputs {
        lhs += c.to_point()?;
    }
    for c in inputs {
        lhs -= c.to_point()?;
    }
    lhs += generator_h() * Scalar::from(overage);

    let mut rhs = ProjectivePoint::IDENTITY;
    for c in excess {
        rhs += c.to_point()?;
    }
    if !offset.is_zero() {
        rhs += ProjectivePoint::GENERATOR * offset.to_scalar()?;
    }
    Ok(lhs == rhs)
}

/// Schnorr challenge: SHA-256(R.x ‖ P ‖ m) reduced to a scalar.
fn challenge(rx: &[u8; 32], pubkey: &PublicKey, msg: &[u8; 32]) -> Scalar {
    let mut hasher = Sha256::new();
    hasher.update(rx);
    hasher.update(pubkey.as_bytes());
    hasher.update(msg);
    let digest: [u8; 32] = hasher.finalize().into();
    <Scalar as Reduce<k256::U256>>::reduce_bytes(&FieldBytes::from(digest))
}

/// Whether the aggregate nonce needs negating to meet the even-y
/// convention, plus its x coordinate.
fn normalize_nonce(nonce_sum: &PublicKey) -> Result<(bool, [u8; 32])> {
    let odd = nonce_sum.0[0] == 0x03;
    let rx: [u8; 32] = nonce_sum.0[1..].try_into().expect("fixed split");
    if nonce_sum.0[0] != 0x02 && nonce_sum.0[0] != 0x03 {
        return Err(Error::InvalidData);
    }
    Ok((odd, rx))
}

/// One participant's partial signature over the kernel message.
/// `secret` and `secret_nonce` are the participant's own shares;
/// `nonce_sum` and `pubkey_sum` aggregate every participant.
pub fn sign_partial(
    secret: &SecretScalar,
    secret_nonce: &SecretScalar,
    nonce_sum: &PublicKey,
    pubkey_sum: &PublicKey,
    msg: &[u8; 32],
) -> Result<Signature> {
    let (negate, rx) = normalize_nonce(nonce_sum)?;
    let x = secret.to_scalar()?;
    let mut k = secret_nonce.to_scalar()?;
    if negate {
        k = -k;
    }
    let e = challenge(&rx, pubkey_sum, msg);
    let s = k + e * x;

    let mut out = [0u8; 64];
    out[..32].copy_from_slice(&rx);
    out[32..].copy_from_slice(&scalar_to_bytes(&s));
    Ok(Signature(out))
}

/// Check one participant's partial signature against the aggregate
/// sums and that participant's own public nonce and blind excess.
pub fn verify_partial(
    sig: &Signature,
    nonce_sum: &PublicKey,
    pubkey_sum: &PublicKey,
    public_nonce: &PublicKey,
    public_blind: &PublicKey,
    msg: &[u8; 32],
) -> Result<bool> {
    let (negate, rx) = normalize_nonce(nonce_sum)?;
    if sig.rx() != rx {
        return Ok(false);
    }
    let e = challenge(&rx, pubkey_sum, msg);
    let s = match sig.s() {
        Ok(s) => s,
        Err(_) => return Ok(false),
    };

    let mut r_i = public_nonce.to_point()?;
    if negate {
        r_i = -r_i;
    }
    let lhs = ProjectivePoint::GENERATOR * s;
    let rhs = r_i + public_blind.to_point()? * e;
    Ok(lhs == rhs)
}

/// Sum partial signatures into the final kernel signature. All
/// partials must share the aggregate nonce's x coordinate.
pub fn add_signatures(partials: &[Signature], nonce_sum: &PublicKey) -> Result<Signature> {
    let (_, rx) = normalize_nonce(nonce_sum)?;
    let mut s = Scalar::ZERO;
    for partial in partials {
        if partial.rx() != rx {
            return Err(crypto_fault("signature aggregation"));
        }
        s += partial.s().map_err(|_| crypto_fault("signature aggregation"))?;
    }
    let mut out = [0u8; 64];
    out[..32].copy_from_slice(&rx);
    out[32..].copy_from_slice(&scalar_to_bytes(&s));
    Ok(Signature(out))
}

/// Verify a completed signature against a public key (for a kernel,
/// the excess reinterpreted as a key).
pub fn verify_final(sig: &Signature, pubkey: &PublicKey, msg: &[u8; 32]) -> Result<bool> {
    let rx = sig.rx();
    let mut compressed = [0u8; 33];
    compressed[0] = 0x02;
    compressed[1..].copy_from_slice(&rx);
    let r = match decode_point(&compressed) {
        Ok(point) => point,
        Err(_) => return Ok(false),
    };
    let s = match sig.s() {
        Ok(s) => s,
        Err(_) => return Ok(false),
    };
    let e = challenge(&rx, pubkey, msg);
    let lhs = ProjectivePoint::GENERATOR * s;
    let rhs = r + pubkey.to_point()? * e;
    Ok(lhs == rhs)
}
