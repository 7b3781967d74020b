// Age-compatible encryption for confidential slate transport
//
// File layout follows age v1: a textual header with one X25519
// recipient stanza and an HMAC line, then a 16-byte payload-key nonce
// and 64 KiB ChaCha20-Poly1305 STREAM chunks with the final-chunk
// flag folded into the nonce. Recipients are ed25519 keys (the same
// keys the addresses carry), mapped to X25519 for the ECDH.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use ed25519_dalek::SigningKey;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::{Digest, Sha256, Sha512};
use x25519_dalek::{PublicKey as X25519Public, StaticSecret};
use zeroize::Zeroize;

use crate::error::{Error, Result};

const VERSION_LINE: &str = "age-encryption.org/v1";
const STANZA_TAG: &str = "X25519";
const X25519_INFO: &[u8] = b"age-encryption.org/v1/X25519";
const HEADER_INFO: &[u8] = b"header";
const PAYLOAD_INFO: &[u8] = b"payload";
/// STREAM chunk size.
const CHUNK_SIZE: usize = 64 * 1024;

/// HKDF-SHA256 (RFC 5869), one output block — 32 bytes covers every
/// key this format derives.
fn hkdf(ikm: &[u8], salt: &[u8], info: &[u8]) -> [u8; 32] {
    let mut extract =
        <Hmac<Sha256> as Mac>::new_from_slice(salt).expect("hmac accepts any key length");
    extract.update(ikm);
    let prk = extract.finalize().into_bytes();

    let mut expand =
        <Hmac<Sha256> as Mac>::new_from_slice(&prk).expect("hmac accepts any key length");
    expand.update(info);
    expand.update(&[0x01]);
    expand.finalize().into_bytes().into()
}

/// Map an ed25519 verifying key to X25519 (birational Edwards →
/// Montgomery map).
pub fn ed25519_public_to_x25519(key: &[u8; 32]) -> Result<X25519Public> {
    use curve25519_dalek::edwards::CompressedEdwardsY;
    let point = CompressedEdwardsY::from_slice(key)
        .map_err(|_| Error::InvalidData)?
        .decompress()
        .ok_or(Error::InvalidData)?;
    Ok(X25519Public::from(point.to_montgomery().to_bytes()))
}

/// Map an ed25519 signing key to an X25519 static secret: the clamped
/// SHA-512 prefix, exactly as ed25519 derives its own scalar.
pub fn ed25519_secret_to_x25519(key: &SigningKey) -> StaticSecret {
    let mut digest = Sha512::digest(key.to_bytes());
    let mut secret = [0u8; 32];
    secret.copy_from_slice(&digest[..32]);
    let out = StaticSecret::from(secret);
    secret.zeroize();
    digest.as_mut_slice().zeroize();
    out
}

fn stream_nonce(counter: u64, last: bool) -> Nonce {
    let mut nonce = [0u8; 12];
    nonce[3..11].copy_from_slice(&counter.to_be_bytes());
    nonce[11] = last as u8;
    Nonce::from(nonce)
}

/// Encrypt `plaintext` to a single ed25519-keyed recipient.
pub fn encrypt(plaintext: &[u8], recipient: &[u8; 32]) -> Result<Vec<u8>> {
    let recipient_x = ed25519_public_to_x25519(recipient)?;

    let mut file_key = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut file_key);

    // Wrap the file key for the recipient.
    let ephemeral = StaticSecret::random_from_rng(rand::rngs::OsRng);
    let ephemeral_pub = X25519Public::from(&ephemeral);
    let shared = ephemeral.diffie_hellman(&recipient_x);
    let mut salt = Vec::with_capacity(64);
    salt.extend_from_slice(ephemeral_pub.as_bytes());
    salt.extend_from_slice(recipient_x.as_bytes());
    let mut wrap_key = hkdf(shared.as_bytes(), &salt, X25519_INFO);

    let cipher = ChaCha20Poly1305::new_from_slice(&wrap_key).expect("32-byte key");
    let wrapped = cipher
        .encrypt(&Nonce::default(), file_key.as_slice())
        .map_err(|_| Error::InvalidData)?;
    wrap_key.zeroize();

    // Header with recipient stanza, then its MAC.
    let mut header = String::new();
    header.push_str(VERSION_LINE);
    header.push('\n');
    header.push_str("-> ");
    header.push_str(STANZA_TAG);
    header.push(' ');
    header.push_str(&STANDARD_NO_PAD.encode(ephemeral_pub.as_bytes()));
    header.push('\n');
    header.push_str(&STANDARD_NO_PAD.encode(&wrapped));
    header.push('\n');
    header.push_str("---");

    let mut mac_key = hkdf(&file_key, &[], HEADER_INFO);
    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(&mac_key).expect("32-byte key");
    mac.update(header.as_bytes());
    let header_mac = mac.finalize().into_bytes();
    mac_key.zeroize();

    let mut out = header.into_bytes();
    out.push(b' ');
    out.extend_from_slice(STANDARD_NO_PAD.encode(header_mac).as_bytes());
    out.push(b'\n');

    // Payload: nonce, then STREAM chunks.
    let mut nonce = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    out.extend_from_slice(&nonce);

    let mut payload_key = hkdf(&file_key, &nonce, PAYLOAD_INFO);
    file_key.zeroize();
    let cipher = ChaCha20Poly1305::new_from_slice(&payload_key).expect("32-byte key");
    payload_key.zeroize();

    let chunks: Vec<&[u8]> = if plaintext.is_empty() {
        vec![&[]]
    } else {
        plaintext.chunks(CHUNK_SIZE).collect()
    };
    let last_index = chunks.len() - 1;
    for (index, chunk) in chunks.into_iter().enumerate() {
        let sealed = cipher
            .encrypt(&stream_nonce(index as u64, index == last_index), chunk)
            .map_err(|_| Error::InvalidData)?;
        out.extend_from_slice(&sealed);
    }
    Ok(out)
}

/// Decrypt with the recipient's ed25519 signing key. Every parse,
/// MAC and AEAD failure is the same opaque fault.
pub fn decrypt(data: &[u8], recipient: &SigningKey) -> Result<Vec<u8>> {
    let secret = ed25519_secret_to_x25519(recipient);
    let recipient_x = X25519Public::from(&secret);

    // Split the textual header from the binary payload: four
    // newline-terminated lines.
    let mut offset = 0;
    let mut lines = Vec::with_capacity(4);
    for _ in 0..4 {
        let end = data[offset..]
            .iter()
            .position(|&b| b == b'\n')
            .ok_or(Error::InvalidData)?;
        let line =
            std::str::from_utf8(&data[offset..offset + end]).map_err(|_| Error::InvalidData)?;
        lines.push(line.to_string());
        offset += end + 1;
    }
    let payload = &data[offset..];

    if lines[0] != VERSION_LINE {
        return Err(Error::InvalidData);
    }
    let stanza = lines[1].strip_prefix("-> ").ok_or(Error::InvalidData)?;
    let (tag, argument) = stanza.split_once(' ').ok_or(Error::InvalidData)?;
    if tag != STANZA_TAG {
        tracing::debug!(tag, "unrecognized stanza");
        return Err(Error::InvalidData);
    }
    let ephemeral_bytes: [u8; 32] = STANDARD_NO_PAD
        .decode(argument)
        .map_err(|_| Error::InvalidData)?
        .try_into()
        .map_err(|_| Error::InvalidData)?;
    let ephemeral_pub = X25519Public::from(ephemeral_bytes);
    let wrapped = STANDARD_NO_PAD
        .decode(&lines[2])
        .map_err(|_| Error::InvalidData)?;
    let (mac_marker, mac_b64) = lines[3].split_once(' ').ok_or(Error::InvalidData)?;
    if mac_marker != "---" {
        return Err(Error::InvalidData);
    }
    let claimed_mac = STANDARD_NO_PAD
        .decode(mac_b64)
        .map_err(|_| Error::InvalidData)?;

    // Unwrap the file key.
    let shared = secret.diffie_hellman(&ephemeral_pub);
    let mut salt = Vec::with_capacity(64);
    salt.extend_from_slice(ephemeral_pub.as_bytes());
    salt.extend_from_slice(recipient_x.as_bytes());
    let mut wrap_key = hkdf(shared.as_bytes(), &salt, X25519_INFO);
    let cipher = ChaCha20Poly1305::new_from_slice(&wrap_key).expect("32-byte key");
    let file_key_vec = cipher
        .decrypt(&Nonce::default(), wrapped.as_slice())
        .map_err(|_| Error::InvalidData)?;
    wrap_key.zeroize();
    let mut file_key: [u8; 16] =
        file_key_vec.as_slice().try_into().map_err(|_| Error::InvalidData)?;

    // Re-verify the header MAC over everything up to the marker.
    let header_text = format!(
        "{}\n{}\n{}\n---",
        lines[0], lines[1], lines[2]
    );
    let mut mac_key = hkdf(&file_key, &[], HEADER_INFO);
    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(&mac_key).expect("32-byte key");
    mac.update(header_text.as_bytes());
    mac_key.zeroize();
    if mac.verify_slice(&claimed_mac).is_err() {
        tracing::debug!("header mac mismatch");
        file_key.zeroize();
        return Err(Error::InvalidData);
    }

    // Payload.
    if payload.len() < 16 {
        file_key.zeroize();
        return Err(Error::InvalidData);
    }
    let (nonce, mut sealed) = payload.split_at(16);
    let mut payload_key = hkdf(&file_key, nonce, PAYLOAD_INFO);
    file_key.zeroize();
    let cipher = ChaCha20Poly1305::new_from_slice(&payload_key).expect("32-byte key");
    payload_key.zeroize();

    let mut plaintext = Vec::with_capacity(sealed.len());
    let mut counter = 0u64;
    loop {
        let tagged_chunk = CHUNK_SIZE + 16;
        let last = sealed.len() <= tagged_chunk;
        let take = sealed.len().min(tagged_chunk);
        if take < 16 {
            return Err(Error::InvalidData);
        }
        let (chunk, rest) = sealed.split_at(take);
        let opened = cipher
            .decrypt(&stream_nonce(counter, last), chunk)
            .map_err(|_| Error::InvalidData)?;
        plaintext.extend_from_slice(&opened);
        sealed = rest;
        counter += 1;
        if last {
            break;
        }
    }
    Ok(plaintext)
}
