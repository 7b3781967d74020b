// Armored-text framing for slatepack transport
//
// BEGINSLATEPACK. <base58 words>. ENDSLATEPACK. — the base58 payload
// carries a four-byte double-SHA256 error-check code ahead of the
// binary record, and is broken into fifteen-character words so the
// text survives hand transport. Every decode failure is the same
// opaque fault.

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

const HEADER: &str = "BEGINSLATEPACK.";
const FOOTER: &str = "ENDSLATEPACK.";
const WORD_LENGTH: usize = 15;
const WORDS_PER_LINE: usize = 200;

fn error_check_code(payload: &[u8]) -> [u8; 4] {
    let digest = Sha256::digest(Sha256::digest(payload));
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Frame a binary record as armored text.
pub fn encode(payload: &[u8]) -> String {
    let mut checked = Vec::with_capacity(payload.len() + 4);
    checked.extend_from_slice(&error_check_code(payload));
    checked.extend_from_slice(payload);
    let encoded = bs58::encode(checked).into_string();

    let mut out = String::with_capacity(encoded.len() + encoded.len() / WORD_LENGTH + 64);
    out.push_str(HEADER);
    out.push(' ');
    let chars: Vec<char> = encoded.chars().collect();
    for (index, word) in chars.chunks(WORD_LENGTH).enumerate() {
        if index > 0 {
            if index % WORDS_PER_LINE == 0 {
                out.push('\n');
            } else {
                out.push(' ');
            }
        }
        out.extend(word);
    }
    out.push_str(". ");
    out.push_str(FOOTER);
    out
}

/// Strip the framing and recover the binary record. Checksum
/// mismatches, framing damage and non-printable header bytes all
/// collapse into the opaque invalid-data fault.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    // The armor must be printable ASCII plus whitespace throughout.
    if !text
        .bytes()
        .all(|b| b.is_ascii_graphic() || b == b' ' || b == b'\n' || b == b'\r' || b == b'\t')
    {
        tracing::debug!("armor contains non-printable bytes");
        return Err(Error::InvalidData);
    }
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix(HEADER)
        .and_then(|rest| rest.strip_suffix(FOOTER))
        .ok_or(Error::InvalidData)?;
    // The payload ends at the period before the footer.
    let body = body.trim();
    let body = body.strip_suffix('.').ok_or(Error::InvalidData)?;

    let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(Error::InvalidData);
    }
    let checked = bs58::decode(&compact)
        .into_vec()
        .map_err(|_| Error::InvalidData)?;
    if checked.len() < 4 {
        return Err(Error::InvalidData);
    }
    let (code, payload) = checked.split_at(4);
    if code != error_check_code(payload) {
        tracing::debug!("armor error-check code mismatch");
        return Err(Error::InvalidData);
    }
    Ok(payload.to_vec())
}
