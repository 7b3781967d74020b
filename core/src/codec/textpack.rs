// Dictionary byte-compressor for short free-text fields
//
// Participant messages are short human text; a fixed shared dictionary
// beats any general-purpose compressor at these sizes and keeps the
// wire format deterministic. Codes 0..DICT.len() name dictionary
// entries, ESCAPE_ONE carries a single verbatim byte and ESCAPE_RUN a
// length-prefixed verbatim run.

use crate::error::{Error, Result};

const ESCAPE_ONE: u8 = 254;
const ESCAPE_RUN: u8 = 255;

/// Shared compression dictionary. Order is part of the wire format; new
/// entries may only ever be appended.
const DICT: &[&str] = &[
    " ", "the", "e", "t", "a", "of", "o", "and", "i", "n", "s", "e ", "r", " th", " t", "in",
    "he", "th", "h", "he ", "to", "\r\n", "l", "s ", "d", " a", "an", "er", "c", " o", "d ", "on",
    " of", "re", "of ", "t ", ", ", "is", "u", "at", "   ", "n ", "or", "which", "f", "m", "as",
    "it", "that", "\n", "was", "en", "  ", " w", "es", " an", " i", "\r", "f ", "g", "p", "nd",
    " s", "nd ", "ed ", "w", "ed", "http://", "https://", "for", "te", "ing", "y ", "The", " c",
    "ti", "r ", "his", "st", " in", "ar", "nt", ",", " to", "y", "ng", " h", "with", "le", "al",
    "to ", "b", "ou", "be", "were", " b", "se", "o ", "ent", "ha", "ng ", "their", "\"", "hi",
    "from", " f", "in ", "de", "ion", "me", "v", ".", "ve", "all", "re ", "ri", "ro", "is ",
    "co", "f t", "are", "ea", ". ", "her", " m", "er ", " p", "es ", "by", "they", "di", "ra",
    "ic", "not", "s, ", "d t", "at ", "ce", "la", "h ", "ne", "as ", "tio", "on ", "n t", "io",
    "we", " a ", "om", ", a", "s o", "ur", "li", "ll", "ch", "had", "this", "e t", "g ", "e\r\n",
    " wh", "ere", " co", "e o", "a ", "us", " d", "ss", "\n\r\n", "\r\n\r", "=\"", " be", " e",
    "s a", "ma", "one", "t t", "or ", "but", "el", "so", "l ", "e s", "s,", "no", "ter", " wa",
    "iv", "ho", "e a", " r", "hat", "s t", "ns", "ch ", "wh", "tr", "ut", "/", "have", "ly ",
    "ta", " ha", " on", "tha", "-", " l", "ati", "en ", "pe", " re", "there", "ass", "si", " fo",
    "wa", "ec", "our", "who", "its", "z", "fo", "rs", ">", "ot", "un", "<", "im", "th ", "nc",
    "ate", "><", "ver", "ad", " we", "ly", "ee", " n", "id", " cl", "ac", "il", "</", "rt",
    " wi", "div", "e, ", " it", "whi", " ma", "ge", "x", "e c", "men", ".com",
];

/// Compress `input` against the shared dictionary. Total size never
/// exceeds `input.len() + input.len() / 254 + 2` even for bytes the
/// dictionary does not cover.
pub fn compress(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut verbatim: Vec<u8> = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        // Longest dictionary entry matching at the cursor.
        let mut best: Option<(usize, usize)> = None;
        for (code, entry) in DICT.iter().enumerate() {
            let entry = entry.as_bytes();
            if input[pos..].starts_with(entry) {
                match best {
                    Some((_, len)) if len >= entry.len() => {}
                    _ => best = Some((code, entry.len())),
                }
            }
        }

        match best {
            Some((code, len)) => {
                flush_verbatim(&mut out, &mut verbatim);
                out.push(code as u8);
                pos += len;
            }
            None => {
                verbatim.push(input[pos]);
                pos += 1;
                if verbatim.len() == 256 {
                    flush_verbatim(&mut out, &mut verbatim);
                }
            }
        }
    }
    flush_verbatim(&mut out, &mut verbatim);
    out
}

fn flush_verbatim(out: &mut Vec<u8>, verbatim: &mut Vec<u8>) {
    match verbatim.len() {
        0 => {}
        1 => {
            out.push(ESCAPE_ONE);
            out.push(verbatim[0]);
        }
        n => {
            out.push(ESCAPE_RUN);
            out.push((n - 1) as u8);
            out.extend_from_slice(verbatim);
        }
    }
    verbatim.clear();
}

/// Decompress a dictionary-compressed byte string. A code outside the
/// dictionary, or an escape running past the end, is the decode fault.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut pos = 0;
    while pos < data.len() {
        match data[pos] {
            ESCAPE_ONE => {
                let byte = data.get(pos + 1).ok_or(Error::InvalidData)?;
                out.push(*byte);
                pos += 2;
            }
            ESCAPE_RUN => {
                let len = *data.get(pos + 1).ok_or(Error::InvalidData)? as usize + 1;
                let run = data.get(pos + 2..pos + 2 + len).ok_or(Error::InvalidData)?;
                out.extend_from_slice(run);
                pos += 2 + len;
            }
            code => {
                let entry = DICT.get(code as usize).ok_or(Error::InvalidData)?;
                out.extend_from_slice(entry.as_bytes());
                pos += 1;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dictionary_fits_code_space() {
        assert!(DICT.len() < ESCAPE_ONE as usize);
    }

    #[test]
    fn test_english_roundtrip_and_shrink() {
        let text = b"this is a short payment note for the recipient";
        let packed = compress(text);
        assert!(packed.len() < text.len());
        assert_eq!(decompress(&packed).unwrap(), text.to_vec());
    }

    #[test]
    fn test_non_dictionary_bytes_roundtrip() {
        let data: Vec<u8> = (0u8..=255).collect();
        let packed = compress(&data);
        assert_eq!(decompress(&packed).unwrap(), data);
    }

    #[test]
    fn test_empty_input() {
        assert!(compress(b"").is_empty());
        assert!(decompress(b"").unwrap().is_empty());
    }

    #[test]
    fn test_truncated_escape_is_decode_fault() {
        assert!(decompress(&[ESCAPE_ONE]).is_err());
        assert!(decompress(&[ESCAPE_RUN, 4, 0xAA]).is_err());
    }

    #[test]
    fn test_unknown_code_is_decode_fault() {
        let bad = [(DICT.len() + 1) as u8];
        assert!(decompress(&bad).is_err());
    }

    #[test]
    fn test_long_verbatim_run() {
        let data = vec![0x00u8; 1000];
        let packed = compress(&data);
        assert_eq!(decompress(&packed).unwrap(), data);
    }
}
