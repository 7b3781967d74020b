// Bit-level packing — MSB-first reader/writer
//
// Everything the compressed wire tiers do is built on these two
// cursors. Reading past the end of the buffer is the opaque decode
// fault; asking a writer for zero or more than 32 bits at once is a
// caller bug and panics.

use crate::error::{Error, Result};

/// Appends bits to a growable byte buffer, most significant bit first.
#[derive(Debug, Default)]
pub struct BitWriter {
    buf: Vec<u8>,
    /// Total bits written so far.
    len: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bits written.
    pub fn bit_len(&self) -> usize {
        self.len
    }

    fn push_bit(&mut self, set: bool) {
        if self.len % 8 == 0 {
            self.buf.push(0);
        }
        if set {
            let last = self.buf.len() - 1;
            self.buf[last] |= 0x80 >> (self.len % 8);
        }
        self.len += 1;
    }

    /// Write the low `bits` bits of `value`, MSB first. `bits` must be
    /// in 1..=32 and `value` must fit.
    pub fn write_bits(&mut self, value: u32, bits: u32) {
        assert!((1..=32).contains(&bits), "bit count out of range");
        assert!(
            bits == 32 || value >> bits == 0,
            "value does not fit in {bits} bits"
        );
        for i in (0..bits).rev() {
            self.push_bit(value >> i & 1 == 1);
        }
    }

    /// Write the low `bits` bits of a 64-bit value, chunked through
    /// `write_bits`.
    pub fn write_u64(&mut self, value: u64, bits: u32) {
        assert!((1..=64).contains(&bits), "bit count out of range");
        if bits > 32 {
            self.write_bits((value >> 32) as u32, bits - 32);
            self.write_bits(value as u32, 32);
        } else {
            assert!(
                bits == 64 || value >> bits == 0,
                "value does not fit in {bits} bits"
            );
            self.write_bits(value as u32, bits);
        }
    }

    pub fn write_bool(&mut self, value: bool) {
        self.push_bit(value);
    }

    /// Write whole bytes, each MSB first.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.write_bits(b as u32, 8);
        }
    }

    /// Finish, padding the final partial byte with zero bits.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Reads bits from a byte slice, most significant bit first.
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Cursor position in bits.
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bits left before the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len() * 8 - self.pos
    }

    fn next_bit(&mut self) -> Result<bool> {
        if self.pos >= self.data.len() * 8 {
            return Err(Error::InvalidData);
        }
        let bit = self.data[self.pos / 8] >> (7 - self.pos % 8) & 1;
        self.pos += 1;
        Ok(bit == 1)
    }

    /// Read `bits` bits (1..=32), MSB first.
    pub fn read_bits(&mut self, bits: u32) -> Result<u32> {
        if !(1..=32).contains(&bits) {
            return Err(Error::InvalidData);
        }
        let mut value = 0u32;
        for _ in 0..bits {
            value = value << 1 | self.next_bit()? as u32;
        }
        Ok(value)
    }

    /// Read `bits` bits (1..=64) into a 64-bit value.
    pub fn read_u64(&mut self, bits: u32) -> Result<u64> {
        if !(1..=64).contains(&bits) {
            return Err(Error::InvalidData);
        }
        if bits > 32 {
            let high = self.read_bits(bits - 32)? as u64;
            let low = self.read_bits(32)? as u64;
            Ok(high << 32 | low)
        } else {
            Ok(self.read_bits(bits)? as u64)
        }
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        self.next_bit()
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        if count * 8 > self.remaining() {
            return Err(Error::InvalidData);
        }
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(self.read_bits(8)? as u8);
        }
        Ok(out)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&bytes);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_single_bits() {
        let mut w = BitWriter::new();
        w.write_bool(true);
        w.write_bool(false);
        w.write_bool(true);
        let bytes = w.into_bytes();
        assert_eq!(bytes, vec![0b1010_0000]);

        let mut r = BitReader::new(&bytes);
        assert!(r.read_bool().unwrap());
        assert!(!r.read_bool().unwrap());
        assert!(r.read_bool().unwrap());
    }

    #[test]
    fn test_msb_first_layout() {
        let mut w = BitWriter::new();
        w.write_bits(0b101, 3);
        w.write_bits(0b11111, 5);
        assert_eq!(w.into_bytes(), vec![0b1011_1111]);
    }

    #[test]
    fn test_buffer_extends_byte_at_a_time() {
        let mut w = BitWriter::new();
        w.write_bits(1, 1);
        assert_eq!(w.into_bytes().len(), 1);

        let mut w = BitWriter::new();
        w.write_bits(0x1FF, 9);
        assert_eq!(w.into_bytes().len(), 2);
    }

    #[test]
    fn test_read_past_end_is_decode_fault() {
        let data = [0xFFu8];
        let mut r = BitReader::new(&data);
        r.read_bits(8).unwrap();
        assert!(matches!(r.read_bits(1), Err(Error::InvalidData)));
    }

    #[test]
    fn test_zero_bit_read_is_decode_fault() {
        let data = [0u8; 4];
        let mut r = BitReader::new(&data);
        assert!(matches!(r.read_bits(0), Err(Error::InvalidData)));
    }

    #[test]
    #[should_panic(expected = "bit count out of range")]
    fn test_zero_bit_write_panics() {
        BitWriter::new().write_bits(0, 0);
    }

    #[test]
    fn test_u64_chunking() {
        let mut w = BitWriter::new();
        w.write_u64(u64::MAX, 64);
        w.write_u64(0x1_0000_0001, 33);
        let bytes = w.into_bytes();

        let mut r = BitReader::new(&bytes);
        assert_eq!(r.read_u64(64).unwrap(), u64::MAX);
        assert_eq!(r.read_u64(33).unwrap(), 0x1_0000_0001);
    }

    #[test]
    fn test_bytes_roundtrip_unaligned() {
        let mut w = BitWriter::new();
        w.write_bool(true);
        w.write_bytes(&[0xDE, 0xAD, 0xBE, 0xEF]);
        let bytes = w.into_bytes();

        let mut r = BitReader::new(&bytes);
        assert!(r.read_bool().unwrap());
        assert_eq!(r.read_bytes(4).unwrap(), vec![0xDE, 0xAD, 0xBE, 0xEF]);
    }

    proptest! {
        #[test]
        fn prop_value_roundtrip(value in any::<u64>(), extra in 0u32..8) {
            let width = (64 - value.leading_zeros()).max(1);
            let bits = (width + extra).min(64);
            let mut w = BitWriter::new();
            w.write_u64(value, bits);
            let bytes = w.into_bytes();
            let mut r = BitReader::new(&bytes);
            prop_assert_eq!(r.read_u64(bits).unwrap(), value);
        }

        #[test]
        fn prop_byte_stream_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..64), lead in any::<bool>()) {
            let mut w = BitWriter::new();
            w.write_bool(lead);
            w.write_bytes(&data);
            let bytes = w.into_bytes();
            let mut r = BitReader::new(&bytes);
            prop_assert_eq!(r.read_bool().unwrap(), lead);
            prop_assert_eq!(r.read_bytes(data.len()).unwrap(), data);
        }
    }
}
