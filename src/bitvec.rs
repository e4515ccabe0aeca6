// The packed bit-vector carrying the γ ciphertext bits of a flag.
//
// Bits are packed little-endian by bit index into the minimum number of
// bytes covering the highest set bit. Trailing zero bytes are not
// significant: the all-zero vector packs to zero bytes, and `bit` reads
// past the stored length as 0. The packed form is also the hash input of
// the chamaleon hash, so the minimum-length convention is an interop
// contract, not a storage optimization.

use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub(crate) struct CiphertextBits(Vec<u8>);

impl CiphertextBits {
    /// Pack bit-ciphertexts into normalized form, least significant bit
    /// of byte 0 first.
    pub(crate) fn from_bits(bit_ciphertexts: &[bool]) -> Self {
        let packed = bit_ciphertexts
            .chunks(8)
            .map(|bits| {
                bits.iter()
                    .copied()
                    .enumerate()
                    .fold(0u8, |accum_byte, (i, bit)| accum_byte ^ ((bit as u8) << i))
            })
            .collect();

        Self(packed).normalized()
    }

    /// Adopt an already-packed byte representation, dropping trailing
    /// zero bytes.
    pub(crate) fn from_packed_bytes(bytes: &[u8]) -> Self {
        Self(bytes.to_vec()).normalized()
    }

    /// The packed bytes. Never ends in a zero byte.
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The bit at `index`, implicitly 0 past the stored length.
    pub(crate) fn bit(&self, index: usize) -> u8 {
        match self.0.get(index / 8) {
            Some(byte) => (byte >> (index % 8)) & 1u8,
            None => 0u8,
        }
    }

    fn normalized(mut self) -> Self {
        while self.0.last() == Some(&0u8) {
            self.0.pop();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::CiphertextBits;

    #[test]
    fn test_packing_is_little_endian_by_bit_index() {
        let bits = [true, false, true, false, true, true, false, true, true];
        let packed = CiphertextBits::from_bits(&bits);
        assert_eq!(packed.as_bytes(), &[0b1011_0101, 0b0000_0001]);

        for (i, bit) in bits.iter().enumerate() {
            assert_eq!(packed.bit(i), *bit as u8);
        }
    }

    #[test]
    fn test_trailing_zero_bits_do_not_lengthen_the_packing() {
        // Ten slots with only the first one set pack to a single byte.
        let mut bits = [false; 10];
        bits[0] = true;
        assert_eq!(CiphertextBits::from_bits(&bits).as_bytes(), &[0x01]);

        // All-zero slots pack to the empty byte string.
        assert!(CiphertextBits::from_bits(&[false; 24]).as_bytes().is_empty());
    }

    #[test]
    fn test_packed_bytes_are_normalized() {
        let packed = CiphertextBits::from_packed_bytes(&[0xff, 0x03, 0x00, 0x00]);
        assert_eq!(packed.as_bytes(), &[0xff, 0x03]);
        assert_eq!(
            packed,
            CiphertextBits::from_packed_bytes(&[0xff, 0x03]),
        );
    }

    #[test]
    fn test_bits_past_the_stored_length_read_as_zero() {
        let packed = CiphertextBits::from_packed_bytes(&[0x01]);
        assert_eq!(packed.bit(0), 1);
        assert_eq!(packed.bit(7), 0);
        assert_eq!(packed.bit(8), 0);
        assert_eq!(packed.bit(1000), 0);
    }
}
