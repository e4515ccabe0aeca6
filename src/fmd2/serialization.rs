//! Canonical byte encodings of keys and flags.
//!
//! Points and scalars are 32-byte canonical Ristretto255 encodings. Key
//! vectors are flattened by concatenation, with their length known
//! out-of-band. A flag is enc(u) ‖ enc(y) ‖ packed ciphertext bits.
//!
//! Decoders reject malformed input outright instead of coercing it: the
//! identity point and the zero scalar have canonical encodings and decode
//! successfully, and it is [detect](super::DetectionKey::detect) that
//! refuses the resulting universal tags.

use alloc::vec::Vec;

use curve25519_dalek::{
    constants::RISTRETTO_BASEPOINT_POINT,
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
};
use thiserror::Error;

use crate::bitvec::CiphertextBits;

use super::{DetectionKey, FlagCiphertexts, PublicKey, SecretKey};

/// Decoding failures at the deserialization boundary. Recoverable: the
/// caller should discard the offending input.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DeserializationError {
    #[error("byte length {0} is not a positive multiple of 32")]
    InvalidLength(usize),
    #[error("not a canonical Ristretto point encoding")]
    PointDecoding,
    #[error("not a canonical scalar encoding")]
    ScalarDecoding,
    #[error("flag bytes shorter than the 64-byte point and scalar prefix")]
    FlagTooShort,
}

impl SecretKey {
    /// The concatenated canonical encodings of the γ secret scalars.
    pub fn to_bytes_flattened(&self) -> Vec<u8> {
        scalars_to_bytes(&self.keys)
    }

    /// Decode γ secret scalars and recompute their public points. Rejects
    /// empty input and non-canonical scalar encodings.
    pub fn from_canonical_bytes_flattened(bytes: &[u8]) -> Result<Self, DeserializationError> {
        let keys = scalars_from_bytes(bytes)?;
        if keys.is_empty() {
            return Err(DeserializationError::InvalidLength(bytes.len()));
        }
        let points = keys.iter().map(|x_i| x_i * RISTRETTO_BASEPOINT_POINT).collect();

        Ok(Self { keys, points })
    }
}

impl PublicKey {
    /// The concatenated canonical encodings of the γ points.
    pub fn to_bytes_flattened(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.keys.len() * 32);
        for point in self.keys.iter() {
            bytes.extend_from_slice(point.compress().as_bytes());
        }
        bytes
    }

    /// Decode γ points. Rejects empty input and non-canonical encodings.
    pub fn from_bytes_flattened(bytes: &[u8]) -> Result<Self, DeserializationError> {
        if bytes.is_empty() || bytes.len() % 32 != 0 {
            return Err(DeserializationError::InvalidLength(bytes.len()));
        }

        let keys = bytes
            .chunks_exact(32)
            .map(decode_point)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { keys })
    }
}

impl DetectionKey {
    /// The concatenated canonical encodings of the n secret scalars.
    pub fn to_bytes_flattened(&self) -> Vec<u8> {
        scalars_to_bytes(&self.keys)
    }

    /// Decode n secret scalars. An empty input is the valid n = 0 key.
    pub fn from_bytes_flattened(bytes: &[u8]) -> Result<Self, DeserializationError> {
        let keys = scalars_from_bytes(bytes)?;

        Ok(Self { keys })
    }
}

impl FlagCiphertexts {
    /// enc(u) ‖ enc(y) ‖ packed ciphertext bits.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(64 + self.c.as_bytes().len());
        bytes.extend_from_slice(self.u.compress().as_bytes());
        bytes.extend_from_slice(&self.y.to_bytes());
        bytes.extend_from_slice(self.c.as_bytes());
        bytes
    }

    /// Decode a flag. Requires at least the 64 bytes of `u` and `y`; the
    /// remainder is the packed bit-vector, normalized on the way in.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DeserializationError> {
        if bytes.len() < 64 {
            return Err(DeserializationError::FlagTooShort);
        }

        let u = decode_point(&bytes[..32])?;
        let y = decode_scalar(&bytes[32..64])?;
        let c = CiphertextBits::from_packed_bytes(&bytes[64..]);

        Ok(Self { u, y, c })
    }
}

fn scalars_to_bytes(scalars: &[Scalar]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(scalars.len() * 32);
    for scalar in scalars.iter() {
        bytes.extend_from_slice(&scalar.to_bytes());
    }
    bytes
}

fn scalars_from_bytes(bytes: &[u8]) -> Result<Vec<Scalar>, DeserializationError> {
    if bytes.len() % 32 != 0 {
        return Err(DeserializationError::InvalidLength(bytes.len()));
    }

    bytes.chunks_exact(32).map(decode_scalar).collect()
}

fn decode_point(chunk: &[u8]) -> Result<RistrettoPoint, DeserializationError> {
    let mut encoding = [0u8; 32];
    encoding.copy_from_slice(chunk);

    CompressedRistretto(encoding)
        .decompress()
        .ok_or(DeserializationError::PointDecoding)
}

fn decode_scalar(chunk: &[u8]) -> Result<Scalar, DeserializationError> {
    let mut encoding = [0u8; 32];
    encoding.copy_from_slice(chunk);

    Option::from(Scalar::from_canonical_bytes(encoding))
        .ok_or(DeserializationError::ScalarDecoding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FmdKeyGen, Fmd2Params};

    #[test]
    fn test_secret_key_roundtrip() {
        let mut csprng = rand_core::OsRng;

        let (pk, sk) = Fmd2Params::new(8).generate_keys(&mut csprng);
        let bytes = sk.to_bytes_flattened();
        assert_eq!(bytes.len(), 8 * 32);

        let decoded = SecretKey::from_canonical_bytes_flattened(&bytes).unwrap();
        // The public points are recomputed from the scalars.
        assert_eq!(
            decoded.public_key().to_bytes_flattened(),
            pk.to_bytes_flattened()
        );
    }

    #[test]
    fn test_public_key_roundtrip() {
        let mut csprng = rand_core::OsRng;

        let (pk, _) = Fmd2Params::new(8).generate_keys(&mut csprng);
        let bytes = pk.to_bytes_flattened();

        let decoded = PublicKey::from_bytes_flattened(&bytes).unwrap();
        assert_eq!(decoded.gamma(), 8);
        assert_eq!(decoded.to_bytes_flattened(), bytes);
    }

    #[test]
    fn test_detection_key_roundtrip() {
        let mut csprng = rand_core::OsRng;

        let (pk, sk) = Fmd2Params::new(8).generate_keys(&mut csprng);
        let dk = sk.extract(3).unwrap();
        let bytes = dk.to_bytes_flattened();
        assert_eq!(bytes.len(), 3 * 32);

        let decoded = DetectionKey::from_bytes_flattened(&bytes).unwrap();
        assert!(decoded.detect(&pk.generate_flag(&mut csprng)));

        // n = 0 serializes to nothing and decodes back.
        let empty = DetectionKey::from_bytes_flattened(&[]).unwrap();
        assert_eq!(empty.n(), 0);
    }

    #[test]
    fn test_flag_roundtrip() {
        let mut csprng = rand_core::OsRng;

        let (pk, sk) = Fmd2Params::new(24).generate_keys(&mut csprng);
        let dk = sk.extract(5).unwrap();

        let flag_cipher = pk.generate_flag(&mut csprng);
        let bytes = flag_cipher.to_bytes();
        assert!(bytes.len() <= 64 + 3);

        let decoded = FlagCiphertexts::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, flag_cipher);
        assert!(dk.detect(&decoded));
    }

    #[test]
    fn test_flag_decoding_normalizes_trailing_zero_bytes() {
        let mut csprng = rand_core::OsRng;

        let (pk, _) = Fmd2Params::new(8).generate_keys(&mut csprng);
        let flag_cipher = pk.generate_flag(&mut csprng);

        let mut padded = flag_cipher.to_bytes();
        padded.extend_from_slice(&[0u8, 0u8]);
        assert_eq!(FlagCiphertexts::from_bytes(&padded).unwrap(), flag_cipher);
    }

    #[test]
    fn test_malformed_inputs_are_rejected() {
        // Truncated flag.
        assert_eq!(
            FlagCiphertexts::from_bytes(&[0u8; 63]),
            Err(DeserializationError::FlagTooShort)
        );

        // Lengths that are not multiples of 32.
        assert!(matches!(
            PublicKey::from_bytes_flattened(&[0u8; 33]),
            Err(DeserializationError::InvalidLength(33))
        ));
        assert!(matches!(
            DetectionKey::from_bytes_flattened(&[0u8; 31]),
            Err(DeserializationError::InvalidLength(31))
        ));

        // An empty secret or public key is meaningless.
        assert!(SecretKey::from_canonical_bytes_flattened(&[]).is_err());
        assert!(PublicKey::from_bytes_flattened(&[]).is_err());

        // 2^255 - 1 is neither a canonical field element nor a canonical
        // scalar.
        let mut bad_flag = [0xffu8; 96];
        bad_flag[64] = 0x01;
        assert_eq!(
            FlagCiphertexts::from_bytes(&bad_flag),
            Err(DeserializationError::PointDecoding)
        );
        assert!(matches!(
            DetectionKey::from_bytes_flattened(&[0xff; 32]),
            Err(DeserializationError::ScalarDecoding)
        ));
    }

    #[test]
    fn test_identity_and_zero_decode_but_never_match() {
        let mut csprng = rand_core::OsRng;

        // A universal tag decodes fine (its encodings are canonical) and
        // is rejected by detect, not by the decoder.
        let decoded = FlagCiphertexts::from_bytes(&[0u8; 64]).unwrap();

        let (_, sk) = Fmd2Params::new(4).generate_keys(&mut csprng);
        assert!(!sk.extract(2).unwrap().detect(&decoded));
    }
}
