//! The FMD2 scheme with restricted false positive rates.
//!
//! Hashes are instantiated with SHA3 and the ciphertext bits are packed to
//! their minimum byte length, so flags produced here test correctly under
//! the `fuzzytags` crate and vice versa.

use alloc::vec::Vec;
use core::hint::black_box;

use curve25519_dalek::{
    constants::RISTRETTO_BASEPOINT_POINT,
    ristretto::RistrettoPoint,
    scalar::Scalar,
    traits::{Identity, MultiscalarMul},
};
use rand_core::{CryptoRng, RngCore};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256, Sha3_512};
use subtle::ConstantTimeEq;
#[cfg(feature = "zeroize")]
use zeroize::Zeroize;

use crate::{bitvec::CiphertextBits, CcaSecure, FmdKeyGen, FmdScheme};

#[cfg(feature = "borsh")]
mod borsh_serialization;
mod serialization;

pub use serialization::DeserializationError;

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "zeroize", derive(Zeroize))]
/// γ scalars and their γ base-point multiples. Prefixes of the scalars are
/// the extractable [DetectionKey]s, the points form the [PublicKey].
pub struct SecretKey {
    keys: Vec<Scalar>,
    points: Vec<RistrettoPoint>,
}

impl SecretKey {
    pub(crate) fn generate_keys<R: RngCore + CryptoRng>(gamma: usize, rng: &mut R) -> Self {
        let keys: Vec<Scalar> = (0..gamma).map(|_| Scalar::random(rng)).collect();
        let points = keys.iter().map(|x_i| x_i * RISTRETTO_BASEPOINT_POINT).collect();

        Self { keys, points }
    }

    /// Returns the γ parameter this key was generated with.
    pub fn gamma(&self) -> usize {
        self.keys.len()
    }

    /// The public key counterpart of this key, an independent value copy.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            keys: self.points.clone(),
        }
    }

    /// Extract a detection key with false positive rate 2^(-n): a copy of
    /// the first `n` secret scalars. Returns `None` if `n` exceeds γ.
    ///
    /// Detection keys of differing `n` may be extracted from the same
    /// secret key.
    pub fn extract(&self, n: usize) -> Option<DetectionKey> {
        if n > self.keys.len() {
            return None;
        }

        Some(DetectionKey {
            keys: self.keys[..n].to_vec(),
        })
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
/// γ points. The basepoint is hardcoded to the Ristretto basepoint.
pub struct PublicKey {
    keys: Vec<RistrettoPoint>,
}

impl PublicKey {
    /// Returns the γ parameter of the originating secret key.
    pub fn gamma(&self) -> usize {
        self.keys.len()
    }

    /// Create a randomized flag ciphertext addressed to this key.
    ///
    /// Consumes 128 bytes of RNG output (two wide scalar samplings).
    pub fn generate_flag<R: RngCore + CryptoRng>(&self, rng: &mut R) -> FlagCiphertexts {
        let r = Scalar::random(rng);
        let z = Scalar::random(rng);
        let u = RISTRETTO_BASEPOINT_POINT * r;
        let w = RISTRETTO_BASEPOINT_POINT * z;

        let bit_ciphertexts: Vec<bool> = self
            .keys
            .iter()
            .map(|h_i| {
                let k_i = hash_to_flag_ciphertext_bit(&u, &(h_i * r), &w);
                !k_i // Encrypt bit 1 with hashed mask k_i.
            })
            .collect();

        let c = CiphertextBits::from_bits(&bit_ciphertexts);
        let m = hash_flag_ciphertexts(&u, &c);

        // y = (z - m) / r opens the chamaleon hash: the tester recomputes
        // w as m·B + y·u without knowing r or z.
        let r_inv = r.invert();
        let y = (z - m) * r_inv;

        FlagCiphertexts { u, y, c }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "zeroize", derive(Zeroize))]
/// The first n ≤ γ scalars of a [SecretKey], for a false positive rate
/// of 2^(-n).
pub struct DetectionKey {
    keys: Vec<Scalar>,
}

impl DetectionKey {
    /// The number of embedded secret keys; the false positive rate of this
    /// key is 2^(-n).
    pub fn n(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if the given flag matches this detection key: always
    /// for flags addressed to the originating secret key, with probability
    /// 2^(-n) otherwise.
    pub fn detect(&self, flag_ciphers: &FlagCiphertexts) -> bool {
        let FlagCiphertexts { u, y, c } = flag_ciphers;

        // An identity u or zero y makes the per-slot hashes independent of
        // the secret scalars, so such a flag would match every detection
        // key at once. Reject before doing anything else.
        let universal = u.ct_eq(&RistrettoPoint::identity()) | y.ct_eq(&Scalar::ZERO);
        if bool::from(universal) {
            return false;
        }

        let m = hash_flag_ciphertexts(u, c);
        let w = RistrettoPoint::multiscalar_mul([m, *y], [RISTRETTO_BASEPOINT_POINT, *u]);

        // When dealing with key material we only perform constant time
        // ops: no early exit once a slot fails. Bits past the stored
        // ciphertexts read as 0 (sender γ smaller than n).
        let mut success = 1u8;
        for (i, x_i) in self.keys.iter().enumerate() {
            let k_i = hash_to_flag_ciphertext_bit(u, &(u * x_i), &w) as u8;
            success = black_box(success & (k_i ^ c.bit(i)));
        }

        success == 1u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
/// A point `u`, a scalar `y`, and the packed γ ciphertext bits `c`.
pub struct FlagCiphertexts {
    u: RistrettoPoint,
    y: Scalar,
    c: CiphertextBits,
}

impl FlagCiphertexts {
    /// The packed ciphertext bits of this flag, little-endian by bit
    /// index and trimmed of trailing zero bytes.
    #[inline]
    pub fn bits(&self) -> &[u8] {
        self.c.as_bytes()
    }
}

/// The γ > 0 parameter.
/// The set of (restricted) false positive rates is 2^{-n} for 1 ≤ n ≤ γ.
pub struct Fmd2Params {
    gamma: usize,
}

impl Fmd2Params {
    /// Scheme parameters for the minimum false positive rate 2^(-γ).
    ///
    /// # Panics
    ///
    /// Panics if `gamma` is zero.
    pub fn new(gamma: usize) -> Fmd2Params {
        assert!(gamma >= 1, "the gamma parameter must be positive");

        Fmd2Params { gamma }
    }

    /// Returns the γ parameter
    pub fn gamma(&self) -> usize {
        self.gamma
    }
}

impl FmdKeyGen for Fmd2Params {
    type PublicKey = PublicKey;

    type SecretKey = SecretKey;

    fn generate_keys<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
    ) -> (Self::PublicKey, Self::SecretKey) {
        let sk = SecretKey::generate_keys(self.gamma(), rng);
        let pk = sk.public_key();

        (pk, sk)
    }
}

/// The implementation from Figure 3 of the [FMD paper](https://eprint.iacr.org/2021/089),
/// restricted to prefix extraction.
pub struct Fmd2;

impl FmdScheme for Fmd2 {
    type PublicKey = PublicKey;

    type SecretKey = SecretKey;

    type DetectionKey = DetectionKey;

    type FlagCiphertexts = FlagCiphertexts;

    fn flag<R: RngCore + CryptoRng>(pk: &Self::PublicKey, rng: &mut R) -> Self::FlagCiphertexts {
        pk.generate_flag(rng)
    }

    fn extract(sk: &Self::SecretKey, n: usize) -> Option<Self::DetectionKey> {
        sk.extract(n)
    }

    fn detect(dsk: &Self::DetectionKey, flag_ciphers: &Self::FlagCiphertexts) -> bool {
        dsk.detect(flag_ciphers)
    }
}

/// FMD2 is proven to be IND-CCA secure in the [FMD paper](https://eprint.iacr.org/2021/089).
impl CcaSecure for Fmd2Params {}

/// This is the hash H from Fig.3 of the FMD paper, instantiated with
/// SHA3-256 over the canonical encodings of `u`, the DDH mask and `w`,
/// in that order. The output bit is the least significant bit of the
/// first digest byte, as in `fuzzytags`.
fn hash_to_flag_ciphertext_bit(
    u: &RistrettoPoint,
    mask: &RistrettoPoint,
    w: &RistrettoPoint,
) -> bool {
    let mut transcript = Sha3_256::new();
    for point in [u, mask, w] {
        transcript.update(point.compress().to_bytes());
    }

    (transcript.finalize()[0] & 1u8) == 1u8
}

/// This is the hash G from Fig.3 of the FMD paper, instantiated with
/// SHA3-512 over the canonical encoding of `u` followed by the packed
/// ciphertext bits, wide-reduced into a scalar.
fn hash_flag_ciphertexts(u: &RistrettoPoint, c: &CiphertextBits) -> Scalar {
    let mut transcript = Sha3_512::new();
    transcript.update(u.compress().to_bytes());
    transcript.update(c.as_bytes());

    Scalar::from_bytes_mod_order_wide(&transcript.finalize().into())
}
