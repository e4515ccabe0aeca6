#![cfg_attr(not(test), no_std)]

//! Fuzzy message detection (FMD) tags over the Ristretto255 group.
//!
//! A recipient publishes a [PublicKey] of γ points. Senders attach a small
//! [flag ciphertext](FlagCiphertexts) to each message. The recipient hands an
//! untrusted mailbox a [DetectionKey] tuned to a false positive rate 2^(-n):
//! flags addressed to the recipient always test positive, while unrelated
//! flags test positive with probability 2^(-n). The mailbox therefore cannot
//! tell the recipient's traffic apart from the cover traffic its false
//! positives induce.
//!
//! The hash instantiation (SHA3-256 for the ciphertext bits, SHA3-512 for the
//! chamaleon hash) and the minimum-length bit-vector packing are
//! byte-compatible with the `fuzzytags` crate.

extern crate alloc;

use rand_core::{CryptoRng, RngCore};

pub(crate) mod bitvec;
pub mod fmd2;

pub use crate::fmd2::{
    DeserializationError, DetectionKey, FlagCiphertexts, Fmd2, Fmd2Params, PublicKey, SecretKey,
};

/// A trait for a Fuzzy Message Detection (FMD) scheme with restricted false positive rates.
///
/// Detection keys are the first `n` of the γ secret keys, so the set of
/// reachable false positive rates is 2^(-n) for 0 ≤ n ≤ γ.
pub trait FmdScheme {
    type PublicKey;
    type SecretKey;
    type DetectionKey;
    type FlagCiphertexts;

    fn flag<R: RngCore + CryptoRng>(pk: &Self::PublicKey, rng: &mut R) -> Self::FlagCiphertexts;

    /// The number of secret keys `n` gives the chosen false positive rate
    /// 2^(-n). Should return `None` if `n` is larger than the γ parameter
    /// used in [generate_keys](FmdKeyGen::generate_keys).
    fn extract(sk: &Self::SecretKey, n: usize) -> Option<Self::DetectionKey>;

    /// Probabilistic detection based on the number of secret keys embedded
    /// in the detection key.
    fn detect(dsk: &Self::DetectionKey, flag_ciphers: &Self::FlagCiphertexts) -> bool;
}

pub trait FmdKeyGen {
    type PublicKey;
    type SecretKey;

    /// Generate keys according to the minimum false positive rate γ.
    fn generate_keys<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
    ) -> (Self::PublicKey, Self::SecretKey);
}

/// A marker trait used to indicate that
/// an implementation of trait [FmdScheme] is IND-CCA secure.
///
/// Only IND-CCA secure schemes should be used, as they ensure
/// generated ciphertext flags are non-malleable.
pub trait CcaSecure {}
