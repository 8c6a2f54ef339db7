//! A stateful, hash-based post-quantum signature scheme in the generalized
//! XMSS family, instantiated over the KoalaBear prime field with the
//! Poseidon2 permutation.
//!
//! `no_std` compatible (with `alloc`); the `std` feature (default) enables
//! `std::error::Error` on [`XmssError`] and, together with the `parallel`
//! feature, `rayon`-parallel key generation.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod chain;
mod encoding;
mod error;
mod field;
mod hash;
mod keys;
mod params;
mod poseidon2;
mod rng;
mod serialize;
mod signature;
mod tree;
mod tweak;

pub use encoding::MESSAGE_LENGTH;
pub use error::XmssError;
pub use field::FieldElement;
pub use hash::{Domain8, Parameter};
pub use keys::{key_gen, PublicKey, SecretKey};
pub use params::{LifetimePreset, HASH_LEN_FE, NUM_CHAINS, PARAMETER_LEN_FE, RAND_LEN_FE};
pub use signature::{sign, verify, Signature};

pub use serialize::{
    public_key_from_bytes, public_key_to_bytes, secret_key_from_bytes, secret_key_to_bytes,
    signature_from_bytes, signature_from_bytes_padded, signature_to_bytes, DecodedSignature,
    PUBLIC_KEY_BYTE_LEN,
};

/// A convenience wrapper binding one [`LifetimePreset`] to a seed, so callers
/// don't have to thread the preset through every call by hand.
#[derive(Debug, Clone, Copy)]
pub struct Scheme {
    preset: LifetimePreset,
}

impl Scheme {
    pub fn new(preset: LifetimePreset) -> Self {
        Self { preset }
    }

    /// Parse a lifetime tag (e.g. `"2^18"`) into a `Scheme`.
    pub fn from_tag(tag: &str) -> Result<Self, XmssError> {
        LifetimePreset::parse_tag(tag).map(Self::new).ok_or(XmssError::InvalidLifetime)
    }

    pub fn preset(&self) -> LifetimePreset {
        self.preset
    }

    pub fn key_gen(&self, seed: [u8; 32], activation_epoch: u64, num_active_epochs: u64) -> Result<(PublicKey, SecretKey), XmssError> {
        keys::key_gen(self.preset, seed, activation_epoch, num_active_epochs)
    }

    pub fn sign(&self, secret_key: &SecretKey, epoch: u64, message: &[u8; MESSAGE_LENGTH]) -> Result<Signature, XmssError> {
        signature::sign(secret_key, epoch, message)
    }

    pub fn verify(&self, public_key: &PublicKey, epoch: u64, message: &[u8; MESSAGE_LENGTH], signature: &Signature) -> bool {
        signature::verify(public_key, self.preset, epoch, message, signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_round_trips_through_its_own_api() {
        let scheme = Scheme::new(LifetimePreset::Lifetime2_8);
        let (pk, sk) = scheme.key_gen([4u8; 32], 0, 256).unwrap();
        let message = [17u8; 32];
        let sig = scheme.sign(&sk, 40, &message).unwrap();
        assert!(scheme.verify(&pk, 40, &message, &sig));
    }

    #[test]
    fn from_tag_rejects_unknown_tags() {
        assert!(Scheme::from_tag("not-a-lifetime").is_err());
        assert!(Scheme::from_tag("2^8").is_ok());
    }
}
