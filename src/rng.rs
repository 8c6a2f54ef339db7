//! Seeded randomness: a ChaCha12 CSPRNG for parameter/key/padding sampling,
//! and a SHAKE-128 PRF for expanding `(PrfKey, epoch, chain_index)` into a
//! chain's starting domain8.
//!
//! Grounded on the corpus's own `rand_core`/`rand_chacha`/`sha3` stack
//! (`examples/other_examples/manifests/FrankMejzlik-audibro/Cargo.toml`,
//! `other_examples/5e7b5d78_..._horst.rs.rs`).

use rand_chacha::ChaCha12Rng;
use rand_core::{RngCore, SeedableRng};
use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::Shake128;

use crate::field::FieldElement;
use crate::hash::Domain8;
use crate::params::{HASH_LEN_FE, PARAMETER_LEN_FE};

/// Mask the top bit so a little-endian `u32` word is guaranteed `< 2^31`,
/// comfortably below the KoalaBear modulus before the final `mod p` reduce.
fn masked_field_element(word: u32) -> FieldElement {
    FieldElement::from_canonical_u32(word & 0x7FFF_FFFF)
}

/// Wraps a ChaCha12 stream with a "peek without consuming" operation,
/// implemented by cloning the generator (a plain state + counter copy, no
/// allocation), reading from the clone, and discarding it — the original's
/// counter is untouched.
#[derive(Clone)]
pub struct DeterministicRng {
    inner: ChaCha12Rng,
}

impl DeterministicRng {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self { inner: ChaCha12Rng::from_seed(seed) }
    }

    fn fill(&mut self, buf: &mut [u8]) {
        self.inner.fill_bytes(buf);
    }

    fn peek(&self, buf: &mut [u8]) {
        let mut clone = self.inner.clone();
        clone.fill_bytes(buf);
    }

    /// Sample `ParameterP` (5 field elements) without advancing the stream.
    /// Mandatory for seed-reproducibility: key generation's later draws
    /// (PrfKey, padding) must see the RNG exactly as it was before this
    /// peek.
    pub fn peek_parameter(&self) -> [FieldElement; PARAMETER_LEN_FE] {
        let mut buf = [0u8; PARAMETER_LEN_FE * 4];
        self.peek(&mut buf);
        core::array::from_fn(|i| {
            let word = u32::from_le_bytes(buf[i * 4..i * 4 + 4].try_into().unwrap());
            masked_field_element(word)
        })
    }

    /// Consume exactly 32 bytes for the `PrfKey`.
    pub fn consume_prf_key(&mut self) -> [u8; 32] {
        let mut key = [0u8; 32];
        self.fill(&mut key);
        key
    }

    /// Consume `rand_len_fe` field elements for a `rho` attempt.
    pub fn consume_rho(&mut self, rand_len_fe: usize) -> alloc::vec::Vec<FieldElement> {
        let mut out = alloc::vec::Vec::with_capacity(rand_len_fe);
        let mut word_buf = [0u8; 4];
        for _ in 0..rand_len_fe {
            self.fill(&mut word_buf);
            out.push(masked_field_element(u32::from_le_bytes(word_buf)));
        }
        out
    }

    /// Consume one domain8 padding node for the Merkle layer builder.
    pub fn consume_padding_node(&mut self) -> Domain8 {
        let mut buf = [0u8; 4];
        core::array::from_fn(|_| {
            self.fill(&mut buf);
            masked_field_element(u32::from_le_bytes(buf))
        })
    }
}

/// Expand `(key, epoch, chain_index)` into a chain's starting domain8 via
/// SHAKE-128, independent of the main RNG (per-leaf values must be
/// reconstructible from `(K, epoch, chain_index)` alone, without replaying
/// key generation).
pub fn prf_to_f(key: &[u8; 32], epoch: u64, chain_index: u8) -> Domain8 {
    let mut hasher = Shake128::default();
    hasher.update(key);
    hasher.update(&epoch.to_le_bytes());
    hasher.update(&[chain_index]);
    let mut reader = hasher.finalize_xof();
    let mut out = [FieldElement::ZERO; HASH_LEN_FE];
    let mut buf = [0u8; 4];
    for slot in out.iter_mut() {
        reader.read(&mut buf);
        *slot = masked_field_element(u32::from_le_bytes(buf));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peek_does_not_advance_stream() {
        let rng = DeterministicRng::from_seed([7u8; 32]);
        let p1 = rng.peek_parameter();
        let p2 = rng.peek_parameter();
        assert_eq!(p1, p2);
    }

    #[test]
    fn peek_then_consume_reads_same_bytes() {
        let mut rng = DeterministicRng::from_seed([3u8; 32]);
        let peeked = rng.peek_parameter();
        let mut raw = [0u8; PARAMETER_LEN_FE * 4];
        rng.fill(&mut raw);
        let consumed: [FieldElement; PARAMETER_LEN_FE] = core::array::from_fn(|i| {
            let word = u32::from_le_bytes(raw[i * 4..i * 4 + 4].try_into().unwrap());
            masked_field_element(word)
        });
        assert_eq!(peeked, consumed);
    }

    #[test]
    fn consume_advances_stream() {
        let mut rng = DeterministicRng::from_seed([9u8; 32]);
        let key1 = rng.consume_prf_key();
        let key2 = rng.consume_prf_key();
        assert_ne!(key1, key2);
    }

    #[test]
    fn prf_to_f_is_deterministic_and_position_sensitive() {
        let key = [1u8; 32];
        let a = prf_to_f(&key, 0, 0);
        let b = prf_to_f(&key, 0, 0);
        let c = prf_to_f(&key, 0, 1);
        let d = prf_to_f(&key, 1, 0);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn two_rngs_from_same_seed_agree() {
        let mut a = DeterministicRng::from_seed([5u8; 32]);
        let mut b = DeterministicRng::from_seed([5u8; 32]);
        assert_eq!(a.consume_prf_key(), b.consume_prf_key());
        assert_eq!(a.consume_rho(5), b.consume_rho(5));
        assert_eq!(a.consume_padding_node(), b.consume_padding_node());
    }
}
