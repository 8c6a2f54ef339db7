//! The three tweakable hash operations: message hash, chain hash, tree hash.
//!
//! All three share one construction — pack `parameter || tweak || payload`,
//! permute, truncate/feed-forward or sponge-squeeze — dispatching on the
//! payload shape exactly as the reference `tweak_hash::apply` does (one
//! domain8 block → width-16 compress, two domain8 blocks → width-24
//! compress, more than two → width-24 sponge with a length-keyed capacity).

use alloc::vec::Vec;

use crate::field::{FieldElement, P};
use crate::params::{HASH_LEN_FE, PARAMETER_LEN_FE};
use crate::poseidon2::{compress16, compress24, sponge24};
use crate::tweak::{Tweak, TWEAK_LEN};

pub type Domain8 = [FieldElement; HASH_LEN_FE];
pub type Parameter = [FieldElement; PARAMETER_LEN_FE];

const LEAF_CAPACITY_LEN: usize = 9;

/// `chain_hash(P, epoch, chain_index, pos, x) = compress16(P || tweak || x)`.
pub fn chain_hash(parameter: &Parameter, tweak: &Tweak, input: &Domain8) -> Domain8 {
    let tweak_fe = tweak.to_field_elements();
    let mut combined = Vec::with_capacity(PARAMETER_LEN_FE + TWEAK_LEN + HASH_LEN_FE);
    combined.extend_from_slice(parameter);
    combined.extend_from_slice(&tweak_fe);
    combined.extend_from_slice(input);
    compress16(&combined)
}

/// `tree_hash(P, level, pos, left, right) = compress24(P || tweak || left || right)`.
pub fn tree_hash_node(parameter: &Parameter, tweak: &Tweak, left: &Domain8, right: &Domain8) -> Domain8 {
    let tweak_fe = tweak.to_field_elements();
    let mut combined = Vec::with_capacity(PARAMETER_LEN_FE + TWEAK_LEN + 2 * HASH_LEN_FE);
    combined.extend_from_slice(parameter);
    combined.extend_from_slice(&tweak_fe);
    combined.extend_from_slice(left);
    combined.extend_from_slice(right);
    compress24(&combined)
}

fn safe_domain_separator(lengths: [u32; 4]) -> [FieldElement; LEAF_CAPACITY_LEN] {
    let mut acc: u128 = 0;
    for v in lengths {
        acc = (acc << 32) | v as u128;
    }
    let p = P as u128;
    let mut input = [FieldElement::ZERO; 24];
    for slot in input.iter_mut() {
        *slot = FieldElement::from_canonical_u32((acc % p) as u32);
        acc /= p;
    }
    compress24(&input)
}

/// Leaf hashing: sponge over `P || tweak || chain_end_0 || .. || chain_end_{n-1}`,
/// with a capacity value keyed by `(parameter_len, tweak_len, n, hash_len)` so
/// leaf hashes over different chain counts cannot collide with each other or
/// with a two-child tree merge despite sharing the width-24 permutation.
pub fn tree_hash_leaf(parameter: &Parameter, tweak: &Tweak, chain_ends: &[Domain8]) -> Domain8 {
    let tweak_fe = tweak.to_field_elements();
    let n = chain_ends.len() as u32;
    let capacity = safe_domain_separator([PARAMETER_LEN_FE as u32, TWEAK_LEN as u32, n, HASH_LEN_FE as u32]);

    let mut combined = Vec::with_capacity(PARAMETER_LEN_FE + TWEAK_LEN + chain_ends.len() * HASH_LEN_FE);
    combined.extend_from_slice(parameter);
    combined.extend_from_slice(&tweak_fe);
    for h in chain_ends {
        combined.extend_from_slice(h);
    }
    sponge24(&capacity, &combined)
}

/// `message_hash(P, epoch, rho, message_fe) = compress24(P || tweak || rho || message_fe)`.
///
/// All four pieces fit in a single width-24 block for every lifetime preset
/// (`5 + 2 + rand_len_fe + msg_len_fe <= 24`), so this uses the simpler
/// compress construction rather than the sponge — matching the reference
/// `encoding::compute_message_hash`, which also never needs the sponge path
/// here (see `DESIGN.md`: the sponge is reserved for leaf hashing, where the
/// chain-end count genuinely varies).
pub fn message_hash(
    parameter: &Parameter,
    rho: &[FieldElement],
    epoch: u64,
    message_fe: &[FieldElement],
) -> Domain8 {
    let tweak = Tweak::message(epoch);
    let tweak_fe = tweak.to_field_elements();
    let mut combined = Vec::with_capacity(PARAMETER_LEN_FE + TWEAK_LEN + rho.len() + message_fe.len());
    combined.extend_from_slice(parameter);
    combined.extend_from_slice(&tweak_fe);
    combined.extend_from_slice(rho);
    combined.extend_from_slice(message_fe);
    compress24(&combined)
}
