//! `PublicKey`, `SecretKey`, and key generation.
//!
//! Built out around the `PublicKey { root, parameter }` shape shared across
//! this scheme's wire and in-memory representations (see `DESIGN.md` for the
//! lineage of that shape and for the key-generation algorithm this module
//! implements).

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::error::XmssError;
use crate::hash::{tree_hash_leaf, Domain8, Parameter};
use crate::params::{LifetimePreset, NUM_CHAINS, PARAMETER_LEN_FE, WINTERNITZ_W};
use crate::rng::{prf_to_f, DeterministicRng};
use crate::tweak::Tweak;
use crate::{chain, tree};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    pub parameter: Parameter,
    pub root: Domain8,
}

/// A secret key's exclusively-owned tree cache: full leaf sets for every
/// tile the active range touches, and a root (real or padding) for every
/// tile in the top layer.
#[derive(Clone)]
pub struct SecretKey {
    pub(crate) preset: LifetimePreset,
    pub(crate) parameter: Parameter,
    pub(crate) prf_key: [u8; 32],
    pub(crate) seed: [u8; 32],
    pub(crate) activation_epoch: u64,
    pub(crate) num_active_epochs: u64,
    pub(crate) top_layer: Vec<Domain8>,
    pub(crate) tile_leaves: BTreeMap<u64, Vec<Domain8>>,
    /// The RNG stream, cloned fresh per `sign` call, positioned exactly
    /// after key generation's padding draws. This is what makes `sign` a
    /// pure function of `(epoch, message)` rather than of call order; see
    /// `DESIGN.md`'s canonical signing path resolution.
    pub(crate) post_keygen_rng: DeterministicRng,
}

impl SecretKey {
    pub fn activation_epoch(&self) -> u64 {
        self.activation_epoch
    }

    pub fn num_active_epochs(&self) -> u64 {
        self.num_active_epochs
    }

    pub fn parameter(&self) -> &Parameter {
        &self.parameter
    }

    pub fn is_active(&self, epoch: u64) -> bool {
        epoch >= self.activation_epoch && epoch < self.activation_epoch + self.num_active_epochs
    }
}

fn compute_leaf(parameter: &Parameter, prf_key: &[u8; 32], epoch: u64) -> Domain8 {
    let mut chain_ends: Vec<Domain8> = Vec::with_capacity(NUM_CHAINS);
    for chain_index in 0..NUM_CHAINS as u8 {
        let start = prf_to_f(prf_key, epoch, chain_index);
        let end = chain::walk(parameter, epoch, chain_index, 0, WINTERNITZ_W - 1, &start);
        chain_ends.push(end);
    }
    tree_hash_leaf(parameter, &Tweak::tree(0, epoch as u32), &chain_ends)
}

/// Generate a keypair deterministically from `seed` for the epochs
/// `[activation_epoch, activation_epoch + num_active_epochs)`.
pub fn key_gen(
    preset: LifetimePreset,
    seed: [u8; 32],
    activation_epoch: u64,
    num_active_epochs: u64,
) -> Result<(PublicKey, SecretKey), XmssError> {
    let total_epochs = preset.total_epochs();
    if num_active_epochs == 0 || activation_epoch + num_active_epochs > total_epochs {
        log::warn!(
            "key_gen rejected: activation_epoch={activation_epoch} num_active_epochs={num_active_epochs} exceeds total_epochs={total_epochs}"
        );
        return Err(XmssError::EpochTooLarge { epoch: activation_epoch + num_active_epochs, max_epochs: total_epochs });
    }
    log::debug!("key_gen starting: preset={preset:?} activation_epoch={activation_epoch} num_active_epochs={num_active_epochs}");

    let mut rng = DeterministicRng::from_seed(seed);
    let parameter: [_; PARAMETER_LEN_FE] = rng.peek_parameter();
    let prf_key = rng.consume_prf_key();

    let leaves_per_tile = preset.leaves_per_bottom_tree();
    let bottom_depth = preset.bottom_depth();
    let top_depth = preset.top_depth();
    let num_tiles = 1u64 << top_depth;

    let active_end = activation_epoch + num_active_epochs;
    let tile_start = activation_epoch / leaves_per_tile;
    let tile_end_inclusive = (active_end - 1) / leaves_per_tile;

    let mut top_layer: Vec<Domain8> = Vec::with_capacity(num_tiles as usize);
    let mut tile_leaves: BTreeMap<u64, Vec<Domain8>> = BTreeMap::new();

    for tile in 0..num_tiles {
        if tile >= tile_start && tile <= tile_end_inclusive {
            let mut leaves = Vec::with_capacity(leaves_per_tile as usize);
            for local_pos in 0..leaves_per_tile {
                let epoch = tile * leaves_per_tile + local_pos;
                let leaf = if epoch >= activation_epoch && epoch < active_end {
                    compute_leaf(&parameter, &prf_key, epoch)
                } else {
                    tree::padding_node(&mut rng)
                };
                leaves.push(leaf);
            }
            let root = tree::build_bottom_tile_root(&parameter, tile, leaves_per_tile, leaves.clone(), bottom_depth);
            tile_leaves.insert(tile, leaves);
            top_layer.push(root);
        } else {
            top_layer.push(tree::padding_node(&mut rng));
        }
    }

    let post_keygen_rng = rng.clone();
    let root = tree::build_top_root(&parameter, bottom_depth, top_layer.clone(), top_depth);
    log::debug!("key_gen finished: {} active tiles cached", tile_leaves.len());

    let public_key = PublicKey { parameter, root };
    let secret_key = SecretKey {
        preset,
        parameter,
        prf_key,
        seed,
        activation_epoch,
        num_active_epochs,
        top_layer,
        tile_leaves,
        post_keygen_rng,
    };
    Ok((public_key, secret_key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_gen_is_deterministic() {
        let (pk1, _) = key_gen(LifetimePreset::Lifetime2_8, [3u8; 32], 0, 256).unwrap();
        let (pk2, _) = key_gen(LifetimePreset::Lifetime2_8, [3u8; 32], 0, 256).unwrap();
        assert_eq!(pk1, pk2);
    }

    #[test]
    fn different_seeds_diverge() {
        let (pk1, _) = key_gen(LifetimePreset::Lifetime2_8, [3u8; 32], 0, 256).unwrap();
        let (pk2, _) = key_gen(LifetimePreset::Lifetime2_8, [4u8; 32], 0, 256).unwrap();
        assert_ne!(pk1, pk2);
    }

    #[test]
    fn secret_key_parameter_matches_public_key() {
        let (pk, sk) = key_gen(LifetimePreset::Lifetime2_8, [9u8; 32], 0, 256).unwrap();
        assert_eq!(pk.parameter, *sk.parameter());
    }

    #[test]
    fn rejects_range_exceeding_lifetime() {
        let err = key_gen(LifetimePreset::Lifetime2_8, [1u8; 32], 0, 257).unwrap_err();
        assert_eq!(err, XmssError::EpochTooLarge { epoch: 257, max_epochs: 256 });
    }

    #[test]
    fn partial_active_range_still_produces_a_key() {
        let (pk, sk) = key_gen(LifetimePreset::Lifetime2_8, [5u8; 32], 16, 16).unwrap();
        assert!(sk.is_active(16));
        assert!(!sk.is_active(15));
        assert!(!sk.is_active(32));
        // Root is well-defined even though only one tile's worth of the
        // lifetime is active.
        assert_ne!(pk.root, [crate::field::FieldElement::ZERO; crate::params::HASH_LEN_FE]);
    }
}
