//! `Signature`, `sign`, and `verify`.
//!
//! The verification walk (codeword check, per-chain forward walk, path
//! merge to the root) generalizes a `BASE = 2` TargetSum construction to
//! this crate's general base-`W` Winternitz encoding with an explicit
//! checksum; see `DESIGN.md` for the grounding.

use alloc::vec::Vec;

use crate::chain;
use crate::encoding::{self, Codeword};
use crate::error::XmssError;
use crate::field::FieldElement;
use crate::hash::{tree_hash_leaf, tree_hash_node, Domain8};
use crate::keys::{PublicKey, SecretKey};
use crate::params::{NUM_CHAINS, RAND_LEN_FE, WINTERNITZ_W};
use crate::tree;
use crate::tweak::Tweak;

/// Upper bound on randomness-search attempts before `sign` gives up. Chosen
/// generously relative to the encoding's failure probability (roughly
/// `1 - ((W-1)/W)^CONTENT_CHAINS` per attempt).
const MAX_RHO_ATTEMPTS: u32 = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub path: Vec<Domain8>,
    pub rho: [FieldElement; RAND_LEN_FE],
    pub hashes: Vec<Domain8>,
}

/// Sign `message` at `epoch` with `secret_key`. Deterministic in `(epoch,
/// message)` alone: every call forks a fresh clone of the secret key's
/// cached post-key-generation RNG rather than sharing one mutable handle.
pub fn sign(secret_key: &SecretKey, epoch: u64, message: &[u8; encoding::MESSAGE_LENGTH]) -> Result<Signature, XmssError> {
    if !secret_key.is_active(epoch) {
        log::warn!("sign rejected: epoch {epoch} is outside the secret key's active range");
        return Err(XmssError::KeyNotActive {
            epoch,
            activation_epoch: secret_key.activation_epoch(),
            num_active_epochs: secret_key.num_active_epochs(),
        });
    }

    let parameter = secret_key.parameter;
    let mut rng = secret_key.post_keygen_rng.clone();

    let mut found: Option<([FieldElement; RAND_LEN_FE], Codeword)> = None;
    for attempt in 0..MAX_RHO_ATTEMPTS {
        let rho_vec = rng.consume_rho(RAND_LEN_FE);
        let (codeword, valid) = encoding::compute_codeword(&parameter, epoch, &rho_vec, message);
        if valid {
            let rho: [FieldElement; RAND_LEN_FE] = rho_vec.try_into().unwrap();
            found = Some((rho, codeword));
            break;
        }
        let _ = attempt;
    }
    let (rho, codeword) = found.ok_or_else(|| {
        log::error!("sign: randomness search exhausted after {MAX_RHO_ATTEMPTS} attempts at epoch {epoch}");
        XmssError::RandomnessExhausted { attempts: MAX_RHO_ATTEMPTS }
    })?;
    log::trace!("sign: epoch {epoch} found a valid codeword");

    let mut hashes: Vec<Domain8> = Vec::with_capacity(NUM_CHAINS);
    for chain_index in 0..NUM_CHAINS as u8 {
        let digit = codeword.digits[chain_index as usize];
        let start = crate::rng::prf_to_f(&secret_key.prf_key, epoch, chain_index);
        let revealed = chain::walk(&parameter, epoch, chain_index, 0, digit, &start);
        hashes.push(revealed);
    }

    let preset = secret_key.preset;
    let leaves_per_tile = preset.leaves_per_bottom_tree();
    let bottom_depth = preset.bottom_depth();
    let top_depth = preset.top_depth();
    let tile_index = epoch / leaves_per_tile;
    let local_pos = epoch % leaves_per_tile;

    let leaves = secret_key
        .tile_leaves
        .get(&tile_index)
        .ok_or(XmssError::InternalHashFailure)?
        .clone();
    let mut path = tree::authentication_path(&parameter, 0, tile_index * leaves_per_tile, leaves, local_pos, bottom_depth);

    let top_path = tree::authentication_path(&parameter, bottom_depth as u8, 0, secret_key.top_layer.clone(), tile_index, top_depth);
    path.extend(top_path);

    Ok(Signature { path, rho, hashes })
}

/// Verify `signature` against `public_key` for `(epoch, message)`. Never
/// raises: any structural or cryptographic mismatch yields `false`.
pub fn verify(public_key: &PublicKey, preset: crate::params::LifetimePreset, epoch: u64, message: &[u8; encoding::MESSAGE_LENGTH], signature: &Signature) -> bool {
    if epoch >= preset.total_epochs() {
        return false;
    }
    let final_layer = preset.total_depth();
    if signature.path.len() as u32 != final_layer {
        return false;
    }
    if signature.hashes.len() != NUM_CHAINS {
        return false;
    }

    let (codeword, valid) = encoding::compute_codeword(&public_key.parameter, epoch, &signature.rho, message);
    if !valid {
        return false;
    }

    let mut chain_ends: Vec<Domain8> = Vec::with_capacity(NUM_CHAINS);
    for chain_index in 0..NUM_CHAINS as u8 {
        let digit = codeword.digits[chain_index as usize];
        let steps = (WINTERNITZ_W - 1) - digit;
        let end = chain::walk(&public_key.parameter, epoch, chain_index, digit, steps, &signature.hashes[chain_index as usize]);
        chain_ends.push(end);
    }

    let mut current = tree_hash_leaf(&public_key.parameter, &Tweak::tree(0, epoch as u32), &chain_ends);

    let mut idx = epoch;
    for (level, sibling) in signature.path.iter().enumerate() {
        let parent_idx = idx / 2;
        let tweak = Tweak::tree((level + 1) as u8, parent_idx as u32);
        current = if idx & 1 == 0 {
            tree_hash_node(&public_key.parameter, &tweak, &current, sibling)
        } else {
            tree_hash_node(&public_key.parameter, &tweak, sibling, &current)
        };
        idx = parent_idx;
    }

    current == public_key.root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::key_gen;
    use crate::params::LifetimePreset;

    #[test]
    fn sign_then_verify_succeeds() {
        let (pk, sk) = key_gen(LifetimePreset::Lifetime2_8, [1u8; 32], 0, 256).unwrap();
        let message = [42u8; 32];
        let sig = sign(&sk, 5, &message).unwrap();
        assert!(verify(&pk, LifetimePreset::Lifetime2_8, 5, &message, &sig));
    }

    #[test]
    fn sign_is_deterministic() {
        let (_, sk) = key_gen(LifetimePreset::Lifetime2_8, [1u8; 32], 0, 256).unwrap();
        let message = [7u8; 32];
        let a = sign(&sk, 3, &message).unwrap();
        let b = sign(&sk, 3, &message).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn verify_rejects_wrong_epoch() {
        let (pk, sk) = key_gen(LifetimePreset::Lifetime2_8, [1u8; 32], 0, 256).unwrap();
        let message = [42u8; 32];
        let sig = sign(&sk, 5, &message).unwrap();
        assert!(!verify(&pk, LifetimePreset::Lifetime2_8, 6, &message, &sig));
    }

    #[test]
    fn verify_rejects_wrong_message() {
        let (pk, sk) = key_gen(LifetimePreset::Lifetime2_8, [1u8; 32], 0, 256).unwrap();
        let sig = sign(&sk, 5, &[42u8; 32]).unwrap();
        assert!(!verify(&pk, LifetimePreset::Lifetime2_8, 5, &[43u8; 32], &sig));
    }

    #[test]
    fn sign_rejects_inactive_epoch() {
        let (_, sk) = key_gen(LifetimePreset::Lifetime2_8, [1u8; 32], 16, 16).unwrap();
        let err = sign(&sk, 5, &[0u8; 32]).unwrap_err();
        assert_eq!(err, XmssError::KeyNotActive { epoch: 5, activation_epoch: 16, num_active_epochs: 16 });
    }

    #[test]
    fn tile_boundary_epochs_verify() {
        let (pk, sk) = key_gen(LifetimePreset::Lifetime2_8, [2u8; 32], 0, 256).unwrap();
        for epoch in [0u64, 15, 16, 255] {
            let message = [epoch as u8; 32];
            let sig = sign(&sk, epoch, &message).unwrap();
            assert!(verify(&pk, LifetimePreset::Lifetime2_8, epoch, &message, &sig));
        }
    }

    #[test]
    fn single_shot_key_signs_and_verifies() {
        let (pk, sk) = key_gen(LifetimePreset::Lifetime2_8, [6u8; 32], 200, 1).unwrap();
        let message = [99u8; 32];
        let sig = sign(&sk, 200, &message).unwrap();
        assert!(verify(&pk, LifetimePreset::Lifetime2_8, 200, &message, &sig));
    }

    #[test]
    fn all_zero_and_all_ff_messages_verify() {
        let (pk, sk) = key_gen(LifetimePreset::Lifetime2_8, [11u8; 32], 0, 256).unwrap();
        for message in [[0u8; 32], [0xFFu8; 32]] {
            let sig = sign(&sk, 10, &message).unwrap();
            assert!(verify(&pk, LifetimePreset::Lifetime2_8, 10, &message, &sig));
        }
    }
}
