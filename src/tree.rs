//! Bottom/top sub-tree construction over domain8 nodes.
//!
//! A full lifetime spans `2^L` epochs split into `2^(L/2)` bottom tiles of
//! `2^(L/2)` leaves each, joined by one top tree over the bottom roots. A
//! `SecretKey` only ever materializes leaves for the epochs in its active
//! range; every other leaf (inside a partially-covered tile) and every
//! other bottom-tree root (for tiles the active range never touches) is
//! stood in for by a domain8 value drawn from the key-generation RNG —
//! this is the "padding node" concept, generalized from layer-boundary
//! padding to "this position's real value was never computed." Because
//! every tile and every top-tree slot is filled (either with a real value
//! or a padding value) before any merge step runs, every layer this module
//! builds already has an even, power-of-two-aligned length, so the
//! a general even-start/odd-end parity fixup never triggers in practice — it
//! would only matter for a builder that merged a genuinely ragged layer,
//! which this design avoids by construction (see `DESIGN.md`).

use alloc::vec::Vec;

use crate::hash::{tree_hash_node, Domain8, Parameter};
use crate::rng::DeterministicRng;
use crate::tweak::Tweak;

/// Merge one full (already power-of-two-sized, even-aligned) layer into its
/// parent layer. `level` is the tweak level of the *input* layer; parents
/// are tagged `level + 1`. `start_index` is the global position of
/// `nodes[0]`.
fn merge_layer(parameter: &Parameter, level: u8, start_index: u64, nodes: &[Domain8]) -> Vec<Domain8> {
    debug_assert_eq!(nodes.len() % 2, 0, "layer must be even before merging");
    debug_assert_eq!(start_index % 2, 0, "layer must be even-aligned before merging");

    let parent_level = level + 1;
    let mut parents = Vec::with_capacity(nodes.len() / 2);
    for i in 0..nodes.len() / 2 {
        let parent_pos = start_index / 2 + i as u64;
        let tweak = Tweak::tree(parent_level, parent_pos as u32);
        parents.push(tree_hash_node(parameter, &tweak, &nodes[2 * i], &nodes[2 * i + 1]));
    }
    parents
}

/// Merge a full layer of `2^depth` nodes up to its single root, `depth`
/// steps, starting at tweak level `base_level` for the input layer.
fn merge_to_root(parameter: &Parameter, base_level: u8, start_index: u64, mut nodes: Vec<Domain8>, depth: u32) -> Domain8 {
    let mut level = base_level;
    let mut start = start_index;
    for _ in 0..depth {
        nodes = merge_layer(parameter, level, start, &nodes);
        level += 1;
        start /= 2;
    }
    debug_assert_eq!(nodes.len(), 1);
    nodes[0]
}

/// Build one bottom tile's root from its leaves. `leaves` must have length
/// `2^bottom_depth` and already has padding values substituted for any
/// inactive local position — filling with real-vs-padding values happens
/// in the caller (`keys::key_gen`), in ascending local-position order, so
/// the RNG consumption order stays ascending.
pub fn build_bottom_tile_root(parameter: &Parameter, tile_index: u64, leaves_per_tile: u64, leaves: Vec<Domain8>, bottom_depth: u32) -> Domain8 {
    debug_assert_eq!(leaves.len() as u64, leaves_per_tile);
    let global_leaf_start = tile_index * leaves_per_tile;
    merge_to_root(parameter, 0, global_leaf_start, leaves, bottom_depth)
}

/// Build the top tree's root from `2^top_depth` bottom-tile roots (indexed
/// by tile, ascending). `tile_roots[i]` is the root for tile `i`; the
/// tweak level for this input layer is `bottom_depth` (roots live at that
/// absolute tree level).
pub fn build_top_root(parameter: &Parameter, bottom_depth: u32, tile_roots: Vec<Domain8>, top_depth: u32) -> Domain8 {
    merge_to_root(parameter, bottom_depth as u8, 0, tile_roots, top_depth)
}

/// Draw one padding node from the RNG, substituting for a leaf or
/// bottom-root this key was never given real material for.
pub fn padding_node(rng: &mut DeterministicRng) -> Domain8 {
    rng.consume_padding_node()
}

/// The authentication path for `local_position` within one already-built
/// full layer set, returned sibling-first from the leaf upward. Used both
/// for the bottom portion (within a tile) and, separately, for the top
/// portion (within the tile-root layer) by the caller.
pub fn authentication_path(parameter: &Parameter, base_level: u8, start_index: u64, mut nodes: Vec<Domain8>, local_position: u64, depth: u32) -> Vec<Domain8> {
    let mut path = Vec::with_capacity(depth as usize);
    let mut idx = local_position;
    let mut level = base_level;
    let mut start = start_index;
    for _ in 0..depth {
        let sibling_idx = (idx ^ 1) as usize;
        path.push(nodes[sibling_idx]);
        nodes = merge_layer(parameter, level, start, &nodes);
        idx /= 2;
        level += 1;
        start /= 2;
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldElement;

    fn param() -> Parameter {
        core::array::from_fn(|i| FieldElement::from_canonical_u32(i as u32 + 1))
    }

    fn domain8(seed: u32) -> Domain8 {
        core::array::from_fn(|i| FieldElement::from_canonical_u32(seed + i as u32))
    }

    #[test]
    fn bottom_tile_root_is_deterministic() {
        let p = param();
        let leaves: Vec<Domain8> = (0..8).map(domain8).collect();
        let r1 = build_bottom_tile_root(&p, 0, 8, leaves.clone(), 3);
        let r2 = build_bottom_tile_root(&p, 0, 8, leaves, 3);
        assert_eq!(r1, r2);
    }

    #[test]
    fn different_tile_index_changes_root() {
        let p = param();
        let leaves: Vec<Domain8> = (0..8).map(domain8).collect();
        let r0 = build_bottom_tile_root(&p, 0, 8, leaves.clone(), 3);
        let r1 = build_bottom_tile_root(&p, 1, 8, leaves, 3);
        assert_ne!(r0, r1);
    }

    #[test]
    fn authentication_path_reaches_root() {
        let p = param();
        let leaves: Vec<Domain8> = (0..8).map(domain8).collect();
        let root = build_bottom_tile_root(&p, 0, 8, leaves.clone(), 3);

        let position = 5u64;
        let path = authentication_path(&p, 0, 0, leaves.clone(), position, 3);
        assert_eq!(path.len(), 3);

        // Walk the path manually and confirm it reaches the same root.
        let mut current = leaves[position as usize];
        let mut idx = position;
        let mut level = 0u8;
        for sibling in &path {
            let tweak = if idx & 1 == 0 {
                let t = Tweak::tree(level + 1, (idx / 2) as u32);
                current = tree_hash_node(&p, &t, &current, sibling);
                t
            } else {
                let t = Tweak::tree(level + 1, (idx / 2) as u32);
                current = tree_hash_node(&p, &t, sibling, &current);
                t
            };
            let _ = tweak;
            idx /= 2;
            level += 1;
        }
        assert_eq!(current, root);
    }

    #[test]
    fn top_root_combines_tile_roots() {
        let p = param();
        let roots: Vec<Domain8> = (0..4).map(domain8).collect();
        let r1 = build_top_root(&p, 3, roots.clone(), 2);
        let r2 = build_top_root(&p, 3, roots, 2);
        assert_eq!(r1, r2);
    }
}
