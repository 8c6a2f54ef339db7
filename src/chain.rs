//! Hash-chain forward walk: `x_{j+1} = chain_hash(P, epoch, c, j+1, x_j)`.

use crate::hash::{chain_hash, Domain8, Parameter};
use crate::tweak::Tweak;

/// Walk `steps` positions forward from `start`, which sits at
/// `start_pos_in_chain`. Used both to build the OTS public element
/// (`steps = W-1-d_c` starting from a freshly derived chain start) and to
/// verify a signature (`steps = W-1-d_c` starting from the revealed
/// intermediate).
pub fn walk(
    parameter: &Parameter,
    epoch: u64,
    chain_index: u8,
    start_pos_in_chain: u32,
    steps: u32,
    start: &Domain8,
) -> Domain8 {
    let mut current = *start;
    for j in 0..steps {
        let pos = start_pos_in_chain + j + 1;
        let tweak = Tweak::chain(epoch, chain_index, pos as u8);
        current = chain_hash(parameter, &tweak, &current);
    }
    current
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
    fn walk_is_deterministic() {
        let p = param();
        let start = domain8(5);
        let a = walk(&p, 1, 0, 0, 10, &start);
        let b = walk(&p, 1, 0, 0, 10, &start);
        assert_eq!(a, b);
    }

    #[test]
    fn walk_composes() {
        let p = param();
        let start = domain8(5);
        let full = walk(&p, 1, 0, 0, 10, &start);
        let half = walk(&p, 1, 0, 0, 4, &start);
        let rest = walk(&p, 1, 0, 4, 6, &half);
        assert_eq!(full, rest);
    }

    #[test]
    fn zero_steps_is_identity() {
        let p = param();
        let start = domain8(5);
        assert_eq!(walk(&p, 1, 0, 0, 0, &start), start);
    }
}
