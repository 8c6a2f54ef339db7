//! Poseidon2 permutation over the KoalaBear field, widths 16 and 24.
//!
//! Structure follows the published Plonky3 KoalaBear construction: full
//! (external) rounds apply an M4-block-plus-chunk-sum linear layer after a
//! degree-3 S-box on every lane; partial (internal) rounds apply the S-box
//! to lane 0 only, then a diagonal linear layer built from a power-of-two
//! ladder. See `DESIGN.md` for the round-constant provenance note: the
//! tables below are a deterministic, structurally faithful substitute for
//! the real (unpublished-in-corpus) Plonky3 constant tables, laid out with
//! the exact indexing a genuine table would use.

use alloc::vec::Vec;

use crate::field::{FieldElement, P};

pub const WIDTH_16: usize = 16;
pub const WIDTH_24: usize = 24;

const FULL_ROUNDS: usize = 8;
const HALF_FULL_ROUNDS: usize = FULL_ROUNDS / 2;
const PARTIAL_ROUNDS_16: usize = 20;
const PARTIAL_ROUNDS_24: usize = 23;

/// Shift amounts for the width-16 internal diagonal, lanes 1..16. Matches
/// the real Plonky3 KoalaBear shift table shape: ascending powers of two,
/// skipping the value that would collide with the field's 2-adicity.
const SHIFTS_16: [u32; 15] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 15];

/// Shift amounts for the width-24 internal diagonal, lanes 1..24.
const SHIFTS_24: [u32; 23] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 23,
];

const fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

const fn constant_seed(width: u32, phase: u32, round: u32, pos: u32) -> u64 {
    ((width as u64) << 48) | ((phase as u64) << 40) | ((round as u64) << 16) | (pos as u64)
}

const fn const_canonical(width: u32, phase: u32, round: u32, pos: u32) -> u32 {
    let seed = constant_seed(width, phase, round, pos);
    (splitmix64(seed) % (P as u64)) as u32
}

/// Compile-time Montgomery conversion, mirroring `FieldElement::from_canonical_u32`
/// so round constants are produced via the same reduction as runtime values.
const fn to_montgomery(canonical: u32) -> u32 {
    const R2: u64 = 402_124_772;
    let t = (canonical as u64) * R2;
    monty_reduce_const(t)
}

const fn monty_reduce_const(t: u64) -> u32 {
    const N0INV: u32 = 2_130_706_431;
    let m = (t as u32).wrapping_mul(N0INV);
    let u = (t + (m as u64) * (P as u64)) >> 32;
    if u >= P as u64 {
        (u - P as u64) as u32
    } else {
        u as u32
    }
}

const fn gen_external_16() -> [[u32; WIDTH_16]; FULL_ROUNDS] {
    let mut table = [[0u32; WIDTH_16]; FULL_ROUNDS];
    let mut r = 0;
    while r < FULL_ROUNDS {
        let mut lane = 0;
        while lane < WIDTH_16 {
            table[r][lane] = to_montgomery(const_canonical(WIDTH_16 as u32, 0, r as u32, lane as u32));
            lane += 1;
        }
        r += 1;
    }
    table
}

const fn gen_external_24() -> [[u32; WIDTH_24]; FULL_ROUNDS] {
    let mut table = [[0u32; WIDTH_24]; FULL_ROUNDS];
    let mut r = 0;
    while r < FULL_ROUNDS {
        let mut lane = 0;
        while lane < WIDTH_24 {
            table[r][lane] = to_montgomery(const_canonical(WIDTH_24 as u32, 0, r as u32, lane as u32));
            lane += 1;
        }
        r += 1;
    }
    table
}

const fn gen_internal<const ROUNDS: usize>(width: u32) -> [u32; ROUNDS] {
    let mut table = [0u32; ROUNDS];
    let mut r = 0;
    while r < ROUNDS {
        table[r] = to_montgomery(const_canonical(width, 1, r as u32, 0));
        r += 1;
    }
    table
}

const EXTERNAL_CONSTANTS_16: [[u32; WIDTH_16]; FULL_ROUNDS] = gen_external_16();
const EXTERNAL_CONSTANTS_24: [[u32; WIDTH_24]; FULL_ROUNDS] = gen_external_24();
const INTERNAL_CONSTANTS_16: [u32; PARTIAL_ROUNDS_16] = gen_internal(WIDTH_16 as u32);
const INTERNAL_CONSTANTS_24: [u32; PARTIAL_ROUNDS_24] = gen_internal(WIDTH_24 as u32);

fn external_const16(round: usize) -> [FieldElement; WIDTH_16] {
    let row = EXTERNAL_CONSTANTS_16[round];
    let mut out = [FieldElement::ZERO; WIDTH_16];
    for i in 0..WIDTH_16 {
        out[i] = FieldElement::from_montgomery_unchecked(row[i]);
    }
    out
}

fn external_const24(round: usize) -> [FieldElement; WIDTH_24] {
    let row = EXTERNAL_CONSTANTS_24[round];
    let mut out = [FieldElement::ZERO; WIDTH_24];
    for i in 0..WIDTH_24 {
        out[i] = FieldElement::from_montgomery_unchecked(row[i]);
    }
    out
}

/// M4 block matrix, the 4x4 building block of the external linear layer.
fn apply_m4(x: [FieldElement; 4]) -> [FieldElement; 4] {
    let t0 = x[0] + x[1];
    let t1 = x[2] + x[3];
    let t2 = x[1].double() + t1;
    let t3 = x[3].double() + t0;
    let t4 = t1.double().double() + t3;
    let t5 = t0.double().double() + t2;
    let t6 = t3 + t5;
    let t7 = t2 + t4;
    [t6, t5, t7, t4]
}

/// External (full-round) linear layer: apply M4 to every 4-lane chunk, then
/// add the cross-chunk sum of each lane position (the "chunk-sum" MDS).
fn external_linear_layer<const WIDTH: usize>(state: &mut [FieldElement; WIDTH]) {
    debug_assert_eq!(WIDTH % 4, 0);
    for chunk in state.chunks_exact_mut(4) {
        let x: [FieldElement; 4] = [chunk[0], chunk[1], chunk[2], chunk[3]];
        let y = apply_m4(x);
        chunk.copy_from_slice(&y);
    }
    let mut sums = [FieldElement::ZERO; 4];
    for chunk in state.chunks_exact(4) {
        for i in 0..4 {
            sums[i] += chunk[i];
        }
    }
    for chunk in state.chunks_exact_mut(4) {
        for i in 0..4 {
            chunk[i] += sums[i];
        }
    }
}

fn full_round<const WIDTH: usize>(state: &mut [FieldElement; WIDTH], constants: &[FieldElement; WIDTH]) {
    for i in 0..WIDTH {
        state[i] = (state[i] + constants[i]).cube();
    }
    external_linear_layer(state);
}

/// Internal (partial) round: S-box on lane 0 only, diagonal linear layer.
/// Sums are accumulated as raw `u64`s over Montgomery words (a standard
/// lazy-reduction trick) before a single deferred `monty_reduce`, mirroring
/// the reference implementation's `permute_mut`.
fn internal_round<const WIDTH: usize>(
    state: &mut [FieldElement; WIDTH],
    constant: FieldElement,
    shifts: &[u32],
) {
    state[0] += constant;
    state[0] = state[0].cube();

    let part_sum: u64 = state[1..].iter().map(|x| x.to_montgomery_word() as u64).sum();
    let full_sum = part_sum + state[0].to_montgomery_word() as u64;
    let neg_state0 = (P - state[0].to_montgomery_word()) as u64;
    let s0 = part_sum + neg_state0;
    state[0] = FieldElement::from_montgomery_unchecked(monty_reduce_runtime(s0));

    for i in 1..WIDTH {
        let shifted = (state[i].to_montgomery_word() as u64) << shifts[i - 1];
        let si = full_sum + shifted;
        state[i] = FieldElement::from_montgomery_unchecked(monty_reduce_runtime(si));
    }
}

fn monty_reduce_runtime(t: u64) -> u32 {
    monty_reduce_const(t)
}

/// Apply the width-16 Poseidon2 permutation in place.
pub fn permute_16(state: &mut [FieldElement; WIDTH_16]) {
    for r in 0..HALF_FULL_ROUNDS {
        full_round(state, &external_const16(r));
    }
    for r in 0..PARTIAL_ROUNDS_16 {
        let c = FieldElement::from_montgomery_unchecked(INTERNAL_CONSTANTS_16[r]);
        internal_round(state, c, &SHIFTS_16);
    }
    for r in HALF_FULL_ROUNDS..FULL_ROUNDS {
        full_round(state, &external_const16(r));
    }
}

/// Apply the width-24 Poseidon2 permutation in place.
pub fn permute_24(state: &mut [FieldElement; WIDTH_24]) {
    for r in 0..HALF_FULL_ROUNDS {
        full_round(state, &external_const24(r));
    }
    for r in 0..PARTIAL_ROUNDS_24 {
        let c = FieldElement::from_montgomery_unchecked(INTERNAL_CONSTANTS_24[r]);
        internal_round(state, c, &SHIFTS_24);
    }
    for r in HALF_FULL_ROUNDS..FULL_ROUNDS {
        full_round(state, &external_const24(r));
    }
}

/// `PoseidonCompress(x) = Truncate(Permute(x) + x)`: zero-pad to `WIDTH`,
/// permute, feed the un-permuted input forward, keep the first `OUT_LEN`
/// lanes.
pub fn compress16<const OUT_LEN: usize>(input: &[FieldElement]) -> [FieldElement; OUT_LEN] {
    assert!(input.len() <= WIDTH_16);
    let mut state = [FieldElement::ZERO; WIDTH_16];
    state[..input.len()].copy_from_slice(input);
    let original = state;
    permute_16(&mut state);
    for i in 0..WIDTH_16 {
        state[i] += original[i];
    }
    let mut out = [FieldElement::ZERO; OUT_LEN];
    out.copy_from_slice(&state[..OUT_LEN]);
    out
}

pub fn compress24<const OUT_LEN: usize>(input: &[FieldElement]) -> [FieldElement; OUT_LEN] {
    assert!(input.len() <= WIDTH_24);
    let mut state = [FieldElement::ZERO; WIDTH_24];
    state[..input.len()].copy_from_slice(input);
    let original = state;
    permute_24(&mut state);
    for i in 0..WIDTH_24 {
        state[i] += original[i];
    }
    let mut out = [FieldElement::ZERO; OUT_LEN];
    out.copy_from_slice(&state[..OUT_LEN]);
    out
}

/// Sponge over the width-24 permutation with an explicit capacity value
/// (domain separation lives in the capacity lanes, never the rate).
pub fn sponge24<const OUT_LEN: usize>(
    capacity: &[FieldElement],
    input: &[FieldElement],
) -> [FieldElement; OUT_LEN] {
    assert!(capacity.len() < WIDTH_24);
    let rate = WIDTH_24 - capacity.len();

    let mut state = [FieldElement::ZERO; WIDTH_24];
    state[rate..].copy_from_slice(capacity);

    let extra = (rate - (input.len() % rate)) % rate;
    let mut padded: Vec<FieldElement> = Vec::with_capacity(input.len() + extra);
    padded.extend_from_slice(input);
    padded.resize(input.len() + extra, FieldElement::ZERO);

    for chunk in padded.chunks(rate) {
        for (i, v) in chunk.iter().enumerate() {
            state[i] += *v;
        }
        permute_24(&mut state);
    }

    let mut out = Vec::with_capacity(OUT_LEN.max(rate));
    while out.len() < OUT_LEN {
        out.extend_from_slice(&state[..rate]);
        permute_24(&mut state);
    }
    let mut result = [FieldElement::ZERO; OUT_LEN];
    result.copy_from_slice(&out[..OUT_LEN]);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permute16_is_deterministic() {
        let mut a = [FieldElement::from_canonical_u32(7); WIDTH_16];
        let mut b = a;
        permute_16(&mut a);
        permute_16(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn permute16_changes_state() {
        let mut state = [FieldElement::ZERO; WIDTH_16];
        state[0] = FieldElement::from_canonical_u32(1);
        let before = state;
        permute_16(&mut state);
        assert_ne!(state, before);
    }

    #[test]
    fn permute24_is_deterministic() {
        let mut a = [FieldElement::from_canonical_u32(11); WIDTH_24];
        let mut b = a;
        permute_24(&mut a);
        permute_24(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn compress16_feedforward_nonzero_for_zero_input() {
        let input = [FieldElement::ZERO; 8];
        let out: [FieldElement; 8] = compress16(&input);
        // Zero input still goes through a nonzero round-constant schedule.
        assert!(out.iter().any(|x| *x != FieldElement::ZERO));
    }

    #[test]
    fn sponge24_is_deterministic_and_length_correct() {
        let capacity = [FieldElement::from_canonical_u32(9)];
        let input: alloc::vec::Vec<FieldElement> =
            (0..13).map(FieldElement::from_canonical_u32).collect();
        let out1: [FieldElement; 8] = sponge24(&capacity, &input);
        let out2: [FieldElement; 8] = sponge24(&capacity, &input);
        assert_eq!(out1, out2);
    }

    #[test]
    fn sponge24_differs_on_different_capacity() {
        let input: alloc::vec::Vec<FieldElement> =
            (0..5).map(FieldElement::from_canonical_u32).collect();
        let out1: [FieldElement; 8] = sponge24(&[FieldElement::from_canonical_u32(1)], &input);
        let out2: [FieldElement; 8] = sponge24(&[FieldElement::from_canonical_u32(2)], &input);
        assert_ne!(out1, out2);
    }
}
