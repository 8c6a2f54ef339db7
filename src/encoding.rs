//! Winternitz "incomparable encoding": base-`W` digit chunking plus a
//! 2-digit checksum, such that `sum(content_digits) + checksum_value ==
//! content_chains * (W-1)`, where `checksum_value` is reconstructed from
//! the two stored checksum digits (themselves a base-`W` encoding of that
//! value, not the value itself).
//!
//! Unlike the reference's `TargetSum` W=1 variant (which rebases a message
//! hash through an arbitrary-precision integer), this chunks the message
//! hash's byte serialization directly: `w = 8` divides the byte boundary
//! exactly, so each content digit is one byte of the domain8 output.

use alloc::vec::Vec;

use crate::field::FieldElement;
use crate::hash::{message_hash, Domain8, Parameter};
use crate::params::{CONTENT_CHAINS, NUM_CHAINS, WINTERNITZ_W};

/// Message bytes are fixed-length per the wire contract.
pub const MESSAGE_LENGTH: usize = 32;

/// Number of field elements the 32-byte message is packed into before
/// hashing: two 128-bit halves, each base-`p` decomposed into
/// `HALF_LEN_FE` digits. `p > 2^30`, so `HALF_LEN_FE = 5` digits (`>= 150`
/// bits of capacity) are needed to losslessly cover each 128-bit half — 4
/// digits would only cover `~124` bits and silently drop the half's top
/// bits.
const HALF_LEN_FE: usize = 5;
const MSG_LEN_FE: usize = HALF_LEN_FE * 2;

/// Base-`p` decompose a 128-bit accumulator into exactly `HALF_LEN_FE`
/// digits, low digit first. Every digit is retained, so the decomposition
/// is lossless as long as `acc < p^HALF_LEN_FE`.
fn decompose_u128(mut acc: u128) -> [FieldElement; HALF_LEN_FE] {
    let p = crate::field::P as u128;
    core::array::from_fn(|_| {
        let digit = FieldElement::from_canonical_u32((acc % p) as u32);
        acc /= p;
        digit
    })
}

fn message_to_field_elements(message: &[u8; MESSAGE_LENGTH]) -> [FieldElement; MSG_LEN_FE] {
    let mut out = [FieldElement::ZERO; MSG_LEN_FE];

    let mut acc: u128 = 0;
    for &b in message[..16].iter() {
        acc = (acc << 8) | b as u128;
    }
    out[..HALF_LEN_FE].copy_from_slice(&decompose_u128(acc));

    let mut acc2: u128 = 0;
    for &b in message[16..].iter() {
        acc2 = (acc2 << 8) | b as u128;
    }
    out[HALF_LEN_FE..].copy_from_slice(&decompose_u128(acc2));

    out
}

fn domain8_to_bytes(h: &Domain8) -> [u8; 32] {
    let mut out = [0u8; 32];
    for (i, fe) in h.iter().enumerate() {
        out[i * 4..i * 4 + 4].copy_from_slice(&fe.to_canonical_u32().to_le_bytes());
    }
    out
}

/// A codeword: `CONTENT_CHAINS` message-derived digits followed by
/// `CHECKSUM_CHAINS` checksum digits, `NUM_CHAINS` total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Codeword {
    pub digits: [u32; NUM_CHAINS],
}

/// Compute the codeword for `(parameter, epoch, rho, message)`.
///
/// `valid` is the one remaining hash-search condition this encoding imposes:
/// every content digit must be strictly less than the sentinel `W - 1`, so
/// the derived checksum digits stay representable without overflow (see
/// `DESIGN.md`, Open Question 5).
pub fn compute_codeword(parameter: &Parameter, epoch: u64, rho: &[FieldElement], message: &[u8; MESSAGE_LENGTH]) -> (Codeword, bool) {
    let message_fe = message_to_field_elements(message);
    let digest = message_hash(parameter, rho, epoch, &message_fe);
    let bytes = domain8_to_bytes(&digest);

    let mut digits = [0u32; NUM_CHAINS];
    let mut valid = true;
    let mut checksum: u64 = 0;
    for i in 0..CONTENT_CHAINS {
        let d = bytes[i] as u32;
        if d >= WINTERNITZ_W - 1 {
            valid = false;
        }
        digits[i] = d;
        checksum += (WINTERNITZ_W - 1 - d) as u64;
    }

    // Two base-W checksum digits, most significant first.
    digits[CONTENT_CHAINS] = ((checksum / WINTERNITZ_W as u64) % WINTERNITZ_W as u64) as u32;
    digits[CONTENT_CHAINS + 1] = (checksum % WINTERNITZ_W as u64) as u32;

    (Codeword { digits }, valid)
}

/// The checksum digits hold the base-`W` digit representation of
/// `C = sum(W-1-d_i)` over the content digits, not `C` itself — so the
/// invariant is `sum(content_digits) + C == CONTENT_CHAINS * (W-1)`, with
/// `C` reconstructed from its two stored digits, rather than a flat sum
/// over every stored digit.
pub fn checksum_identity_holds(codeword: &Codeword) -> bool {
    let content_sum: u64 = codeword.digits[..CONTENT_CHAINS].iter().map(|d| *d as u64).sum();
    let checksum = codeword.digits[CONTENT_CHAINS] as u64 * WINTERNITZ_W as u64 + codeword.digits[CONTENT_CHAINS + 1] as u64;
    content_sum + checksum == CONTENT_CHAINS as u64 * (WINTERNITZ_W as u64 - 1)
}
