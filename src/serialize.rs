//! Byte-exact wire codecs for `PublicKey` and `Signature`, plus the
//! non-standardized `postcard` persistence format for `SecretKey`.

use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::error::XmssError;
use crate::field::FieldElement;
use crate::hash::Domain8;
use crate::keys::{self, PublicKey, SecretKey};
use crate::params::{HASH_LEN_FE, LifetimePreset, NUM_CHAINS, PARAMETER_LEN_FE, RAND_LEN_FE};

fn write_fe(out: &mut Vec<u8>, fe: FieldElement) {
    out.extend_from_slice(&fe.to_canonical_u32().to_le_bytes());
}

fn read_fe(bytes: &[u8], offset: &mut usize) -> Result<FieldElement, XmssError> {
    if *offset + 4 > bytes.len() {
        return Err(XmssError::InvalidEncoding { context: "truncated field element" });
    }
    let word = u32::from_le_bytes(bytes[*offset..*offset + 4].try_into().unwrap());
    *offset += 4;
    FieldElement::from_wire_canonical(word).ok_or(XmssError::InvalidFieldElement)
}

fn read_domain8(bytes: &[u8], offset: &mut usize) -> Result<Domain8, XmssError> {
    let mut out = [FieldElement::ZERO; HASH_LEN_FE];
    for slot in out.iter_mut() {
        *slot = read_fe(bytes, offset)?;
    }
    Ok(out)
}

/// `PublicKey` bytes: `[P (5x4) || R (8x4)]`, 52 bytes total.
pub fn public_key_to_bytes(parameter: &[FieldElement; PARAMETER_LEN_FE], root: &Domain8) -> Vec<u8> {
    let mut out = Vec::with_capacity(PARAMETER_LEN_FE * 4 + HASH_LEN_FE * 4);
    for fe in parameter {
        write_fe(&mut out, *fe);
    }
    for fe in root {
        write_fe(&mut out, *fe);
    }
    out
}

pub const PUBLIC_KEY_BYTE_LEN: usize = (PARAMETER_LEN_FE + HASH_LEN_FE) * 4;

pub fn public_key_from_bytes(bytes: &[u8]) -> Result<([FieldElement; PARAMETER_LEN_FE], Domain8), XmssError> {
    if bytes.len() != PUBLIC_KEY_BYTE_LEN {
        return Err(XmssError::InvalidEncoding { context: "public key length" });
    }
    let mut offset = 0;
    let mut parameter = [FieldElement::ZERO; PARAMETER_LEN_FE];
    for slot in parameter.iter_mut() {
        *slot = read_fe(bytes, &mut offset)?;
    }
    let root = read_domain8(bytes, &mut offset)?;
    Ok((parameter, root))
}

/// Signature bytes:
/// `u64 path_len || path (8x4 each) || rho (rand_len_fe x4) || u64 hashes_len || hashes (8x4 each)`.
pub fn signature_to_bytes(path: &[Domain8], rho: &[FieldElement], hashes: &[Domain8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(path.len() as u64).to_le_bytes());
    for node in path {
        for fe in node {
            write_fe(&mut out, *fe);
        }
    }
    for fe in rho {
        write_fe(&mut out, *fe);
    }
    out.extend_from_slice(&(hashes.len() as u64).to_le_bytes());
    for node in hashes {
        for fe in node {
            write_fe(&mut out, *fe);
        }
    }
    out
}

pub struct DecodedSignature {
    pub path: Vec<Domain8>,
    pub rho: [FieldElement; RAND_LEN_FE],
    pub hashes: Vec<Domain8>,
}

pub fn signature_from_bytes(bytes: &[u8], expected_path_len: usize) -> Result<DecodedSignature, XmssError> {
    let mut offset = 0;
    let read_u64 = |bytes: &[u8], offset: &mut usize| -> Result<u64, XmssError> {
        if bytes.len() < *offset + 8 {
            return Err(XmssError::InvalidEncoding { context: "truncated length prefix" });
        }
        let v = u64::from_le_bytes(bytes[*offset..*offset + 8].try_into().unwrap());
        *offset += 8;
        Ok(v)
    };

    let path_len = read_u64(bytes, &mut offset)? as usize;
    if path_len != expected_path_len {
        return Err(XmssError::InvalidEncoding { context: "signature path length mismatch" });
    }
    let mut path = Vec::with_capacity(path_len);
    for _ in 0..path_len {
        path.push(read_domain8(bytes, &mut offset)?);
    }

    let mut rho = [FieldElement::ZERO; RAND_LEN_FE];
    for slot in rho.iter_mut() {
        *slot = read_fe(bytes, &mut offset)?;
    }

    let hashes_len = read_u64(bytes, &mut offset)? as usize;
    if hashes_len != NUM_CHAINS {
        return Err(XmssError::InvalidEncoding { context: "signature hashes length mismatch" });
    }
    let mut hashes = Vec::with_capacity(hashes_len);
    for _ in 0..hashes_len {
        hashes.push(read_domain8(bytes, &mut offset)?);
    }

    if offset != bytes.len() {
        return Err(XmssError::InvalidEncoding { context: "trailing bytes after signature" });
    }

    Ok(DecodedSignature { path, rho, hashes })
}

/// Accepts a buffer embedding the exact signature encoding inside a larger
/// fixed-size envelope; the suffix beyond the exact encoding must be all
/// zero.
pub fn signature_from_bytes_padded(bytes: &[u8], expected_path_len: usize, total_len: usize) -> Result<DecodedSignature, XmssError> {
    if bytes.len() != total_len {
        return Err(XmssError::InvalidEncoding { context: "padded signature envelope length" });
    }
    // Locate the exact-length encoding by reconstructing its size from the
    // header fields, then verify the remainder is zero.
    let header_len = 8 + expected_path_len * HASH_LEN_FE * 4 + RAND_LEN_FE * 4 + 8 + NUM_CHAINS * HASH_LEN_FE * 4;
    if bytes.len() < header_len {
        return Err(XmssError::InvalidEncoding { context: "padded signature shorter than header" });
    }
    let (exact, suffix) = bytes.split_at(header_len);
    if suffix.iter().any(|b| *b != 0) {
        return Err(XmssError::InvalidEncoding { context: "non-zero trailing padding" });
    }
    signature_from_bytes(exact, expected_path_len)
}

fn preset_tag(preset: LifetimePreset) -> u8 {
    match preset {
        LifetimePreset::Lifetime2_8 => 0,
        LifetimePreset::Lifetime2_18 => 1,
        LifetimePreset::Lifetime2_32 => 2,
    }
}

fn preset_from_tag(tag: u8) -> Result<LifetimePreset, XmssError> {
    match tag {
        0 => Ok(LifetimePreset::Lifetime2_8),
        1 => Ok(LifetimePreset::Lifetime2_18),
        2 => Ok(LifetimePreset::Lifetime2_32),
        _ => Err(XmssError::InvalidEncoding { context: "unknown lifetime preset tag" }),
    }
}

/// Minimal persisted form of a `SecretKey`: the seed and active range, not
/// the materialized tree cache. Loading replays key generation from the
/// seed, the same reconstruction `sign` itself relies on (see
/// `DESIGN.md`'s canonical signing path resolution) rather than serializing
/// gigabytes of cached leaves for the larger lifetime presets.
#[derive(Serialize, Deserialize)]
struct SecretKeyBlob {
    preset_tag: u8,
    seed: [u8; 32],
    activation_epoch: u64,
    num_active_epochs: u64,
}

pub fn secret_key_to_bytes(secret_key: &SecretKey) -> Result<Vec<u8>, XmssError> {
    let blob = SecretKeyBlob {
        preset_tag: preset_tag(secret_key.preset),
        seed: secret_key.seed,
        activation_epoch: secret_key.activation_epoch,
        num_active_epochs: secret_key.num_active_epochs,
    };
    postcard::to_allocvec(&blob).map_err(|_| XmssError::InvalidEncoding { context: "secret key postcard encode" })
}

/// Reconstruct `(PublicKey, SecretKey)` from a persisted secret key blob by
/// replaying key generation from the stored seed.
pub fn secret_key_from_bytes(bytes: &[u8]) -> Result<(PublicKey, SecretKey), XmssError> {
    let blob: SecretKeyBlob =
        postcard::from_bytes(bytes).map_err(|_| XmssError::InvalidEncoding { context: "secret key postcard decode" })?;
    let preset = preset_from_tag(blob.preset_tag)?;
    keys::key_gen(preset, blob.seed, blob.activation_epoch, blob.num_active_epochs)
}
