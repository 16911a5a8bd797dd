//! WOTS+ (Winternitz One-Time Signature) over the tweakable hash suite.
//!
//! len = len_1 + len_2 chains of length w - 1. Chain `i` of a keypair lives at
//! `ADRS.with_chain(i)`, and step `j` of that chain is hashed at `.with_hash(j)`.

use pqgm_types::CryptoError;

use super::address::{word, Address, AddressType};
use super::hash::TweakableHash;
use super::params::SphincsParams;

/// Convert byte array to `out_len` base-2^log_w digits, most significant first.
///
/// Bits left over in the buffer after the last digit must be zero.
pub fn base_w(data: &[u8], log_w: u32, out_len: usize) -> Result<Vec<u32>, CryptoError> {
    if log_w == 0 || log_w > 8 {
        return Err(CryptoError::UnsupportedParameter("log_w must be in 1..=8"));
    }
    let mut out = Vec::with_capacity(out_len);
    let mut bits: u32 = 0;
    let mut acc: u32 = 0;
    let mut consumed = 0;

    for _ in 0..out_len {
        if bits < log_w {
            let byte = *data.get(consumed).ok_or(CryptoError::InvalidLength {
                expected: (out_len * log_w as usize).div_ceil(8),
                got: data.len(),
            })?;
            acc = (acc << 8) | byte as u32;
            consumed += 1;
            bits += 8;
        }
        bits -= log_w;
        out.push(acc >> bits);
        acc &= (1u32 << bits) - 1;
    }
    if acc != 0 {
        return Err(CryptoError::InvalidEncoding);
    }
    Ok(out)
}

/// Message digits followed by checksum digits.
pub fn chain_lengths(p: &SphincsParams, msg: &[u8]) -> Result<Vec<u32>, CryptoError> {
    let log_w = p.checked_log_w()?;
    if msg.len() != p.n {
        return Err(CryptoError::InvalidLength {
            expected: p.n,
            got: msg.len(),
        });
    }
    let mut lengths = base_w(msg, log_w, p.len_1)?;

    let csum: u64 = lengths.iter().map(|&v| (p.w - 1 - v) as u64).sum();

    // Left-align the checksum on a byte boundary
    let csum_bits = p.len_2 * log_w as usize;
    let csum_bytes = csum_bits.div_ceil(8);
    if csum_bytes > 8 {
        return Err(CryptoError::UnsupportedParameter("checksum wider than 64 bits"));
    }
    let shifted = csum << (csum_bytes * 8 - csum_bits);
    let encoded = &shifted.to_be_bytes()[8 - csum_bytes..];
    lengths.extend(base_w(encoded, log_w, p.len_2)?);

    Ok(lengths)
}

/// Apply F `steps` times starting from chain position `start`.
pub fn chain(
    h: &dyn TweakableHash,
    p: &SphincsParams,
    x: &[u8],
    start: u32,
    steps: u32,
    adrs: &Address,
) -> Result<Vec<u8>, CryptoError> {
    let max = p.w - 1;
    if start.checked_add(steps).map_or(true, |end| end > max) {
        return Err(CryptoError::InvalidChainRange { start, steps, max });
    }
    if x.len() != p.n {
        return Err(CryptoError::InvalidLength {
            expected: p.n,
            got: x.len(),
        });
    }
    let mut tmp = x.to_vec();
    for i in start..start + steps {
        tmp = h.f(&adrs.with_hash(i), &tmp)?;
    }
    Ok(tmp)
}

fn secret_element(
    h: &dyn TweakableHash,
    sk_seed: &[u8],
    chain_adrs: &Address,
) -> Result<Vec<u8>, CryptoError> {
    h.prf(sk_seed, &chain_adrs.with_hash(0))
}

/// Generate the uncompressed WOTS+ public key (len * n bytes).
pub fn gen_pk(
    h: &dyn TweakableHash,
    p: &SphincsParams,
    sk_seed: &[u8],
    adrs: &Address,
) -> Result<Vec<u8>, CryptoError> {
    let mut pk = Vec::with_capacity(p.wots_sig_bytes());
    for i in 0..p.len {
        let chain_adrs = adrs.with_chain(word("chain", i)?);
        let sk_i = secret_element(h, sk_seed, &chain_adrs)?;
        pk.extend_from_slice(&chain(h, p, &sk_i, 0, p.w - 1, &chain_adrs)?);
    }
    Ok(pk)
}

/// Sign an n-byte message: each chain stops at its message-derived length.
pub fn sign(
    h: &dyn TweakableHash,
    p: &SphincsParams,
    msg: &[u8],
    sk_seed: &[u8],
    adrs: &Address,
) -> Result<Vec<u8>, CryptoError> {
    let lengths = chain_lengths(p, msg)?;

    let mut sig = Vec::with_capacity(p.wots_sig_bytes());
    for (i, &steps) in lengths.iter().enumerate() {
        let chain_adrs = adrs.with_chain(word("chain", i)?);
        let sk_i = secret_element(h, sk_seed, &chain_adrs)?;
        sig.extend_from_slice(&chain(h, p, &sk_i, 0, steps, &chain_adrs)?);
    }
    Ok(sig)
}

/// Recover the uncompressed WOTS+ public key from a signature.
pub fn pk_from_sig(
    h: &dyn TweakableHash,
    p: &SphincsParams,
    sig: &[u8],
    msg: &[u8],
    adrs: &Address,
) -> Result<Vec<u8>, CryptoError> {
    let n = p.n;
    if sig.len() != p.wots_sig_bytes() {
        return Err(CryptoError::InvalidLength {
            expected: p.wots_sig_bytes(),
            got: sig.len(),
        });
    }
    let lengths = chain_lengths(p, msg)?;

    let mut pk = Vec::with_capacity(p.wots_sig_bytes());
    for (i, (&start, sig_i)) in lengths.iter().zip(sig.chunks_exact(n)).enumerate() {
        let chain_adrs = adrs.with_chain(word("chain", i)?);
        pk.extend_from_slice(&chain(h, p, sig_i, start, p.w - 1 - start, &chain_adrs)?);
    }
    Ok(pk)
}

pub fn verify(
    h: &dyn TweakableHash,
    p: &SphincsParams,
    msg: &[u8],
    sig: &[u8],
    adrs: &Address,
    expected_pk: &[u8],
) -> Result<bool, CryptoError> {
    let derived = pk_from_sig(h, p, sig, msg, adrs)?;
    Ok(subtle::ConstantTimeEq::ct_eq(derived.as_slice(), expected_pk).into())
}

/// Compress a WOTS+ public key into one Merkle leaf with a single thash call.
pub fn pk_to_leaf(
    h: &dyn TweakableHash,
    pk: &[u8],
    adrs: &Address,
) -> Result<Vec<u8>, CryptoError> {
    h.thash(&adrs.with_type(AddressType::WotsPk), pk)
}
