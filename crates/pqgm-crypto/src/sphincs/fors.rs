//! FORS (Forest of Random Subsets) few-time signature.
//!
//! fors_trees trees of height fors_height. Tree `t` covers the global leaf
//! range `[t * 2^a, (t + 1) * 2^a)`; its nodes are hashed in the FORS_TREE
//! domain of the signing keypair and the roots are compressed at FORS_PK.

use pqgm_types::CryptoError;

use super::address::{word, Address, AddressType};
use super::hash::TweakableHash;
use super::merkle::{self, LeafGenerator, TreeContext};
use super::params::SphincsParams;

/// Extract one fors_height-bit index per tree.
///
/// Bits are taken LSB-first from each byte and accumulated MSB-first.
pub fn message_to_indices(p: &SphincsParams, msg: &[u8]) -> Result<Vec<u32>, CryptoError> {
    if msg.len() < p.fors_index_bytes() {
        return Err(CryptoError::InvalidLength {
            expected: p.fors_index_bytes(),
            got: msg.len(),
        });
    }
    let mut indices = Vec::with_capacity(p.fors_trees);
    let mut offset = 0usize;
    for _ in 0..p.fors_trees {
        let mut value = 0u32;
        for _ in 0..p.fors_height {
            let bit = (msg[offset >> 3] >> (offset & 7)) & 1;
            value = (value << 1) | bit as u32;
            offset += 1;
        }
        indices.push(value);
    }
    Ok(indices)
}

/// FORS leaf: F applied to the PRF-derived secret at the leaf address.
pub struct ForsLeaves<'a> {
    pub h: &'a dyn TweakableHash,
    pub sk_seed: &'a [u8],
}

impl LeafGenerator for ForsLeaves<'_> {
    fn leaf(&self, _idx: u32, addr: &Address) -> Result<Vec<u8>, CryptoError> {
        let sk = self.h.prf(self.sk_seed, addr)?;
        self.h.f(addr, &sk)
    }
}

fn tree_context(
    p: &SphincsParams,
    adrs: &Address,
    tree: usize,
) -> Result<TreeContext, CryptoError> {
    let height = word("fors_height", p.fors_height)?;
    let offset = word("leaf_offset", tree << p.fors_height)?;
    Ok(TreeContext::new(
        adrs.keypair_scope(),
        AddressType::ForsTree,
        height,
        offset,
    ))
}

fn roots_to_pk(
    h: &dyn TweakableHash,
    adrs: &Address,
    roots: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let pk_adrs = adrs.keypair_scope().with_type(AddressType::ForsPk);
    h.thash(&pk_adrs, roots)
}

/// Sign a FORS message. Returns `(signature, public key)`; the signature is
/// `fors_trees * (1 + fors_height) * n` bytes.
pub fn fors_sign(
    h: &dyn TweakableHash,
    p: &SphincsParams,
    msg: &[u8],
    sk_seed: &[u8],
    adrs: &Address,
) -> Result<(Vec<u8>, Vec<u8>), CryptoError> {
    let n = h.n();
    let indices = message_to_indices(p, msg)?;
    let leaves = ForsLeaves { h, sk_seed };

    let mut sig = Vec::with_capacity(p.fors_sig_bytes());
    let mut roots = Vec::with_capacity(p.fors_trees * n);

    for (t, &idx) in indices.iter().enumerate() {
        let ctx = tree_context(p, adrs, t)?;
        let leaf_adrs = ctx.address.with_tree_index(ctx.leaf_offset + idx);
        sig.extend_from_slice(&h.prf(sk_seed, &leaf_adrs)?);

        let (auth_path, root) = merkle::compute_subtree_authentication(h, &ctx, idx, &leaves)?;
        sig.extend_from_slice(&auth_path);
        roots.extend_from_slice(&root);
    }

    let pk = roots_to_pk(h, adrs, &roots)?;
    Ok((sig, pk))
}

/// Recover the FORS public key from a signature.
pub fn fors_pk_from_sig(
    h: &dyn TweakableHash,
    p: &SphincsParams,
    sig: &[u8],
    msg: &[u8],
    adrs: &Address,
) -> Result<Vec<u8>, CryptoError> {
    let n = h.n();
    if sig.len() != p.fors_sig_bytes() {
        return Err(CryptoError::InvalidLength {
            expected: p.fors_sig_bytes(),
            got: sig.len(),
        });
    }
    let indices = message_to_indices(p, msg)?;

    let mut roots = Vec::with_capacity(p.fors_trees * n);
    for (t, (&idx, part)) in indices
        .iter()
        .zip(sig.chunks_exact((1 + p.fors_height) * n))
        .enumerate()
    {
        let ctx = tree_context(p, adrs, t)?;
        let (sk, auth_path) = part.split_at(n);

        let leaf_adrs = ctx.address.with_tree_index(ctx.leaf_offset + idx);
        let leaf = h.f(&leaf_adrs, sk)?;
        let root = merkle::compute_root_from_auth_path(h, &ctx, &leaf, idx, auth_path)?;
        roots.extend_from_slice(&root);
    }

    roots_to_pk(h, adrs, &roots)
}

pub fn fors_verify(
    h: &dyn TweakableHash,
    p: &SphincsParams,
    sig: &[u8],
    msg: &[u8],
    adrs: &Address,
    expected_pk: &[u8],
) -> Result<bool, CryptoError> {
    let derived = fors_pk_from_sig(h, p, sig, msg, adrs)?;
    Ok(subtle::ConstantTimeEq::ct_eq(derived.as_slice(), expected_pk).into())
}
