//! Hypertree: d layers of Merkle trees whose leaves are WOTS+ public keys.
//!
//! Layer 0 signs the FORS public key; each higher layer signs the root of
//! the tree below it. Only the top tree (layer d - 1, tree 0) is committed to
//! by the public key.

use pqgm_types::CryptoError;
use tracing::trace;

use super::address::{tree_hash_address, wots_address, Address};
use super::hash::TweakableHash;
use super::merkle::{self, LeafGenerator, TreeContext};
use super::params::SphincsParams;
use super::wots;

/// Merkle leaves of one hypertree tree: compressed WOTS+ public keys.
pub struct WotsLeaves<'a> {
    pub h: &'a dyn TweakableHash,
    pub p: &'a SphincsParams,
    pub sk_seed: &'a [u8],
    pub layer: u32,
    pub tree: u64,
}

impl LeafGenerator for WotsLeaves<'_> {
    fn leaf(&self, idx: u32, _addr: &Address) -> Result<Vec<u8>, CryptoError> {
        let wots_adrs = wots_address(self.layer, self.tree, idx)?;
        let pk = wots::gen_pk(self.h, self.p, self.sk_seed, &wots_adrs)?;
        wots::pk_to_leaf(self.h, &pk, &wots_adrs)
    }
}

fn tree_context(p: &SphincsParams, layer: u32, tree: u64) -> Result<TreeContext, CryptoError> {
    let height = u32::try_from(p.tree_height)
        .map_err(|_| CryptoError::UnsupportedParameter("tree_height must be in 1..=30"))?;
    Ok(TreeContext::hash_tree(tree_hash_address(layer, tree)?, height))
}

/// Position of the parent layer's signing leaf.
fn next_position(tree: u64, tree_height: usize) -> (u64, u32) {
    let leaf = (tree & ((1u64 << tree_height) - 1)) as u32;
    (tree >> tree_height, leaf)
}

fn layer_word(layer: usize) -> Result<u32, CryptoError> {
    super::address::word("layer", layer)
}

/// Root of the tree at (`layer`, `tree`).
pub fn tree_root(
    h: &dyn TweakableHash,
    p: &SphincsParams,
    sk_seed: &[u8],
    layer: u32,
    tree: u64,
) -> Result<Vec<u8>, CryptoError> {
    let ctx = tree_context(p, layer, tree)?;
    let leaves = WotsLeaves {
        h,
        p,
        sk_seed,
        layer,
        tree,
    };
    merkle::compute_subtree_root(h, &ctx, &leaves)
}

/// Public root: the top tree of the hypertree.
pub fn public_root(
    h: &dyn TweakableHash,
    p: &SphincsParams,
    sk_seed: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    tree_root(h, p, sk_seed, layer_word(p.d - 1)?, 0)
}

/// Sign `msg` (the FORS public key) through all d layers.
///
/// Returns `d * (len + tree_height) * n` bytes.
pub fn hypertree_sign(
    h: &dyn TweakableHash,
    p: &SphincsParams,
    sk_seed: &[u8],
    msg: &[u8],
    tree_idx: u64,
    leaf_idx: u32,
) -> Result<Vec<u8>, CryptoError> {
    let mut sig = Vec::with_capacity(p.d * p.layer_sig_bytes());
    let mut current_root = msg.to_vec();
    let mut current_tree = tree_idx;
    let mut current_leaf = leaf_idx;

    for layer in 0..p.d {
        let layer_addr = layer_word(layer)?;
        trace!(layer, tree = current_tree, leaf = current_leaf, "signing hypertree layer");

        let wots_adrs = wots_address(layer_addr, current_tree, current_leaf)?;
        sig.extend_from_slice(&wots::sign(h, p, &current_root, sk_seed, &wots_adrs)?);

        let ctx = tree_context(p, layer_addr, current_tree)?;
        let leaves = WotsLeaves {
            h,
            p,
            sk_seed,
            layer: layer_addr,
            tree: current_tree,
        };
        let (auth_path, root) =
            merkle::compute_subtree_authentication(h, &ctx, current_leaf, &leaves)?;
        sig.extend_from_slice(&auth_path);
        current_root = root;

        if layer + 1 < p.d {
            (current_tree, current_leaf) = next_position(current_tree, p.tree_height);
        }
    }

    Ok(sig)
}

/// Recompute the top root from a hypertree signature.
pub fn hypertree_root_from_sig(
    h: &dyn TweakableHash,
    p: &SphincsParams,
    msg: &[u8],
    sig: &[u8],
    tree_idx: u64,
    leaf_idx: u32,
) -> Result<Vec<u8>, CryptoError> {
    let n = p.n;
    if sig.len() != p.d * p.layer_sig_bytes() {
        return Err(CryptoError::InvalidLength {
            expected: p.d * p.layer_sig_bytes(),
            got: sig.len(),
        });
    }

    let mut node = msg.to_vec();
    let mut current_tree = tree_idx;
    let mut current_leaf = leaf_idx;

    for (layer, layer_sig) in sig.chunks_exact(p.layer_sig_bytes()).enumerate() {
        let layer_addr = layer_word(layer)?;
        trace!(layer, tree = current_tree, leaf = current_leaf, "verifying hypertree layer");

        let (wots_sig, auth_path) = layer_sig.split_at(p.len * n);
        let wots_adrs = wots_address(layer_addr, current_tree, current_leaf)?;
        let wots_pk = wots::pk_from_sig(h, p, wots_sig, &node, &wots_adrs)?;
        let leaf = wots::pk_to_leaf(h, &wots_pk, &wots_adrs)?;

        let ctx = tree_context(p, layer_addr, current_tree)?;
        node = merkle::compute_root_from_auth_path(h, &ctx, &leaf, current_leaf, auth_path)?;

        if layer + 1 < p.d {
            (current_tree, current_leaf) = next_position(current_tree, p.tree_height);
        }
    }

    Ok(node)
}

/// Verify a hypertree signature against the public root.
pub fn hypertree_verify(
    h: &dyn TweakableHash,
    p: &SphincsParams,
    msg: &[u8],
    sig: &[u8],
    tree_idx: u64,
    leaf_idx: u32,
    pk_root: &[u8],
) -> Result<bool, CryptoError> {
    let root = hypertree_root_from_sig(h, p, msg, sig, tree_idx, leaf_idx)?;
    Ok(subtle::ConstantTimeEq::ct_eq(root.as_slice(), pk_root).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sphincs::hash::Sha256Robust;
    use crate::sphincs::params::get_params;
    use pqgm_types::SecurityLevel;

    /// Three layers of height-3 trees.
    fn small() -> SphincsParams {
        SphincsParams {
            full_height: 9,
            d: 3,
            tree_height: 3,
            ..*get_params(SecurityLevel::Level1)
        }
    }

    fn setup(p: &SphincsParams) -> (Sha256Robust, Vec<u8>) {
        let pub_seed = vec![0x17u8; p.n];
        let sk_seed: Vec<u8> = (0u8..16).collect();
        (Sha256Robust::new(p, &pub_seed).unwrap(), sk_seed)
    }

    #[test]
    fn test_next_position() {
        assert_eq!(next_position(0b1011_0110, 3), (0b1_0110, 0b110));
        assert_eq!(next_position(0xff, 8), (0, 0xff));
        assert_eq!(next_position(0x1_00, 8), (1, 0));
    }

    #[test]
    fn test_sign_verify_small() {
        let p = small();
        p.validate().unwrap();
        let (h, sk_seed) = setup(&p);
        let root = public_root(&h, &p, &sk_seed).unwrap();
        let msg = [0xa5u8; 16];

        for (tree_idx, leaf_idx) in [(0u64, 0u32), (0b101_011, 6), (0b111_111, 7)] {
            let sig = hypertree_sign(&h, &p, &sk_seed, &msg, tree_idx, leaf_idx).unwrap();
            assert_eq!(sig.len(), p.d * p.layer_sig_bytes());
            assert!(hypertree_verify(&h, &p, &msg, &sig, tree_idx, leaf_idx, &root).unwrap());

            // Wrong position
            let other_leaf = (leaf_idx + 1) % 8;
            assert!(!hypertree_verify(&h, &p, &msg, &sig, tree_idx, other_leaf, &root).unwrap());
        }
    }

    #[test]
    fn test_tampered_msg_rejected() {
        let p = small();
        let (h, sk_seed) = setup(&p);
        let root = public_root(&h, &p, &sk_seed).unwrap();
        let sig = hypertree_sign(&h, &p, &sk_seed, &[1u8; 16], 3, 2).unwrap();
        assert!(!hypertree_verify(&h, &p, &[2u8; 16], &sig, 3, 2, &root).unwrap());
    }

    #[test]
    fn test_top_root_matches_tree_root() {
        let p = small();
        let (h, sk_seed) = setup(&p);
        assert_eq!(
            public_root(&h, &p, &sk_seed).unwrap(),
            tree_root(&h, &p, &sk_seed, 2, 0).unwrap()
        );
        // Lower layers use distinct addresses
        assert_ne!(
            tree_root(&h, &p, &sk_seed, 0, 0).unwrap(),
            tree_root(&h, &p, &sk_seed, 2, 0).unwrap()
        );
    }

    #[test]
    fn test_root_from_sig_length() {
        let p = small();
        let (h, _) = setup(&p);
        assert!(matches!(
            hypertree_root_from_sig(&h, &p, &[0u8; 16], &[0u8; 10], 0, 0),
            Err(CryptoError::InvalidLength { .. })
        ));
    }
}
