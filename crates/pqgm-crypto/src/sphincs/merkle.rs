//! Binary Merkle engine shared by the FORS trees and the hypertree layers.
//!
//! A tree is described by a [`TreeContext`]: the base address (its type word
//! selects the hash domain), the height, and a global leaf offset. Node `j` at
//! level `l` is hashed at `address.with_tree_height(l).with_tree_index((leaf_offset >> l) + j)`.

use pqgm_types::CryptoError;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::address::{Address, AddressType};
use super::hash::TweakableHash;

const MAX_TREE_HEIGHT: u32 = 30;

/// Produces the n-byte leaf at local index `idx`.
///
/// `addr` is the leaf address: the context address at height 0 with tree
/// index `leaf_offset + idx`.
pub trait LeafGenerator: Sync {
    fn leaf(&self, idx: u32, addr: &Address) -> Result<Vec<u8>, CryptoError>;
}

impl<F> LeafGenerator for F
where
    F: Fn(u32, &Address) -> Result<Vec<u8>, CryptoError> + Sync,
{
    fn leaf(&self, idx: u32, addr: &Address) -> Result<Vec<u8>, CryptoError> {
        self(idx, addr)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeContext {
    pub address: Address,
    pub height: u32,
    pub leaf_offset: u32,
}

impl TreeContext {
    /// Tree rooted at `address` with its type word replaced by `addr_type`.
    pub fn new(address: Address, addr_type: AddressType, height: u32, leaf_offset: u32) -> Self {
        Self {
            address: address
                .with_type(addr_type)
                .with_tree_height(0)
                .with_tree_index(0),
            height,
            leaf_offset,
        }
    }

    /// Hypertree tree with the default HASHTREE domain and no offset.
    pub fn hash_tree(address: Address, height: u32) -> Self {
        Self::new(address, AddressType::HashTree, height, 0)
    }

    fn leaf_count(&self) -> Result<u32, CryptoError> {
        if self.height > MAX_TREE_HEIGHT {
            return Err(CryptoError::UnsupportedParameter("tree height must be at most 30"));
        }
        Ok(1 << self.height)
    }

    fn node_address(&self, level: u32, position: u64) -> Result<Address, CryptoError> {
        let index = (self.leaf_offset as u64 >> level) + position;
        let index = u32::try_from(index).map_err(|_| CryptoError::InvalidAddressField {
            field: "tree_index",
            value: index as u128,
        })?;
        Ok(self.address.with_tree_height(level).with_tree_index(index))
    }
}

fn check_node(node: &[u8], n: usize) -> Result<(), CryptoError> {
    if node.len() != n {
        return Err(CryptoError::InvalidLength {
            expected: n,
            got: node.len(),
        });
    }
    Ok(())
}

fn gen_leaf(
    h: &dyn TweakableHash,
    ctx: &TreeContext,
    leaves: &dyn LeafGenerator,
    idx: u32,
) -> Result<Vec<u8>, CryptoError> {
    let leaf = leaves.leaf(idx, &ctx.node_address(0, idx as u64)?)?;
    check_node(&leaf, h.n())?;
    Ok(leaf)
}

fn gen_leaves(
    h: &dyn TweakableHash,
    ctx: &TreeContext,
    leaves: &dyn LeafGenerator,
    count: u32,
) -> Result<Vec<Vec<u8>>, CryptoError> {
    #[cfg(feature = "parallel")]
    {
        (0..count)
            .into_par_iter()
            .map(|idx| gen_leaf(h, ctx, leaves, idx))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        (0..count).map(|idx| gen_leaf(h, ctx, leaves, idx)).collect()
    }
}

/// Hash one level of `nodes` into its parents at `level`.
fn fold_level(
    h: &dyn TweakableHash,
    ctx: &TreeContext,
    nodes: &[Vec<u8>],
    level: u32,
) -> Result<Vec<Vec<u8>>, CryptoError> {
    let parent = |j: usize| -> Result<Vec<u8>, CryptoError> {
        let adrs = ctx.node_address(level, j as u64)?;
        h.h(&adrs, &nodes[2 * j], &nodes[2 * j + 1])
    };
    #[cfg(feature = "parallel")]
    {
        (0..nodes.len() / 2).into_par_iter().map(parent).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        (0..nodes.len() / 2).map(parent).collect()
    }
}

/// Build the whole tree; return the authentication path of `leaf_idx`
/// (height * n bytes, bottom level first) and the root.
pub fn compute_subtree_authentication(
    h: &dyn TweakableHash,
    ctx: &TreeContext,
    leaf_idx: u32,
    leaves: &dyn LeafGenerator,
) -> Result<(Vec<u8>, Vec<u8>), CryptoError> {
    let count = ctx.leaf_count()?;
    if leaf_idx >= count {
        return Err(CryptoError::IndexOutOfRange {
            index: leaf_idx as u64,
            limit: count as u64,
        });
    }

    let mut nodes = gen_leaves(h, ctx, leaves, count)?;
    let mut auth_path = Vec::with_capacity(ctx.height as usize * h.n());
    let mut current_idx = leaf_idx as usize;

    for level in 1..=ctx.height {
        auth_path.extend_from_slice(&nodes[current_idx ^ 1]);
        nodes = fold_level(h, ctx, &nodes, level)?;
        current_idx >>= 1;
    }

    let root = nodes.swap_remove(0);
    Ok((auth_path, root))
}

pub fn compute_subtree_root(
    h: &dyn TweakableHash,
    ctx: &TreeContext,
    leaves: &dyn LeafGenerator,
) -> Result<Vec<u8>, CryptoError> {
    let (_, root) = compute_subtree_authentication(h, ctx, 0, leaves)?;
    Ok(root)
}

/// Recompute the root from a leaf and its authentication path.
pub fn compute_root_from_auth_path(
    h: &dyn TweakableHash,
    ctx: &TreeContext,
    leaf: &[u8],
    leaf_idx: u32,
    auth_path: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let n = h.n();
    let count = ctx.leaf_count()?;
    check_node(leaf, n)?;
    if auth_path.len() != ctx.height as usize * n {
        return Err(CryptoError::InvalidPathLength {
            expected: ctx.height as usize * n,
            got: auth_path.len(),
        });
    }
    if leaf_idx >= count {
        return Err(CryptoError::IndexOutOfRange {
            index: leaf_idx as u64,
            limit: count as u64,
        });
    }

    let mut node = leaf.to_vec();
    let mut current_idx = leaf_idx;
    for (level, sibling) in (1..=ctx.height).zip(auth_path.chunks_exact(n)) {
        let adrs = ctx.node_address(level, (current_idx >> 1) as u64)?;
        node = if current_idx & 1 == 0 {
            h.h(&adrs, &node, sibling)?
        } else {
            h.h(&adrs, sibling, &node)?
        };
        current_idx >>= 1;
    }
    Ok(node)
}
