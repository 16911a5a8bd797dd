//! SPHINCS+ hash address (ADRS).
//!
//! Eight big-endian 32-bit words, 32 bytes on the wire:
//!   [0:4]   layer
//!   [4:16]  tree (96-bit, words 1..=3)
//!   [16:20] type
//!   [20:24] keypair
//!   [24:28] chain (WOTS+) / tree height (HASHTREE, FORS)
//!   [28:32] hash (WOTS+) / tree index (HASHTREE, FORS)
//!
//! An [`Address`] is a `Copy` value: every setter consumes it and returns the
//! derived address, so recursive and parallel tree builders never share one.

use pqgm_types::CryptoError;

/// Size of an encoded address in bytes.
pub const ADDRESS_BYTES: usize = 32;

const TREE_LIMIT: u128 = 1 << 96;

const LAYER: usize = 0;
const TREE: usize = 1;
const TYPE: usize = 4;
const KEYPAIR: usize = 5;
const CHAIN: usize = 6;
const HASH: usize = 7;

/// Hash-domain discriminator stored in word 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum AddressType {
    Wots = 0,
    WotsPk = 1,
    HashTree = 2,
    ForsTree = 3,
    ForsPk = 4,
}

impl TryFrom<u32> for AddressType {
    type Error = CryptoError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AddressType::Wots),
            1 => Ok(AddressType::WotsPk),
            2 => Ok(AddressType::HashTree),
            3 => Ok(AddressType::ForsTree),
            4 => Ok(AddressType::ForsPk),
            _ => Err(CryptoError::InvalidAddressField {
                field: "type",
                value: value as u128,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Address {
    words: [u32; 8],
}

impl Address {
    /// The all-zero address.
    pub const fn new() -> Self {
        Self { words: [0u32; 8] }
    }

    pub const fn from_words(words: [u32; 8]) -> Self {
        Self { words }
    }

    pub fn words(&self) -> [u32; 8] {
        self.words
    }

    fn with_word(mut self, idx: usize, value: u32) -> Self {
        self.words[idx] = value;
        self
    }

    pub fn with_layer(self, layer: u32) -> Self {
        self.with_word(LAYER, layer)
    }

    /// Set the 96-bit tree field, split big-endian across words 1..=3.
    pub fn with_tree(mut self, tree: u128) -> Result<Self, CryptoError> {
        if tree >= TREE_LIMIT {
            return Err(CryptoError::InvalidAddressField {
                field: "tree",
                value: tree,
            });
        }
        self.words[TREE] = (tree >> 64) as u32;
        self.words[TREE + 1] = (tree >> 32) as u32;
        self.words[TREE + 2] = tree as u32;
        Ok(self)
    }

    /// Set the type word. The remaining words are left untouched.
    pub fn with_type(self, addr_type: AddressType) -> Self {
        self.with_word(TYPE, addr_type as u32)
    }

    pub fn with_keypair(self, keypair: u32) -> Self {
        self.with_word(KEYPAIR, keypair)
    }

    pub fn with_chain(self, chain: u32) -> Self {
        self.with_word(CHAIN, chain)
    }

    /// Same word as the chain index (word 6).
    pub fn with_tree_height(self, height: u32) -> Self {
        self.with_word(CHAIN, height)
    }

    pub fn with_hash(self, hash: u32) -> Self {
        self.with_word(HASH, hash)
    }

    /// Same word as the hash index (word 7).
    pub fn with_tree_index(self, index: u32) -> Self {
        self.with_word(HASH, index)
    }

    pub fn layer(&self) -> u32 {
        self.words[LAYER]
    }

    pub fn tree(&self) -> u128 {
        ((self.words[TREE] as u128) << 64)
            | ((self.words[TREE + 1] as u128) << 32)
            | self.words[TREE + 2] as u128
    }

    /// Raw type word.
    pub fn type_word(&self) -> u32 {
        self.words[TYPE]
    }

    pub fn address_type(&self) -> Result<AddressType, CryptoError> {
        AddressType::try_from(self.words[TYPE])
    }

    pub fn keypair(&self) -> u32 {
        self.words[KEYPAIR]
    }

    pub fn chain(&self) -> u32 {
        self.words[CHAIN]
    }

    pub fn tree_height(&self) -> u32 {
        self.words[CHAIN]
    }

    pub fn hash(&self) -> u32 {
        self.words[HASH]
    }

    pub fn tree_index(&self) -> u32 {
        self.words[HASH]
    }

    /// Layer, tree and keypair of `self`; everything else zero.
    pub fn keypair_scope(&self) -> Self {
        let mut scope = Self::new();
        scope.words[LAYER..TYPE].copy_from_slice(&self.words[LAYER..TYPE]);
        scope.words[KEYPAIR] = self.words[KEYPAIR];
        scope
    }

    pub fn encode(&self) -> [u8; ADDRESS_BYTES] {
        let mut out = [0u8; ADDRESS_BYTES];
        for (chunk, word) in out.chunks_exact_mut(4).zip(self.words.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != ADDRESS_BYTES {
            return Err(CryptoError::InvalidLength {
                expected: ADDRESS_BYTES,
                got: bytes.len(),
            });
        }
        let mut words = [0u32; 8];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Ok(Self { words })
    }
}

/// Narrow an index to a 32-bit address word.
pub(crate) fn word(field: &'static str, value: usize) -> Result<u32, CryptoError> {
    u32::try_from(value).map_err(|_| CryptoError::InvalidAddressField {
        field,
        value: value as u128,
    })
}

/// WOTS+ address of one keypair: chain 0, hash 0.
pub fn wots_address(layer: u32, tree: u64, keypair: u32) -> Result<Address, CryptoError> {
    Ok(Address::new()
        .with_layer(layer)
        .with_tree(tree as u128)?
        .with_type(AddressType::Wots)
        .with_keypair(keypair))
}

/// Merkle node address of one hypertree tree: height 0, index 0.
pub fn tree_hash_address(layer: u32, tree: u64) -> Result<Address, CryptoError> {
    Ok(Address::new()
        .with_layer(layer)
        .with_tree(tree as u128)?
        .with_type(AddressType::HashTree))
}

/// FORS leaf address of one keypair: height 0, index 0.
pub fn fors_tree_address(layer: u32, tree: u64, keypair: u32) -> Result<Address, CryptoError> {
    Ok(Address::new()
        .with_layer(layer)
        .with_tree(tree as u128)?
        .with_type(AddressType::ForsTree)
        .with_keypair(keypair))
}
