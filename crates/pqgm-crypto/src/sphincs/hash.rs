//! SPHINCS+ tweakable hash functions, SHA-256 robust instantiation.
//!
//! Every call is keyed by `(PK.seed, ADRS)`:
//! - thash: `SHA-256(PK.seed || ADRS || (M ^ MGF1(PK.seed || ADRS, |M|)))`, truncated to n
//! - PRF: `SHA-256(key || 0^(64-n) || ADRS)`, truncated to n
//! - PRF_msg: `HMAC-SHA-256(SK.prf, opt_rand || M)`, truncated to n
//! - H_msg: `MGF1(SHA-256(R || PK || M), digest || tree || leaf)`

use hmac::{Hmac, Mac};
use pqgm_types::CryptoError;
use sha2::{Digest, Sha256};

use super::address::{Address, ADDRESS_BYTES};
use super::params::SphincsParams;

const SHA256_BLOCK_BYTES: usize = 64;
const SHA256_OUTPUT_BYTES: usize = 32;

/// Output of H_msg: the FORS message plus the hypertree position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDigest {
    pub digest: Vec<u8>,
    pub tree_idx: u64,
    pub leaf_idx: u32,
}

/// Hash function interface for the signature engine.
pub trait TweakableHash: Send + Sync {
    /// F(PK.seed, ADRS, M) -> n bytes, M is one n-byte block
    fn f(&self, adrs: &Address, msg: &[u8]) -> Result<Vec<u8>, CryptoError>;
    /// H(PK.seed, ADRS, L || R) -> n bytes
    fn h(&self, adrs: &Address, left: &[u8], right: &[u8]) -> Result<Vec<u8>, CryptoError>;
    /// T_k(PK.seed, ADRS, M) -> n bytes, M is k concatenated n-byte blocks
    fn thash(&self, adrs: &Address, blocks: &[u8]) -> Result<Vec<u8>, CryptoError>;
    /// PRF(key, ADRS) -> n bytes
    fn prf(&self, key: &[u8], adrs: &Address) -> Result<Vec<u8>, CryptoError>;
    /// PRF_msg(SK.prf, opt_rand, M) -> n bytes
    fn prf_msg(&self, sk_prf: &[u8], opt_rand: &[u8], msg: &[u8]) -> Result<Vec<u8>, CryptoError>;
    /// H_msg(R, PK, M) -> (digest, tree, leaf)
    fn h_msg(&self, r: &[u8], pk: &[u8], msg: &[u8]) -> Result<MessageDigest, CryptoError>;
    /// Security parameter n
    fn n(&self) -> usize;
}

fn sha256(inputs: &[&[u8]]) -> [u8; SHA256_OUTPUT_BYTES] {
    let mut h = Sha256::new();
    for input in inputs {
        h.update(input);
    }
    h.finalize().into()
}

/// MGF1-SHA-256 (PKCS#1 B.2.1).
pub(crate) fn mgf1_sha256(seed: &[u8], mask_len: usize) -> Vec<u8> {
    let mut result = Vec::with_capacity(mask_len);
    let mut counter: u32 = 0;
    while result.len() < mask_len {
        let block = sha256(&[seed, &counter.to_be_bytes()]);
        let take = (mask_len - result.len()).min(SHA256_OUTPUT_BYTES);
        result.extend_from_slice(&block[..take]);
        counter += 1;
    }
    result
}

fn check_len(data: &[u8], expected: usize) -> Result<(), CryptoError> {
    if data.len() != expected {
        return Err(CryptoError::InvalidInputLength {
            expected,
            got: data.len(),
        });
    }
    Ok(())
}

/// Big-endian integer of `bytes`, masked to its low `bits` bits.
fn to_int_mod(bytes: &[u8], bits: usize) -> u64 {
    let mut ret: u64 = 0;
    for &byte in bytes {
        ret = (ret << 8) | byte as u64;
    }
    if bits < 64 {
        ret & ((1u64 << bits) - 1)
    } else {
        ret
    }
}

/// SHA-256 tweakable hash bound to one public seed.
pub struct Sha256Robust {
    params: SphincsParams,
    pub_seed: Vec<u8>,
}

impl Sha256Robust {
    pub fn new(params: &SphincsParams, pub_seed: &[u8]) -> Result<Self, CryptoError> {
        params.validate()?;
        if pub_seed.len() != params.n {
            return Err(CryptoError::InvalidLength {
                expected: params.n,
                got: pub_seed.len(),
            });
        }
        Ok(Self {
            params: *params,
            pub_seed: pub_seed.to_vec(),
        })
    }

    fn masked_hash(&self, adrs: &Address, data: &[u8]) -> Vec<u8> {
        let adrs_bytes = adrs.encode();
        let mut mask_seed = Vec::with_capacity(self.params.n + ADDRESS_BYTES);
        mask_seed.extend_from_slice(&self.pub_seed);
        mask_seed.extend_from_slice(&adrs_bytes);

        let mut masked = mgf1_sha256(&mask_seed, data.len());
        for (m, d) in masked.iter_mut().zip(data) {
            *m ^= d;
        }
        sha256(&[&mask_seed, &masked])[..self.params.n].to_vec()
    }
}

impl TweakableHash for Sha256Robust {
    fn f(&self, adrs: &Address, msg: &[u8]) -> Result<Vec<u8>, CryptoError> {
        check_len(msg, self.params.n)?;
        Ok(self.masked_hash(adrs, msg))
    }

    fn h(&self, adrs: &Address, left: &[u8], right: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let n = self.params.n;
        check_len(left, n)?;
        check_len(right, n)?;
        let mut combined = Vec::with_capacity(2 * n);
        combined.extend_from_slice(left);
        combined.extend_from_slice(right);
        Ok(self.masked_hash(adrs, &combined))
    }

    fn thash(&self, adrs: &Address, blocks: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let n = self.params.n;
        if blocks.is_empty() || blocks.len() % n != 0 {
            return Err(CryptoError::InvalidInputLength {
                expected: blocks.len().div_ceil(n).max(1) * n,
                got: blocks.len(),
            });
        }
        Ok(self.masked_hash(adrs, blocks))
    }

    fn prf(&self, key: &[u8], adrs: &Address) -> Result<Vec<u8>, CryptoError> {
        let n = self.params.n;
        check_len(key, n)?;
        let mut block = [0u8; SHA256_BLOCK_BYTES + ADDRESS_BYTES];
        block[..n].copy_from_slice(key);
        block[SHA256_BLOCK_BYTES..].copy_from_slice(&adrs.encode());
        Ok(sha256(&[&block])[..n].to_vec())
    }

    fn prf_msg(&self, sk_prf: &[u8], opt_rand: &[u8], msg: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let n = self.params.n;
        check_len(sk_prf, n)?;
        check_len(opt_rand, n)?;
        let mut mac = Hmac::<Sha256>::new_from_slice(sk_prf).map_err(|_| {
            CryptoError::InvalidInputLength {
                expected: n,
                got: sk_prf.len(),
            }
        })?;
        mac.update(opt_rand);
        mac.update(msg);
        let out = mac.finalize().into_bytes();
        Ok(out[..n].to_vec())
    }

    fn h_msg(&self, r: &[u8], pk: &[u8], msg: &[u8]) -> Result<MessageDigest, CryptoError> {
        let p = &self.params;
        check_len(r, p.n)?;

        let tree_bits = p.tree_bits();
        let leaf_bits = p.tree_height;
        let tree_bytes = tree_bits.div_ceil(8);
        let leaf_bytes = leaf_bits.div_ceil(8);
        let digest_bytes = p.fors_msg_bytes();

        let seed = sha256(&[r, pk, msg]);
        let buf = mgf1_sha256(&seed, digest_bytes + tree_bytes + leaf_bytes);

        let (digest, rest) = buf.split_at(digest_bytes);
        let (tree_part, leaf_part) = rest.split_at(tree_bytes);
        Ok(MessageDigest {
            digest: digest.to_vec(),
            tree_idx: to_int_mod(tree_part, tree_bits),
            leaf_idx: to_int_mod(leaf_part, leaf_bits) as u32,
        })
    }

    fn n(&self) -> usize {
        self.params.n
    }
}

/// Create the hasher for a parameter set and public seed.
pub fn make_hasher(
    params: &SphincsParams,
    pub_seed: &[u8],
) -> Result<Box<dyn TweakableHash>, CryptoError> {
    Ok(Box::new(Sha256Robust::new(params, pub_seed)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sphincs::params::get_params;
    use pqgm_types::SecurityLevel;

    fn level1(pub_seed: &[u8]) -> Sha256Robust {
        Sha256Robust::new(get_params(SecurityLevel::Level1), pub_seed).unwrap()
    }

    fn raw_address(bytes: impl Iterator<Item = u8>) -> Address {
        let bytes: Vec<u8> = bytes.collect();
        Address::decode(&bytes).unwrap()
    }

    #[test]
    fn test_f_vector() {
        let h = level1(&hex::decode("00112233445566778899aabbccddeeff").unwrap());
        let adrs = raw_address(0u8..32);
        let out = h.f(&adrs, &[0x0f; 16]).unwrap();
        assert_eq!(hex::encode(out), "143e7bc0fde18a2326d561d908cbfc22");
    }

    #[test]
    fn test_h_vector() {
        let h = level1(&hex::decode("ffeeddccbbaa99887766554433221100").unwrap());
        let adrs = raw_address((0u8..32).rev());
        let out = h.h(&adrs, &[0xaa; 16], &[0x55; 16]).unwrap();
        assert_eq!(hex::encode(out), "6407343e353e63245ac1d4c3469d728b");
    }

    #[test]
    fn test_prf_vectors() {
        let h = level1(&[0u8; 16]);
        let key = hex::decode("112233445566778899aabbccddeeff00").unwrap();
        let adrs = raw_address(std::iter::repeat(0x42).take(32));
        assert_eq!(
            hex::encode(h.prf(&key, &adrs).unwrap()),
            "cf0602c9fd3213660ab00203507b7fc6"
        );

        let opt_rand = hex::decode("00ff".repeat(8)).unwrap();
        assert_eq!(
            hex::encode(h.prf_msg(&key, &opt_rand, b"stage1-prf").unwrap()),
            "15649d176dcbca352c8650e3a2166f4b"
        );
    }

    #[test]
    fn test_h_msg_vector() {
        let h = level1(&[0u8; 16]);
        let r = hex::decode("aabbccddeeff00112233445566778899").unwrap();
        let pk = hex::decode("0123456789abcdef0123456789abcdef").unwrap();
        let md = h.h_msg(&r, &pk, b"SPHINCS+ Stage1").unwrap();
        let expected = concat!(
            "363d65a47dc4384064cf58a35e33c8ecae82d4e9bc2c5c2bf609c04dfc8a08f9",
            "ef756dc40c0f28e8cb7112d30eb14ee1260f0cdf040e250713f2d11003b97f57",
            "9f3f5cf1f4d95d3ee613dd8b9688d82251184781eb6fe49704278d3173cd0621e",
            "971b3edc2d736a1c1c73bb3d7b6558af721df9f37188cceba06d7e068f2ab616d",
            "e3d3a3c8040c7270908041dba7da7cedac3c1cfed6f77b",
        );
        assert_eq!(hex::encode(&md.digest), expected);
        assert_eq!(md.tree_idx, 0x0D41_0EB9_1FA4_B7);
        assert_eq!(md.leaf_idx, 0xA3);
    }

    #[test]
    fn test_thash_multi_vector() {
        let h = level1(&hex::decode("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff").unwrap());
        let mut blocks = vec![1u8; 16];
        blocks.extend_from_slice(&[2u8; 16]);
        blocks.extend_from_slice(&[3u8; 16]);
        let out = h.thash(&Address::new(), &blocks).unwrap();
        assert_eq!(hex::encode(out), "91c1a273d683b06952d773dce1390ccd");
    }

    #[test]
    fn test_single_block_thash_matches_f() {
        let h = level1(&[7u8; 16]);
        let adrs = Address::new().with_layer(3).with_hash(9);
        assert_eq!(h.thash(&adrs, &[5u8; 16]).unwrap(), h.f(&adrs, &[5u8; 16]).unwrap());
    }

    #[test]
    fn test_address_separates_domains() {
        let h = level1(&[7u8; 16]);
        let a = Address::new().with_chain(1);
        let b = Address::new().with_chain(2);
        assert_ne!(h.f(&a, &[0u8; 16]).unwrap(), h.f(&b, &[0u8; 16]).unwrap());
    }

    #[test]
    fn test_length_errors() {
        let h = level1(&[0u8; 16]);
        let adrs = Address::new();
        assert_eq!(
            h.f(&adrs, &[0u8; 15]),
            Err(CryptoError::InvalidInputLength {
                expected: 16,
                got: 15
            })
        );
        assert!(h.h(&adrs, &[0u8; 16], &[0u8; 17]).is_err());
        assert!(h.thash(&adrs, &[]).is_err());
        assert!(h.thash(&adrs, &[0u8; 40]).is_err());
        assert!(h.prf(&[0u8; 8], &adrs).is_err());
        assert!(matches!(
            Sha256Robust::new(get_params(SecurityLevel::Level1), &[0u8; 32]),
            Err(CryptoError::InvalidLength { .. })
        ));
    }

    #[test]
    fn test_new_rejects_invalid_params() {
        let p = SphincsParams {
            n: 40,
            len_1: 80,
            len: 83,
            ..*get_params(SecurityLevel::Level1)
        };
        assert!(matches!(
            Sha256Robust::new(&p, &[0u8; 40]),
            Err(CryptoError::UnsupportedParameter(_))
        ));
        assert!(matches!(
            make_hasher(&p, &[0u8; 40]),
            Err(CryptoError::UnsupportedParameter(_))
        ));
    }

    #[test]
    fn test_mgf1_prefix_stable() {
        let long = mgf1_sha256(b"seed", 100);
        let short = mgf1_sha256(b"seed", 40);
        assert_eq!(long.len(), 100);
        assert_eq!(&long[..40], &short[..]);
        assert!(mgf1_sha256(b"seed", 0).is_empty());
    }
}
