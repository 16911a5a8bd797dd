//! SPHINCS+ stateless hash-based signatures, SHA-256 robust golden model.
//!
//! A message is randomized with PRF_msg, hashed by H_msg into a FORS message
//! and a hypertree position, signed by FORS, and the FORS public key is then
//! signed through d layers of WOTS+ / Merkle trees up to the public root.
//!
//! Parameter sets: SHA-256 "s" variants for security levels 1, 3 and 5.

pub mod address;
pub mod fors;
pub mod hash;
pub mod hypertree;
pub mod merkle;
pub mod params;
pub mod wots;

use pqgm_types::{CryptoError, SecurityLevel};
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use address::fors_tree_address;
use hash::make_hasher;
use params::{get_params, SphincsParams};

fn check_len(what: &[u8], expected: usize) -> Result<(), CryptoError> {
    if what.len() != expected {
        return Err(CryptoError::InvalidLength {
            expected,
            got: what.len(),
        });
    }
    Ok(())
}

/// Public key: PK.seed || PK.root (2*n bytes)
#[derive(Clone, PartialEq, Eq)]
pub struct SphincsPublicKey {
    level: SecurityLevel,
    seed: Vec<u8>,
    root: Vec<u8>,
}

impl std::fmt::Debug for SphincsPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SphincsPublicKey")
            .field("level", &self.level)
            .field("root", &hex_prefix(&self.root))
            .finish()
    }
}

fn hex_prefix(bytes: &[u8]) -> String {
    bytes.iter().take(4).map(|b| format!("{b:02x}")).collect()
}

impl SphincsPublicKey {
    pub fn from_bytes(level: SecurityLevel, bytes: &[u8]) -> Result<Self, CryptoError> {
        let p = get_params(level);
        check_len(bytes, p.pk_bytes())?;
        let (seed, root) = bytes.split_at(p.n);
        Ok(Self {
            level,
            seed: seed.to_vec(),
            root: root.to_vec(),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.seed.len() + self.root.len());
        out.extend_from_slice(&self.seed);
        out.extend_from_slice(&self.root);
        out
    }

    pub fn level(&self) -> SecurityLevel {
        self.level
    }

    pub fn seed(&self) -> &[u8] {
        &self.seed
    }

    pub fn root(&self) -> &[u8] {
        &self.root
    }

    /// Verify a signature. Any malformed input yields `false`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        debug!(level = %self.level, msg_len = message.len(), "sphincs verify");
        let p = get_params(self.level);
        match verify_with_params(p, &self.seed, &self.root, message, signature) {
            Ok(valid) => {
                if !valid {
                    debug!("signature rejected: root mismatch");
                }
                valid
            }
            Err(e) => {
                debug!(error = %e, "signature rejected");
                false
            }
        }
    }
}

/// Secret key: SK.seed || SK.prf || PK.seed || PK.root (4*n bytes)
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SphincsSecretKey {
    sk_seed: Vec<u8>,
    sk_prf: Vec<u8>,
    pub_seed: Vec<u8>,
    pub_root: Vec<u8>,
    #[zeroize(skip)]
    level: SecurityLevel,
}

impl std::fmt::Debug for SphincsSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SphincsSecretKey")
            .field("level", &self.level)
            .finish()
    }
}

impl SphincsSecretKey {
    pub fn from_bytes(level: SecurityLevel, bytes: &[u8]) -> Result<Self, CryptoError> {
        let p = get_params(level);
        check_len(bytes, p.sk_bytes())?;
        let n = p.n;
        Ok(Self {
            sk_seed: bytes[..n].to_vec(),
            sk_prf: bytes[n..2 * n].to_vec(),
            pub_seed: bytes[2 * n..3 * n].to_vec(),
            pub_root: bytes[3 * n..].to_vec(),
            level,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 * self.sk_seed.len());
        out.extend_from_slice(&self.sk_seed);
        out.extend_from_slice(&self.sk_prf);
        out.extend_from_slice(&self.pub_seed);
        out.extend_from_slice(&self.pub_root);
        out
    }

    pub fn level(&self) -> SecurityLevel {
        self.level
    }

    pub fn public_key(&self) -> SphincsPublicKey {
        SphincsPublicKey {
            level: self.level,
            seed: self.pub_seed.clone(),
            root: self.pub_root.clone(),
        }
    }

    /// Sign a message. `opt_rand` defaults to n zero bytes, which makes the
    /// signature deterministic.
    pub fn sign(&self, message: &[u8], opt_rand: Option<&[u8]>) -> Result<Vec<u8>, CryptoError> {
        debug!(level = %self.level, msg_len = message.len(), "sphincs sign");
        let p = get_params(self.level);
        sign_with_params(p, self, message, opt_rand)
    }

    /// Sign with fresh randomness from the OS.
    pub fn sign_randomized(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut opt_rand = vec![0u8; get_params(self.level).n];
        getrandom::getrandom(&mut opt_rand).map_err(|_| CryptoError::RandGenFail)?;
        self.sign(message, Some(&opt_rand))
    }
}

/// SPHINCS+ key pair for digital signatures.
#[derive(Clone, Debug)]
pub struct SphincsKeyPair {
    public_key: SphincsPublicKey,
    secret_key: SphincsSecretKey,
}

impl SphincsKeyPair {
    /// Generate a new key pair from OS randomness.
    pub fn generate(level: SecurityLevel) -> Result<Self, CryptoError> {
        let mut seed = vec![0u8; 3 * get_params(level).n];
        getrandom::getrandom(&mut seed).map_err(|_| CryptoError::RandGenFail)?;
        let kp = Self::from_seed(level, &seed);
        seed.zeroize();
        kp
    }

    /// Deterministic key generation from `SK.seed || SK.prf || PK.seed` (3*n bytes).
    pub fn from_seed(level: SecurityLevel, seed: &[u8]) -> Result<Self, CryptoError> {
        debug!(level = %level, "sphincs keygen");
        let p = get_params(level);
        check_len(seed, 3 * p.n)?;
        let n = p.n;
        let (sk_seed, rest) = seed.split_at(n);
        let (sk_prf, pub_seed) = rest.split_at(n);

        let pub_root = derive_root(p, sk_seed, pub_seed)?;

        let secret_key = SphincsSecretKey {
            sk_seed: sk_seed.to_vec(),
            sk_prf: sk_prf.to_vec(),
            pub_seed: pub_seed.to_vec(),
            pub_root,
            level,
        };
        Ok(Self {
            public_key: secret_key.public_key(),
            secret_key,
        })
    }

    pub fn public_key(&self) -> &SphincsPublicKey {
        &self.public_key
    }

    pub fn secret_key(&self) -> &SphincsSecretKey {
        &self.secret_key
    }

    pub fn into_parts(self) -> (SphincsPublicKey, SphincsSecretKey) {
        let Self {
            public_key,
            secret_key,
        } = self;
        (public_key, secret_key)
    }

    pub fn sign(&self, message: &[u8], opt_rand: Option<&[u8]>) -> Result<Vec<u8>, CryptoError> {
        self.secret_key.sign(message, opt_rand)
    }

    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        self.public_key.verify(message, signature)
    }
}

/// KeyGen from an optional 3*n-byte seed; random when absent.
pub fn keygen(
    level: SecurityLevel,
    seed: Option<&[u8]>,
) -> Result<(SphincsPublicKey, SphincsSecretKey), CryptoError> {
    let kp = match seed {
        Some(seed) => SphincsKeyPair::from_seed(level, seed)?,
        None => SphincsKeyPair::generate(level)?,
    };
    Ok(kp.into_parts())
}

pub fn sign(
    sk: &SphincsSecretKey,
    message: &[u8],
    opt_rand: Option<&[u8]>,
) -> Result<Vec<u8>, CryptoError> {
    sk.sign(message, opt_rand)
}

pub fn verify(pk: &SphincsPublicKey, message: &[u8], signature: &[u8]) -> bool {
    pk.verify(message, signature)
}

fn derive_root(
    p: &SphincsParams,
    sk_seed: &[u8],
    pub_seed: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let hasher = make_hasher(p, pub_seed)?;
    hypertree::public_root(&*hasher, p, sk_seed)
}

fn sign_with_params(
    p: &SphincsParams,
    sk: &SphincsSecretKey,
    message: &[u8],
    opt_rand: Option<&[u8]>,
) -> Result<Vec<u8>, CryptoError> {
    let n = p.n;
    check_len(&sk.sk_seed, n)?;
    check_len(&sk.pub_root, n)?;
    let hasher = make_hasher(p, &sk.pub_seed)?;

    let zero_rand = vec![0u8; n];
    let opt_rand = opt_rand.unwrap_or(&zero_rand);
    check_len(opt_rand, n)?;

    // R = PRF_msg(SK.prf, opt_rand, M)
    let r = hasher.prf_msg(&sk.sk_prf, opt_rand, message)?;

    let mut pk = Vec::with_capacity(p.pk_bytes());
    pk.extend_from_slice(&sk.pub_seed);
    pk.extend_from_slice(&sk.pub_root);
    let md = hasher.h_msg(&r, &pk, message)?;
    debug!(tree = md.tree_idx, leaf = md.leaf_idx, "hypertree position");

    let fors_adrs = fors_tree_address(0, md.tree_idx, md.leaf_idx)?;
    let (fors_sig, fors_pk) = fors::fors_sign(&*hasher, p, &md.digest, &sk.sk_seed, &fors_adrs)?;

    let ht_sig = hypertree::hypertree_sign(
        &*hasher,
        p,
        &sk.sk_seed,
        &fors_pk,
        md.tree_idx,
        md.leaf_idx,
    )?;

    // Assemble: R || FORS_SIG || HT_SIG
    let mut sig = Vec::with_capacity(p.sig_bytes());
    sig.extend_from_slice(&r);
    sig.extend_from_slice(&fors_sig);
    sig.extend_from_slice(&ht_sig);
    Ok(sig)
}

fn verify_with_params(
    p: &SphincsParams,
    pub_seed: &[u8],
    pub_root: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<bool, CryptoError> {
    let n = p.n;
    check_len(signature, p.sig_bytes())?;
    check_len(pub_root, n)?;
    let hasher = make_hasher(p, pub_seed)?;

    let (r, rest) = signature.split_at(n);
    let (fors_sig, ht_sig) = rest.split_at(p.fors_sig_bytes());

    let mut pk = Vec::with_capacity(p.pk_bytes());
    pk.extend_from_slice(pub_seed);
    pk.extend_from_slice(pub_root);
    let md = hasher.h_msg(r, &pk, message)?;

    let fors_adrs = fors_tree_address(0, md.tree_idx, md.leaf_idx)?;
    let fors_pk = fors::fors_pk_from_sig(&*hasher, p, fors_sig, &md.digest, &fors_adrs)?;

    hypertree::hypertree_verify(
        &*hasher,
        p,
        &fors_pk,
        ht_sig,
        md.tree_idx,
        md.leaf_idx,
        pub_root,
    )
}
