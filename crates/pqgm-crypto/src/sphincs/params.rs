//! SPHINCS+ SHA-256 "s" parameter sets.

use pqgm_types::{CryptoError, SecurityLevel};

/// Immutable parameter set for one security level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SphincsParams {
    pub n: usize,           // Security parameter (hash output length in bytes)
    pub full_height: usize, // Total hypertree height
    pub d: usize,           // Number of hypertree layers
    pub tree_height: usize, // Per-layer tree height (full_height / d)
    pub w: u32,             // Winternitz parameter
    pub log_w: u32,         // log2(w)
    pub len_1: usize,       // Message chains
    pub len_2: usize,       // Checksum chains
    pub len: usize,         // len_1 + len_2
    pub fors_height: usize, // FORS tree height
    pub fors_trees: usize,  // Number of FORS trees
}

static PARAMS: [SphincsParams; 3] = [
    // sha256-128s
    SphincsParams {
        n: 16,
        full_height: 64,
        d: 8,
        tree_height: 8,
        w: 16,
        log_w: 4,
        len_1: 32,
        len_2: 3,
        len: 35,
        fors_height: 15,
        fors_trees: 10,
    },
    // sha256-192s
    SphincsParams {
        n: 24,
        full_height: 64,
        d: 8,
        tree_height: 8,
        w: 16,
        log_w: 4,
        len_1: 48,
        len_2: 3,
        len: 51,
        fors_height: 16,
        fors_trees: 14,
    },
    // sha256-256s
    SphincsParams {
        n: 32,
        full_height: 64,
        d: 8,
        tree_height: 8,
        w: 16,
        log_w: 4,
        len_1: 64,
        len_2: 3,
        len: 67,
        fors_height: 14,
        fors_trees: 22,
    },
];

pub fn get_params(level: SecurityLevel) -> &'static SphincsParams {
    let idx = match level {
        SecurityLevel::Level1 => 0,
        SecurityLevel::Level3 => 1,
        SecurityLevel::Level5 => 2,
    };
    &PARAMS[idx]
}

impl SphincsParams {
    /// Check the internal consistency of a (possibly hand-built) parameter set.
    pub fn validate(&self) -> Result<(), CryptoError> {
        self.checked_log_w()?;
        if self.n == 0 || self.n > 32 {
            return Err(CryptoError::UnsupportedParameter("n must be in 1..=32"));
        }
        if self.d == 0 || self.tree_height * self.d != self.full_height {
            return Err(CryptoError::UnsupportedParameter(
                "full_height must equal d * tree_height",
            ));
        }
        if self.tree_height == 0 || self.tree_height > 30 {
            return Err(CryptoError::UnsupportedParameter("tree_height must be in 1..=30"));
        }
        if self.full_height - self.tree_height > 64 {
            return Err(CryptoError::UnsupportedParameter("tree index wider than 64 bits"));
        }
        if self.fors_height == 0 || self.fors_height > 30 || self.fors_trees == 0 {
            return Err(CryptoError::UnsupportedParameter("invalid FORS dimensions"));
        }
        if self.len_1 != self.expected_len_1() {
            return Err(CryptoError::UnsupportedParameter("len_1 must equal ceil(8n / log_w)"));
        }
        if self.len_2 != self.expected_len_2() {
            return Err(CryptoError::UnsupportedParameter(
                "len_2 must equal floor(log2(len_1 * (w - 1)) / log_w) + 1",
            ));
        }
        if self.len != self.len_1 + self.len_2 {
            return Err(CryptoError::UnsupportedParameter("len must equal len_1 + len_2"));
        }
        Ok(())
    }

    /// Message chains for an n-byte message: ceil(8n / log_w).
    fn expected_len_1(&self) -> usize {
        (8 * self.n).div_ceil(self.log_w as usize)
    }

    /// Checksum chains: floor(log2(len_1 * (w - 1)) / log_w) + 1.
    fn expected_len_2(&self) -> usize {
        let max_csum = (self.len_1 as u64).saturating_mul((self.w - 1) as u64);
        if max_csum == 0 {
            return 1;
        }
        let log2 = 63 - max_csum.leading_zeros() as usize;
        log2 / self.log_w as usize + 1
    }

    /// log2(w), rejecting anything that is not a power of two in [2, 256].
    pub fn checked_log_w(&self) -> Result<u32, CryptoError> {
        if self.w < 2 || self.w > 256 || !self.w.is_power_of_two() {
            return Err(CryptoError::UnsupportedParameter(
                "w must be a power of two in [2, 256]",
            ));
        }
        let log_w = self.w.trailing_zeros();
        if log_w != self.log_w {
            return Err(CryptoError::UnsupportedParameter("log_w does not match w"));
        }
        Ok(log_w)
    }

    pub fn pk_bytes(&self) -> usize {
        2 * self.n
    }

    pub fn sk_bytes(&self) -> usize {
        4 * self.n
    }

    pub fn wots_sig_bytes(&self) -> usize {
        self.len * self.n
    }

    pub fn fors_sig_bytes(&self) -> usize {
        self.fors_trees * (1 + self.fors_height) * self.n
    }

    /// One hypertree layer: WOTS+ signature followed by its authentication path.
    pub fn layer_sig_bytes(&self) -> usize {
        (self.len + self.tree_height) * self.n
    }

    pub fn sig_bytes(&self) -> usize {
        self.n + self.fors_sig_bytes() + self.d * self.layer_sig_bytes()
    }

    /// Number of tree-index bits carried by H_msg.
    pub fn tree_bits(&self) -> usize {
        self.full_height - self.tree_height
    }

    /// Length of the FORS part of the H_msg output.
    ///
    /// The FORS bit count rounded up to a multiple of eight, used as a byte
    /// count. Longer than the index stream needs; the known-answer vectors
    /// depend on it.
    pub fn fors_msg_bytes(&self) -> usize {
        (self.fors_height * self.fors_trees + 7) & !7
    }

    /// Minimum message length FORS needs to extract all indices.
    pub fn fors_index_bytes(&self) -> usize {
        (self.fors_height * self.fors_trees).div_ceil(8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_are_consistent() {
        for level in SecurityLevel::ALL {
            let p = get_params(level);
            p.validate().unwrap();
            assert_eq!(p.len_1, 2 * p.n);
            assert_eq!(p.tree_height, p.full_height / p.d);
        }
    }

    #[test]
    fn test_signature_sizes() {
        let cases = [
            (SecurityLevel::Level1, 16, 8080),
            (SecurityLevel::Level3, 24, 17064),
            (SecurityLevel::Level5, 32, 29792),
        ];
        for (level, n, sig_bytes) in cases {
            let p = get_params(level);
            assert_eq!(p.n, n);
            assert_eq!(p.pk_bytes(), 2 * n);
            assert_eq!(p.sk_bytes(), 4 * n);
            assert_eq!(p.sig_bytes(), sig_bytes);
        }
    }

    #[test]
    fn test_fors_msg_bytes() {
        assert_eq!(get_params(SecurityLevel::Level1).fors_msg_bytes(), 152);
        assert_eq!(get_params(SecurityLevel::Level1).fors_index_bytes(), 19);
        assert_eq!(get_params(SecurityLevel::Level5).fors_msg_bytes(), 312);
    }

    #[test]
    fn test_rejects_non_power_of_two_w() {
        let p = SphincsParams {
            w: 10,
            ..*get_params(SecurityLevel::Level1)
        };
        assert!(matches!(
            p.validate(),
            Err(CryptoError::UnsupportedParameter(_))
        ));

        let p = SphincsParams {
            w: 4,
            log_w: 2,
            ..*get_params(SecurityLevel::Level1)
        };
        assert_eq!(p.checked_log_w(), Ok(2));
    }

    #[test]
    fn test_rejects_inconsistent_chain_counts() {
        let base = *get_params(SecurityLevel::Level1);

        let p = SphincsParams {
            len_2: 17,
            len: 49,
            ..base
        };
        assert!(matches!(
            p.validate(),
            Err(CryptoError::UnsupportedParameter(_))
        ));

        let p = SphincsParams {
            len_1: 31,
            len: 34,
            ..base
        };
        assert!(matches!(
            p.validate(),
            Err(CryptoError::UnsupportedParameter(_))
        ));

        // w = 4: len_1 = 64, len_2 = floor(log2(192) / 2) + 1 = 4
        let p = SphincsParams {
            w: 4,
            log_w: 2,
            len_1: 64,
            len_2: 4,
            len: 68,
            ..base
        };
        p.validate().unwrap();
    }

    #[test]
    fn test_rejects_oversized_n() {
        let p = SphincsParams {
            n: 40,
            len_1: 80,
            len: 83,
            ..*get_params(SecurityLevel::Level1)
        };
        assert!(matches!(
            p.validate(),
            Err(CryptoError::UnsupportedParameter(_))
        ));
    }
}
