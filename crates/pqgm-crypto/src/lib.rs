#![doc = "Hash-based signature golden model for hardware accelerator validation."]
#![forbid(unsafe_code)]

// Post-quantum algorithms
#[cfg(feature = "sphincs")]
pub mod sphincs;

pub use pqgm_types::{CryptoError, SecurityLevel};
