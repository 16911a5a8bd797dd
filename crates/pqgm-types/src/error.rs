/// Cryptographic operation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    // Buffer errors
    #[error("invalid length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },
    #[error("invalid hash input length: expected {expected}, got {got}")]
    InvalidInputLength { expected: usize, got: usize },

    // Address errors
    #[error("address field {field} out of range: {value:#x}")]
    InvalidAddressField { field: &'static str, value: u128 },

    // WOTS+ errors
    #[error("chain range out of bounds: start {start} + steps {steps} > {max}")]
    InvalidChainRange { start: u32, steps: u32, max: u32 },
    #[error("invalid base-w encoding: unused bits must be zero")]
    InvalidEncoding,

    // Merkle tree errors
    #[error("index {index} out of range (limit {limit})")]
    IndexOutOfRange { index: u64, limit: u64 },
    #[error("invalid authentication path length: expected {expected}, got {got}")]
    InvalidPathLength { expected: usize, got: usize },

    // Parameter errors
    #[error("unsupported parameter: {0}")]
    UnsupportedParameter(&'static str),

    // Randomness
    #[error("random generation failed")]
    RandGenFail,
}
