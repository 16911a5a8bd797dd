#![no_main]
use libfuzzer_sys::fuzz_target;
use pqgm_crypto::sphincs::SphincsPublicKey;
use pqgm_crypto::SecurityLevel;

// Level-1 key from seed 0..48
const PK: [u8; 32] = [
    0x20, 0x21, 0x22, 0x23, 0x24, 0x25, 0x26, 0x27, 0x28, 0x29, 0x2a, 0x2b, 0x2c, 0x2d, 0x2e, 0x2f,
    0x38, 0x84, 0x14, 0x50, 0x6a, 0x8b, 0x15, 0x9b, 0x1d, 0xbd, 0xd0, 0x5b, 0x7a, 0x76, 0x20, 0xe3,
];

fuzz_target!(|data: &[u8]| {
    let Ok(pk) = SphincsPublicKey::from_bytes(SecurityLevel::Level1, &PK) else {
        return;
    };
    let split = data.len().min(32);
    let (msg, sig) = data.split_at(split);
    // Arbitrary input must never be accepted or panic
    assert!(!pk.verify(msg, sig));
});
