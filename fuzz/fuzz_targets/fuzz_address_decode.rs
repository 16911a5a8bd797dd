#![no_main]
use libfuzzer_sys::fuzz_target;
use pqgm_crypto::sphincs::address::Address;

fuzz_target!(|data: &[u8]| {
    if let Ok(addr) = Address::decode(data) {
        assert_eq!(addr.encode().as_slice(), data);
    }
});
