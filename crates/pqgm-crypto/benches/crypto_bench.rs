//! Signature engine benchmarks.
//!
//! Run with: cargo bench -p pqgm-crypto
//! Add `--features parallel` to measure the rayon tree builder.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pqgm_crypto::sphincs::address::{tree_hash_address, wots_address, Address};
use pqgm_crypto::sphincs::hash::{make_hasher, TweakableHash};
use pqgm_crypto::sphincs::merkle::{self, TreeContext};
use pqgm_crypto::sphincs::params::get_params;
use pqgm_crypto::sphincs::{wots, SphincsKeyPair};
use pqgm_crypto::{CryptoError, SecurityLevel};

// ---------------------------------------------------------------------------
// Tweakable hash benchmarks
// ---------------------------------------------------------------------------

fn bench_thash(c: &mut Criterion) {
    let p = get_params(SecurityLevel::Level1);
    let h = make_hasher(p, &[0x42u8; 16]).unwrap();
    let adrs = wots_address(0, 0, 0).unwrap();

    let mut group = c.benchmark_group("thash");
    for blocks in [1usize, 2, 35] {
        let data = vec![0u8; blocks * p.n];
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("sha256-robust", blocks), &data, |b, data| {
            b.iter(|| h.thash(&adrs, data).unwrap());
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// WOTS+ / Merkle benchmarks
// ---------------------------------------------------------------------------

fn bench_wots(c: &mut Criterion) {
    let p = get_params(SecurityLevel::Level1);
    let h = make_hasher(p, &[0x42u8; 16]).unwrap();
    let sk_seed = [0x24u8; 16];
    let adrs = wots_address(0, 0, 0).unwrap();
    let msg = [0x5au8; 16];

    let mut group = c.benchmark_group("wots");
    group.bench_function("gen_pk", |b| {
        b.iter(|| wots::gen_pk(&*h, p, &sk_seed, &adrs).unwrap());
    });
    let sig = wots::sign(&*h, p, &msg, &sk_seed, &adrs).unwrap();
    group.bench_function("pk_from_sig", |b| {
        b.iter(|| wots::pk_from_sig(&*h, p, &sig, &msg, &adrs).unwrap());
    });
    group.finish();
}

fn bench_merkle(c: &mut Criterion) {
    let p = get_params(SecurityLevel::Level1);
    let h = make_hasher(p, &[0x42u8; 16]).unwrap();
    let leaf = |idx: u32, _: &Address| -> Result<Vec<u8>, CryptoError> {
        Ok((idx as u128).to_be_bytes().to_vec())
    };

    let mut group = c.benchmark_group("merkle");
    for height in [8u32, 12] {
        let ctx = TreeContext::hash_tree(tree_hash_address(0, 0).unwrap(), height);
        group.bench_with_input(BenchmarkId::new("auth_path", height), &ctx, |b, ctx| {
            b.iter(|| merkle::compute_subtree_authentication(&*h, ctx, 3, &leaf).unwrap());
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Full signature benchmarks
// ---------------------------------------------------------------------------

fn bench_sphincs(c: &mut Criterion) {
    let mut group = c.benchmark_group("sphincs");
    group.sample_size(10);

    let level = SecurityLevel::Level1;
    let seed: Vec<u8> = (0u8..48).collect();
    let msg = b"benchmark message";

    group.bench_function(format!("{level}/keygen"), |b| {
        b.iter(|| SphincsKeyPair::from_seed(level, &seed).unwrap());
    });

    let kp = SphincsKeyPair::from_seed(level, &seed).unwrap();
    group.bench_function(format!("{level}/sign"), |b| {
        b.iter(|| kp.sign(msg, None).unwrap());
    });

    let sig = kp.sign(msg, None).unwrap();
    group.bench_function(format!("{level}/verify"), |b| {
        b.iter(|| kp.verify(msg, &sig));
    });

    group.finish();
}

criterion_group!(benches, bench_thash, bench_wots, bench_merkle, bench_sphincs);
criterion_main!(benches);
