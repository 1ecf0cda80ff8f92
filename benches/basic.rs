use std::hint::black_box;
use std::sync::OnceLock;

use criterion::{criterion_group, criterion_main, Criterion};
use rand::Rng;

use socow::{DynVec, SocowVec};

const INLINE: usize = 16;

// One randomized size per run so the comparison is not tuned to a constant.
static LEN: OnceLock<usize> = OnceLock::new();

fn len() -> usize {
    *LEN.get_or_init(|| rand::thread_rng().gen_range(900..1100))
}

fn bench_push(c: &mut Criterion) {
    let n = len();
    let mut group = c.benchmark_group("push");

    group.bench_function("Vec", |b| {
        b.iter(|| {
            let mut vec = Vec::new();
            for i in 0..n {
                vec.push(black_box(i as i64));
            }
            vec
        })
    });

    group.bench_function("DynVec", |b| {
        b.iter(|| {
            let mut vec = DynVec::new();
            for i in 0..n {
                vec.push(black_box(i as i64));
            }
            vec
        })
    });

    group.bench_function("SocowVec", |b| {
        b.iter(|| {
            let mut vec: SocowVec<i64, INLINE> = SocowVec::new();
            for i in 0..n {
                vec.push(black_box(i as i64));
            }
            vec
        })
    });

    group.finish();
}

fn bench_clone(c: &mut Criterion) {
    let n = len();
    let socow: SocowVec<i64, INLINE> = (0..n as i64).collect();
    let vec: Vec<i64> = (0..n as i64).collect();
    let mut group = c.benchmark_group("clone");

    // Aliasing clone: O(1) against Vec's O(n) memcpy.
    group.bench_function("SocowVec", |b| b.iter(|| black_box(socow.clone())));
    group.bench_function("Vec", |b| b.iter(|| black_box(vec.clone())));

    // Clone plus one write: the copy-on-write price tag.
    group.bench_function("SocowVec_then_write", |b| {
        b.iter(|| {
            let mut copy = socow.clone();
            copy[0] = black_box(1);
            copy
        })
    });
    group.bench_function("Vec_then_write", |b| {
        b.iter(|| {
            let mut copy = vec.clone();
            copy[0] = black_box(1);
            copy
        })
    });

    group.finish();
}

criterion_group!(benches, bench_push, bench_clone);
criterion_main!(benches);
