use criterion::{criterion_group, criterion_main, Criterion, BenchmarkId};
use fks::{BuildConf, Complex, PerfectHashTable, Seeded, SeededFunction, Vector};

fn keys(n: i32) -> Vec<Vector> {
    (0..n).map(|i| Vector::new([Complex::from_ints(i, i ^ 0x55), Complex::from_ints(-i, 7)])).collect()
}

pub fn find(c: &mut Criterion) {
    let keys = keys(10_000);
    let polynomial = PerfectHashTable::with_conf(keys.clone(), BuildConf::seeded(1)).unwrap();
    let seeded: PerfectHashTable<Vector, SeededFunction> =
        PerfectHashTable::with_conf(keys.clone(), BuildConf::family_seeded(Seeded::default(), 1)).unwrap();
    let mut group = c.benchmark_group("find");
    for index in [0usize, 5_000, 9_999] {
        let key = &keys[index];
        group.bench_with_input(BenchmarkId::new("polynomial", index), key, |b, key| {
            b.iter(|| polynomial.find(key))
        });
        group.bench_with_input(BenchmarkId::new("seeded", index), key, |b, key| {
            b.iter(|| seeded.find(key))
        });
    }
    group.finish();
}

pub fn build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for n in [100, 10_000] {
        let keys = keys(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &keys, |b, keys| {
            b.iter(|| PerfectHashTable::with_conf(keys.clone(), BuildConf::seeded(2)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(table, find, build);
criterion_main!(table);
