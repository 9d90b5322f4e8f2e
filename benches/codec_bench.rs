use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use parhuff::{Codec, CodecConfig};

fn skewed_input(len: usize) -> Vec<u8> {
    // Roughly geometric: byte k appears about twice as often as byte k + 1.
    (0..len as u32)
        .map(|i| i.wrapping_mul(2_654_435_761).trailing_zeros().min(24) as u8)
        .collect()
}

fn bench_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("compress");
    let input = skewed_input(4 << 20);
    group.throughput(Throughput::Bytes(input.len() as u64));

    for workers in [1, 2, 4, 8] {
        let codec = Codec::new(CodecConfig::new().with_workers(workers));
        group.bench_with_input(BenchmarkId::from_parameter(workers), &input, |b, input| {
            b.iter(|| codec.compress_to_vec(input).unwrap())
        });
    }
    group.finish();
}

fn bench_decompress(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompress");
    let input = skewed_input(4 << 20);
    group.throughput(Throughput::Bytes(input.len() as u64));

    let packed = Codec::new(CodecConfig::new().with_checkpoint_interval(256 << 10))
        .compress_to_vec(&input)
        .unwrap();

    for workers in [1, 2, 4, 8] {
        let codec = Codec::new(CodecConfig::new().with_workers(workers));
        group.bench_with_input(BenchmarkId::from_parameter(workers), &packed, |b, packed| {
            b.iter(|| codec.decompress_to_vec(packed).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compress, bench_decompress);
criterion_main!(benches);
