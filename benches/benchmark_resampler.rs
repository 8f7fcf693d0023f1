use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand_aes::tls::rand_f32;
use srconv::{NonIntegerResampler, ResamplingMode};

struct BenchmarkConfig {
    mode: ResamplingMode,
    description: &'static str,
}

fn generate_white_noise(size: usize) -> Vec<f32> {
    (0..size).map(|_| rand_f32() * 2.0 - 1.0).collect()
}

fn bench_process_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("non_integer_resampler");

    let configs = vec![
        BenchmarkConfig {
            mode: ResamplingMode::Linear,
            description: "linear 44.1kHz↔48kHz",
        },
        BenchmarkConfig {
            mode: ResamplingMode::Cubic,
            description: "cubic 44.1kHz↔48kHz",
        },
        BenchmarkConfig {
            mode: ResamplingMode::Lanczos,
            description: "lanczos 44.1kHz↔48kHz",
        },
    ];

    for bench_config in &configs {
        const BLOCK_SIZE: usize = 512;

        let bytes_per_iteration = 2 * BLOCK_SIZE * size_of::<f32>();
        group.throughput(Throughput::Bytes(bytes_per_iteration as u64));

        group.bench_with_input(
            BenchmarkId::new("process_block", bench_config.description),
            bench_config,
            |b, bench_config| {
                let mut resampler =
                    NonIntegerResampler::new(48000.0, bench_config.mode).unwrap();
                resampler.reset(44100.0, BLOCK_SIZE).unwrap();

                let left = generate_white_noise(BLOCK_SIZE);
                let right = generate_white_noise(BLOCK_SIZE);
                let mut out_left = vec![0.0f32; BLOCK_SIZE];
                let mut out_right = vec![0.0f32; BLOCK_SIZE];

                b.iter(|| {
                    resampler
                        .process_block(
                            [black_box(&left), black_box(&right)],
                            [&mut out_left, &mut out_right],
                            |left, right| {
                                black_box((&left, &right));
                            },
                        )
                        .unwrap();
                    black_box((&out_left, &out_right));
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_process_block);
criterion_main!(benches);
