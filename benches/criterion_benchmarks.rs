use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use hmqc::compress::{self, CompressOptions};
use hmqc::fec;
use hmqc::io::{ContainerOptions, from_bytes, to_bytes};
use hmqc::matrix::raster::{Locator, ModuleRasterizer, Rasterizer};
use hmqc::matrix::{self, ModuleDepth};
use hmqc::pipeline::{self, DecodeOptions, EncodeOptions, NoProgress};
use hmqc::ContentType;
use std::fs;
use std::path::Path;

fn gen_data(size: usize, seed: u64) -> Vec<u8> {
    let mut s = seed;
    let mut out = Vec::with_capacity(size);
    for _ in 0..size {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        out.push((s >> 33) as u8);
    }
    out
}

fn gen_text(size: usize) -> Vec<u8> {
    b"then the other one went into the kitchen and there was nothing there "
        .iter()
        .copied()
        .cycle()
        .take(size)
        .collect()
}

fn gen_samples(size: usize) -> Vec<u8> {
    (0..size / 2)
        .flat_map(|i| (((i as f64 * 0.02).sin() * 9000.0) as i16).to_le_bytes())
        .collect()
}

fn workload(ct: ContentType, size: usize) -> Vec<u8> {
    match ct {
        ContentType::Text => gen_text(size),
        ContentType::Audio => gen_samples(size),
        ContentType::Image => (0..size).map(|i| (i % 256 + i / 4096) as u8).collect(),
        ContentType::Binary => gen_data(size, 1),
    }
}

fn write_ratio_snapshot() {
    let mut csv = String::from("mode,input_bytes,compressed_bytes,ratio\n");
    for ct in ContentType::ALL {
        let data = workload(ct, 1024 * 1024);
        let enc = compress::compress(&data, ct);
        let ratio = enc.len() as f64 / data.len() as f64;
        csv.push_str(&format!("{ct},{},{},{}\n", data.len(), enc.len(), ratio));
    }
    let out_dir = Path::new("target/criterion/custom_reports");
    let _ = fs::create_dir_all(out_dir);
    let _ = fs::write(out_dir.join("ratio_snapshot.csv"), csv);
}

fn bench_compress_modes(c: &mut Criterion) {
    write_ratio_snapshot();
    let mut g = c.benchmark_group("compress_mb_s");
    let size = 1024 * 1024;
    for ct in ContentType::ALL {
        let data = workload(ct, size);
        g.throughput(Throughput::Bytes(size as u64));
        g.bench_with_input(BenchmarkId::from_parameter(ct), &data, |b, data| {
            b.iter(|| black_box(compress::compress(black_box(data), ct)));
        });
    }
    g.finish();
}

fn bench_decompress_modes(c: &mut Criterion) {
    let mut g = c.benchmark_group("decompress_mb_s");
    let size = 1024 * 1024;
    for ct in ContentType::ALL {
        let enc = compress::compress(&workload(ct, size), ct);
        g.throughput(Throughput::Bytes(size as u64));
        g.bench_with_input(BenchmarkId::from_parameter(ct), &enc, |b, enc| {
            b.iter(|| black_box(compress::decompress(black_box(enc), ct).unwrap()));
        });
    }
    g.finish();
}

fn bench_pattern_dictionary(c: &mut Criterion) {
    let mut g = c.benchmark_group("pattern_max_entries");
    let data = workload(ContentType::Image, 512 * 1024);
    for max_patterns in [0usize, 16, 64, 255] {
        let opts = CompressOptions {
            max_patterns,
            ..CompressOptions::default()
        };
        g.bench_with_input(
            BenchmarkId::from_parameter(max_patterns),
            &opts,
            |b, opts| {
                b.iter(|| {
                    black_box(compress::compress_with_options(
                        &data,
                        ContentType::Image,
                        opts,
                    ))
                });
            },
        );
    }
    g.finish();
}

fn bench_fec(c: &mut Criterion) {
    let mut g = c.benchmark_group("fec_mb_s");
    for size in [64 * 1024usize, 1024 * 1024] {
        let data = gen_data(size, 2);
        let clean = fec::encode(&data);
        let mut damaged = clean.clone();
        for block in damaged.chunks_mut(fec::CODEWORD_LEN) {
            for i in 0..fec::MAX_CORRECTABLE {
                block[i * 13] ^= 0x5A;
            }
        }
        g.throughput(Throughput::Bytes(size as u64));
        g.bench_with_input(BenchmarkId::new("encode", size), &data, |b, data| {
            b.iter(|| black_box(fec::encode(black_box(data))));
        });
        g.bench_with_input(BenchmarkId::new("decode_clean", size), &clean, |b, s| {
            b.iter(|| black_box(fec::decode(black_box(s)).unwrap()));
        });
        g.bench_with_input(BenchmarkId::new("decode_max_errors", size), &damaged, |b, s| {
            b.iter(|| black_box(fec::decode(black_box(s)).unwrap()));
        });
    }
    g.finish();
}

fn bench_layout(c: &mut Criterion) {
    let mut g = c.benchmark_group("layout");
    let stream = fec::encode(&gen_data(200 * 1024, 3));
    for depth in [ModuleDepth::Color32, ModuleDepth::Reduced(4), ModuleDepth::Reduced(1)] {
        let m = matrix::layout(&stream, depth).unwrap();
        let corners = pipeline::module_corners(&m);
        g.bench_with_input(BenchmarkId::new("layout", depth), &stream, |b, s| {
            b.iter(|| black_box(matrix::layout(black_box(s), depth).unwrap()));
        });
        g.bench_with_input(BenchmarkId::new("unlayout", depth), &m, |b, m| {
            b.iter(|| black_box(matrix::unlayout(black_box(m), &corners).unwrap()));
        });
    }
    g.finish();
}

fn bench_raster(c: &mut Criterion) {
    let mut g = c.benchmark_group("raster");
    let m = pipeline::encode_auto(&gen_text(8 * 1024), ContentType::Text).unwrap();
    let rasterizer = ModuleRasterizer::default();
    let surface = rasterizer.draw(&m);
    let corners = rasterizer.locator().locate(&surface);
    g.bench_function("draw", |b| b.iter(|| black_box(rasterizer.draw(black_box(&m)))));
    g.bench_function("locate_read", |b| {
        b.iter(|| {
            let found = rasterizer.locator().locate(black_box(&surface));
            black_box(rasterizer.read(&surface, &found).unwrap())
        })
    });
    g.bench_function("read", |b| {
        b.iter(|| black_box(rasterizer.read(black_box(&surface), &corners).unwrap()))
    });
    g.finish();
}

fn bench_container(c: &mut Criterion) {
    let mut g = c.benchmark_group("container");
    let m = pipeline::encode_auto(&gen_data(256 * 1024, 4), ContentType::Binary).unwrap();
    let bytes = to_bytes(&m, &ContainerOptions::default());
    g.throughput(Throughput::Bytes(bytes.len() as u64));
    g.bench_function("to_bytes", |b| {
        b.iter(|| black_box(to_bytes(black_box(&m), &ContainerOptions::default())))
    });
    g.bench_function("from_bytes", |b| {
        b.iter(|| black_box(from_bytes(black_box(&bytes)).unwrap()))
    });
    g.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut g = c.benchmark_group("pipeline_roundtrip");
    let scenarios = [
        ("short_text", ContentType::Text, 64usize),
        ("document", ContentType::Text, 64 * 1024),
        ("sensor_audio", ContentType::Audio, 256 * 1024),
        ("thumbnail", ContentType::Image, 128 * 1024),
        ("firmware_blob", ContentType::Binary, 1024 * 1024),
    ];
    for (name, ct, size) in scenarios {
        let data = workload(ct, size);
        g.throughput(Throughput::Bytes(size as u64));
        g.bench_function(name, |b| {
            b.iter(|| {
                let enc = pipeline::encode_with(&data, ct, &EncodeOptions::default(), &mut NoProgress)
                    .unwrap();
                let corners = pipeline::module_corners(&enc.matrix);
                let out = pipeline::decode_with(
                    &enc.matrix,
                    &corners,
                    &DecodeOptions::default(),
                    &mut NoProgress,
                )
                .unwrap();
                black_box(out);
            });
        });
    }
    g.finish();
}

criterion_group!(
    benches,
    bench_compress_modes,
    bench_decompress_modes,
    bench_pattern_dictionary,
    bench_fec,
    bench_layout,
    bench_raster,
    bench_container,
    bench_pipeline
);
criterion_main!(benches);
