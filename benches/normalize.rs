//! Normalization Benchmarks
//!
//! Decode + PNG re-encode for each accepted upload format, and TSV parsing
//! of engine output.
//!
//! Run with: `cargo bench --bench normalize`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::io::Cursor;
use std::time::Duration;

use textcoords_server::bitmap::Normalizer;
use textcoords_server::ocr::tsv;
use textcoords_server::upload::{ImageKind, UploadCandidate, UploadPolicy};

/// Scan-sized test image: dark "text" bars on white
fn create_page(format: image::ImageFormat) -> Vec<u8> {
    let img = image::RgbImage::from_fn(1240, 1754, |x, y| {
        let on_line = (y / 24) % 2 == 1 && (x / 40) % 3 != 0;
        if on_line {
            image::Rgb([20, 20, 20])
        } else {
            image::Rgb([250, 250, 250])
        }
    });

    let mut out = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut out), format)
        .expect("Failed to encode page");
    out
}

/// TSV for a page of `lines` lines with 10 words each
fn create_tsv(lines: u32) -> String {
    let mut tsv = String::from(
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n",
    );
    for line in 1..=lines {
        tsv.push_str(&format!("4\t1\t1\t1\t{line}\t0\t10\t{}\t900\t20\t-1\t\n", line * 24));
        for word in 1..=10u32 {
            tsv.push_str(&format!(
                "5\t1\t1\t1\t{line}\t{word}\t{}\t{}\t80\t20\t93.5\tword{word}\n",
                word * 90,
                line * 24
            ));
        }
    }
    tsv
}

fn bench_normalize(c: &mut Criterion) {
    let policy = UploadPolicy::new(usize::MAX, ImageKind::ALL.to_vec());
    let normalizer = Normalizer::new(10_000);

    let mut group = c.benchmark_group("normalize");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    for kind in ImageKind::ALL {
        let data = create_page(kind.image_format());
        let upload = policy
            .validate(Some(UploadCandidate {
                bytes: data.clone().into(),
                declared_mime: kind.mime().to_string(),
                file_name: None,
            }))
            .expect("Failed to validate page");

        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("to_png", kind.label()), &upload, |b, upload| {
            b.iter(|| {
                let bitmap = normalizer
                    .normalize(black_box(upload))
                    .expect("Failed to normalize");
                black_box(bitmap)
            })
        });
    }

    group.finish();
}

fn bench_tsv_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("tsv_parsing");

    for lines in [10u32, 60] {
        let data = create_tsv(lines);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("lines", lines), &data, |b, data| {
            b.iter(|| {
                let result = tsv::parse(black_box(data)).expect("Failed to parse TSV");
                black_box(result)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_normalize, bench_tsv_parsing);
criterion_main!(benches);
