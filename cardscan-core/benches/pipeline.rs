use std::hint::black_box;

use cardscan_core::{
    CardDetector, DetectorConfig, EdgeMap, blur_radius, box_blur, sharpen, sobel_edges,
    to_grayscale,
};
use cardscan_utils::outlined_cards;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use image::RgbaImage;

const SIZES: [(u32, u32); 3] = [(320, 448), (640, 480), (1280, 960)];

fn scene(width: u32, height: u32) -> RgbaImage {
    let card_w = width / 3;
    let card_h = card_w * 7 / 5;
    outlined_cards(
        width,
        height,
        &[(width / 10, height / 10, card_w, card_h), (width / 2, height / 5, card_w, card_h)],
        6,
    )
}

fn benchmark_edge_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("edge_map");
    for (w, h) in SIZES {
        let image = scene(w, h);
        group.bench_with_input(BenchmarkId::from_parameter(format!("{w}x{h}")), &image, |b, img| {
            b.iter(|| {
                let gray = to_grayscale(&sharpen(black_box(img)));
                let blurred = box_blur(&gray, blur_radius(1.4));
                EdgeMap::new(sobel_edges(&blurred, 50.0), 200)
            });
        });
    }
    group.finish();
}

fn benchmark_detect(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect");
    group.sample_size(20);
    let parallel = CardDetector::default();
    let sequential = CardDetector::new(DetectorConfig {
        parallel: false,
        ..DetectorConfig::default()
    });
    for (w, h) in SIZES {
        let image = scene(w, h);
        let label = format!("{w}x{h}");
        group.bench_with_input(BenchmarkId::new("parallel", &label), &image, |b, img| {
            b.iter(|| parallel.detect_image(black_box(img)));
        });
        group.bench_with_input(BenchmarkId::new("sequential", &label), &image, |b, img| {
            b.iter(|| sequential.detect_image(black_box(img)));
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_edge_map, benchmark_detect);
criterion_main!(benches);
