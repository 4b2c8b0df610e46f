use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageBuffer, ImageEncoder, Rgb, RgbImage};
use std::time::Duration;
use wp_toolkit::{
    convert_image, extract_seo_signals, extract_slugs, generate_password, normalize_url,
    output_file_name, AssetKind, Config, OutputFormat, PasswordOptions, ReportBuilder,
};

// Fast settings for all benchmarks
fn configure_fast_group(group: &mut criterion::BenchmarkGroup<criterion::measurement::WallTime>) {
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_millis(500));
    group.sample_size(20);
}

const SAMPLE_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <title>Example WordPress Site - Just another blog</title>
  <meta name="description" content="An example site used to benchmark extraction rules.">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <meta name="generator" content="WordPress 6.5">
  <link rel="canonical" href="https://example.com/">
  <link rel="stylesheet" href="/wp-content/themes/twentytwentyfour/style.css?ver=1.1">
  <link rel="stylesheet" href="/wp-content/plugins/woocommerce/assets/css/wc.css">
  <script src="/wp-content/plugins/akismet/akismet.js"></script>
  <script src="/wp-content/plugins/contact-form-7/includes/js/index.js"></script>
</head>
<body>
  <h1>Welcome</h1>
  <img src="/wp-content/uploads/hero.jpg" alt="Hero">
  <img src="/wp-content/uploads/logo.png">
</body>
</html>"#;

fn benchmark_config_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("config");
    configure_fast_group(&mut group);

    group.bench_function("creation", |b| {
        b.iter(|| {
            let config = Config::default();
            black_box(config);
        });
    });

    group.finish();
}

fn benchmark_url_normalization(c: &mut Criterion) {
    let mut group = c.benchmark_group("url_normalization");
    configure_fast_group(&mut group);

    let test_urls = vec!["example.com", "http://example.com/path", "  ", "https://"];

    group.bench_function("normalize", |b| {
        b.iter(|| {
            for url in &test_urls {
                let result = normalize_url(url);
                let _ = black_box(result);
            }
        });
    });

    group.finish();
}

fn benchmark_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction");
    configure_fast_group(&mut group);

    group.bench_function("plugin_slugs", |b| {
        b.iter(|| black_box(extract_slugs(black_box(SAMPLE_PAGE), AssetKind::Plugin)));
    });

    group.bench_function("seo_signals", |b| {
        b.iter(|| black_box(extract_seo_signals(black_box(SAMPLE_PAGE))));
    });

    group.finish();
}

fn benchmark_report_building(c: &mut Criterion) {
    let mut group = c.benchmark_group("report");
    configure_fast_group(&mut group);

    group.bench_function("ten_checks", |b| {
        b.iter(|| {
            let mut builder = ReportBuilder::new();
            builder.pass("SSL Certificate", "HTTPS is enabled");
            for i in 0..9 {
                builder.warn(format!("Check {i}"), "Needs review");
            }
            black_box(builder.build());
        });
    });

    group.finish();
}

fn benchmark_password_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("password");
    configure_fast_group(&mut group);

    let options = PasswordOptions::default();
    group.bench_function("default_options", |b| {
        b.iter(|| black_box(generate_password(&options)));
    });

    group.finish();
}

fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let img: RgbImage = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
    });
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(img.as_raw(), width, height, ColorType::Rgb8)
        .unwrap();
    bytes
}

fn benchmark_conversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("conversion");
    configure_fast_group(&mut group);

    let png = sample_png(64, 64);

    group.bench_function("output_file_name", |b| {
        b.iter(|| black_box(output_file_name(black_box("holiday.photo.jpeg"), OutputFormat::Webp)));
    });

    group.bench_function("png_to_webp_64px", |b| {
        b.iter(|| black_box(convert_image(&png, "tile.png", OutputFormat::Webp)));
    });

    group.finish();
}

criterion_group!(
    unit_benches,
    benchmark_config_creation,
    benchmark_url_normalization,
    benchmark_extraction,
    benchmark_report_building,
    benchmark_password_generation,
    benchmark_conversion,
);

criterion_main!(unit_benches);
