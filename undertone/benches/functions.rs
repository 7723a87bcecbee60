use criterion::{
	black_box, criterion_group, criterion_main, measurement::WallTime, BenchmarkGroup, BenchmarkId, Criterion,
	SamplingMode,
};
use image::{Rgb, RgbImage};
use palette::Srgb;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use undertone::{ClusterOptions, PixelCounts};

const SIZES: [(u32, u32); 3] = [(160, 120), (640, 480), (1920, 1080)];

/// A noisy synthetic portrait so that there are many unique colors
fn synthetic_portrait(width: u32, height: u32) -> RgbImage {
	let mut rng = rand_xoshiro::Xoshiro256PlusPlus::seed_from_u64(42);
	RgbImage::from_fn(width, height, |x, y| {
		let dx = f64::from(x) / f64::from(width) - 0.5;
		let dy = f64::from(y) / f64::from(height) - 0.55;
		let base: [u8; 3] = if (dx / 0.4).powi(2) + (dy / 0.42).powi(2) <= 1.0 {
			[224, 172, 138]
		} else if dy < -0.4 {
			[42, 30, 26]
		} else {
			[90, 140, 210]
		};
		Rgb(base.map(|c| c.saturating_add_signed(rng.gen_range(-12..=12))))
	})
}

fn create_group<'a>(c: &'a mut Criterion, name: &'a str) -> BenchmarkGroup<'a, WallTime> {
	let mut group = c.benchmark_group(name);
	group
		.sample_size(30)
		.noise_threshold(0.05)
		.sampling_mode(SamplingMode::Flat)
		.warm_up_time(Duration::from_millis(500));
	group
}

fn preprocessing(c: &mut Criterion) {
	let mut group = create_group(c, "preprocessing");

	for (width, height) in SIZES {
		let image = synthetic_portrait(width, height);
		group.bench_with_input(BenchmarkId::from_parameter(format!("{width}x{height}")), &image, |b, image| {
			b.iter(|| PixelCounts::from_image(black_box(image)));
		});
	}
}

fn kmeans(c: &mut Criterion) {
	let mut group = create_group(c, "kmeans");
	group.measurement_time(Duration::from_secs(4));

	let counts = SIZES
		.into_iter()
		.map(|(width, height)| (format!("{width}x{height}"), PixelCounts::from_image(&synthetic_portrait(width, height))))
		.collect::<Vec<_>>();

	fn bench(name: &str, group: &mut BenchmarkGroup<WallTime>, counts: &[(String, PixelCounts)], options: ClusterOptions) {
		for (size, counts) in counts {
			group.bench_with_input(BenchmarkId::new(name, size), counts, |b, counts| {
				b.iter(|| undertone::cluster(counts, black_box(&options)));
			});
		}
	}

	bench("default", &mut group, &counts, ClusterOptions::default());
	bench("high k", &mut group, &counts, ClusterOptions { clusters: 8, ..ClusterOptions::default() });
	bench("trials", &mut group, &counts, ClusterOptions { trials: 4, ..ClusterOptions::default() });
}

fn classify(c: &mut Criterion) {
	let mut group = create_group(c, "classify");

	let mut rng = rand_xoshiro::Xoshiro256PlusPlus::seed_from_u64(42);
	for n in [1_000, 100_000, 1_000_000] {
		let colors = (0..n).map(|_| Srgb::new(rng.gen(), rng.gen(), rng.gen())).collect::<Vec<Srgb<u8>>>();
		group.bench_with_input(BenchmarkId::from_parameter(n), &colors, |b, colors| {
			b.iter(|| undertone::classify_undertone_batch(black_box(colors)));
		});
	}
}

criterion_group!(benches, preprocessing, kmeans, classify);
criterion_main!(benches);
