//! Sanity checks for the undertone rule on synthetic colors.
//!
//! This does not say anything about real photos. It only shows how the rule
//! behaves on generated data and how far it is from a looser restatement of it.

use clap::{Parser, ValueEnum};
use palette::Srgb;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution as _, Normal};
use undertone::{classify_undertone, classify_undertone_batch, Undertone};

#[derive(Copy, Clone, ValueEnum)]
enum Distribution {
	/// Each label gets its own channel ranges, e.g. warm colors have high red and low blue
	Shaped,
	/// Uniformly random colors, labeled by the signed difference rule
	Uniform,
}

#[derive(Parser)]
struct Options {
	#[arg(short, long, default_value = "shaped")]
	distribution: Distribution,

	#[arg(short, long, default_value_t = 3000)]
	samples: usize,

	/// Standard deviation of the normal noise added to each channel before classifying
	#[arg(long, default_value_t = 0.0)]
	noise: f64,

	#[arg(short, long, default_value_t = 5)]
	runs: u64,

	#[arg(long, default_value_t = 42)]
	seed: u64,
}

/// The looser restatement: red above both other channels is warm, red below both is cool
fn signed_difference(color: Srgb<u8>) -> Undertone {
	let rg = i16::from(color.red) - i16::from(color.green);
	let rb = i16::from(color.red) - i16::from(color.blue);
	if rg > 0 && rb > 0 {
		Undertone::Warm
	} else if rg < 0 && rb < 0 {
		Undertone::Cool
	} else {
		Undertone::Neutral
	}
}

fn uniform(rng: &mut impl Rng, range: std::ops::RangeInclusive<u8>) -> u8 {
	rng.gen_range(range)
}

fn generate(options: &Options, rng: &mut impl Rng) -> (Vec<Srgb<u8>>, Vec<Undertone>) {
	let per_label = options.samples / 3;
	match options.distribution {
		Distribution::Shaped => {
			let mut colors = Vec::with_capacity(per_label * 3);
			let mut labels = Vec::with_capacity(per_label * 3);
			for (label, [r, g, b]) in [
				(Undertone::Warm, [150..=255, 100..=200, 50..=150]),
				(Undertone::Cool, [50..=150, 100..=200, 150..=255]),
				(Undertone::Neutral, [100..=200, 100..=200, 100..=200]),
			] {
				for _ in 0..per_label {
					colors.push(Srgb::new(uniform(rng, r.clone()), uniform(rng, g.clone()), uniform(rng, b.clone())));
					labels.push(label);
				}
			}
			(colors, labels)
		},
		Distribution::Uniform => {
			let colors = (0..options.samples).map(|_| Srgb::new(rng.gen(), rng.gen(), rng.gen())).collect::<Vec<_>>();
			let labels = colors.iter().map(|&c| signed_difference(c)).collect();
			(colors, labels)
		},
	}
}

/// Add normal noise to each channel, truncated to an integer and clamped to the 8-bit range.
///
/// Labels are left alone, so they still describe the colors before the noise.
fn add_noise(colors: &mut [Srgb<u8>], noise: f64, rng: &mut impl Rng) {
	if noise <= 0.0 {
		return;
	}
	let Ok(normal) = Normal::new(0.0, noise) else {
		return;
	};

	#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
	let mut jitter = |channel: u8| (i32::from(channel) + normal.sample(&mut *rng) as i32).clamp(0, 255) as u8;
	for color in colors {
		color.red = jitter(color.red);
		color.green = jitter(color.green);
		color.blue = jitter(color.blue);
	}
}

fn index(undertone: Undertone) -> usize {
	Undertone::ALL.iter().position(|&u| u == undertone).unwrap_or(0)
}

fn confusion_matrix(truth: &[Undertone], predicted: &[Undertone]) -> [[usize; 3]; 3] {
	let mut matrix = [[0; 3]; 3];
	for (&t, &p) in truth.iter().zip(predicted) {
		matrix[index(t)][index(p)] += 1;
	}
	matrix
}

#[allow(clippy::cast_precision_loss)]
fn accuracy(matrix: &[[usize; 3]; 3]) -> f64 {
	let correct = (0..3).map(|i| matrix[i][i]).sum::<usize>();
	let total = matrix.iter().flatten().sum::<usize>();
	if total == 0 {
		0.0
	} else {
		correct as f64 / total as f64
	}
}

fn print_matrix(matrix: &[[usize; 3]; 3]) {
	const WIDTH: usize = 8;
	println!(
		"{:width$} {}",
		"true\\pred",
		Undertone::ALL.map(|u| format!("{:>width$}", u.as_str(), width = WIDTH)).join(" "),
		width = WIDTH + 2
	);
	for (label, row) in Undertone::ALL.iter().zip(matrix) {
		println!(
			"{:width$} {}",
			label.as_str(),
			row.map(|n| format!("{n:>width$}", width = WIDTH)).join(" "),
			width = WIDTH + 2
		);
	}
}

fn main() {
	let options = Options::parse();

	println!("Edge cases:");
	for [r, g, b] in [
		[255, 200, 150],
		[150, 200, 255],
		[200, 200, 200],
		[180, 175, 170],
		[170, 175, 180],
		[180, 180, 180],
	] {
		let color = Srgb::new(r, g, b);
		println!(
			"  ({r:>3},{g:>3},{b:>3}) rule: {:<7} signed difference: {}",
			classify_undertone(color).as_str(),
			signed_difference(color).as_str()
		);
	}
	println!();

	let mut rule = Vec::new();
	let mut baseline = Vec::new();
	for run in 0..options.runs.max(1) {
		let mut rng = rand_xoshiro::Xoshiro256PlusPlus::seed_from_u64(options.seed ^ run);
		let (mut colors, labels) = generate(&options, &mut rng);
		add_noise(&mut colors, options.noise, &mut rng);

		let predicted = classify_undertone_batch(&colors);
		let matrix = confusion_matrix(&labels, &predicted);

		let signed = colors.iter().map(|&c| signed_difference(c)).collect::<Vec<_>>();
		let signed_matrix = confusion_matrix(&labels, &signed);

		if run == 0 {
			println!("Rule:");
			print_matrix(&matrix);
			println!();
			println!("Signed difference:");
			print_matrix(&signed_matrix);
			println!();
		}

		rule.push(accuracy(&matrix));
		baseline.push(accuracy(&signed_matrix));
	}

	print_summary("Rule", &rule);
	print_summary("Signed difference", &baseline);
}

fn print_summary(name: &str, accuracies: &[f64]) {
	#[allow(clippy::cast_precision_loss)]
	let n = accuracies.len() as f64;
	let mean = accuracies.iter().sum::<f64>() / n;
	let std = (accuracies.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / n).sqrt();
	let min = accuracies.iter().copied().fold(f64::INFINITY, f64::min);
	let max = accuracies.iter().copied().fold(f64::NEG_INFINITY, f64::max);

	println!("{name} accuracy over {} runs:", accuracies.len());
	println!("  mean {:.2}%", 100.0 * mean);
	println!("  std  {:.2}%", 100.0 * std);
	println!("  min  {:.2}%", 100.0 * min);
	println!("  max  {:.2}%", 100.0 * max);
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn noise_is_clamped_and_optional() {
		let mut rng = rand_xoshiro::Xoshiro256PlusPlus::seed_from_u64(42);
		let black = vec![Srgb::new(0, 0, 0); 100];

		let mut unchanged = black.clone();
		add_noise(&mut unchanged, 0.0, &mut rng);
		assert_eq!(unchanged, black);

		let mut noisy = black.clone();
		add_noise(&mut noisy, 5.0, &mut rng);
		assert_ne!(noisy, black);
		assert!(noisy.iter().all(|c| c.red <= 40 && c.green <= 40 && c.blue <= 40));
	}
}
