//! Estimate a skin undertone from a face image and recommend complementary colors.
//!
//! The pipeline has three steps:
//!
//! 1. The pixels of the image are clustered with k-means in RGB space,
//!    and the centroid of the largest cluster is taken as the skin color.
//! 2. That color is classified as [`Undertone::Warm`], [`Undertone::Cool`], or [`Undertone::Neutral`].
//! 3. The undertone, together with a hair and eye color, is looked up in a [`Catalog`] of swatches.
//!
//! # Examples
//!
//! ## Get recommendations for an image file.
//!
//! ```no_run
//! use undertone::{EyeColor, HairColor};
//!
//! let image = image::open("face.jpg").unwrap().into_rgb8();
//! match undertone::recommend(Some(&image), HairColor::Brown, EyeColor::Gray) {
//! 	Ok(recommendation) => {
//! 		for swatch in &recommendation.swatches {
//! 			println!("{}: {:?}", swatch.name, swatch.rgb);
//! 		}
//! 	},
//! 	Err(e) => println!("{}", e.user_message()),
//! }
//! ```
//!
//! ## Run each step separately.
//!
//! ```no_run
//! use undertone::{Catalog, ClusterOptions, EyeColor, HairColor, PixelCounts};
//!
//! let image = image::open("face.jpg").unwrap().into_rgb8();
//! let pixels = PixelCounts::from_image(&image);
//!
//! let options = ClusterOptions { trials: 4, ..ClusterOptions::default() };
//! let skin = undertone::extract_dominant_color_with(&pixels, &options).unwrap();
//! let tone = undertone::classify_undertone(skin);
//!
//! let swatches = Catalog::builtin().lookup(tone, HairColor::Black, EyeColor::Blue);
//! ```
//!
//! # Clustering options
//!
//! ## Clusters
//!
//! The number of clusters to find. The default of 3 roughly separates skin, hair, and background.
//! The image must have at least this many pixels.
//!
//! ## Trials
//!
//! The number of times to run k-means, taking the trial with the lowest variance.
//! k-means can get stuck in a local minimum, so more trials may give a better split at the cost of time.
//!
//! ## Convergence Threshold
//!
//! A trial stops once the centroids move less than this distance in total (in 8-bit RGB units)
//! during one iteration.
//!
//! ## Max Iterations
//!
//! The maximum number of iterations allowed for each k-means trial.
//!
//! ## Seed
//!
//! The value used to seed the random number generator which chooses the initial centroids.
//! The same seed on the same pixels always gives the same dominant color.

#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::cargo)]
#![warn(clippy::use_debug, clippy::dbg_macro, clippy::todo, clippy::unimplemented)]
#![warn(clippy::unwrap_used, clippy::unwrap_in_result)]
#![warn(clippy::unneeded_field_pattern, clippy::rest_pat_in_fully_bound_structs)]
#![warn(clippy::unnecessary_self_imports)]
#![warn(clippy::str_to_string, clippy::string_to_string, clippy::string_slice)]
#![warn(missing_docs, clippy::missing_docs_in_private_items, rustdoc::all)]
#![warn(clippy::float_cmp_const, clippy::lossy_float_literal)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::enum_glob_use)]
#![allow(clippy::unreadable_literal)]

use image::RgbImage;
use palette::Srgb;
use std::collections::HashMap;

mod catalog;
mod classify;
mod error;
mod kmeans;
mod recommend;

pub use catalog::{Catalog, EyeColor, HairColor, RecommendationEntry, Swatch};
pub use classify::{classify_undertone, classify_undertone_batch, Undertone};
pub use error::{Error, Result};
pub use kmeans::KmeansResult;
pub use recommend::{recommend, Recommendation, Recommender};

/// An 8-bit RGB color
pub type ColorSample = Srgb<u8>;

/// Number of clusters used when none is given
pub const DEFAULT_CLUSTERS: u8 = 3;

/// Seed used when none is given
pub const DEFAULT_SEED: u64 = 42;

/// Parameters for k-means clustering
///
/// See the crate documentation for information on each option.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterOptions {
	/// The number of clusters to find
	pub clusters: u8,
	/// The number of k-means trials to run
	pub trials: u32,
	/// The total centroid movement below which a trial has converged
	pub convergence_threshold: f32,
	/// The maximum number of iterations for each trial
	pub max_iter: u32,
	/// The seed for choosing initial centroids
	pub seed: u64,
}

impl Default for ClusterOptions {
	fn default() -> Self {
		Self {
			clusters: DEFAULT_CLUSTERS,
			trials: 1,
			convergence_threshold: 0.01,
			max_iter: 300,
			seed: DEFAULT_SEED,
		}
	}
}

/// Deduplicated pixels of an image, each with the number of times it occurs
#[derive(Debug, Clone, Default)]
pub struct PixelCounts {
	/// Unique colors in order of first appearance
	pub(crate) colors: Vec<Srgb<u8>>,
	/// The number of pixels of each color
	pub(crate) counts: Vec<u64>,
}

impl PixelCounts {
	/// Count the unique colors in a slice of pixels
	#[must_use]
	pub fn from_srgb(pixels: &[Srgb<u8>]) -> Self {
		let mut data = Self::default();

		// Packed Srgb -> data index
		let mut memo: HashMap<u32, usize> = HashMap::new();

		for srgb in pixels {
			let key = srgb.into_u32::<palette::rgb::channels::Rgba>();
			let index = *memo.entry(key).or_insert_with(|| {
				data.colors.push(*srgb);
				data.counts.push(0);
				data.colors.len() - 1
			});

			data.counts[index] += 1;
		}

		data
	}

	/// Count the unique colors of an image
	#[must_use]
	pub fn from_image(image: &RgbImage) -> Self {
		Self::from_srgb(image_pixels(image))
	}

	/// The number of unique colors
	#[must_use]
	pub fn num_colors(&self) -> usize {
		self.colors.len()
	}

	/// The total number of pixels
	#[must_use]
	pub fn num_pixels(&self) -> u64 {
		self.counts.iter().sum()
	}

	/// Iterate over each unique color and its number of pixels
	pub(crate) fn pairs(&self) -> impl Iterator<Item = (Srgb<u8>, u64)> + '_ {
		self.colors.iter().copied().zip(self.counts.iter().copied())
	}
}

/// View the pixels of an image as a slice of colors
#[must_use]
pub fn image_pixels(image: &RgbImage) -> &[Srgb<u8>] {
	palette::cast::from_component_slice(image.as_raw())
}

/// Run k-means on the given pixels, returning every centroid and its pixel count.
///
/// # Errors
///
/// Returns [`Error::InvalidClusterCount`] if `options.clusters` is 0,
/// and [`Error::InsufficientData`] if there are fewer pixels than clusters.
///
/// At least one trial of at least one iteration is always run.
pub fn cluster(pixels: &PixelCounts, options: &ClusterOptions) -> Result<KmeansResult> {
	let total = pixels.num_pixels();
	if options.clusters == 0 {
		return Err(Error::InvalidClusterCount);
	}
	if total < u64::from(options.clusters) {
		return Err(Error::InsufficientData {
			pixels: usize::try_from(total).unwrap_or(usize::MAX),
			clusters: options.clusters,
		});
	}

	// Zero trials would leave nothing to pick from,
	// and zero iterations would leave every pixel in the first center
	let options = ClusterOptions {
		trials: options.trials.max(1),
		max_iter: options.max_iter.max(1),
		..*options
	};
	let result = kmeans::run(pixels, &options);

	tracing::debug!(
		unique_colors = pixels.num_colors(),
		pixels = total,
		iterations = result.iterations,
		variance = result.variance,
		"k-means finished"
	);

	Ok(result)
}

/// Find the centroid of the largest pixel cluster, using the given options.
///
/// Ties in cluster size go to the cluster with the lowest index.
///
/// # Errors
///
/// See [`cluster`].
pub fn extract_dominant_color_with(pixels: &PixelCounts, options: &ClusterOptions) -> Result<ColorSample> {
	let result = cluster(pixels, options)?;
	result.majority().ok_or(Error::InsufficientData {
		pixels: 0,
		clusters: options.clusters,
	})
}

/// Find the centroid of the largest of `clusters` pixel clusters in an image.
///
/// The default seed is used, so the result is the same for the same image and cluster count.
///
/// # Errors
///
/// See [`cluster`].
pub fn extract_dominant_color(image: &RgbImage, clusters: u8) -> Result<ColorSample> {
	let options = ClusterOptions { clusters, ..ClusterOptions::default() };
	extract_dominant_color_with(&PixelCounts::from_image(image), &options)
}

#[cfg(test)]
mod tests {
	use super::*;
	use image::Rgb;

	/// An image whose left `skin` columns are one color and the rest another
	fn two_tone(width: u32, height: u32, skin: u32) -> RgbImage {
		RgbImage::from_fn(width, height, |x, _| {
			if x < skin {
				Rgb([224, 172, 138])
			} else {
				Rgb([30, 60, 200])
			}
		})
	}

	#[test]
	fn pixel_counts_merge_duplicates() {
		let pixels = [
			Srgb::new(1, 2, 3),
			Srgb::new(4, 5, 6),
			Srgb::new(1, 2, 3),
			Srgb::new(1, 2, 3),
		];
		let counts = PixelCounts::from_srgb(&pixels);

		assert_eq!(counts.colors, vec![Srgb::new(1, 2, 3), Srgb::new(4, 5, 6)]);
		assert_eq!(counts.counts, vec![3, 1]);
		assert_eq!(counts.num_pixels(), 4);
	}

	#[test]
	#[allow(clippy::cast_possible_truncation)]
	fn image_pixels_are_row_major() {
		let image = RgbImage::from_fn(2, 2, |x, y| Rgb([x as u8, y as u8, 0]));

		assert_eq!(
			image_pixels(&image),
			&[Srgb::new(0, 0, 0), Srgb::new(1, 0, 0), Srgb::new(0, 1, 0), Srgb::new(1, 1, 0)]
		);
	}

	#[test]
	fn dominant_color_is_majority_centroid() {
		let image = two_tone(10, 10, 7);
		assert_eq!(extract_dominant_color(&image, 3).ok(), Some(Srgb::new(224, 172, 138)));

		let image = two_tone(10, 10, 3);
		assert_eq!(extract_dominant_color(&image, 3).ok(), Some(Srgb::new(30, 60, 200)));
	}

	#[test]
	#[allow(clippy::cast_possible_truncation)]
	fn dominant_color_is_deterministic() {
		let image = RgbImage::from_fn(32, 32, |x, y| Rgb([(x * 8) as u8, (y * 8) as u8, ((x + y) * 4) as u8]));
		let copy = image.clone();

		let first = extract_dominant_color(&image, 3).ok();
		assert!(first.is_some());
		assert_eq!(first, extract_dominant_color(&copy, 3).ok());
	}

	#[test]
	fn tied_clusters_pick_lowest_index() {
		let image = two_tone(4, 1, 2);
		let pixels = PixelCounts::from_image(&image);
		let options = ClusterOptions { clusters: 2, ..ClusterOptions::default() };

		let result = cluster(&pixels, &options).expect("enough pixels");
		assert_eq!(result.counts, vec![2, 2]);
		assert_eq!(result.majority_index(), Some(0));
		assert_eq!(extract_dominant_color_with(&pixels, &options).ok(), Some(result.centroids[0]));
	}

	#[test]
	fn too_few_pixels() {
		let image = two_tone(2, 1, 1);
		assert!(matches!(
			extract_dominant_color(&image, 3),
			Err(Error::InsufficientData { pixels: 2, clusters: 3 })
		));

		let empty = RgbImage::new(0, 0);
		assert!(matches!(
			extract_dominant_color(&empty, 3),
			Err(Error::InsufficientData { pixels: 0, clusters: 3 })
		));
	}

	#[test]
	fn exactly_enough_pixels() {
		let image = two_tone(3, 1, 2);
		assert_eq!(extract_dominant_color(&image, 3).ok(), Some(Srgb::new(224, 172, 138)));
	}

	#[test]
	fn zero_clusters() {
		let image = two_tone(4, 4, 2);
		assert!(matches!(extract_dominant_color(&image, 0), Err(Error::InvalidClusterCount)));
	}

	#[test]
	fn zero_trials_runs_once() {
		let pixels = PixelCounts::from_image(&two_tone(4, 4, 3));
		let options = ClusterOptions { trials: 0, ..ClusterOptions::default() };
		assert_eq!(extract_dominant_color_with(&pixels, &options).ok(), Some(Srgb::new(224, 172, 138)));
	}

	#[test]
	fn zero_iterations_runs_once() {
		let pixels = PixelCounts::from_image(&two_tone(4, 4, 3));
		let options = ClusterOptions { max_iter: 0, ..ClusterOptions::default() };
		let result = cluster(&pixels, &options).expect("enough pixels");

		assert_eq!(result.iterations, 1);

		let mut clusters = result.centroids.iter().copied().zip(result.counts.iter().copied()).collect::<Vec<_>>();
		clusters.sort_by_key(|&(_, n)| n);
		assert_eq!(clusters, vec![(Srgb::new(30, 60, 200), 4), (Srgb::new(224, 172, 138), 12)]);
	}
}
