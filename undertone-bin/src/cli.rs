//! Specifies the CLI and handles arg parsing

use clap::{Parser, ValueEnum};
use std::{
	fmt::{Debug, Display},
	num::ParseFloatError,
	ops::RangeBounds,
	path::PathBuf,
	str::FromStr,
};
use undertone::{EyeColor, HairColor};

/// Supported output formats for the recommended swatches
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatOutput {
	/// Whitespace with true color background, followed by the swatch name
	Swatch,
	/// sRGB hexcode
	Hex,
	/// sRGB (r,g,b) triple
	Rgb,
	/// The whole recommendation as JSON
	Json,
}

/// Ways to colorize the output text
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorizeOutput {
	/// Foreground
	Fg,
	/// Background
	Bg,
}

/// Estimate the skin undertone of a face image and print complementary colors.
///
/// The image is clustered with k-means, the largest cluster is taken as the skin color,
/// and its undertone together with the given hair and eye colors picks a set of swatches.
#[derive(Parser)]
#[command(version)]
pub struct Options {
	/// The path to the face image
	pub image: Option<PathBuf>,

	/// Hair color: Black, Brown, or Blonde
	#[arg(long, value_parser = parse_attribute::<HairColor>)]
	pub hair: HairColor,

	/// Eye color: Black, Brown, Gray, or Blue
	#[arg(long, value_parser = parse_attribute::<EyeColor>)]
	pub eye: EyeColor,

	/// The format to print the swatches in
	#[arg(short, long, default_value = "swatch")]
	pub output: FormatOutput,

	/// Color the foreground or background for each printed hex or rgb color
	#[arg(short, long)]
	pub colorize: Option<ColorizeOutput>,

	/// A JSON file to use instead of the built-in catalog
	///
	/// The file must be an array of entries with the fields
	/// "undertone", "hair_color", "eye_color", and "swatches",
	/// where each swatch has a "name" and an "rgb" array.
	#[arg(long)]
	pub catalog: Option<PathBuf>,

	/// The number of clusters to split the image into
	///
	/// The default of 3 roughly separates skin, hair, and background.
	#[arg(short, default_value_t = undertone::DEFAULT_CLUSTERS, value_parser = clap::value_parser!(u8).range(1..))]
	pub k: u8,

	/// The number of trials of k-means to run
	///
	/// k-means can get stuck in a local minimum, so you may want to run a few trials to get better results.
	/// The trial with the lowest variance is picked.
	#[arg(short = 'n', long, default_value_t = 1)]
	pub trials: u32,

	/// The threshold number used to determine k-means convergence
	///
	/// This is the total distance, in 8-bit RGB units, the centroids may move in one iteration
	/// before the trial is considered converged.
	#[arg(short = 'e', long, default_value_t = 0.01, value_parser = parse_valid_convergence)]
	pub convergence_threshold: f32,

	/// The maximum number of iterations for each k-means trial
	#[arg(short = 'i', long, default_value_t = 300, value_parser = clap::value_parser!(u32).range(1..))]
	pub max_iter: u32,

	/// The maximum image size, in number of pixels, before a thumbnail is created
	///
	/// This option may shift the dominant color slightly,
	/// as multiple pixels in the original image are interpolated to form a pixel in the thumbnail.
	#[arg(short = 'p', long, default_value_t = u32::MAX)]
	pub max_pixels: u32,

	/// The seed value used for the random number generator
	#[arg(long, default_value_t = undertone::DEFAULT_SEED)]
	pub seed: u64,

	/// The number of threads to use
	#[cfg(feature = "threads")]
	#[arg(short, long, default_value_t = 4)]
	pub threads: u8,

	/// Print additional information, such as the dominant color and how long each step took
	#[arg(long)]
	pub verbose: bool,
}

impl Options {
	/// The clustering options given on the command line
	pub fn cluster_options(&self) -> undertone::ClusterOptions {
		undertone::ClusterOptions {
			clusters: self.k,
			trials: self.trials,
			convergence_threshold: self.convergence_threshold,
			max_iter: self.max_iter,
			seed: self.seed,
		}
	}
}

/// Parse a hair or eye color by its exact name
fn parse_attribute<T>(s: &str) -> Result<T, String>
where
	T: FromStr<Err = undertone::Error>,
{
	s.parse().map_err(|e: undertone::Error| e.to_string())
}

/// Parse a float value and ensure it in the provided, valid range
fn parse_float_in_range<T>(s: &str, range: impl RangeBounds<T> + Debug) -> Result<T, String>
where
	T: FromStr<Err = ParseFloatError> + Display + PartialOrd,
{
	let value: T = s.parse().map_err(|e| format!("{e}"))?;
	if range.contains(&value) {
		Ok(value)
	} else {
		Err(format!("{value} is not in {range:?}"))
	}
}

/// Parse the convergence number and ensure it is >= `0.0`
fn parse_valid_convergence(s: &str) -> Result<f32, String> {
	parse_float_in_range(s, 0.0..)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn convergence_must_not_be_negative() {
		assert_eq!(parse_valid_convergence("0.05"), Ok(0.05));
		assert_eq!(parse_valid_convergence("0"), Ok(0.0));
		assert!(parse_valid_convergence("-0.5").is_err());
		assert!(parse_valid_convergence("fast").is_err());
	}

	#[test]
	fn attributes_parse_by_exact_name() {
		assert_eq!(parse_attribute::<HairColor>("Blonde"), Ok(HairColor::Blonde));
		assert_eq!(parse_attribute::<EyeColor>("Gray"), Ok(EyeColor::Gray));
		assert!(parse_attribute::<EyeColor>("Green").is_err());
		assert!(parse_attribute::<HairColor>("blonde").is_err());
	}

	#[test]
	fn defaults() {
		let options = Options::try_parse_from(["undertone", "face.png", "--hair", "Brown", "--eye", "Blue"])
			.expect("valid arguments");

		assert_eq!(options.image, Some(PathBuf::from("face.png")));
		assert_eq!(options.hair, HairColor::Brown);
		assert_eq!(options.eye, EyeColor::Blue);
		assert_eq!(options.output, FormatOutput::Swatch);
		assert_eq!(options.colorize, None);
		assert_eq!(options.cluster_options(), undertone::ClusterOptions::default());
	}

	#[test]
	fn image_is_optional_but_attributes_are_not() {
		let options = Options::try_parse_from(["undertone", "--hair", "Black", "--eye", "Black"]).expect("valid arguments");
		assert_eq!(options.image, None);

		assert!(Options::try_parse_from(["undertone", "face.png", "--hair", "Black"]).is_err());
		assert!(Options::try_parse_from(["undertone", "face.png", "--hair", "Red", "--eye", "Black"]).is_err());
	}

	#[test]
	fn zero_clusters_are_rejected() {
		assert!(Options::try_parse_from(["undertone", "-k", "0", "--hair", "Black", "--eye", "Black"]).is_err());
	}

	#[test]
	fn zero_iterations_are_rejected() {
		assert!(Options::try_parse_from(["undertone", "-i", "0", "--hair", "Black", "--eye", "Black"]).is_err());

		let options = Options::try_parse_from(["undertone", "-i", "1", "--hair", "Black", "--eye", "Black"])
			.expect("valid arguments");
		assert_eq!(options.max_iter, 1);
	}
}
