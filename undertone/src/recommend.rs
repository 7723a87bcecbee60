//! Runs the whole pipeline from an image to a list of swatches

use crate::{
	classify_undertone, extract_dominant_color_with, Catalog, ClusterOptions, ColorSample, Error, EyeColor,
	HairColor, PixelCounts, Result, Swatch, Undertone,
};
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Everything a front-end needs to show a recommendation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
	/// Undertone of the dominant color
	pub undertone: Undertone,
	/// Hair color picked by the user
	pub hair_color: HairColor,
	/// Eye color picked by the user
	pub eye_color: EyeColor,
	/// The dominant color the undertone was derived from
	#[serde(with = "crate::catalog::rgb_triple")]
	pub dominant_color: ColorSample,
	/// Recommended swatches in display order
	pub swatches: Vec<Swatch>,
}

/// Recommends swatches from a catalog using fixed clustering options
#[derive(Debug, Clone, Copy)]
pub struct Recommender<'a> {
	/// Where swatches are looked up
	catalog: &'a Catalog,
	/// How the dominant color is found
	options: ClusterOptions,
}

impl Default for Recommender<'static> {
	fn default() -> Self {
		Self::new(Catalog::builtin())
	}
}

impl<'a> Recommender<'a> {
	/// Create a recommender for the given catalog with the default clustering options
	#[must_use]
	pub fn new(catalog: &'a Catalog) -> Self {
		Self { catalog, options: ClusterOptions::default() }
	}

	/// Use the given clustering options
	#[must_use]
	pub fn with_options(mut self, options: ClusterOptions) -> Self {
		self.options = options;
		self
	}

	/// The catalog swatches are looked up in
	#[must_use]
	pub const fn catalog(&self) -> &'a Catalog {
		self.catalog
	}

	/// Recommend swatches for a face image and the given hair and eye colors.
	///
	/// # Errors
	///
	/// - [`Error::MissingInput`] if `image` is `None`
	/// - [`Error::InsufficientData`] or [`Error::InvalidClusterCount`] if clustering cannot run
	/// - [`Error::NoMatch`] if the catalog has no swatches for the combination,
	///   which is an expected outcome rather than a failure
	pub fn recommend(&self, image: Option<&RgbImage>, hair: HairColor, eye: EyeColor) -> Result<Recommendation> {
		let image = image.ok_or(Error::MissingInput)?;
		self.recommend_pixels(&PixelCounts::from_image(image), hair, eye)
	}

	/// Like [`Recommender::recommend`], but for pixels that were already counted
	///
	/// # Errors
	///
	/// See [`Recommender::recommend`].
	pub fn recommend_pixels(&self, pixels: &PixelCounts, hair: HairColor, eye: EyeColor) -> Result<Recommendation> {
		let dominant_color = extract_dominant_color_with(pixels, &self.options)?;
		let undertone = classify_undertone(dominant_color);

		tracing::debug!(?dominant_color, %undertone, %hair, %eye, "classified dominant color");

		let swatches = self.catalog.lookup(undertone, hair, eye);
		if swatches.is_empty() {
			return Err(Error::NoMatch { undertone, hair, eye });
		}

		Ok(Recommendation {
			undertone,
			hair_color: hair,
			eye_color: eye,
			dominant_color,
			swatches: swatches.to_vec(),
		})
	}
}

/// Recommend swatches from the built-in catalog using the default clustering options.
///
/// # Errors
///
/// See [`Recommender::recommend`].
pub fn recommend(image: Option<&RgbImage>, hair: HairColor, eye: EyeColor) -> Result<Recommendation> {
	Recommender::default().recommend(image, hair, eye)
}
