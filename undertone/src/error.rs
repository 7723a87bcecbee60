//! Error types for the recommendation pipeline

use crate::{EyeColor, HairColor, Undertone};
use thiserror::Error;

/// Result type alias for undertone operations
pub type Result<T> = std::result::Result<T, Error>;

/// Every way a recommendation can fail to produce swatches
///
/// None of these are transient. Retrying with the same input gives the same error.
#[derive(Error, Debug)]
pub enum Error {
	/// No image was supplied
	#[error("no image was supplied")]
	MissingInput,

	/// The image has fewer pixels than the requested number of clusters
	#[error("the image has {pixels} pixels, but {clusters} clusters were requested")]
	InsufficientData {
		/// Number of pixels in the image
		pixels: usize,
		/// Requested number of clusters
		clusters: u8,
	},

	/// A cluster count of zero was requested
	#[error("the number of clusters must be at least 1")]
	InvalidClusterCount,

	/// The catalog has no entry for this combination
	#[error("no catalog entry for undertone {undertone}, hair color {hair}, eye color {eye}")]
	NoMatch {
		/// Classified undertone
		undertone: Undertone,
		/// Requested hair color
		hair: HairColor,
		/// Requested eye color
		eye: EyeColor,
	},

	/// Text did not name a known attribute value
	#[error("unknown {kind} \"{value}\"")]
	UnknownAttribute {
		/// The attribute being parsed, e.g. "eye color"
		kind: &'static str,
		/// The text that failed to parse
		value: String,
	},

	/// Catalog JSON could not be parsed
	#[error("invalid catalog: {0}")]
	Catalog(#[from] serde_json::Error),

	/// Catalog file could not be read
	#[error("failed to read the catalog file: {0}")]
	CatalogRead(#[from] std::io::Error),
}

impl Error {
	/// Whether this is the expected "nothing in the catalog" outcome rather than a failure
	#[must_use]
	pub const fn is_no_match(&self) -> bool {
		matches!(self, Self::NoMatch { .. })
	}

	/// Message suitable for showing to the person who supplied the input
	#[must_use]
	pub fn user_message(&self) -> String {
		match self {
			Self::MissingInput => "Please upload an image.".to_owned(),
			Self::NoMatch { .. } => "No matching colors found in the dataset.".to_owned(),
			Self::InsufficientData { pixels, clusters } => format!(
				"The image is too small ({pixels} pixels) for {clusters} clusters. \
				 Please use a larger image or fewer clusters."
			),
			_ => self.to_string(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_messages_for_defined_failures() {
		assert_eq!(Error::MissingInput.user_message(), "Please upload an image.");

		let no_match = Error::NoMatch {
			undertone: Undertone::Neutral,
			hair: HairColor::Black,
			eye: EyeColor::Gray,
		};
		assert!(no_match.is_no_match());
		assert_eq!(no_match.user_message(), "No matching colors found in the dataset.");
	}

	#[test]
	fn other_errors_are_not_no_match() {
		assert!(!Error::MissingInput.is_no_match());
		assert!(!Error::InvalidClusterCount.is_no_match());
		assert!(!Error::InsufficientData { pixels: 2, clusters: 3 }.is_no_match());
	}

	#[test]
	fn unknown_attribute_names_kind_and_value() {
		let e = Error::UnknownAttribute { kind: "eye color", value: "Green".to_owned() };
		assert_eq!(e.to_string(), "unknown eye color \"Green\"");
	}
}
