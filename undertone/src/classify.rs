//! Buckets a representative skin color into an undertone

use crate::{ColorSample, Error};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Skin color temperature derived from a representative color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Undertone {
	/// Red dominates green, which dominates blue
	Warm,
	/// Blue dominates both red and green
	Cool,
	/// Everything else, including every tie
	Neutral,
}

impl Undertone {
	/// All undertones in catalog order
	pub const ALL: [Self; 3] = [Self::Warm, Self::Cool, Self::Neutral];

	/// The canonical spelling of this undertone
	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Warm => "Warm",
			Self::Cool => "Cool",
			Self::Neutral => "Neutral",
		}
	}

	/// Classify a single color.
	///
	/// Warm requires `r > g > b` strictly, and Cool requires `b > r` and `b > g`.
	/// Any other ordering, including a tie on any pair of channels, is Neutral.
	#[must_use]
	pub fn classify(color: ColorSample) -> Self {
		let (r, g, b) = (color.red, color.green, color.blue);
		if r > g && g > b {
			Self::Warm
		} else if b > r && b > g {
			Self::Cool
		} else {
			Self::Neutral
		}
	}
}

impl fmt::Display for Undertone {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Undertone {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|undertone| undertone.as_str() == s)
			.ok_or_else(|| Error::UnknownAttribute { kind: "undertone", value: s.to_owned() })
	}
}

/// Classify the undertone of a single color
#[must_use]
pub fn classify_undertone(color: ColorSample) -> Undertone {
	Undertone::classify(color)
}

/// Classify each color independently, preserving order
#[cfg(not(feature = "threads"))]
#[must_use]
pub fn classify_undertone_batch(colors: &[ColorSample]) -> Vec<Undertone> {
	colors.iter().map(|&color| Undertone::classify(color)).collect()
}

/// Classify each color independently, preserving order
#[cfg(feature = "threads")]
#[must_use]
pub fn classify_undertone_batch(colors: &[ColorSample]) -> Vec<Undertone> {
	use rayon::prelude::*;

	colors.par_iter().map(|&color| Undertone::classify(color)).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use palette::Srgb;

	fn classify(r: u8, g: u8, b: u8) -> Undertone {
		classify_undertone(Srgb::new(r, g, b))
	}

	#[test]
	fn edge_cases() {
		assert_eq!(classify(255, 200, 150), Undertone::Warm);
		assert_eq!(classify(150, 200, 255), Undertone::Cool);
		assert_eq!(classify(200, 200, 200), Undertone::Neutral);
		assert_eq!(classify(180, 175, 170), Undertone::Warm);
		assert_eq!(classify(170, 175, 180), Undertone::Cool);
		assert_eq!(classify(180, 180, 180), Undertone::Neutral);
	}

	#[test]
	fn warm_needs_strict_ordering() {
		// r > g and r > b is not enough
		assert_eq!(classify(200, 100, 150), Undertone::Neutral);
		assert_eq!(classify(200, 200, 100), Undertone::Neutral);
		assert_eq!(classify(200, 100, 100), Undertone::Neutral);
		assert_eq!(classify(201, 200, 199), Undertone::Warm);
	}

	#[test]
	fn blue_ties_are_neutral() {
		assert_eq!(classify(100, 200, 200), Undertone::Neutral);
		assert_eq!(classify(200, 100, 200), Undertone::Neutral);
		assert_eq!(classify(0, 0, 1), Undertone::Cool);
		assert_eq!(classify(0, 0, 0), Undertone::Neutral);
		assert_eq!(classify(255, 255, 255), Undertone::Neutral);
	}

	fn grid() -> Vec<ColorSample> {
		let range = (0..=u8::MAX).step_by(5);
		let mut colors = Vec::new();

		for r in range.clone() {
			for g in range.clone() {
				for b in range.clone() {
					colors.push(Srgb::new(r, g, b));
				}
			}
		}

		colors
	}

	#[test]
	fn matches_literal_rule_over_grid() {
		for color in grid() {
			let (r, g, b) = (color.red, color.green, color.blue);
			let expected = if r > g && g > b {
				Undertone::Warm
			} else if b > r && b > g {
				Undertone::Cool
			} else {
				Undertone::Neutral
			};
			assert_eq!(classify_undertone(color), expected, "{color:?}");
		}
	}

	#[test]
	fn batch_matches_single() {
		let colors = grid();
		let expected = colors.iter().map(|&c| classify_undertone(c)).collect::<Vec<_>>();
		assert_eq!(classify_undertone_batch(&colors), expected);
	}

	#[test]
	fn batch_of_nothing() {
		assert!(classify_undertone_batch(&[]).is_empty());
	}

	#[test]
	fn parse_canonical_spelling() {
		for undertone in Undertone::ALL {
			assert_eq!(undertone.to_string().parse::<Undertone>().ok(), Some(undertone));
		}
		assert!("warm".parse::<Undertone>().is_err());
	}
}
