//! The table of recommended swatches for each undertone, hair color, and eye color

use crate::{ColorSample, Error, Result, Undertone};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, path::Path, str::FromStr, sync::OnceLock};

/// The catalog bundled with the crate
const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

/// Implements the canonical spelling, `Display`, and exact `FromStr` for an attribute enum
macro_rules! attribute {
	($name: ident, $kind: literal, [$($variant: ident),+ $(,)?]) => {
		impl $name {
			/// Every value in catalog order
			pub const ALL: &'static [Self] = &[$(Self::$variant),+];

			/// The canonical spelling of this value
			#[must_use]
			pub const fn as_str(self) -> &'static str {
				match self {
					$(Self::$variant => stringify!($variant)),+
				}
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(self.as_str())
			}
		}

		impl FromStr for $name {
			type Err = Error;

			fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
				Self::ALL
					.iter()
					.copied()
					.find(|value| value.as_str() == s)
					.ok_or_else(|| Error::UnknownAttribute { kind: $kind, value: s.to_owned() })
			}
		}
	};
}

/// Hair color picked by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HairColor {
	/// Black hair
	Black,
	/// Brown hair
	Brown,
	/// Blonde hair
	Blonde,
}

attribute!(HairColor, "hair color", [Black, Brown, Blonde]);

/// Eye color picked by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EyeColor {
	/// Black eyes
	Black,
	/// Brown eyes
	Brown,
	/// Gray eyes
	Gray,
	/// Blue eyes
	Blue,
}

attribute!(EyeColor, "eye color", [Black, Brown, Gray, Blue]);

/// (De)serializes a color as an `[r, g, b]` array
pub(crate) mod rgb_triple {
	use crate::ColorSample;
	use serde::{Deserialize, Deserializer, Serialize, Serializer};

	/// Write `[r, g, b]`
	pub fn serialize<S: Serializer>(color: &ColorSample, serializer: S) -> Result<S::Ok, S::Error> {
		[color.red, color.green, color.blue].serialize(serializer)
	}

	/// Read `[r, g, b]`
	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ColorSample, D::Error> {
		let [r, g, b] = <[u8; 3]>::deserialize(deserializer)?;
		Ok(ColorSample::new(r, g, b))
	}
}

/// A named reference color
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Swatch {
	/// Display name, not necessarily unique within an entry
	pub name: String,
	/// The color itself
	#[serde(with = "rgb_triple")]
	pub rgb: ColorSample,
}

/// The swatches recommended for one combination of undertone, hair color, and eye color
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationEntry {
	/// Skin undertone
	pub undertone: Undertone,
	/// Hair color
	pub hair_color: HairColor,
	/// Eye color
	pub eye_color: EyeColor,
	/// Recommended swatches in display order
	pub swatches: Vec<Swatch>,
}

impl RecommendationEntry {
	/// The lookup key of this entry
	#[must_use]
	pub const fn key(&self) -> (Undertone, HairColor, EyeColor) {
		(self.undertone, self.hair_color, self.eye_color)
	}

	/// Swatch names that appear more than once in this entry, in order of first repetition
	#[must_use]
	pub fn duplicate_swatch_names(&self) -> Vec<&str> {
		let mut seen = HashMap::new();
		let mut duplicates = Vec::new();
		for swatch in &self.swatches {
			let count = seen.entry(swatch.name.as_str()).or_insert(0_u32);
			*count += 1;
			if *count == 2 {
				duplicates.push(swatch.name.as_str());
			}
		}
		duplicates
	}
}

/// A read-only table of recommendation entries
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
	/// Entries in authored order
	entries: Vec<RecommendationEntry>,
}

impl Catalog {
	/// The catalog bundled with the crate, parsed on first use
	#[must_use]
	pub fn builtin() -> &'static Self {
		static CATALOG: OnceLock<Catalog> = OnceLock::new();
		CATALOG.get_or_init(|| {
			let catalog = Self::from_json(BUILTIN_CATALOG).expect("bundled catalog is valid JSON");
			tracing::debug!(entries = catalog.len(), "loaded built-in catalog");
			catalog
		})
	}

	/// Create a catalog from entries
	#[must_use]
	pub const fn new(entries: Vec<RecommendationEntry>) -> Self {
		Self { entries }
	}

	/// Parse a catalog from a JSON array of entries
	///
	/// # Errors
	///
	/// Returns [`Error::Catalog`] if the JSON is malformed or does not match the entry schema.
	pub fn from_json(json: &str) -> Result<Self> {
		Ok(serde_json::from_str(json)?)
	}

	/// Read and parse a JSON catalog file
	///
	/// # Errors
	///
	/// Returns [`Error::CatalogRead`] if the file cannot be read,
	/// or [`Error::Catalog`] if its contents cannot be parsed.
	pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
		let json = std::fs::read_to_string(path)?;
		Self::from_json(&json)
	}

	/// All entries in authored order
	#[must_use]
	pub fn entries(&self) -> &[RecommendationEntry] {
		&self.entries
	}

	/// The number of entries
	#[must_use]
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether there are no entries
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// The swatches of the first entry matching all three attributes, or an empty slice
	#[must_use]
	pub fn lookup(&self, undertone: Undertone, hair: HairColor, eye: EyeColor) -> &[Swatch] {
		self.entries
			.iter()
			.find(|entry| entry.key() == (undertone, hair, eye))
			.map(|entry| entry.swatches.as_slice())
			.unwrap_or_default()
	}

	/// Keys that occur in more than one entry, in order of first repetition
	///
	/// Only the first of the duplicated entries is reachable through [`Catalog::lookup`].
	#[must_use]
	pub fn duplicate_keys(&self) -> Vec<(Undertone, HairColor, EyeColor)> {
		let mut seen = HashMap::new();
		let mut duplicates = Vec::new();
		for entry in &self.entries {
			let count = seen.entry(entry.key()).or_insert(0_u32);
			*count += 1;
			if *count == 2 {
				duplicates.push(entry.key());
			}
		}
		duplicates
	}
}
