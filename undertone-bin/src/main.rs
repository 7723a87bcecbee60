//! Estimate a skin undertone from a face image and print complementary colors.

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::unreadable_literal
)]

mod cli;

#[allow(clippy::wildcard_imports)]
use cli::*;

use std::{
    fmt::{self, Display},
    path::Path,
    process::ExitCode,
    time::Instant,
};

use clap::Parser;
use colored::Colorize;
use image::{DynamicImage, GenericImageView};
use palette::Srgb;
use tracing::Level;
use undertone::{Catalog, PixelCounts, Recommendation, Recommender};

/// Record the running time of a function and log the elapsed time
macro_rules! time {
    ($name: literal, $func_call: expr) => {{
        let start = Instant::now();
        let result = $func_call;
        tracing::debug!("{} took {}ms", $name, start.elapsed().as_millis());
        result
    }};
}

/// Error cases for the command line tool
#[derive(Debug)]
enum CliError {
    /// Failed to read or decode the image file
    ImageLoad(image::ImageError),
    /// Failed to read or parse the catalog file
    Catalog(undertone::Error),
    /// The pipeline could not produce a recommendation
    Recommend(undertone::Error),
    /// Failed to render the recommendation as JSON
    Json(serde_json::Error),
    /// Failed to build the thread pool
    #[cfg(feature = "threads")]
    ThreadPool(rayon::ThreadPoolBuildError),
}

impl Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CliError::ImageLoad(e) => write!(f, "Failed to load the image file: {e}"),
            CliError::Catalog(e) => write!(f, "Failed to load the catalog: {e}"),
            CliError::Recommend(e) => write!(f, "{}", e.user_message()),
            CliError::Json(e) => write!(f, "Failed to render the recommendation: {e}"),
            #[cfg(feature = "threads")]
            CliError::ThreadPool(e) => write!(f, "Failed to start the thread pool: {e}"),
        }
    }
}

fn main() -> ExitCode {
    let options = Options::parse();

    tracing_subscriber::fmt()
        .with_max_level(if options.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    let result = run_recommend_and_print(&options);

    // Returning Result<_> uses Debug printing instead of Display
    if let Err(e) = result {
        eprintln!("{e}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Builds a thread pool and then runs `recommend_and_print`
#[cfg(feature = "threads")]
fn run_recommend_and_print(options: &Options) -> Result<(), CliError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(usize::from(options.threads))
        .build()
        .map_err(CliError::ThreadPool)?;

    pool.install(|| recommend_and_print(options))
}

/// Runs `recommend_and_print` on a single thread
#[cfg(not(feature = "threads"))]
fn run_recommend_and_print(options: &Options) -> Result<(), CliError> {
    recommend_and_print(options)
}

/// Load the catalog and image, find the recommendation, and print it using the given options
fn recommend_and_print(options: &Options) -> Result<(), CliError> {
    // Input
    let Some(path) = &options.image else {
        return Err(CliError::Recommend(undertone::Error::MissingInput));
    };

    let custom;
    let catalog = if let Some(path) = &options.catalog {
        custom = time!("Catalog loading", load_catalog(path))?;
        &custom
    } else {
        Catalog::builtin()
    };

    let img = time!("Image loading", load_image(path))?;
    let img = generate_thumbnail(img, options.max_pixels).into_rgb8();

    // Processing
    let start = Instant::now();

    let pixels = time!("Preprocessing", PixelCounts::from_image(&img));
    tracing::debug!("Reduced image to {} unique colors", pixels.num_colors());

    let result = Recommender::new(catalog)
        .with_options(options.cluster_options())
        .recommend_pixels(&pixels, options.hair, options.eye);

    tracing::debug!("Recommendation took {}ms in total", start.elapsed().as_millis());

    // Output
    match result {
        Ok(recommendation) => print_recommendation(&recommendation, options),
        Err(e) if e.is_no_match() => {
            // An informational outcome, not a failure
            println!("{}", e.user_message());
            Ok(())
        }
        Err(e) => Err(CliError::Recommend(e)),
    }
}

/// Load and check a catalog file
fn load_catalog(path: &Path) -> Result<Catalog, CliError> {
    let catalog = Catalog::from_json_file(path).map_err(CliError::Catalog)?;

    for (undertone, hair, eye) in catalog.duplicate_keys() {
        tracing::warn!(%undertone, %hair, %eye, "catalog has more than one entry, only the first is used");
    }

    Ok(catalog)
}

/// Load the image at the given path
fn load_image(path: &Path) -> Result<DynamicImage, CliError> {
    image::open(path).map_err(CliError::ImageLoad)
}

/// Create a thumbnail with at most `max_pixels` pixels if the image has more than `max_pixels` pixels
fn generate_thumbnail(image: DynamicImage, max_pixels: u32) -> DynamicImage {
    // The number of pixels should be < u64::MAX, since image dimensions are (u32, u32)
    let (width, height) = image.dimensions();
    let pixels = u64::from(width) * u64::from(height);
    if pixels <= u64::from(max_pixels) {
        tracing::debug!("Skipping image thumbnail since pixels was below max pixels");
        image
    } else {
        // (u64 as f64) only gives innaccurate results for very large u64
        #[allow(clippy::cast_precision_loss)]
        let scale = (f64::from(max_pixels) / pixels as f64).sqrt();

        // multiplying by a positive factor < 1
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (thumb_width, thumb_height) = (
            (f64::from(width) * scale) as u32,
            (f64::from(height) * scale) as u32,
        );

        tracing::debug!("Creating a thumbnail with dimensions {thumb_width}x{thumb_height}");

        time!("Image thumbnail", image.thumbnail(thumb_width, thumb_height))
    }
}

/// Format a color as a `#RRGGBB` hexcode
fn hex(color: Srgb<u8>) -> String {
    format!("#{:02X}{:02X}{:02X}", color.red, color.green, color.blue)
}

/// Format a color as an `(r,g,b)` triple
fn rgb(color: Srgb<u8>) -> String {
    format!("({},{},{})", color.red, color.green, color.blue)
}

/// Print the recommendation based off the provided options
fn print_recommendation(recommendation: &Recommendation, options: &Options) -> Result<(), CliError> {
    let dominant = recommendation.dominant_color;
    tracing::debug!("Dominant color {}", hex(dominant));

    match options.output {
        FormatOutput::Json => {
            let json = serde_json::to_string_pretty(recommendation).map_err(CliError::Json)?;
            println!("{json}");
        }

        FormatOutput::Swatch => {
            print_summary(recommendation);
            print_swatches(recommendation, |color| {
                "   ".on_truecolor(color.red, color.green, color.blue).to_string()
            });
        }

        FormatOutput::Hex => {
            print_summary(recommendation);
            print_swatches(recommendation, |color| colorize(hex(color), color, options.colorize));
        }

        FormatOutput::Rgb => {
            print_summary(recommendation);
            print_swatches(recommendation, |color| colorize(rgb(color), color, options.colorize));
        }
    }

    Ok(())
}

/// The lines describing what a recommendation was made for
fn summary_lines(recommendation: &Recommendation) -> [String; 3] {
    [
        format!("Skin Undertone: {}", recommendation.undertone),
        format!("Hair Color: {}", recommendation.hair_color),
        format!("Eye Color: {}", recommendation.eye_color),
    ]
}

/// Print the undertone, hair color, and eye color of a recommendation
fn print_summary(recommendation: &Recommendation) {
    for line in summary_lines(recommendation) {
        println!("{line}");
    }
}

/// Print one line per swatch: the formatted color followed by its name
fn print_swatches(recommendation: &Recommendation, format: impl Fn(Srgb<u8>) -> String) {
    for swatch in &recommendation.swatches {
        println!("{} {}", format(swatch.rgb), swatch.name);
    }
}

/// Colorize text with the given color
fn colorize(text: String, color: Srgb<u8>, colorize: Option<ColorizeOutput>) -> String {
    match colorize {
        Some(ColorizeOutput::Fg) => text.truecolor(color.red, color.green, color.blue).to_string(),
        Some(ColorizeOutput::Bg) => text.on_truecolor(color.red, color.green, color.blue).to_string(),
        None => text,
    }
}
