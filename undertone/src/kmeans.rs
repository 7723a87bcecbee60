//! Provides the implementation for (sort) k-means over RGB colors

use crate::{ClusterOptions, PixelCounts};
use palette::Srgb;
use rand::{Rng, SeedableRng};

/// A color as a point in RGB space, with channels in `0.0..=255.0`
type Point = [f32; 3];

/// Convert an 8-bit color to a point in RGB space
fn point(color: Srgb<u8>) -> Point {
	[f32::from(color.red), f32::from(color.green), f32::from(color.blue)]
}

/// Squared Euclidean distance in RGB space
fn squared_distance(x: Point, y: Point) -> f32 {
	let dr = x[0] - y[0];
	let dg = x[1] - y[1];
	let db = x[2] - y[2];
	dr * dr + dg * dg + db * db
}

/// Bookkeeping for each k-means data point
struct PointData {
	/// Center assignment for this data point
	assignment: Vec<u8>,
	/// Weight of each data point used to randomly select starting centroids in k-means++
	weight: Vec<f32>,
}

impl PointData {
	/// Create a [`PointData`] with the given number data points
	fn new(n: usize) -> Self {
		Self {
			assignment: vec![0; n],
			weight: vec![f32::INFINITY; n],
		}
	}

	/// Reset data for the next k-means trial
	fn reset(&mut self) {
		self.assignment.fill(0);
		self.weight.fill(f32::INFINITY);
	}
}

/// Data for each center/centroid
struct CenterData {
	/// The centroid point
	centroid: Vec<Point>,
	/// Per channel sum of all data points in this center
	///
	/// Channels are 8-bit integers, so these sums are exact.
	sum: Vec<[u64; 3]>,
	/// Number of pixels in this center
	count: Vec<u64>,
}

impl CenterData {
	/// Create a [`CenterData`] with the given number of centers
	fn new(k: u8) -> Self {
		let k = usize::from(k);
		Self {
			centroid: Vec::with_capacity(k),
			sum: vec![[0; 3]; k],
			count: vec![0; k],
		}
	}

	/// Reset data for the next k-means trial
	fn reset(&mut self) {
		self.centroid.clear();
		self.sum.fill([0; 3]);
		self.count.fill(0);
	}
}

/// Holds all the state used by k-means
struct KmeansState {
	/// Data for each center
	centers: CenterData,
	/// One fourth of the squared distance between each pairs of centers
	distances: Vec<(u8, f32)>,
	/// Data for each point
	points: PointData,
}

impl KmeansState {
	/// Initialize a new [`KmeansState`] with `k` centers and `n` data points
	fn new(k: u8, n: usize) -> Self {
		Self {
			centers: CenterData::new(k),
			distances: vec![(0, 0.0); usize::from(k) * usize::from(k)],
			points: PointData::new(n),
		}
	}
}

/// Result from running k-means
#[derive(Debug, Clone, PartialEq)]
pub struct KmeansResult {
	/// Weighted sum of squared distances from each pixel to its centroid
	///
	/// A lower variance indicates a tighter clustering.
	pub variance: f64,
	/// Final centroid colors, each channel truncated to an integer
	pub centroids: Vec<Srgb<u8>>,
	/// Number of pixels in each centroid
	pub counts: Vec<u64>,
	/// Number of elapsed iterations
	pub iterations: u32,
}

impl KmeansResult {
	/// Create an empty result, representing that no k-means trials were able to be run
	const fn empty() -> Self {
		Self {
			variance: 0.0,
			centroids: Vec::new(),
			counts: Vec::new(),
			iterations: 0,
		}
	}

	/// Index of the centroid with the most pixels.
	///
	/// Ties go to the lowest index. Returns `None` if there are no centroids.
	#[must_use]
	pub fn majority_index(&self) -> Option<usize> {
		majority_cluster(&self.counts)
	}

	/// The centroid with the most pixels, see [`KmeansResult::majority_index`]
	#[must_use]
	pub fn majority(&self) -> Option<Srgb<u8>> {
		self.majority_index().map(|i| self.centroids[i])
	}
}

/// Index of the largest count, preferring the lowest index among equal counts
fn majority_cluster(counts: &[u64]) -> Option<usize> {
	let mut best: Option<(usize, u64)> = None;
	for (i, &n) in counts.iter().enumerate() {
		match best {
			Some((_, max)) if n <= max => {},
			_ => best = Some((i, n)),
		}
	}
	best.map(|(i, _)| i)
}

/// Choose the starting centroids using the k-means++ algorithm
fn kmeans_plus_plus(
	k: u8,
	rng: &mut impl Rng,
	colors: &[Point],
	centroids: &mut Vec<Point>,
	weights: &mut [f32],
) {
	use rand::{
		distributions::{WeightedError::*, WeightedIndex},
		prelude::Distribution,
	};

	// Pick any random first centroid
	centroids.push(colors[rng.gen_range(0..colors.len())]);

	// Pick each next centroid with a weighted probability based off the squared distance to its closest centroid
	for i in 1..usize::from(k) {
		let centroid = centroids[i - 1];
		for (weight, &color) in weights.iter_mut().zip(colors) {
			*weight = f32::min(*weight, squared_distance(color, centroid));
		}

		match WeightedIndex::new(&*weights) {
			Ok(sampler) => centroids.push(colors[sampler.sample(rng)]),
			Err(AllWeightsZero) => return, // all points exactly match a centroid
			Err(InvalidWeight | NoItem | TooMany) => {
				unreachable!("distances are >= 0 and colors.len() is in 1..=2.pow(24)")
			},
		}
	}
}

/// Initializes the center sums and counts based off the initial assignments
fn compute_initial_sums(pixels: &PixelCounts, centers: &mut CenterData, assignment: &[u8]) {
	for ((color, n), &center) in pixels.pairs().zip(assignment) {
		let i = usize::from(center);
		let sum = &mut centers.sum[i];
		sum[0] += n * u64::from(color.red);
		sum[1] += n * u64::from(color.green);
		sum[2] += n * u64::from(color.blue);
		centers.count[i] += n;
	}
}

/// For each pair of centers, update their distances and sort each center's row by increasing distance
// i and j are < centroids.len() <= u8::MAX
#[allow(clippy::cast_possible_truncation)]
fn update_distances(centroids: &[Point], distances: &mut [(u8, f32)]) {
	let k = centroids.len();
	for i in 0..k {
		let ci = centroids[i];
		distances[i * k + i] = (i as u8, 0.0);
		for j in (i + 1)..k {
			let cj = centroids[j];
			let dist = squared_distance(ci, cj) / 4.0;
			distances[j * k + i] = (i as u8, dist);
			distances[i * k + j] = (j as u8, dist);
		}
	}

	for row in distances[..(k * k)].chunks_exact_mut(k) {
		row.sort_by(|(_, x), (_, y)| f32::total_cmp(x, y));
	}
}

/// Find the closest center to `color`, starting from its current center `center`
fn nearest_center(color: Point, center: u8, centroids: &[Point], distances: &[(u8, f32)]) -> u8 {
	let k = centroids.len();
	let ci = usize::from(center);
	let dist = squared_distance(color, centroids[ci]);

	let mut min_dist = dist;
	let mut min_center = center;
	for &(other_center, half_dist) in &distances[(ci * k + 1)..((ci + 1) * k)] {
		// Every remaining center is at least as far away as the current one
		if dist < half_dist {
			break;
		}

		let other_dist = squared_distance(color, centroids[usize::from(other_center)]);
		if other_dist < min_dist {
			min_dist = other_dist;
			min_center = other_center;
		}
	}

	min_center
}

/// For each data point, update its assigned center
#[cfg(not(feature = "threads"))]
fn update_assignments(
	pixels: &PixelCounts,
	centers: &mut CenterData,
	distances: &[(u8, f32)],
	points: &mut PointData,
) {
	for ((color, n), center) in pixels.pairs().zip(&mut points.assignment) {
		let min_center = nearest_center(point(color), *center, &centers.centroid, distances);

		// Move this point to its new center
		if min_center != *center {
			let r = n * u64::from(color.red);
			let g = n * u64::from(color.green);
			let b = n * u64::from(color.blue);

			let ci = usize::from(*center);
			let old_sum = &mut centers.sum[ci];
			old_sum[0] -= r;
			old_sum[1] -= g;
			old_sum[2] -= b;
			centers.count[ci] -= n;

			let cj = usize::from(min_center);
			let new_sum = &mut centers.sum[cj];
			new_sum[0] += r;
			new_sum[1] += g;
			new_sum[2] += b;
			centers.count[cj] += n;

			*center = min_center;
		}
	}
}

/// For each data point, update its assigned center
#[cfg(feature = "threads")]
fn update_assignments(
	pixels: &PixelCounts,
	centers: &mut CenterData,
	distances: &[(u8, f32)],
	points: &mut PointData,
) {
	use rayon::prelude::*;

	let k = centers.sum.len();
	let num_points = pixels.num_colors();
	let centroids = &centers.centroid;
	let deltas = points
		.assignment
		.par_iter_mut()
		.with_min_len(num_points / rayon::current_num_threads() + 1)
		.zip(&pixels.colors)
		.zip(&pixels.counts)
		.fold_with(
			(vec![[0_i64; 3]; k], vec![0_i64; k]),
			|(mut sums, mut counts), ((center, &color), &n)| {
				let min_center = nearest_center(point(color), *center, centroids, distances);

				// Move this point to its new center
				if min_center != *center {
					#[allow(clippy::cast_possible_wrap)]
					let n = n as i64;
					let r = n * i64::from(color.red);
					let g = n * i64::from(color.green);
					let b = n * i64::from(color.blue);

					let ci = usize::from(*center);
					let old_sum = &mut sums[ci];
					old_sum[0] -= r;
					old_sum[1] -= g;
					old_sum[2] -= b;
					counts[ci] -= n;

					let cj = usize::from(min_center);
					let new_sum = &mut sums[cj];
					new_sum[0] += r;
					new_sum[1] += g;
					new_sum[2] += b;
					counts[cj] += n;

					*center = min_center;
				}

				(sums, counts)
			},
		)
		.collect::<Vec<_>>();

	// Integer deltas make the result independent of how rayon splits the work
	#[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
	for (delta_sums, delta_counts) in deltas {
		for (sum, delta_sum) in centers.sum.iter_mut().zip(&delta_sums) {
			for (channel, &delta) in sum.iter_mut().zip(delta_sum) {
				*channel = (*channel as i64 + delta) as u64;
			}
		}
		for (count, &delta) in centers.count.iter_mut().zip(&delta_counts) {
			let new_count = *count as i64 + delta;
			// Moving every point out of a center cannot make its count negative
			debug_assert!(new_count >= 0);
			*count = new_count as u64;
		}
	}
}

/// The mean of a center, or `None` if it has no pixels
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn mean(sum: [u64; 3], n: u64) -> Option<Point> {
	if n == 0 {
		None
	} else {
		let n = n as f64;
		Some(sum.map(|channel| (channel as f64 / n) as f32))
	}
}

/// For each center, update its centroid using the channel sums and compute deltas
fn update_centroids(rng: &mut impl Rng, centers: &mut CenterData) -> f32 {
	let mut total_delta = 0.0;
	for ((centroid, &n), &sum) in centers.centroid.iter_mut().zip(&centers.count).zip(&centers.sum) {
		// An empty center is moved to a random spot so it can pick up points again
		let new_centroid = mean(sum, n).unwrap_or_else(|| {
			[
				rng.gen_range(0.0..=255.0),
				rng.gen_range(0.0..=255.0),
				rng.gen_range(0.0..=255.0),
			]
		});

		total_delta += squared_distance(*centroid, new_centroid).sqrt();
		*centroid = new_centroid;
	}

	total_delta
}

/// Truncate the exact mean of a center to an 8-bit color
// the mean of 8-bit channels is <= u8::MAX
#[allow(clippy::cast_possible_truncation)]
fn truncated_mean(sum: [u64; 3], n: u64) -> Srgb<u8> {
	let [r, g, b] = sum.map(|channel| (channel / n) as u8);
	Srgb::new(r, g, b)
}

/// Run a trial of sort k-means
fn kmeans(
	pixels: &PixelCounts,
	KmeansState { centers, distances, points }: &mut KmeansState,
	k: u8,
	max_iter: u32,
	convergence: f32,
	seed: u64,
) -> KmeansResult {
	let mut rng = rand_xoshiro::Xoshiro256PlusPlus::seed_from_u64(seed);
	let colors = pixels.colors.iter().copied().map(point).collect::<Vec<_>>();
	kmeans_plus_plus(k, &mut rng, &colors, &mut centers.centroid, &mut points.weight);
	compute_initial_sums(pixels, centers, &points.assignment);

	let mut iterations = 0;
	let mut total_delta = f32::INFINITY;
	while iterations < max_iter && total_delta > convergence {
		update_distances(&centers.centroid, distances);
		update_assignments(pixels, centers, distances, points);
		total_delta = update_centroids(&mut rng, centers);
		iterations += 1;
	}

	let variance = colors
		.iter()
		.zip(&pixels.counts)
		.zip(&points.assignment)
		.map(|((&color, &n), &center)| {
			#[allow(clippy::cast_precision_loss)]
			let n = n as f64;
			n * f64::from(squared_distance(color, centers.centroid[usize::from(center)]))
		})
		.sum();

	let (centroids, counts) = centers
		.sum
		.iter()
		.zip(&centers.count)
		.take(centers.centroid.len())
		.filter(|&(_, &n)| n > 0)
		.map(|(&sum, &n)| (truncated_mean(sum, n), n))
		.unzip();

	centers.reset();
	points.reset();

	KmeansResult { variance, centroids, counts, iterations }
}

/// Run multiple trials of k-means, taking the trial with the lowest variance
///
/// An empty result with no centroids is returned if `pixels` is empty, `options.trials` = 0,
/// or `options.clusters` = 0.
pub fn run(pixels: &PixelCounts, options: &ClusterOptions) -> KmeansResult {
	let &ClusterOptions {
		clusters: k,
		trials,
		convergence_threshold,
		max_iter,
		seed,
	} = options;

	if k == 0 || pixels.colors.is_empty() {
		return KmeansResult::empty();
	}

	let mut state = KmeansState::new(k, pixels.num_colors());

	(0..trials)
		.map(|i| kmeans(pixels, &mut state, k, max_iter, convergence_threshold, seed ^ u64::from(i)))
		.min_by(|x, y| f64::total_cmp(&x.variance, &y.variance))
		.unwrap_or(KmeansResult::empty())
}
