//! Rasterizing projected points into a depth image with nearest-wins occlusion.

use depth_types::{DepthImage, INVALID_DEPTH, encode_depth};
use rayon::prelude::*;

use crate::projector::ProjectedPoint;

/// Smallest number of candidates handed to one rayon job.
///
/// Each job owns a full partial image, so this bounds the number of
/// image-sized allocations for large inputs.
pub const PARALLEL_MIN_CHUNK: usize = 8192;

/// Output raster for one frame.
///
/// Every cell starts at [`INVALID_DEPTH`]. A candidate inside the image is
/// encoded and stored if the cell is empty or the new value is strictly
/// smaller than the stored one, so the nearest surface wins and ties keep the
/// first value seen. Candidates outside the image are counted and dropped.
///
/// # Example
///
/// ```
/// use depth_projection::{DepthAccumulator, ProjectedPoint};
///
/// let mut acc = DepthAccumulator::new(20, 20);
/// acc.insert(ProjectedPoint::new(10, 10, 3.0));
/// acc.insert(ProjectedPoint::new(10, 10, 1.5));
/// acc.insert(ProjectedPoint::new(-1, 10, 0.5));
///
/// let image = acc.finish();
/// assert_eq!(image.depth_at(10, 10), Some(1.5));
/// assert_eq!(image.valid_pixel_count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthAccumulator {
    image: DepthImage,
    in_bounds: usize,
    out_of_bounds: usize,
}

impl DepthAccumulator {
    /// Creates an empty accumulator for a `width` x `height` image.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: DepthImage::new(width, height),
            in_bounds: 0,
            out_of_bounds: 0,
        }
    }

    /// Offers one candidate to the raster.
    ///
    /// Returns true if the candidate is now the stored value of its pixel.
    pub fn insert(&mut self, candidate: ProjectedPoint) -> bool {
        let Some((u, v)) = candidate.pixel_in(self.image.width(), self.image.height()) else {
            self.out_of_bounds += 1;
            return false;
        };
        let encoded = encode_depth(candidate.depth);
        if encoded == INVALID_DEPTH {
            // NaN depth; the projector never produces one.
            self.out_of_bounds += 1;
            return false;
        }
        self.in_bounds += 1;

        let Some(cell) = self.image.get_mut(u, v) else {
            return false;
        };
        if *cell == INVALID_DEPTH || encoded < *cell {
            *cell = encoded;
            true
        } else {
            false
        }
    }

    /// Offers every candidate of an iterator.
    pub fn extend<I: IntoIterator<Item = ProjectedPoint>>(&mut self, candidates: I) {
        for candidate in candidates {
            self.insert(candidate);
        }
    }

    /// Folds another partial raster of the same size into this one.
    ///
    /// Cells combine with the same rule as [`DepthAccumulator::insert`]: the
    /// smaller non-zero value wins, ties keep `self`.
    pub fn merge(&mut self, other: &Self) {
        debug_assert_eq!(self.image.width(), other.image.width());
        debug_assert_eq!(self.image.height(), other.image.height());

        for (mine, &theirs) in self.image.data_mut().iter_mut().zip(other.image.data()) {
            if theirs != INVALID_DEPTH && (*mine == INVALID_DEPTH || theirs < *mine) {
                *mine = theirs;
            }
        }
        self.in_bounds += other.in_bounds;
        self.out_of_bounds += other.out_of_bounds;
    }

    /// Number of candidates that landed inside the image.
    #[must_use]
    pub const fn in_bounds(&self) -> usize {
        self.in_bounds
    }

    /// Number of candidates dropped for falling outside the image.
    #[must_use]
    pub const fn out_of_bounds(&self) -> usize {
        self.out_of_bounds
    }

    /// Number of pixels currently holding a depth.
    #[must_use]
    pub fn written(&self) -> usize {
        self.image.valid_pixel_count()
    }

    /// Borrows the raster built so far.
    #[must_use]
    pub const fn image(&self) -> &DepthImage {
        &self.image
    }

    /// Consumes the accumulator and returns the finished image.
    #[must_use]
    pub fn finish(self) -> DepthImage {
        self.image
    }
}

/// Rasterizes candidates sequentially.
#[must_use]
pub fn accumulate<I>(width: u32, height: u32, candidates: I) -> DepthImage
where
    I: IntoIterator<Item = ProjectedPoint>,
{
    let mut acc = DepthAccumulator::new(width, height);
    acc.extend(candidates);
    acc.finish()
}

/// Rasterizes candidates on the rayon thread pool.
///
/// Each job fills its own partial raster; partials are merged pairwise with
/// the nearest-wins rule. The image is identical to [`accumulate`] on the
/// same candidates.
#[must_use]
pub fn accumulate_parallel(width: u32, height: u32, candidates: &[ProjectedPoint]) -> DepthImage {
    candidates
        .par_iter()
        .with_min_len(PARALLEL_MIN_CHUNK)
        .fold(
            || DepthAccumulator::new(width, height),
            |mut acc, candidate| {
                acc.insert(*candidate);
                acc
            },
        )
        .reduce(
            || DepthAccumulator::new(width, height),
            |mut left, right| {
                left.merge(&right);
                left
            },
        )
        .finish()
}
