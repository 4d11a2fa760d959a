//! Nearest-size selection and derivation.
//!
//! Given a set of owned candidate frames and a target size, pick the frame
//! whose width is closest to the target and derive an exactly sized copy.
//! A candidate larger than the target always beats a smaller one, so icons
//! are scaled down from a bigger source rather than blown up from a smaller
//! one; among larger candidates the smallest wins, among smaller ones the
//! largest.

use std::sync::Arc;

use crate::error::{RenderError, RenderResult};
use crate::image_buffer::ImageBuffer;
use crate::raster::RasterOps;

/// Outcome of the candidate scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    /// A candidate already has the target width.
    Exact(usize),
    /// The closest candidate, which must be resized.
    Nearest(usize),
}

impl Fit {
    /// Index of the chosen candidate.
    pub fn index(self) -> usize {
        match self {
            Fit::Exact(i) | Fit::Nearest(i) => i,
        }
    }
}

/// Scan `widths` once and choose a candidate for `target`.
///
/// Returns `None` when there are no candidates.
pub fn select(widths: impl IntoIterator<Item = u32>, target: u32) -> Option<Fit> {
    let mut nearest = i64::MAX;
    let mut chosen = None;

    for (index, width) in widths.into_iter().enumerate() {
        let delta = i64::from(target) - i64::from(width);
        if delta == 0 {
            return Some(Fit::Exact(index));
        }
        // Larger candidates (negative delta) win over any smaller one; within
        // the same side the one closest to zero wins.
        let larger_wins = delta < 0 && (nearest > 0 || nearest < delta);
        let smaller_wins = nearest > 0 && delta < nearest;
        if larger_wins || smaller_wins {
            nearest = delta;
            chosen = Some(index);
        }
    }

    chosen.map(Fit::Nearest)
}

/// Picks and derives the best-fitting image for a requested size.
pub struct NearestFitResolver<'a> {
    ops: &'a dyn RasterOps,
}

impl<'a> NearestFitResolver<'a> {
    /// Create a resolver over the given primitives.
    pub fn new(ops: &'a dyn RasterOps) -> Self {
        Self { ops }
    }

    /// Resolve `candidates` to an image of exactly `size` x `size`.
    ///
    /// An exact-width candidate is returned as is and `on_derived` is not
    /// called. Otherwise the nearest candidate is resized and handed to
    /// `on_derived` (normally a cache insert) before being returned.
    ///
    /// # Errors
    ///
    /// [`RenderError::EmptyCandidateSet`] when `candidates` is empty.
    pub fn resolve<F>(
        &self,
        candidates: &[Arc<ImageBuffer>],
        size: u32,
        on_derived: F,
    ) -> RenderResult<Arc<ImageBuffer>>
    where
        F: FnOnce(u32, &Arc<ImageBuffer>),
    {
        let fit = select(candidates.iter().map(|c| c.width()), size)
            .ok_or(RenderError::EmptyCandidateSet { size })?;

        match fit {
            Fit::Exact(index) => Ok(Arc::clone(&candidates[index])),
            Fit::Nearest(index) => {
                let source = &candidates[index];
                tracing::debug!(from = source.width(), to = size, "deriving nearest-fit icon");
                let derived = Arc::new(self.ops.resize(source, size, size));
                on_derived(size, &derived);
                Ok(derived)
            }
        }
    }
}
