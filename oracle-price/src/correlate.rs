//! Sliding the stencils over the conditioned histogram to find the
//! offset, and therefore the price, where they fit best.

use tracing::debug;

use crate::histogram::{Grid, Histogram};
use crate::stencil::{SMOOTH, SPIKE, STENCIL_LEN};

/// The histogram bin for 0.001 BTC. At zero slide the stencil's $100
/// position sits here, i.e. zero slide means a $100 000/BTC price.
const ANCHOR_BIN: usize = 601;

/// Offset of the anchor within the stencil window.
const ANCHOR_OFFSET: usize = 401;

/// Slide bounds: -141 reaches roughly $500k, +200 roughly $5k.
const MIN_SLIDE: i64 = -141;
const MAX_SLIDE: i64 = 201;

/// Weight of the smooth score where it applies.
const SMOOTH_WEIGHT: f64 = 0.65;

/// From this slide onward the Gaussian hump would sit over trimmed bins,
/// so only the spike score is meaningful.
const SMOOTH_CUTOFF: i64 = 150;

/// The stencil-fit price estimate.
#[derive(Clone, Copy, Debug)]
pub struct RoughEstimate {
    /// The interpolated price, in whole USD per BTC.
    pub price_usd: u64,
    /// The winning slide offset.
    pub best_slide: i64,
}

fn window_start(slide: i64) -> usize {
    (ANCHOR_BIN as i64 - ANCHOR_OFFSET as i64 + slide) as usize
}

fn spike_score(histogram: &Histogram, slide: i64) -> f64 {
    let start = window_start(slide);
    (0..STENCIL_LEN)
        .map(|n| histogram.count(start + n) * SPIKE[n])
        .sum()
}

fn smooth_score(histogram: &Histogram, slide: i64) -> f64 {
    let start = window_start(slide);
    (0..STENCIL_LEN)
        .map(|n| histogram.count(start + n) * SMOOTH[n])
        .sum()
}

/// Slide both stencils across the conditioned histogram, score every
/// offset, and interpolate a price between the best offset and its
/// stronger neighbor.
pub fn correlate(histogram: &Histogram, grid: &Grid) -> RoughEstimate {
    let mut best_slide = 0i64;
    let mut best_score = 0.0f64;
    let mut total_score = 0.0f64;

    for slide in MIN_SLIDE..MAX_SLIDE {
        let mut score = spike_score(histogram, slide);
        if slide < SMOOTH_CUTOFF {
            score += SMOOTH_WEIGHT * smooth_score(histogram, slide);
        }
        if score > best_score {
            best_score = score;
            best_slide = slide;
        }
        total_score += score;
    }

    // The spike score alone decides which neighbor shares the weight;
    // the smooth term varies too slowly to distinguish adjacent bins.
    let up_score = spike_score(histogram, best_slide + 1);
    let down_score = spike_score(histogram, best_slide - 1);
    let (neighbor, neighbor_score) = if down_score > up_score {
        (-1, down_score)
    } else {
        (1, up_score)
    };

    let best_price = 100.0 / grid.edge((ANCHOR_BIN as i64 + best_slide) as usize);
    let neighbor_price =
        100.0 / grid.edge((ANCHOR_BIN as i64 + best_slide + neighbor) as usize);

    let mean_score = total_score / (MAX_SLIDE - MIN_SLIDE) as f64;
    let best_weight = best_score - mean_score;
    let neighbor_weight = (neighbor_score - mean_score).abs();
    let price = (best_weight * best_price + neighbor_weight * neighbor_price)
        / (best_weight + neighbor_weight);

    debug!(
        best_slide,
        best_score, neighbor, price, "stencil slide complete"
    );

    RoughEstimate {
        price_usd: price.round() as u64,
        best_slide,
    }
}
