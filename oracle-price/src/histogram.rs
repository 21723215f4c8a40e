//! The fixed logarithmic histogram the price signal lives in.

use tracing::debug;

use crate::PriceError;

/// Total number of bins: a zero bin, then 200 bins per decade across the
/// twelve decades starting at 1e-6 BTC.
pub const BINS: usize = 2401;

/// Bins per factor-of-ten of output amount.
const BINS_PER_DECADE: f64 = 200.0;

/// The exponent of the smallest bin edge above zero.
const FIRST_EXPONENT: i32 = -6;

/// Outputs at or below 10 000 sats carry dust and fee noise; everything
/// up to this bin is zeroed before fitting.
const TRIM_LOW: usize = 200;

/// Outputs of 10 BTC and more are whale movements; this bin onward is
/// zeroed before fitting.
const TRIM_HIGH: usize = 1601;

/// Conditioned bin mass is clipped here so no single spike can dominate
/// the stencil fit. Chosen by historical testing.
const CLIP: f64 = 0.008;

/// Bins holding round-BTC amounts (1k sats through 1 BTC). Their spikes
/// are denominated in BTC, not USD, so they would mislead the fit; each
/// is replaced by the mean of its neighbors. When the BTC price is itself
/// round these bins coincide with round USD and the neighbors carry the
/// shape, which is why they are smoothed rather than zeroed.
const ROUND_BTC_BINS: [usize; 18] = [
    201, 401, 461, 496, 540, 601, 661, 696, 740, 801, 861, 896, 940, 1001, 1061, 1096, 1140, 1201,
];

/// The bin boundaries, in BTC.
///
/// `edge[0]` is 0.0 and `edge[1 + 200·(e+6) + b]` is `10^(e + b/200)`.
/// An amount lands in the largest bin whose edge does not exceed it.
#[derive(Clone, Debug)]
pub struct Grid {
    edges: Vec<f64>,
}

impl Default for Grid {
    fn default() -> Grid {
        Grid::new()
    }
}

impl Grid {
    pub fn new() -> Grid {
        let mut edges = Vec::with_capacity(BINS);
        edges.push(0.0);
        for exponent in FIRST_EXPONENT..FIRST_EXPONENT + 12 {
            for b in 0..200 {
                edges.push(10f64.powf(exponent as f64 + b as f64 / BINS_PER_DECADE));
            }
        }
        debug_assert_eq!(edges.len(), BINS);
        Grid { edges }
    }

    /// The lower boundary of bin `index`, in BTC.
    pub fn edge(&self, index: usize) -> f64 {
        self.edges[index]
    }

    /// The bin an output of `amount` BTC lands in, or `None` when the
    /// amount is outside the modeled range.
    pub fn bin_for(&self, amount: f64) -> Option<usize> {
        if amount <= 1e-5 || amount >= 1e5 {
            return None;
        }
        // A log10 guess, corrected by scanning: floating point puts the
        // guess within a bin of the truth, and the scan makes the
        // grid-edge comparison authoritative.
        let mut k =
            (BINS_PER_DECADE * (amount.log10() - FIRST_EXPONENT as f64)) as usize + 1;
        k = k.min(BINS - 1);
        while k < BINS && self.edges[k] <= amount {
            k += 1;
        }
        while self.edges[k - 1] > amount {
            k -= 1;
        }
        Some(k - 1)
    }
}

/// Bin counts parallel to [`Grid`], accumulated raw and then conditioned
/// in place for the stencil fit.
#[derive(Clone, Debug)]
pub struct Histogram {
    counts: Vec<f64>,
}

impl Default for Histogram {
    fn default() -> Histogram {
        Histogram::new()
    }
}

impl Histogram {
    pub fn new() -> Histogram {
        Histogram {
            counts: vec![0.0; BINS],
        }
    }

    /// Count one output in `bin`.
    pub fn record(&mut self, bin: usize) {
        self.counts[bin] += 1.0;
    }

    /// The conditioned (or raw) mass at `bin`.
    pub fn count(&self, bin: usize) -> f64 {
        self.counts[bin]
    }

    /// Total raw mass across all bins. Meaningful before conditioning.
    pub fn raw_total(&self) -> f64 {
        self.counts.iter().sum()
    }

    /// Prepare the raw counts for stencil correlation: trim the outer
    /// ranges, smooth the round-BTC spikes, normalize to unit mass, and
    /// clip extremes.
    pub fn condition(&mut self) -> Result<(), PriceError> {
        for count in &mut self.counts[..=TRIM_LOW] {
            *count = 0.0;
        }
        for count in &mut self.counts[TRIM_HIGH..] {
            *count = 0.0;
        }

        for &bin in ROUND_BTC_BINS.iter() {
            self.counts[bin] = 0.5 * (self.counts[bin - 1] + self.counts[bin + 1]);
        }

        let total: f64 = self.counts[TRIM_LOW + 1..TRIM_HIGH].iter().sum();
        if total == 0.0 {
            return Err(PriceError::EmptyHistogram);
        }
        debug!(total, "normalizing histogram");

        for count in &mut self.counts[TRIM_LOW + 1..TRIM_HIGH] {
            *count /= total;
            if *count > CLIP {
                *count = CLIP;
            }
        }
        Ok(())
    }
}
