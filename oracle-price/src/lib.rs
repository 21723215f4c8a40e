//! The price-inference pipeline's statistics: histogram accumulation,
//! stencil correlation, and the cluster refinement that produces the
//! final USD price.
//!
//! The insight the whole crate rests on: a noticeable fraction of on-chain
//! outputs are denominated in round USD amounts, and on a logarithmic BTC
//! axis those amounts form spikes whose horizontal position is set by the
//! day's exchange rate. Finding the spikes finds the price, with no
//! external feed involved.

mod correlate;
mod error;
mod filter;
mod histogram;
mod refine;
mod stencil;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::info;

use oracle_chain::block::{Block, Height};

pub use correlate::{correlate, RoughEstimate};
pub use error::PriceError;
pub use filter::TxFilter;
pub use histogram::{Grid, Histogram, BINS};
pub use refine::{implied_samples, refine, PriceSample, Refined};

/// One output that passed the suitability filter, retained for the
/// refiner and for rendering.
#[derive(Clone, Copy, Debug)]
pub struct OutputSample {
    /// The output amount in BTC.
    pub amount_btc: f64,
    /// The height of the containing block.
    pub height: Height,
    /// The containing block's header time.
    pub time: DateTime<Utc>,
}

/// Which blocks a price was inferred over.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub enum PriceWindow {
    /// Every block of one UTC day.
    Day {
        date: NaiveDate,
        first: Height,
        last: Height,
    },
    /// The most recent 144 settled blocks.
    Recent { first: Height, last: Height },
}

/// The oracle's answer for one window of blocks.
#[derive(Clone, Debug, Serialize)]
pub struct PriceResult {
    /// The inferred exchange rate, in whole USD per BTC.
    pub price_usd: u64,
    /// Relative dispersion of the price cluster, as a fraction (0.05 is
    /// the tightest band reported, 0.20 the widest).
    pub dispersion: f64,
    /// The block window the price covers.
    pub window: PriceWindow,
    /// How many implied-price samples backed the estimate.
    pub samples: usize,
}

/// Accumulates filtered outputs from a day's blocks into the histogram
/// and the retained sample list.
///
/// Usage is two-pass, because the same-day-reuse rule depends on the
/// complete set of the day's txids: feed every block to
/// [`Accumulator::observe`] first, then again to [`Accumulator::record`].
#[derive(Debug, Default)]
pub struct Accumulator {
    grid: Grid,
    histogram: Histogram,
    filter: TxFilter,
    outputs: Vec<OutputSample>,
}

impl Accumulator {
    pub fn new() -> Accumulator {
        Accumulator::default()
    }

    /// First pass: register every txid of the day.
    pub fn observe(&mut self, block: &Block) {
        for tx in &block.transactions {
            self.filter.observe(tx);
        }
    }

    /// Second pass: run the filter and collect qualifying outputs.
    pub fn record(&mut self, height: Height, block: &Block) {
        let time = block.header.time;
        for tx in &block.transactions {
            if !self.filter.admits(tx) {
                continue;
            }
            for output in &tx.outputs {
                let amount_btc = output.value.to_btc();
                if let Some(bin) = self.grid.bin_for(amount_btc) {
                    self.histogram.record(bin);
                    self.outputs.push(OutputSample {
                        amount_btc,
                        height,
                        time,
                    });
                }
            }
        }
    }

    /// Run the estimation over everything recorded.
    pub fn estimate(self) -> Result<Estimate, PriceError> {
        let Accumulator {
            grid,
            mut histogram,
            outputs,
            ..
        } = self;

        info!(outputs = outputs.len(), "conditioning histogram");
        histogram.condition()?;

        let rough = correlate(&histogram, &grid);
        info!(rough = rough.price_usd, slide = rough.best_slide, "stencil fit complete");

        let samples = implied_samples(&outputs, rough.price_usd as f64);
        let refined = refine(&samples, rough.price_usd as f64)?;
        info!(price = refined.price_usd(), samples = samples.len(), "price cluster refined");

        Ok(Estimate {
            rough,
            refined,
            outputs,
            samples,
        })
    }
}

/// Everything the pipeline learned about one window of blocks.
#[derive(Clone, Debug)]
pub struct Estimate {
    /// The stencil-fit estimate the refiner started from.
    pub rough: RoughEstimate,
    /// The refined price cluster.
    pub refined: Refined,
    /// Every output that entered the histogram.
    pub outputs: Vec<OutputSample>,
    /// The per-output implied prices backing the refinement.
    pub samples: Vec<PriceSample>,
}

impl Estimate {
    /// Package the estimate for reporting over the given window.
    pub fn into_result(self, window: PriceWindow) -> PriceResult {
        PriceResult {
            price_usd: self.refined.price_usd(),
            dispersion: self.refined.band,
            window,
            samples: self.samples.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use oracle_test::synthetic;

    use super::*;

    fn accumulate_day(day: &[synthetic::SyntheticBlock]) -> Accumulator {
        let blocks: Vec<Block> = day
            .iter()
            .map(|b| Block::parse(Bytes::from(b.payload.clone())).expect("synthetic block parses"))
            .collect();

        let mut acc = Accumulator::new();
        for block in &blocks {
            acc.observe(block);
        }
        for (meta, block) in day.iter().zip(&blocks) {
            acc.record(Height(meta.height), block);
        }
        acc
    }

    #[test]
    fn recovers_the_denomination_price() {
        oracle_test::init();

        let day = synthetic::price_day(63_000.0, 880_000, 1_736_899_200, 6);
        let estimate = accumulate_day(&day).estimate().expect("day has signal");

        // The rough fit lands within a few bins of the true rate and the
        // cluster refinement tightens onto it.
        let rough = estimate.rough.price_usd as f64;
        assert!((rough - 63_000.0).abs() / 63_000.0 < 0.05, "rough = {}", rough);

        let price = estimate.refined.price_usd();
        assert!(
            (62_000..=64_000).contains(&price),
            "refined price = {}",
            price
        );
        assert!(estimate.samples.len() > 1_000);
        assert!(estimate.refined.band >= 0.05 && estimate.refined.band <= 0.20);
    }

    #[test]
    fn estimation_is_deterministic() {
        let day = synthetic::price_day(63_000.0, 880_000, 1_736_899_200, 6);
        let a = accumulate_day(&day).estimate().expect("day has signal");
        let b = accumulate_day(&day).estimate().expect("day has signal");

        assert_eq!(a.rough.best_slide, b.rough.best_slide);
        assert_eq!(a.rough.price_usd, b.rough.price_usd);
        assert_eq!(a.refined.price_usd(), b.refined.price_usd());
        assert_eq!(a.samples.len(), b.samples.len());
    }

    #[test]
    fn coinbase_only_day_has_no_signal() {
        let day = synthetic::coinbase_only_day(880_000, 1_736_899_200, 6);
        match accumulate_day(&day).estimate() {
            Err(PriceError::EmptyHistogram) => {}
            other => panic!("expected EmptyHistogram, got {:?}", other),
        }
    }

    #[test]
    fn no_output_is_counted_twice() {
        let day = synthetic::price_day(63_000.0, 880_000, 1_736_899_200, 2);
        let acc = accumulate_day(&day);

        // Every retained sample entered exactly one histogram bin, so the
        // raw bin mass must equal the sample count.
        let total: f64 = acc.histogram.raw_total();
        assert_eq!(total as usize, acc.outputs.len());
    }
}
