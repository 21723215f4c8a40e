//! Refining the stencil fit into the final price by clustering the
//! per-output implied prices.

use std::collections::BTreeSet;

use lazy_static::lazy_static;
use tracing::debug;

use crate::{OutputSample, PriceError};

/// The round USD amounts an output is tested against.
const USD_REFERENCE: [f64; 14] = [
    5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 40.0, 50.0, 100.0, 150.0, 200.0, 300.0, 500.0, 1000.0,
];

/// How far around `usd / rough_price` an output may sit and still be
/// treated as that USD amount.
const CAPTURE_RANGE: f64 = 0.25;

/// Outputs this close to a round BTC/satoshi value are denominated in
/// BTC, whatever the price makes them look like in USD.
const MICRO_ROUND_RANGE: f64 = 0.0001;

/// The window, relative to the current center, the cluster is re-located
/// in on every iteration.
const RECENTER_RANGE: f64 = 0.05;

/// The wider window the reported dispersion is measured in.
const DISPERSION_RANGE: f64 = 0.10;

lazy_static! {
    /// Round satoshi/BTC amounts, densely enumerated per decade: every
    /// 1e-5 BTC below 1e-3, every 1e-4 below 1e-2, and so on up to 1 BTC.
    static ref MICRO_ROUND: Vec<f64> = {
        let mut values = Vec::with_capacity(365);
        values.extend((5..10).map(|i| i as f64 * 1e-5));
        values.extend((10..100).map(|i| i as f64 * 1e-5));
        values.extend((10..100).map(|i| i as f64 * 1e-4));
        values.extend((10..100).map(|i| i as f64 * 1e-3));
        values.extend((10..100).map(|i| i as f64 * 1e-2));
        values
    };
}

/// One implied-price observation: "this output is `usd` dollars, so the
/// price was `usd / amount`".
#[derive(Clone, Copy, Debug)]
pub struct PriceSample {
    /// The implied BTC/USD price.
    pub price: f64,
    /// The output amount that implied it, in BTC.
    pub amount_btc: f64,
    /// The height of the block the output appeared in.
    pub height: oracle_chain::block::Height,
    /// The block's header time.
    pub time: chrono::DateTime<chrono::Utc>,
}

/// The refined price cluster.
#[derive(Clone, Copy, Debug)]
pub struct Refined {
    /// The fixed-point central price, in USD per BTC.
    pub central: f64,
    /// Median absolute deviation around the center, measured in the
    /// wider dispersion window.
    pub mad: f64,
    /// The reporting band as a fraction of the price, clamped to
    /// `[0.05, 0.20]`.
    pub band: f64,
}

impl Refined {
    /// The reported integer price.
    pub fn price_usd(&self) -> u64 {
        self.central.round() as u64
    }
}

fn near_micro_round(amount: f64) -> bool {
    MICRO_ROUND.iter().any(|&round| {
        round * (1.0 - MICRO_ROUND_RANGE) < amount && amount < round * (1.0 + MICRO_ROUND_RANGE)
    })
}

/// Convert qualifying outputs into implied-price samples around the rough
/// estimate.
///
/// An output within ±25% of some round USD amount (at the rough price)
/// yields one sample per matching amount; the refinement window sorts out
/// which interpretation was right. Outputs sitting on round satoshi
/// amounts are excluded entirely.
pub fn implied_samples(outputs: &[OutputSample], rough_price: f64) -> Vec<PriceSample> {
    let mut samples = Vec::new();
    for output in outputs {
        for &usd in USD_REFERENCE.iter() {
            let expected = usd / rough_price;
            let low = expected * (1.0 - CAPTURE_RANGE);
            let high = expected * (1.0 + CAPTURE_RANGE);
            if low < output.amount_btc && output.amount_btc < high {
                if near_micro_round(output.amount_btc) {
                    continue;
                }
                samples.push(PriceSample {
                    price: usd / output.amount_btc,
                    amount_btc: output.amount_btc,
                    height: output.height,
                    time: output.time,
                });
            }
        }
    }
    debug!(
        outputs = outputs.len(),
        samples = samples.len(),
        "implied-price samples collected"
    );
    samples
}

/// The sample minimizing total absolute deviation to the others within
/// `(low, high)`, plus the median absolute deviation around it.
///
/// With sorted prices and prefix sums the L1 cost of every candidate
/// falls out in one pass, so this is O(n log n) in the window size.
fn central_output(prices: &[f64], low: f64, high: f64) -> Option<(f64, f64)> {
    let mut window: Vec<f64> = prices
        .iter()
        .copied()
        .filter(|p| low < *p && *p < high)
        .collect();
    if window.is_empty() {
        return None;
    }
    window.sort_by(|a, b| a.partial_cmp(b).expect("prices are finite"));

    let mut prefix = Vec::with_capacity(window.len());
    let mut running = 0.0;
    for &price in &window {
        running += price;
        prefix.push(running);
    }
    let total = running;
    let n = window.len();

    let mut best_index = 0;
    let mut best_cost = f64::INFINITY;
    for i in 0..n {
        let left_sum = if i > 0 { prefix[i - 1] } else { 0.0 };
        let right_sum = total - prefix[i];
        let cost = (window[i] * i as f64 - left_sum) + (right_sum - window[i] * (n - 1 - i) as f64);
        if cost < best_cost {
            best_cost = cost;
            best_index = i;
        }
    }
    let center = window[best_index];

    let mut deviations: Vec<f64> = window.iter().map(|p| (p - center).abs()).collect();
    deviations.sort_by(|a, b| a.partial_cmp(b).expect("deviations are finite"));
    let m = deviations.len();
    let mad = if m % 2 == 0 {
        0.5 * (deviations[m / 2 - 1] + deviations[m / 2])
    } else {
        deviations[m / 2]
    };
    Some((center, mad))
}

/// Iteratively re-center a ±5% window on its own price cluster until the
/// center reaches a fixed point, then measure dispersion in a ±10%
/// window.
///
/// Each center is added to a seen-set and the loop halts as soon as a
/// center repeats, so termination is guaranteed even if the window cycles
/// between two clusters.
pub fn refine(samples: &[PriceSample], rough_price: f64) -> Result<Refined, PriceError> {
    let prices: Vec<f64> = samples.iter().map(|s| s.price).collect();

    let (mut central, _) = central_output(
        &prices,
        rough_price * (1.0 - RECENTER_RANGE),
        rough_price * (1.0 + RECENTER_RANGE),
    )
    .ok_or(PriceError::NoQualifyingOutputs)?;

    // f64 bit patterns as set keys: centers are exact sample values, so
    // equality (not tolerance) is the right fixed-point test.
    let mut seen = BTreeSet::new();
    seen.insert(central.to_bits());
    loop {
        let (next, _) = central_output(
            &prices,
            central * (1.0 - RECENTER_RANGE),
            central * (1.0 + RECENTER_RANGE),
        )
        .ok_or(PriceError::NoQualifyingOutputs)?;
        central = next;
        if !seen.insert(central.to_bits()) {
            break;
        }
    }

    let (_, mad) = central_output(
        &prices,
        central * (1.0 - DISPERSION_RANGE),
        central * (1.0 + DISPERSION_RANGE),
    )
    .ok_or(PriceError::NoQualifyingOutputs)?;

    let dispersion = mad / (central * 2.0 * DISPERSION_RANGE);
    let band = reporting_band(dispersion);

    debug!(central, mad, band, "refinement converged");
    Ok(Refined { central, mad, band })
}

/// Map measured dispersion onto the reporting band, clamped to [5%, 20%].
///
/// The line is calibrated so a dispersion of 0.17 reports the tight 5%
/// band and noisier days widen from there.
fn reporting_band(dispersion: f64) -> f64 {
    let slope = (0.15 - 0.05) / (0.20 - 0.17);
    let band = 0.05 + (dispersion - 0.17) * slope;
    band.max(0.05).min(0.20)
}
