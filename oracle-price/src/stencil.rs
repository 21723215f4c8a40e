//! The two fixed stencils the correlator slides over the histogram.
//!
//! Both were calibrated once against years of output distributions and
//! are wire-visible constants of the oracle: recomputing or "improving"
//! them changes every price the system reports. The spike table must stay
//! digit-for-digit as calibrated.

use lazy_static::lazy_static;

/// Stencil width in bins.
pub const STENCIL_LEN: usize = 803;

/// Center of the Gaussian hump of the smooth stencil.
const SMOOTH_MEAN: f64 = 411.0;

/// Standard deviation of the hump, in bins (about one decade).
const SMOOTH_STD_DEV: f64 = 201.0;

/// Peak weight of the hump.
const SMOOTH_SCALE: f64 = 0.00150;

/// Linear tilt that favors the high-amount side of the window.
const SMOOTH_TILT: f64 = 0.000_000_5;

/// Calibrated spike weights: (stencil index, weight). Neighboring indices
/// catch the spread of a popular amount over adjacent bins.
const SPIKE_WEIGHTS: [(usize, f64); 29] = [
    (40, 0.001300198324984352),  // $1
    (141, 0.001676746949820743), // $5
    (201, 0.003468805546942046), // $10
    (202, 0.001991977522512513),
    (236, 0.001905066647961839), // $15
    (261, 0.003341772718156079), // $20
    (262, 0.002588902624584287),
    (296, 0.002577893841190244), // $30
    (297, 0.002733728814200412),
    (340, 0.003076117748975647), // $50
    (341, 0.005613067550103145),
    (342, 0.003088253178535568),
    (400, 0.002918457489366139), // $100
    (401, 0.006174500465286022),
    (402, 0.004417068070043504),
    (403, 0.002628663628020371),
    (436, 0.002858828161543839), // $150
    (461, 0.004097463611984264), // $200
    (462, 0.003345917406120509),
    (496, 0.002521467726855856), // $300
    (497, 0.002784125730361008),
    (541, 0.003792850444811335), // $500
    (601, 0.003688240815848247), // $1000
    (602, 0.002392400117402263),
    (636, 0.001280993059008106), // $1500
    (661, 0.001654665137536031), // $2000
    (662, 0.001395501347054946),
    (741, 0.001154279140906312), // $5000
    (801, 0.000832244504868709), // $10000
];

lazy_static! {
    /// The broad shape of a typical day's output distribution: a Gaussian
    /// hump with a slight upward tilt.
    pub static ref SMOOTH: Vec<f64> = (0..STENCIL_LEN)
        .map(|x| {
            let x = x as f64;
            let hump = (-(x - SMOOTH_MEAN).powi(2) / (2.0 * SMOOTH_STD_DEV * SMOOTH_STD_DEV)).exp();
            SMOOTH_SCALE * hump + SMOOTH_TILT * x
        })
        .collect();

    /// The round-USD spike pattern, zero everywhere except the calibrated
    /// positions.
    pub static ref SPIKE: Vec<f64> = {
        let mut stencil = vec![0.0; STENCIL_LEN];
        for &(index, weight) in SPIKE_WEIGHTS.iter() {
            stencil[index] = weight;
        }
        stencil
    };
}
