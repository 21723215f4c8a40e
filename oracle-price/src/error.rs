use thiserror::Error;

/// An error from the price-inference statistics.
#[derive(Error, Debug)]
pub enum PriceError {
    /// No output survived the filters, so there is no distribution to fit.
    #[error("no qualifying outputs in the window; cannot infer a price")]
    EmptyHistogram,

    /// The stencil fit produced a price, but no output implied a price
    /// near it.
    #[error("no implied-price samples near the rough estimate")]
    NoQualifyingOutputs,
}
