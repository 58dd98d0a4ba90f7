//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: SMA over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! StdDev is the sample standard deviation (n-1), so n must be at least 2.
//! Warmup: first (n-1) values are undefined in all three bands.

use super::sma::sma_at;
use super::stddev::rolling_std_at;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

/// (upper, middle, lower) at the last element of `history`.
pub fn bollinger_at(history: &[f64], period: usize, mult: f64) -> (f64, f64, f64) {
    let middle = sma_at(history, period);
    let stddev = rolling_std_at(history, period);
    (middle + mult * stddev, middle, middle - mult * stddev)
}

pub fn bollinger(values: &[f64], period: usize, mult: f64) -> BollingerBands {
    let mut bands = BollingerBands {
        upper: Vec::with_capacity(values.len()),
        middle: Vec::with_capacity(values.len()),
        lower: Vec::with_capacity(values.len()),
    };
    for t in 0..values.len() {
        let (upper, middle, lower) = bollinger_at(&values[..=t], period, mult);
        bands.upper.push(upper);
        bands.middle.push(middle);
        bands.lower.push(lower);
    }
    bands
}
