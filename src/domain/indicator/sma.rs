//! Simple Moving Average indicator.
//!
//! SMA(n)[t] = sum(x[t-n+1..=t]) / n
//! Warmup: first (n-1) values are undefined (NaN).

use super::NAN;

/// SMA of the last `period` values of `history`, where the last element of
/// `history` is the current bar. NaN while fewer than `period` values exist.
pub fn sma_at(history: &[f64], period: usize) -> f64 {
    if period == 0 || history.len() < period {
        return NAN;
    }
    let window = &history[history.len() - period..];
    window.iter().sum::<f64>() / period as f64
}

pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    (0..values.len())
        .map(|t| sma_at(&values[..=t], period))
        .collect()
}
