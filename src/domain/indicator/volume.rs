//! Volume indicators.
//!
//! VOLUME_SMA(n)[t] = mean(volume[t-n+1..=t])
//! VOLUME_RATIO(n)[t] = volume[t] / VOLUME_SMA(n)[t]
//!
//! The ratio is undefined during warmup and when the rolling mean is 0.

use super::sma::{sma, sma_at};
use super::NAN;

pub fn volume_sma(volumes: &[f64], period: usize) -> Vec<f64> {
    sma(volumes, period)
}

pub fn volume_ratio_at(history: &[f64], period: usize) -> f64 {
    let mean = sma_at(history, period);
    match history.last() {
        Some(&current) if mean > 0.0 => current / mean,
        _ => NAN,
    }
}

pub fn volume_ratio(volumes: &[f64], period: usize) -> Vec<f64> {
    (0..volumes.len())
        .map(|t| volume_ratio_at(&volumes[..=t], period))
        .collect()
}
