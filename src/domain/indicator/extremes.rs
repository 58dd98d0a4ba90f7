//! Rolling extremes.
//!
//! PRIOR_HIGH(n)[t] = max(high[t-n..t]), i.e. the highest high of the n bars
//! strictly before t. Warmup: first n values are undefined.

use super::NAN;

pub fn prior_high_at(history: &[f64], period: usize) -> f64 {
    match period.checked_add(1) {
        Some(needed) if period > 0 && history.len() >= needed => {}
        _ => return NAN,
    }
    let end = history.len() - 1;
    history[end - period..end]
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max)
}

pub fn prior_high(highs: &[f64], period: usize) -> Vec<f64> {
    (0..highs.len())
        .map(|t| prior_high_at(&highs[..=t], period))
        .collect()
}
