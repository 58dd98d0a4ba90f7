//! RSI (Relative Strength Index).
//!
//! Average gain and average loss are plain means of the last n close-to-close
//! changes (no Wilder smoothing).
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n values are undefined (n changes need n+1 closes).

use super::NAN;

pub fn rsi_at(history: &[f64], period: usize) -> f64 {
    let needed = match period.checked_add(1) {
        Some(needed) if period > 0 && history.len() >= needed => needed,
        _ => return NAN,
    };
    let window = &history[history.len() - needed..];
    let mut gain = 0.0;
    let mut loss = 0.0;
    for pair in window.windows(2) {
        let change = pair[1] - pair[0];
        if change > 0.0 {
            gain += change;
        } else {
            loss -= change;
        }
    }
    let avg_gain = gain / period as f64;
    let avg_loss = loss / period as f64;

    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

pub fn rsi(values: &[f64], period: usize) -> Vec<f64> {
    (0..values.len())
        .map(|t| rsi_at(&values[..=t], period))
        .collect()
}
