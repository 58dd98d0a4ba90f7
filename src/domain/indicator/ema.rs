//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with the SMA of the first n defined inputs, then
//! EMA[t] = x[t]*k + EMA[t-1]*(1-k).
//! Warmup: first (n-1) defined inputs produce NaN. NaN inputs are skipped, so
//! an EMA can be layered on top of another indicator that has its own warmup.

use super::NAN;

/// Incremental EMA. Each `update` sees only the current input, so the output
/// at bar t depends on bars `..=t` only.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    k: f64,
    seed_sum: f64,
    seen: usize,
    value: f64,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Ema {
            period,
            k: 2.0 / (period as f64 + 1.0),
            seed_sum: 0.0,
            seen: 0,
            value: NAN,
        }
    }

    pub fn update(&mut self, x: f64) -> f64 {
        if self.period == 0 || x.is_nan() {
            return NAN;
        }
        self.seen += 1;
        if self.seen < self.period {
            self.seed_sum += x;
            NAN
        } else if self.seen == self.period {
            self.seed_sum += x;
            self.value = self.seed_sum / self.period as f64;
            self.value
        } else {
            self.value = x * self.k + self.value * (1.0 - self.k);
            self.value
        }
    }
}

pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let mut state = Ema::new(period);
    values.iter().map(|&x| state.update(x)).collect()
}
