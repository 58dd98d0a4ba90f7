//! Rolling standard deviation.
//!
//! Sample standard deviation (divides by n-1) over the trailing n values.
//! Warmup: first (n-1) values are undefined. A window of 1 is always
//! undefined since the sample deviation needs two points.

use super::NAN;

pub fn rolling_std_at(history: &[f64], period: usize) -> f64 {
    if period < 2 || history.len() < period {
        return NAN;
    }
    let window = &history[history.len() - period..];
    let mean = window.iter().sum::<f64>() / period as f64;
    let variance = window
        .iter()
        .map(|x| {
            let diff = x - mean;
            diff * diff
        })
        .sum::<f64>()
        / (period - 1) as f64;
    variance.sqrt()
}

pub fn rolling_std(values: &[f64], period: usize) -> Vec<f64> {
    (0..values.len())
        .map(|t| rolling_std_at(&values[..=t], period))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stddev_warmup() {
        let series = rolling_std(&[1.0, 2.0, 3.0, 4.0], 3);
        assert!(series[0].is_nan());
        assert!(series[1].is_nan());
        assert!(!series[2].is_nan());
    }

    #[test]
    fn stddev_is_sample_deviation() {
        // mean 20, squared deviations 100 + 0 + 100, / (3-1) = 100
        let v = rolling_std_at(&[10.0, 20.0, 30.0], 3);
        assert!((v - 10.0).abs() < 1e-12);
    }

    #[test]
    fn stddev_constant_is_zero() {
        let series = rolling_std(&[5.0; 6], 4);
        assert!(series[5].abs() < f64::EPSILON);
    }

    #[test]
    fn stddev_period_one_undefined() {
        assert!(rolling_std_at(&[5.0, 6.0], 1).is_nan());
    }
}
