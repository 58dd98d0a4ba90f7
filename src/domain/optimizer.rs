//! Grid-search parameter optimization.
//!
//! Enumerates the Cartesian product of a parameter grid, runs an independent
//! backtest per combination on a bounded rayon pool, and ranks the
//! survivors by Sharpe ratio (descending), then max drawdown (ascending),
//! then enumeration index. A failing combination is recorded and excluded
//! from ranking without aborting the search.

use rayon::prelude::*;
use serde::Serialize;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

use super::backtest::{run_backtest, BacktestConfig};
use super::error::StratbenchError;
use super::metrics::Metrics;
use super::ohlcv::{validate_series, Bar};
use super::strategy::{Strategy, StrategyKind, StrategyParameters};

/// Parameter name → ordered candidate values. Axis order is the canonical
/// enumeration order; the last axis varies fastest.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ParameterGrid {
    axes: Vec<(String, Vec<f64>)>,
}

impl ParameterGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, values: Vec<f64>) -> Self {
        self.insert(name, values);
        self
    }

    /// Add an axis, replacing the values of an existing axis of the same
    /// name in place.
    pub fn insert(&mut self, name: &str, values: Vec<f64>) {
        match self.axes.iter_mut().find(|(n, _)| n == name) {
            Some(axis) => axis.1 = values,
            None => self.axes.push((name.to_string(), values)),
        }
    }

    /// Fix every parameter of `base` that has no axis yet to its single
    /// value. Existing axes keep their candidates and the combination count
    /// is unchanged.
    pub fn pin(&mut self, base: &StrategyParameters) {
        for (name, value) in base.iter() {
            if !self.axes.iter().any(|(n, _)| n == name) {
                self.axes.push((name.to_string(), vec![value]));
            }
        }
    }

    pub fn axes(&self) -> &[(String, Vec<f64>)] {
        &self.axes
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    pub fn combination_count(&self) -> usize {
        if self.axes.is_empty() {
            return 0;
        }
        self.axes
            .iter()
            .fold(1usize, |acc, (_, values)| acc.saturating_mul(values.len()))
    }

    /// Every combination in canonical order.
    pub fn expand(&self) -> Vec<StrategyParameters> {
        if self.axes.is_empty() {
            return Vec::new();
        }
        let mut out = vec![StrategyParameters::new()];
        for (name, values) in &self.axes {
            let mut next = Vec::with_capacity(out.len() * values.len());
            for base in &out {
                for &value in values {
                    let mut params = base.clone();
                    params.insert(name, value);
                    next.push(params);
                }
            }
            out = next;
        }
        out
    }
}

fn stepped(start: u32, end: u32, step: usize) -> Vec<f64> {
    (start..=end).step_by(step).map(f64::from).collect()
}

/// The search space used when a caller supplies no grid.
pub fn default_grid(kind: StrategyKind) -> ParameterGrid {
    match kind {
        StrategyKind::Momentum => ParameterGrid::new()
            .with("lookback_period", stepped(10, 50, 5))
            .with("threshold", vec![0.01, 0.015, 0.02, 0.025, 0.03])
            .with("position_size", vec![0.05, 0.1, 0.15, 0.2]),
        StrategyKind::MeanReversion => ParameterGrid::new()
            .with("lookback_period", stepped(20, 100, 10))
            .with("std_threshold", vec![1.5, 1.8, 2.0, 2.2, 2.5])
            .with("position_size", vec![0.1, 0.15, 0.2, 0.25]),
        StrategyKind::Breakout => ParameterGrid::new()
            .with("breakout_period", stepped(10, 30, 5))
            .with("volume_multiplier", vec![1.2, 1.5, 1.8, 2.0, 2.5])
            .with("position_size", vec![0.08, 0.12, 0.15, 0.18]),
        StrategyKind::DualMovingAverage => ParameterGrid::new()
            .with("fast_period", stepped(5, 19, 2))
            .with("slow_period", stepped(20, 60, 5))
            .with("position_size", vec![0.05, 0.08, 0.1, 0.12, 0.15]),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptimizerConfig {
    /// Worker count; None or 0 means all available cores.
    pub parallelism: Option<usize>,
}

/// Clamp a requested worker count to `[1, available cores]`.
pub fn normalize_parallelism(requested: Option<usize>) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    requested
        .filter(|&n| n > 0)
        .unwrap_or(cores)
        .min(cores)
        .max(1)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    /// Position in canonical enumeration order.
    pub index: usize,
    pub parameters: StrategyParameters,
    pub metrics: Metrics,
}

impl RankedResult {
    pub fn objective(&self) -> f64 {
        self.metrics.sharpe_ratio
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedCombination {
    pub index: usize,
    pub parameters: StrategyParameters,
    pub score: Option<f64>,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    pub strategy_name: String,
    pub symbol: String,
    pub combination_count: usize,
    pub best_parameters: Option<StrategyParameters>,
    pub best_objective_score: Option<f64>,
    pub ranked_results: Vec<RankedResult>,
    pub failed: Vec<FailedCombination>,
    pub skipped: usize,
}

impl OptimizationResult {
    pub fn best(&self) -> Option<&RankedResult> {
        self.ranked_results.first()
    }

    pub fn top(&self, n: usize) -> &[RankedResult] {
        &self.ranked_results[..n.min(self.ranked_results.len())]
    }
}

enum Outcome {
    Ranked(RankedResult),
    Failed(FailedCombination),
    Skipped,
}

pub fn optimize(
    symbol: &str,
    kind: StrategyKind,
    grid: &ParameterGrid,
    bars: &[Bar],
    config: &BacktestConfig,
    optimizer: &OptimizerConfig,
) -> Result<OptimizationResult, StratbenchError> {
    optimize_with_cancel(symbol, kind, grid, bars, config, optimizer, None)
}

/// Like [`optimize`], with a hook polled before each combination starts.
/// Once it returns true no further combinations start; those already running
/// finish and the rest are counted as skipped.
pub fn optimize_with_cancel(
    symbol: &str,
    kind: StrategyKind,
    grid: &ParameterGrid,
    bars: &[Bar],
    config: &BacktestConfig,
    optimizer: &OptimizerConfig,
    should_cancel: Option<&(dyn Fn() -> bool + Sync)>,
) -> Result<OptimizationResult, StratbenchError> {
    config.validate()?;
    validate_series(bars)?;
    validate_grid(kind, grid)?;

    let combinations = grid.expand();
    let combination_count = combinations.len();
    let workers = normalize_parallelism(optimizer.parallelism);
    tracing::info!(
        symbol,
        strategy = kind.id(),
        combinations = combination_count,
        workers,
        "starting grid search"
    );

    let cancelled = AtomicBool::new(false);
    let evaluate_all = || -> Vec<Outcome> {
        combinations
            .par_iter()
            .enumerate()
            .map(|(index, params)| {
                if cancelled.load(Ordering::Relaxed)
                    || should_cancel.map(|f| f()).unwrap_or(false)
                {
                    cancelled.store(true, Ordering::Relaxed);
                    return Outcome::Skipped;
                }
                evaluate(symbol, kind, index, params, bars, config)
            })
            .collect()
    };

    let outcomes = match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool.install(evaluate_all),
        Err(e) => {
            tracing::warn!("failed to build worker pool, using the global pool: {e}");
            evaluate_all()
        }
    };

    let mut ranked_results = Vec::new();
    let mut failed = Vec::new();
    let mut skipped = 0usize;
    for outcome in outcomes {
        match outcome {
            Outcome::Ranked(r) => ranked_results.push(r),
            Outcome::Failed(f) => failed.push(f),
            Outcome::Skipped => skipped += 1,
        }
    }
    rank(&mut ranked_results);

    let best_parameters = ranked_results.first().map(|r| r.parameters.clone());
    let best_objective_score = ranked_results.first().map(RankedResult::objective);

    tracing::info!(
        ranked = ranked_results.len(),
        failed = failed.len(),
        skipped,
        best_sharpe = ?best_objective_score,
        "grid search complete"
    );

    Ok(OptimizationResult {
        strategy_name: kind.id().to_string(),
        symbol: symbol.to_string(),
        combination_count,
        best_parameters,
        best_objective_score,
        ranked_results,
        failed,
        skipped,
    })
}

fn validate_grid(kind: StrategyKind, grid: &ParameterGrid) -> Result<(), StratbenchError> {
    for (name, values) in grid.axes() {
        if kind.parameter_spec(name).is_none() {
            return Err(StratbenchError::UnknownParameter {
                strategy: kind.id().to_string(),
                parameter: name.clone(),
            });
        }
        if values.is_empty() {
            return Err(StratbenchError::EmptyGrid {
                parameter: name.clone(),
            });
        }
    }
    Ok(())
}

fn evaluate(
    symbol: &str,
    kind: StrategyKind,
    index: usize,
    params: &StrategyParameters,
    bars: &[Bar],
    config: &BacktestConfig,
) -> Outcome {
    let run = catch_unwind(AssertUnwindSafe(|| {
        Strategy::from_parameters(kind, params)
            .and_then(|strategy| run_backtest(symbol, bars, &strategy, config))
    }));

    let failure = match run {
        Ok(Ok(result)) => {
            let m = &result.metrics;
            if m.sharpe_ratio.is_finite() && m.total_return.is_finite() {
                return Outcome::Ranked(RankedResult {
                    index,
                    parameters: result.parameters,
                    metrics: result.metrics,
                });
            }
            format!(
                "non-finite metrics: sharpe_ratio={}, total_return={}",
                m.sharpe_ratio, m.total_return
            )
        }
        Ok(Err(e)) => e.to_string(),
        Err(payload) => format!("backtest panicked: {}", panic_message(payload.as_ref())),
    };

    tracing::warn!(index, parameters = %params, "combination failed: {failure}");
    Outcome::Failed(FailedCombination {
        index,
        parameters: params.clone(),
        score: None,
        error: failure,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

/// Sharpe descending, then max drawdown ascending, then enumeration index.
fn rank(results: &mut [RankedResult]) {
    results.sort_by(|a, b| {
        b.metrics
            .sharpe_ratio
            .total_cmp(&a.metrics.sharpe_ratio)
            .then(a.metrics.max_drawdown.total_cmp(&b.metrics.max_drawdown))
            .then(a.index.cmp(&b.index))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn make_bars(n: usize) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.4).sin() * 8.0 + i as f64 * 0.1;
                Bar {
                    timestamp: start + Duration::days(i as i64),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: 1000.0,
                }
            })
            .collect()
    }

    fn ranked(index: usize, sharpe: f64, drawdown: f64) -> RankedResult {
        let mut metrics = Metrics::compute(&[], &[], &[], 1.0, 0.0, 0.0);
        metrics.sharpe_ratio = sharpe;
        metrics.max_drawdown = drawdown;
        RankedResult {
            index,
            parameters: StrategyParameters::new(),
            metrics,
        }
    }

    #[test]
    fn expand_last_axis_varies_fastest() {
        let grid = ParameterGrid::new()
            .with("fast_period", vec![2.0, 3.0])
            .with("slow_period", vec![10.0, 20.0, 30.0]);
        let combos = grid.expand();
        assert_eq!(combos.len(), 6);
        assert_eq!(grid.combination_count(), 6);
        assert_eq!(combos[0].get("fast_period"), Some(2.0));
        assert_eq!(combos[0].get("slow_period"), Some(10.0));
        assert_eq!(combos[1].get("slow_period"), Some(20.0));
        assert_eq!(combos[3].get("fast_period"), Some(3.0));
        assert_eq!(combos[3].get("slow_period"), Some(10.0));
    }

    #[test]
    fn pin_adds_single_value_axes_for_missing_parameters() {
        let mut grid = ParameterGrid::new().with("breakout_period", vec![10.0, 20.0]);
        let base = StrategyParameters::new()
            .with("breakout_period", 15.0)
            .with("volume_period", 30.0);
        grid.pin(&base);

        assert_eq!(grid.combination_count(), 2);
        let combos = grid.expand();
        assert_eq!(combos[0].get("breakout_period"), Some(10.0));
        assert_eq!(combos[1].get("breakout_period"), Some(20.0));
        assert!(combos.iter().all(|c| c.get("volume_period") == Some(30.0)));
    }

    #[test]
    fn panic_message_reads_str_and_string_payloads() {
        let payload: Box<dyn Any + Send> = Box::new("overflow");
        assert_eq!(panic_message(payload.as_ref()), "overflow");
        let payload: Box<dyn Any + Send> = Box::new(String::from("index out of bounds"));
        assert_eq!(panic_message(payload.as_ref()), "index out of bounds");
        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }

    #[test]
    fn oversized_period_fails_alone() {
        let grid = ParameterGrid::new().with("breakout_period", vec![5.0, 1e20]);
        let result = optimize(
            "X",
            StrategyKind::Breakout,
            &grid,
            &make_bars(40),
            &BacktestConfig::default(),
            &OptimizerConfig::default(),
        )
        .unwrap();
        assert_eq!(result.ranked_results.len(), 1);
        assert_eq!(result.ranked_results[0].index, 0);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].index, 1);
        assert!(result.failed[0].error.contains("breakout_period"));
    }

    #[test]
    fn empty_grid_has_no_combinations() {
        let grid = ParameterGrid::new();
        assert_eq!(grid.combination_count(), 0);
        assert!(grid.expand().is_empty());
    }

    #[test]
    fn insert_replaces_existing_axis() {
        let mut grid = ParameterGrid::new().with("threshold", vec![0.01]);
        grid.insert("threshold", vec![0.02, 0.03]);
        assert_eq!(grid.axes().len(), 1);
        assert_eq!(grid.combination_count(), 2);
    }

    #[test]
    fn default_grid_sizes() {
        assert_eq!(default_grid(StrategyKind::Momentum).combination_count(), 9 * 5 * 4);
        assert_eq!(default_grid(StrategyKind::MeanReversion).combination_count(), 9 * 5 * 4);
        assert_eq!(default_grid(StrategyKind::Breakout).combination_count(), 5 * 5 * 4);
        assert_eq!(
            default_grid(StrategyKind::DualMovingAverage).combination_count(),
            8 * 9 * 5
        );
    }

    #[test]
    fn default_grids_name_known_parameters() {
        for kind in StrategyKind::ALL {
            assert!(validate_grid(kind, &default_grid(kind)).is_ok());
        }
    }

    #[test]
    fn normalize_parallelism_bounds() {
        let cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        assert_eq!(normalize_parallelism(None), cores);
        assert_eq!(normalize_parallelism(Some(0)), cores);
        assert_eq!(normalize_parallelism(Some(1)), 1);
        assert_eq!(normalize_parallelism(Some(usize::MAX)), cores);
    }

    #[test]
    fn rank_orders_by_sharpe_then_drawdown_then_index() {
        let mut results = vec![
            ranked(0, 1.0, 0.2),
            ranked(1, 2.0, 0.3),
            ranked(2, 1.0, 0.1),
            ranked(3, 1.0, 0.1),
        ];
        rank(&mut results);
        let order: Vec<usize> = results.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![1, 2, 3, 0]);
    }

    #[test]
    fn unknown_grid_parameter_rejected() {
        let grid = ParameterGrid::new().with("stop_loss", vec![0.05]);
        let err = optimize(
            "X",
            StrategyKind::Momentum,
            &grid,
            &make_bars(30),
            &BacktestConfig::default(),
            &OptimizerConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, StratbenchError::UnknownParameter { .. }));
    }

    #[test]
    fn empty_axis_rejected() {
        let grid = ParameterGrid::new().with("threshold", vec![]);
        let err = optimize(
            "X",
            StrategyKind::Momentum,
            &grid,
            &make_bars(30),
            &BacktestConfig::default(),
            &OptimizerConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, StratbenchError::EmptyGrid { .. }));
    }

    #[test]
    fn invalid_combination_is_isolated() {
        // fast_period 12 >= slow_period 10 fails; the others run
        let grid = ParameterGrid::new()
            .with("fast_period", vec![2.0, 3.0, 12.0])
            .with("slow_period", vec![10.0]);
        let result = optimize(
            "X",
            StrategyKind::DualMovingAverage,
            &grid,
            &make_bars(60),
            &BacktestConfig::default(),
            &OptimizerConfig {
                parallelism: Some(2),
            },
        )
        .unwrap();
        assert_eq!(result.combination_count, 3);
        assert_eq!(result.ranked_results.len(), 2);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].index, 2);
        assert!(result.failed[0].score.is_none());
        assert!(result.failed[0].error.contains("slow_period"));
        assert!(result.best_parameters.is_some());
    }

    #[test]
    fn cancel_skips_everything_not_started() {
        let grid = default_grid(StrategyKind::Momentum);
        let cancel = || true;
        let result = optimize_with_cancel(
            "X",
            StrategyKind::Momentum,
            &grid,
            &make_bars(40),
            &BacktestConfig::default(),
            &OptimizerConfig::default(),
            Some(&cancel),
        )
        .unwrap();
        assert_eq!(result.skipped, result.combination_count);
        assert!(result.ranked_results.is_empty());
        assert!(result.best_parameters.is_none());
        assert!(result.best_objective_score.is_none());
    }

    #[test]
    fn top_is_bounded() {
        let grid = ParameterGrid::new().with("lookback_period", vec![5.0, 10.0, 15.0]);
        let result = optimize(
            "X",
            StrategyKind::Momentum,
            &grid,
            &make_bars(50),
            &BacktestConfig::default(),
            &OptimizerConfig::default(),
        )
        .unwrap();
        assert_eq!(result.top(2).len(), 2);
        assert_eq!(result.top(10).len(), 3);
        assert_eq!(
            result.best().map(RankedResult::objective),
            result.best_objective_score
        );
    }
}
