//! Configuration validation.
//!
//! Turns the `[backtest]`, `[strategy]` and `[optimize]` sections into typed
//! settings, checking every field before a run starts.

use std::time::Duration;

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::StratbenchError;
use crate::domain::execution::SlippagePolicy;
use crate::domain::optimizer::{default_grid, OptimizerConfig, ParameterGrid};
use crate::domain::strategy::{Strategy, StrategyKind, StrategyParameters};
use crate::ports::config_port::ConfigPort;

const GRID_PREFIX: &str = "grid.";

/// Settings for a grid search beyond the backtest constants.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeSettings {
    pub optimizer: OptimizerConfig,
    pub time_budget: Option<Duration>,
}

/// Check every section a run could read.
pub fn validate_config(config: &dyn ConfigPort) -> Result<(), StratbenchError> {
    read_symbol(config)?;
    build_backtest_config(config)?;
    let strategy = build_strategy(config)?;
    build_parameter_grid(config, strategy.kind())?;
    build_optimize_settings(config)?;
    Ok(())
}

pub fn read_symbol(config: &dyn ConfigPort) -> Result<String, StratbenchError> {
    match config.get_string("backtest", "symbol") {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(StratbenchError::ConfigMissing {
            section: "backtest".to_string(),
            key: "symbol".to_string(),
        }),
    }
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, StratbenchError> {
    let defaults = BacktestConfig::default();

    let initial_capital = read_double(config, "backtest", "initial_capital")?
        .unwrap_or(defaults.initial_capital);
    if !initial_capital.is_finite() || initial_capital <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }

    let commission_rate = read_rate(config, "commission_rate", defaults.commission_rate)?;
    let slippage_rate = read_rate(config, "slippage_rate", defaults.slippage_rate)?;
    let risk_free_rate = read_rate(config, "risk_free_rate", defaults.risk_free_rate)?;

    let slippage_policy = match config.get_string("backtest", "slippage_policy") {
        Some(s) => s.parse::<SlippagePolicy>()?,
        None => defaults.slippage_policy,
    };

    Ok(BacktestConfig {
        initial_capital,
        commission_rate,
        slippage_rate,
        risk_free_rate,
        slippage_policy,
    })
}

/// Strategy id plus every other `[strategy]` key as a numeric parameter.
pub fn build_strategy(config: &dyn ConfigPort) -> Result<Strategy, StratbenchError> {
    let id = config
        .get_string("strategy", "id")
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| StratbenchError::ConfigMissing {
            section: "strategy".to_string(),
            key: "id".to_string(),
        })?;

    let mut params = StrategyParameters::new();
    for key in config.keys("strategy") {
        if key == "id" {
            continue;
        }
        if let Some(value) = read_double(config, "strategy", &key)? {
            params.insert(&key, value);
        }
    }

    Strategy::from_id(&id, &params)
}

/// `grid.<parameter> = v1, v2, ...` entries of `[optimize]` in file order, or
/// the strategy's default grid when there are none.
pub fn build_parameter_grid(
    config: &dyn ConfigPort,
    kind: StrategyKind,
) -> Result<ParameterGrid, StratbenchError> {
    let mut grid = ParameterGrid::new();
    for key in config.keys("optimize") {
        let Some(parameter) = key.strip_prefix(GRID_PREFIX) else {
            continue;
        };
        let raw = config.get_string("optimize", &key).unwrap_or_default();
        let values = parse_value_list(&raw).map_err(|reason| invalid("optimize", &key, &reason))?;
        if values.is_empty() {
            return Err(StratbenchError::EmptyGrid {
                parameter: parameter.to_string(),
            });
        }
        if kind.parameter_spec(parameter).is_none() {
            return Err(StratbenchError::UnknownParameter {
                strategy: kind.id().to_string(),
                parameter: parameter.to_string(),
            });
        }
        grid.insert(parameter, values);
    }

    if grid.is_empty() {
        Ok(default_grid(kind))
    } else {
        Ok(grid)
    }
}

pub fn build_optimize_settings(config: &dyn ConfigPort) -> Result<OptimizeSettings, StratbenchError> {
    let parallelism = match read_double(config, "optimize", "parallelism")? {
        None => None,
        Some(v) if v >= 0.0 && v.fract() == 0.0 => Some(v as usize).filter(|&n| n > 0),
        Some(_) => {
            return Err(invalid(
                "optimize",
                "parallelism",
                "parallelism must be a non-negative integer",
            ));
        }
    };

    let time_budget = match read_double(config, "optimize", "time_budget_secs")? {
        None => None,
        Some(v) if v.is_finite() && v > 0.0 => Some(Duration::from_secs_f64(v)),
        Some(_) => {
            return Err(invalid(
                "optimize",
                "time_budget_secs",
                "time_budget_secs must be positive",
            ));
        }
    };

    Ok(OptimizeSettings {
        optimizer: OptimizerConfig { parallelism },
        time_budget,
    })
}

fn read_rate(config: &dyn ConfigPort, key: &str, default: f64) -> Result<f64, StratbenchError> {
    let value = read_double(config, "backtest", key)?.unwrap_or(default);
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(
            "backtest",
            key,
            &format!("{key} must be non-negative"),
        ));
    }
    Ok(value)
}

/// A present key must parse; an absent one is `None`.
fn read_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, StratbenchError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| invalid(section, key, &format!("expected a number, got {raw:?}"))),
    }
}

fn parse_value_list(raw: &str) -> Result<Vec<f64>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .map_err(|_| format!("expected a number, got {s:?}"))
        })
        .collect()
}

fn invalid(section: &str, key: &str, reason: &str) -> StratbenchError {
    StratbenchError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
