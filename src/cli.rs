//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::backtest::{run_backtest, BacktestResult};
use crate::domain::config_validation::{
    build_backtest_config, build_optimize_settings, build_parameter_grid, build_strategy,
    read_symbol, validate_config,
};
use crate::domain::error::StratbenchError;
use crate::domain::optimizer::{optimize_with_cancel, OptimizationResult};
use crate::domain::strategy::StrategyKind;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

const LEADERBOARD_SIZE: usize = 10;

#[derive(Parser, Debug)]
#[command(name = "stratbench", about = "Strategy backtester and grid-search optimizer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// CSV file, or a directory of <SYMBOL>.csv files
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Grid-search strategy parameters
    Optimize {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Worker threads (0 = all cores)
        #[arg(long)]
        parallelism: Option<usize>,
        /// Stop starting new combinations after this many seconds
        #[arg(long)]
        time_budget_secs: Option<f64>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List the strategy catalog
    Strategies,
}

/// Command-line values that take precedence over `[optimize]`.
#[derive(Debug, Clone, Default)]
pub struct OptimizeOverrides {
    pub parallelism: Option<usize>,
    pub time_budget_secs: Option<f64>,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            data,
            output,
        } => run_backtest_command(&config, &data, output.as_deref()),
        Command::Optimize {
            config,
            data,
            output,
            parallelism,
            time_budget_secs,
        } => run_optimize_command(
            &config,
            &data,
            output.as_deref(),
            OptimizeOverrides {
                parallelism,
                time_budget_secs,
            },
        ),
        Command::Validate { config } => run_validate(&config),
        Command::Strategies => {
            print_strategies();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(&err)
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, StratbenchError> {
    eprintln!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

fn run_backtest_command(
    config_path: &Path,
    data_path: &Path,
    output: Option<&Path>,
) -> Result<(), StratbenchError> {
    let config = load_config(config_path)?;
    let data = CsvAdapter::new(data_path.to_path_buf());
    let result = run_backtest_pipeline(&config, &data)?;
    print_backtest_summary(&result);

    if let Some(output) = output {
        JsonReportAdapter::new().write_backtest(&result, &output.display().to_string())?;
        eprintln!("\nReport written to: {}", output.display());
    }
    Ok(())
}

fn run_optimize_command(
    config_path: &Path,
    data_path: &Path,
    output: Option<&Path>,
    overrides: OptimizeOverrides,
) -> Result<(), StratbenchError> {
    let config = load_config(config_path)?;
    let data = CsvAdapter::new(data_path.to_path_buf());
    let result = run_optimize_pipeline(&config, &data, &overrides)?;
    print_optimization_summary(&result);

    if let Some(output) = output {
        JsonReportAdapter::new().write_optimization(&result, &output.display().to_string())?;
        eprintln!("\nReport written to: {}", output.display());
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), StratbenchError> {
    let config = load_config(config_path)?;
    validate_config(&config)?;

    let strategy = build_strategy(&config)?;
    let grid = build_parameter_grid(&config, strategy.kind())?;
    eprintln!("Config validated successfully");
    eprintln!("  symbol:   {}", read_symbol(&config)?);
    eprintln!("  strategy: {} ({})", strategy.name(), strategy.parameters());
    eprintln!("  grid:     {} combinations", grid.combination_count());
    Ok(())
}

/// Load bars for the configured symbol and run the configured strategy.
pub fn run_backtest_pipeline(
    config: &dyn ConfigPort,
    data: &dyn DataPort,
) -> Result<BacktestResult, StratbenchError> {
    let symbol = read_symbol(config)?;
    let backtest_config = build_backtest_config(config)?;
    let strategy = build_strategy(config)?;

    let bars = data.fetch_bars(&symbol)?;
    tracing::info!(symbol = %symbol, bars = bars.len(), strategy = strategy.name(), "loaded market data");

    run_backtest(&symbol, &bars, &strategy, &backtest_config)
}

/// Load bars for the configured symbol and grid-search the configured
/// strategy, honoring the optional wall-clock budget.
pub fn run_optimize_pipeline(
    config: &dyn ConfigPort,
    data: &dyn DataPort,
    overrides: &OptimizeOverrides,
) -> Result<OptimizationResult, StratbenchError> {
    let symbol = read_symbol(config)?;
    let backtest_config = build_backtest_config(config)?;
    let base = build_strategy(config)?;
    let kind = base.kind();
    let mut grid = build_parameter_grid(config, kind)?;
    grid.pin(&base.parameters());

    let mut settings = build_optimize_settings(config)?;
    if let Some(n) = overrides.parallelism {
        settings.optimizer.parallelism = Some(n).filter(|&n| n > 0);
    }
    if let Some(secs) = overrides.time_budget_secs {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(StratbenchError::ConfigInvalid {
                section: "optimize".to_string(),
                key: "time_budget_secs".to_string(),
                reason: "time_budget_secs must be positive".to_string(),
            });
        }
        settings.time_budget = Some(Duration::from_secs_f64(secs));
    }

    let bars = data.fetch_bars(&symbol)?;
    tracing::info!(symbol = %symbol, bars = bars.len(), strategy = kind.id(), "loaded market data");
    eprintln!(
        "Optimizing {} on {}: {} combinations",
        kind,
        symbol,
        grid.combination_count()
    );

    let deadline = settings.time_budget.map(|budget| Instant::now() + budget);
    let past_deadline = move || deadline.is_some_and(|d| Instant::now() >= d);

    optimize_with_cancel(
        &symbol,
        kind,
        &grid,
        &bars,
        &backtest_config,
        &settings.optimizer,
        Some(&past_deadline),
    )
}

fn print_backtest_summary(result: &BacktestResult) {
    let m = &result.metrics;
    eprintln!("\n=== {} on {} ===", result.strategy_name, result.symbol);
    eprintln!("Parameters:       {}", result.parameters);
    eprintln!(
        "Period:           {} to {}",
        result.period.start.format("%Y-%m-%d"),
        result.period.end.format("%Y-%m-%d")
    );
    eprintln!("Total Return:     {:.2}%", m.total_return * 100.0);
    eprintln!("Annualized:       {:.2}%", m.annualized_return * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", m.sharpe_ratio);
    eprintln!("Max Drawdown:     -{:.1}%", m.max_drawdown * 100.0);
    eprintln!("Total Trades:     {}", m.trade_count);
    eprintln!("Win Rate:         {:.1}%", m.win_rate * 100.0);
    eprintln!("Profit Factor:    {:.2}", m.profit_factor);
    eprintln!("Average Win:      {:.2}", m.average_win);
    eprintln!("Average Loss:     {:.2}", m.average_loss);
    eprintln!("Max Consec. Loss: {}", m.max_consecutive_losses);
}

fn print_optimization_summary(result: &OptimizationResult) {
    eprintln!(
        "\n=== {} on {}: {} ranked, {} failed, {} skipped ===",
        result.strategy_name,
        result.symbol,
        result.ranked_results.len(),
        result.failed.len(),
        result.skipped
    );
    for (rank, r) in result.top(LEADERBOARD_SIZE).iter().enumerate() {
        eprintln!(
            "{:>3}. sharpe {:>7.3}  return {:>8.2}%  dd {:>6.2}%  trades {:>4}  {}",
            rank + 1,
            r.metrics.sharpe_ratio,
            r.metrics.total_return * 100.0,
            r.metrics.max_drawdown * 100.0,
            r.metrics.trade_count,
            r.parameters
        );
    }
    for f in &result.failed {
        eprintln!("  failed #{} ({}): {}", f.index, f.parameters, f.error);
    }
    match (&result.best_parameters, result.best_objective_score) {
        (Some(params), Some(score)) => eprintln!("\nBest: {} (sharpe {:.3})", params, score),
        _ => eprintln!("\nNo combination completed"),
    }
}

fn print_strategies() {
    for kind in StrategyKind::ALL {
        eprintln!("{}", kind);
        for spec in kind.parameter_specs() {
            eprintln!(
                "  {:<18} default {:<6} domain {}",
                spec.name, spec.default, spec.domain
            );
        }
    }
}
