//! CLI integration tests for config parsing and command orchestration.
//!
//! Tests cover:
//! - INI files on disk through FileConfigAdapter
//! - Backtest and optimize pipelines with MockDataPort
//! - CSV data and JSON reports through the real adapters
//! - Argument parsing

mod common;

use clap::Parser;
use common::*;
use std::io::Write;
use stratbench::adapters::csv_adapter::CsvAdapter;
use stratbench::adapters::file_config_adapter::FileConfigAdapter;
use stratbench::adapters::json_report_adapter::JsonReportAdapter;
use stratbench::cli::{self, Cli, Command, OptimizeOverrides};
use stratbench::domain::config_validation::validate_config;
use stratbench::domain::error::StratbenchError;
use stratbench::domain::execution::SlippagePolicy;
use stratbench::ports::report_port::ReportPort;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const VALID_INI: &str = r#"
[backtest]
symbol = WAVE
initial_capital = 50000
commission_rate = 0.001
slippage_rate = 0.0005
risk_free_rate = 0.01
slippage_policy = entry

[strategy]
id = dual_moving_average
fast_period = 5
slow_period = 20
position_size = 0.2

[optimize]
parallelism = 2
grid.fast_period = 3, 5, 8
grid.slow_period = 15, 25
"#;

mod config_loading {
    use super::*;

    #[test]
    fn valid_config_from_file() {
        let file = write_temp_ini(VALID_INI);
        let adapter = cli::load_config(file.path()).unwrap();
        assert!(validate_config(&adapter).is_ok());
    }

    #[test]
    fn missing_file_is_config_error() {
        let err =
            cli::load_config(std::path::Path::new("/nonexistent/stratbench.ini")).unwrap_err();
        assert!(matches!(err, StratbenchError::ConfigParse { .. }));
    }

    #[test]
    fn backtest_section_values() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let config =
            stratbench::domain::config_validation::build_backtest_config(&adapter).unwrap();
        assert!((config.initial_capital - 50_000.0).abs() < f64::EPSILON);
        assert!((config.commission_rate - 0.001).abs() < f64::EPSILON);
        assert!((config.slippage_rate - 0.0005).abs() < f64::EPSILON);
        assert!((config.risk_free_rate - 0.01).abs() < f64::EPSILON);
        assert_eq!(config.slippage_policy, SlippagePolicy::EntryOnly);
    }

    #[test]
    fn grid_from_file_in_order() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let grid = stratbench::domain::config_validation::build_parameter_grid(
            &adapter,
            stratbench::domain::strategy::StrategyKind::DualMovingAverage,
        )
        .unwrap();
        let names: Vec<&str> = grid.axes().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["fast_period", "slow_period"]);
        assert_eq!(grid.combination_count(), 6);
    }

    #[test]
    fn unknown_strategy_in_file() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\nsymbol = X\n[strategy]\nid = pairs\n")
                .unwrap();
        let err = validate_config(&adapter).unwrap_err();
        assert!(matches!(err, StratbenchError::UnknownStrategy { .. }));
    }
}

mod pipelines {
    use super::*;

    #[test]
    fn backtest_pipeline_with_mock_data() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let data = MockDataPort::new().with_bars("WAVE", wave(200));
        let result = cli::run_backtest_pipeline(&adapter, &data).unwrap();

        assert_eq!(result.symbol, "WAVE");
        assert_eq!(result.strategy_name, "dual_moving_average");
        assert_eq!(result.parameters.get("position_size"), Some(0.2));
        assert_eq!(result.equity_curve.len(), 199);
        assert!(result.trade_count() > 0);
        assert!(result.trades.iter().all(|t| t.slippage > 0.0));
    }

    #[test]
    fn backtest_pipeline_data_error() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let data = MockDataPort::new().with_error("WAVE", "feed offline");
        let err = cli::run_backtest_pipeline(&adapter, &data).unwrap_err();
        assert!(matches!(err, StratbenchError::Data { .. }));
    }

    #[test]
    fn backtest_pipeline_missing_symbol_data_is_empty_series() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let err = cli::run_backtest_pipeline(&adapter, &MockDataPort::new()).unwrap_err();
        assert!(matches!(err, StratbenchError::EmptySeries));
    }

    #[test]
    fn optimize_pipeline_uses_configured_grid() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let data = MockDataPort::new().with_bars("WAVE", wave(200));
        let result =
            cli::run_optimize_pipeline(&adapter, &data, &OptimizeOverrides::default()).unwrap();

        assert_eq!(result.combination_count, 6);
        assert_eq!(result.ranked_results.len() + result.failed.len(), 6);
        assert_eq!(result.skipped, 0);
        assert!(result.best_parameters.is_some());
    }

    #[test]
    fn optimize_pipeline_keeps_fixed_strategy_parameters() {
        let ini = "[backtest]\nsymbol = WAVE\n\n\
                   [strategy]\nid = breakout\nvolume_period = 30\nvolume_multiplier = 1.1\n\n\
                   [optimize]\ngrid.breakout_period = 10, 20\n";
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        let data = MockDataPort::new().with_bars("WAVE", wave(200));
        let result =
            cli::run_optimize_pipeline(&adapter, &data, &OptimizeOverrides::default()).unwrap();

        assert_eq!(result.combination_count, 2);
        assert_eq!(result.ranked_results.len(), 2);
        for r in &result.ranked_results {
            assert_eq!(r.parameters.get("volume_period"), Some(30.0));
            assert_eq!(r.parameters.get("volume_multiplier"), Some(1.1));
        }
        let best = result.best_parameters.unwrap();
        assert_eq!(best.get("volume_period"), Some(30.0));
        assert!(matches!(best.get("breakout_period"), Some(p) if p == 10.0 || p == 20.0));
    }

    #[test]
    fn optimize_pipeline_rejects_non_positive_budget() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let data = MockDataPort::new().with_bars("WAVE", wave(50));
        let overrides = OptimizeOverrides {
            parallelism: None,
            time_budget_secs: Some(0.0),
        };
        let err = cli::run_optimize_pipeline(&adapter, &data, &overrides).unwrap_err();
        assert!(matches!(err, StratbenchError::ConfigInvalid { .. }));
    }

    #[test]
    fn csv_to_json_round_trip_through_adapters() {
        let dir = tempfile::TempDir::new().unwrap();
        let csv_path = dir.path().join("WAVE.csv");
        let mut csv = String::from("timestamp,open,high,low,close,volume\n");
        for bar in wave(120) {
            csv.push_str(&format!(
                "{},{},{},{},{},{}\n",
                bar.timestamp.to_rfc3339(),
                bar.open,
                bar.high,
                bar.low,
                bar.close,
                bar.volume
            ));
        }
        std::fs::write(&csv_path, csv).unwrap();

        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let data = CsvAdapter::new(dir.path().to_path_buf());
        let result = cli::run_backtest_pipeline(&adapter, &data).unwrap();
        assert_eq!(result.equity_curve.len(), 119);

        let out = dir.path().join("report.json");
        JsonReportAdapter::new()
            .write_backtest(&result, out.to_str().unwrap())
            .unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(json["symbol"], "WAVE");
        assert_eq!(json["equity_curve"].as_array().unwrap().len(), 119);
    }
}

mod arguments {
    use super::*;

    #[test]
    fn parse_optimize_arguments() {
        let cli = Cli::try_parse_from([
            "stratbench",
            "optimize",
            "--config",
            "c.ini",
            "--data",
            "d.csv",
            "--parallelism",
            "3",
            "--time-budget-secs",
            "2.5",
        ])
        .unwrap();
        match cli.command {
            Command::Optimize {
                parallelism,
                time_budget_secs,
                output,
                ..
            } => {
                assert_eq!(parallelism, Some(3));
                assert_eq!(time_budget_secs, Some(2.5));
                assert!(output.is_none());
            }
            other => panic!("expected optimize, got {other:?}"),
        }
    }

    #[test]
    fn backtest_requires_data() {
        assert!(Cli::try_parse_from(["stratbench", "backtest", "--config", "c.ini"]).is_err());
    }

    #[test]
    fn strategies_takes_no_arguments() {
        let cli = Cli::try_parse_from(["stratbench", "strategies"]).unwrap();
        assert!(matches!(cli.command, Command::Strategies));
    }
}
