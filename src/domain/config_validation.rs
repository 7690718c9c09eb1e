//! Configuration validation.
//!
//! Validates every config field before a run and builds the typed values the
//! engine, registry and optimizer take. Missing keys fall back to defaults;
//! present-but-invalid values are errors.

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::StratlabError;
use crate::domain::metrics::Frequency;
use crate::domain::optimizer::{DEFAULT_LONG_RANGE, DEFAULT_SHORT_RANGE};
use crate::domain::strategy::{build_strategy, StrategyParams};
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_STRATEGY: &str = "ma";

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), StratlabError> {
    build_backtest_config(config)?;
    let (name, params) = strategy_settings(config);
    build_strategy(&name, &params)?;
    optimize_ranges(config)?;
    Ok(())
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, StratlabError> {
    let defaults = BacktestConfig::default();
    let initial_capital = read_f64(config, "initial_capital", defaults.initial_capital)?;
    if initial_capital <= 0.0 {
        return Err(invalid("initial_capital", "initial_capital must be positive"));
    }
    let commission_rate = read_f64(config, "commission_rate", defaults.commission_rate)?;
    if commission_rate < 0.0 {
        return Err(invalid("commission_rate", "commission_rate must be non-negative"));
    }
    let slippage_rate = read_f64(config, "slippage_rate", defaults.slippage_rate)?;
    if slippage_rate < 0.0 {
        return Err(invalid("slippage_rate", "slippage_rate must be non-negative"));
    }
    let risk_frequency = match config.get_string("backtest", "risk_frequency") {
        None => defaults.risk_frequency,
        Some(s) => s
            .parse::<Frequency>()
            .map_err(|e| invalid("risk_frequency", &e.to_string()))?,
    };

    BacktestConfig::new(initial_capital, commission_rate, slippage_rate, risk_frequency)
}

/// Strategy tag from `[strategy] name` and every other key of the section as
/// a strategy parameter.
pub fn strategy_settings(config: &dyn ConfigPort) -> (String, StrategyParams) {
    let name = config
        .get_string("strategy", "name")
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_STRATEGY.to_string());
    let params = config
        .section_entries("strategy")
        .into_iter()
        .filter(|(k, _)| k != "name")
        .collect();
    (name, params)
}

/// `[optimize] short_range` and `long_range`.
pub fn optimize_ranges(config: &dyn ConfigPort) -> Result<(Vec<usize>, Vec<usize>), StratlabError> {
    let short = match config.get_string("optimize", "short_range") {
        None => DEFAULT_SHORT_RANGE.to_vec(),
        Some(s) => parse_range(&s).map_err(|reason| StratlabError::ConfigInvalid {
            section: "optimize".into(),
            key: "short_range".into(),
            reason,
        })?,
    };
    let long = match config.get_string("optimize", "long_range") {
        None => DEFAULT_LONG_RANGE.to_vec(),
        Some(s) => parse_range(&s).map_err(|reason| StratlabError::ConfigInvalid {
            section: "optimize".into(),
            key: "long_range".into(),
            reason,
        })?,
    };
    Ok((short, long))
}

/// Comma-separated positive integers, e.g. `5, 10, 20`.
pub fn parse_range(value: &str) -> Result<Vec<usize>, String> {
    let values = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.parse::<usize>() {
            Ok(v) if v > 0 => Ok(v),
            _ => Err(format!("'{s}' is not a positive integer")),
        })
        .collect::<Result<Vec<_>, _>>()?;
    if values.is_empty() {
        return Err("range must list at least one value".into());
    }
    Ok(values)
}

fn read_f64(config: &dyn ConfigPort, key: &str, default: f64) -> Result<f64, StratlabError> {
    match config.get_string("backtest", key) {
        None => Ok(default),
        Some(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| invalid(key, &format!("'{s}' is not a number"))),
    }
}

fn invalid(key: &str, reason: &str) -> StratlabError {
    StratlabError::ConfigInvalid {
        section: "backtest".to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn assert_invalid(content: &str, expected_key: &str) {
        match build_backtest_config(&make_config(content)) {
            Err(StratlabError::ConfigInvalid { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("expected ConfigInvalid for {expected_key}, got {other:?}"),
        }
    }

    #[test]
    fn valid_config_passes() {
        let config = make_config(
            r#"
[backtest]
initial_capital = 50000
commission_rate = 0.001
slippage_rate = 0.0005
risk_frequency = 1h

[strategy]
name = rsi
window = 10

[optimize]
short_range = 5, 10
long_range = 30
"#,
        );
        assert!(validate_config(&config).is_ok());
        let bt = build_backtest_config(&config).unwrap();
        assert_eq!(bt.initial_capital, 50_000.0);
        assert_eq!(bt.risk_frequency, Frequency::Hourly);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = make_config("");
        assert!(validate_config(&config).is_ok());
        assert_eq!(build_backtest_config(&config).unwrap(), BacktestConfig::default());
        let (name, _) = strategy_settings(&config);
        assert_eq!(name, "ma");
        let (short, long) = optimize_ranges(&config).unwrap();
        assert_eq!(short, vec![5, 10, 20, 30]);
        assert_eq!(long, vec![50, 100, 150]);
    }

    #[test]
    fn initial_capital_must_be_positive() {
        assert_invalid("[backtest]\ninitial_capital = 0\n", "initial_capital");
        assert_invalid("[backtest]\ninitial_capital = -100\n", "initial_capital");
        assert_invalid("[backtest]\ninitial_capital = lots\n", "initial_capital");
    }

    #[test]
    fn rates_must_be_non_negative() {
        assert_invalid("[backtest]\ncommission_rate = -0.01\n", "commission_rate");
        assert_invalid("[backtest]\nslippage_rate = -0.01\n", "slippage_rate");
    }

    #[test]
    fn unknown_frequency_fails() {
        assert_invalid("[backtest]\nrisk_frequency = 1w\n", "risk_frequency");
    }

    #[test]
    fn strategy_section_becomes_params() {
        let config = make_config("[strategy]\nname = bollinger\nwindow = 15\nnum_std = 1.5\n");
        let (name, params) = strategy_settings(&config);
        assert_eq!(name, "bollinger");
        assert_eq!(params.get_usize("window", 20).unwrap(), 15);
        assert_eq!(params.get_f64("num_std", 2.0).unwrap(), 1.5);
        assert_eq!(params.get_str("name", "none"), "none");
    }

    #[test]
    fn unknown_strategy_fails_validation() {
        let config = make_config("[strategy]\nname = turtle\n");
        assert!(matches!(
            validate_config(&config),
            Err(StratlabError::UnknownStrategy { .. })
        ));
    }

    #[test]
    fn bad_strategy_params_fail_validation() {
        let config = make_config("[strategy]\nname = ma\nshort_window = 60\nlong_window = 20\n");
        assert!(matches!(
            validate_config(&config),
            Err(StratlabError::Validation { .. })
        ));
    }

    #[test]
    fn range_parsing() {
        assert_eq!(parse_range("5,10, 20").unwrap(), vec![5, 10, 20]);
        assert!(parse_range("5,0").is_err());
        assert!(parse_range("five").is_err());
        assert!(parse_range(" , ").is_err());

        let config = make_config("[optimize]\nlong_range = 50,x\n");
        assert!(matches!(
            optimize_ranges(&config),
            Err(StratlabError::ConfigInvalid { .. })
        ));
    }
}
