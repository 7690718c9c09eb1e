//! Regime-switching meta strategy.
//!
//! Each bar is classified as trend or range from the spread between two
//! moving averages relative to the close. Trend bars follow the configured
//! trend strategy, range bars follow z-score mean reversion. The switched
//! signal is then held through zero readings so a regime change does not
//! force a flat bar.

use std::str::FromStr;

use crate::domain::combiner::{
    classify_regimes, combine_weighted, to_rows, Regime, RegimeWeights, WeightSource,
};
use crate::domain::error::StratlabError;
use crate::domain::ohlcv::Bar;
use crate::domain::strategy::{
    direction, hold_last_nonzero, require_positive, Breakout, Momentum, MovingAverage, SignalProvider,
    StrategyParams, ZScore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendMode {
    Ma,
    Breakout,
    Momentum,
}

impl FromStr for TrendMode {
    type Err = StratlabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ma" => Ok(Self::Ma),
            "breakout" => Ok(Self::Breakout),
            "momentum" => Ok(Self::Momentum),
            other => Err(StratlabError::validation(format!(
                "unknown trend_mode '{other}', expected one of: ma, breakout, momentum"
            ))),
        }
    }
}

pub struct RegimeSwitch {
    weights: RegimeWeights,
    trend: Box<dyn SignalProvider>,
    range: ZScore,
}

impl RegimeSwitch {
    pub fn from_params(params: &StrategyParams) -> Result<Self, StratlabError> {
        let trend_short = require_positive("trend_ma_short", params.get_usize("trend_ma_short", 50)?)?;
        let trend_long = require_positive("trend_ma_long", params.get_usize("trend_ma_long", 200)?)?;
        let threshold = params.get_f64("trend_threshold", 0.01)?;
        if threshold < 0.0 {
            return Err(StratlabError::validation("trend_threshold must be non-negative"));
        }

        let mode: TrendMode = params.get_str("trend_mode", "momentum").parse()?;
        let trend: Box<dyn SignalProvider> = match mode {
            TrendMode::Ma => Box::new(MovingAverage::new(
                params.get_usize("ma_short_window", 20)?,
                params.get_usize("ma_long_window", 100)?,
            )?),
            TrendMode::Breakout => Box::new(Breakout::new(
                params.get_usize("breakout_high_window", 20)?,
                params.get_usize("breakout_low_window", 10)?,
            )?),
            TrendMode::Momentum => Box::new(Momentum::new(params.get_usize("momentum_lookback", 20)?)?),
        };
        let range = ZScore::new(
            params.get_usize("zscore_window", 20)?,
            params.get_f64("zscore_entry", 2.0)?,
        )?;

        Ok(Self {
            weights: RegimeWeights {
                trend_short,
                trend_long,
                threshold,
                trend_slot: 0,
                range_slot: 1,
            },
            trend,
            range,
        })
    }

    /// Per-bar regime classification used to pick the active strategy.
    pub fn regimes(&self, bars: &[Bar]) -> Vec<Regime> {
        classify_regimes(
            bars,
            self.weights.trend_short,
            self.weights.trend_long,
            self.weights.threshold,
        )
    }
}

impl SignalProvider for RegimeSwitch {
    fn name(&self) -> &str {
        "meta_regime"
    }

    fn generate(&self, bars: &[Bar]) -> Result<Vec<f64>, StratlabError> {
        let base = vec![self.trend.generate(bars)?, self.range.generate(bars)?];
        let weights = self.weights.weights(bars, &base)?;
        let switched = combine_weighted(&to_rows(&base)?, &weights)?;
        Ok(hold_last_nonzero(
            switched.into_iter().map(|v| direction(v > 0.0, v < 0.0)),
        ))
    }
}
