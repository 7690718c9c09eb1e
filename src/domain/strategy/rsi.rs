//! RSI mean reversion with persistence.
//!
//! RSI below `rsi_low` → long, above `rsi_high` → short; in between the
//! previous direction is held.

use crate::domain::error::StratlabError;
use crate::domain::indicator::calculate_rsi;
use crate::domain::ohlcv::{closes, Bar};
use crate::domain::strategy::{
    direction, hold_last_nonzero, require_positive, SignalProvider, StrategyParams,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Rsi {
    window: usize,
    low: f64,
    high: f64,
}

impl Rsi {
    pub fn new(window: usize, low: f64, high: f64) -> Result<Self, StratlabError> {
        require_positive("window", window)?;
        if !(0.0..=100.0).contains(&low) || !(0.0..=100.0).contains(&high) || low >= high {
            return Err(StratlabError::validation(format!(
                "rsi thresholds must satisfy 0 <= rsi_low < rsi_high <= 100, got {low} / {high}"
            )));
        }
        Ok(Self { window, low, high })
    }

    pub fn from_params(params: &StrategyParams) -> Result<Self, StratlabError> {
        Self::new(
            params.get_usize("window", 14)?,
            params.get_f64("rsi_low", 30.0)?,
            params.get_f64("rsi_high", 70.0)?,
        )
    }
}

impl SignalProvider for Rsi {
    fn name(&self) -> &str {
        "rsi"
    }

    fn generate(&self, bars: &[Bar]) -> Result<Vec<f64>, StratlabError> {
        let rsi = calculate_rsi(&closes(bars), self.window);
        let raw = rsi.into_iter().map(|v| match v {
            Some(r) => direction(r < self.low, r > self.high),
            None => 0,
        });
        Ok(hold_last_nonzero(raw))
    }
}
