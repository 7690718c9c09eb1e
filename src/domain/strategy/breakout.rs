//! Channel breakout with persistence.
//!
//! Long when the close exceeds the highest high of the previous
//! `high_window` bars, short when it falls below the lowest low of the
//! previous `low_window` bars. The channel never includes the current bar;
//! bars without high/low fall back to the close.

use crate::domain::error::StratlabError;
use crate::domain::indicator::{rolling_max, rolling_min};
use crate::domain::ohlcv::Bar;
use crate::domain::strategy::{
    direction, hold_last_nonzero, require_positive, SignalProvider, StrategyParams,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakout {
    high_window: usize,
    low_window: usize,
}

impl Breakout {
    pub fn new(high_window: usize, low_window: usize) -> Result<Self, StratlabError> {
        require_positive("high_window", high_window)?;
        require_positive("low_window", low_window)?;
        Ok(Self {
            high_window,
            low_window,
        })
    }

    pub fn from_params(params: &StrategyParams) -> Result<Self, StratlabError> {
        Self::new(
            params.get_usize("high_window", 20)?,
            params.get_usize("low_window", 10)?,
        )
    }
}

impl SignalProvider for Breakout {
    fn name(&self) -> &str {
        "breakout"
    }

    fn generate(&self, bars: &[Bar]) -> Result<Vec<f64>, StratlabError> {
        let highs: Vec<f64> = bars.iter().map(Bar::high_or_close).collect();
        let lows: Vec<f64> = bars.iter().map(Bar::low_or_close).collect();
        let upper = rolling_max(&highs, self.high_window);
        let lower = rolling_min(&lows, self.low_window);

        // channel at t is the window ending at t - 1
        let raw = bars.iter().enumerate().map(|(i, bar)| {
            if i == 0 {
                return 0;
            }
            let long = upper[i - 1].is_some_and(|h| bar.close > h);
            let short = lower[i - 1].is_some_and(|l| bar.close < l);
            direction(long, short)
        });
        Ok(hold_last_nonzero(raw))
    }
}
