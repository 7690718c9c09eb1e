//! Moving-average crossover.
//!
//! Long while SMA(short) > SMA(long), short while below, flat when equal or
//! during warm-up. No persistence: the crossover state is always defined.

use crate::domain::error::StratlabError;
use crate::domain::indicator::calculate_sma;
use crate::domain::ohlcv::{closes, Bar};
use crate::domain::strategy::{direction, require_positive, SignalProvider, StrategyParams};

pub const DEFAULT_SHORT: usize = 10;
pub const DEFAULT_LONG: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovingAverage {
    short: usize,
    long: usize,
}

impl MovingAverage {
    pub fn new(short: usize, long: usize) -> Result<Self, StratlabError> {
        require_positive("short_window", short)?;
        require_positive("long_window", long)?;
        if short >= long {
            return Err(StratlabError::validation(format!(
                "short_window ({short}) must be less than long_window ({long})"
            )));
        }
        Ok(Self { short, long })
    }

    pub fn from_params(params: &StrategyParams) -> Result<Self, StratlabError> {
        Self::new(
            params.get_usize("short_window", DEFAULT_SHORT)?,
            params.get_usize("long_window", DEFAULT_LONG)?,
        )
    }
}

impl SignalProvider for MovingAverage {
    fn name(&self) -> &str {
        "ma"
    }

    fn generate(&self, bars: &[Bar]) -> Result<Vec<f64>, StratlabError> {
        let prices = closes(bars);
        let fast = calculate_sma(&prices, self.short);
        let slow = calculate_sma(&prices, self.long);

        Ok(fast
            .into_iter()
            .zip(slow)
            .map(|pair| match pair {
                (Some(f), Some(s)) => f64::from(direction(f > s, f < s)),
                _ => 0.0,
            })
            .collect())
    }
}
