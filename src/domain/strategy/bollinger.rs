//! Bollinger band reversion with persistence: close below the lower band →
//! long, above the upper band → short.

use crate::domain::error::StratlabError;
use crate::domain::indicator::calculate_bollinger;
use crate::domain::ohlcv::{closes, Bar};
use crate::domain::strategy::{direction, hold_last_nonzero, SignalProvider, StrategyParams};

#[derive(Debug, Clone, PartialEq)]
pub struct Bollinger {
    window: usize,
    num_std: f64,
}

impl Bollinger {
    pub fn new(window: usize, num_std: f64) -> Result<Self, StratlabError> {
        if window < 2 {
            return Err(StratlabError::validation("bollinger window must be at least 2"));
        }
        if num_std <= 0.0 {
            return Err(StratlabError::validation("num_std must be positive"));
        }
        Ok(Self { window, num_std })
    }

    pub fn from_params(params: &StrategyParams) -> Result<Self, StratlabError> {
        Self::new(
            params.get_usize("window", 20)?,
            params.get_f64("num_std", 2.0)?,
        )
    }
}

impl SignalProvider for Bollinger {
    fn name(&self) -> &str {
        "bollinger"
    }

    fn generate(&self, bars: &[Bar]) -> Result<Vec<f64>, StratlabError> {
        let bands = calculate_bollinger(&closes(bars), self.window, self.num_std);
        let raw = bars.iter().zip(bands).map(|(bar, band)| match band {
            Some(b) => direction(bar.close < b.lower, bar.close > b.upper),
            None => 0,
        });
        Ok(hold_last_nonzero(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::test_support::bars_from_closes;

    #[test]
    fn spike_down_goes_long_spike_up_goes_short() {
        let prices = [100.0, 101.0, 100.0, 101.0, 80.0, 100.0, 101.0, 100.0, 101.0, 125.0];
        let s = Bollinger::new(4, 1.0).unwrap();
        let signal = s.generate(&bars_from_closes(&prices)).unwrap();
        assert_eq!(signal[4], 1.0);
        assert_eq!(signal[9], -1.0);
    }

    #[test]
    fn invalid_params() {
        assert!(Bollinger::new(1, 2.0).is_err());
        assert!(Bollinger::new(20, 0.0).is_err());
    }
}
