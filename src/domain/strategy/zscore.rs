//! Z-score mean reversion.
//!
//! z = (close - SMA(n)) / STDDEV(n). z < -z_entry → long, z > z_entry →
//! short, held otherwise. A zero deviation window gives no reading.

use crate::domain::error::StratlabError;
use crate::domain::indicator::{calculate_sma, calculate_stddev};
use crate::domain::ohlcv::{closes, Bar};
use crate::domain::strategy::{direction, hold_last_nonzero, SignalProvider, StrategyParams};

#[derive(Debug, Clone, PartialEq)]
pub struct ZScore {
    window: usize,
    z_entry: f64,
}

impl ZScore {
    pub fn new(window: usize, z_entry: f64) -> Result<Self, StratlabError> {
        if window < 2 {
            return Err(StratlabError::validation("zscore window must be at least 2"));
        }
        if z_entry <= 0.0 {
            return Err(StratlabError::validation("z_entry must be positive"));
        }
        Ok(Self { window, z_entry })
    }

    pub fn from_params(params: &StrategyParams) -> Result<Self, StratlabError> {
        Self::new(
            params.get_usize("window", 20)?,
            params.get_f64("z_entry", 2.0)?,
        )
    }

    /// Rolling z-score of the close, `None` while warming up or when the
    /// window has no dispersion.
    pub fn scores(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let prices = closes(bars);
        let mean = calculate_sma(&prices, self.window);
        let sd = calculate_stddev(&prices, self.window);
        prices
            .iter()
            .zip(mean.into_iter().zip(sd))
            .map(|(&p, pair)| match pair {
                (Some(m), Some(s)) if s > 0.0 => Some((p - m) / s),
                _ => None,
            })
            .collect()
    }
}

impl SignalProvider for ZScore {
    fn name(&self) -> &str {
        "zscore"
    }

    fn generate(&self, bars: &[Bar]) -> Result<Vec<f64>, StratlabError> {
        let raw = self.scores(bars).into_iter().map(|z| match z {
            Some(z) => direction(z < -self.z_entry, z > self.z_entry),
            None => 0,
        });
        Ok(hold_last_nonzero(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::test_support::bars_from_closes;
    use approx::assert_relative_eq;

    #[test]
    fn score_matches_hand_calculation() {
        let s = ZScore::new(3, 1.0).unwrap();
        let z = s.scores(&bars_from_closes(&[2.0, 4.0, 9.0]));
        // mean 5, sample std sqrt((9 + 1 + 16) / 2) = sqrt(13)
        assert_relative_eq!(z[2].unwrap(), 4.0 / 13f64.sqrt(), epsilon = 1e-12);
        assert!(z[0].is_none() && z[1].is_none());
    }

    #[test]
    fn extreme_readings_trigger_and_hold() {
        let prices = [10.0, 10.1, 9.9, 10.0, 14.0, 10.0, 10.1, 5.0];
        let signal = ZScore::new(4, 1.2)
            .unwrap()
            .generate(&bars_from_closes(&prices))
            .unwrap();
        assert_eq!(signal[4], -1.0);
        assert_eq!(signal[7], 1.0);
    }

    #[test]
    fn flat_window_has_no_reading() {
        let s = ZScore::new(3, 2.0).unwrap();
        assert!(s.scores(&bars_from_closes(&[5.0; 4])).iter().all(Option::is_none));
    }
}
