//! Bollinger Bands.
//!
//! Middle = SMA(n), Upper = Middle + k * STDDEV(n), Lower = Middle - k * STDDEV(n)
//! STDDEV is the sample standard deviation. Warmup: first (n-1) values are `None`.

use crate::domain::indicator::{calculate_sma, calculate_stddev};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBand {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

pub fn calculate_bollinger(values: &[f64], period: usize, num_std: f64) -> Vec<Option<BollingerBand>> {
    let sma = calculate_sma(values, period);
    let sd = calculate_stddev(values, period);

    sma.into_iter()
        .zip(sd)
        .map(|(m, s)| match (m, s) {
            (Some(middle), Some(s)) => Some(BollingerBand {
                upper: middle + num_std * s,
                middle,
                lower: middle - num_std * s,
            }),
            _ => None,
        })
        .collect()
}
