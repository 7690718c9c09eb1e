//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//!
//! Default parameters: fast=12, slow=26, signal=9

use crate::domain::indicator::calculate_ema;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdPoint {
    pub line: f64,
    pub signal: f64,
}

impl MacdPoint {
    pub fn histogram(&self) -> f64 {
        self.line - self.signal
    }
}

pub fn calculate_macd(values: &[f64], fast: usize, slow: usize, signal_span: usize) -> Vec<MacdPoint> {
    let ema_fast = calculate_ema(values, fast);
    let ema_slow = calculate_ema(values, slow);
    let line: Vec<f64> = ema_fast.iter().zip(&ema_slow).map(|(f, s)| f - s).collect();
    let signal = calculate_ema(&line, signal_span);

    line.into_iter()
        .zip(signal)
        .map(|(line, signal)| MacdPoint { line, signal })
        .collect()
}
