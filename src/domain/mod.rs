//! Core domain types and logic: the backtest pipeline, trade extraction,
//! risk metrics, strategies, signal combination and parameter search.

pub mod ohlcv;
pub mod cost;
pub mod backtest;
pub mod trade_log;
pub mod metrics;
pub mod indicator;
pub mod strategy;
pub mod combiner;
pub mod optimizer;
pub mod config_validation;
pub mod error;
