#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use stratlab::domain::backtest::BacktestConfig;
use stratlab::domain::error::StratlabError;
use stratlab::domain::metrics::Frequency;
pub use stratlab::domain::ohlcv::Bar;
use stratlab::ports::data_port::DataPort;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, StratlabError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(StratlabError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, StratlabError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn ts(day: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::days(day)
}

/// Daily bars starting 2024-01-01, close only.
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar::new(ts(i as i64), c))
        .collect()
}

/// Deterministic trending, oscillating price path.
pub fn generate_prices(count: usize, start_price: f64) -> Vec<f64> {
    (0..count)
        .map(|i| {
            let x = i as f64;
            start_price + 0.08 * x + 6.0 * (x / 11.0).sin() + 2.5 * (x / 3.1).cos()
        })
        .collect()
}

pub fn example_config() -> BacktestConfig {
    BacktestConfig::new(10_000.0, 0.001, 0.0005, Frequency::Daily).unwrap()
}

pub fn frictionless_config() -> BacktestConfig {
    BacktestConfig::new(10_000.0, 0.0, 0.0, Frequency::Daily).unwrap()
}

pub fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Write `<dir>/<symbol>.csv` with `date,close` rows.
pub fn write_price_csv(dir: &Path, symbol: &str, closes: &[f64]) -> std::path::PathBuf {
    let mut content = String::from("date,close\n");
    for (i, c) in closes.iter().enumerate() {
        content.push_str(&format!("{},{}\n", ts(i as i64).format("%Y-%m-%d"), c));
    }
    let path = dir.join(format!("{symbol}.csv"));
    std::fs::write(&path, content).unwrap();
    path
}
