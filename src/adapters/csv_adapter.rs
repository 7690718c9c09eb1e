//! CSV file price data adapter.
//!
//! One file per symbol, `<base>/<symbol>.csv`. Columns are located by
//! header name: the first of `timestamp`/`datetime`/`date` for time and the
//! first of `close`/`price` for the close; `open`, `high`, `low`, `volume`
//! are picked up when present. Rows whose time or close cannot be parsed
//! are skipped with a warning.

use crate::domain::error::StratlabError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::warn;

const TIME_COLUMNS: [&str; 3] = ["timestamp", "datetime", "date"];
const CLOSE_COLUMNS: [&str; 2] = ["close", "price"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, StratlabError> {
        load_bars(&self.csv_path(symbol))
    }

    fn list_symbols(&self) -> Result<Vec<String>, StratlabError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| StratlabError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StratlabError::Data {
                reason: format!("directory entry error: {}", e),
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

/// Read a single CSV file of bars.
pub fn load_bars(path: &Path) -> Result<Vec<Bar>, StratlabError> {
    let file = fs::File::open(path).map_err(|e| StratlabError::Data {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;
    read_bars(file, &path.display().to_string())
}

struct Columns {
    time: usize,
    close: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    volume: Option<usize>,
}

impl Columns {
    fn locate(headers: &csv::StringRecord, source: &str) -> Result<Self, StratlabError> {
        let names: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |candidates: &[&str]| {
            candidates
                .iter()
                .find_map(|c| names.iter().position(|n| n == c))
        };

        let time = find(&TIME_COLUMNS).ok_or_else(|| StratlabError::Data {
            reason: format!("{source}: no timestamp/datetime/date column"),
        })?;
        let close = find(&CLOSE_COLUMNS).ok_or_else(|| StratlabError::Data {
            reason: format!("{source}: no close/price column"),
        })?;

        Ok(Self {
            time,
            close,
            open: find(&["open"]),
            high: find(&["high"]),
            low: find(&["low"]),
            volume: find(&["volume"]),
        })
    }
}

/// Parse bars from any CSV reader; `source` names the input in messages.
pub fn read_bars<R: Read>(reader: R, source: &str) -> Result<Vec<Bar>, StratlabError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers().map_err(|e| StratlabError::Data {
        reason: format!("{source}: CSV header error: {e}"),
    })?;
    let cols = Columns::locate(headers, source)?;

    let mut bars = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| StratlabError::Data {
            reason: format!("{source}: CSV parse error: {e}"),
        })?;

        let Some(timestamp) = record.get(cols.time).and_then(parse_timestamp) else {
            warn!(source, row, "skipping row with unparsable timestamp");
            continue;
        };
        let Some(close) = field(&record, Some(cols.close)) else {
            warn!(source, row, "skipping row with unparsable close");
            continue;
        };

        bars.push(Bar {
            timestamp,
            open: field(&record, cols.open),
            high: field(&record, cols.high),
            low: field(&record, cols.low),
            close,
            volume: field(&record, cols.volume),
        });
    }

    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

fn field(record: &csv::StringRecord, idx: Option<usize>) -> Option<f64> {
    idx.and_then(|i| record.get(i))
        .and_then(|v| v.parse::<f64>().ok())
}

/// Accepts `YYYY-MM-DD HH:MM:SS`, the `T`-separated form, `YYYY-MM-DD HH:MM`
/// and bare dates (midnight).
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "Date,Open,High,Low,Close,Volume\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n";

        fs::write(path.join("BHP.csv"), csv_content).unwrap();
        fs::write(path.join("BTC.csv"), "datetime,price\n").unwrap();
        fs::write(path.join("notes.txt"), "ignored").unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_bars_returns_sorted_ohlcv() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_bars("BHP").unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].timestamp, parse_timestamp("2024-01-15").unwrap());
        assert_eq!(bars[0].open, Some(100.0));
        assert_eq!(bars[0].high, Some(110.0));
        assert_eq!(bars[0].low, Some(90.0));
        assert_eq!(bars[0].close, 105.0);
        assert_eq!(bars[0].volume, Some(50000.0));
    }

    #[test]
    fn fetch_bars_errors_for_missing_file() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert!(matches!(
            adapter.fetch_bars("XYZ"),
            Err(StratlabError::Data { .. })
        ));
    }

    #[test]
    fn list_symbols_returns_csv_stems() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert_eq!(adapter.list_symbols().unwrap(), vec!["BHP", "BTC"]);
    }

    #[test]
    fn close_only_with_intraday_timestamps() {
        let data = "timestamp,close\n\
            2024-03-01 09:30:00,10.5\n\
            2024-03-01T09:31:00,10.6\n\
            2024-03-01 09:32,10.7\n";
        let bars = read_bars(data.as_bytes(), "inline").unwrap();
        assert_eq!(bars.len(), 3);
        assert!(bars.iter().all(|b| b.open.is_none() && b.volume.is_none()));
        assert_eq!(bars[2].close, 10.7);
    }

    #[test]
    fn bad_rows_are_skipped() {
        let data = "date,close\n2024-01-01,1.0\nnot-a-date,2.0\n2024-01-03,n/a\n2024-01-04,4.0\n";
        let bars = read_bars(data.as_bytes(), "inline").unwrap();
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 4.0]);
    }

    #[test]
    fn missing_required_header_is_an_error() {
        let err = read_bars("date,volume\n2024-01-01,5\n".as_bytes(), "inline").unwrap_err();
        assert!(matches!(err, StratlabError::Data { .. }));
        let err = read_bars("close\n1.0\n".as_bytes(), "inline").unwrap_err();
        assert!(matches!(err, StratlabError::Data { .. }));
    }

    #[test]
    fn timestamp_formats() {
        assert!(parse_timestamp("2024-01-02").is_some());
        assert!(parse_timestamp("2024-01-02 10:00:00").is_some());
        assert!(parse_timestamp("02/01/2024").is_none());
    }
}
