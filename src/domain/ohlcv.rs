//! Price bar representation.

use chrono::NaiveDateTime;

/// One bar of market data. Only `close` is required; the other prices are
/// optional because many sources publish closes only.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<f64>,
}

impl Bar {
    /// Close-only bar.
    pub fn new(timestamp: NaiveDateTime, close: f64) -> Self {
        Self {
            timestamp,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }

    /// High, or close when the source has no high.
    pub fn high_or_close(&self) -> f64 {
        self.high.unwrap_or(self.close)
    }

    /// Low, or close when the source has no low.
    pub fn low_or_close(&self) -> f64 {
        self.low.unwrap_or(self.close)
    }
}

/// Closing prices of a bar slice, in order.
pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn sample_bar() -> Bar {
        Bar {
            timestamp: ts(15),
            open: Some(100.0),
            high: Some(110.0),
            low: Some(90.0),
            close: 105.0,
            volume: Some(50_000.0),
        }
    }

    #[test]
    fn close_only_bar_falls_back_to_close() {
        let bar = Bar::new(ts(2), 42.0);
        assert_eq!(bar.high_or_close(), 42.0);
        assert_eq!(bar.low_or_close(), 42.0);

        let full = sample_bar();
        assert_eq!(full.high_or_close(), 110.0);
        assert_eq!(full.low_or_close(), 90.0);
    }

    #[test]
    fn closes_preserves_order() {
        let bars = vec![Bar::new(ts(1), 1.0), Bar::new(ts(2), 2.0), sample_bar()];
        assert_eq!(closes(&bars), vec![1.0, 2.0, 105.0]);
    }
}
