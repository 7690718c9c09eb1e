//! RSI (Relative Strength Index) with simple-average smoothing.
//!
//! avg_gain / avg_loss are plain rolling means of the last n price changes.
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100, unless avg_gain is also 0 (undefined).
//!
//! Warmup: first n bars are `None` (need n price changes).

pub fn calculate_rsi(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() <= period {
        return out;
    }

    let changes: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();

    for i in period..values.len() {
        let window = &changes[i - period..i];
        let avg_gain = window.iter().map(|c| c.max(0.0)).sum::<f64>() / period as f64;
        let avg_loss = window.iter().map(|c| (-c).max(0.0)).sum::<f64>() / period as f64;

        out[i] = if avg_loss == 0.0 {
            (avg_gain > 0.0).then_some(100.0)
        } else {
            let rsi = 100.0 - 100.0 / (1.0 + avg_gain / avg_loss);
            rsi.is_finite().then_some(rsi)
        };
    }
    out
}
