//! Exponential Moving Average.
//!
//! k = 2/(span+1), seeded with the first value, then
//! EMA[i] = C[i]*k + EMA[i-1]*(1-k). Defined from the first bar onward.

pub fn calculate_ema(values: &[f64], span: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }

    let k = 2.0 / (span.max(1) as f64 + 1.0);
    let mut ema = values[0];
    out.push(ema);
    for &v in &values[1..] {
        ema = v * k + ema * (1.0 - k);
        out.push(ema);
    }
    out
}
