//! Rolling sample standard deviation.
//!
//! STDDEV(n)[i] = sqrt(sum((C[i-j] - SMA(n)[i])^2 for j in 0..n) / (n - 1))
//! Warmup: first (n-1) values are `None`; n < 2 is always `None`.

use crate::domain::indicator::rolling;

pub fn calculate_stddev(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period < 2 {
        return vec![None; values.len()];
    }
    rolling(values, period, |w| {
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        let var = w.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (w.len() - 1) as f64;
        var.sqrt()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stddev_known_values() {
        let sd = calculate_stddev(&[2.0, 4.0, 6.0], 3);
        assert_eq!(sd[0], None);
        assert_eq!(sd[1], None);
        // mean 4, squared deviations 4 + 0 + 4 over (3 - 1)
        assert!((sd[2].unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn stddev_constant_is_zero() {
        let sd = calculate_stddev(&[3.0; 5], 4);
        assert_eq!(sd[3], Some(0.0));
    }

    #[test]
    fn stddev_period_one_undefined() {
        assert!(calculate_stddev(&[1.0, 2.0], 1).iter().all(Option::is_none));
    }
}
