//! Rolling standard deviation of closing prices.
//!
//! STDDEV(n)[i] = sqrt(sum((C[i-j] - SMA(n)[i])^2 for j in 0..n-1) / (n - ddof))
//! `ddof = 0` gives the population deviation used by Bollinger Bands,
//! `ddof = 1` the sample deviation used for volatility targets.
//! Warmup: first (n-1) bars are invalid.

/// Trailing standard deviation over exactly `period` values. `None` while
/// fewer than `period` values are available, or when `period <= ddof`.
pub fn rolling_stddev(values: &[f64], period: usize, ddof: usize) -> Vec<Option<f64>> {
    if period == 0 || period <= ddof {
        return vec![None; values.len()];
    }

    let warmup = period - 1;
    let divisor = (period - ddof) as f64;

    (0..values.len())
        .map(|i| {
            if i < warmup {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            let mean = window.iter().sum::<f64>() / period as f64;
            let variance = window
                .iter()
                .map(|v| {
                    let diff = v - mean;
                    diff * diff
                })
                .sum::<f64>()
                / divisor;
            Some(variance.sqrt())
        })
        .collect()
}
