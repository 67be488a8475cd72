//! Log-return statistics over a trailing window of closing prices.

use crate::core::error::VarError;
use crate::core::price_series::PriceSeries;
use log::info;
use serde::{Deserialize, Serialize};

/// Minimum number of log-returns needed for a sample standard deviation.
pub const MIN_RETURN_SAMPLES: usize = 2;

/// Mean and sample volatility of daily log-returns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnStats {
    pub mean_return: f64,
    /// Sample standard deviation (denominator `sample_size - 1`).
    pub volatility: f64,
    pub sample_size: usize,
}

impl ReturnStats {
    /// Compute statistics from a sample of log-returns.
    pub fn from_sample(returns: &[f64]) -> Result<Self, VarError> {
        let count = returns.len();
        if count < MIN_RETURN_SAMPLES {
            return Err(VarError::InsufficientSamples {
                available: count,
                required: MIN_RETURN_SAMPLES,
            });
        }
        let mean_return = returns.iter().sum::<f64>() / count as f64;
        let sum_sq: f64 = returns.iter().map(|r| (r - mean_return).powi(2)).sum();
        let volatility = (sum_sq / (count - 1) as f64).sqrt();

        Ok(Self {
            mean_return,
            volatility,
            sample_size: count,
        })
    }
}

/// Horizon actually usable against `prices`: requests longer than the
/// history are clamped to the series length.
pub fn effective_horizon(prices: &PriceSeries, horizon_days: usize) -> usize {
    horizon_days.min(prices.len())
}

/// Trailing log-returns, newest first.
///
/// A window of `horizon_days` prices yields `horizon_days - 1` returns:
/// `ln(p[len-i] / p[len-i-1])` for `i` in `1..horizon_days`.
pub fn trailing_log_returns(prices: &PriceSeries, horizon_days: usize) -> Vec<f64> {
    let closes = prices.points();
    let len = closes.len();
    let days = effective_horizon(prices, horizon_days);
    (1..days)
        .map(|i| (closes[len - i].close / closes[len - i - 1].close).ln())
        .collect()
}

/// Estimate mean log-return and volatility over the trailing window.
///
/// `horizon_days` larger than the history is silently clamped to
/// `prices.len()`.
///
/// # Errors
///
/// - `InvalidParameter` if `horizon_days` is zero.
/// - `InsufficientSamples` if the window yields fewer than two returns.
pub fn estimate(prices: &PriceSeries, horizon_days: usize) -> Result<ReturnStats, VarError> {
    if horizon_days == 0 {
        return Err(VarError::invalid("horizon_days", "must be at least 1"));
    }
    let days = effective_horizon(prices, horizon_days);
    if days < horizon_days {
        info!(
            "requested horizon of {} days exceeds {} available prices; using all available data",
            horizon_days, days
        );
    }
    ReturnStats::from_sample(&trailing_log_returns(prices, days))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn series(closes: &[f64]) -> PriceSeries {
        PriceSeries::from_closes(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), closes).unwrap()
    }

    #[test]
    fn test_trailing_returns_use_most_recent_prices() {
        let prices = series(&[100.0, 102.0, 98.0, 101.0, 100.0]);
        let returns = trailing_log_returns(&prices, 4);
        assert_eq!(returns.len(), 3);
        assert_relative_eq!(returns[0], (100.0f64 / 101.0).ln());
        assert_relative_eq!(returns[1], (101.0f64 / 98.0).ln());
        assert_relative_eq!(returns[2], (98.0f64 / 102.0).ln());
    }

    #[test]
    fn test_estimate_matches_hand_computation() {
        let prices = series(&[100.0, 102.0, 98.0, 101.0, 100.0]);
        let stats = estimate(&prices, 4).unwrap();

        let r = [
            (101.0f64 / 98.0).ln(),
            (98.0f64 / 102.0).ln(),
            (100.0f64 / 101.0).ln(),
        ];
        let mean = r.iter().sum::<f64>() / 3.0;
        let var = r.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / 2.0;

        assert_eq!(stats.sample_size, 3);
        assert_relative_eq!(stats.mean_return, mean, epsilon = 1e-15);
        assert_relative_eq!(stats.volatility, var.sqrt(), epsilon = 1e-15);
    }

    #[test]
    fn test_constant_prices_have_zero_volatility() {
        let stats = estimate(&series(&[50.0; 10]), 10).unwrap();
        assert_eq!(stats.mean_return, 0.0);
        assert_eq!(stats.volatility, 0.0);
    }

    #[test]
    fn test_horizon_is_clamped_to_history() {
        let prices = series(&[100.0, 103.0, 99.0, 104.0]);
        assert_eq!(estimate(&prices, 50).unwrap(), estimate(&prices, 4).unwrap());
    }

    #[test]
    fn test_single_price_is_insufficient() {
        let err = estimate(&series(&[100.0]), 10).unwrap_err();
        assert!(matches!(
            err,
            VarError::InsufficientSamples { available: 0, required: 2 }
        ));
    }

    #[test]
    fn test_two_prices_give_one_return_which_is_insufficient() {
        let err = estimate(&series(&[100.0, 101.0]), 2).unwrap_err();
        assert!(matches!(err, VarError::InsufficientSamples { available: 1, .. }));
    }

    #[test]
    fn test_zero_horizon_is_invalid() {
        let err = estimate(&series(&[100.0, 101.0, 102.0]), 0).unwrap_err();
        assert!(matches!(err, VarError::InvalidParameter { name: "horizon_days", .. }));
    }
}
