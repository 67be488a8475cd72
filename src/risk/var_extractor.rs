use crate::core::error::VarError;
use crate::core::records::validate_confidence;
use crate::simulation::path_simulator::SimulatedOutcome;
use log::warn;
use serde::{Deserialize, Serialize};

/// Loss at the requested percentile of simulated outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarEstimate {
    /// `initial_price * -selected_return`. Not clamped at zero.
    pub var_amount: f64,
    pub var_percentage: f64,
    /// Position of the selected return in the ascending sort.
    pub index: usize,
    pub selected_return: f64,
}

/// Percentile index for `confidence_level` among `num_paths` sorted
/// outcomes: `floor((1 - c) * n)`, clamped to `[0, n - 1]`.
pub fn percentile_index(confidence_level: f64, num_paths: usize) -> usize {
    if num_paths == 0 {
        return 0;
    }
    let raw = ((1.0 - confidence_level) * num_paths as f64).floor();
    // Float-to-int casts saturate; negative and NaN land on 0.
    (raw as usize).min(num_paths - 1)
}

/// Convert simulated cumulative returns into a monetary VaR.
///
/// Outcomes are sorted ascending (worst first) and the return at
/// [`percentile_index`] is scaled by `initial_price`. A negative VaR is
/// returned unchanged and logged as a data-quality signal.
pub fn extract_var(
    outcome: SimulatedOutcome,
    initial_price: f64,
    confidence_level: f64,
) -> Result<VarEstimate, VarError> {
    validate_confidence(confidence_level)?;
    if outcome.is_empty() {
        return Err(VarError::invalid("outcome", "no simulated paths"));
    }
    if !initial_price.is_finite() || initial_price <= 0.0 {
        return Err(VarError::invalid(
            "initial_price",
            format!("must be positive, got {}", initial_price),
        ));
    }

    let mut sorted = outcome.into_returns();
    sorted.sort_unstable_by(f64::total_cmp);

    let index = percentile_index(confidence_level, sorted.len());
    let selected_return = sorted[index];
    // `+ 0.0` folds a negated zero return into +0.0.
    let var_amount = initial_price * -selected_return + 0.0;
    let var_percentage = var_amount / initial_price * 100.0;

    if var_amount < 0.0 {
        warn!(
            "negative VaR {:.6} at {:.2}% confidence: simulated percentile return {:.6} is a gain",
            var_amount,
            confidence_level * 100.0,
            selected_return
        );
    }

    Ok(VarEstimate {
        var_amount,
        var_percentage,
        index,
        selected_return,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_index_bounds() {
        assert_eq!(percentile_index(0.95, 1000), 50);
        assert_eq!(percentile_index(0.95, 10), 0);
        assert_eq!(percentile_index(0.5, 1), 0);
        assert_eq!(percentile_index(1e-12, 100), 99);
    }

    #[test]
    fn test_selects_percentile_from_unsorted_outcomes() {
        // -0.10 ..= 0.09 in descending order.
        let returns: Vec<f64> = (0..20).rev().map(|i| (i as f64 - 10.0) / 100.0).collect();
        let est = extract_var(SimulatedOutcome::from_returns(returns), 200.0, 0.75).unwrap();

        assert_eq!(est.index, 5);
        assert_relative_eq!(est.selected_return, -0.05);
        assert_relative_eq!(est.var_amount, 10.0, epsilon = 1e-12);
        assert_relative_eq!(est.var_percentage, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_negative_var_is_not_clamped() {
        let est = extract_var(SimulatedOutcome::from_returns(vec![0.05; 10]), 100.0, 0.95).unwrap();
        assert!(est.var_amount < 0.0);
        assert_relative_eq!(est.var_amount, -5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_returns_give_zero_var() {
        let est = extract_var(SimulatedOutcome::from_returns(vec![0.0; 100]), 100.0, 0.99).unwrap();
        assert_eq!(est.var_amount, 0.0);
    }

    #[test]
    fn test_rejects_invalid_input() {
        assert!(extract_var(SimulatedOutcome::from_returns(vec![]), 100.0, 0.95).is_err());
        assert!(extract_var(SimulatedOutcome::from_returns(vec![0.1]), 100.0, 1.0).is_err());
        assert!(extract_var(SimulatedOutcome::from_returns(vec![0.1]), -1.0, 0.95).is_err());
    }
}
