use crate::core::error::VarError;
use crate::core::instrument::InstrumentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Parameters of one Monte Carlo VaR calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub instrument_id: InstrumentId,
    pub horizon_days: usize,
    pub num_paths: usize,
    pub confidence_level: f64,
}

impl SimulationRequest {
    pub fn new(
        instrument_id: InstrumentId,
        horizon_days: usize,
        num_paths: usize,
        confidence_level: f64,
    ) -> Self {
        Self {
            instrument_id,
            horizon_days,
            num_paths,
            confidence_level,
        }
    }

    /// Check horizon ≥ 1, paths ≥ 1 and confidence in the open interval (0, 1).
    pub fn validate(&self) -> Result<(), VarError> {
        if self.horizon_days < 1 {
            return Err(VarError::invalid("horizon_days", "must be at least 1"));
        }
        if self.num_paths < 1 {
            return Err(VarError::invalid("num_paths", "must be at least 1"));
        }
        validate_confidence(self.confidence_level)
    }
}

pub(crate) fn validate_confidence(confidence_level: f64) -> Result<(), VarError> {
    if confidence_level > 0.0 && confidence_level < 1.0 {
        Ok(())
    } else {
        Err(VarError::invalid(
            "confidence_level",
            format!("must lie in (0, 1), got {}", confidence_level),
        ))
    }
}

/// Outcome of one VaR run, handed to the repository for persistence.
///
/// `horizon_days` is the effective horizon after clamping to the available
/// price history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaRResult {
    pub run_id: Uuid,
    pub instrument_id: InstrumentId,
    pub horizon_days: usize,
    pub num_paths: usize,
    pub mean_return: f64,
    pub volatility: f64,
    pub initial_price: f64,
    pub confidence_level: f64,
    /// Monetary loss per unit held. Negative values are not clamped.
    pub var_amount: f64,
    pub var_percentage: f64,
}

impl fmt::Display for VaRResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Value at Risk: {} ===", self.instrument_id)?;
        writeln!(f, "Run:               {}", self.run_id)?;
        writeln!(f, "Horizon:           {} days", self.horizon_days)?;
        writeln!(f, "Simulated paths:   {}", self.num_paths)?;
        writeln!(f, "Initial price:     {:.2}", self.initial_price)?;
        writeln!(f, "Mean return:       {:.6}", self.mean_return)?;
        writeln!(f, "Volatility:        {:.6}", self.volatility)?;
        writeln!(f, "Confidence level:  {:.2}%", self.confidence_level * 100.0)?;
        writeln!(
            f,
            "VaR:               {:.2} ({:.2}% of initial investment)",
            self.var_amount, self.var_percentage
        )
    }
}

/// A confidence level used in a past run. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceHistoryRecord {
    pub instrument_id: InstrumentId,
    pub confidence_level: f64,
    pub timestamp: DateTime<Utc>,
}

impl ConfidenceHistoryRecord {
    pub fn new(instrument_id: InstrumentId, confidence_level: f64) -> Self {
        Self {
            instrument_id,
            confidence_level,
            timestamp: Utc::now(),
        }
    }
}
