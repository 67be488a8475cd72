use crate::core::error::VarError;
use crate::core::records::validate_confidence;
use crate::estimation::calibration::DEFAULT_CONFIDENCE_LEVEL;
use crate::simulation::path_simulator::SimulationConfig;
use serde::{Deserialize, Serialize};

/// Number of simulated paths per run.
pub const DEFAULT_NUM_PATHS: usize = 10_000;

/// Settings for a [`VarEngine`](crate::engine::orchestrator::VarEngine).
///
/// Every field has a default, so a partial JSON document is a valid config.
///
/// # Examples
///
/// ```
/// use var_engine::engine::config::EngineConfig;
///
/// let config: EngineConfig = serde_json::from_str(r#"{ "num_paths": 5000 }"#).unwrap();
/// assert_eq!(config.num_paths, 5000);
/// assert_eq!(config.default_confidence, 0.95);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub num_paths: usize,
    /// Confidence level for instruments without calibration history.
    pub default_confidence: f64,
    /// Append the confidence level of every steady-state run to the
    /// calibration history. Bootstrap runs always record theirs.
    pub record_confidence: bool,
    pub simulation: SimulationConfig,
    pub bootstrap: BootstrapConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            num_paths: DEFAULT_NUM_PATHS,
            default_confidence: DEFAULT_CONFIDENCE_LEVEL,
            record_confidence: false,
            simulation: SimulationConfig::default(),
            bootstrap: BootstrapConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), VarError> {
        if self.num_paths < 1 {
            return Err(VarError::invalid("num_paths", "must be at least 1"));
        }
        validate_confidence(self.default_confidence)?;
        if self.simulation.worker_count == Some(0) {
            return Err(VarError::invalid("worker_count", "must be at least 1"));
        }
        if self.simulation.paths_per_block == 0 {
            return Err(VarError::invalid("paths_per_block", "must be at least 1"));
        }
        let periods = self.simulation.trading_periods_per_year;
        if !periods.is_finite() || periods <= 0.0 {
            return Err(VarError::invalid(
                "trading_periods_per_year",
                format!("must be positive, got {}", periods),
            ));
        }
        self.bootstrap.validate()
    }
}

/// Ranges sampled when seeding history for instruments never run before.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Inclusive horizon range in days.
    pub min_horizon_days: usize,
    pub max_horizon_days: usize,
    /// Half-open confidence range `[min, max)`.
    pub min_confidence: f64,
    pub max_confidence: f64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            min_horizon_days: 10,
            max_horizon_days: 100,
            min_confidence: 0.90,
            max_confidence: 1.00,
        }
    }
}

impl BootstrapConfig {
    pub fn validate(&self) -> Result<(), VarError> {
        if self.min_horizon_days < 1 || self.min_horizon_days > self.max_horizon_days {
            return Err(VarError::invalid(
                "bootstrap.horizon_days",
                format!(
                    "need 1 <= min <= max, got [{}, {}]",
                    self.min_horizon_days, self.max_horizon_days
                ),
            ));
        }
        if !(self.min_confidence > 0.0
            && self.min_confidence < self.max_confidence
            && self.max_confidence <= 1.0)
        {
            return Err(VarError::invalid(
                "bootstrap.confidence",
                format!(
                    "need 0 < min < max <= 1, got [{}, {})",
                    self.min_confidence, self.max_confidence
                ),
            ));
        }
        Ok(())
    }
}
