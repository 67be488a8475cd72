//! # var-engine
//!
//! Monte Carlo Value-at-Risk engine with confidence calibration.
//!
//! Given the closing-price history of an instrument, the engine estimates
//! log-return statistics, simulates many cumulative-return paths across a
//! worker pool, and reads the loss at the calibrated confidence level off
//! the sorted outcomes.
//!
//! ## Architecture
//!
//! - **core** — Foundational types: instruments, price series, run records, errors
//! - **estimation** — Log-return statistics and confidence calibration
//! - **simulation** — Parallel path simulation over a fixed worker pool
//! - **risk** — Percentile extraction of VaR
//! - **engine** — Run orchestration, repository boundary, bootstrap, config

pub mod core;
pub mod engine;
pub mod estimation;
pub mod risk;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::error::{RepositoryError, VarError};
    pub use crate::core::instrument::InstrumentId;
    pub use crate::core::price_series::{PricePoint, PriceSeries};
    pub use crate::core::records::{ConfidenceHistoryRecord, SimulationRequest, VaRResult};
    pub use crate::engine::bootstrap::{bootstrap, BootstrapReport};
    pub use crate::engine::config::{BootstrapConfig, EngineConfig};
    pub use crate::engine::orchestrator::VarEngine;
    pub use crate::engine::repository::{InMemoryRepository, Repository};
    pub use crate::estimation::calibration::Calibrator;
    pub use crate::estimation::returns::{estimate, ReturnStats};
    pub use crate::risk::var_extractor::{extract_var, VarEstimate};
    pub use crate::simulation::path_simulator::{PathSimulator, SimulatedOutcome, SimulationConfig};
}
