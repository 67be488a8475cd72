//! One-time seeding of calibration history.
//!
//! When the repository holds no results and no confidence records at all,
//! every known instrument gets one VaR run at a random horizon and random
//! confidence level. Both the result and the confidence level are stored,
//! giving later runs a history to calibrate from.

use crate::core::error::VarError;
use crate::core::instrument::InstrumentId;
use crate::core::records::VaRResult;
use crate::engine::orchestrator::VarEngine;
use crate::engine::repository::Repository;
use log::{info, warn};
use rand::Rng;

/// Outcome of a bootstrap pass.
#[derive(Debug, Clone, Default)]
pub struct BootstrapReport {
    pub seeded: Vec<VaRResult>,
    /// Instruments without usable data, with the reason.
    pub skipped: Vec<(InstrumentId, String)>,
}

impl BootstrapReport {
    pub fn is_empty(&self) -> bool {
        self.seeded.is_empty() && self.skipped.is_empty()
    }
}

/// Seed history for every known instrument if none exists yet.
///
/// Horizon and confidence are drawn from `rng` within the engine's
/// [`BootstrapConfig`](crate::engine::config::BootstrapConfig) ranges.
/// Instruments with missing or too-short price history are skipped;
/// repository and simulation failures abort the pass.
///
/// The guard is repository-wide: once any result or confidence record
/// exists the pass does nothing. An instrument added after the first
/// bootstrap is therefore never seeded, and calibrates to the engine's
/// default confidence until its own history is recorded (for example
/// with [`EngineConfig::record_confidence`](crate::engine::config::EngineConfig::record_confidence)).
pub fn bootstrap<P, R>(
    engine: &VarEngine,
    repository: &mut P,
    rng: &mut R,
) -> Result<BootstrapReport, VarError>
where
    P: Repository + ?Sized,
    R: Rng + ?Sized,
{
    let mut report = BootstrapReport::default();
    if repository.has_any_history()? {
        info!("calibration history present, skipping bootstrap");
        return Ok(report);
    }

    let ranges = &engine.config().bootstrap;
    let instruments = repository.list_known_instruments()?;
    info!("bootstrapping calibration history for {} instruments", instruments.len());

    for instrument_id in instruments {
        let horizon_days = rng.gen_range(ranges.min_horizon_days..=ranges.max_horizon_days);
        let confidence_level = rng.gen_range(ranges.min_confidence..ranges.max_confidence);

        match engine.run_with_confidence(
            &instrument_id,
            horizon_days,
            confidence_level,
            true,
            &mut *repository,
            &mut *rng,
        ) {
            Ok(result) => report.seeded.push(result),
            Err(
                err @ (VarError::NoData(_)
                | VarError::InsufficientSamples { .. }
                | VarError::InvalidParameter { .. }),
            ) => {
                warn!("skipping {} during bootstrap: {}", instrument_id, err);
                report.skipped.push((instrument_id, err.to_string()));
            }
            Err(err) => return Err(err),
        }
    }

    Ok(report)
}
