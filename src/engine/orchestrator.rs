use crate::core::error::VarError;
use crate::core::instrument::InstrumentId;
use crate::core::price_series::PriceSeries;
use crate::core::records::{SimulationRequest, VaRResult};
use crate::engine::config::EngineConfig;
use crate::engine::repository::Repository;
use crate::estimation::calibration::Calibrator;
use crate::estimation::returns::{effective_horizon, estimate};
use crate::risk::var_extractor::extract_var;
use crate::simulation::path_simulator::PathSimulator;
use log::{debug, info, warn};
use rand::Rng;
use std::fmt;
use uuid::{Builder, Uuid};

/// Stage of a single VaR run.
///
/// `Idle → LoadingSeries → Estimating → Simulating → Extracting → Done`;
/// an error at any stage ends the run in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    LoadingSeries,
    Estimating,
    Simulating,
    Extracting,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::LoadingSeries => "loading series",
            RunState::Estimating => "estimating",
            RunState::Simulating => "simulating",
            RunState::Extracting => "extracting",
            RunState::Done => "done",
            RunState::Failed => "failed",
        };
        f.write_str(name)
    }
}

struct RunTracker<'a> {
    instrument_id: &'a InstrumentId,
    state: RunState,
}

impl<'a> RunTracker<'a> {
    fn new(instrument_id: &'a InstrumentId) -> Self {
        Self {
            instrument_id,
            state: RunState::Idle,
        }
    }

    fn enter(&mut self, next: RunState) {
        debug!("{}: {} -> {}", self.instrument_id, self.state, next);
        self.state = next;
    }

    /// Move to `Failed`, logging the stage the error came from.
    fn fail(&mut self, err: VarError) -> VarError {
        warn!("{}: run failed while {}: {}", self.instrument_id, self.state, err);
        self.state = RunState::Failed;
        err
    }
}

/// Composes calibration, estimation, simulation and extraction for one
/// instrument and hands the result to a [`Repository`].
///
/// The engine holds no per-run state; every call takes the repository and
/// the random source explicitly.
///
/// # Examples
///
/// ```
/// use var_engine::prelude::*;
/// use chrono::NaiveDate;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let prices = PriceSeries::from_closes(start, &[100.0, 102.0, 98.0, 101.0, 100.0]).unwrap();
/// let mut repo = InMemoryRepository::new().with_prices("NABIL", prices);
///
/// let engine = VarEngine::new(EngineConfig { num_paths: 1_000, ..Default::default() }).unwrap();
/// let result = engine
///     .run(&InstrumentId::new("NABIL"), 4, &mut repo, &mut StdRng::seed_from_u64(42))
///     .unwrap();
/// assert_eq!(result.horizon_days, 4);
/// assert_eq!(repo.results().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct VarEngine {
    config: EngineConfig,
    calibrator: Calibrator,
    simulator: PathSimulator,
}

impl VarEngine {
    pub fn new(config: EngineConfig) -> Result<Self, VarError> {
        config.validate()?;
        Ok(Self {
            calibrator: Calibrator::new(config.default_confidence),
            simulator: PathSimulator::new(config.simulation.clone()),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn calibrator(&self) -> &Calibrator {
        &self.calibrator
    }

    /// Run VaR with a confidence level calibrated from the instrument's
    /// history, and persist the result.
    pub fn run<P, R>(
        &self,
        instrument_id: &InstrumentId,
        requested_horizon_days: usize,
        repository: &mut P,
        rng: &mut R,
    ) -> Result<VaRResult, VarError>
    where
        P: Repository + ?Sized,
        R: Rng + ?Sized,
    {
        let mut tracker = RunTracker::new(instrument_id);
        tracker.enter(RunState::LoadingSeries);

        let loaded = load_series(instrument_id, repository).and_then(|series| {
            let history = repository.load_confidence_history(instrument_id)?;
            Ok((series, self.calibrator.calibrate(instrument_id, &history)))
        });
        let (series, confidence_level) = loaded.map_err(|e| tracker.fail(e))?;

        let result = self.compute(&mut tracker, &series, requested_horizon_days, confidence_level, rng)?;
        self.persist(&mut tracker, &result, self.config.record_confidence, repository)?;
        Ok(result)
    }

    /// Run VaR at an explicit confidence level, skipping calibration.
    ///
    /// With `record_confidence` the level is also appended to the
    /// instrument's calibration history.
    pub fn run_with_confidence<P, R>(
        &self,
        instrument_id: &InstrumentId,
        requested_horizon_days: usize,
        confidence_level: f64,
        record_confidence: bool,
        repository: &mut P,
        rng: &mut R,
    ) -> Result<VaRResult, VarError>
    where
        P: Repository + ?Sized,
        R: Rng + ?Sized,
    {
        let mut tracker = RunTracker::new(instrument_id);
        tracker.enter(RunState::LoadingSeries);

        let series = load_series(instrument_id, repository).map_err(|e| tracker.fail(e))?;
        let result = self.compute(&mut tracker, &series, requested_horizon_days, confidence_level, rng)?;
        self.persist(&mut tracker, &result, record_confidence, repository)?;
        Ok(result)
    }

    /// Estimate, simulate and extract against an already loaded series.
    /// Nothing is persisted.
    pub fn calculate<R: Rng + ?Sized>(
        &self,
        instrument_id: &InstrumentId,
        series: &PriceSeries,
        requested_horizon_days: usize,
        confidence_level: f64,
        rng: &mut R,
    ) -> Result<VaRResult, VarError> {
        let mut tracker = RunTracker::new(instrument_id);
        if series.is_empty() {
            return Err(tracker.fail(VarError::NoData(instrument_id.clone())));
        }
        self.compute(&mut tracker, series, requested_horizon_days, confidence_level, rng)
    }

    fn compute<R: Rng + ?Sized>(
        &self,
        tracker: &mut RunTracker<'_>,
        series: &PriceSeries,
        requested_horizon_days: usize,
        confidence_level: f64,
        rng: &mut R,
    ) -> Result<VaRResult, VarError> {
        let instrument_id = tracker.instrument_id;
        let request = SimulationRequest::new(
            instrument_id.clone(),
            requested_horizon_days,
            self.config.num_paths,
            confidence_level,
        );
        request.validate().map_err(|e| tracker.fail(e))?;

        let initial_price = series
            .last_price()
            .ok_or_else(|| tracker.fail(VarError::NoData(instrument_id.clone())))?;
        let horizon_days = effective_horizon(series, request.horizon_days);

        tracker.enter(RunState::Estimating);
        let stats = estimate(series, horizon_days).map_err(|e| tracker.fail(e))?;

        tracker.enter(RunState::Simulating);
        let run_id = random_run_id(rng);
        let outcome = self
            .simulator
            .simulate(initial_price, &stats, horizon_days, request.num_paths, rng)
            .map_err(|e| tracker.fail(e))?;

        tracker.enter(RunState::Extracting);
        let extracted = extract_var(outcome, initial_price, request.confidence_level)
            .map_err(|e| tracker.fail(e))?;

        Ok(VaRResult {
            run_id,
            instrument_id: instrument_id.clone(),
            horizon_days,
            num_paths: request.num_paths,
            mean_return: stats.mean_return,
            volatility: stats.volatility,
            initial_price,
            confidence_level: request.confidence_level,
            var_amount: extracted.var_amount,
            var_percentage: extracted.var_percentage,
        })
    }

    fn persist<P: Repository + ?Sized>(
        &self,
        tracker: &mut RunTracker<'_>,
        result: &VaRResult,
        record_confidence: bool,
        repository: &mut P,
    ) -> Result<(), VarError> {
        repository
            .save_result(result)
            .map_err(|e| tracker.fail(e.into()))?;
        if record_confidence {
            repository
                .save_confidence_record(&result.instrument_id, result.confidence_level)
                .map_err(|e| tracker.fail(e.into()))?;
        }
        tracker.enter(RunState::Done);
        info!(
            "{}: VaR {:.2} ({:.2}%) at {:.2}% over {} days",
            result.instrument_id,
            result.var_amount,
            result.var_percentage,
            result.confidence_level * 100.0,
            result.horizon_days
        );
        Ok(())
    }
}

fn load_series<P: Repository + ?Sized>(
    instrument_id: &InstrumentId,
    repository: &P,
) -> Result<PriceSeries, VarError> {
    let series = repository.load_price_series(instrument_id)?;
    if series.is_empty() {
        return Err(VarError::NoData(instrument_id.clone()));
    }
    Ok(series)
}

/// Version-4 id drawn from the run's random source, so seeded runs are
/// reproducible end to end.
fn random_run_id<R: Rng + ?Sized>(rng: &mut R) -> Uuid {
    Builder::from_random_bytes(rng.gen()).into_uuid()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::RepositoryError;
    use crate::core::records::ConfidenceHistoryRecord;
    use crate::engine::repository::InMemoryRepository;
    use crate::simulation::path_simulator::SimulationConfig;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn series(closes: &[f64]) -> PriceSeries {
        PriceSeries::from_closes(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), closes).unwrap()
    }

    fn engine(num_paths: usize) -> VarEngine {
        VarEngine::new(EngineConfig {
            num_paths,
            default_confidence: 0.975,
            simulation: SimulationConfig {
                worker_count: Some(3),
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap()
    }

    fn nabil() -> InstrumentId {
        InstrumentId::new("NABIL")
    }

    #[test]
    fn test_unknown_instrument_is_no_data() {
        let mut repo = InMemoryRepository::new();
        let err = engine(100)
            .run(&nabil(), 10, &mut repo, &mut StdRng::seed_from_u64(1))
            .unwrap_err();
        assert!(matches!(err, VarError::NoData(_)));
        assert!(repo.results().is_empty());
    }

    #[test]
    fn test_empty_series_is_no_data() {
        let mut repo = InMemoryRepository::new().with_prices("NABIL", PriceSeries::new());
        let err = engine(100)
            .run(&nabil(), 10, &mut repo, &mut StdRng::seed_from_u64(1))
            .unwrap_err();
        assert!(matches!(err, VarError::NoData(_)));
    }

    #[test]
    fn test_short_series_persists_nothing() {
        let mut repo = InMemoryRepository::new().with_prices("NABIL", series(&[100.0]));
        let err = engine(100)
            .run(&nabil(), 10, &mut repo, &mut StdRng::seed_from_u64(1))
            .unwrap_err();
        assert!(matches!(err, VarError::InsufficientSamples { .. }));
        assert!(repo.results().is_empty());
    }

    #[test]
    fn test_uses_calibrated_confidence() {
        let mut repo = InMemoryRepository::new().with_prices("NABIL", series(&[100.0, 101.0, 99.0, 102.0]));
        let engine = engine(200);

        let first = engine
            .run(&nabil(), 4, &mut repo, &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(first.confidence_level, 0.975);

        repo.save_confidence_record(&nabil(), 0.90).unwrap();
        repo.save_confidence_record(&nabil(), 0.92).unwrap();
        let second = engine
            .run(&nabil(), 4, &mut repo, &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert!((second.confidence_level - 0.91).abs() < 1e-12);
        assert_eq!(repo.results().len(), 2);
    }

    #[test]
    fn test_record_confidence_feeds_calibration() {
        let mut repo = InMemoryRepository::new().with_prices("NABIL", series(&[100.0, 101.0, 99.0, 102.0]));
        engine(100)
            .run_with_confidence(&nabil(), 4, 0.93, true, &mut repo, &mut StdRng::seed_from_u64(3))
            .unwrap();
        assert_eq!(repo.confidence_history().len(), 1);
        assert_eq!(repo.confidence_history()[0].confidence_level, 0.93);
    }

    #[test]
    fn test_calibrated_confidence_of_one_is_rejected() {
        let mut repo = InMemoryRepository::new().with_prices("NABIL", series(&[100.0, 101.0, 99.0]));
        repo.save_confidence_record(&nabil(), 1.0).unwrap();
        let err = engine(100)
            .run(&nabil(), 3, &mut repo, &mut StdRng::seed_from_u64(1))
            .unwrap_err();
        assert!(matches!(err, VarError::InvalidParameter { name: "confidence_level", .. }));
    }

    #[test]
    fn test_calculate_does_not_persist() {
        let result = engine(100)
            .calculate(&nabil(), &series(&[10.0, 10.5, 10.2]), 3, 0.95, &mut StdRng::seed_from_u64(5))
            .unwrap();
        assert_eq!(result.num_paths, 100);
        assert_eq!(result.initial_price, 10.2);
    }

    struct FailingRepository;

    impl Repository for FailingRepository {
        fn load_price_series(&self, _: &InstrumentId) -> Result<PriceSeries, RepositoryError> {
            Ok(PriceSeries::from_closes(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), &[1.0, 2.0, 3.0]).unwrap())
        }
        fn load_confidence_history(&self, _: &InstrumentId) -> Result<Vec<ConfidenceHistoryRecord>, RepositoryError> {
            Ok(Vec::new())
        }
        fn list_known_instruments(&self) -> Result<Vec<InstrumentId>, RepositoryError> {
            Ok(Vec::new())
        }
        fn has_any_history(&self) -> Result<bool, RepositoryError> {
            Ok(false)
        }
        fn save_result(&mut self, _: &VaRResult) -> Result<(), RepositoryError> {
            Err(RepositoryError::Backend("disk full".into()))
        }
        fn save_confidence_record(&mut self, _: &InstrumentId, _: f64) -> Result<(), RepositoryError> {
            Ok(())
        }
    }

    #[test]
    fn test_repository_failure_surfaces() {
        let err = engine(50)
            .run(&nabil(), 3, &mut FailingRepository, &mut StdRng::seed_from_u64(1))
            .unwrap_err();
        assert!(matches!(err, VarError::Repository(RepositoryError::Backend(_))));
    }

    #[test]
    fn test_run_state_display() {
        assert_eq!(RunState::LoadingSeries.to_string(), "loading series");
        assert_eq!(RunState::Failed.to_string(), "failed");
    }
}
