//! Monte Carlo generation of cumulative log-returns.
//!
//! Each path accumulates `horizon_days` increments of
//! `(μ - σ²/2)·dt + σ·√dt·Z` with `Z ~ N(0, 1)`. The increments are summed
//! as log-returns; the terminal price is not compounded step by step.

use crate::core::error::VarError;
use crate::estimation::returns::ReturnStats;
use crate::simulation::worker_pool::{
    block_count, resolve_worker_count, run_blocks, DEFAULT_PATHS_PER_BLOCK,
};
use log::debug;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Trading periods per year used to derive the time step.
pub const DEFAULT_TRADING_PERIODS_PER_YEAR: f64 = 174.0;

/// Tuning for the path simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// `dt = 1 / trading_periods_per_year`.
    pub trading_periods_per_year: f64,
    /// Fixed worker count; `None` uses the global rayon pool size.
    pub worker_count: Option<usize>,
    /// Paths drawn from one block seed. Changing it changes seeded outcomes.
    pub paths_per_block: usize,
    /// Stop starting new blocks, and fail the run, once this much time
    /// has elapsed. A block already running is not interrupted.
    pub deadline: Option<Duration>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            trading_periods_per_year: DEFAULT_TRADING_PERIODS_PER_YEAR,
            worker_count: None,
            paths_per_block: DEFAULT_PATHS_PER_BLOCK,
            deadline: None,
        }
    }
}

/// Unsorted cumulative log-returns, one per simulated path.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedOutcome {
    returns: Vec<f64>,
}

impl SimulatedOutcome {
    pub fn from_returns(returns: Vec<f64>) -> Self {
        Self { returns }
    }

    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    pub fn returns(&self) -> &[f64] {
        &self.returns
    }

    pub fn into_returns(self) -> Vec<f64> {
        self.returns
    }
}

/// Runs simulated paths across a fixed worker pool.
#[derive(Debug, Clone, Default)]
pub struct PathSimulator {
    config: SimulationConfig,
}

impl PathSimulator {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Time step of one simulated day.
    pub fn dt(&self) -> f64 {
        1.0 / self.config.trading_periods_per_year
    }

    /// Simulate `num_paths` cumulative returns over `horizon_days`.
    ///
    /// One base seed is drawn from `rng`; every block of
    /// `paths_per_block` paths is seeded from it by block index. A seeded
    /// `rng` gives bit-identical outcomes for any worker count.
    /// `initial_price` is validated here but does not enter the return
    /// process; it scales the outcome only at extraction.
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        initial_price: f64,
        stats: &ReturnStats,
        horizon_days: usize,
        num_paths: usize,
        rng: &mut R,
    ) -> Result<SimulatedOutcome, VarError> {
        if !initial_price.is_finite() || initial_price <= 0.0 {
            return Err(VarError::invalid(
                "initial_price",
                format!("must be positive, got {}", initial_price),
            ));
        }
        if horizon_days < 1 {
            return Err(VarError::invalid("horizon_days", "must be at least 1"));
        }
        if num_paths < 1 {
            return Err(VarError::invalid("num_paths", "must be at least 1"));
        }
        let periods = self.config.trading_periods_per_year;
        if !periods.is_finite() || periods <= 0.0 {
            return Err(VarError::invalid(
                "trading_periods_per_year",
                format!("must be positive, got {}", periods),
            ));
        }

        let block_size = self.config.paths_per_block;
        if block_size < 1 {
            return Err(VarError::invalid("paths_per_block", "must be at least 1"));
        }

        let blocks = block_count(num_paths, block_size);
        let workers = resolve_worker_count(self.config.worker_count, blocks)?;
        let base_seed: u64 = rng.gen();
        debug!(
            "simulating {} paths in {} blocks over {} days on {} workers",
            num_paths, blocks, horizon_days, workers
        );

        let dt = self.dt();
        let drift = (stats.mean_return - 0.5 * stats.volatility.powi(2)) * dt;
        let diffusion = stats.volatility * dt.sqrt();

        let mut returns = vec![0.0; num_paths];
        run_blocks(
            &mut returns,
            block_size,
            workers,
            base_seed,
            self.config.deadline,
            |block, rng| {
                for slot in block.iter_mut() {
                    *slot = simulate_path(drift, diffusion, horizon_days, rng);
                }
                Ok(())
            },
        )?;

        Ok(SimulatedOutcome::from_returns(returns))
    }
}

/// Sum of `horizon_days` log-return increments for one path.
fn simulate_path<R: Rng + ?Sized>(drift: f64, diffusion: f64, horizon_days: usize, rng: &mut R) -> f64 {
    let mut total = 0.0;
    for _ in 0..horizon_days {
        let z: f64 = rng.sample(StandardNormal);
        total += drift + diffusion * z;
    }
    total
}
