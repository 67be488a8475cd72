//! Stochastic path simulation and the worker pool that runs it.

pub mod path_simulator;
pub mod worker_pool;
