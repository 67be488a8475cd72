//! Percentile extraction of Value at Risk from simulated outcomes.

pub mod var_extractor;
