//! Run orchestration: configuration, the repository boundary, single
//! VaR runs and the bootstrap pass.

pub mod bootstrap;
pub mod config;
pub mod orchestrator;
pub mod repository;
